// world.rs — the map currently being played
//
// Owns at most one BspMap. Loading a different map tears the previous one
// down before the new file is parsed, so two maps never coexist.

use std::path::Path;

use rand::Rng;

use crate::bspfile::{read_map_file, BspMap, LoadError};
use crate::cmodel::{point_contents, trace, TraceShape};
use crate::common::{com_dprintf, com_printf};
use crate::crc::crc_block;
use crate::cvar::cvar_get_latched_vars;
use crate::entities::{find_spawn_point, SpawnPoint};
use crate::pmove::{slide_move, KinematicBody, MoveParams, SlideMoveReport};
use crate::q_shared::{Contents, Trace, Vec3};
use crate::vis::{update_visibility, Camera, VisOptions, VisStats};

#[derive(Debug, Default)]
pub struct World {
    map: Option<BspMap>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the map at `path`. Asking again for the map that is already
    /// loaded, with identical contents, keeps it. A map without faces is
    /// rejected, leaving no map loaded.
    pub fn load_map(&mut self, path: impl AsRef<Path>) -> Result<&BspMap, LoadError> {
        let (name, data) = match read_map_file(path.as_ref()) {
            Ok(file) => file,
            Err(e) => {
                self.free_map();
                return Err(e);
            }
        };

        let checksum = crc_block(&data);
        let reload = self
            .map
            .as_ref()
            .is_some_and(|m| m.name == name && m.checksum == checksum);
        if reload {
            com_dprintf(&format!("{} already loaded\n", name));
        } else {
            self.free_map();
            cvar_get_latched_vars();

            let map = BspMap::from_bytes(&name, &data)?;
            if !map.is_valid() {
                return Err(LoadError::InvalidFormat(format!("{} has no faces", name)));
            }
            com_printf(&format!(
                "loaded {}: {} faces, {} brushes\n",
                map.name,
                map.faces.len(),
                map.brushes.len()
            ));
            self.map = Some(map);
        }

        self.map
            .as_ref()
            .ok_or_else(|| LoadError::InvalidFormat(format!("{} did not stay loaded", name)))
    }

    /// Drop the current map and everything derived from it.
    pub fn free_map(&mut self) {
        if let Some(map) = self.map.take() {
            com_dprintf(&format!("freeing {}\n", map.name));
        }
    }

    pub fn map(&self) -> Option<&BspMap> {
        self.map.as_ref()
    }

    pub fn map_mut(&mut self) -> Option<&mut BspMap> {
        self.map.as_mut()
    }

    /// A random player start of the current map.
    pub fn find_spawn_point(&self) -> Option<SpawnPoint> {
        self.find_spawn_point_with(&mut rand::thread_rng())
    }

    pub fn find_spawn_point_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<SpawnPoint> {
        find_spawn_point(&self.map.as_ref()?.entities, rng)
    }

    pub fn trace(&self, shape: &TraceShape, start: &Vec3, end: &Vec3, mask: Contents) -> Option<Trace> {
        Some(trace(self.map.as_ref()?, shape, start, end, mask))
    }

    pub fn point_contents(&self, p: &Vec3) -> Option<Contents> {
        Some(point_contents(self.map.as_ref()?, p))
    }

    pub fn update_visibility(&mut self, camera: &Camera, opts: VisOptions) -> Option<VisStats> {
        Some(update_visibility(self.map.as_mut()?, camera, opts))
    }

    pub fn slide_move(&self, body: &mut KinematicBody, params: &MoveParams, dt: f32) -> Option<SlideMoveReport> {
        Some(slide_move(self.map.as_ref()?, body, params, dt))
    }
}
