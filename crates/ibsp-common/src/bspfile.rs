// bspfile.rs — IBSP v46 map loading
//
// The whole file is read into memory, the header is validated, and each lump
// is decoded into an owned, length-checked table. Cross references (plane,
// child, brush, side and texture indices) are validated once here so the tree
// walks in vis.rs and cmodel.rs can index without bounds failures.

use std::fmt;
use std::mem::size_of;
use std::path::{Path, PathBuf};

use bytemuck::Pod;
use rayon::prelude::*;

use crate::common::{com_dprintf, com_printf};
use crate::crc::crc_block;
use crate::entities::{parse_entities, BspEntity};
use crate::patch::{build_patches, Patch};
use crate::q_shared::{CPlane, Contents, SurfaceFlags};
use crate::qfiles::*;
use crate::vis::RenderFace;

// ============================================================
// Errors
// ============================================================

/// Reasons a map load can fail. Any error discards everything read so far.
#[derive(Debug)]
pub enum LoadError {
    FileNotFound(PathBuf),
    Io(std::io::Error),
    /// Bad magic, bad version, or records that reference data outside their lump.
    InvalidFormat(String),
    /// A directory entry points outside the file or has a funny size.
    LumpReadFailure { lump: &'static str, reason: String },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::FileNotFound(path) => write!(f, "couldn't load {}", path.display()),
            LoadError::Io(e) => write!(f, "read error: {}", e),
            LoadError::InvalidFormat(msg) => write!(f, "invalid map: {}", msg),
            LoadError::LumpReadFailure { lump, reason } => {
                write!(f, "bad {} lump: {}", lump, reason)
            }
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Io(e) => Some(e),
            _ => None,
        }
    }
}

fn invalid(msg: String) -> LoadError {
    LoadError::InvalidFormat(msg)
}

// ============================================================
// Visibility lump
// ============================================================

/// Cluster-pair visibility bit matrix, `numvecs` rows of `sizevecs` bytes.
#[derive(Debug, Clone, Default)]
pub struct VisData {
    pub numvecs: i32,
    pub sizevecs: i32,
    pub bits: Vec<u8>,
}

impl VisData {
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }
}

// ============================================================
// Map
// ============================================================

/// A loaded map. Fields drop in declaration order, so the derived render
/// data goes before the raw lump tables.
#[derive(Debug, Default)]
pub struct BspMap {
    // derived at load time
    pub render_faces: Vec<RenderFace>,
    pub patches: Vec<Patch>,
    pub cplanes: Vec<CPlane>,
    pub entities: Vec<BspEntity>,

    pub name: String,
    pub checksum: u32,
    pub entity_string: String,

    // file lumps
    pub textures: Vec<DTexture>,
    pub planes: Vec<DPlane>,
    pub nodes: Vec<DNode>,
    pub leafs: Vec<DLeaf>,
    pub leaffaces: Vec<i32>,
    pub leafbrushes: Vec<i32>,
    pub models: Vec<DModel>,
    pub brushes: Vec<DBrush>,
    pub brushsides: Vec<DBrushSide>,
    pub vertexes: Vec<DVertex>,
    pub meshverts: Vec<i32>,
    pub effects: Vec<DEffect>,
    pub faces: Vec<DFace>,
    pub lightmaps: Vec<DLightmap>,
    pub lightvols: Vec<DLightVol>,
    pub visdata: VisData,
}

/// Use parallel decoding for lumps with at least this many records.
const PARALLEL_LUMP_THRESHOLD: usize = 64;

/// Parse and validate the header. Nothing else is touched until this passes.
pub fn parse_header(data: &[u8]) -> Result<DHeader, LoadError> {
    if data.len() < size_of::<DHeader>() {
        return Err(invalid(format!("file is only {} bytes", data.len())));
    }
    let header: DHeader = bytemuck::pod_read_unaligned(&data[..size_of::<DHeader>()]);
    if header.ident != IDBSPHEADER {
        return Err(invalid(format!(
            "wrong magic {:?}, expected \"IBSP\"",
            String::from_utf8_lossy(&data[..4])
        )));
    }
    if header.version != BSPVERSION {
        return Err(invalid(format!(
            "wrong version number ({} should be {})",
            header.version, BSPVERSION
        )));
    }
    Ok(header)
}

fn lump_bytes<'a>(data: &'a [u8], header: &DHeader, lump: usize) -> Result<&'a [u8], LoadError> {
    let l = header.lumps[lump];
    if l.fileofs < 0 || l.filelen < 0 {
        return Err(LoadError::LumpReadFailure {
            lump: LUMP_NAMES[lump],
            reason: format!("negative offset or length ({}, {})", l.fileofs, l.filelen),
        });
    }
    let ofs = l.fileofs as usize;
    let len = l.filelen as usize;
    match ofs.checked_add(len) {
        Some(end) if end <= data.len() => Ok(&data[ofs..end]),
        _ => Err(LoadError::LumpReadFailure {
            lump: LUMP_NAMES[lump],
            reason: format!("range {}+{} exceeds file size {}", ofs, len, data.len()),
        }),
    }
}

/// Decode a homogeneous record lump: `count = filelen / size_of::<T>()`.
pub fn read_lump<T: Pod + Send>(data: &[u8], header: &DHeader, lump: usize) -> Result<Vec<T>, LoadError> {
    let bytes = lump_bytes(data, header, lump)?;
    let stride = size_of::<T>();
    if bytes.len() % stride != 0 {
        return Err(LoadError::LumpReadFailure {
            lump: LUMP_NAMES[lump],
            reason: format!("funny lump size {} (record size {})", bytes.len(), stride),
        });
    }
    let count = bytes.len() / stride;
    let records = if count >= PARALLEL_LUMP_THRESHOLD {
        bytes.par_chunks_exact(stride).map(bytemuck::pod_read_unaligned::<T>).collect()
    } else {
        bytes.chunks_exact(stride).map(bytemuck::pod_read_unaligned::<T>).collect()
    };
    Ok(records)
}

/// The entity lump is not guaranteed to be NUL terminated; the text ends at
/// the first NUL or at the end of the lump, whichever comes first.
fn read_entity_string(data: &[u8], header: &DHeader) -> Result<String, LoadError> {
    let bytes = lump_bytes(data, header, LUMP_ENTITIES)?;
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    Ok(String::from_utf8_lossy(&bytes[..end]).into_owned())
}

fn read_visdata(data: &[u8], header: &DHeader) -> Result<VisData, LoadError> {
    let bytes = lump_bytes(data, header, LUMP_VISIBILITY)?;
    if bytes.is_empty() {
        return Ok(VisData::default());
    }
    let fail = |reason: String| LoadError::LumpReadFailure { lump: LUMP_NAMES[LUMP_VISIBILITY], reason };
    if bytes.len() < size_of::<DVisHeader>() {
        return Err(fail(format!("{} bytes is too short for the header", bytes.len())));
    }
    let vh: DVisHeader = bytemuck::pod_read_unaligned(&bytes[..size_of::<DVisHeader>()]);
    if vh.numvecs < 0 || vh.sizevecs < 0 {
        return Err(fail(format!("negative dimensions {} x {}", vh.numvecs, vh.sizevecs)));
    }
    let size = vh.numvecs as usize * vh.sizevecs as usize;
    let body = &bytes[size_of::<DVisHeader>()..];
    if body.len() < size {
        return Err(fail(format!("{} x {} bit matrix needs {} bytes, lump has {}",
            vh.numvecs, vh.sizevecs, size, body.len())));
    }
    Ok(VisData {
        numvecs: vh.numvecs,
        sizevecs: vh.sizevecs,
        bits: body[..size].to_vec(),
    })
}

fn check_range(what: &str, index: usize, first: i32, count: i32, len: usize) -> Result<(), LoadError> {
    if first < 0 || count < 0 || first as usize + count as usize > len {
        return Err(invalid(format!(
            "{} {} references {}..{} of {}",
            what, index, first, first as i64 + count as i64, len
        )));
    }
    Ok(())
}

fn check_index(what: &str, index: usize, target: i32, len: usize) -> Result<(), LoadError> {
    if target < 0 || target as usize >= len {
        return Err(invalid(format!("{} {} references {} of {}", what, index, target, len)));
    }
    Ok(())
}

/// Read a whole map file. Returns the map name (the file stem) and the bytes.
pub fn read_map_file(path: &Path) -> Result<(String, Vec<u8>), LoadError> {
    let data = std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => LoadError::FileNotFound(path.to_path_buf()),
        _ => LoadError::Io(e),
    })?;
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok((name, data))
}

impl BspMap {
    /// Load a map from disk. The map name is the file stem.
    pub fn load(path: impl AsRef<Path>) -> Result<BspMap, LoadError> {
        let (name, data) = read_map_file(path.as_ref())?;
        Self::from_bytes(&name, &data)
    }

    /// Load a map from an in-memory file image.
    pub fn from_bytes(name: &str, data: &[u8]) -> Result<BspMap, LoadError> {
        let header = parse_header(data)?;

        let entity_string = read_entity_string(data, &header)?;
        let mut map = BspMap {
            name: name.to_string(),
            checksum: crc_block(data),
            entities: parse_entities(&entity_string),
            entity_string,
            textures: read_lump(data, &header, LUMP_TEXTURES)?,
            planes: read_lump(data, &header, LUMP_PLANES)?,
            nodes: read_lump(data, &header, LUMP_NODES)?,
            leafs: read_lump(data, &header, LUMP_LEAFS)?,
            leaffaces: read_lump(data, &header, LUMP_LEAFFACES)?,
            leafbrushes: read_lump(data, &header, LUMP_LEAFBRUSHES)?,
            models: read_lump(data, &header, LUMP_MODELS)?,
            brushes: read_lump(data, &header, LUMP_BRUSHES)?,
            brushsides: read_lump(data, &header, LUMP_BRUSHSIDES)?,
            vertexes: read_lump(data, &header, LUMP_VERTEXES)?,
            meshverts: read_lump(data, &header, LUMP_MESHVERTS)?,
            effects: read_lump(data, &header, LUMP_EFFECTS)?,
            faces: read_lump(data, &header, LUMP_FACES)?,
            lightmaps: read_lump(data, &header, LUMP_LIGHTMAPS)?,
            lightvols: read_lump(data, &header, LUMP_LIGHTVOLS)?,
            visdata: read_visdata(data, &header)?,
            ..Default::default()
        };

        map.validate()?;

        map.cplanes = map.planes.iter().map(|p| CPlane::new(p.normal, p.dist)).collect();
        map.patches = build_patches(&map.faces, &map.vertexes);
        map.render_faces = RenderFace::build(&map.faces, &map.patches);

        com_dprintf(&format!(
            "{}: {} faces, {} patches, {} brushes, {} clusters\n",
            map.name,
            map.faces.len(),
            map.patches.len(),
            map.brushes.len(),
            map.visdata.numvecs
        ));
        Ok(map)
    }

    /// Check every cross reference the runtime walks depend on.
    fn validate(&self) -> Result<(), LoadError> {
        let (nplanes, nleafs, nnodes) = (self.planes.len(), self.leafs.len(), self.nodes.len());

        if nnodes > 0 && nleafs == 0 {
            return Err(invalid("map has nodes but no leafs".to_string()));
        }
        for (i, node) in self.nodes.iter().enumerate() {
            check_index("node", i, node.planenum, nplanes)?;
            for &child in &node.children {
                if child >= 0 {
                    check_index("node", i, child, nnodes)?;
                    // children always come after their parent, so walks terminate
                    if child as usize <= i {
                        return Err(invalid(format!("node {} has child node {} before it", i, child)));
                    }
                } else {
                    check_index("node", i, !child, nleafs)?;
                }
            }
        }
        for (i, leaf) in self.leafs.iter().enumerate() {
            check_range("leaf", i, leaf.firstleafface, leaf.numleaffaces, self.leaffaces.len())?;
            check_range("leaf", i, leaf.firstleafbrush, leaf.numleafbrushes, self.leafbrushes.len())?;
        }
        for (i, &face) in self.leaffaces.iter().enumerate() {
            check_index("leafface", i, face, self.faces.len())?;
        }
        for (i, &brush) in self.leafbrushes.iter().enumerate() {
            check_index("leafbrush", i, brush, self.brushes.len())?;
        }
        for (i, brush) in self.brushes.iter().enumerate() {
            check_range("brush", i, brush.firstside, brush.numsides, self.brushsides.len())?;
            check_index("brush", i, brush.texture, self.textures.len())?;
        }
        for (i, side) in self.brushsides.iter().enumerate() {
            check_index("brushside", i, side.planenum, nplanes)?;
            check_index("brushside", i, side.texture, self.textures.len())?;
        }
        for (i, face) in self.faces.iter().enumerate() {
            check_range("face", i, face.firstvertex, face.numvertexes, self.vertexes.len())?;
            check_range("face", i, face.firstmeshvert, face.nummeshverts, self.meshverts.len())?;
        }
        if !self.visdata.is_empty() {
            let needed = (self.visdata.numvecs as usize).div_ceil(8);
            if (self.visdata.sizevecs as usize) < needed {
                return Err(invalid(format!(
                    "visibility rows of {} bytes can't hold {} clusters",
                    self.visdata.sizevecs, self.visdata.numvecs
                )));
            }
            for (i, leaf) in self.leafs.iter().enumerate() {
                if leaf.cluster >= self.visdata.numvecs {
                    return Err(invalid(format!(
                        "leaf {} is in cluster {} of {}", i, leaf.cluster, self.visdata.numvecs
                    )));
                }
            }
        }
        Ok(())
    }

    /// A map without drawable faces counts as "no level loaded".
    pub fn is_valid(&self) -> bool {
        !self.faces.is_empty()
    }

    /// Contents of a brush, taken from its texture.
    #[inline]
    pub fn brush_contents(&self, brush: usize) -> Contents {
        let tex = self.brushes[brush].texture as usize;
        Contents::from_bits_retain(self.textures[tex].contents)
    }

    /// Surface flags of a brush side, taken from its texture.
    #[inline]
    pub fn side_surface_flags(&self, side: usize) -> SurfaceFlags {
        let tex = self.brushsides[side].texture as usize;
        SurfaceFlags::from_bits_retain(self.textures[tex].flags)
    }

    /// Model 0 is the static world geometry.
    pub fn world_model(&self) -> Option<&DModel> {
        self.models.first()
    }

    pub fn num_clusters(&self) -> i32 {
        self.visdata.numvecs
    }

    /// Print a lump summary to the console.
    pub fn print_info(&self) {
        com_printf(&format!("map \"{}\" checksum {:08x}\n", self.name, self.checksum));
        let counts = [
            ("entities", self.entities.len()),
            ("textures", self.textures.len()),
            ("planes", self.planes.len()),
            ("nodes", self.nodes.len()),
            ("leafs", self.leafs.len()),
            ("leaffaces", self.leaffaces.len()),
            ("leafbrushes", self.leafbrushes.len()),
            ("models", self.models.len()),
            ("brushes", self.brushes.len()),
            ("brushsides", self.brushsides.len()),
            ("vertexes", self.vertexes.len()),
            ("meshverts", self.meshverts.len()),
            ("effects", self.effects.len()),
            ("faces", self.faces.len()),
            ("lightmaps", self.lightmaps.len()),
            ("lightvols", self.lightvols.len()),
            ("clusters", self.num_clusters().max(0) as usize),
            ("patches", self.patches.len()),
        ];
        for (name, count) in counts {
            com_printf(&format!("{:>8} {}\n", count, name));
        }
    }
}

// ============================================================
// Tests
// ============================================================
