// test_map.rs — builds small IBSP images in memory for unit tests

use std::mem::size_of;

use bytemuck::Zeroable;

use crate::q_shared::{Contents, SurfaceFlags, Vec3};
use crate::qfiles::*;

/// Lump tables for a synthetic map. `build` lays them out behind a header
/// exactly like a compiler would.
#[derive(Debug, Clone, Default)]
pub struct MapBuilder {
    pub entities: String,
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
    pub faces: Vec<DFace>,
    /// (numvecs, sizevecs, bits)
    pub vis: Option<(i32, i32, Vec<u8>)>,
}

const WORLD_EXTENT: i32 = 65536;

impl MapBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn texture(&mut self, name: &str, flags: SurfaceFlags, contents: Contents) -> i32 {
        let mut tex = DTexture::zeroed();
        let n = name.len().min(63);
        tex.name[..n].copy_from_slice(&name.as_bytes()[..n]);
        tex.flags = flags.bits();
        tex.contents = contents.bits();
        self.textures.push(tex);
        self.textures.len() as i32 - 1
    }

    pub fn add_plane(&mut self, normal: Vec3, dist: f32) -> i32 {
        self.planes.push(DPlane { normal, dist });
        self.planes.len() as i32 - 1
    }

    pub fn add_node(&mut self, planenum: i32, children: [i32; 2]) -> i32 {
        self.nodes.push(DNode {
            planenum,
            children,
            mins: [-WORLD_EXTENT; 3],
            maxs: [WORLD_EXTENT; 3],
        });
        self.nodes.len() as i32 - 1
    }

    pub fn add_leaf(&mut self, cluster: i32, mins: [i32; 3], maxs: [i32; 3], faces: &[i32], brushes: &[i32]) -> i32 {
        self.leafs.push(DLeaf {
            cluster,
            area: 0,
            mins,
            maxs,
            firstleafface: self.leaffaces.len() as i32,
            numleaffaces: faces.len() as i32,
            firstleafbrush: self.leafbrushes.len() as i32,
            numleafbrushes: brushes.len() as i32,
        });
        self.leaffaces.extend_from_slice(faces);
        self.leafbrushes.extend_from_slice(brushes);
        self.leafs.len() as i32 - 1
    }

    /// Axis-aligned brush with its six bounding planes.
    pub fn box_brush(&mut self, mins: Vec3, maxs: Vec3, texture: i32) -> i32 {
        let firstside = self.brushsides.len() as i32;
        for axis in 0..3 {
            let mut normal = [0.0; 3];
            normal[axis] = -1.0;
            let planenum = self.add_plane(normal, -mins[axis]);
            self.brushsides.push(DBrushSide { planenum, texture });

            normal[axis] = 1.0;
            let planenum = self.add_plane(normal, maxs[axis]);
            self.brushsides.push(DBrushSide { planenum, texture });
        }
        self.brushes.push(DBrush {
            firstside,
            numsides: 6,
            texture,
        });
        self.brushes.len() as i32 - 1
    }

    /// Planar quad drawn as two triangles.
    pub fn quad_face(&mut self, corners: [Vec3; 4], normal: Vec3, texture: i32) -> i32 {
        let firstvertex = self.vertexes.len() as i32;
        for c in corners {
            self.vertexes.push(DVertex {
                position: c,
                normal,
                color: [255; 4],
                ..Default::default()
            });
        }
        let firstmeshvert = self.meshverts.len() as i32;
        self.meshverts.extend_from_slice(&[0, 1, 2, 0, 2, 3]);
        self.faces.push(DFace {
            texture,
            effect: -1,
            face_type: MST_PLANAR,
            firstvertex,
            numvertexes: 4,
            firstmeshvert,
            nummeshverts: 6,
            lm_index: -1,
            normal,
            ..Default::default()
        });
        self.faces.len() as i32 - 1
    }

    /// 3x3 control grid bulging up by `size / 2` in the middle row.
    pub fn patch_face(&mut self, origin: Vec3, size: f32, texture: i32) -> i32 {
        let firstvertex = self.vertexes.len() as i32;
        let step = size / 2.0;
        for row in 0..3 {
            for col in 0..3 {
                let bulge = if row == 1 { step } else { 0.0 };
                self.vertexes.push(DVertex {
                    position: [
                        origin[0] + col as f32 * step,
                        origin[1] + row as f32 * step,
                        origin[2] + bulge,
                    ],
                    normal: [0.0, 0.0, 1.0],
                    color: [255; 4],
                    ..Default::default()
                });
            }
        }
        self.faces.push(DFace {
            texture,
            effect: -1,
            face_type: MST_PATCH,
            firstvertex,
            numvertexes: 9,
            lm_index: -1,
            size: [3, 3],
            ..Default::default()
        });
        self.faces.len() as i32 - 1
    }

    /// Give a brush-only layout a minimal tree: one node whose front is a
    /// single leaf holding every brush and face. No-op once nodes exist.
    pub fn finish_tree(&mut self) {
        if !self.nodes.is_empty() {
            return;
        }
        self.leafs.clear();
        self.leaffaces.clear();
        self.leafbrushes.clear();

        let plane = self.add_plane([0.0, 0.0, 1.0], -WORLD_EXTENT as f32);
        self.add_node(plane, [-2, -1]);
        self.add_leaf(-1, [0; 3], [0; 3], &[], &[]);
        let faces: Vec<i32> = (0..self.faces.len() as i32).collect();
        let brushes: Vec<i32> = (0..self.brushes.len() as i32).collect();
        self.add_leaf(0, [-WORLD_EXTENT; 3], [WORLD_EXTENT; 3], &faces, &brushes);

        if self.models.is_empty() {
            self.models.push(DModel {
                mins: [-WORLD_EXTENT as f32; 3],
                maxs: [WORLD_EXTENT as f32; 3],
                firstface: 0,
                numfaces: self.faces.len() as i32,
                firstbrush: 0,
                numbrushes: self.brushes.len() as i32,
            });
        }
    }

    /// Serialize to a file image, finishing the tree on a copy if needed.
    pub fn build(&self) -> Vec<u8> {
        if self.nodes.is_empty() {
            let mut finished = self.clone();
            finished.finish_tree();
            return finished.write();
        }
        self.write()
    }

    fn write(&self) -> Vec<u8> {
        let visibility = match &self.vis {
            Some((numvecs, sizevecs, bits)) => {
                let mut out = Vec::with_capacity(8 + bits.len());
                out.extend_from_slice(bytemuck::bytes_of(&DVisHeader {
                    numvecs: *numvecs,
                    sizevecs: *sizevecs,
                }));
                out.extend_from_slice(bits);
                out
            }
            None => Vec::new(),
        };

        let lumps: [&[u8]; HEADER_LUMPS] = [
            self.entities.as_bytes(),
            bytemuck::cast_slice(&self.textures),
            bytemuck::cast_slice(&self.planes),
            bytemuck::cast_slice(&self.nodes),
            bytemuck::cast_slice(&self.leafs),
            bytemuck::cast_slice(&self.leaffaces),
            bytemuck::cast_slice(&self.leafbrushes),
            bytemuck::cast_slice(&self.models),
            bytemuck::cast_slice(&self.brushes),
            bytemuck::cast_slice(&self.brushsides),
            bytemuck::cast_slice(&self.vertexes),
            bytemuck::cast_slice(&self.meshverts),
            &[],
            bytemuck::cast_slice(&self.faces),
            &[],
            &[],
            &visibility,
        ];

        let mut header = DHeader {
            ident: IDBSPHEADER,
            version: BSPVERSION,
            lumps: [Lump::default(); HEADER_LUMPS],
        };
        let mut body = Vec::new();
        let base = size_of::<DHeader>();
        for (i, bytes) in lumps.iter().enumerate() {
            while body.len() % 4 != 0 {
                body.push(0);
            }
            header.lumps[i] = Lump {
                fileofs: (base + body.len()) as i32,
                filelen: bytes.len() as i32,
            };
            body.extend_from_slice(bytes);
        }

        let mut data = bytemuck::bytes_of(&header).to_vec();
        data.extend_from_slice(&body);
        data
    }

    // ============================================================
    // Canned layouts
    // ============================================================

    /// A 512 unit square floor slab with a ceiling slab 256 units above it,
    /// one floor quad and a player start in between.
    pub fn box_room() -> Self {
        let mut b = Self::new();
        b.entities = concat!(
            "{\n\"classname\" \"worldspawn\"\n\"message\" \"box room\"\n}\n",
            "{\n\"classname\" \"info_player_start\"\n\"origin\" \"0 0 64\"\n\"angle\" \"90\"\n}\n",
            "\0"
        )
        .to_string();
        let stone = b.texture("textures/base_floor/stone", SurfaceFlags::empty(), Contents::SOLID);
        b.box_brush([-256.0, -256.0, -16.0], [256.0, 256.0, 0.0], stone);
        b.box_brush([-256.0, -256.0, 256.0], [256.0, 256.0, 272.0], stone);
        b.quad_face(
            [
                [-256.0, -256.0, 0.0],
                [256.0, -256.0, 0.0],
                [256.0, 256.0, 0.0],
                [-256.0, 256.0, 0.0],
            ],
            [0.0, 0.0, 1.0],
            stone,
        );
        b
    }

    /// Two clusters split by the plane x = 0. Leaf 1 (cluster 0) is in
    /// front and owns a quad, leaf 2 (cluster 1) is behind and owns a
    /// patch. Each cluster only sees itself.
    pub fn vis_layout() -> Self {
        let mut b = Self::new();
        b.entities = "{\n\"classname\" \"worldspawn\"\n}\n\0".to_string();
        let tex = b.texture("textures/base_wall/metal", SurfaceFlags::empty(), Contents::SOLID);
        b.quad_face(
            [
                [128.0, -64.0, -64.0],
                [128.0, 64.0, -64.0],
                [128.0, 64.0, 64.0],
                [128.0, -64.0, 64.0],
            ],
            [-1.0, 0.0, 0.0],
            tex,
        );
        b.patch_face([-128.0, -64.0, -64.0], 128.0, tex);

        let split = b.add_plane([1.0, 0.0, 0.0], 0.0);
        b.add_node(split, [-2, -3]);
        b.add_leaf(-1, [0; 3], [0; 3], &[], &[]);
        b.add_leaf(0, [0, -256, -256], [256, 256, 256], &[0], &[]);
        b.add_leaf(1, [-256, -256, -256], [0, 256, 256], &[1], &[]);
        b.models.push(DModel {
            mins: [-256.0; 3],
            maxs: [256.0; 3],
            firstface: 0,
            numfaces: 2,
            ..Default::default()
        });
        b.vis = Some((2, 1, vec![0b01, 0b10]));
        b
    }

    /// Two leafs split by the plane x = 150. The back leaf holds a stone
    /// wall at x 100..120, the front leaf a slick wall at x 180..216, and a
    /// stone pillar at x 140..160, y 200..264 crosses the plane and is
    /// listed in both.
    pub fn split_walls() -> Self {
        let mut b = Self::new();
        b.entities = "{\n\"classname\" \"worldspawn\"\n}\n\0".to_string();
        let stone = b.texture("textures/base_wall/concrete", SurfaceFlags::empty(), Contents::SOLID);
        let ice = b.texture("textures/base_wall/ice", SurfaceFlags::SLICK, Contents::SOLID);
        let near = b.box_brush([100.0, -64.0, -64.0], [120.0, 64.0, 64.0], stone);
        let far = b.box_brush([180.0, -64.0, -64.0], [216.0, 64.0, 64.0], ice);
        let pillar = b.box_brush([140.0, 200.0, -64.0], [160.0, 264.0, 64.0], stone);
        b.quad_face(
            [
                [-256.0, -256.0, -64.0],
                [512.0, -256.0, -64.0],
                [512.0, 512.0, -64.0],
                [-256.0, 512.0, -64.0],
            ],
            [0.0, 0.0, 1.0],
            stone,
        );

        let split = b.add_plane([1.0, 0.0, 0.0], 150.0);
        b.add_node(split, [-2, -3]);
        b.add_leaf(-1, [0; 3], [0; 3], &[], &[]);
        b.add_leaf(0, [150, -512, -512], [512, 512, 512], &[0], &[far, pillar]);
        b.add_leaf(0, [-512, -512, -512], [150, 512, 512], &[0], &[near, pillar]);
        b.models.push(DModel {
            mins: [-512.0; 3],
            maxs: [512.0; 3],
            firstface: 0,
            numfaces: 1,
            firstbrush: 0,
            numbrushes: 3,
        });
        b
    }

    /// A wide floor with a 16 unit step starting at x = 64.
    pub fn stairs() -> Self {
        let mut b = Self::new();
        b.entities = "{\n\"classname\" \"worldspawn\"\n}\n\0".to_string();
        let tex = b.texture("textures/base_floor/step", SurfaceFlags::empty(), Contents::SOLID);
        b.box_brush([-512.0, -512.0, -16.0], [1024.0, 512.0, 0.0], tex);
        b.box_brush([64.0, -256.0, 0.0], [512.0, 256.0, 16.0], tex);
        b.quad_face(
            [
                [-512.0, -512.0, 0.0],
                [1024.0, -512.0, 0.0],
                [1024.0, 512.0, 0.0],
                [-512.0, 512.0, 0.0],
            ],
            [0.0, 0.0, 1.0],
            tex,
        );
        b
    }
}

pub fn box_room_map() -> Vec<u8> {
    MapBuilder::box_room().build()
}

pub fn vis_map() -> Vec<u8> {
    MapBuilder::vis_layout().build()
}

pub fn stairs_map() -> Vec<u8> {
    MapBuilder::stairs().build()
}
