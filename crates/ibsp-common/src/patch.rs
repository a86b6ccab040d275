// patch.rs — biquadratic Bezier patch tesselation
//
// A patch face stores a (width x height) grid of control points, both odd.
// Each overlapping 3x3 window of that grid is one QuadraticPatch, tesselated
// into a fixed (level+1)^2 vertex grid.

use rayon::prelude::*;

use crate::common::com_dprintf;
use crate::q_shared::vector_normalize;
use crate::qfiles::{DFace, DVertex, MST_PATCH};

pub const TESSELATION_LEVEL: usize = 8;

/// Tesselate on the rayon pool when a map has at least this many patch faces.
const PARALLEL_PATCH_THRESHOLD: usize = 16;

/// `P(a) = P0(1-a)^2 + P1 2a(1-a) + P2 a^2`
#[inline]
fn bezier(p0: f32, p1: f32, p2: f32, a: f32) -> f32 {
    let b = 1.0 - a;
    p0 * b * b + p1 * 2.0 * a * b + p2 * a * a
}

fn blend_vertex(v0: &DVertex, v1: &DVertex, v2: &DVertex, a: f32) -> DVertex {
    let mut out = DVertex::default();
    for i in 0..3 {
        out.position[i] = bezier(v0.position[i], v1.position[i], v2.position[i], a);
        out.normal[i] = bezier(v0.normal[i], v1.normal[i], v2.normal[i], a);
    }
    for t in 0..2 {
        for i in 0..2 {
            out.texcoord[t][i] = bezier(v0.texcoord[t][i], v1.texcoord[t][i], v2.texcoord[t][i], a);
        }
    }
    for i in 0..4 {
        let c = bezier(v0.color[i] as f32, v1.color[i] as f32, v2.color[i] as f32, a);
        out.color[i] = c.round().clamp(0.0, 255.0) as u8;
    }
    out
}

#[derive(Debug, Clone, Default)]
pub struct QuadraticPatch {
    /// row-major 3x3 control grid
    pub controls: [DVertex; 9],
    pub vertexes: Vec<DVertex>,
    pub indexes: Vec<u32>,
}

impl QuadraticPatch {
    pub fn new(controls: [DVertex; 9]) -> Self {
        Self {
            controls,
            ..Default::default()
        }
    }

    /// Rebuild the vertex and index buffers at `level` subdivisions per side.
    /// Produces `(level+1)^2` vertexes and `6 * level^2` indexes; the output
    /// depends only on the control points.
    pub fn tesselate(&mut self, level: usize) {
        let level = level.max(1);
        let side = level + 1;

        self.vertexes.clear();
        self.vertexes.resize(side * side, DVertex::default());

        for u in 0..side {
            let a = u as f32 / level as f32;
            // sample each control row at u
            let rows = [0, 1, 2].map(|r| {
                let c = &self.controls[r * 3..r * 3 + 3];
                blend_vertex(&c[0], &c[1], &c[2], a)
            });
            // then run down the column through the three row samples
            for v in 0..side {
                let b = v as f32 / level as f32;
                let mut vert = blend_vertex(&rows[0], &rows[1], &rows[2], b);
                vector_normalize(&mut vert.normal);
                self.vertexes[v * side + u] = vert;
            }
        }

        self.indexes.clear();
        self.indexes.reserve(level * level * 6);
        for row in 0..level {
            for col in 0..level {
                let i0 = (row * side + col) as u32;
                let i1 = i0 + 1;
                let i2 = i0 + side as u32;
                let i3 = i2 + 1;
                self.indexes.extend_from_slice(&[i0, i2, i1, i1, i2, i3]);
            }
        }
    }
}

/// All 3x3 sub-patches of one patch face.
#[derive(Debug, Clone, Default)]
pub struct Patch {
    /// index into the face lump
    pub face: usize,
    pub width: usize,
    pub height: usize,
    pub subpatches: Vec<QuadraticPatch>,
}

impl Patch {
    /// Extract the overlapping 3x3 windows of a face's control grid, stepping
    /// two control points at a time. Returns None for grids that are not odd
    /// and at least 3x3, or that need more vertexes than the face owns.
    pub fn from_face(face_index: usize, face: &DFace, vertexes: &[DVertex]) -> Option<Patch> {
        let (w, h) = (face.size[0], face.size[1]);
        if w < 3 || h < 3 || w % 2 == 0 || h % 2 == 0 {
            com_dprintf(&format!("patch face {} has bad size {}x{}\n", face_index, w, h));
            return None;
        }
        let (width, height) = (w as usize, h as usize);
        let first = face.firstvertex.max(0) as usize;
        let count = face.numvertexes.max(0) as usize;
        if width * height > count || first + count > vertexes.len() {
            com_dprintf(&format!(
                "patch face {} needs {} control points, has {}\n",
                face_index, width * height, count
            ));
            return None;
        }
        let grid = &vertexes[first..first + width * height];

        let wide = (width - 1) / 2;
        let high = (height - 1) / 2;
        let mut subpatches = Vec::with_capacity(wide * high);
        for y in 0..high {
            for x in 0..wide {
                let mut controls = [DVertex::default(); 9];
                for row in 0..3 {
                    for col in 0..3 {
                        controls[row * 3 + col] = grid[(y * 2 + row) * width + x * 2 + col];
                    }
                }
                subpatches.push(QuadraticPatch::new(controls));
            }
        }

        Some(Patch {
            face: face_index,
            width,
            height,
            subpatches,
        })
    }

    pub fn tesselate(&mut self, level: usize) {
        for sp in &mut self.subpatches {
            sp.tesselate(level);
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.subpatches.iter().map(|p| p.vertexes.len()).sum()
    }

    pub fn index_count(&self) -> usize {
        self.subpatches.iter().map(|p| p.indexes.len()).sum()
    }
}

/// Build and tesselate a Patch for every well-formed patch face.
pub fn build_patches(faces: &[DFace], vertexes: &[DVertex]) -> Vec<Patch> {
    let mut patches: Vec<Patch> = faces
        .iter()
        .enumerate()
        .filter(|(_, f)| f.face_type == MST_PATCH)
        .filter_map(|(i, f)| Patch::from_face(i, f, vertexes))
        .collect();

    if patches.len() >= PARALLEL_PATCH_THRESHOLD {
        patches.par_iter_mut().for_each(|p| p.tesselate(TESSELATION_LEVEL));
    } else {
        for p in &mut patches {
            p.tesselate(TESSELATION_LEVEL);
        }
    }
    patches
}
