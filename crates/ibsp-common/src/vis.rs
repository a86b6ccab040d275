// vis.rs — PVS and frustum culling of map faces
//
// Once per frame per camera: locate the camera leaf, then walk every leaf,
// dropping those outside the camera cluster's PVS or outside the view
// frustum, and flag the faces of the survivors in `render_faces`.

use crate::bspfile::{BspMap, VisData};
use crate::cvar::cvar_variable_value;
use crate::patch::Patch;
use crate::q_shared::{angle_vectors, box_on_plane_side, dot_product, CPlane, Vec3};
use crate::qfiles::{DFace, MST_FLARE, MST_PATCH, MST_PLANAR, MST_TRIANGLE_SOUP};

pub type Mat4 = [[f32; 4]; 4];

// ============================================================
// Render faces
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceKind {
    Polygon,
    Patch,
    Mesh,
    Billboard,
    Bad,
}

impl FaceKind {
    pub fn from_face_type(face_type: i32) -> Self {
        match face_type {
            MST_PLANAR => FaceKind::Polygon,
            MST_PATCH => FaceKind::Patch,
            MST_TRIANGLE_SOUP => FaceKind::Mesh,
            MST_FLARE => FaceKind::Billboard,
            _ => FaceKind::Bad,
        }
    }
}

/// Per-face render state handed to the renderer. `visible` is rewritten by
/// every `update_visibility` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderFace {
    pub face: usize,
    pub kind: FaceKind,
    /// index into `BspMap::patches` for patch faces that tesselated
    pub patch: Option<usize>,
    pub visible: bool,
}

impl RenderFace {
    /// One entry per face, in face order.
    pub fn build(faces: &[DFace], patches: &[Patch]) -> Vec<RenderFace> {
        let mut out: Vec<RenderFace> = faces
            .iter()
            .enumerate()
            .map(|(i, f)| RenderFace {
                face: i,
                kind: FaceKind::from_face_type(f.face_type),
                patch: None,
                visible: false,
            })
            .collect();
        for (pi, p) in patches.iter().enumerate() {
            out[p.face].patch = Some(pi);
        }
        out
    }
}

// ============================================================
// Stats and options
// ============================================================

/// Counters from the last visibility pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VisStats {
    pub current_leaf: usize,
    pub current_cluster: i32,
    pub leafs_visible: usize,
    pub leafs_pvs_culled: usize,
    pub leafs_frustum_culled: usize,
    /// polygon and mesh faces
    pub faces_visible: usize,
    pub patches_visible: usize,
    pub billboards_visible: usize,
    pub vertexes_visible: usize,
    pub indexes_visible: usize,
}

impl VisStats {
    pub fn leafs_culled(&self) -> usize {
        self.leafs_pvs_culled + self.leafs_frustum_culled
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VisOptions {
    /// ignore the PVS
    pub novis: bool,
    /// ignore the view frustum
    pub nocull: bool,
}

impl VisOptions {
    pub fn from_cvars() -> Self {
        Self {
            novis: cvar_variable_value("r_novis") != 0.0,
            nocull: cvar_variable_value("r_nocull") != 0.0,
        }
    }
}

// ============================================================
// Camera and frustum
// ============================================================

fn mat4_mul(a: &Mat4, b: &Mat4) -> Mat4 {
    // column-major: m[col][row]
    let mut out = [[0.0f32; 4]; 4];
    for col in 0..4 {
        for row in 0..4 {
            out[col][row] = (0..4).map(|k| a[k][row] * b[col][k]).sum();
        }
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub origin: Vec3,
    /// column-major view-projection, m[col][row], GL clip space
    pub view_proj: Mat4,
}

impl Camera {
    pub fn from_matrix(origin: Vec3, view_proj: Mat4) -> Self {
        Self { origin, view_proj }
    }

    /// Perspective camera at `origin` looking along pitch/yaw/roll `angles`.
    /// `fov_y` is in degrees.
    pub fn new(origin: Vec3, angles: &Vec3, fov_y: f32, aspect: f32, znear: f32, zfar: f32) -> Self {
        let (forward, right, up) = angle_vectors(angles);

        // eye space looks down -Z with +Y up
        let mut view = [[0.0f32; 4]; 4];
        for i in 0..3 {
            view[i][0] = right[i];
            view[i][1] = up[i];
            view[i][2] = -forward[i];
        }
        view[3][0] = -dot_product(&right, &origin);
        view[3][1] = -dot_product(&up, &origin);
        view[3][2] = dot_product(&forward, &origin);
        view[3][3] = 1.0;

        let f = 1.0 / (fov_y.to_radians() * 0.5).tan();
        let mut proj = [[0.0f32; 4]; 4];
        proj[0][0] = f / aspect;
        proj[1][1] = f;
        proj[2][2] = (zfar + znear) / (znear - zfar);
        proj[2][3] = -1.0;
        proj[3][2] = 2.0 * zfar * znear / (znear - zfar);

        Self {
            origin,
            view_proj: mat4_mul(&proj, &view),
        }
    }
}

/// Six planes facing into the view volume.
#[derive(Debug, Clone, Copy)]
pub struct Frustum {
    pub planes: [CPlane; 6],
}

impl Frustum {
    /// Gribb/Hartmann extraction: left, right, bottom, top, near, far.
    pub fn from_view_projection(m: &Mat4) -> Self {
        let row = |r: usize| [m[0][r], m[1][r], m[2][r], m[3][r]];
        let (r0, r1, r2, r3) = (row(0), row(1), row(2), row(3));
        let combos = [
            (r0, 1.0f32),
            (r0, -1.0),
            (r1, 1.0),
            (r1, -1.0),
            (r2, 1.0),
            (r2, -1.0),
        ];
        let mut planes = [CPlane::default(); 6];
        for (plane, (r, sign)) in planes.iter_mut().zip(combos) {
            let p = [
                r3[0] + sign * r[0],
                r3[1] + sign * r[1],
                r3[2] + sign * r[2],
                r3[3] + sign * r[3],
            ];
            let len = (p[0] * p[0] + p[1] * p[1] + p[2] * p[2]).sqrt();
            let inv = if len > 0.0 { 1.0 / len } else { 0.0 };
            // inside when n.x + d >= 0, i.e. n.x >= -d
            *plane = CPlane::new([p[0] * inv, p[1] * inv, p[2] * inv], -p[3] * inv);
        }
        Self { planes }
    }

    /// True when the box lies entirely outside one of the planes.
    pub fn cull_box(&self, mins: &Vec3, maxs: &Vec3) -> bool {
        self.planes.iter().any(|p| box_on_plane_side(mins, maxs, p) == 2)
    }
}

// ============================================================
// Tree and PVS queries
// ============================================================

/// Walk the node tree down to the leaf containing `pos`. Points exactly on a
/// plane go to the front child. A map without nodes has a single leaf 0.
pub fn find_leaf(map: &BspMap, pos: &Vec3) -> usize {
    if map.nodes.is_empty() {
        return 0;
    }
    let mut num: i32 = 0;
    while num >= 0 {
        let node = &map.nodes[num as usize];
        let plane = &map.cplanes[node.planenum as usize];
        num = if plane.distance(pos) >= 0.0 {
            node.children[0]
        } else {
            node.children[1]
        };
    }
    !num as usize
}

/// Can anything in `test_cluster` be seen from `view_cluster`?
pub fn cluster_visible(vis: &VisData, view_cluster: i32, test_cluster: i32) -> bool {
    if test_cluster < 0 {
        return false;
    }
    if vis.is_empty() || view_cluster < 0 {
        return true;
    }
    let byte = test_cluster as usize * vis.sizevecs as usize + (view_cluster as usize >> 3);
    match vis.bits.get(byte) {
        Some(b) => b & (1 << (view_cluster & 7)) != 0,
        None => true,
    }
}

fn ivec(v: &[i32; 3]) -> Vec3 {
    [v[0] as f32, v[1] as f32, v[2] as f32]
}

/// Recompute `render_faces[i].visible` for `camera` and return the counters.
pub fn update_visibility(map: &mut BspMap, camera: &Camera, opts: VisOptions) -> VisStats {
    for rf in &mut map.render_faces {
        rf.visible = false;
    }

    let mut stats = VisStats::default();
    if map.leafs.is_empty() {
        stats.current_cluster = -1;
        return stats;
    }

    let frustum = Frustum::from_view_projection(&camera.view_proj);
    stats.current_leaf = find_leaf(map, &camera.origin);
    stats.current_cluster = map.leafs[stats.current_leaf].cluster;

    let BspMap {
        leafs,
        leaffaces,
        render_faces,
        faces,
        patches,
        visdata,
        ..
    } = map;

    for leaf in leafs.iter() {
        // leafs outside the map are dropped even with the PVS disabled
        if leaf.cluster < 0
            || (!opts.novis && !cluster_visible(visdata, stats.current_cluster, leaf.cluster))
        {
            stats.leafs_pvs_culled += 1;
            continue;
        }
        if !opts.nocull && frustum.cull_box(&ivec(&leaf.mins), &ivec(&leaf.maxs)) {
            stats.leafs_frustum_culled += 1;
            continue;
        }
        stats.leafs_visible += 1;

        let first = leaf.firstleafface as usize;
        let count = leaf.numleaffaces as usize;
        for &fi in &leaffaces[first..first + count] {
            let rf = &mut render_faces[fi as usize];
            if rf.visible {
                continue;
            }
            rf.visible = true;
            let face = &faces[fi as usize];
            match rf.kind {
                FaceKind::Polygon | FaceKind::Mesh => {
                    stats.faces_visible += 1;
                    stats.vertexes_visible += face.numvertexes as usize;
                    stats.indexes_visible += face.nummeshverts as usize;
                }
                FaceKind::Patch => {
                    stats.patches_visible += 1;
                    if let Some(p) = rf.patch.and_then(|pi| patches.get(pi)) {
                        stats.vertexes_visible += p.vertex_count();
                        stats.indexes_visible += p.index_count();
                    }
                }
                // billboards are flagged but not drawn, so not counted
                FaceKind::Billboard => stats.billboards_visible += 1,
                FaceKind::Bad => {}
            }
        }
    }
    stats
}

// ============================================================
// Tests
// ============================================================
