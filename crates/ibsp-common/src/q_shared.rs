// q_shared.rs — vector math, planes, content flags and trace results shared by every module

pub type Vec3 = [f32; 3];

pub const VEC3_ORIGIN: Vec3 = [0.0, 0.0, 0.0];

// angle indexes
pub const PITCH: usize = 0;
pub const YAW: usize = 1;
pub const ROLL: usize = 2;

// ============================================================
// Vector math
// ============================================================

#[inline]
pub fn dot_product(a: &Vec3, b: &Vec3) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

#[inline]
pub fn vector_add(a: &Vec3, b: &Vec3) -> Vec3 {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

/// `veca + scale * vecb`
#[inline]
pub fn vector_ma(veca: &Vec3, scale: f32, vecb: &Vec3) -> Vec3 {
    [
        veca[0] + scale * vecb[0],
        veca[1] + scale * vecb[1],
        veca[2] + scale * vecb[2],
    ]
}

#[inline]
pub fn vector_scale(v: &Vec3, scale: f32) -> Vec3 {
    [v[0] * scale, v[1] * scale, v[2] * scale]
}

#[inline]
pub fn vector_length(v: &Vec3) -> f32 {
    dot_product(v, v).sqrt()
}

/// Normalizes in place and returns the original length. Zero vectors are left alone.
pub fn vector_normalize(v: &mut Vec3) -> f32 {
    let length = vector_length(v);
    if length != 0.0 {
        let ilength = 1.0 / length;
        v[0] *= ilength;
        v[1] *= ilength;
        v[2] *= ilength;
    }
    length
}

pub fn cross_product(v1: &Vec3, v2: &Vec3) -> Vec3 {
    [
        v1[1] * v2[2] - v1[2] * v2[1],
        v1[2] * v2[0] - v1[0] * v2[2],
        v1[0] * v2[1] - v1[1] * v2[0],
    ]
}

#[inline]
pub fn vector_compare(v1: &Vec3, v2: &Vec3) -> bool {
    v1[0] == v2[0] && v1[1] == v2[1] && v1[2] == v2[2]
}

/// Linear blend between two points at parameter `frac`.
#[inline]
pub fn vector_lerp(from: &Vec3, to: &Vec3, frac: f32) -> Vec3 {
    [
        from[0] + frac * (to[0] - from[0]),
        from[1] + frac * (to[1] - from[1]),
        from[2] + frac * (to[2] - from[2]),
    ]
}

/// Forward, right and up vectors for pitch/yaw/roll angles in degrees.
/// Z is up, yaw rotates about Z starting at +X.
pub fn angle_vectors(angles: &Vec3) -> (Vec3, Vec3, Vec3) {
    let (sy, cy) = angles[YAW].to_radians().sin_cos();
    let (sp, cp) = angles[PITCH].to_radians().sin_cos();
    let (sr, cr) = angles[ROLL].to_radians().sin_cos();

    let forward = [cp * cy, cp * sy, -sp];
    let right = [
        -sr * sp * cy + cr * sy,
        -sr * sp * sy - cr * cy,
        -sr * cp,
    ];
    let up = [
        cr * sp * cy + sr * sy,
        cr * sp * sy - sr * cy,
        cr * cp,
    ];
    (forward, right, up)
}

// ============================================================
// Planes
// ============================================================

// plane_type values: 0-2 are axial planes
pub const PLANE_X: u8 = 0;
pub const PLANE_Y: u8 = 1;
pub const PLANE_Z: u8 = 2;
pub const PLANE_NON_AXIAL: u8 = 3;

/// Runtime plane. `plane_type` and `signbits` are derived from the normal at load time.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CPlane {
    pub normal: Vec3,
    pub dist: f32,
    pub plane_type: u8,
    pub signbits: u8,
}

impl CPlane {
    pub fn new(normal: Vec3, dist: f32) -> Self {
        Self {
            normal,
            dist,
            plane_type: plane_type_for_normal(&normal),
            signbits: signbits_for_normal(&normal),
        }
    }

    /// Signed distance from the plane to `p`.
    #[inline]
    pub fn distance(&self, p: &Vec3) -> f32 {
        if self.plane_type < 3 {
            p[self.plane_type as usize] - self.dist
        } else {
            dot_product(&self.normal, p) - self.dist
        }
    }
}

pub fn plane_type_for_normal(normal: &Vec3) -> u8 {
    if normal[0] == 1.0 {
        PLANE_X
    } else if normal[1] == 1.0 {
        PLANE_Y
    } else if normal[2] == 1.0 {
        PLANE_Z
    } else {
        PLANE_NON_AXIAL
    }
}

pub fn signbits_for_normal(normal: &Vec3) -> u8 {
    let mut bits = 0u8;
    for (j, n) in normal.iter().enumerate() {
        if *n < 0.0 {
            bits |= 1 << j;
        }
    }
    bits
}

/// Returns 1 (front), 2 (back), or 3 (crossing) for a box vs. plane test.
pub fn box_on_plane_side(emins: &Vec3, emaxs: &Vec3, p: &CPlane) -> i32 {
    // fast axial cases
    if p.plane_type < 3 {
        let t = p.plane_type as usize;
        if p.dist <= emins[t] {
            return 1;
        }
        if p.dist >= emaxs[t] {
            return 2;
        }
        return 3;
    }

    // general case: signbits pick the nearest and farthest corners
    let mut near = [0.0f32; 3];
    let mut far = [0.0f32; 3];
    for j in 0..3 {
        if p.signbits & (1 << j) != 0 {
            far[j] = emins[j];
            near[j] = emaxs[j];
        } else {
            far[j] = emaxs[j];
            near[j] = emins[j];
        }
    }
    let dist1 = dot_product(&p.normal, &far);
    let dist2 = dot_product(&p.normal, &near);

    let mut sides = 0;
    if dist1 >= p.dist {
        sides = 1;
    }
    if dist2 < p.dist {
        sides |= 2;
    }
    sides
}

// ============================================================
// Content and surface flags (as stored in the texture lump)
// ============================================================

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Contents: i32 {
        const SOLID         = 0x00000001;
        const LAVA          = 0x00000008;
        const SLIME         = 0x00000010;
        const WATER         = 0x00000020;
        const FOG           = 0x00000040;
        const AREAPORTAL    = 0x00008000;
        const PLAYERCLIP    = 0x00010000;
        const MONSTERCLIP   = 0x00020000;
        const TELEPORTER    = 0x00040000;
        const JUMPPAD       = 0x00080000;
        const CLUSTERPORTAL = 0x00100000;
        const DONOTENTER    = 0x00200000;
        const BOTCLIP       = 0x00400000;
        const MOVER         = 0x00800000;
        const ORIGIN        = 0x01000000;
        const BODY          = 0x02000000;
        const CORPSE        = 0x04000000;
        const DETAIL        = 0x08000000;
        const STRUCTURAL    = 0x10000000;
        const TRANSLUCENT   = 0x20000000;
        const TRIGGER       = 0x40000000;
        const NODROP        = i32::MIN;
    }
}

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct SurfaceFlags: i32 {
        const NODAMAGE    = 0x00001;
        const SLICK       = 0x00002;
        const SKY         = 0x00004;
        const LADDER      = 0x00008;
        const NOIMPACT    = 0x00010;
        const NOMARKS     = 0x00020;
        const FLESH       = 0x00040;
        const NODRAW      = 0x00080;
        const HINT        = 0x00100;
        const SKIP        = 0x00200;
        const NOLIGHTMAP  = 0x00400;
        const POINTLIGHT  = 0x00800;
        const METALSTEPS  = 0x01000;
        const NOSTEPS     = 0x02000;
        const NONSOLID    = 0x04000;
        const LIGHTFILTER = 0x08000;
        const ALPHASHADOW = 0x10000;
        const NODLIGHT    = 0x20000;
        const DUST        = 0x40000;
    }
}

// content masks
pub const MASK_ALL: Contents = Contents::all();
pub const MASK_SOLID: Contents = Contents::SOLID;
pub const MASK_PLAYERSOLID: Contents = Contents::SOLID
    .union(Contents::PLAYERCLIP)
    .union(Contents::BODY);
pub const MASK_MONSTERSOLID: Contents = Contents::SOLID
    .union(Contents::MONSTERCLIP)
    .union(Contents::BODY);
pub const MASK_WATER: Contents = Contents::WATER
    .union(Contents::LAVA)
    .union(Contents::SLIME);

// ============================================================
// Trace
// ============================================================

/// Result of a sweep. `fraction` is in [0, 1]; `endpos` is exactly the
/// requested end when nothing was hit.
#[derive(Debug, Clone, Copy)]
pub struct Trace {
    /// the whole sweep was inside a solid brush
    pub allsolid: bool,
    /// the start position was inside a solid brush
    pub startsolid: bool,
    pub fraction: f32,
    pub endpos: Vec3,
    /// plane of the surface that was hit
    pub plane: CPlane,
    pub surface_flags: SurfaceFlags,
    pub contents: Contents,
}

impl Default for Trace {
    fn default() -> Self {
        Self {
            allsolid: false,
            startsolid: false,
            fraction: 1.0,
            endpos: [0.0; 3],
            plane: CPlane::default(),
            surface_flags: SurfaceFlags::empty(),
            contents: Contents::empty(),
        }
    }
}

impl Trace {
    /// True when the sweep stopped short of its end.
    #[inline]
    pub fn hit(&self) -> bool {
        self.fraction < 1.0
    }
}

// ============================================================
// Tests
// ============================================================
