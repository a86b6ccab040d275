// qfiles.rs — IBSP version 46 on-disk structures
//
// Every record is a fixed-layout little-endian struct that can be decoded
// straight from the lump bytes.

use bytemuck::{Pod, Zeroable};

// ============================================================
// BSP file format
// ============================================================

/// BSP magic: "IBSP" in little-endian
pub const IDBSPHEADER: i32 = (b'P' as i32) << 24 | (b'S' as i32) << 16 | (b'B' as i32) << 8 | b'I' as i32;
pub const BSPVERSION: i32 = 46;

pub const LUMP_ENTITIES: usize = 0;
pub const LUMP_TEXTURES: usize = 1;
pub const LUMP_PLANES: usize = 2;
pub const LUMP_NODES: usize = 3;
pub const LUMP_LEAFS: usize = 4;
pub const LUMP_LEAFFACES: usize = 5;
pub const LUMP_LEAFBRUSHES: usize = 6;
pub const LUMP_MODELS: usize = 7;
pub const LUMP_BRUSHES: usize = 8;
pub const LUMP_BRUSHSIDES: usize = 9;
pub const LUMP_VERTEXES: usize = 10;
pub const LUMP_MESHVERTS: usize = 11;
pub const LUMP_EFFECTS: usize = 12;
pub const LUMP_FACES: usize = 13;
pub const LUMP_LIGHTMAPS: usize = 14;
pub const LUMP_LIGHTVOLS: usize = 15;
pub const LUMP_VISIBILITY: usize = 16;
pub const HEADER_LUMPS: usize = 17;

/// Human-readable lump names, indexed by lump number.
pub const LUMP_NAMES: [&str; HEADER_LUMPS] = [
    "entities", "textures", "planes", "nodes", "leafs", "leaffaces", "leafbrushes",
    "models", "brushes", "brushsides", "vertexes", "meshverts", "effects", "faces",
    "lightmaps", "lightvols", "visibility",
];

pub const LIGHTMAP_SIZE: usize = 128;

// face types
pub const MST_BAD: i32 = 0;
pub const MST_PLANAR: i32 = 1;
pub const MST_PATCH: i32 = 2;
pub const MST_TRIANGLE_SOUP: i32 = 3;
pub const MST_FLARE: i32 = 4;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct Lump {
    pub fileofs: i32,
    pub filelen: i32,
}

#[derive(Debug, Clone, Copy, Pod, Zeroable)]
#[repr(C)]
pub struct DHeader {
    pub ident: i32,
    pub version: i32,
    pub lumps: [Lump; HEADER_LUMPS],
}

/// Texture (shader) reference with its surface and content flags.
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
#[repr(C)]
pub struct DTexture {
    pub name: [u8; 64],
    pub flags: i32,
    pub contents: i32,
}

impl DTexture {
    /// Name up to the first NUL.
    pub fn name(&self) -> String {
        let end = self.name.iter().position(|&b| b == 0).unwrap_or(self.name.len());
        String::from_utf8_lossy(&self.name[..end]).into_owned()
    }
}

#[derive(Debug, Clone, Copy, Default, Pod, Zeroable)]
#[repr(C)]
pub struct DPlane {
    pub normal: [f32; 3],
    pub dist: f32,
}

#[derive(Debug, Clone, Copy, Default, Pod, Zeroable)]
#[repr(C)]
pub struct DNode {
    pub planenum: i32,
    /// negative numbers are -(leafs + 1), not nodes
    pub children: [i32; 2],
    pub mins: [i32; 3],
    pub maxs: [i32; 3],
}

#[derive(Debug, Clone, Copy, Default, Pod, Zeroable)]
#[repr(C)]
pub struct DLeaf {
    /// -1 for leafs outside the map
    pub cluster: i32,
    pub area: i32,
    pub mins: [i32; 3],
    pub maxs: [i32; 3],
    pub firstleafface: i32,
    pub numleaffaces: i32,
    pub firstleafbrush: i32,
    pub numleafbrushes: i32,
}

#[derive(Debug, Clone, Copy, Default, Pod, Zeroable)]
#[repr(C)]
pub struct DModel {
    pub mins: [f32; 3],
    pub maxs: [f32; 3],
    pub firstface: i32,
    pub numfaces: i32,
    pub firstbrush: i32,
    pub numbrushes: i32,
}

#[derive(Debug, Clone, Copy, Default, Pod, Zeroable)]
#[repr(C)]
pub struct DBrush {
    pub firstside: i32,
    pub numsides: i32,
    pub texture: i32,
}

#[derive(Debug, Clone, Copy, Default, Pod, Zeroable)]
#[repr(C)]
pub struct DBrushSide {
    pub planenum: i32,
    pub texture: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct DVertex {
    pub position: [f32; 3],
    /// [0] surface coordinates, [1] lightmap coordinates
    pub texcoord: [[f32; 2]; 2],
    pub normal: [f32; 3],
    pub color: [u8; 4],
}

#[derive(Debug, Clone, Copy, Pod, Zeroable)]
#[repr(C)]
pub struct DEffect {
    pub name: [u8; 64],
    pub brush: i32,
    pub unknown: i32,
}

#[derive(Debug, Clone, Copy, Default, Pod, Zeroable)]
#[repr(C)]
pub struct DFace {
    pub texture: i32,
    pub effect: i32,
    pub face_type: i32,
    pub firstvertex: i32,
    pub numvertexes: i32,
    pub firstmeshvert: i32,
    pub nummeshverts: i32,
    pub lm_index: i32,
    pub lm_start: [i32; 2],
    pub lm_size: [i32; 2],
    pub lm_origin: [f32; 3],
    pub lm_vecs: [[f32; 3]; 2],
    pub normal: [f32; 3],
    /// patch control grid dimensions
    pub size: [i32; 2],
}

#[derive(Debug, Clone, Copy, Pod, Zeroable)]
#[repr(C)]
pub struct DLightmap {
    pub map: [[[u8; 3]; LIGHTMAP_SIZE]; LIGHTMAP_SIZE],
}

#[derive(Debug, Clone, Copy, Default, Pod, Zeroable)]
#[repr(C)]
pub struct DLightVol {
    pub ambient: [u8; 3],
    pub directional: [u8; 3],
    /// phi, theta
    pub dir: [u8; 2],
}

/// Leading fields of the visibility lump; `numvecs * sizevecs` bytes follow.
#[derive(Debug, Clone, Copy, Default, Pod, Zeroable)]
#[repr(C)]
pub struct DVisHeader {
    pub numvecs: i32,
    pub sizevecs: i32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::size_of;

    #[test]
    fn bsp_header_magic() {
        let bytes = IDBSPHEADER.to_le_bytes();
        assert_eq!(&bytes, b"IBSP");
    }

    #[test]
    fn bsp_version() {
        assert_eq!(BSPVERSION, 46);
        assert_eq!(HEADER_LUMPS, 17);
        assert_eq!(LUMP_NAMES[LUMP_VISIBILITY], "visibility");
    }

    #[test]
    fn size_of_dheader() {
        // ident(4) + version(4) + 17 * Lump(8) = 144
        assert_eq!(size_of::<DHeader>(), 144);
    }

    #[test]
    fn record_sizes() {
        assert_eq!(size_of::<DTexture>(), 72);
        assert_eq!(size_of::<DPlane>(), 16);
        assert_eq!(size_of::<DNode>(), 36);
        assert_eq!(size_of::<DLeaf>(), 48);
        assert_eq!(size_of::<DModel>(), 40);
        assert_eq!(size_of::<DBrush>(), 12);
        assert_eq!(size_of::<DBrushSide>(), 8);
        assert_eq!(size_of::<DVertex>(), 44);
        assert_eq!(size_of::<DEffect>(), 72);
        assert_eq!(size_of::<DFace>(), 104);
        assert_eq!(size_of::<DLightmap>(), 128 * 128 * 3);
        assert_eq!(size_of::<DLightVol>(), 8);
    }

    #[test]
    fn texture_name_stops_at_nul() {
        let mut t = DTexture::zeroed();
        t.name[..14].copy_from_slice(b"textures/floor");
        assert_eq!(t.name(), "textures/floor");
    }
}
