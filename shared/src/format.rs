//! JSON model format 3.1 constants
//!
//! A face record in the `faces` array is a bitmask followed by a variable
//! number of integer fields:
//!
//! ```text
//! mask
//! vertex indices        (3, or 4 when FACE_QUAD)
//! material index        (FACE_MATERIAL)
//! face uv index         (FACE_UV)
//! vertex uv indices     (FACE_VERTEX_UV, one per corner)
//! face normal index     (FACE_NORMAL)
//! vertex normal indices (FACE_VERTEX_NORMAL, one per corner)
//! face color index      (FACE_COLOR)
//! vertex color indices  (FACE_VERTEX_COLOR, one per corner)
//! ```

// ============================================================================
// Face Mask Bits
// ============================================================================

/// Face has four corners instead of three
pub const FACE_QUAD: u8 = 0b0000_0001;
/// Face carries a material index
pub const FACE_MATERIAL: u8 = 0b0000_0010;
/// Face carries a single face-level UV index
pub const FACE_UV: u8 = 0b0000_0100;
/// Face carries one UV index per corner
pub const FACE_VERTEX_UV: u8 = 0b0000_1000;
/// Face carries a single face-level normal index
pub const FACE_NORMAL: u8 = 0b0001_0000;
/// Face carries one normal index per corner
pub const FACE_VERTEX_NORMAL: u8 = 0b0010_0000;
/// Face carries a single face-level color index
pub const FACE_COLOR: u8 = 0b0100_0000;
/// Face carries one color index per corner
pub const FACE_VERTEX_COLOR: u8 = 0b1000_0000;

/// Faces with more corners than this are dropped on export
pub const MAX_FACE_CORNERS: usize = 4;

/// Number of corners described by a face mask
#[inline]
pub const fn face_corners(mask: u8) -> usize {
    if mask & FACE_QUAD != 0 { 4 } else { 3 }
}

/// Number of integer fields following the mask of a face record
#[inline]
pub const fn face_stride(mask: u8) -> usize {
    let corners = face_corners(mask);
    let mut stride = corners;

    if mask & FACE_MATERIAL != 0 {
        stride += 1;
    }
    if mask & FACE_UV != 0 {
        stride += 1;
    }
    if mask & FACE_VERTEX_UV != 0 {
        stride += corners;
    }
    if mask & FACE_NORMAL != 0 {
        stride += 1;
    }
    if mask & FACE_VERTEX_NORMAL != 0 {
        stride += corners;
    }
    if mask & FACE_COLOR != 0 {
        stride += 1;
    }
    if mask & FACE_VERTEX_COLOR != 0 {
        stride += corners;
    }

    stride
}

// ============================================================================
// Decimal Precision
// ============================================================================

pub const DECIMALS_VERTICES: u32 = 4;
pub const DECIMALS_UVS: u32 = 3;
pub const DECIMALS_NORMALS: u32 = 3;
/// Colors are rounded to this precision before 8-bit quantisation
pub const DECIMALS_COLORS: u32 = 3;
pub const DECIMALS_WEIGHTS: u32 = 3;
pub const DECIMALS_POS: u32 = 3;
pub const DECIMALS_ROT: u32 = 3;
pub const DECIMALS_TIME: u32 = 3;
/// Scalar material terms: `specularCoef` and `transparency`
pub const DECIMALS_MATERIAL: u32 = 3;

// ============================================================================
// Document Constants
// ============================================================================

/// Value of `metadata.formatVersion`
pub const FORMAT_VERSION: f64 = 3.1;

/// Default value of `metadata.generatedBy`
pub const GENERATED_BY: &str = "jsmodel-export";

/// Extension of an exported model document
pub const MODEL_EXT: &str = "js";

/// Name of the single exported animation clip
pub const ANIMATION_NAME: &str = "anim0";

/// Skin influences kept per vertex
pub const MAX_INFLUENCES: usize = 2;

/// Skin index of an unused influence slot
pub const NO_BONE: i32 = -1;

/// Shared color index used by corners without an authored color
pub const DEFAULT_COLOR_INDEX: u32 = 0;

/// Packed color stored at [`DEFAULT_COLOR_INDEX`] (opaque white)
pub const DEFAULT_COLOR: u32 = 0xFF_FFFF;

/// Value of a material's `DbgColor`
pub const DEBUG_COLOR: u32 = 0xFF_FFFF;
