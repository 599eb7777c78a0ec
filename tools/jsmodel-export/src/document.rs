//! The exported model document
//!
//! Field names follow the JSON model format 3.1. Key order in the written
//! text is decided by the emitter, not by declaration order here.

use serde::{Deserialize, Serialize};

/// A complete model document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub metadata: Metadata,
    pub scale: f64,
    pub materials: Vec<Material>,
    /// Flat `[x, y, z, ...]` world-space positions
    pub vertices: Vec<f64>,
    /// Flat `[x, y, z, ...]`
    pub normals: Vec<f64>,
    /// Packed `0xRRGGBB`; index 0 is the opaque-white sentinel when present
    pub colors: Vec<u32>,
    /// Flat `[u, v, ...]`
    pub uvs: Vec<f64>,
    /// Concatenated face records
    pub faces: Vec<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bones: Vec<Bone>,
    /// Two bone indices per vertex, -1 for an unused slot
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skin_indices: Vec<i32>,
    /// Two weights per vertex, matching `skin_indices`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skin_weights: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animation: Option<Animation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub format_version: f64,
    pub generated_by: String,
    pub vertices: usize,
    pub faces: usize,
    pub normals: usize,
    pub colors: usize,
    pub uvs: usize,
    pub materials: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bones: Option<usize>,
}

/// A material record
///
/// Optional fields are left out of the document when `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    #[serde(rename = "DbgColor")]
    pub dbg_color: u32,
    #[serde(rename = "DbgIndex")]
    pub dbg_index: u32,
    #[serde(rename = "DbgName")]
    pub dbg_name: String,
    pub shading: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_diffuse: Option<[f64; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_ambient: Option<[f64; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_specular: Option<[f64; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specular_coef: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transparency: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transparent: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub double_sided: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flip_sided: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertex_colors: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_diffuse: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_diffuse_repeat: Option<[u32; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_specular: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_specular_repeat: Option<[u32; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_bump: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_bump_repeat: Option<[u32; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_normal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_normal_repeat: Option<[u32; 2]>,
}

/// A bone in bind pose, relative to its parent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bone {
    /// Index into the bone list, -1 for a root
    pub parent: i32,
    pub name: String,
    pub pos: [f64; 3],
    /// Quaternion `[x, y, z, w]`
    pub rotq: [f64; 4],
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Animation {
    pub name: String,
    pub fps: u32,
    /// Seconds
    pub length: f64,
    /// One track per bone, in bone order
    pub hierarchy: Vec<AnimationTrack>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnimationTrack {
    pub parent: i32,
    pub keys: Vec<AnimationKey>,
}

/// A sampled key; the terminal key carries only `time`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnimationKey {
    pub time: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pos: Option<[f64; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rot: Option<[f64; 4]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scl: Option<[u32; 3]>,
}

impl AnimationKey {
    pub fn is_terminal(&self) -> bool {
        self.pos.is_none() && self.rot.is_none() && self.scl.is_none()
    }
}
