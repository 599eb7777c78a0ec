//! Scene-data collaborator
//!
//! The exporter never walks a scene graph itself. Everything it knows about
//! meshes, shading, skins and joint motion comes through [`SceneSource`]
//! queries, and texture references are turned into files on disk by a
//! [`TextureResolver`].

mod description;
mod interpolate;

use std::path::{Path, PathBuf};

use glam::DMat4;
use jsmodel_shared::FrameRate;
use serde::{Deserialize, Serialize};

use crate::error::SourceResult;

pub use description::{FaceData, JointKey, JointNode, MeshNode, SceneDescription};

/// Read-only view of the authoring application's scene
///
/// Meshes, faces and joints are addressed by name and local index. All
/// positions and matrices are world space.
pub trait SceneSource {
    /// Mesh nodes in `selection`, in scene order. An empty selection means every mesh.
    fn mesh_nodes(&self, selection: &[String]) -> Vec<String>;

    /// World-space vertex positions
    fn vertex_positions(&self, mesh: &str) -> SourceResult<Vec<[f64; 3]>>;

    fn face_count(&self, mesh: &str) -> SourceResult<usize>;

    /// Mesh-local vertex indices of a face, in winding order
    fn face_vertices(&self, mesh: &str, face: usize) -> SourceResult<Vec<usize>>;

    /// One UV per corner
    fn face_uvs(&self, mesh: &str, face: usize) -> SourceResult<Vec<[f64; 2]>>;

    /// One normal per corner
    fn face_normals(&self, mesh: &str, face: usize) -> SourceResult<Vec<[f64; 3]>>;

    /// Whether any corner of the mesh has an authored color
    fn has_vertex_colors(&self, mesh: &str) -> SourceResult<bool>;

    /// One entry per corner, `None` where no color is authored
    fn face_colors(&self, mesh: &str, face: usize) -> SourceResult<Vec<Option<[f64; 3]>>>;

    /// Shading group assigned to a face
    fn face_shading_group(&self, mesh: &str, face: usize) -> SourceResult<Option<String>>;

    fn shading_group(&self, name: &str) -> SourceResult<ShadingGroup>;

    fn surface_flags(&self, mesh: &str) -> SourceResult<SurfaceFlags>;

    /// Skin deformer bound to the mesh, if any
    fn skin(&self, mesh: &str) -> SourceResult<Option<SkinBinding>>;

    /// Ancestors of a joint, nearest first
    fn joint_ancestors(&self, joint: &str) -> SourceResult<Vec<String>>;

    /// World matrix of a joint at `frame`, or in its current pose when `None`
    fn joint_world_matrix(&self, joint: &str, frame: Option<f64>) -> SourceResult<DMat4>;

    /// Authored keyframe times (in frames) across the given joints
    fn keyframe_times(&self, joints: &[String]) -> SourceResult<Vec<f64>>;

    fn frame_rate(&self) -> SourceResult<FrameRate>;
}

/// Per-mesh surface flags copied onto the materials it references first
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SurfaceFlags {
    pub double_sided: bool,
    pub opposite: bool,
}

/// Skin deformer data for one mesh
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkinBinding {
    /// Influence joints, in deformer order
    pub influences: Vec<String>,
    /// `weights[vertex][influence]`
    pub weights: Vec<Vec<f64>>,
}

/// A named shading assignment and the shader behind it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShadingGroup {
    pub name: String,
    #[serde(flatten)]
    pub model: ShadingModel,
}

/// Shading model, resolved once when a material is first collected
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shading", rename_all = "snake_case")]
pub enum ShadingModel {
    /// Lit with diffuse and optionally specular terms (lambert, phong, blinn)
    #[serde(rename = "phong")]
    PhongLike(PhongParams),
    /// Unlit surface color
    Basic(BasicParams),
    /// Anything else, exported with default shading
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhongParams {
    #[serde(default = "default_diffuse")]
    pub diffuse: [f64; 3],
    #[serde(default)]
    pub ambient: [f64; 3],
    /// Per-channel transparency, 0 = opaque
    #[serde(default)]
    pub transparency: [f64; 3],
    /// `None` for lambert
    #[serde(default)]
    pub specular: Option<Specular>,
    #[serde(default)]
    pub diffuse_map: Option<TextureInput>,
    #[serde(default)]
    pub bump_map: Option<TextureInput>,
}

impl Default for PhongParams {
    fn default() -> Self {
        Self {
            diffuse: default_diffuse(),
            ambient: [0.0; 3],
            transparency: [0.0; 3],
            specular: None,
            diffuse_map: None,
            bump_map: None,
        }
    }
}

fn default_diffuse() -> [f64; 3] {
    [0.5, 0.5, 0.5]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Specular {
    pub color: [f64; 3],
    pub roughness: Roughness,
    #[serde(default)]
    pub map: Option<TextureInput>,
}

/// Highlight-size parameter, one per specular shading model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Roughness {
    /// Phong cosine power, used as the exponent directly
    CosinePower(f64),
    /// Blinn eccentricity in (0, 1]
    Eccentricity(f64),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BasicParams {
    #[serde(default)]
    pub color: [f64; 3],
}

/// What drives a texturable material channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextureInput {
    /// A file texture
    File(String),
    /// A bump node over a file texture; non-zero interpretation means tangent-space normals
    Bump { interpretation: u32, file: String },
    /// A procedural node that would need baking
    Procedural(String),
}

/// Resolves a texture file reference to an existing file
pub trait TextureResolver {
    /// Absolute path of the texture, or `None` if it cannot be found
    fn resolve(&self, file: &str) -> Option<PathBuf>;
}

/// Resolves texture references against the file system
///
/// Relative references are taken relative to `base`.
#[derive(Debug, Clone)]
pub struct FsTextureResolver {
    base: PathBuf,
}

impl FsTextureResolver {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }
}

impl TextureResolver for FsTextureResolver {
    fn resolve(&self, file: &str) -> Option<PathBuf> {
        self.base.join(file).canonicalize().ok()
    }
}
