//! jsmodel-export library
//!
//! Converts meshes, skins and skeletal animation from a scene into JSON model
//! format 3.1 documents. The scene is reached only through the
//! [`SceneSource`] trait; [`SceneDescription`] is the JSON-backed
//! implementation the CLI uses.

pub mod animation;
pub mod attributes;
pub mod document;
pub mod error;
pub mod export;
pub mod formats;
pub mod manifest;
pub mod material;
pub mod mesh;
pub mod scene;
pub mod skeleton;

// Re-export format constants from shared
pub use jsmodel_shared::{
    FACE_COLOR, FACE_MATERIAL, FACE_NORMAL, FACE_QUAD, FACE_UV, FACE_VERTEX_COLOR,
    FACE_VERTEX_NORMAL, FACE_VERTEX_UV, FORMAT_VERSION, FrameRate, MODEL_EXT,
};

pub use document::{Animation, AnimationKey, AnimationTrack, Bone, Document, Material, Metadata};
pub use error::{ExportError, SourceError};
pub use export::{ExportOptions, ExportResult, Exporter, export_scene};
pub use formats::{Style, encode_document, write_model};
pub use mesh::FaceRecord;
pub use scene::{FsTextureResolver, SceneDescription, SceneSource, TextureResolver};
