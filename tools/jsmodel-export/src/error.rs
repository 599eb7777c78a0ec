//! Error types for the export pipeline

use std::path::PathBuf;

use thiserror::Error;

/// Fault raised by a [`SceneSource`](crate::scene::SceneSource) query
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SourceError {
    /// The queried node does not exist
    #[error("node '{0}' not found in scene")]
    MissingNode(String),

    /// The node exists but has no data of the requested kind
    ///
    /// Tolerated for per-face UV, normal and color queries.
    #[error("'{node}' has no {attribute}")]
    MissingAttribute {
        node: String,
        attribute: &'static str,
    },

    /// The node's data is inconsistent (index out of range, length mismatch, ...)
    #[error("invalid data on '{node}': {message}")]
    InvalidData { node: String, message: String },
}

impl SourceError {
    pub(crate) fn invalid(node: &str, message: impl Into<String>) -> Self {
        SourceError::InvalidData {
            node: node.to_string(),
            message: message.into(),
        }
    }
}

/// The error type for an export call
///
/// An export either produces a complete document or fails with one of these.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The selection contained no mesh
    #[error("no mesh found in selection {0:?}")]
    NoMeshSelected(Vec<String>),

    /// A collaborator fault while exporting one mesh
    #[error("failed to export mesh '{mesh}': {source}")]
    Mesh {
        mesh: String,
        #[source]
        source: SourceError,
    },

    /// A collaborator fault while baking a bone's bind transform
    #[error("failed to export joint '{joint}': {source}")]
    Skeleton {
        joint: String,
        #[source]
        source: SourceError,
    },

    /// A collaborator fault while sampling the animation
    #[error("failed to bake animation: {0}")]
    Animation(#[source] SourceError),

    /// A scene description file could not be loaded
    #[error("failed to load scene {path:?}: {message}")]
    Scene { path: PathBuf, message: String },

    /// The document could not be converted for emission
    #[error("failed to encode document: {0}")]
    Encode(#[from] serde_json::Error),

    /// IO error while writing the document or copying textures
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = ExportError> = std::result::Result<T, E>;

/// Result of a scene query
pub type SourceResult<T> = std::result::Result<T, SourceError>;
