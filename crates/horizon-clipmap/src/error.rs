//! Error taxonomy for clipmap construction and block drawing.

use crate::layout::MeshShape;

/// Errors raised while building or drawing a clipmap.
///
/// Every variant is a construction-time condition: once a [`Clipmap`](crate::Clipmap)
/// exists, per-frame assembly cannot fail.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClipmapError {
    /// A mesh grid with a zero dimension, or too many vertices to stay below
    /// the primitive-restart sentinel.
    #[error("invalid mesh dimensions: {rows} rows x {columns} columns")]
    InvalidDimensions { rows: u32, columns: u32 },

    /// Clipmap parameters that cannot describe a valid ring set.
    #[error("invalid clipmap configuration: {reason}")]
    InvalidConfiguration { reason: String },

    /// A block was drawn before its mesh was uploaded.
    #[error("{shape:?} block drawn before upload")]
    NotInitialized { shape: MeshShape },

    /// The graphics backend rejected a mesh upload.
    #[error("failed to upload {shape:?} block: {message}")]
    UploadFailure { shape: MeshShape, message: String },

    /// The graphics backend could not build the clipmap shader program.
    #[error("failed to create shader program '{name}': {message}")]
    ShaderFailure { name: String, message: String },
}

impl ClipmapError {
    pub(crate) fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            reason: reason.into(),
        }
    }
}
