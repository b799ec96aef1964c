//! Error types for asset registration and lookup.

use thiserror::Error;

use crate::{MeshId, TextureId};

/// Error type for asset catalog operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssetError {
    /// A mesh was registered twice under the same ID.
    #[error("mesh {0:?} is already registered")]
    DuplicateMesh(MeshId),

    /// A texture was registered twice under the same ID.
    #[error("texture {0:?} is already registered")]
    DuplicateTexture(TextureId),

    /// A mesh lookup referenced an unknown ID.
    #[error("mesh {0:?} is not registered")]
    MissingMesh(MeshId),

    /// A texture lookup referenced an unknown ID.
    #[error("texture {0:?} is not registered")]
    MissingTexture(TextureId),

    /// Rejected asset data (empty vertices, zero extent, size mismatch).
    #[error("invalid asset data: {0}")]
    InvalidData(String),
}

/// Result type alias for asset operations.
pub type AssetResult<T> = Result<T, AssetError>;
