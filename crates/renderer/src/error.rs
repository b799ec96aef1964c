//! Renderer-specific error types.

use thiserror::Error;

use glint_assets::{MeshId, TextureId};
use glint_rhi::RhiError;

/// Renderer-specific error type.
///
/// Recoverable conditions (an out-of-date swapchain, a minimized window)
/// never surface as errors; the frame loop handles them internally. Anything
/// that does surface here is fatal for the renderer.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Error from the Vulkan abstraction layer
    #[error("RHI error: {0}")]
    Rhi(#[from] RhiError),

    /// Windowing or surface error from the platform layer
    #[error("Platform error: {0}")]
    Platform(#[from] glint_core::Error),

    /// A mesh was uploaded twice under the same ID
    #[error("Mesh {0:?} is already resident on the GPU")]
    DuplicateMesh(MeshId),

    /// A texture was uploaded twice under the same ID
    #[error("Texture {0:?} is already resident on the GPU")]
    DuplicateTexture(TextureId),

    /// The texture format does not support linear-filtered blits, which
    /// mipmap generation requires
    #[error("Texture format {0:?} does not support linear blits for mipmap generation")]
    UnsupportedBlitFormat(ash::vk::Format),
}

/// Result type alias for renderer operations.
pub type RenderResult<T> = std::result::Result<T, RenderError>;
