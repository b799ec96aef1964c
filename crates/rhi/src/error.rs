//! RHI-specific error types.

use thiserror::Error;

/// RHI-specific error type.
///
/// Everything except [`RhiError::SwapchainOutOfDate`] is treated as fatal by
/// the frame loop; the out-of-date case is recoverable through swapchain
/// recreation.
#[derive(Error, Debug)]
pub enum RhiError {
    /// Vulkan API error
    #[error("Vulkan error: {0}")]
    Vulkan(#[from] ash::vk::Result),

    /// Failed to load the Vulkan library
    #[error("Failed to load Vulkan: {0}")]
    Loading(#[from] ash::LoadingError),

    /// GPU allocator error
    #[error("Allocator error: {0}")]
    Allocator(#[from] gpu_allocator::AllocationError),

    /// No suitable GPU found
    #[error("No suitable GPU found")]
    NoSuitableGpu,

    /// No candidate format satisfies the required features
    #[error("No supported format among {candidates:?} with features {features:?}")]
    NoSupportedFormat {
        /// Candidate formats that were scanned.
        candidates: Vec<ash::vk::Format>,
        /// Feature flags none of the candidates provided.
        features: ash::vk::FormatFeatureFlags,
    },

    /// Shader blob loading or module creation error
    #[error("Shader error: {0}")]
    Shader(String),

    /// Surface creation or query error
    #[error("Surface error: {0}")]
    Surface(String),

    /// Swapchain creation error
    #[error("Swapchain error: {0}")]
    Swapchain(String),

    /// Misuse of a resource handle or invalid parameters
    #[error("Invalid resource: {0}")]
    InvalidResource(String),

    /// Pipeline creation error
    #[error("Pipeline error: {0}")]
    Pipeline(String),
}

/// Result type alias for RHI operations.
pub type RhiResult<T> = std::result::Result<T, RhiError>;
