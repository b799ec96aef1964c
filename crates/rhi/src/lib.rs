//! Vulkan abstraction layer for the glint renderer.
//!
//! This crate provides a safe abstraction over Vulkan using the `ash` crate:
//! - Instance and device creation
//! - Swapchain creation and surface capability selection
//! - Command pool / command buffer recording
//! - Buffer and image allocation with staging uploads
//! - Render pass, pipeline, and descriptor management
//! - Synchronization primitives

mod error;

pub mod buffer;
pub mod command;
pub mod descriptor;
pub mod device;
pub mod format;
pub mod image;
pub mod instance;
pub mod physical_device;
pub mod pipeline;
pub mod render_pass;
pub mod sampler;
pub mod shader;
pub mod swapchain;
pub mod sync;
pub mod upload;
pub mod vertex;

pub use error::{RhiError, RhiResult};

// Re-export ash types that users might need
pub use ash::vk;
