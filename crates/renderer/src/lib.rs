//! Frame-submission core for the glint renderer.
//!
//! This crate turns per-frame draw submissions into presented frames:
//! - Swapchain lifecycle with deferred, atomic recreation
//! - Frames-in-flight synchronization with a per-image fence table
//! - GPU-resident meshes and mipmapped textures
//! - Per-frame instanced batching keyed by mesh and texture
//! - Per-image command recording with an overlay hook
//!
//! [`Renderer`] is the entry point; everything else supports it.

mod batch;
mod depth_buffer;
mod error;
mod frame;
mod gpu_assets;
mod recorder;
mod renderer;
mod targets;
mod ubo;

pub use batch::{DrawSubmission, InstanceRecord};
pub use error::{RenderError, RenderResult};
pub use recorder::OverlayDraw;
pub use renderer::{Renderer, RendererConfig};
pub use ubo::CameraUbo;
