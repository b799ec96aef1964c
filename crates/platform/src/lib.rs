//! Windowing integration for the glint renderer.
//!
//! This crate owns the boundary to the window system: the winit window,
//! the Vulkan drawable surface, the framebuffer pixel extent, and the
//! read-and-clear resize flag the renderer polls each frame.

mod window;

pub use window::{required_instance_extensions, Surface, Window};
