//! Scene-side collaborators for the renderer.
//!
//! Currently just the camera; instance transforms are handed to the
//! renderer directly through its draw submission.

pub mod camera;

pub use camera::Camera;
