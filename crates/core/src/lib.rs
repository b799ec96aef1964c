//! Core utilities shared across the glint renderer.
//!
//! This crate provides foundational types used by every other crate:
//! - Error type and result alias
//! - Logging initialization
//! - Frame timer

mod error;
mod logging;
mod timer;

pub use error::{Error, Result};
pub use logging::init_logging;
pub use timer::Timer;
