//! Montage Common Utilities
//!
//! Shared infrastructure for all Montage crates:
//! - Error taxonomy and result aliases
//! - Frame/timecode conversions
//! - Tracing/logging initialization
//! - Configuration loading

pub mod config;
pub mod error;
pub mod logging;
pub mod timecode;

pub use config::*;
pub use error::*;
pub use timecode::*;
