//! Reel Common Utilities
//!
//! Shared infrastructure for all Reel crates:
//! - Error types and result aliases
//! - Media-time arithmetic and the recording clock
//! - Tracing/logging initialization
//! - Configuration loading

pub mod config;
pub mod error;
pub mod logging;
pub mod time;

pub use config::*;
pub use error::*;
pub use time::*;
