//! Reel Recording Engine
//!
//! Coordinates one recording session across a capture backend, multiple
//! media channels, and one output container.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────┐
//! │                  Recorder                       │
//! │  ┌───────────────┐        ┌──────────────────┐ │
//! │  │ CaptureBackend│─events→│  session core    │ │
//! │  │ (per-channel  │        │  (one lock:      │ │
//! │  │  buffer tasks)│        │   state, offset, │ │
//! │  └───────────────┘        │   last frame)    │ │
//! │                           └────────┬─────────┘ │
//! │                                    ▼            │
//! │                         ┌────────────────────┐ │
//! │                         │  ContainerWriter   │ │
//! │                         │  (muxed output)    │ │
//! │                         └────────────────────┘ │
//! └────────────────────────────────────────────────┘
//! ```
//!
//! Buffers arrive concurrently, one delivery context per channel. The
//! session serializes them through a single lock and rewrites their
//! timestamps so pause/resume leaves no gap in the output timeline.

pub mod backend;
pub mod power;
pub mod session;
pub mod timing;
pub mod writer;

pub use backend::{default_backend, CaptureBackend, CaptureEvent, SyntheticBackend};
pub use session::{EventSink, Recorder, SessionState};
pub use writer::ContainerWriter;
