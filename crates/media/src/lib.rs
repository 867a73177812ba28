//! Reel Media Model
//!
//! The backend-independent data model for recording sessions: what to
//! record (targets and devices), how to record it (options and the JSON
//! wire format), what flows through a session (timestamped sample
//! buffers on independent channels), and the pure transform that turns a
//! target/options pair into a validated stream plan.
//!
//! Nothing in this crate touches a capture backend or a container
//! writer; it is all value types and validation.

pub mod buffer;
pub mod devices;
pub mod format;
pub mod options;
pub mod plan;
pub mod target;

pub use buffer::{SampleBuffer, StreamChannel};
pub use devices::{AudioDevice, ExternalDevice, Frame, Screen, Window};
pub use format::ContainerFormat;
pub use options::{CropArea, RecordRequest, RecordingOptions, VideoCodec};
pub use plan::StreamPlan;
pub use target::RecordingTarget;
