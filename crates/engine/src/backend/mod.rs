//! Capture backend seam.
//!
//! A backend enumerates recordable devices, produces sample buffers for
//! the channels of a [`StreamPlan`], and supplies the container writer
//! the session muxes into. The native ScreenCaptureKit backend only
//! exists on macOS; the synthetic backend runs everywhere and feeds the
//! session generated buffers, which keeps the whole pipeline testable on
//! any platform.

use async_trait::async_trait;

use reel_common::error::{ReelError, ReelResult};
use reel_media::{AudioDevice, ExternalDevice, SampleBuffer, Screen, StreamChannel, StreamPlan, Window};

use crate::session::EventSink;
use crate::writer::ContainerWriter;

pub mod screencapturekit;
pub mod synthetic;

pub use synthetic::SyntheticBackend;

/// Something a backend tells the session.
#[derive(Debug)]
pub enum CaptureEvent {
    /// One captured sample on one channel, raw backend timestamps.
    Buffer {
        channel: StreamChannel,
        buffer: SampleBuffer,
    },
    /// The stream died on its own (device unplugged, capture interrupted).
    /// Never sent in response to `stop_capture`.
    Stopped { error: ReelError },
}

/// A source of capture data.
///
/// `start_capture` must not block for the duration of the recording; it
/// returns once capture is confirmed running and delivers buffers through
/// the sink from backend-owned tasks or threads.
#[async_trait]
pub trait CaptureBackend: Send {
    /// Verify (and where possible, request) recording permission.
    async fn ensure_permission(&self) -> ReelResult<()>;

    async fn list_screens(&self) -> ReelResult<Vec<Screen>>;

    async fn list_windows(&self) -> ReelResult<Vec<Window>>;

    async fn list_audio_devices(&self) -> ReelResult<Vec<AudioDevice>>;

    async fn list_external_devices(&self) -> ReelResult<Vec<ExternalDevice>>;

    /// Create the container writer for this plan's destination.
    fn open_writer(&self, plan: &StreamPlan) -> ReelResult<Box<dyn ContainerWriter>>;

    /// Begin producing buffers for every channel in the plan.
    async fn start_capture(&mut self, plan: &StreamPlan, sink: EventSink) -> ReelResult<()>;

    /// Stop producing buffers. Idempotent.
    async fn stop_capture(&mut self) -> ReelResult<()>;
}

/// The backend for the current platform.
pub fn default_backend() -> ReelResult<Box<dyn CaptureBackend>> {
    #[cfg(target_os = "macos")]
    {
        Ok(Box::new(screencapturekit::ScreenCaptureKitBackend::new()))
    }
    #[cfg(not(target_os = "macos"))]
    {
        Err(ReelError::platform(
            "no native capture backend for this platform (use the synthetic backend)",
        ))
    }
}
