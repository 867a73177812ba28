use reel_common::error::{ReelError, ReelResult};
use reel_media::{AudioDevice, ExternalDevice, Screen, StreamPlan, Window};

use crate::backend::CaptureBackend;
use crate::session::EventSink;
use crate::writer::ContainerWriter;

/// Compile-safe macOS backend skeleton.
///
/// TODO(platform/macos): implement ScreenCaptureKit enumeration and
/// capture plus the AVAssetWriter-backed container writer.
pub struct ScreenCaptureKitBackend;

impl ScreenCaptureKitBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ScreenCaptureKitBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn not_implemented() -> ReelError {
    ReelError::platform("macOS ScreenCaptureKit backend not yet implemented")
}

#[async_trait::async_trait]
impl CaptureBackend for ScreenCaptureKitBackend {
    async fn ensure_permission(&self) -> ReelResult<()> {
        Err(not_implemented())
    }

    async fn list_screens(&self) -> ReelResult<Vec<Screen>> {
        Err(not_implemented())
    }

    async fn list_windows(&self) -> ReelResult<Vec<Window>> {
        Err(not_implemented())
    }

    async fn list_audio_devices(&self) -> ReelResult<Vec<AudioDevice>> {
        Err(not_implemented())
    }

    async fn list_external_devices(&self) -> ReelResult<Vec<ExternalDevice>> {
        Err(not_implemented())
    }

    fn open_writer(&self, _plan: &StreamPlan) -> ReelResult<Box<dyn ContainerWriter>> {
        Err(not_implemented())
    }

    async fn start_capture(&mut self, _plan: &StreamPlan, _sink: EventSink) -> ReelResult<()> {
        Err(not_implemented())
    }

    async fn stop_capture(&mut self) -> ReelResult<()> {
        Ok(())
    }
}
