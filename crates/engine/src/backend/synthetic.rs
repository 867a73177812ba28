//! Synthetic capture backend.
//!
//! Produces generated buffers on every planned channel from tokio tasks,
//! against a shared monotonic clock. Used by the CLI's `--backend
//! synthetic` mode and by end-to-end tests; it is the only way to run a
//! full recording off macOS.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use reel_common::error::ReelResult;
use reel_common::time::{MediaTime, RecordingClock};
use reel_media::{
    AudioDevice, ExternalDevice, Frame, SampleBuffer, Screen, StreamChannel, StreamPlan, Window,
};

use crate::backend::{CaptureBackend, CaptureEvent};
use crate::session::EventSink;
use crate::writer::{ContainerWriter, RawSegmentWriter};

const AUDIO_PACKET: Duration = Duration::from_millis(20);

/// A backend with one fixed display, one audio input, one window, and
/// one external device.
pub struct SyntheticBackend {
    stop: Arc<AtomicBool>,
    tasks: Vec<JoinHandle<()>>,
}

impl SyntheticBackend {
    pub fn new() -> Self {
        Self {
            stop: Arc::new(AtomicBool::new(false)),
            tasks: Vec::new(),
        }
    }
}

impl Default for SyntheticBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn spawn_channel(
    sink: EventSink,
    stop: Arc<AtomicBool>,
    clock: RecordingClock,
    channel: StreamChannel,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let duration = MediaTime::from_nanos(interval.as_nanos() as i64);
        let mut index: u64 = 0;
        loop {
            ticker.tick().await;
            if stop.load(Ordering::Acquire) {
                break;
            }
            let payload = format!("{channel}:{index}").into_bytes();
            let buffer = SampleBuffer::new(clock.now(), duration).with_payload(payload);
            sink.deliver(CaptureEvent::Buffer { channel, buffer });
            index += 1;
        }
        tracing::debug!(%channel, produced = index, "Synthetic channel task exiting");
    })
}

#[async_trait::async_trait]
impl CaptureBackend for SyntheticBackend {
    async fn ensure_permission(&self) -> ReelResult<()> {
        Ok(())
    }

    async fn list_screens(&self) -> ReelResult<Vec<Screen>> {
        Ok(vec![Screen {
            id: "1".into(),
            name: "Synthetic Display".into(),
            width: 1920,
            height: 1080,
            frame: Frame {
                x: 0.0,
                y: 0.0,
                width: 1920.0,
                height: 1080.0,
            },
            primary: true,
        }])
    }

    async fn list_windows(&self) -> ReelResult<Vec<Window>> {
        Ok(vec![Window {
            id: "100".into(),
            title: Some("Synthetic Window".into()),
            app_name: Some("Synthetic".into()),
            app_bundle_id: Some("dev.reel.synthetic".into()),
            is_active: true,
            is_on_screen: true,
            layer: 0,
            frame: Frame {
                x: 40.0,
                y: 40.0,
                width: 800.0,
                height: 600.0,
            },
        }])
    }

    async fn list_audio_devices(&self) -> ReelResult<Vec<AudioDevice>> {
        Ok(vec![AudioDevice {
            id: "synthetic-input".into(),
            name: "Synthetic Input".into(),
        }])
    }

    async fn list_external_devices(&self) -> ReelResult<Vec<ExternalDevice>> {
        Ok(vec![ExternalDevice {
            id: "synthetic-device".into(),
            name: "Synthetic Device".into(),
        }])
    }

    fn open_writer(&self, plan: &StreamPlan) -> ReelResult<Box<dyn ContainerWriter>> {
        Ok(Box::new(RawSegmentWriter::create(plan)?))
    }

    async fn start_capture(&mut self, plan: &StreamPlan, sink: EventSink) -> ReelResult<()> {
        self.stop.store(false, Ordering::Release);
        let clock = RecordingClock::start();
        let video_interval = Duration::from_nanos(
            MediaTime::frame_interval(plan.options.frames_per_second).as_nanos() as u64,
        );
        for &channel in &plan.channels {
            let interval = if channel.is_audio() {
                AUDIO_PACKET
            } else {
                video_interval
            };
            self.tasks.push(spawn_channel(
                sink.clone(),
                self.stop.clone(),
                clock.clone(),
                channel,
                interval,
            ));
        }
        tracing::debug!(channels = self.tasks.len(), "Synthetic capture started");
        Ok(())
    }

    async fn stop_capture(&mut self) -> ReelResult<()> {
        self.stop.store(true, Ordering::Release);
        for task in self.tasks.drain(..) {
            let _ = task.await;
        }
        Ok(())
    }
}
