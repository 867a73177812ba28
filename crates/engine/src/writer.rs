//! Container writer seam.
//!
//! The session talks to the output container through this trait. On
//! macOS the real implementation wraps the platform asset writer; tests
//! use a mock; the synthetic backend writes a raw segment dump so the
//! full pipeline is exercisable on any platform.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use reel_common::error::{ReelError, ReelResult};
use reel_common::time::MediaTime;
use reel_media::{SampleBuffer, StreamChannel, StreamPlan};

/// Serializes per-channel sample buffers into one output file.
///
/// Invariants enforced by implementations:
/// - each channel is added at most once, before the session begins;
/// - no buffer is appended before `begin_session`;
/// - each channel is finished at most once.
pub trait ContainerWriter: Send {
    /// Attach a channel input. Fails if the channel is already attached
    /// or the session has begun.
    fn add_channel(&mut self, channel: StreamChannel) -> ReelResult<()>;

    /// Begin the writing session at a concrete source time (the first
    /// accepted buffer's raw timestamp).
    fn begin_session(&mut self, start: MediaTime) -> ReelResult<()>;

    /// Whether the channel's input can accept more data right now.
    /// Buffers offered while not ready are dropped, never queued.
    fn is_ready_for(&self, channel: StreamChannel) -> bool;

    /// Append one adjusted buffer to the channel's input.
    fn append(&mut self, channel: StreamChannel, buffer: &SampleBuffer) -> ReelResult<()>;

    /// Mark a channel's input as complete.
    fn finish_channel(&mut self, channel: StreamChannel) -> ReelResult<()>;

    /// Flush and close the container. Dropping a writer without calling
    /// this abandons the output.
    fn finalize(&mut self) -> ReelResult<()>;
}

/// Raw segment writer: a JSONL sample index at the destination path plus
/// a sidecar `.raw` file holding the concatenated payloads.
///
/// Not a playable container; it exists so the session, backends, and
/// tooling can run end-to-end where no platform muxer is available, and
/// so tests can inspect exactly what was written.
pub struct RawSegmentWriter {
    index: BufWriter<File>,
    raw: BufWriter<File>,
    raw_bytes: u64,
    added: Vec<StreamChannel>,
    finished: Vec<StreamChannel>,
    begun: Option<MediaTime>,
}

impl RawSegmentWriter {
    pub fn create(plan: &StreamPlan) -> ReelResult<Self> {
        let destination = &plan.options.destination;
        let index = BufWriter::new(File::create(destination)?);
        let raw = BufWriter::new(File::create(raw_path(destination))?);

        let mut writer = Self {
            index,
            raw,
            raw_bytes: 0,
            added: Vec::new(),
            finished: Vec::new(),
            begun: None,
        };
        writer.write_line(&serde_json::json!({
            "event": "header",
            "kind": "reel-raw-segment",
            "container": plan.container,
            "codec": plan.options.video_codec.name(),
            "channels": plan.channels,
        }))?;
        Ok(writer)
    }

    fn write_line(&mut self, value: &serde_json::Value) -> ReelResult<()> {
        serde_json::to_writer(&mut self.index, value)?;
        self.index.write_all(b"\n")?;
        Ok(())
    }
}

impl ContainerWriter for RawSegmentWriter {
    fn add_channel(&mut self, channel: StreamChannel) -> ReelResult<()> {
        if self.begun.is_some() {
            return Err(ReelError::writer("cannot add a channel after the session began"));
        }
        if self.added.contains(&channel) {
            return Err(ReelError::writer(format!("channel {channel} already added")));
        }
        self.added.push(channel);
        Ok(())
    }

    fn begin_session(&mut self, start: MediaTime) -> ReelResult<()> {
        if self.begun.is_some() {
            return Err(ReelError::writer("session already began"));
        }
        if self.added.is_empty() {
            return Err(ReelError::writer("no channels attached"));
        }
        self.write_line(&serde_json::json!({
            "event": "begin",
            "source_time_ns": start.as_nanos(),
        }))?;
        self.begun = Some(start);
        Ok(())
    }

    fn is_ready_for(&self, channel: StreamChannel) -> bool {
        self.added.contains(&channel) && !self.finished.contains(&channel)
    }

    fn append(&mut self, channel: StreamChannel, buffer: &SampleBuffer) -> ReelResult<()> {
        if self.begun.is_none() {
            return Err(ReelError::writer("append before begin_session"));
        }
        if !self.is_ready_for(channel) {
            return Err(ReelError::writer(format!(
                "channel {channel} is not accepting data"
            )));
        }
        self.raw.write_all(&buffer.payload)?;
        let offset = self.raw_bytes;
        self.raw_bytes += buffer.payload.len() as u64;
        self.write_line(&serde_json::json!({
            "event": "sample",
            "channel": channel,
            "pts_ns": buffer.pts.as_nanos(),
            "dts_ns": buffer.dts.map(MediaTime::as_nanos),
            "duration_ns": buffer.duration.as_nanos(),
            "bytes": buffer.payload.len(),
            "offset": offset,
        }))
    }

    fn finish_channel(&mut self, channel: StreamChannel) -> ReelResult<()> {
        if !self.added.contains(&channel) {
            return Err(ReelError::writer(format!("channel {channel} was never added")));
        }
        if self.finished.contains(&channel) {
            return Err(ReelError::writer(format!("channel {channel} finished twice")));
        }
        self.finished.push(channel);
        self.write_line(&serde_json::json!({
            "event": "finish",
            "channel": channel,
        }))
    }

    fn finalize(&mut self) -> ReelResult<()> {
        self.write_line(&serde_json::json!({
            "event": "finalize",
            "raw_bytes": self.raw_bytes,
        }))?;
        self.index.flush()?;
        self.raw.flush()?;
        Ok(())
    }
}

/// Sidecar path for payload bytes: `<destination>.raw`.
fn raw_path(destination: &Path) -> PathBuf {
    let mut os = destination.as_os_str().to_os_string();
    os.push(".raw");
    PathBuf::from(os)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reel_media::{RecordingOptions, RecordingTarget};

    fn plan_for(dir: &Path) -> StreamPlan {
        let mut options = RecordingOptions::new(dir.join("out.mp4"));
        options.record_system_audio = true;
        StreamPlan::build(RecordingTarget::main_screen(), options).unwrap()
    }

    fn sample(pts_ms: i64, payload: &[u8]) -> SampleBuffer {
        SampleBuffer::new(MediaTime::from_millis(pts_ms), MediaTime::from_millis(33))
            .with_payload(payload.to_vec())
    }

    #[test]
    fn writes_index_and_payload_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let plan = plan_for(dir.path());
        let mut writer = RawSegmentWriter::create(&plan).unwrap();

        writer.add_channel(StreamChannel::Video).unwrap();
        writer.add_channel(StreamChannel::SystemAudio).unwrap();
        writer.begin_session(MediaTime::ZERO).unwrap();
        writer.append(StreamChannel::Video, &sample(0, b"frame0")).unwrap();
        writer
            .append(StreamChannel::SystemAudio, &sample(0, b"pcm"))
            .unwrap();
        writer.finish_channel(StreamChannel::Video).unwrap();
        writer.finish_channel(StreamChannel::SystemAudio).unwrap();
        writer.finalize().unwrap();
        drop(writer);

        let index = std::fs::read_to_string(plan.options.destination.clone()).unwrap();
        let lines: Vec<serde_json::Value> = index
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines[0]["event"], "header");
        assert_eq!(lines[1]["event"], "begin");
        assert_eq!(lines[2]["channel"], "video");
        assert_eq!(lines.last().unwrap()["event"], "finalize");

        let raw = std::fs::read(raw_path(&plan.options.destination)).unwrap();
        assert_eq!(raw, b"frame0pcm");
    }

    #[test]
    fn enforces_channel_invariants() {
        let dir = tempfile::tempdir().unwrap();
        let plan = plan_for(dir.path());
        let mut writer = RawSegmentWriter::create(&plan).unwrap();

        writer.add_channel(StreamChannel::Video).unwrap();
        assert!(writer.add_channel(StreamChannel::Video).is_err());

        // Appending before begin is a writer error.
        assert!(writer.append(StreamChannel::Video, &sample(0, b"x")).is_err());

        writer.begin_session(MediaTime::ZERO).unwrap();
        assert!(writer.begin_session(MediaTime::ZERO).is_err());
        assert!(writer.add_channel(StreamChannel::Microphone).is_err());

        writer.finish_channel(StreamChannel::Video).unwrap();
        assert!(writer.finish_channel(StreamChannel::Video).is_err());
        assert!(!writer.is_ready_for(StreamChannel::Video));
        assert!(writer.append(StreamChannel::Video, &sample(0, b"x")).is_err());
    }
}
