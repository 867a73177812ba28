//! Sample buffers and stream channels.

use std::fmt;

use reel_common::time::MediaTime;
use serde::{Deserialize, Serialize};

/// One independent media stream multiplexed into the output container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamChannel {
    Video,
    SystemAudio,
    Microphone,
    ExternalAudio,
}

impl StreamChannel {
    /// All channels, in reference-priority order: the first active one
    /// in this order drives pause/resume offset recomputation.
    pub const ALL: [StreamChannel; 4] = [
        StreamChannel::Video,
        StreamChannel::SystemAudio,
        StreamChannel::Microphone,
        StreamChannel::ExternalAudio,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::SystemAudio => "system_audio",
            Self::Microphone => "microphone",
            Self::ExternalAudio => "external_audio",
        }
    }

    pub fn is_audio(&self) -> bool {
        !matches!(self, Self::Video)
    }
}

impl fmt::Display for StreamChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A timestamped media payload as delivered by a capture backend.
///
/// Timestamps are raw backend timestamps on arrival; the session
/// subtracts its cumulative pause offset before the buffer reaches the
/// container writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleBuffer {
    /// Presentation timestamp.
    pub pts: MediaTime,

    /// Decode timestamp, when it differs from `pts` (B-frames).
    pub dts: Option<MediaTime>,

    /// Duration of this sample.
    pub duration: MediaTime,

    /// Encoded payload bytes. Opaque to the session.
    pub payload: Vec<u8>,
}

impl SampleBuffer {
    pub fn new(pts: MediaTime, duration: MediaTime) -> Self {
        Self {
            pts,
            dts: None,
            duration,
            payload: Vec::new(),
        }
    }

    pub fn with_payload(mut self, payload: Vec<u8>) -> Self {
        self.payload = payload;
        self
    }

    pub fn with_dts(mut self, dts: MediaTime) -> Self {
        self.dts = Some(dts);
        self
    }

    /// Presentation end time (`pts + duration`).
    pub fn end_time(&self) -> MediaTime {
        self.pts + self.duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_time_is_pts_plus_duration() {
        let buf = SampleBuffer::new(MediaTime::from_millis(297), MediaTime::from_millis(33));
        assert_eq!(buf.end_time().as_millis(), 330);
    }

    #[test]
    fn channel_reference_priority_starts_with_video() {
        assert_eq!(StreamChannel::ALL[0], StreamChannel::Video);
        assert!(StreamChannel::SystemAudio.is_audio());
        assert!(!StreamChannel::Video.is_audio());
    }
}
