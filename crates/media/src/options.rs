//! Recording options and the JSON wire format.
//!
//! Host processes pass a single JSON object; field names are camelCase
//! with a couple of legacy aliases (`fps`, `micDeviceId`,
//! `audioSourceId`) kept for older callers. Missing fields take the
//! documented defaults, so a decoded-then-re-encoded options object
//! reproduces the caller's values modulo defaulting.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use reel_common::error::{ReelError, ReelResult};
use serde::{Deserialize, Serialize};

use crate::target::{RecordingTarget, MAIN_SCREEN_ID};

/// Video codec used for the video channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VideoCodec {
    #[default]
    #[serde(rename = "h264")]
    H264,
    #[serde(rename = "hevc")]
    Hevc,
    #[serde(rename = "proRes422")]
    ProRes422,
    #[serde(rename = "proRes4444")]
    ProRes4444,
}

impl VideoCodec {
    /// ProRes streams only mux into QuickTime containers.
    pub fn requires_mov(&self) -> bool {
        matches!(self, Self::ProRes422 | Self::ProRes4444)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::H264 => "h264",
            Self::Hevc => "hevc",
            Self::ProRes422 => "proRes422",
            Self::ProRes4444 => "proRes4444",
        }
    }
}

impl fmt::Display for VideoCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for VideoCodec {
    type Err = ReelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "h264" => Ok(Self::H264),
            "hevc" => Ok(Self::Hevc),
            "proRes422" => Ok(Self::ProRes422),
            "proRes4444" => Ok(Self::ProRes4444),
            other => Err(ReelError::invalid_options(format!(
                "unknown video codec {other:?} (expected h264, hevc, proRes422, or proRes4444)"
            ))),
        }
    }
}

/// Crop rectangle in screen points, origin top-left of the target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CropArea {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CropArea {
    /// Reject rectangles no backend can capture.
    pub fn validate(&self) -> ReelResult<()> {
        let fields = [self.x, self.y, self.width, self.height];
        if fields.iter().any(|v| !v.is_finite()) {
            return Err(ReelError::invalid_crop("coordinates must be finite"));
        }
        if self.x < 0.0 || self.y < 0.0 {
            return Err(ReelError::invalid_crop("origin must be non-negative"));
        }
        if self.width <= 0.0 || self.height <= 0.0 {
            return Err(ReelError::invalid_crop(format!(
                "size must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

fn default_fps() -> u32 {
    30
}

fn default_true() -> bool {
    true
}

/// User-facing recording options. Captured once at session start and
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingOptions {
    /// Output file path. The extension selects the container format.
    pub destination: PathBuf,

    /// Target frame rate for the video channel.
    #[serde(default = "default_fps", alias = "fps")]
    pub frames_per_second: u32,

    /// Optional crop rectangle within the target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop_area: Option<CropArea>,

    /// Whether the cursor is captured.
    #[serde(default = "default_true")]
    pub show_cursor: bool,

    /// Whether mouse clicks are visually highlighted.
    #[serde(default)]
    pub highlight_clicks: bool,

    /// Video codec. Defaults to H.264.
    #[serde(default)]
    pub video_codec: VideoCodec,

    /// Record audio losslessly instead of AAC.
    #[serde(default)]
    pub lossless_audio: bool,

    /// Capture system audio on its own channel.
    #[serde(default)]
    pub record_system_audio: bool,

    /// Microphone to capture, if any.
    #[serde(
        default,
        alias = "micDeviceId",
        skip_serializing_if = "Option::is_none"
    )]
    pub microphone_device_id: Option<String>,

    /// System-audio output device to tap, if not the default one.
    #[serde(
        default,
        alias = "audioSourceId",
        skip_serializing_if = "Option::is_none"
    )]
    pub audio_device_id: Option<String>,
}

impl RecordingOptions {
    pub fn new(destination: impl Into<PathBuf>) -> Self {
        Self {
            destination: destination.into(),
            frames_per_second: default_fps(),
            crop_area: None,
            show_cursor: true,
            highlight_clicks: false,
            video_codec: VideoCodec::default(),
            lossless_audio: false,
            record_system_audio: false,
            microphone_device_id: None,
            audio_device_id: None,
        }
    }
}

/// The full CLI wire object: recording options plus target selection.
///
/// Exactly one target field should be set; when none is, the primary
/// display is recorded (the legacy default).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordRequest {
    #[serde(flatten)]
    pub options: RecordingOptions,

    /// Screen identifier, or `"main"` for the primary display.
    #[serde(
        default,
        alias = "displayId",
        skip_serializing_if = "Option::is_none"
    )]
    pub screen_id: Option<String>,

    /// Window identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_id: Option<String>,

    /// External device identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_device_id: Option<String>,

    /// Record audio only, no video channel.
    #[serde(default)]
    pub audio_only: bool,
}

impl RecordRequest {
    /// Resolve the target selection fields into a `RecordingTarget`.
    pub fn target(&self) -> ReelResult<RecordingTarget> {
        let mut selected = 0;
        for set in [
            self.audio_only,
            self.external_device_id.is_some(),
            self.window_id.is_some(),
            self.screen_id.is_some(),
        ] {
            if set {
                selected += 1;
            }
        }
        if selected > 1 {
            return Err(ReelError::invalid_options(
                "more than one recording target specified",
            ));
        }

        if self.audio_only {
            return Ok(RecordingTarget::AudioOnly);
        }
        if let Some(id) = &self.external_device_id {
            return Ok(RecordingTarget::ExternalDevice { id: id.clone() });
        }
        if let Some(id) = &self.window_id {
            return Ok(RecordingTarget::Window { id: id.clone() });
        }
        let id = self
            .screen_id
            .clone()
            .unwrap_or_else(|| MAIN_SCREEN_ID.to_string());
        Ok(RecordingTarget::Screen { id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_wire_object_takes_defaults() {
        let options: RecordingOptions =
            serde_json::from_str(r#"{"destination": "out.mp4"}"#).unwrap();
        assert_eq!(options.destination, PathBuf::from("out.mp4"));
        assert_eq!(options.frames_per_second, 30);
        assert!(options.show_cursor);
        assert!(!options.highlight_clicks);
        assert_eq!(options.video_codec, VideoCodec::H264);
        assert!(options.crop_area.is_none());
        assert!(options.microphone_device_id.is_none());
    }

    #[test]
    fn wire_round_trip_preserves_fields() {
        let json = r#"{
            "destination": "demo.mov",
            "framesPerSecond": 60,
            "cropArea": {"x": 10, "y": 20, "width": 640, "height": 480},
            "showCursor": false,
            "highlightClicks": true,
            "videoCodec": "proRes422",
            "losslessAudio": true,
            "recordSystemAudio": true,
            "microphoneDeviceId": "built-in-mic"
        }"#;
        let options: RecordingOptions = serde_json::from_str(json).unwrap();
        let encoded = serde_json::to_string(&options).unwrap();
        let back: RecordingOptions = serde_json::from_str(&encoded).unwrap();
        assert_eq!(back, options);
        assert_eq!(back.frames_per_second, 60);
        assert_eq!(back.video_codec, VideoCodec::ProRes422);
        assert_eq!(back.crop_area.unwrap().width, 640.0);
        assert_eq!(back.microphone_device_id.as_deref(), Some("built-in-mic"));
    }

    #[test]
    fn legacy_aliases_are_accepted() {
        let options: RecordingOptions = serde_json::from_str(
            r#"{"destination": "out.mp4", "fps": 24, "micDeviceId": "usb-mic"}"#,
        )
        .unwrap();
        assert_eq!(options.frames_per_second, 24);
        assert_eq!(options.microphone_device_id.as_deref(), Some("usb-mic"));
    }

    #[test]
    fn unknown_codec_is_rejected() {
        let err = serde_json::from_str::<RecordingOptions>(
            r#"{"destination": "out.mp4", "videoCodec": "av1"}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("av1"));
    }

    #[test]
    fn request_defaults_to_main_screen() {
        let request: RecordRequest =
            serde_json::from_str(r#"{"destination": "out.mp4"}"#).unwrap();
        assert_eq!(request.target().unwrap(), RecordingTarget::main_screen());
    }

    #[test]
    fn request_with_display_id_alias_selects_screen() {
        let request: RecordRequest =
            serde_json::from_str(r#"{"destination": "out.mp4", "displayId": "7"}"#).unwrap();
        assert_eq!(
            request.target().unwrap(),
            RecordingTarget::Screen { id: "7".into() }
        );
    }

    #[test]
    fn conflicting_targets_are_rejected() {
        let request: RecordRequest = serde_json::from_str(
            r#"{"destination": "out.mp4", "screenId": "1", "windowId": "2"}"#,
        )
        .unwrap();
        assert!(request.target().is_err());
    }

    #[test]
    fn crop_area_validation() {
        assert!(CropArea {
            x: 0.0,
            y: 0.0,
            width: 100.0,
            height: 100.0
        }
        .validate()
        .is_ok());

        assert!(CropArea {
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 100.0
        }
        .validate()
        .is_err());

        assert!(CropArea {
            x: -5.0,
            y: 0.0,
            width: 100.0,
            height: 100.0
        }
        .validate()
        .is_err());

        assert!(CropArea {
            x: 0.0,
            y: f64::NAN,
            width: 100.0,
            height: 100.0
        }
        .validate()
        .is_err());
    }
}
