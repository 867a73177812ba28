//! Recording targets.

use serde::{Deserialize, Serialize};

/// Sentinel screen identifier meaning "the primary display".
pub const MAIN_SCREEN_ID: &str = "main";

/// What a session records. Immutable once the session starts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RecordingTarget {
    /// An entire display, identified by its screen id.
    Screen { id: String },
    /// A single window, identified by its window id.
    Window { id: String },
    /// An external device (e.g. an attached phone or tablet).
    ExternalDevice { id: String },
    /// Audio-only recording, no video channel.
    AudioOnly,
}

impl RecordingTarget {
    /// The primary display.
    pub fn main_screen() -> Self {
        Self::Screen {
            id: MAIN_SCREEN_ID.to_string(),
        }
    }

    /// The opaque target identifier, if this target carries one.
    pub fn identifier(&self) -> Option<&str> {
        match self {
            Self::Screen { id } | Self::Window { id } | Self::ExternalDevice { id } => {
                Some(id.as_str())
            }
            Self::AudioOnly => None,
        }
    }

    pub fn is_audio_only(&self) -> bool {
        matches!(self, Self::AudioOnly)
    }

    /// Short label used in logs and error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Screen { .. } => "screen",
            Self::Window { .. } => "window",
            Self::ExternalDevice { .. } => "external-device",
            Self::AudioOnly => "audio-only",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_is_present_for_visual_targets() {
        assert_eq!(
            RecordingTarget::Screen { id: "42".into() }.identifier(),
            Some("42")
        );
        assert_eq!(RecordingTarget::AudioOnly.identifier(), None);
    }

    #[test]
    fn target_serializes_with_type_tag() {
        let json = serde_json::to_value(RecordingTarget::main_screen()).unwrap();
        assert_eq!(json["type"], "screen");
        assert_eq!(json["id"], MAIN_SCREEN_ID);
    }
}
