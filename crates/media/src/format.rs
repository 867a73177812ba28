//! Container format rules.
//!
//! The destination extension selects the container; the codec and the
//! target kind constrain which extensions are acceptable.

use std::path::Path;

use reel_common::error::{ReelError, ReelResult};
use serde::{Deserialize, Serialize};

use crate::options::VideoCodec;
use crate::target::RecordingTarget;

/// Output container, derived from the destination extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerFormat {
    Mp4,
    Mov,
    M4v,
    M4a,
}

impl ContainerFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "mp4" => Some(Self::Mp4),
            "mov" => Some(Self::Mov),
            "m4v" => Some(Self::M4v),
            "m4a" => Some(Self::M4a),
            _ => None,
        }
    }

    /// Whether the container can carry a video channel.
    pub fn supports_video(&self) -> bool {
        !matches!(self, Self::M4a)
    }
}

/// Check destination extension against target kind and codec, returning
/// the container to write.
pub fn validate_destination(
    destination: &Path,
    target: &RecordingTarget,
    codec: VideoCodec,
) -> ReelResult<ContainerFormat> {
    let extension = destination
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| {
            ReelError::invalid_extension("", "destination has no file extension")
        })?;

    let container = ContainerFormat::from_extension(extension).ok_or_else(|| {
        ReelError::invalid_extension(
            extension,
            "expected .mp4, .mov, or .m4v for video, or .m4a for audio-only",
        )
    })?;

    if target.is_audio_only() {
        if container.supports_video() {
            return Err(ReelError::invalid_extension(
                extension,
                "audio-only recordings must use .m4a",
            ));
        }
        return Ok(container);
    }

    if !container.supports_video() {
        return Err(ReelError::invalid_extension(
            extension,
            format!("a {} recording needs a video container", target.kind()),
        ));
    }

    if codec.requires_mov() && container != ContainerFormat::Mov {
        return Err(ReelError::invalid_extension(
            extension,
            format!("{codec} requires a .mov container"),
        ));
    }

    Ok(container)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn screen() -> RecordingTarget {
        RecordingTarget::main_screen()
    }

    #[test]
    fn video_extensions_are_accepted_for_screen_targets() {
        for (path, expected) in [
            ("out.mp4", ContainerFormat::Mp4),
            ("out.mov", ContainerFormat::Mov),
            ("out.M4V", ContainerFormat::M4v),
        ] {
            let container =
                validate_destination(&PathBuf::from(path), &screen(), VideoCodec::H264).unwrap();
            assert_eq!(container, expected);
        }
    }

    #[test]
    fn audio_only_requires_m4a() {
        let ok = validate_destination(
            &PathBuf::from("out.m4a"),
            &RecordingTarget::AudioOnly,
            VideoCodec::H264,
        );
        assert!(ok.is_ok());

        let err = validate_destination(
            &PathBuf::from("out.mp4"),
            &RecordingTarget::AudioOnly,
            VideoCodec::H264,
        )
        .unwrap_err();
        assert!(matches!(err, ReelError::InvalidFileExtension { .. }));
    }

    #[test]
    fn m4a_is_rejected_for_video_targets() {
        let err =
            validate_destination(&PathBuf::from("out.m4a"), &screen(), VideoCodec::H264)
                .unwrap_err();
        assert!(matches!(err, ReelError::InvalidFileExtension { .. }));
    }

    #[test]
    fn prores_requires_mov() {
        assert!(
            validate_destination(&PathBuf::from("out.mov"), &screen(), VideoCodec::ProRes422)
                .is_ok()
        );
        let err =
            validate_destination(&PathBuf::from("out.mp4"), &screen(), VideoCodec::ProRes4444)
                .unwrap_err();
        assert!(err.to_string().contains("proRes4444"));
    }

    #[test]
    fn missing_or_unknown_extension_is_rejected() {
        assert!(
            validate_destination(&PathBuf::from("out"), &screen(), VideoCodec::H264).is_err()
        );
        assert!(
            validate_destination(&PathBuf::from("out.webm"), &screen(), VideoCodec::H264)
                .is_err()
        );
    }
}
