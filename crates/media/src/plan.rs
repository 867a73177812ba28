//! Stream plan: the validated, derived shape of a session.
//!
//! `StreamPlan::build` is a pure transform from a target/options pair to
//! the set of active channels plus the reference channel. Everything the
//! session state machine needs to know about *what* to record is decided
//! here, before any backend resource exists.

use reel_common::error::{ReelError, ReelResult};

use crate::buffer::StreamChannel;
use crate::format::{validate_destination, ContainerFormat};
use crate::options::RecordingOptions;
use crate::target::RecordingTarget;

/// A validated recording plan.
#[derive(Debug, Clone)]
pub struct StreamPlan {
    pub target: RecordingTarget,
    pub options: RecordingOptions,
    pub container: ContainerFormat,
    /// Active channels, in reference-priority order.
    pub channels: Vec<StreamChannel>,
    /// The channel whose timestamps drive pause/resume offset
    /// recomputation: video when present, else the first active audio
    /// channel.
    pub reference: StreamChannel,
}

impl StreamPlan {
    pub fn build(target: RecordingTarget, options: RecordingOptions) -> ReelResult<Self> {
        if let Some(id) = target.identifier() {
            if id.is_empty() {
                return Err(ReelError::NoTargetProvided);
            }
        }

        if options.frames_per_second == 0 {
            return Err(ReelError::invalid_options("frames per second must be positive"));
        }

        if let Some(crop) = &options.crop_area {
            crop.validate()?;
            if target.is_audio_only() {
                return Err(ReelError::invalid_options(
                    "crop area is meaningless for audio-only recording",
                ));
            }
        }

        let container = validate_destination(&options.destination, &target, options.video_codec)?;

        let mut channels = Vec::new();
        if !target.is_audio_only() {
            channels.push(StreamChannel::Video);
        }
        if options.record_system_audio {
            channels.push(StreamChannel::SystemAudio);
        }
        if options.microphone_device_id.is_some() {
            channels.push(StreamChannel::Microphone);
        }
        if matches!(target, RecordingTarget::ExternalDevice { .. }) {
            channels.push(StreamChannel::ExternalAudio);
        }

        let reference = *channels.first().ok_or_else(|| {
            ReelError::invalid_options(
                "audio-only recording needs system audio or a microphone",
            )
        })?;

        Ok(Self {
            target,
            options,
            container,
            channels,
            reference,
        })
    }

    pub fn is_active(&self, channel: StreamChannel) -> bool {
        self.channels.contains(&channel)
    }

    pub fn has_audio(&self) -> bool {
        self.channels.iter().any(|c| c.is_audio())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::CropArea;

    fn options(dest: &str) -> RecordingOptions {
        RecordingOptions::new(dest)
    }

    #[test]
    fn screen_plan_has_video_reference() {
        let plan = StreamPlan::build(RecordingTarget::main_screen(), options("out.mp4")).unwrap();
        assert_eq!(plan.channels, vec![StreamChannel::Video]);
        assert_eq!(plan.reference, StreamChannel::Video);
        assert!(!plan.has_audio());
    }

    #[test]
    fn audio_channels_follow_options() {
        let mut opts = options("out.mp4");
        opts.record_system_audio = true;
        opts.microphone_device_id = Some("mic-1".into());
        let plan = StreamPlan::build(RecordingTarget::main_screen(), opts).unwrap();
        assert_eq!(
            plan.channels,
            vec![
                StreamChannel::Video,
                StreamChannel::SystemAudio,
                StreamChannel::Microphone
            ]
        );
        assert_eq!(plan.reference, StreamChannel::Video);
    }

    #[test]
    fn audio_only_reference_is_first_active_audio_channel() {
        let mut opts = options("out.m4a");
        opts.record_system_audio = true;
        opts.microphone_device_id = Some("mic-1".into());
        let plan = StreamPlan::build(RecordingTarget::AudioOnly, opts).unwrap();
        assert_eq!(plan.reference, StreamChannel::SystemAudio);

        let mut opts = options("out.m4a");
        opts.microphone_device_id = Some("mic-1".into());
        let plan = StreamPlan::build(RecordingTarget::AudioOnly, opts).unwrap();
        assert_eq!(plan.reference, StreamChannel::Microphone);
    }

    #[test]
    fn audio_only_without_audio_channels_is_rejected() {
        let err = StreamPlan::build(RecordingTarget::AudioOnly, options("out.m4a")).unwrap_err();
        assert!(matches!(err, ReelError::InvalidOptions { .. }));
    }

    #[test]
    fn external_device_gets_device_audio_channel() {
        let plan = StreamPlan::build(
            RecordingTarget::ExternalDevice { id: "phone-1".into() },
            options("out.mp4"),
        )
        .unwrap();
        assert_eq!(
            plan.channels,
            vec![StreamChannel::Video, StreamChannel::ExternalAudio]
        );
        assert_eq!(plan.reference, StreamChannel::Video);
    }

    #[test]
    fn empty_target_identifier_is_rejected() {
        let err =
            StreamPlan::build(RecordingTarget::Window { id: String::new() }, options("out.mp4"))
                .unwrap_err();
        assert!(matches!(err, ReelError::NoTargetProvided));
    }

    #[test]
    fn zero_fps_is_rejected() {
        let mut opts = options("out.mp4");
        opts.frames_per_second = 0;
        assert!(StreamPlan::build(RecordingTarget::main_screen(), opts).is_err());
    }

    #[test]
    fn degenerate_crop_is_rejected() {
        let mut opts = options("out.mp4");
        opts.crop_area = Some(CropArea {
            x: 0.0,
            y: 0.0,
            width: -10.0,
            height: 10.0,
        });
        let err = StreamPlan::build(RecordingTarget::main_screen(), opts).unwrap_err();
        assert!(matches!(err, ReelError::InvalidCropArea { .. }));
    }

    #[test]
    fn crop_on_audio_only_is_rejected() {
        let mut opts = options("out.m4a");
        opts.record_system_audio = true;
        opts.crop_area = Some(CropArea {
            x: 0.0,
            y: 0.0,
            width: 10.0,
            height: 10.0,
        });
        assert!(StreamPlan::build(RecordingTarget::AudioOnly, opts).is_err());
    }
}
