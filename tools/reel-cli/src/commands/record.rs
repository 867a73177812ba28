//! The `record` sub-command and the shared recording driver.

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use clap::Args;

use reel_common::config::AppConfig;
use reel_common::error::{ReelError, ReelResult};
use reel_engine::backend::CaptureBackend;
use reel_engine::session::Recorder;
use reel_media::{CropArea, RecordingOptions, RecordingTarget, VideoCodec};

/// How long to wait for the first sample before giving up on startup.
const START_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Args)]
pub struct RecordArgs {
    /// Output file (.mp4, .mov, .m4v, or .m4a for audio-only)
    pub destination: PathBuf,

    /// Screen identifier to record ("main" for the primary display)
    #[arg(long, conflicts_with_all = ["window", "external_device", "audio_only"])]
    pub screen: Option<String>,

    /// Window identifier to record
    #[arg(long, conflicts_with_all = ["external_device", "audio_only"])]
    pub window: Option<String>,

    /// External device identifier to record
    #[arg(long, conflicts_with = "audio_only")]
    pub external_device: Option<String>,

    /// Record audio only, no video channel
    #[arg(long)]
    pub audio_only: bool,

    /// Target frame rate
    #[arg(long)]
    pub fps: Option<u32>,

    /// Crop rectangle as x:y:width:height, in screen points
    #[arg(long)]
    pub crop: Option<String>,

    /// Do not capture the cursor
    #[arg(long)]
    pub no_cursor: bool,

    /// Visually highlight mouse clicks
    #[arg(long)]
    pub highlight_clicks: bool,

    /// Video codec: h264, hevc, proRes422, or proRes4444
    #[arg(long)]
    pub video_codec: Option<String>,

    /// Record audio losslessly instead of AAC
    #[arg(long)]
    pub lossless_audio: bool,

    /// Capture system audio on its own channel
    #[arg(long)]
    pub system_audio: bool,

    /// Microphone device identifier to capture
    #[arg(long)]
    pub mic: Option<String>,

    /// System-audio output device to tap
    #[arg(long)]
    pub audio_device: Option<String>,
}

impl RecordArgs {
    fn into_request(self, config: &AppConfig) -> ReelResult<(RecordingTarget, RecordingOptions)> {
        let target = if self.audio_only {
            RecordingTarget::AudioOnly
        } else if let Some(id) = self.external_device {
            RecordingTarget::ExternalDevice { id }
        } else if let Some(id) = self.window {
            RecordingTarget::Window { id }
        } else if let Some(id) = self.screen {
            RecordingTarget::Screen { id }
        } else {
            RecordingTarget::main_screen()
        };

        let defaults = &config.recording;
        let video_codec = match self.video_codec {
            Some(name) => name.parse()?,
            None => defaults.video_codec.parse().unwrap_or(VideoCodec::H264),
        };

        let mut options = RecordingOptions::new(self.destination);
        options.frames_per_second = self.fps.unwrap_or(defaults.fps);
        options.crop_area = self.crop.as_deref().map(parse_crop).transpose()?;
        options.show_cursor = if self.no_cursor {
            false
        } else {
            defaults.show_cursor
        };
        options.highlight_clicks = self.highlight_clicks || defaults.highlight_clicks;
        options.video_codec = video_codec;
        options.lossless_audio = self.lossless_audio;
        options.record_system_audio = self.system_audio || defaults.record_system_audio;
        options.microphone_device_id = self.mic;
        options.audio_device_id = self.audio_device;
        Ok((target, options))
    }
}

/// Parse `x:y:width:height` into a crop rectangle.
fn parse_crop(spec: &str) -> ReelResult<CropArea> {
    let parts: Vec<&str> = spec.split(':').collect();
    let &[x, y, width, height] = parts.as_slice() else {
        return Err(ReelError::invalid_crop(format!(
            "expected x:y:width:height, got {spec:?}"
        )));
    };
    let parse = |part: &str| {
        part.parse::<f64>()
            .map_err(|_| ReelError::invalid_crop(format!("{part:?} is not a number")))
    };
    let crop = CropArea {
        x: parse(x)?,
        y: parse(y)?,
        width: parse(width)?,
        height: parse(height)?,
    };
    crop.validate()?;
    Ok(crop)
}

pub async fn run(
    backend: Box<dyn CaptureBackend>,
    args: RecordArgs,
    config: &AppConfig,
) -> ReelResult<()> {
    let (target, options) = args.into_request(config)?;
    record(backend, target, options).await
}

/// Drive one full recording: start, announce readiness on stdout, wait
/// for stdin to close or a termination signal, stop.
pub async fn record(
    backend: Box<dyn CaptureBackend>,
    target: RecordingTarget,
    options: RecordingOptions,
) -> ReelResult<()> {
    let mut recorder = Recorder::new(backend);
    recorder.start_recording(target, options).await?;

    match tokio::time::timeout(START_TIMEOUT, recorder.started()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => return Err(e),
        Err(_) => {
            let _ = recorder.stop_recording().await;
            return Err(ReelError::could_not_start_stream(format!(
                "no samples arrived within {}s",
                START_TIMEOUT.as_secs()
            )));
        }
    }

    // The host-process handshake: a bare `R` on stdout, flushed, means
    // recording is live. Nothing else is ever written to stdout.
    let mut stdout = std::io::stdout();
    stdout.write_all(b"R")?;
    stdout.flush()?;

    wait_for_stop_request().await?;

    let destination = recorder.stop_recording().await?;
    tracing::info!(destination = %destination.display(), "Recording saved");
    Ok(())
}

/// Resolves when stdin closes or a termination signal arrives.
async fn wait_for_stop_request() -> ReelResult<()> {
    let stdin_closed = tokio::task::spawn_blocking(|| {
        use std::io::Read;
        let mut stdin = std::io::stdin();
        let mut scratch = [0u8; 1024];
        while matches!(stdin.read(&mut scratch), Ok(n) if n > 0) {}
    });

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut terminate = signal(SignalKind::terminate())?;
        let mut hangup = signal(SignalKind::hangup())?;
        tokio::select! {
            _ = stdin_closed => tracing::debug!("stdin closed; stopping"),
            _ = tokio::signal::ctrl_c() => tracing::debug!("SIGINT; stopping"),
            _ = terminate.recv() => tracing::debug!("SIGTERM; stopping"),
            _ = hangup.recv() => tracing::debug!("SIGHUP; stopping"),
        }
    }
    #[cfg(not(unix))]
    {
        tokio::select! {
            _ = stdin_closed => tracing::debug!("stdin closed; stopping"),
            _ = tokio::signal::ctrl_c() => tracing::debug!("interrupt; stopping"),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crop_spec_parses() {
        let crop = parse_crop("10:20:640:480").unwrap();
        assert_eq!(crop.x, 10.0);
        assert_eq!(crop.y, 20.0);
        assert_eq!(crop.width, 640.0);
        assert_eq!(crop.height, 480.0);
    }

    #[test]
    fn malformed_crop_spec_is_a_crop_error() {
        for spec in ["", "1:2:3", "1:2:3:4:5", "a:b:c:d", "0:0:-1:10"] {
            let err = parse_crop(spec).unwrap_err();
            assert!(
                matches!(err, ReelError::InvalidCropArea { .. }),
                "{spec:?} did not produce a crop error"
            );
        }
    }

    #[test]
    fn flags_override_config_defaults() {
        let args = RecordArgs {
            destination: PathBuf::from("out.mp4"),
            screen: None,
            window: None,
            external_device: None,
            audio_only: false,
            fps: Some(60),
            crop: None,
            no_cursor: true,
            highlight_clicks: false,
            video_codec: Some("hevc".into()),
            lossless_audio: false,
            system_audio: true,
            mic: Some("mic-1".into()),
            audio_device: None,
        };
        let (target, options) = args.into_request(&AppConfig::default()).unwrap();
        assert_eq!(target, RecordingTarget::main_screen());
        assert_eq!(options.frames_per_second, 60);
        assert!(!options.show_cursor);
        assert_eq!(options.video_codec, VideoCodec::Hevc);
        assert!(options.record_system_audio);
        assert_eq!(options.microphone_device_id.as_deref(), Some("mic-1"));
    }
}
