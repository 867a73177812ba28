//! Reel CLI — record screens, windows, and devices from the terminal or
//! from a host process.
//!
//! Usage:
//!   reel '<json>'              Record per a JSON options object
//!   reel record [OPTIONS]      Record per command-line flags
//!   reel list-screens          List recordable displays
//!   reel list-windows          List recordable windows
//!   reel list-audio-devices    List audio input devices
//!
//! Host-process protocol: when recording starts, the single character
//! `R` is written to stdout and flushed; everything else goes to stderr.
//! Recording stops when stdin closes or on SIGINT/SIGTERM/SIGHUP.
//! Exit codes: 0 success, 1 malformed arguments or fatal error, 2
//! invalid crop coordinates.

use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

use reel_common::config::AppConfig;
use reel_common::error::ReelError;
use reel_engine::backend::{default_backend, CaptureBackend, SyntheticBackend};
use reel_media::RecordRequest;

mod commands;

#[derive(Parser)]
#[command(
    name = "reel",
    about = "Screen and audio recording for automation and humans alike",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Capture backend to use
    #[arg(long, global = true, value_enum, default_value = "auto")]
    backend: BackendChoice,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum BackendChoice {
    /// The native backend for this platform
    Auto,
    /// Generated buffers, no capture hardware required
    Synthetic,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a recording
    Record(commands::record::RecordArgs),

    /// List recordable displays as JSON
    ListScreens,

    /// List recordable windows as JSON
    ListWindows,

    /// List audio input devices as JSON
    ListAudioDevices,
}

fn make_backend(choice: BackendChoice) -> Result<Box<dyn CaptureBackend>, ReelError> {
    match choice {
        BackendChoice::Auto => default_backend(),
        BackendChoice::Synthetic => Ok(Box::new(SyntheticBackend::new())),
    }
}

fn backend_from_env() -> Result<Box<dyn CaptureBackend>, ReelError> {
    match std::env::var("REEL_BACKEND").as_deref() {
        Ok("synthetic") => Ok(Box::new(SyntheticBackend::new())),
        _ => default_backend(),
    }
}

fn exit_code_for(error: &ReelError) -> ExitCode {
    match error {
        ReelError::InvalidCropArea { .. } => ExitCode::from(2),
        _ => ExitCode::FAILURE,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = AppConfig::load();

    // A leading JSON object is the host-process wire format; it bypasses
    // flag parsing entirely.
    if let Some(blob) = std::env::args().nth(1).filter(|a| a.starts_with('{')) {
        reel_common::logging::init_logging(&config.logging);
        return run_from_json(&blob).await;
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Help and version are not failures.
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    reel_common::logging::init_logging(&logging);

    let backend = match make_backend(cli.backend) {
        Ok(backend) => backend,
        Err(e) => {
            tracing::error!(error = %e, "No usable capture backend");
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Commands::Record(args) => commands::record::run(backend, args, &config).await,
        Commands::ListScreens => commands::list::screens(backend).await,
        Commands::ListWindows => commands::list::windows(backend).await,
        Commands::ListAudioDevices => commands::list::audio_devices(backend).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            exit_code_for(&e)
        }
    }
}

async fn run_from_json(blob: &str) -> ExitCode {
    let request: RecordRequest = match serde_json::from_str(blob) {
        Ok(request) => request,
        Err(e) => {
            tracing::error!(error = %e, "Malformed recording options JSON");
            return ExitCode::FAILURE;
        }
    };
    let target = match request.target() {
        Ok(target) => target,
        Err(e) => {
            tracing::error!(error = %e, "Invalid target selection");
            return exit_code_for(&e);
        }
    };
    let backend = match backend_from_env() {
        Ok(backend) => backend,
        Err(e) => {
            tracing::error!(error = %e, "No usable capture backend");
            return ExitCode::FAILURE;
        }
    };
    match commands::record::record(backend, target, request.options).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Recording failed");
            exit_code_for(&e)
        }
    }
}
