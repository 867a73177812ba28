//! Error types shared across Reel crates.

/// Top-level error type for Reel operations.
#[derive(Debug, thiserror::Error)]
pub enum ReelError {
    #[error("Screen recording permission denied")]
    PermissionDenied,

    #[error("Recording target not found: {id}")]
    TargetNotFound { id: String },

    #[error("No recording target provided")]
    NoTargetProvided,

    #[error("Invalid destination extension {extension:?}: {reason}")]
    InvalidFileExtension { extension: String, reason: String },

    #[error("Invalid crop area: {message}")]
    InvalidCropArea { message: String },

    #[error("Invalid recording options: {message}")]
    InvalidOptions { message: String },

    #[error("Microphone not found: {id}")]
    MicrophoneNotFound { id: String },

    #[error("No displays connected")]
    NoDisplaysConnected,

    #[error("Could not attach {channel} input to the container writer")]
    CouldNotAddInput { channel: String },

    #[error("Could not start stream: {message}")]
    CouldNotStartStream { message: String },

    #[error("Recorder already started")]
    AlreadyStarted,

    #[error("Recorder not started")]
    NotStarted,

    #[error("Session error: {message}")]
    Session { message: String },

    #[error("Writer error: {message}")]
    Writer { message: String },

    #[error("Device error: {message}")]
    Device { message: String },

    #[error("Platform error: {message}")]
    Platform { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using ReelError.
pub type ReelResult<T> = Result<T, ReelError>;

impl ReelError {
    pub fn target_not_found(id: impl Into<String>) -> Self {
        Self::TargetNotFound { id: id.into() }
    }

    pub fn invalid_extension(extension: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidFileExtension {
            extension: extension.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_crop(msg: impl Into<String>) -> Self {
        Self::InvalidCropArea {
            message: msg.into(),
        }
    }

    pub fn invalid_options(msg: impl Into<String>) -> Self {
        Self::InvalidOptions {
            message: msg.into(),
        }
    }

    pub fn microphone_not_found(id: impl Into<String>) -> Self {
        Self::MicrophoneNotFound { id: id.into() }
    }

    pub fn could_not_add_input(channel: impl Into<String>) -> Self {
        Self::CouldNotAddInput {
            channel: channel.into(),
        }
    }

    pub fn could_not_start_stream(msg: impl Into<String>) -> Self {
        Self::CouldNotStartStream {
            message: msg.into(),
        }
    }

    pub fn session(msg: impl Into<String>) -> Self {
        Self::Session {
            message: msg.into(),
        }
    }

    pub fn writer(msg: impl Into<String>) -> Self {
        Self::Writer {
            message: msg.into(),
        }
    }

    pub fn device(msg: impl Into<String>) -> Self {
        Self::Device {
            message: msg.into(),
        }
    }

    pub fn platform(msg: impl Into<String>) -> Self {
        Self::Platform {
            message: msg.into(),
        }
    }
}
