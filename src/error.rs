use thiserror::Error;

/// Main error type for the shortreel library
#[derive(Error, Debug)]
pub enum ShortreelError {
    #[error("Scheduling error: {0}")]
    Schedule(#[from] ScheduleError),

    #[error("Media processing error: {0}")]
    Media(#[from] MediaError),

    #[error("Clip source error: {0}")]
    Source(#[from] SourceError),

    #[error("Voiceover error: {0}")]
    Voice(#[from] VoiceError),

    #[error("Publishing error: {0}")]
    Publish(#[from] PublishError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Generic error: {0}")]
    Generic(String),
}

/// Scheduler-specific errors
///
/// These are pure value returns: a failed scheduling call leaves no partial
/// state behind, so callers can react by relaxing their inputs and retrying.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScheduleError {
    #[error("Not enough source clips: need {needed}, have {available}")]
    InsufficientSource { needed: usize, available: usize },

    #[error("Cannot reach target duration: achieved {achieved:.2}s, acceptable {min:.2}-{max:.2}s")]
    DurationUnreachable { achieved: f64, min: f64, max: f64 },

    #[error("Placement retries exhausted after {attempts} attempts")]
    AllocationExhausted { attempts: u32 },

    #[error("Invalid extract range: [{start:.3}, {end:.3}) within clip of {limit:.3}s")]
    InvalidRange { start: f64, end: f64, limit: f64 },
}

/// Media subprocess errors (ffmpeg / ffprobe)
#[derive(Error, Debug)]
pub enum MediaError {
    #[error("Required tool not found on PATH: {tool}")]
    ToolMissing { tool: String },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Probe failed for {path}: {reason}")]
    ProbeFailed { path: String, reason: String },

    #[error("No video stream found in {path}")]
    NoVideoStream { path: String },

    #[error("Transcode failed: {reason}")]
    TranscodeFailed { reason: String },

    #[error("Assembly failed: {reason}")]
    AssemblyFailed { reason: String },

    #[error("Assembled duration {measured:.2}s outside acceptable {min:.2}-{max:.2}s")]
    DurationMismatch { measured: f64, min: f64, max: f64 },
}

/// Clip discovery and retrieval errors
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: String },

    #[error("No video files found in: {path}")]
    NoClipsFound { path: String },

    #[error("Invalid share folder URL: {url}")]
    InvalidShareUrl { url: String },

    #[error("Share folder request failed: {reason}")]
    ShareRequestFailed { reason: String },

    #[error("Download failed for {name}: {reason}")]
    DownloadFailed { name: String, reason: String },

    #[error("Selection failed: {reason}")]
    SelectionFailed { reason: String },
}

/// Script generation and speech synthesis errors
#[derive(Error, Debug)]
pub enum VoiceError {
    #[error("Missing API credential: {env_var}")]
    MissingCredential { env_var: String },

    #[error("Script generation failed: {reason}")]
    ScriptFailed { reason: String },

    #[error("Speech synthesis failed: {reason}")]
    SynthesisFailed { reason: String },
}

/// Posting-service errors
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Missing API credential: {env_var}")]
    MissingCredential { env_var: String },

    #[error("Media upload failed: {reason}")]
    UploadFailed { reason: String },

    #[error("No {platform} integration configured on the posting service")]
    IntegrationMissing { platform: String },

    #[error("Post scheduling failed: {reason}")]
    ScheduleFailed { reason: String },

    #[error("Status check failed for post {post_id}: {reason}")]
    StatusFailed { post_id: String, reason: String },
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file: {path}")]
    ParseFailed { path: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// Convenience type alias for Results using ShortreelError
pub type Result<T> = std::result::Result<T, ShortreelError>;

impl ShortreelError {
    /// Create a generic error with a custom message
    pub fn generic<S: Into<String>>(message: S) -> Self {
        Self::Generic(message.into())
    }

    /// Check if this error is recoverable (can be retried)
    pub fn is_recoverable(&self) -> bool {
        match self {
            // IO and network hiccups might be temporary
            Self::Io(_) => true,
            Self::Source(SourceError::ShareRequestFailed { .. }) => true,
            Self::Source(SourceError::DownloadFailed { .. }) => true,
            Self::Publish(PublishError::UploadFailed { .. }) => true,
            // Scheduling failures are deterministic for a given input
            _ => false,
        }
    }
}
