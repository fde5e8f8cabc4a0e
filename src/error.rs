//! Error handling for Karaoke Studio
//!
//! Every error carries a stable code and, where the user can act on it,
//! recovery suggestions.

use thiserror::Error;

/// Result type alias for Karaoke Studio operations
pub type Result<T> = std::result::Result<T, KaraokeError>;

/// Main error type for Karaoke Studio operations
#[derive(Error, Debug)]
pub enum KaraokeError {
    // Input Errors
    #[error("No input provided: {what}")]
    EmptyInput { what: String },

    #[error("Invalid YouTube reference: {input}")]
    InvalidYoutubeRef { input: String },

    #[error("File not found: {path}")]
    FileNotFound {
        path: String,
        #[source]
        source: Option<std::io::Error>,
    },

    // Audio Errors
    #[error("Could not decode audio: {reason}")]
    Decode {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Invalid WAV container: {reason}")]
    InvalidContainer { reason: String },

    // Session Errors
    #[error("A processing run is already in progress")]
    RunInProgress,

    // Collaborator Errors
    #[error("Lyrics transcription failed: {reason}")]
    Transcription { reason: String },

    #[error("Lyrics service unavailable: {reason}")]
    TranscriptionUnavailable { reason: String },

    // Configuration Errors
    #[error("Configuration error: {reason}")]
    Config { reason: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl KaraokeError {
    /// Build a decode error from any underlying codec error
    pub fn decode<E>(reason: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        KaraokeError::Decode {
            reason: reason.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            KaraokeError::EmptyInput { .. } => "EMPTY_INPUT",
            KaraokeError::InvalidYoutubeRef { .. } => "INVALID_YOUTUBE_REF",
            KaraokeError::FileNotFound { .. } => "FILE_NOT_FOUND",
            KaraokeError::Decode { .. } => "DECODE_ERROR",
            KaraokeError::InvalidContainer { .. } => "INVALID_CONTAINER",
            KaraokeError::RunInProgress => "RUN_IN_PROGRESS",
            KaraokeError::Transcription { .. } => "TRANSCRIPTION_ERROR",
            KaraokeError::TranscriptionUnavailable { .. } => "TRANSCRIPTION_UNAVAILABLE",
            KaraokeError::Config { .. } => "CONFIG_ERROR",
            KaraokeError::Io(_) => "IO_ERROR",
            KaraokeError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if the user can fix this error and trigger a fresh run
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            KaraokeError::EmptyInput { .. }
                | KaraokeError::InvalidYoutubeRef { .. }
                | KaraokeError::FileNotFound { .. }
                | KaraokeError::Decode { .. }
                | KaraokeError::RunInProgress
                | KaraokeError::Transcription { .. }
                | KaraokeError::TranscriptionUnavailable { .. }
        )
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            KaraokeError::EmptyInput { .. } => vec![
                "Select an audio file to upload",
                "Or paste a YouTube URL or iframe embed code",
            ],
            KaraokeError::InvalidYoutubeRef { .. } => vec![
                "Paste a full YouTube URL such as https://www.youtube.com/watch?v=...",
                "Short links (youtu.be/...) and iframe embed codes also work",
            ],
            KaraokeError::FileNotFound { .. } => vec![
                "Check the file path is correct",
                "Verify the file hasn't been moved or deleted",
            ],
            KaraokeError::Decode { .. } => vec![
                "Make sure the file is a valid MP3, WAV or M4A file",
                "Check if the file plays in another application",
                "The file may be corrupted - try re-exporting from source",
            ],
            KaraokeError::RunInProgress => vec![
                "Wait for the current run to finish",
            ],
            KaraokeError::Transcription { .. } | KaraokeError::TranscriptionUnavailable { .. } => {
                vec![
                    "The instrumental track is unaffected and can still be downloaded",
                    "Check your API key and network connection",
                    "Try again later",
                ]
            }
            KaraokeError::Config { .. } => vec![
                "Check the configuration file is valid JSON",
                "Check the KARAOKE_* environment variables",
            ],
            _ => vec![],
        }
    }

    /// Get a user-friendly message for this error
    pub fn friendly_message(&self) -> String {
        match self {
            KaraokeError::EmptyInput { .. } => "Please select an audio file first.".to_string(),
            KaraokeError::InvalidYoutubeRef { .. } => {
                "Invalid input. Please paste a valid YouTube URL or Iframe Embed code.".to_string()
            }
            KaraokeError::Decode { .. } => {
                "Could not process audio file. Make sure it is a valid audio format.".to_string()
            }
            KaraokeError::Transcription { .. } | KaraokeError::TranscriptionUnavailable { .. } => {
                "Error connecting to AI service for lyrics.".to_string()
            }
            _ => self.to_string(),
        }
    }
}
