//! Lyrics service trait and wire types
//!
//! The request carries the song title and, for uploads, the original
//! (unprocessed) audio. The response is plain text.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Text a service returns for songs without vocals
pub const INSTRUMENTAL_SENTINEL: &str = "[Instrumental Track]";

/// Original audio attached to a lyrics request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioData {
    /// Standard base64, no data-URL prefix
    pub base64: String,
    pub mime_type: String,
}

/// Request sent to a lyrics service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LyricsRequest {
    pub song_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_data: Option<AudioData>,
}

impl LyricsRequest {
    pub fn new(song_title: impl Into<String>) -> Self {
        Self {
            song_title: song_title.into(),
            audio_data: None,
        }
    }

    pub fn with_audio(mut self, audio: AudioData) -> Self {
        self.audio_data = Some(audio);
        self
    }
}

/// Where a lyrics text came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LyricsOrigin {
    /// Returned by the transcription service
    Service,
    /// Produced locally because no service was reachable
    Fallback,
}

/// Lyrics text as returned by a service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lyrics {
    pub text: String,
    pub origin: LyricsOrigin,
}

impl Lyrics {
    pub fn new(text: impl Into<String>, origin: LyricsOrigin) -> Self {
        Self {
            text: text.into(),
            origin,
        }
    }

    /// The service reported a song without vocals
    pub fn is_instrumental(&self) -> bool {
        self.text.trim() == INSTRUMENTAL_SENTINEL
    }

    /// Section headers such as `[Chorus]`
    pub fn sections(&self) -> impl Iterator<Item = &str> {
        self.text.lines().map(str::trim).filter(|l| {
            l.starts_with('[') && l.ends_with(']') && *l != INSTRUMENTAL_SENTINEL
        })
    }
}

/// Interface to an external lyrics transcription service.
///
/// Implementations must be usable from a worker thread: the session runs a
/// request alongside the audio pipeline.
pub trait LyricsService: Send + Sync {
    /// Short identifier for logs
    fn name(&self) -> &str;

    /// Whether the service can be expected to answer
    fn is_available(&self) -> bool;

    /// Fetch lyrics for one song
    fn transcribe(&self, request: &LyricsRequest) -> Result<Lyrics>;
}
