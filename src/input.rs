//! Input resolution
//!
//! Turns what the user submitted (an uploaded file or a YouTube reference)
//! into a [`SourceInput`] before any pipeline work starts. Empty input is
//! rejected here, never inside the pipeline.

use std::sync::OnceLock;

use regex::Regex;

use crate::engine::SourceAudio;
use crate::error::{KaraokeError, Result};

/// Title used when neither the user nor a file name supplies one
pub const UNKNOWN_TITLE: &str = "the song in this video";

/// A validated submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceInput {
    /// Audio bytes to process
    Upload(SourceAudio),
    /// A YouTube video; no audio is extracted, only lyrics are requested
    YouTube { video_id: String },
}

impl SourceInput {
    /// Accept an uploaded file
    ///
    /// # Errors
    /// * `EmptyInput` - no file, or a zero-byte file
    pub fn upload(file: Option<SourceAudio>) -> Result<Self> {
        match file {
            Some(source) if !source.is_empty() => Ok(SourceInput::Upload(source)),
            Some(_) => Err(KaraokeError::EmptyInput {
                what: "the selected audio file is empty".to_string(),
            }),
            None => Err(KaraokeError::EmptyInput {
                what: "no audio file selected".to_string(),
            }),
        }
    }

    /// Accept a YouTube URL or iframe embed code
    ///
    /// # Errors
    /// * `EmptyInput` - blank reference
    /// * `InvalidYoutubeRef` - no video ID could be found
    pub fn youtube(reference: &str) -> Result<Self> {
        if reference.trim().is_empty() {
            return Err(KaraokeError::EmptyInput {
                what: "no YouTube URL provided".to_string(),
            });
        }

        youtube_id(reference)
            .map(|video_id| SourceInput::YouTube { video_id })
            .ok_or_else(|| KaraokeError::InvalidYoutubeRef {
                input: reference.trim().to_string(),
            })
    }

    /// The uploaded audio, if any
    pub fn audio(&self) -> Option<&SourceAudio> {
        match self {
            SourceInput::Upload(source) => Some(source),
            SourceInput::YouTube { .. } => None,
        }
    }
}

/// Extract an 11-character video ID from a YouTube URL or iframe snippet.
///
/// Accepts `watch?v=`, `youtu.be/`, `embed/`, `v/` and `e/` forms; for an
/// iframe the `src` attribute is parsed.
pub fn youtube_id(input: &str) -> Option<String> {
    static SRC: OnceLock<Regex> = OnceLock::new();
    static VIDEO_ID: OnceLock<Regex> = OnceLock::new();

    let src = SRC.get_or_init(|| Regex::new(r#"src=["'](.*?)["']"#).expect("valid regex"));
    let video_id = VIDEO_ID.get_or_init(|| {
        Regex::new(
            r#"(?:youtube\.com/(?:[^/]+/.+/|(?:v|e(?:mbed)?)/|.*[?&]v=)|youtu\.be/)([^"&?/\s]{11})"#,
        )
        .expect("valid regex")
    });

    let url = src
        .captures(input)
        .and_then(|c| c.get(1))
        .map_or(input, |m| m.as_str());

    video_id
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Strip the last extension from a file name (`song.live.mp3` → `song.live`)
pub fn title_from_file_name(name: &str) -> String {
    match name.rfind('.') {
        Some(idx) if idx + 1 < name.len() && !name[idx + 1..].contains('/') => {
            name[..idx].to_string()
        }
        _ => name.to_string(),
    }
}

/// Pick the title sent to the lyrics service.
///
/// An explicit title wins, then the upload's file name, then
/// [`UNKNOWN_TITLE`].
pub fn song_title(explicit: Option<&str>, input: &SourceInput) -> String {
    if let Some(title) = explicit.map(str::trim).filter(|t| !t.is_empty()) {
        return title.to_string();
    }

    input
        .audio()
        .and_then(SourceAudio::file_name)
        .map(title_from_file_name)
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| UNKNOWN_TITLE.to_string())
}

/// File name offered for the instrumental download.
///
/// Path separators and characters not allowed in file names become `_`, so
/// the name always stays inside the output directory.
pub fn download_file_name(title: &str) -> String {
    let title = title.trim();
    let title = if title.is_empty() { "track" } else { title };
    let safe: String = title
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    format!("Instrumental_{}.wav", safe)
}
