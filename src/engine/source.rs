//! Source Audio
//!
//! The uploaded file exactly as the user supplied it. It is read once and
//! never modified: the decode path and the lyrics request both borrow it.

use std::path::Path;

use base64::{engine::general_purpose, Engine as _};

use crate::error::{KaraokeError, Result};
use crate::lyrics::AudioData;

/// MIME type assumed when an upload declares none
pub const DEFAULT_MIME_TYPE: &str = "audio/mp3";

/// Raw compressed/container bytes plus the declared MIME type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceAudio {
    bytes: Vec<u8>,
    mime_type: String,
    file_name: Option<String>,
}

impl SourceAudio {
    /// Wrap in-memory bytes with a declared MIME type
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        let mime_type = mime_type.into();
        Self {
            bytes,
            mime_type: if mime_type.trim().is_empty() {
                DEFAULT_MIME_TYPE.to_string()
            } else {
                mime_type
            },
            file_name: None,
        }
    }

    /// Attach the original file name (used for decoder hints and titles)
    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    /// Read a file from disk, guessing the MIME type from its extension
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(KaraokeError::FileNotFound {
                path: path.display().to_string(),
                source: None,
            });
        }

        let bytes = std::fs::read(path).map_err(|e| KaraokeError::FileNotFound {
            path: path.display().to_string(),
            source: Some(e),
        })?;

        let mime_type = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(mime_type_for_extension)
            .unwrap_or(DEFAULT_MIME_TYPE);

        let source = Self::new(bytes, mime_type);
        Ok(match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => source.with_file_name(name),
            None => source,
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// File extension from the file name, lowercased
    pub fn extension(&self) -> Option<String> {
        self.file_name
            .as_deref()
            .and_then(|n| Path::new(n).extension())
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
    }

    /// Standard base64 of the original bytes (no data-URL prefix)
    pub fn to_base64(&self) -> String {
        general_purpose::STANDARD.encode(&self.bytes)
    }

    /// Payload attached to the lyrics request
    pub fn transcription_audio(&self) -> AudioData {
        AudioData {
            base64: self.to_base64(),
            mime_type: self.mime_type.clone(),
        }
    }
}

/// MIME type for the upload formats the form accepts
pub fn mime_type_for_extension(ext: &str) -> Option<&'static str> {
    match ext.to_ascii_lowercase().as_str() {
        "mp3" => Some("audio/mp3"),
        "wav" => Some("audio/wav"),
        "m4a" => Some("audio/mp4"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_mime_type_falls_back() {
        let source = SourceAudio::new(vec![1, 2, 3], "  ");
        assert_eq!(source.mime_type(), DEFAULT_MIME_TYPE);
    }

    #[test]
    fn test_base64_has_no_prefix() {
        let source = SourceAudio::new(b"hello".to_vec(), "audio/wav");
        assert_eq!(source.to_base64(), "aGVsbG8=");

        let data = source.transcription_audio();
        assert_eq!(data.base64, "aGVsbG8=");
        assert_eq!(data.mime_type, "audio/wav");
    }

    #[test]
    fn test_from_path_guesses_mime_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Song.M4A");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(b"data")
            .unwrap();

        let source = SourceAudio::from_path(&path).unwrap();
        assert_eq!(source.mime_type(), "audio/mp4");
        assert_eq!(source.file_name(), Some("Song.M4A"));
        assert_eq!(source.extension().as_deref(), Some("m4a"));
        assert_eq!(source.bytes(), b"data");
    }

    #[test]
    fn test_from_path_missing_file() {
        let result = SourceAudio::from_path(Path::new("/nonexistent/track.mp3"));
        assert!(matches!(result, Err(KaraokeError::FileNotFound { .. })));
    }
}
