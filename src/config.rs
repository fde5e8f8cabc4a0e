//! Configuration
//!
//! Loaded from an optional JSON file, then overridden by environment
//! variables:
//!
//! | Variable                    | Field                |
//! |-----------------------------|----------------------|
//! | `KARAOKE_LYRICS_API_URL`    | `lyrics.api_url`     |
//! | `KARAOKE_LYRICS_API_KEY`    | `lyrics.api_key`     |
//! | `API_KEY`                   | `lyrics.api_key` (if the above is unset) |
//! | `KARAOKE_LYRICS_TIMEOUT_MS` | `lyrics.timeout_ms`  |
//! | `KARAOKE_LYRICS_FALLBACK`   | `lyrics.fallback`    |
//! | `KARAOKE_OUTPUT_DIR`        | `output_dir`         |

use std::env;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{KaraokeError, Result};

/// Lyrics service settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LyricsConfig {
    /// Request lyrics at all
    pub enabled: bool,
    /// Base URL of the transcription service
    pub api_url: String,
    /// No key means offline lyrics only
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub timeout_ms: u64,
    /// Substitute offline lyrics when the service fails
    pub fallback: bool,
}

impl Default for LyricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_url: "http://localhost:8002".to_string(),
            api_key: None,
            timeout_ms: 120_000,
            fallback: true,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub lyrics: LyricsConfig,
    /// Where instrumental files are written
    pub output_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lyrics: LyricsConfig::default(),
            output_dir: PathBuf::from("."),
        }
    }
}

impl Config {
    /// Load from an optional JSON file, then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| env::var(key).ok())?;
        Ok(config)
    }

    /// Read a JSON config file; missing fields take their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| KaraokeError::FileNotFound {
            path: path.display().to_string(),
            source: Some(e),
        })?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Apply overrides from a key lookup (the process environment in
    /// production)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = non_empty("KARAOKE_LYRICS_API_URL") {
            self.lyrics.api_url = url;
        }
        if let Some(key) = non_empty("KARAOKE_LYRICS_API_KEY").or_else(|| non_empty("API_KEY")) {
            self.lyrics.api_key = Some(key);
        }
        if let Some(timeout) = non_empty("KARAOKE_LYRICS_TIMEOUT_MS") {
            self.lyrics.timeout_ms =
                timeout
                    .trim()
                    .parse()
                    .map_err(|_| KaraokeError::Config {
                        reason: format!("KARAOKE_LYRICS_TIMEOUT_MS is not a number: {}", timeout),
                    })?;
        }
        if let Some(flag) = non_empty("KARAOKE_LYRICS_FALLBACK") {
            self.lyrics.fallback = parse_flag(&flag).ok_or_else(|| KaraokeError::Config {
                reason: format!("KARAOKE_LYRICS_FALLBACK must be true or false, got {}", flag),
            })?;
        }
        if let Some(dir) = non_empty("KARAOKE_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(dir);
        }

        Ok(())
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
