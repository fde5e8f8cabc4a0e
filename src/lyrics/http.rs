//! HTTP lyrics service
//!
//! Posts a [`LyricsRequest`] as JSON to `{api_url}/lyrics` and reads the
//! plain-text body. Prompt construction and model choice live on the
//! service side.
//!
//! Real network calls require the `transcription` feature; without it every
//! request fails with `TranscriptionUnavailable`.

use std::time::Instant;

use tracing::{debug, info, warn};

use super::client::{Lyrics, LyricsOrigin, LyricsRequest, LyricsService};
use crate::config::LyricsConfig;
use crate::error::{KaraokeError, Result};

/// Lyrics service reached over HTTP
#[derive(Debug, Clone)]
pub struct HttpLyricsService {
    api_url: String,
    api_key: Option<String>,
    timeout_ms: u64,
}

impl HttpLyricsService {
    pub fn new(api_url: impl Into<String>, api_key: Option<String>, timeout_ms: u64) -> Self {
        Self {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            api_key,
            timeout_ms,
        }
    }

    pub fn from_config(config: &LyricsConfig) -> Self {
        Self::new(
            config.api_url.clone(),
            config.api_key.clone(),
            config.timeout_ms,
        )
    }

    pub fn endpoint(&self) -> String {
        format!("{}/lyrics", self.api_url)
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    /// Send request to the service
    #[cfg(feature = "transcription")]
    fn send_request(&self, request: &LyricsRequest) -> Result<String> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_millis(self.timeout_ms))
            .build()
            .map_err(|e| KaraokeError::TranscriptionUnavailable {
                reason: e.to_string(),
            })?;

        let mut builder = client.post(self.endpoint()).json(request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().map_err(|e| {
            if e.is_timeout() {
                KaraokeError::Transcription {
                    reason: format!("request timed out after {} ms", self.timeout_ms),
                }
            } else if e.is_connect() {
                KaraokeError::TranscriptionUnavailable {
                    reason: format!("cannot connect to {}: {}", self.api_url, e),
                }
            } else {
                KaraokeError::Transcription {
                    reason: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(KaraokeError::Transcription {
                reason: format!("service returned {}", status),
            });
        }

        response.text().map_err(|e| KaraokeError::Transcription {
            reason: format!("invalid response body: {}", e),
        })
    }

    #[cfg(not(feature = "transcription"))]
    fn send_request(&self, _request: &LyricsRequest) -> Result<String> {
        Err(KaraokeError::TranscriptionUnavailable {
            reason: "transcription support not compiled. Build with --features transcription"
                .to_string(),
        })
    }
}

impl LyricsService for HttpLyricsService {
    fn name(&self) -> &str {
        "http"
    }

    fn is_available(&self) -> bool {
        cfg!(feature = "transcription") && self.api_key.is_some()
    }

    fn transcribe(&self, request: &LyricsRequest) -> Result<Lyrics> {
        let start = Instant::now();
        debug!(
            endpoint = %self.endpoint(),
            with_audio = request.audio_data.is_some(),
            "requesting lyrics"
        );

        let text = self.send_request(request)?;

        info!(
            title = %request.song_title,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "lyrics received"
        );
        Ok(lyrics_from_body(text))
    }
}

/// Text shown when the service answers with an empty body
pub const NO_LYRICS_MESSAGE: &str = "Could not generate lyrics. Please try again.";

/// An empty body is still a service answer, not a transport failure
fn lyrics_from_body(text: String) -> Lyrics {
    if text.trim().is_empty() {
        warn!("lyrics service returned an empty body");
        Lyrics::new(NO_LYRICS_MESSAGE, LyricsOrigin::Service)
    } else {
        Lyrics::new(text, LyricsOrigin::Service)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let service = HttpLyricsService::new("http://localhost:8002/", None, 1000);
        assert_eq!(service.endpoint(), "http://localhost:8002/lyrics");
    }

    #[test]
    fn test_empty_body_is_a_service_answer() {
        let lyrics = lyrics_from_body("  \n".to_string());
        assert_eq!(lyrics.text, NO_LYRICS_MESSAGE);
        assert_eq!(lyrics.origin, LyricsOrigin::Service);

        let lyrics = lyrics_from_body("[Verse 1]\nla la".to_string());
        assert_eq!(lyrics.text, "[Verse 1]\nla la");
    }

    #[test]
    fn test_unavailable_without_key() {
        let service = HttpLyricsService::new("http://localhost:8002", None, 1000);
        assert!(!service.is_available());
    }

    #[cfg(not(feature = "transcription"))]
    #[test]
    fn test_request_fails_without_feature() {
        let service = HttpLyricsService::new("http://localhost:8002", Some("key".into()), 1000);
        let result = service.transcribe(&LyricsRequest::new("Song"));
        assert!(matches!(
            result,
            Err(KaraokeError::TranscriptionUnavailable { .. })
        ));
    }

    #[cfg(feature = "transcription")]
    #[test]
    fn test_unreachable_service_is_an_error() {
        // Port 9 (discard) is not expected to run an HTTP server
        let service = HttpLyricsService::new("http://127.0.0.1:9", Some("key".into()), 500);
        assert!(service.transcribe(&LyricsRequest::new("Song")).is_err());
    }
}
