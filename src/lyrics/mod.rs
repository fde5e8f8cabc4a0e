//! Lyrics transcription boundary
//!
//! This module provides:
//! - `LyricsService` trait and the request/response wire types
//! - An HTTP client for the external transcription service
//! - Offline lyrics used without an API key or as a failure fallback

mod client;
mod http;
mod offline;

pub use client::{
    AudioData, Lyrics, LyricsOrigin, LyricsRequest, LyricsService, INSTRUMENTAL_SENTINEL,
};
pub use http::{HttpLyricsService, NO_LYRICS_MESSAGE};
pub use offline::{FallbackLyrics, OfflineLyrics, FALLBACK_NOTICE};

use tracing::warn;

use crate::config::LyricsConfig;

/// Build the lyrics service described by the configuration.
///
/// Returns `None` when lyrics are disabled. Without an API key, or when the
/// HTTP client is not available in this build, the offline service is used.
pub fn service_from_config(config: &LyricsConfig) -> Option<Box<dyn LyricsService>> {
    if !config.enabled {
        return None;
    }

    if config.api_key.is_none() {
        warn!("no lyrics API key provided, returning offline lyrics");
        return Some(Box::new(OfflineLyrics::new()));
    }

    let http = HttpLyricsService::from_config(config);
    if !http.is_available() {
        warn!(
            endpoint = %http.endpoint(),
            "lyrics API key set but HTTP support is not compiled in, returning offline lyrics"
        );
        return Some(Box::new(OfflineLyrics::new()));
    }

    if config.fallback {
        Some(Box::new(FallbackLyrics::new(http)))
    } else {
        Some(Box::new(http))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled() {
        let config = LyricsConfig {
            enabled: false,
            ..LyricsConfig::default()
        };
        assert!(service_from_config(&config).is_none());
    }

    #[test]
    fn test_no_key_uses_offline() {
        let service = service_from_config(&LyricsConfig::default()).unwrap();
        assert_eq!(service.name(), "offline");
    }

    #[cfg(feature = "transcription")]
    #[test]
    fn test_key_uses_http() {
        let config = LyricsConfig {
            api_key: Some("key".to_string()),
            fallback: false,
            ..LyricsConfig::default()
        };
        let service = service_from_config(&config).unwrap();
        assert!(service.is_available());
        assert_eq!(service.name(), "http");
    }

    #[cfg(not(feature = "transcription"))]
    #[test]
    fn test_key_without_http_support_uses_offline() {
        let config = LyricsConfig {
            api_key: Some("key".to_string()),
            ..LyricsConfig::default()
        };
        let service = service_from_config(&config).unwrap();
        assert_eq!(service.name(), "offline");
        assert!(service.is_available());
    }
}
