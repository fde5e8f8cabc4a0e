//! Offline lyrics
//!
//! Used when no API key is configured, and as the fallback when the real
//! service fails. Produces a fixed demo text with the song title filled in,
//! so the teleprompter always has something to scroll.

use std::time::Instant;

use tracing::warn;

use super::client::{Lyrics, LyricsOrigin, LyricsRequest, LyricsService};
use crate::error::Result;

/// Notice prepended to fallback lyrics after a service failure
pub const FALLBACK_NOTICE: &str =
    "Error connecting to AI service for lyrics. Showing fallback lyrics.";

/// Lyrics service that never leaves the process
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineLyrics;

impl OfflineLyrics {
    pub fn new() -> Self {
        Self
    }
}

impl LyricsService for OfflineLyrics {
    fn name(&self) -> &str {
        "offline"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn transcribe(&self, request: &LyricsRequest) -> Result<Lyrics> {
        Ok(Lyrics::new(
            demo_lyrics(&request.song_title),
            LyricsOrigin::Fallback,
        ))
    }
}

/// Wraps a service and substitutes offline lyrics when it fails.
///
/// The underlying error is logged and summarised in the text; it never
/// reaches the caller.
pub struct FallbackLyrics<S> {
    primary: S,
}

impl<S: LyricsService> FallbackLyrics<S> {
    pub fn new(primary: S) -> Self {
        Self { primary }
    }
}

impl<S: LyricsService> LyricsService for FallbackLyrics<S> {
    fn name(&self) -> &str {
        self.primary.name()
    }

    fn is_available(&self) -> bool {
        true
    }

    fn transcribe(&self, request: &LyricsRequest) -> Result<Lyrics> {
        let start = Instant::now();
        match self.primary.transcribe(request) {
            Ok(lyrics) => Ok(lyrics),
            Err(e) => {
                warn!(
                    service = self.primary.name(),
                    error_code = e.error_code(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "lyrics service failed, using fallback: {}",
                    e
                );
                Ok(Lyrics::new(
                    format!("{}\n\n{}", FALLBACK_NOTICE, demo_lyrics(&request.song_title)),
                    LyricsOrigin::Fallback,
                ))
            }
        }
    }
}

fn demo_lyrics(title: &str) -> String {
    let chorus = format!(
        "[Chorus]\n\
         This is the {title} karaoke beat\n\
         Feel the rhythm, feel the heat\n\
         Sing it loud, sing it free\n\
         It's just the music and me\n"
    );

    format!(
        "[Verse 1]\n\
         Here we are, in the demo lab\n\
         Trying to sing, giving it a jab\n\
         The AI is thinking, processing the sound\n\
         Turning the vocals way, way down\n\
         \n\
         {chorus}\n\
         [Verse 2]\n\
         Paste the iframe, watch it load\n\
         AI magic in the code\n\
         MP3 or WAV to save\n\
         Ride the sonic sound wave\n\
         \n\
         {chorus}\n\
         [Bridge]\n\
         Download the track, take it away\n\
         Sing your heart out every day\n\
         High quality audio, crystal clear\n\
         The best karaoke app is here\n\
         \n\
         {chorus}\n\
         [Outro]\n\
         Yeah... just the music and me.\n\
         (Fade out)\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KaraokeError;

    struct Broken;

    impl LyricsService for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn is_available(&self) -> bool {
            false
        }

        fn transcribe(&self, _request: &LyricsRequest) -> Result<Lyrics> {
            Err(KaraokeError::Transcription {
                reason: "quota exceeded".to_string(),
            })
        }
    }

    #[test]
    fn test_offline_includes_title() {
        let lyrics = OfflineLyrics::new()
            .transcribe(&LyricsRequest::new("Moonlight"))
            .unwrap();
        assert_eq!(lyrics.origin, LyricsOrigin::Fallback);
        assert!(lyrics.text.contains("This is the Moonlight karaoke beat"));
        assert!(lyrics.text.starts_with("[Verse 1]"));
        assert_eq!(lyrics.sections().filter(|s| *s == "[Chorus]").count(), 3);
    }

    #[test]
    fn test_fallback_replaces_error() {
        let service = FallbackLyrics::new(Broken);
        let lyrics = service.transcribe(&LyricsRequest::new("Song")).unwrap();

        assert!(lyrics.text.starts_with(FALLBACK_NOTICE));
        assert!(lyrics.text.contains("This is the Song karaoke beat"));
        assert_eq!(service.name(), "broken");
        assert!(service.is_available());
    }

    #[test]
    fn test_fallback_passes_success_through() {
        let service = FallbackLyrics::new(OfflineLyrics);
        let direct = OfflineLyrics.transcribe(&LyricsRequest::new("A")).unwrap();
        assert_eq!(service.transcribe(&LyricsRequest::new("A")).unwrap(), direct);
    }
}
