//! Karaoke Studio - Instrumental Extraction and Lyrics
//!
//! Turns a song into a karaoke instrumental by cancelling the center
//! channel, and fetches its lyrics side by side.
//!
//! # Architecture
//!
//! A run is a three-stage pipeline over buffers it owns exclusively:
//! - Decode: compressed or WAV bytes → per-channel f32 samples
//! - Separate: left minus right, cancelling center-panned vocals
//! - Encode: mono 16-bit PCM in a canonical 44-byte-header WAV container
//!
//! A [`session::Session`] allows one in-flight run, runs the lyrics request
//! next to the pipeline, and owns the resulting artifact handle.

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod input;
pub mod lyrics;
pub mod pipeline;
pub mod session;

pub use config::Config;
pub use error::{KaraokeError, Result};
pub use input::SourceInput;
pub use pipeline::{process_audio, Pipeline, PipelineOutput};
pub use session::{ProcessOutcome, Session};
