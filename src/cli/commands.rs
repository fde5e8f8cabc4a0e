//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::path::{Path, PathBuf};

use log::{info, warn};
use walkdir::WalkDir;

use crate::config::Config;
use crate::engine::buffer::linear_to_db;
use crate::engine::{SourceAudio, WavHeader};
use crate::error::{KaraokeError, Result};
use crate::input::SourceInput;
use crate::lyrics::{service_from_config, Lyrics};
use crate::pipeline::Pipeline;
use crate::session::{ArtifactInfo, Session};

/// Extensions accepted by `process` and picked up by `batch`
pub const AUDIO_EXTENSIONS: [&str; 3] = ["mp3", "wav", "m4a"];

/// Process one audio file: write the instrumental and print the lyrics.
pub fn process_file(
    config: &Config,
    file: &Path,
    title: Option<&str>,
    output: Option<&Path>,
    mime: Option<&str>,
    no_lyrics: bool,
) -> Result<()> {
    info!("Processing audio: {}", file.display());

    let mut source = SourceAudio::from_path(file)?;
    if let Some(mime) = mime {
        let name = source.file_name().map(str::to_string);
        source = SourceAudio::new(source.bytes().to_vec(), mime);
        if let Some(name) = name {
            source = source.with_file_name(name);
        }
    }

    let lyrics = if no_lyrics {
        None
    } else {
        service_from_config(&config.lyrics)
    };
    let session = Session::new(Pipeline::new(), lyrics);
    let input = SourceInput::upload(Some(source))?;
    let outcome = session.process(&input, title)?;
    let out_dir = output.unwrap_or(config.output_dir.as_path());

    println!("=== Karaoke Studio ===");
    println!("Input: {}", file.display());
    println!("Title: {}", outcome.title);
    println!();

    let instrumental = match outcome.instrumental {
        Some(Ok(info)) => {
            print_artifact(&info);
            if let Some(path) = session.save_current(out_dir)? {
                println!("Output saved to: {}", path.display());
            }
            Ok(())
        }
        Some(Err(e)) => {
            println!("ERROR: {}", e.friendly_message());
            Err(e)
        }
        None => Ok(()),
    };

    if let Some(lyrics) = outcome.lyrics {
        println!();
        print_lyrics(lyrics);
    }

    instrumental
}

/// Fetch lyrics for a YouTube reference.
pub fn youtube(config: &Config, reference: &str, title: Option<&str>) -> Result<()> {
    info!("Resolving YouTube reference: {}", reference);

    let input = SourceInput::youtube(reference)?;
    let session = Session::new(Pipeline::new(), service_from_config(&config.lyrics));
    let outcome = session.process(&input, title)?;

    if let Some(video_id) = &outcome.video_id {
        println!("Video: https://www.youtube.com/watch?v={}", video_id);
    }
    println!("Title: {}", outcome.title);
    println!("Audio extraction from YouTube is not available; upload the file to make an instrumental.");
    println!();

    match outcome.lyrics {
        Some(lyrics) => print_lyrics(lyrics),
        None => println!("Lyrics are disabled in the configuration."),
    }

    Ok(())
}

/// Print the canonical header of a WAV file.
pub fn inspect(file: &Path) -> Result<()> {
    info!("Inspecting: {}", file.display());

    let bytes = std::fs::read(file).map_err(|e| KaraokeError::FileNotFound {
        path: file.display().to_string(),
        source: Some(e),
    })?;
    let header = WavHeader::parse(&bytes)?;

    println!("{}", serde_json::to_string_pretty(&header)?);

    let frames = header.data_size / u32::from(header.block_align.max(1));
    println!("\n--- Summary ---");
    println!("File size: {} bytes", bytes.len());
    println!("Frames: {}", frames);
    if header.sample_rate > 0 {
        println!(
            "Duration: {:.2} s",
            f64::from(frames) / f64::from(header.sample_rate)
        );
    }

    let expected_chunk = bytes.len().saturating_sub(8);
    if header.chunk_size as usize != expected_chunk {
        warn!(
            "ChunkSize {} does not match file length ({} expected)",
            header.chunk_size, expected_chunk
        );
    }

    Ok(())
}

/// Process every supported audio file under `dir`, continuing past failures.
pub fn batch(config: &Config, dir: &Path, output: Option<&Path>) -> Result<()> {
    info!("Batch processing: {}", dir.display());

    if !dir.is_dir() {
        return Err(KaraokeError::FileNotFound {
            path: dir.display().to_string(),
            source: None,
        });
    }

    let out_dir = output.unwrap_or(config.output_dir.as_path());
    let session = Session::new(Pipeline::new(), None);
    let files = audio_files(dir);

    if files.is_empty() {
        println!("No audio files found in {}", dir.display());
        return Ok(());
    }

    let mut failed = 0;
    for file in &files {
        match process_one(&session, file, out_dir) {
            Ok(path) => println!("OK    {} -> {}", file.display(), path.display()),
            Err(e) => {
                failed += 1;
                warn!("{}: {}", file.display(), e);
                println!("FAIL  {} ({})", file.display(), e.friendly_message());
            }
        }
    }

    println!("{:-<60}", "");
    println!(
        "Processed: {} | Failed: {}",
        files.len() - failed,
        failed
    );

    Ok(())
}

fn process_one(session: &Session, file: &Path, out_dir: &Path) -> Result<PathBuf> {
    let input = SourceInput::upload(Some(SourceAudio::from_path(file)?))?;
    let outcome = session.process(&input, None)?;

    match outcome.instrumental {
        Some(Ok(_)) => session
            .save_current(out_dir)?
            .ok_or_else(|| KaraokeError::InvalidContainer {
                reason: "instrumental was released before it could be saved".to_string(),
            }),
        Some(Err(e)) => Err(e),
        None => Err(KaraokeError::EmptyInput {
            what: file.display().to_string(),
        }),
    }
}

/// Supported audio files under `dir`, sorted by path
fn audio_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|e| e.to_str())
                .map(|e| e.to_ascii_lowercase())
                .is_some_and(|e| AUDIO_EXTENSIONS.contains(&e.as_str()))
        })
        .collect();
    files.sort();
    files
}

fn print_artifact(info: &ArtifactInfo) {
    let report = &info.report;
    println!("Instrumental: {}", info.file_name);
    println!("  Frames: {}", report.frame_count);
    println!("  Duration: {:.2} s", info.duration_secs);
    println!("  Size: {} bytes", info.bytes);
    println!("  SHA-256: {}", info.checksum);
    println!("  Peak: {:.1} dBFS", linear_to_db(report.peak));

    if report.mono_source {
        println!("  Note: the source is mono, so the instrumental is silent.");
    }
    if report.ignored_channels > 0 {
        println!(
            "  Note: {} channel(s) beyond stereo were ignored.",
            report.ignored_channels
        );
    }
    if report.will_clip() {
        println!("  Note: the difference exceeds full scale and was clipped.");
    }
}

fn print_lyrics(lyrics: Result<Lyrics>) {
    match lyrics {
        Ok(lyrics) if lyrics.is_instrumental() => {
            println!("No lyrics: this track is instrumental.");
        }
        Ok(lyrics) => {
            println!("--- Lyrics ---");
            println!("{}", lyrics.text);
        }
        Err(e) => {
            warn!("Lyrics unavailable: {}", e);
            println!("Lyrics unavailable: {}", e.friendly_message());
        }
    }
}
