//! CLI Module
//!
//! Command-line interface for Karaoke Studio.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Karaoke Studio - make instrumentals and fetch lyrics
#[derive(Parser, Debug)]
#[command(name = "karaoke")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// JSON config file (environment variables still override it)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Remove center-panned vocals from an audio file
    #[command(name = "process")]
    Process {
        /// Input audio file (mp3, wav, m4a)
        file: PathBuf,

        /// Song title for lyrics and the output name (default: file name)
        #[arg(short, long)]
        title: Option<String>,

        /// Output directory (default: from config)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Override the MIME type guessed from the extension
        #[arg(long)]
        mime: Option<String>,

        /// Skip the lyrics request
        #[arg(long)]
        no_lyrics: bool,
    },

    /// Fetch lyrics for a YouTube video
    #[command(name = "youtube")]
    Youtube {
        /// Video URL or iframe embed code
        reference: String,

        /// Song title for the lyrics request
        #[arg(short, long)]
        title: Option<String>,
    },

    /// Print the header of an instrumental WAV file
    #[command(name = "inspect")]
    Inspect {
        /// WAV file to inspect
        file: PathBuf,
    },

    /// Process every audio file under a directory
    #[command(name = "batch")]
    Batch {
        /// Directory to scan
        dir: PathBuf,

        /// Output directory (default: from config)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}
