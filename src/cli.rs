use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a translated subtitle file for a video
    Generate {
        /// Input video file
        #[arg(short, long)]
        input: PathBuf,

        /// Source language code
        #[arg(short, long, default_value = "ja")]
        src_lang: String,

        /// Target language code
        #[arg(short, long, default_value = "zh")]
        tgt_lang: String,

        /// Route through English when no direct translation model exists
        #[arg(long)]
        use_english_intermediate: bool,
    },

    /// Extract audio from a video file
    Extract {
        /// Input video file
        #[arg(short, long)]
        input: PathBuf,

        /// Output audio file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Transcribe an audio file straight to subtitles
    Transcribe {
        /// Input audio file
        #[arg(short, long)]
        input: PathBuf,

        /// Output subtitle file
        #[arg(short, long)]
        output: PathBuf,

        /// Source language hint
        #[arg(short, long, default_value = "ja")]
        language: String,
    },
}
