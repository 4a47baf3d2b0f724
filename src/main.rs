//! Sublate - subtitle generation and translation for video files
//!
//! This is the main entry point for the sublate application: extract a
//! video's audio, transcribe it, translate it across languages, and write
//! a synchronized SRT file.

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use sublate::cli::{Args, Commands};
use sublate::config::Config;
use sublate::pipeline::Pipeline;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    setup_logging(args.verbose)?;

    // Load configuration
    let config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            // Try config.toml from the current directory first
            if std::path::Path::new("config.toml").exists() {
                info!("Found config.toml in current directory, loading...");
                Config::from_file("config.toml")?
            } else {
                Config::default()
            }
        }
    };

    let pipeline = Pipeline::new(config)?;

    match args.command {
        Commands::Generate {
            input,
            src_lang,
            tgt_lang,
            use_english_intermediate,
        } => {
            info!("Processing video file: {}", input.display());
            let output = pipeline
                .generate_subtitles(&input, &src_lang, &tgt_lang, use_english_intermediate)
                .await?;
            println!("Subtitles saved to: {}", output.display());
        }
        Commands::Extract { input, output } => {
            info!("Extracting audio from: {}", input.display());
            pipeline.extract_audio(&input, &output).await?;
            println!("Audio saved to: {}", output.display());
        }
        Commands::Transcribe {
            input,
            output,
            language,
        } => {
            info!("Transcribing audio: {}", input.display());
            pipeline.transcribe_audio(&input, &output, &language).await?;
            println!("Transcript saved to: {}", output.display());
        }
    }

    Ok(())
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<()> {
    // Create log directory
    let log_dir = std::env::current_dir()?.join(".sublate").join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Set up file appender with daily rotation
    let file_appender = rolling::daily(&log_dir, "sublate.log");
    let (non_blocking_file, _guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(_guard);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer().with_target(false);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_ansi(false); // No ANSI colors in file

    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer);

    subscriber
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}
