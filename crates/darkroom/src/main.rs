//! Darkroom CLI - compress, thumbnail and inspect images.
//!
//! Work runs on a dedicated worker thread when one can be started and inline
//! otherwise; results are identical in shape either way.
//!
//! # Usage
//!
//! ```bash
//! # Compress images into ./compressed
//! darkroom process a.png b.jpg --max-width 1280
//!
//! # Square thumbnail as a data URL
//! darkroom thumbnail photo.jpg --size 150 --data-url
//!
//! # Dimensions and megapixels
//! darkroom metadata photo.jpg
//!
//! # View configuration
//! darkroom config show
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// Darkroom - offloaded image compression and thumbnails.
#[derive(Parser, Debug)]
#[command(name = "darkroom")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file to use instead of the default location
    #[arg(long, global = true, env = "DARKROOM_CONFIG")]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Downscale and re-encode images as JPEG
    Process(cli::process::ProcessArgs),

    /// Generate a square thumbnail
    Thumbnail(cli::thumbnail::ThumbnailArgs),

    /// Print dimensions, aspect ratio and megapixels
    Metadata(cli::metadata::MetadataArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so use eprintln for config warnings.
    let config = match &cli.config {
        Some(path) => darkroom_core::Config::load_from_str_path(path)?,
        None => match darkroom_core::Config::load() {
            Ok(config) => config,
            Err(e) => {
                eprintln!(
                    "Warning: Failed to load config: {e}\n  \
                     Using default configuration. Check your config file with `darkroom config path`."
                );
                darkroom_core::Config::default()
            }
        },
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Darkroom v{}", darkroom_core::VERSION);

    match cli.command {
        Commands::Process(args) => cli::process::execute(args, &config).await,
        Commands::Thumbnail(args) => cli::thumbnail::execute(args, &config).await,
        Commands::Metadata(args) => cli::metadata::execute(args, &config).await,
        Commands::Config(args) => cli::config::execute(args, &config, cli.config.as_deref()),
    }
}
