//! The `darkroom thumbnail` command.

use std::path::{Path, PathBuf};

use clap::Args;
use darkroom_core::config::expand_path;
use darkroom_core::{Config, ExecutionPath, ImageProcessor};
use serde::Serialize;

use super::read_input;

/// Arguments for the `thumbnail` command.
#[derive(Args, Debug)]
pub struct ThumbnailArgs {
    /// Image file
    pub input: PathBuf,

    /// Edge length in pixels (defaults to config)
    #[arg(short, long)]
    pub size: Option<u32>,

    /// Output file (defaults to `<name>_thumb.jpg` in the current directory)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Print the `data:` URL to stdout instead of writing a file
    #[arg(long)]
    pub data_url: bool,
}

#[derive(Debug, Serialize)]
struct ThumbnailRecord {
    input: PathBuf,
    output: PathBuf,
    size: u32,
    executed_by: ExecutionPath,
}

/// Execute the thumbnail command.
pub async fn execute(args: ThumbnailArgs, config: &Config) -> anyhow::Result<()> {
    let processor = ImageProcessor::new(config)?;
    let size = args.size.unwrap_or(processor.thumbnail_size());
    let input = read_input(&args.input).await?;

    let thumb = processor.generate_thumbnail(&input, size).await?;
    tracing::debug!("Thumbnail of {} via {}", input.name, thumb.executed_by);

    if args.data_url {
        println!("{}", thumb.data_url);
        return Ok(());
    }

    let output = args
        .output
        .as_deref()
        .map(expand_path)
        .unwrap_or_else(|| default_output(&args.input));
    tokio::fs::write(&output, &thumb.bytes).await?;

    let record = ThumbnailRecord {
        input: args.input,
        output,
        size: thumb.size,
        executed_by: thumb.executed_by,
    };
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

fn default_output(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image");
    PathBuf::from(format!("{stem}_thumb.jpg"))
}
