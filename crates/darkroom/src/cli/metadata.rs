//! The `darkroom metadata` command.

use std::path::PathBuf;

use clap::Args;
use darkroom_core::{Config, ImageMetadata, ImageProcessor, OutputFormat, OutputWriter};
use serde::Serialize;

use super::read_input;

/// Arguments for the `metadata` command.
#[derive(Args, Debug)]
pub struct MetadataArgs {
    /// Image file
    pub input: PathBuf,
}

#[derive(Debug, Serialize)]
struct MetadataRecord {
    name: String,
    file_size: u64,
    #[serde(flatten)]
    metadata: ImageMetadata,
}

/// Execute the metadata command.
pub async fn execute(args: MetadataArgs, config: &Config) -> anyhow::Result<()> {
    let processor = ImageProcessor::new(config)?;
    let input = read_input(&args.input).await?;
    let metadata = processor.get_metadata(&input).await?;

    let record = MetadataRecord {
        file_size: input.size(),
        name: input.name,
        metadata,
    };
    OutputWriter::new(std::io::stdout().lock(), OutputFormat::Json, true).write(&record)?;
    Ok(())
}
