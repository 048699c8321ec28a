//! Subcommand implementations.

pub mod config;
pub mod metadata;
pub mod process;
pub mod thumbnail;

use anyhow::Context;
use darkroom_core::ImageInput;
use std::path::Path;

/// Read an input file, naming it in the error.
pub(crate) async fn read_input(path: &Path) -> anyhow::Result<ImageInput> {
    ImageInput::from_path(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
}
