//! Executors: where an operation actually runs.
//!
//! The processor holds an optional offloaded executor (worker thread) and an
//! always-present fallback executor (caller's thread). Both decode the raw
//! input themselves, so a failed offloaded attempt leaves the input intact
//! for the fallback.

mod fallback;
mod offloaded;

pub use fallback::FallbackExecutor;
pub use offloaded::OffloadedExecutor;

use async_trait::async_trait;

use crate::error::ProcessingResult;
use crate::pipeline::{Operation, ProgressEvent};
use crate::types::{ExecutionPath, ImageInput, OperationOutput};

/// Progress callback handed down to executors.
pub type ProgressFn<'a> = &'a (dyn Fn(ProgressEvent) + Send + Sync);

/// Runs operations against raw inputs.
///
/// Uses `async_trait` so the processor can hold `Box<dyn Executor>`.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Which path this executor represents.
    fn path(&self) -> ExecutionPath;

    /// Decode `input` and run `operation` on it.
    ///
    /// Emits `Decoded` and `Dispatched` through `on_progress`.
    async fn execute(
        &self,
        operation: Operation,
        input: &ImageInput,
        on_progress: ProgressFn<'_>,
    ) -> ProcessingResult<OperationOutput>;
}
