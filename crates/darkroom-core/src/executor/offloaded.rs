//! Executor backed by the worker thread.

use async_trait::async_trait;
use std::time::Duration;

use crate::backend::TaskDispatcher;
use crate::config::LimitsConfig;
use crate::error::ProcessingResult;
use crate::pipeline::{ImageDecoder, ImageHandlers, Operation, ProgressEvent};
use crate::types::{ExecutionPath, ImageInput, OperationOutput};

use super::{Executor, ProgressFn};

/// Decodes on the blocking pool, then hands the raster to the worker thread.
pub struct OffloadedExecutor {
    dispatcher: TaskDispatcher,
    decoder: ImageDecoder,
}

impl OffloadedExecutor {
    /// Start a worker thread with the stock handlers.
    pub fn start(limits: LimitsConfig, task_timeout: Duration) -> std::io::Result<Self> {
        let dispatcher = TaskDispatcher::spawn(ImageHandlers::offloaded(), task_timeout)?;
        Ok(Self::with_dispatcher(dispatcher, limits))
    }

    /// Wrap an existing dispatcher.
    pub fn with_dispatcher(dispatcher: TaskDispatcher, limits: LimitsConfig) -> Self {
        Self {
            dispatcher,
            decoder: ImageDecoder::new(limits),
        }
    }

    pub fn dispatcher(&self) -> &TaskDispatcher {
        &self.dispatcher
    }
}

#[async_trait]
impl Executor for OffloadedExecutor {
    fn path(&self) -> ExecutionPath {
        ExecutionPath::Offloaded
    }

    async fn execute(
        &self,
        operation: Operation,
        input: &ImageInput,
        on_progress: ProgressFn<'_>,
    ) -> ProcessingResult<OperationOutput> {
        let decoded = self.decoder.decode(input).await?;
        on_progress(ProgressEvent::Decoded);

        let handle = self.dispatcher.submit(operation, decoded, None)?;
        on_progress(ProgressEvent::Dispatched);
        tracing::trace!(
            "{}: waiting on {} task {}",
            input.name,
            handle.kind(),
            handle.id()
        );

        handle.wait().await
    }
}
