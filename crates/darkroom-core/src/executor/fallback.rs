//! Executor that runs everything inline on the caller's thread.

use async_trait::async_trait;

use crate::config::LimitsConfig;
use crate::error::ProcessingResult;
use crate::pipeline::{ImageDecoder, ImageHandlers, Operation, OperationHandler, ProgressEvent};
use crate::types::{ExecutionPath, ImageInput, OperationOutput};

use super::{Executor, ProgressFn};

/// Decodes and runs handlers synchronously, without spawning or channels.
///
/// Used when no worker exists and as the retry path after an offloaded
/// failure. Resamples with a cheaper filter than the worker; output
/// geometry is identical, bytes are not.
pub struct FallbackExecutor {
    decoder: ImageDecoder,
    handlers: ImageHandlers,
}

impl FallbackExecutor {
    pub fn new(limits: LimitsConfig) -> Self {
        Self {
            decoder: ImageDecoder::new(limits),
            handlers: ImageHandlers::inline(),
        }
    }

    /// Decode and run `operation` on the current thread.
    pub fn run(
        &self,
        operation: &Operation,
        input: &ImageInput,
        on_progress: ProgressFn<'_>,
    ) -> ProcessingResult<OperationOutput> {
        let decoded = self.decoder.decode_sync(input)?;
        on_progress(ProgressEvent::Decoded);
        on_progress(ProgressEvent::Dispatched);
        self.handlers.handle(operation, decoded)
    }
}

#[async_trait]
impl Executor for FallbackExecutor {
    fn path(&self) -> ExecutionPath {
        ExecutionPath::Fallback
    }

    async fn execute(
        &self,
        operation: Operation,
        input: &ImageInput,
        on_progress: ProgressFn<'_>,
    ) -> ProcessingResult<OperationOutput> {
        self.run(&operation, input, on_progress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProcessingError;
    use crate::pipeline::decode::tests::png_input;
    use crate::pipeline::CompressParams;

    #[test]
    fn test_fallback_compress_runs_inline() {
        let executor = FallbackExecutor::new(LimitsConfig::default());
        let output = executor
            .run(
                &Operation::Compress(CompressParams {
                    max_width: 50,
                    max_height: 50,
                    quality: 0.6,
                }),
                &png_input("tall.png", 40, 200),
                &|_| {},
            )
            .unwrap()
            .into_encoded()
            .unwrap();
        assert_eq!((output.width, output.height), (10, 50));
    }

    #[test]
    fn test_fallback_metadata() {
        let executor = FallbackExecutor::new(LimitsConfig::default());
        let meta = executor
            .run(&Operation::Metadata, &png_input("m.png", 40, 20), &|_| {})
            .unwrap()
            .into_metadata()
            .unwrap();
        assert_eq!(meta.aspect_ratio, 2.0);
    }

    #[test]
    fn test_fallback_reports_decode_errors() {
        let executor = FallbackExecutor::new(LimitsConfig::default());
        let err = executor
            .run(
                &Operation::Metadata,
                &ImageInput::new("notes.txt", b"not an image".to_vec()),
                &|_| {},
            )
            .unwrap_err();
        assert!(matches!(err, ProcessingError::Decode { .. }));
    }
}
