//! The processing facade - the single entry point callers use.
//!
//! Capability detection happens once, in [`ImageProcessor::new`]: either a
//! worker thread is started and every operation prefers it, or the processor
//! runs everything inline for its whole lifetime. Offloaded failures are
//! retried once inline; only the inline outcome reaches the caller.

use std::sync::atomic::{AtomicU8, Ordering};

use crate::config::{BackendMode, CompressConfig, Config};
use crate::error::{ProcessingResult, Result};
use crate::executor::{Executor, FallbackExecutor, OffloadedExecutor, ProgressFn};
use crate::types::{
    compression_ratio, Artifact, ExecutionPath, ImageInput, ImageMetadata, OperationOutput,
    ProcessedImage, ThumbnailArtifact, OUTPUT_MIME,
};

use super::operation::{CompressParams, Operation, ThumbnailParams};
use super::progress::ProgressEvent;
use super::thumbnail::data_url;

/// Options for `process_image`.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressOptions {
    /// Maximum output width in pixels
    pub max_width: u32,
    /// Maximum output height in pixels
    pub max_height: u32,
    /// JPEG quality in [0.0, 1.0]
    pub quality: f32,
}

impl Default for CompressOptions {
    fn default() -> Self {
        Self::from(&CompressConfig::default())
    }
}

impl From<&CompressConfig> for CompressOptions {
    fn from(config: &CompressConfig) -> Self {
        Self {
            max_width: config.max_width,
            max_height: config.max_height,
            quality: config.quality,
        }
    }
}

impl CompressOptions {
    fn operation(&self) -> Operation {
        Operation::Compress(CompressParams {
            max_width: self.max_width,
            max_height: self.max_height,
            quality: self.quality,
        })
    }
}

/// Forwards each checkpoint at most once and never goes backwards, even when
/// a failed offloaded attempt and its inline retry both report progress.
struct Progress<'a> {
    sink: ProgressFn<'a>,
    reached: AtomicU8,
}

impl<'a> Progress<'a> {
    fn new(sink: ProgressFn<'a>) -> Self {
        Self {
            sink,
            reached: AtomicU8::new(0),
        }
    }

    fn emit(&self, event: ProgressEvent) {
        let percent = event.percent();
        if self.reached.fetch_max(percent, Ordering::AcqRel) < percent {
            (self.sink)(event);
        }
    }
}

/// The image processor: compress, thumbnail and metadata operations.
pub struct ImageProcessor {
    offloaded: Option<Box<dyn Executor>>,
    fallback: FallbackExecutor,
    compress_defaults: CompressOptions,
    thumbnail_size: u32,
}

impl ImageProcessor {
    /// Create a processor, deciding once where operations will run.
    ///
    /// Must be called from within a Tokio runtime when the backend mode may
    /// start a worker. In `offloaded` mode a worker that cannot start is an
    /// error; in `auto` mode it silently selects inline execution.
    pub fn new(config: &Config) -> Result<Self> {
        let timeout = std::time::Duration::from_millis(config.backend.task_timeout_ms);
        let start = || OffloadedExecutor::start(config.limits.clone(), timeout);

        let offloaded: Option<Box<dyn Executor>> = match config.backend.mode {
            BackendMode::Fallback => None,
            BackendMode::Offloaded => Some(Box::new(start()?)),
            BackendMode::Auto => match start() {
                Ok(executor) => Some(Box::new(executor)),
                Err(e) => {
                    tracing::warn!("Worker thread unavailable, processing inline: {e}");
                    None
                }
            },
        };

        let mut processor =
            Self::with_executors(offloaded, FallbackExecutor::new(config.limits.clone()));
        processor.compress_defaults = CompressOptions::from(&config.compress);
        processor.thumbnail_size = config.thumbnail.size;
        tracing::debug!("Image processor using {} path", processor.execution_path());
        Ok(processor)
    }

    /// Assemble a processor from explicit executors.
    pub fn with_executors(
        offloaded: Option<Box<dyn Executor>>,
        fallback: FallbackExecutor,
    ) -> Self {
        Self {
            offloaded,
            fallback,
            compress_defaults: CompressOptions::default(),
            thumbnail_size: crate::config::ThumbnailConfig::default().size,
        }
    }

    /// The path chosen at construction.
    pub fn execution_path(&self) -> ExecutionPath {
        match &self.offloaded {
            Some(executor) => executor.path(),
            None => ExecutionPath::Fallback,
        }
    }

    /// Compression options from the configuration.
    pub fn compress_defaults(&self) -> &CompressOptions {
        &self.compress_defaults
    }

    /// Thumbnail edge from the configuration.
    pub fn thumbnail_size(&self) -> u32 {
        self.thumbnail_size
    }

    /// Downscale and re-encode an image.
    pub async fn process_image(
        &self,
        input: &ImageInput,
        options: &CompressOptions,
    ) -> ProcessingResult<ProcessedImage> {
        self.process_image_with_progress(input, options, |_| {}).await
    }

    /// Downscale and re-encode an image, reporting progress checkpoints.
    pub async fn process_image_with_progress<F>(
        &self,
        input: &ImageInput,
        options: &CompressOptions,
        on_progress: F,
    ) -> ProcessingResult<ProcessedImage>
    where
        F: Fn(ProgressEvent) + Send + Sync,
    {
        let start = std::time::Instant::now();
        let progress = Progress::new(&on_progress);
        progress.emit(ProgressEvent::Started);

        let (output, executed_by) = self
            .execute(options.operation(), input, &|e| progress.emit(e))
            .await?;
        progress.emit(ProgressEvent::BackendComplete);

        let image = expect_encoded(output)?;
        let original_size = input.size();
        let processed_size = image.byte_size;
        let dimensions = image.dimensions();
        let result = ProcessedImage {
            artifact: Artifact {
                name: input.output_name(),
                mime_type: OUTPUT_MIME.to_string(),
                image,
            },
            original_size,
            processed_size,
            dimensions,
            compression_ratio: compression_ratio(original_size, processed_size),
            executed_by,
        };
        progress.emit(ProgressEvent::Assembled);

        tracing::debug!(
            "Processed {} in {:?} ({}x{}, {} -> {} bytes, {})",
            input.name,
            start.elapsed(),
            result.dimensions.width,
            result.dimensions.height,
            original_size,
            processed_size,
            executed_by
        );
        Ok(result)
    }

    /// Produce a `size x size` thumbnail with a displayable data URL.
    pub async fn generate_thumbnail(
        &self,
        input: &ImageInput,
        size: u32,
    ) -> ProcessingResult<ThumbnailArtifact> {
        let operation = Operation::Thumbnail(ThumbnailParams { size });
        let (output, executed_by) = self.execute(operation, input, &|_| {}).await?;
        let image = expect_encoded(output)?;

        Ok(ThumbnailArtifact {
            data_url: data_url(&image.bytes),
            bytes: image.bytes,
            size,
            executed_by,
        })
    }

    /// Read dimensions, aspect ratio and megapixels.
    pub async fn get_metadata(&self, input: &ImageInput) -> ProcessingResult<ImageMetadata> {
        let (output, _) = self.execute(Operation::Metadata, input, &|_| {}).await?;
        output.into_metadata().ok_or_else(|| {
            crate::error::ProcessingError::BackendFault("metadata request returned an image".into())
        })
    }

    /// Run on the offloaded path when present, retrying inline on failure.
    async fn execute(
        &self,
        operation: Operation,
        input: &ImageInput,
        on_progress: ProgressFn<'_>,
    ) -> ProcessingResult<(OperationOutput, ExecutionPath)> {
        operation.validate()?;

        if let Some(offloaded) = &self.offloaded {
            match offloaded.execute(operation.clone(), input, on_progress).await {
                Ok(output) => return Ok((output, offloaded.path())),
                Err(e) if e.is_validation() => return Err(e),
                Err(e) => tracing::warn!(
                    "Offloaded {} failed for {}, retrying inline: {e}",
                    operation.kind(),
                    input.name
                ),
            }
        }

        let output = self.fallback.execute(operation, input, on_progress).await?;
        Ok((output, self.fallback.path()))
    }
}

fn expect_encoded(output: OperationOutput) -> ProcessingResult<crate::types::EncodedImage> {
    output.into_encoded().ok_or_else(|| {
        crate::error::ProcessingError::BackendFault("image request returned metadata".into())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{TaskDispatcher, DEFAULT_TASK_TIMEOUT};
    use crate::config::LimitsConfig;
    use crate::error::ProcessingError;
    use crate::pipeline::decode::tests::png_input;
    use crate::pipeline::{DecodedImage, OperationHandler};
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use std::sync::{Arc, Mutex};

    const ALL_EVENTS: [ProgressEvent; 5] = [
        ProgressEvent::Started,
        ProgressEvent::Decoded,
        ProgressEvent::Dispatched,
        ProgressEvent::BackendComplete,
        ProgressEvent::Assembled,
    ];

    /// Offloaded stand-in that always fails with a fixed error.
    struct FailingExecutor {
        error: ProcessingError,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Executor for FailingExecutor {
        fn path(&self) -> ExecutionPath {
            ExecutionPath::Offloaded
        }

        async fn execute(
            &self,
            _operation: Operation,
            _input: &ImageInput,
            on_progress: ProgressFn<'_>,
        ) -> ProcessingResult<OperationOutput> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            on_progress(ProgressEvent::Decoded);
            Err(self.error.clone())
        }
    }

    fn failing(error: ProcessingError) -> (ImageProcessor, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let executor = FailingExecutor {
            error,
            calls: Arc::clone(&calls),
        };
        let processor = ImageProcessor::with_executors(
            Some(Box::new(executor)),
            FallbackExecutor::new(LimitsConfig::default()),
        );
        (processor, calls)
    }

    fn fallback_config() -> Config {
        let mut config = Config::default();
        config.backend.mode = BackendMode::Fallback;
        config
    }

    fn options(max: u32, quality: f32) -> CompressOptions {
        CompressOptions {
            max_width: max,
            max_height: max,
            quality,
        }
    }

    #[test]
    fn test_compress_options_default() {
        assert_eq!(CompressOptions::default(), options(1920, 0.8));
    }

    #[tokio::test]
    async fn test_auto_mode_prefers_worker() {
        let processor = ImageProcessor::new(&Config::default()).unwrap();
        assert_eq!(processor.execution_path(), ExecutionPath::Offloaded);

        let result = processor
            .process_image(&png_input("big.png", 400, 200), &options(100, 0.8))
            .await
            .unwrap();
        assert_eq!(result.executed_by, ExecutionPath::Offloaded);
        assert_eq!((result.dimensions.width, result.dimensions.height), (100, 50));
        assert_eq!(result.artifact.name, "big.jpg");
        assert_eq!(result.artifact.mime_type, "image/jpeg");
    }

    #[tokio::test]
    async fn test_fallback_mode_reports_every_checkpoint() {
        let processor = ImageProcessor::new(&fallback_config()).unwrap();
        assert_eq!(processor.execution_path(), ExecutionPath::Fallback);

        let events = Mutex::new(Vec::new());
        let result = processor
            .process_image_with_progress(&png_input("p.png", 64, 64), &options(32, 0.8), |e| {
                events.lock().unwrap().push(e)
            })
            .await
            .unwrap();

        assert_eq!(result.executed_by, ExecutionPath::Fallback);
        assert_eq!(*events.lock().unwrap(), ALL_EVENTS.to_vec());
    }

    #[tokio::test]
    async fn test_result_sizes_and_ratio() {
        let processor = ImageProcessor::new(&fallback_config()).unwrap();
        let input = png_input("p.png", 120, 80);
        let result = processor
            .process_image(&input, &options(60, 0.5))
            .await
            .unwrap();

        assert_eq!(result.original_size, input.size());
        assert_eq!(result.processed_size, result.artifact.image.bytes.len() as u64);
        assert_eq!(
            result.compression_ratio,
            compression_ratio(result.original_size, result.processed_size)
        );
    }

    #[tokio::test]
    async fn test_offloaded_failure_falls_back_transparently() {
        for error in [
            ProcessingError::BackendFault("worker crashed".into()),
            ProcessingError::Timeout {
                stage: "task 1".into(),
                timeout_ms: 30_000,
            },
            ProcessingError::UnsupportedBackend,
        ] {
            let (processor, calls) = failing(error);
            let events = Mutex::new(Vec::new());
            let result = processor
                .process_image_with_progress(&png_input("p.png", 50, 40), &options(25, 0.8), |e| {
                    events.lock().unwrap().push(e)
                })
                .await
                .unwrap();

            assert_eq!(calls.load(Ordering::SeqCst), 1);
            assert_eq!(result.executed_by, ExecutionPath::Fallback);
            assert_eq!((result.dimensions.width, result.dimensions.height), (25, 20));
            // The retry does not repeat checkpoints
            assert_eq!(*events.lock().unwrap(), ALL_EVENTS.to_vec());
        }
    }

    #[tokio::test]
    async fn test_invalid_quality_rejected_before_dispatch() {
        let (processor, calls) = failing(ProcessingError::UnsupportedBackend);
        let err = processor
            .process_image(&png_input("p.png", 10, 10), &options(5, 1.5))
            .await
            .unwrap_err();

        assert!(err.is_validation());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_error_surfaces_only_when_fallback_also_fails() {
        let (processor, calls) = failing(ProcessingError::BackendFault("gone".into()));
        let err = processor
            .get_metadata(&ImageInput::new("junk.bin", b"junk data".to_vec()))
            .await
            .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(err, ProcessingError::Decode { .. }));
    }

    struct PanickingHandler;

    impl OperationHandler for PanickingHandler {
        fn handle(&self, _: &Operation, _: DecodedImage) -> ProcessingResult<OperationOutput> {
            panic!("worker state corrupted")
        }
    }

    #[tokio::test]
    async fn test_real_backend_fault_falls_back() {
        let dispatcher = TaskDispatcher::spawn(PanickingHandler, DEFAULT_TASK_TIMEOUT).unwrap();
        let processor = ImageProcessor::with_executors(
            Some(Box::new(OffloadedExecutor::with_dispatcher(
                dispatcher,
                LimitsConfig::default(),
            ))),
            FallbackExecutor::new(LimitsConfig::default()),
        );

        let thumb = processor
            .generate_thumbnail(&png_input("t.png", 80, 60), 24)
            .await
            .unwrap();
        assert_eq!(thumb.executed_by, ExecutionPath::Fallback);

        // The worker stays down; later calls keep succeeding inline
        let meta = processor
            .get_metadata(&png_input("t.png", 80, 60))
            .await
            .unwrap();
        assert_eq!(meta.width, 80);
    }

    #[tokio::test]
    async fn test_generate_thumbnail_data_url() {
        let processor = ImageProcessor::new(&Config::default()).unwrap();
        let thumb = processor
            .generate_thumbnail(&png_input("wide.png", 300, 100), 150)
            .await
            .unwrap();

        assert_eq!(thumb.size, 150);
        assert!(thumb.data_url.starts_with("data:image/jpeg;base64,"));
        let decoded = image::load_from_memory(&thumb.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (150, 150));
    }

    #[tokio::test]
    async fn test_oversized_thumbnail_rejected_on_both_paths() {
        for config in [Config::default(), fallback_config()] {
            let processor = ImageProcessor::new(&config).unwrap();
            for size in [100_000, u32::MAX] {
                let err = processor
                    .generate_thumbnail(&png_input("t.png", 8, 8), size)
                    .await
                    .unwrap_err();
                assert!(err.is_validation(), "size {size}");
            }
        }
    }

    #[tokio::test]
    async fn test_get_metadata() {
        let processor = ImageProcessor::new(&Config::default()).unwrap();
        let meta = processor
            .get_metadata(&png_input("m.png", 400, 300))
            .await
            .unwrap();
        assert!((meta.aspect_ratio - 4.0 / 3.0).abs() < 1e-12);
        assert_eq!(meta.megapixels, 0.12);
    }

    #[tokio::test]
    async fn test_config_defaults_carried() {
        let mut config = fallback_config();
        config.compress.quality = 0.5;
        config.thumbnail.size = 64;
        let processor = ImageProcessor::new(&config).unwrap();
        assert_eq!(processor.compress_defaults().quality, 0.5);
        assert_eq!(processor.thumbnail_size(), 64);
    }
}
