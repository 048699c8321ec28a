//! The `darkroom process` command: compress images concurrently.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU8, Ordering};

use clap::Args;
use darkroom_core::config::expand_path;
use darkroom_core::types::compression_ratio;
use darkroom_core::{
    CompressOptions, Config, ImageProcessor, OutputFormat, OutputWriter, ProcessedImage,
    ProgressEvent,
};
use futures_util::stream::{FuturesUnordered, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use super::read_input;

/// Arguments for the `process` command.
#[derive(Args, Debug)]
pub struct ProcessArgs {
    /// Image files to compress
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Directory for the re-encoded `<name>.jpg` files
    #[arg(short = 'd', long, default_value = "compressed")]
    pub output_dir: String,

    /// Maximum output width (defaults to config)
    #[arg(long)]
    pub max_width: Option<u32>,

    /// Maximum output height (defaults to config)
    #[arg(long)]
    pub max_height: Option<u32>,

    /// JPEG quality between 0.0 and 1.0 (defaults to config)
    #[arg(short, long)]
    pub quality: Option<f32>,

    /// Summary output format: json or jsonl
    #[arg(short, long, default_value = "json")]
    pub format: OutputFormat,
}

impl ProcessArgs {
    /// Overlay command-line bounds on the configured defaults.
    fn options(&self, defaults: &CompressOptions) -> CompressOptions {
        CompressOptions {
            max_width: self.max_width.unwrap_or(defaults.max_width),
            max_height: self.max_height.unwrap_or(defaults.max_height),
            quality: self.quality.unwrap_or(defaults.quality),
        }
    }
}

/// One summary line per processed image.
#[derive(Debug, Serialize)]
pub struct ProcessRecord {
    pub input: PathBuf,
    pub output: PathBuf,
    #[serde(flatten)]
    pub result: ProcessedImage,
}

/// Running totals for the summary.
#[derive(Debug, Default)]
struct Totals {
    succeeded: usize,
    failed: usize,
    original_bytes: u64,
    processed_bytes: u64,
}

impl Totals {
    fn add(&mut self, result: &ProcessedImage) {
        self.succeeded += 1;
        self.original_bytes += result.original_size;
        self.processed_bytes += result.processed_size;
    }
}

/// Execute the process command.
pub async fn execute(args: ProcessArgs, config: &Config) -> anyhow::Result<()> {
    let processor = ImageProcessor::new(config)?;
    let options = args.options(processor.compress_defaults());
    let output_dir = expand_path(&args.output_dir);
    tokio::fs::create_dir_all(&output_dir).await?;

    tracing::info!(
        "Compressing {} image(s) to {} via {} path",
        args.inputs.len(),
        output_dir.display(),
        processor.execution_path()
    );

    let outputs = assign_outputs(&args.inputs, &output_dir);
    let progress = create_progress_bar(args.inputs.len() as u64);
    let start_time = std::time::Instant::now();

    let mut pending: FuturesUnordered<_> = args
        .inputs
        .iter()
        .zip(outputs)
        .map(|(path, output)| process_one(&processor, path, output, &options, &progress))
        .collect();

    let stdout = std::io::stdout();
    let mut writer = OutputWriter::new(stdout.lock(), args.format, true);
    let mut records = Vec::new();
    let mut totals = Totals::default();

    while let Some((path, outcome)) = pending.next().await {
        match outcome {
            Ok(record) => {
                totals.add(&record.result);
                progress.set_message(record.result.artifact.name.clone());
                if args.format == OutputFormat::JsonLines {
                    writer.write(&record)?;
                } else {
                    records.push(record);
                }
            }
            Err(e) => {
                totals.failed += 1;
                tracing::error!("Failed: {} - {e:#}", path.display());
            }
        }
    }
    progress.finish_with_message("done");

    if args.format == OutputFormat::Json {
        writer.write_all(&records)?;
    }

    print_summary(&totals, writer.records_written(), start_time.elapsed());

    if totals.failed > 0 {
        anyhow::bail!("{} of {} image(s) failed", totals.failed, args.inputs.len());
    }
    Ok(())
}

/// Pick a distinct `<stem>.jpg` in `output_dir` for every input.
///
/// Inputs sharing a stem (`a/photo.png`, `b/photo.webp`) get `photo.jpg`,
/// `photo-1.jpg`, ... in input order. Names compare case-insensitively.
fn assign_outputs(inputs: &[PathBuf], output_dir: &Path) -> Vec<PathBuf> {
    let mut taken = HashSet::new();
    inputs
        .iter()
        .map(|input| {
            let stem = input
                .file_stem()
                .and_then(|s| s.to_str())
                .filter(|s| !s.is_empty())
                .unwrap_or("image");
            let mut name = format!("{stem}.jpg");
            let mut suffix = 1;
            while !taken.insert(name.to_lowercase()) {
                name = format!("{stem}-{suffix}.jpg");
                suffix += 1;
            }
            output_dir.join(name)
        })
        .collect()
}

/// Read, compress and save one input to `output`. Advances the bar by
/// exactly one image's share.
async fn process_one<'a>(
    processor: &ImageProcessor,
    path: &'a Path,
    output: PathBuf,
    options: &CompressOptions,
    progress: &ProgressBar,
) -> (&'a Path, anyhow::Result<ProcessRecord>) {
    let reached = AtomicU8::new(0);
    let advance = |event: ProgressEvent| {
        let percent = event.percent();
        let previous = reached.swap(percent, Ordering::AcqRel);
        progress.inc(u64::from(percent.saturating_sub(previous)));
    };

    let outcome = async {
        let input = read_input(path).await?;
        let mut result = processor
            .process_image_with_progress(&input, options, advance)
            .await?;

        tokio::fs::write(&output, &result.artifact.image.bytes).await?;
        if let Some(name) = output.file_name().and_then(|n| n.to_str()) {
            result.artifact.name = name.to_string();
        }
        tracing::debug!(
            "{} -> {} ({}% smaller)",
            path.display(),
            output.display(),
            result.compression_ratio
        );

        anyhow::Ok(ProcessRecord {
            input: path.to_path_buf(),
            output,
            result,
        })
    }
    .await;

    // Failed inputs still complete their share of the bar
    let done = reached.load(Ordering::Acquire);
    progress.inc(u64::from(100u8.saturating_sub(done)));

    (path, outcome)
}

/// One bar unit per percent per image.
fn create_progress_bar(images: u64) -> ProgressBar {
    let pb = ProgressBar::new(images * 100);
    if let Ok(style) = ProgressStyle::default_bar().template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {percent}% {msg}",
    ) {
        pb.set_style(style.progress_chars("##-"));
    }
    pb.set_message("starting...");
    pb
}

/// Print a formatted summary to stderr.
fn print_summary(totals: &Totals, records_written: usize, elapsed: std::time::Duration) {
    eprintln!();
    eprintln!("  ====================================");
    eprintln!("             Compression Complete");
    eprintln!("  ====================================");
    eprintln!("    Succeeded:    {:>7}", totals.succeeded);
    if totals.failed > 0 {
        eprintln!("    Failed:       {:>7}", totals.failed);
    }
    eprintln!("    Records:      {:>7}", records_written);
    eprintln!("    Duration:     {:>7.1}s", elapsed.as_secs_f64());
    if totals.succeeded > 0 {
        eprintln!(
            "    Saved:        {:>7.1}%",
            compression_ratio(totals.original_bytes, totals.processed_bytes)
        );
    }
    eprintln!("  ====================================");
}
