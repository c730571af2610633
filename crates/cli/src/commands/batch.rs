use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;

use fileforge_core::{
    BatchConversionOptions, BatchEvent, ChannelObserver, CompressionLevel, ConversionEngine,
};

use crate::output;

#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Glob patterns; `**` matches recursively
    #[arg(value_name = "PATTERN", required = true)]
    patterns: Vec<String>,

    /// Output format
    #[arg(short, long, value_name = "FORMAT")]
    to: String,

    /// Output directory (defaults to each file's own directory)
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Compression level: none, low, medium, high, maximum
    #[arg(short, long, value_name = "LEVEL")]
    compress: Option<CompressionLevel>,

    /// Enable OCR for text extraction
    #[arg(long)]
    ocr: bool,

    /// Extract metadata for every file
    #[arg(long)]
    metadata: bool,

    /// Maximum simultaneous conversions
    #[arg(long, value_name = "N")]
    max_concurrent: Option<usize>,

    /// Keep going after a hard error
    #[arg(long, conflicts_with = "fail_fast")]
    continue_on_error: bool,

    /// Stop at the first hard error
    #[arg(long)]
    fail_fast: bool,
}

impl BatchArgs {
    fn options(&self, base: BatchConversionOptions) -> BatchConversionOptions {
        let mut options = base;
        if let Some(dir) = &self.output {
            options.conversion.output_dir = Some(dir.clone());
        }
        if let Some(level) = self.compress {
            options.conversion.compression = level;
        }
        options.conversion.ocr = self.ocr;
        options.conversion.metadata = self.metadata;
        if let Some(n) = self.max_concurrent {
            options.max_concurrency = n;
        }
        if self.continue_on_error {
            options.continue_on_error = true;
        }
        if self.fail_fast {
            options.continue_on_error = false;
        }
        options
    }
}

pub async fn run(args: BatchArgs, engine: &ConversionEngine) -> Result<bool> {
    let (observer, mut events) = ChannelObserver::channel();
    let options = args
        .options(BatchConversionOptions::from_config(engine.config()))
        .with_observer(Arc::new(observer));

    let total = fileforge_core::plan_batch(&args.patterns, &options)
        .context("Invalid glob pattern")?
        .len();
    let progress = output::batch_progress(total);

    let render = {
        let progress = progress.clone();
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                match event {
                    BatchEvent::Progress { completed, file, .. } => {
                        progress.set_position(completed as u64);
                        if let Some(name) = file.file_name() {
                            progress.set_message(name.to_string_lossy().into_owned());
                        }
                    }
                    BatchEvent::Error { file, error } => {
                        progress.inc(1);
                        progress.println(format!(
                            "{} {}: {}",
                            "✗".red().bold(),
                            file.display(),
                            error.red()
                        ));
                    }
                }
            }
        })
    };

    let outcome = engine.convert_batch(&args.patterns, &args.to, &options).await;

    // options own the only sender; dropping them ends the render task
    drop(options);
    let _ = render.await;
    progress.finish_and_clear();

    let result = match outcome {
        Ok(result) => result,
        Err(e) => {
            output::failure(&format!("Batch conversion failed: {e}"));
            return Ok(false);
        }
    };

    if result.success_count == 0 {
        output::failure(&format!(
            "No file was converted successfully ({} matched)",
            result.total_files
        ));
        print_failures(&result);
        return Ok(false);
    }

    output::success("Batch conversion completed");
    output::heading("Summary:");
    output::field("Total files", result.total_files);
    output::field("Succeeded", result.success_count.to_string().green());
    output::field("Failed", result.soft_failure_count().to_string().yellow());
    output::field("Errors", result.error_count.to_string().red());
    output::field("Total time", output::format_duration_ms(result.total_time_ms));
    print_failures(&result);

    Ok(true)
}

fn print_failures(result: &fileforge_core::BatchConversionResult) {
    let soft: Vec<_> = result.results.iter().filter(|r| !r.success).collect();
    if soft.is_empty() && result.errors.is_empty() {
        return;
    }
    output::heading("Errors:");
    for failed in soft {
        println!("  {}", failed.errors.join("; "));
    }
    for entry in &result.errors {
        println!("  {}: {}", entry.file.display(), entry.error);
    }
}
