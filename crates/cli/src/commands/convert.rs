use anyhow::{Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};

use fileforge_core::{CompressionLevel, ConversionEngine, ConversionOptions};

use crate::output;

#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// File to convert
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output format
    #[arg(short, long, value_name = "FORMAT")]
    to: String,

    /// Output file path (defaults to no file, only a summary)
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Conversion quality (0-100)
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(0..=100))]
    quality: Option<u8>,

    /// Compression level: none, low, medium, high, maximum
    #[arg(short, long, value_name = "LEVEL")]
    compress: Option<CompressionLevel>,

    /// Enable OCR for text extraction
    #[arg(long)]
    ocr: bool,

    /// OCR language
    #[arg(long, value_name = "LANG")]
    ocr_lang: Option<String>,

    /// Extract metadata alongside the conversion
    #[arg(long)]
    metadata: bool,

    /// Resize images to WxH (e.g. 800x600)
    #[arg(long, value_name = "WxH")]
    resize: Option<String>,

    /// Rotate images by 90, 180 or 270 degrees
    #[arg(long, value_name = "DEG")]
    rotate: Option<u16>,

    /// Read the input through a buffered stream
    #[arg(long)]
    streaming: bool,

    /// Use this plugin instead of the first match
    #[arg(long, value_name = "NAME")]
    plugin: Option<String>,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

impl ConvertArgs {
    fn options(&self, base: ConversionOptions) -> ConversionOptions {
        let mut options = base;
        if let Some(output) = &self.output {
            let (dir, name) = split_output(output);
            options.output_dir = dir;
            options.output_name = name;
        }
        if let Some(quality) = self.quality {
            options.quality = quality;
        }
        if let Some(level) = self.compress {
            options.compression = level;
        }
        if let Some(lang) = &self.ocr_lang {
            options.ocr_language = lang.clone();
        }
        options.ocr = self.ocr;
        options.metadata = self.metadata;
        options.streaming = self.streaming;
        options.plugin = self.plugin.clone();
        if let Some(resize) = &self.resize {
            options = options.with_image_option("resize", resize.as_str());
        }
        if let Some(rotate) = self.rotate {
            options = options.with_image_option("rotate", rotate);
        }
        options
    }
}

/// Splits `-o` into output directory and file name. An existing directory is
/// used as the directory with the default name.
fn split_output(output: &Path) -> (Option<PathBuf>, Option<String>) {
    if output.is_dir() {
        return (Some(output.to_path_buf()), None);
    }
    let dir = output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .or_else(|| Some(PathBuf::from(".")));
    let name = output.file_name().map(|n| n.to_string_lossy().into_owned());
    (dir, name)
}

pub async fn run(args: ConvertArgs, engine: &ConversionEngine) -> Result<bool> {
    let options = args.options(ConversionOptions::from_config(engine.config()));

    let spinner = (!args.json).then(|| output::spinner(&format!("Converting {}", args.input.display())));
    let result = engine
        .convert(args.input.as_path(), &args.to, &options)
        .await
        .context("Conversion could not start")?;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(result.success);
    }

    if !result.success {
        output::failure("Conversion failed");
        for error in &result.errors {
            output::failure(&format!("  {error}"));
        }
        return Ok(false);
    }

    output::success("Conversion completed");
    output::heading("Details:");
    output::field("Original format", &result.original_format);
    output::field("Output format", &result.output_format);
    output::field("Original size", output::format_bytes(result.original_size));
    output::field("Output size", output::format_bytes(result.output_size.unwrap_or(0)));
    output::field("Processing time", output::format_duration(result.processing_time_secs));
    if let Some(path) = &result.output_path {
        output::field("Saved to", output::path(path));
    }
    for warning in &result.warnings {
        output::field("Warning", warning);
    }

    if let (true, Some(metadata)) = (args.metadata, &result.metadata) {
        output::heading("Metadata:");
        println!("{}", serde_json::to_string_pretty(metadata)?);
    }

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: ConvertArgs,
    }

    fn parse(argv: &[&str]) -> ConvertArgs {
        let mut full = vec!["fileforge"];
        full.extend_from_slice(argv);
        Harness::parse_from(full).args
    }

    #[test]
    fn test_flags_map_onto_options() {
        let args = parse(&[
            "in.png", "--to", "jpg", "-o", "out/pic.jpg", "-q", "60", "-c", "high", "--resize",
            "80x60", "--rotate", "90", "--metadata",
        ]);
        let options = args.options(ConversionOptions::default());

        assert_eq!(options.output_dir, Some(PathBuf::from("out")));
        assert_eq!(options.output_name.as_deref(), Some("pic.jpg"));
        assert_eq!(options.quality, 60);
        assert_eq!(options.compression, CompressionLevel::High);
        assert!(options.metadata);
        assert_eq!(options.image_option("resize"), Some(&serde_json::json!("80x60")));
        assert_eq!(options.image_option("rotate"), Some(&serde_json::json!(90)));
    }

    #[test]
    fn test_quality_out_of_range_rejected() {
        let result = Harness::try_parse_from(["fileforge", "in.txt", "--to", "md", "-q", "101"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_split_output() {
        let dir = TempDir::new().unwrap();
        assert_eq!(split_output(dir.path()), (Some(dir.path().to_path_buf()), None));
        assert_eq!(
            split_output(Path::new("report.html")),
            (Some(PathBuf::from(".")), Some("report.html".to_string()))
        );
    }
}
