use anyhow::{Context, Result};
use clap::Args;
use std::collections::BTreeSet;
use std::path::PathBuf;

use fileforge_core::ConversionEngine;

use crate::output;

#[derive(Args, Debug)]
pub struct InfoArgs {
    /// File to describe
    #[arg(value_name = "INPUT")]
    input: PathBuf,
}

pub async fn run(args: InfoArgs, engine: &ConversionEngine) -> Result<bool> {
    let metadata = engine
        .extract_metadata(args.input.as_path(), None)
        .await
        .with_context(|| format!("Failed to inspect {}", args.input.display()))?;

    output::heading("File information:");
    output::field("Path", output::path(&args.input));
    output::field("Size", output::format_bytes(metadata.file_size));
    if let Some(created) = metadata.created {
        output::field("Created", created.to_rfc3339());
    }
    if let Some(modified) = metadata.modified {
        output::field("Modified", modified.to_rfc3339());
    }
    output::field("Detected format", &metadata.format);
    output::field("MIME type", &metadata.mime_type);

    let targets: BTreeSet<String> = engine
        .plugins()
        .await
        .into_iter()
        .filter(|p| p.input_formats.contains(&metadata.format))
        .flat_map(|p| p.output_formats)
        .filter(|f| f != &metadata.format)
        .map(|f| f.to_uppercase())
        .collect();

    if !targets.is_empty() {
        output::heading("Available conversions:");
        println!("  {}", targets.into_iter().collect::<Vec<_>>().join(", "));
    }

    Ok(true)
}
