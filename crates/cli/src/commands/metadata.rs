use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use fileforge_core::{ConversionEngine, MetadataResult};

use crate::output;

#[derive(Args, Debug)]
pub struct MetadataArgs {
    /// File to inspect
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Print the metadata as JSON
    #[arg(long)]
    json: bool,

    /// Also write the metadata as JSON to this file
    #[arg(long, value_name = "PATH")]
    save: Option<PathBuf>,
}

pub async fn run(args: MetadataArgs, engine: &ConversionEngine) -> Result<bool> {
    let metadata = engine
        .extract_metadata(args.input.as_path(), None)
        .await
        .with_context(|| format!("Failed to extract metadata from {}", args.input.display()))?;
    let json = serde_json::to_string_pretty(&metadata)?;

    if args.json {
        println!("{json}");
    } else {
        print_metadata(&metadata);
    }

    if let Some(path) = &args.save {
        tokio::fs::write(path, &json)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        output::success(&format!("Metadata saved to {}", output::path(path)));
    }

    Ok(true)
}

fn print_metadata(metadata: &MetadataResult) {
    output::heading("Metadata:");
    output::field("Format", &metadata.format);
    output::field("MIME type", &metadata.mime_type);
    output::field("Size", output::format_bytes(metadata.file_size));
    if let Some(created) = metadata.created {
        output::field("Created", created.to_rfc3339());
    }
    if let Some(modified) = metadata.modified {
        output::field("Modified", modified.to_rfc3339());
    }
    if let Some(dims) = metadata.dimensions {
        output::field("Dimensions", format!("{}x{}", dims.width, dims.height));
    }
    if let Some(duration) = metadata.duration {
        output::field("Duration", format!("{duration}s"));
    }

    if let Some(doc) = metadata.document.as_ref().filter(|d| !d.is_empty()) {
        output::heading("Document:");
        if let Some(pages) = doc.page_count {
            output::field("Pages", pages);
        }
        if let Some(words) = doc.word_count {
            output::field("Words", words);
        }
        if let Some(title) = &doc.title {
            output::field("Title", title);
        }
        if let Some(author) = &doc.author {
            output::field("Author", author);
        }
    }

    if let Some(exif) = metadata.exif.as_ref().filter(|e| !e.is_empty()) {
        output::heading("EXIF:");
        for (key, value) in exif {
            output::field(key, value);
        }
    }

    if !metadata.custom.is_empty() {
        output::heading("Other:");
        for (key, value) in &metadata.custom {
            output::field(key, value);
        }
    }
}
