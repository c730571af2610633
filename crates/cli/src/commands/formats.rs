use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::collections::BTreeMap;

use fileforge_core::{ConversionEngine, FormatCategory, SupportedFormat};

use crate::output;

#[derive(Args, Debug)]
pub struct FormatsArgs {
    /// Only list formats of this category (document, text, data, image, ...)
    #[arg(long, value_name = "CAT")]
    category: Option<FormatCategory>,

    /// Print the list as JSON
    #[arg(long)]
    json: bool,
}

pub async fn run(args: FormatsArgs, engine: &ConversionEngine) -> Result<bool> {
    let formats: Vec<SupportedFormat> = engine
        .supported_formats()
        .await
        .into_iter()
        .filter(|f| args.category.map_or(true, |c| f.category == c))
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&formats)?);
        return Ok(true);
    }

    let mut by_category: BTreeMap<FormatCategory, Vec<&SupportedFormat>> = BTreeMap::new();
    for format in &formats {
        by_category.entry(format.category).or_default().push(format);
    }

    println!("{}", "Supported formats:".blue().bold());
    for (category, entries) in by_category {
        println!("\n{}", category.as_str().to_uppercase().yellow().bold());
        for format in entries {
            println!(
                "  {}: {} ({})",
                format.extension.to_uppercase(),
                format.description,
                capabilities(format)
            );
        }
    }
    if formats.is_empty() {
        output::field("Formats", "none");
    }

    Ok(true)
}

fn capabilities(format: &SupportedFormat) -> String {
    let mut caps = Vec::new();
    if format.can_read {
        caps.push("read".green().to_string());
    }
    if format.can_write {
        caps.push("write".blue().to_string());
    }
    if format.has_metadata {
        caps.push("metadata".magenta().to_string());
    }
    if caps.is_empty() {
        "none".to_string()
    } else {
        caps.join(", ")
    }
}
