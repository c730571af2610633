//! Subcommands. Each returns `Ok(false)` when the process should exit with 1.

mod batch;
mod convert;
mod formats;
mod info;
mod metadata;

use anyhow::Result;
use clap::Subcommand;

use fileforge_core::ConversionEngine;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Convert a file to another format
    Convert(convert::ConvertArgs),
    /// Convert every file matched by glob patterns
    Batch(batch::BatchArgs),
    /// Extract metadata from a file
    Metadata(metadata::MetadataArgs),
    /// List supported formats
    Formats(formats::FormatsArgs),
    /// Show information about a file and where it can be converted to
    Info(info::InfoArgs),
}

pub async fn execute(command: Command, engine: &ConversionEngine) -> Result<bool> {
    match command {
        Command::Convert(args) => convert::run(args, engine).await,
        Command::Batch(args) => batch::run(args, engine).await,
        Command::Metadata(args) => metadata::run(args, engine).await,
        Command::Formats(args) => formats::run(args, engine).await,
        Command::Info(args) => info::run(args, engine).await,
    }
}
