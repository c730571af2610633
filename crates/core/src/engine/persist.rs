//! Output path resolution and atomic writes.

use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;

use super::options::ConversionOptions;

/// Directory used when neither the options nor the source path give one.
const DEFAULT_OUTPUT_DIR: &str = ".";

/// Resolves where the output of a conversion is written.
///
/// Directory: `options.output_dir`, else the source file's directory, else `.`.
/// File name: `options.output_name`, else `<source stem>.<format>`, else `output.<format>`.
pub fn resolve_output_path(
    options: &ConversionOptions,
    source: Option<&Path>,
    output_format: &str,
) -> PathBuf {
    let dir = options
        .output_dir
        .clone()
        .or_else(|| {
            source
                .and_then(|p| p.parent())
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf)
        })
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));

    let name = match &options.output_name {
        Some(name) => name.clone(),
        None => {
            let stem = source
                .and_then(|p| p.file_stem())
                .and_then(|s| s.to_str())
                .unwrap_or("output");
            format!("{stem}.{output_format}")
        }
    };

    dir.join(name)
}

/// Writes `data` to `path` through a sibling temporary file and a rename.
///
/// Missing parent directories are created. On failure the temporary file is removed.
pub async fn write_atomic(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from(DEFAULT_OUTPUT_DIR),
    };
    fs::create_dir_all(&parent).await?;

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("output");
    let tmp_path = parent.join(format!(".{}.{}.tmp", file_name, uuid::Uuid::new_v4()));

    let written = async {
        let mut file = File::create(&tmp_path).await?;
        file.write_all(data).await?;
        file.sync_all().await?;
        fs::rename(&tmp_path, path).await
    }
    .await;

    if written.is_err() {
        let _ = fs::remove_file(&tmp_path).await;
    }
    written
}
