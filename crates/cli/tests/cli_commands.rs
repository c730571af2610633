use std::io::Write;
use std::path::Path;
use std::process::Output;

use tempfile::{NamedTempFile, TempDir};

/// Run the binary to completion with quiet logs.
async fn fileforge(args: &[&str], cwd: &Path) -> Output {
    tokio::process::Command::new(env!("CARGO_BIN_EXE_fileforge"))
        .args(args)
        .current_dir(cwd)
        .env("RUST_LOG", "error")
        .env("NO_COLOR", "1")
        .output()
        .await
        .expect("Failed to run fileforge")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[tokio::test]
async fn test_convert_writes_output() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("notes.md"), "# Notes\n\nHello.\n").unwrap();

    let output = fileforge(&["convert", "notes.md", "--to", "html", "-o", "out/notes.html"], dir.path()).await;

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let html = std::fs::read_to_string(dir.path().join("out/notes.html")).unwrap();
    assert!(html.contains("<h1>Notes</h1>"));
}

#[tokio::test]
async fn test_convert_failure_exits_one() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("a.txt"), "text").unwrap();

    let output = fileforge(&["convert", "a.txt", "--to", "xyz"], dir.path()).await;

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unsupported output format: xyz"));
}

#[tokio::test]
async fn test_convert_json_result() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("rows.csv"), "a,b\n1,2\n").unwrap();

    let output = fileforge(&["convert", "rows.csv", "--to", "md", "--json"], dir.path()).await;

    assert!(output.status.success());
    let result: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(result["success"], true);
    assert_eq!(result["original_format"], "csv");
    assert_eq!(result["output_format"], "md");
}

#[tokio::test]
async fn test_batch_without_matches_exits_one() {
    let dir = TempDir::new().unwrap();

    let output = fileforge(&["batch", "*.nomatch", "--to", "txt"], dir.path()).await;

    assert_eq!(output.status.code(), Some(1));
}

#[tokio::test]
async fn test_batch_converts_matches() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir(dir.path().join("docs")).unwrap();
    std::fs::write(dir.path().join("docs/a.md"), "# A\n").unwrap();
    std::fs::write(dir.path().join("docs/b.md"), "# B\n").unwrap();

    let output = fileforge(&["batch", "docs/*.md", "--to", "html", "-o", "site"], dir.path()).await;

    assert!(output.status.success());
    assert!(dir.path().join("site/a.html").is_file());
    assert!(dir.path().join("site/b.html").is_file());
}

#[tokio::test]
async fn test_formats_respects_disabled_plugins() {
    let dir = TempDir::new().unwrap();
    let mut config = NamedTempFile::new().unwrap();
    writeln!(config, "[plugins]\ndisabled = [\"image\"]").unwrap();
    let config_path = config.path().to_string_lossy().into_owned();

    let output = fileforge(&["--config", &config_path, "formats", "--json"], dir.path()).await;

    assert!(output.status.success());
    let formats: Vec<serde_json::Value> = serde_json::from_str(&stdout(&output)).unwrap();
    let extensions: Vec<&str> = formats.iter().filter_map(|f| f["extension"].as_str()).collect();
    assert!(extensions.contains(&"md"));
    assert!(!extensions.contains(&"png"));
}

#[tokio::test]
async fn test_metadata_json() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("readme.md"), "# Readme\n\nsome words here\n").unwrap();

    let output = fileforge(&["metadata", "readme.md", "--json", "--save", "meta.json"], dir.path()).await;

    assert!(output.status.success());
    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("meta.json")).unwrap()).unwrap();
    assert_eq!(saved["format"], "md");
    assert_eq!(saved["document"]["title"], "Readme");
}
