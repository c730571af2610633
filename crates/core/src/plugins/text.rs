//! Text, markup and tabular data conversions.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde_json::{Map, Value};
use tracing::debug;

use crate::engine::{CompressionLevel, ConversionOptions};
use crate::plugin::{format_list, Plugin, PluginError, PluginInput, PluginOutput};

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());
static SCRIPT_OR_STYLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<(script|style)[^>]*>.*?</(script|style)>").unwrap());
static HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<h([1-6])[^>]*>(.*?)</h[1-6]>").unwrap());
static LIST_ITEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<li[^>]*>(.*?)</li>").unwrap());
static BLOCK_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<br\s*/?>|</p>|</div>|</tr>|</h[1-6]>|</li>").unwrap());
static BETWEEN_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r">\s+<").unwrap());
static BLANK_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

/// Converts between plain text, Markdown, HTML, CSV and JSON.
#[derive(Debug)]
pub struct TextPlugin {
    inputs: Vec<String>,
    outputs: Vec<String>,
}

impl Default for TextPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl TextPlugin {
    pub fn new() -> Self {
        Self {
            inputs: format_list(&["txt", "md", "markdown", "html", "htm", "csv", "json"]),
            outputs: format_list(&["txt", "md", "html", "json"]),
        }
    }
}

/// Folds aliases onto one token.
fn canonical(format: &str) -> &str {
    match format {
        "markdown" => "md",
        "htm" => "html",
        other => other,
    }
}

#[async_trait]
impl Plugin for TextPlugin {
    fn name(&self) -> &str {
        "text"
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    fn input_formats(&self) -> &[String] {
        &self.inputs
    }

    fn output_formats(&self) -> &[String] {
        &self.outputs
    }

    async fn convert(
        &self,
        input: PluginInput<'_>,
        options: &ConversionOptions,
    ) -> Result<PluginOutput, PluginError> {
        let from = canonical(input.format);
        let to = canonical(options.output_format.as_deref().unwrap_or(from));
        let text = std::str::from_utf8(input.data)
            .map_err(|e| PluginError::decode(input.format, e))?;

        debug!(from, to, bytes = text.len(), "Converting text");

        let output = match (from, to) {
            (a, b) if a == b => optimize(text, from, options.compression)?,
            ("txt", "md") => text.to_string(),
            ("txt", "html") => paragraphs_to_html(text),
            ("md", "html") => markdown_to_html(text),
            ("md", "txt") => html_to_text(&markdown_to_html(text)),
            ("html", "txt") => html_to_text(text),
            ("html", "md") => html_to_markdown(text),
            ("csv", "md") => rows_to_markdown(&read_csv(text)?),
            ("csv", "html") => rows_to_html(&read_csv(text)?),
            ("csv", "json") => rows_to_json(&read_csv(text)?, options.compression)?,
            ("csv", "txt") => read_csv(text)?
                .iter()
                .map(|row| row.join("\t"))
                .collect::<Vec<_>>()
                .join("\n"),
            ("json", "txt") => pretty_json(text, CompressionLevel::Medium)?,
            ("json", "md") => format!("```json\n{}\n```\n", pretty_json(text, CompressionLevel::Medium)?),
            ("json", "html") => format!(
                "<pre><code class=\"language-json\">{}</code></pre>\n",
                escape_html(&pretty_json(text, CompressionLevel::Medium)?)
            ),
            (_, "json") => text_to_json(text, options.compression)?,
            (_, other) => {
                return Err(PluginError::UnsupportedOutput {
                    format: other.to_string(),
                })
            }
        };

        Ok(PluginOutput::Text(output))
    }
}

/// Same-format pass: whitespace normalization, JSON re-encoding.
fn optimize(text: &str, format: &str, compression: CompressionLevel) -> Result<String, PluginError> {
    match format {
        "json" => pretty_json(text, compression),
        "html" => Ok(BETWEEN_TAGS.replace_all(text.trim(), "><").into_owned()),
        _ => Ok(normalize_whitespace(text)),
    }
}

fn normalize_whitespace(text: &str) -> String {
    let trimmed: Vec<&str> = text.lines().map(str::trim_end).collect();
    let joined = trimmed.join("\n");
    let mut out = BLANK_RUN.replace_all(joined.trim(), "\n\n").into_owned();
    out.push('\n');
    out
}

fn pretty_json(text: &str, compression: CompressionLevel) -> Result<String, PluginError> {
    let value: Value = serde_json::from_str(text).map_err(|e| PluginError::decode("json", e))?;
    encode_json(&value, compression)
}

fn encode_json(value: &Value, compression: CompressionLevel) -> Result<String, PluginError> {
    let encoded = match compression {
        CompressionLevel::High | CompressionLevel::Maximum => serde_json::to_string(value),
        _ => serde_json::to_string_pretty(value),
    };
    encoded.map_err(|e| PluginError::encode("json", e))
}

fn text_to_json(text: &str, compression: CompressionLevel) -> Result<String, PluginError> {
    let lines: Vec<Value> = text.lines().map(|l| Value::from(l.trim_end())).collect();
    let mut object = Map::new();
    object.insert("text".to_string(), Value::from(text.trim()));
    object.insert("lines".to_string(), Value::from(lines));
    encode_json(&Value::Object(object), compression)
}

fn markdown_to_html(markdown: &str) -> String {
    let mut options = comrak::Options::default();
    options.extension.table = true;
    options.extension.strikethrough = true;
    options.extension.autolink = true;
    comrak::markdown_to_html(markdown, &options)
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn unescape_html(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

fn paragraphs_to_html(text: &str) -> String {
    text.split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| format!("<p>{}</p>\n", escape_html(p).replace('\n', "<br>\n")))
        .collect()
}

fn html_to_text(html: &str) -> String {
    let without_code = SCRIPT_OR_STYLE.replace_all(html, "");
    let with_breaks = BLOCK_BREAK.replace_all(&without_code, "\n");
    let stripped = TAG.replace_all(&with_breaks, "");
    let lines: Vec<String> = unescape_html(&stripped)
        .lines()
        .map(|l| l.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect();
    normalize_whitespace(&lines.join("\n"))
}

fn html_to_markdown(html: &str) -> String {
    let without_code = SCRIPT_OR_STYLE.replace_all(html, "");
    let headings = HEADING.replace_all(&without_code, |caps: &regex_lite::Captures<'_>| {
        let level: usize = caps[1].parse().unwrap_or(1);
        format!("\n{} {}\n", "#".repeat(level), TAG.replace_all(&caps[2], "").trim())
    });
    let items = LIST_ITEM.replace_all(&headings, |caps: &regex_lite::Captures<'_>| {
        format!("\n- {}\n", TAG.replace_all(&caps[1], "").trim())
    });
    html_to_text(&items)
}

fn read_csv(text: &str) -> Result<Vec<Vec<String>>, PluginError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(false)
        .from_reader(text.as_bytes());

    reader
        .records()
        .map(|record| {
            record
                .map(|r| r.iter().map(str::to_string).collect())
                .map_err(|e| PluginError::decode("csv", e))
        })
        .collect()
}

fn rows_to_markdown(rows: &[Vec<String>]) -> String {
    let Some(header) = rows.first() else {
        return String::new();
    };
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    let cell = |row: &[String], i: usize| row.get(i).map(|c| c.replace('|', "\\|")).unwrap_or_default();
    let line = |row: &[String]| {
        let cells: Vec<String> = (0..width).map(|i| cell(row, i)).collect();
        format!("| {} |\n", cells.join(" | "))
    };

    let mut out = line(header);
    out.push_str(&format!("|{}\n", " --- |".repeat(width)));
    for row in &rows[1..] {
        out.push_str(&line(row));
    }
    out
}

fn rows_to_html(rows: &[Vec<String>]) -> String {
    let Some(header) = rows.first() else {
        return "<table></table>\n".to_string();
    };
    let row_html = |row: &[String], tag: &str| {
        let cells: String = row
            .iter()
            .map(|c| format!("<{tag}>{}</{tag}>", escape_html(c)))
            .collect();
        format!("<tr>{cells}</tr>\n")
    };

    let mut out = String::from("<table>\n<thead>\n");
    out.push_str(&row_html(header, "th"));
    out.push_str("</thead>\n<tbody>\n");
    for row in &rows[1..] {
        out.push_str(&row_html(row, "td"));
    }
    out.push_str("</tbody>\n</table>\n");
    out
}

fn rows_to_json(rows: &[Vec<String>], compression: CompressionLevel) -> Result<String, PluginError> {
    let Some(header) = rows.first() else {
        return encode_json(&Value::Array(Vec::new()), compression);
    };
    let records: Vec<Value> = rows[1..]
        .iter()
        .map(|row| {
            let object: Map<String, Value> = header
                .iter()
                .enumerate()
                .map(|(i, key)| (key.clone(), Value::from(row.get(i).cloned().unwrap_or_default())))
                .collect();
            Value::Object(object)
        })
        .collect();
    encode_json(&Value::Array(records), compression)
}
