//! Binary signature (magic number) sniffing.

/// Number of leading bytes inspected by the text heuristics.
const TEXT_SNIFF_LEN: usize = 8 * 1024;

/// Fixed-offset signatures checked before anything else.
const SIGNATURES: &[(&[u8], &str)] = &[
    (b"%PDF", "pdf"),
    (b"\x89PNG\r\n\x1a\n", "png"),
    (b"\xFF\xD8\xFF", "jpg"),
    (b"GIF87a", "gif"),
    (b"GIF89a", "gif"),
    (b"II*\x00", "tiff"),
    (b"MM\x00*", "tiff"),
    (b"{\\rtf", "rtf"),
];

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Returns the format token matching the buffer's leading bytes, if any.
///
/// Order: the fixed table above, ZIP containers (office/e-book flavours first),
/// RIFF containers, the `infer` matcher set, then text heuristics.
pub fn sniff_signature(buffer: &[u8]) -> Option<&'static str> {
    if buffer.is_empty() {
        return None;
    }

    if let Some(format) = SIGNATURES
        .iter()
        .find(|(magic, _)| buffer.starts_with(magic))
        .map(|(_, format)| *format)
    {
        return Some(format);
    }

    if buffer.starts_with(ZIP_MAGIC) {
        return Some(sniff_zip_flavour(buffer));
    }

    if buffer.len() >= 12 && &buffer[..4] == b"RIFF" {
        match &buffer[8..12] {
            b"WEBP" => return Some("webp"),
            b"WAVE" => return Some("wav"),
            b"AVI " => return Some("avi"),
            _ => {}
        }
    }

    if let Some(kind) = infer::get(buffer) {
        return Some(kind.extension());
    }

    let truncated = buffer.len() > TEXT_SNIFF_LEN;
    sniff_text(&buffer[..buffer.len().min(TEXT_SNIFF_LEN)], truncated)
}

fn sniff_zip_flavour(buffer: &[u8]) -> &'static str {
    if contains(buffer, b"mimetypeapplication/epub+zip") {
        "epub"
    } else if contains(buffer, b"mimetypeapplication/vnd.oasis.opendocument.text") {
        "odt"
    } else if contains(buffer, b"word/") {
        "docx"
    } else if contains(buffer, b"xl/") {
        "xlsx"
    } else if contains(buffer, b"ppt/") {
        "pptx"
    } else {
        "zip"
    }
}

fn sniff_text(prefix: &[u8], truncated: bool) -> Option<&'static str> {
    if prefix.contains(&0) {
        return None;
    }

    // A multi-byte character cut at the prefix boundary is still text.
    let text = match std::str::from_utf8(prefix) {
        Ok(text) => text,
        Err(e) if e.error_len().is_none() => {
            std::str::from_utf8(&prefix[..e.valid_up_to()]).ok()?
        }
        Err(_) => return None,
    };

    let head = text.trim_start_matches('\u{feff}').trim_start();
    let lowered: String = head.chars().take(64).collect::<String>().to_ascii_lowercase();

    if lowered.starts_with("<?xml") {
        Some("xml")
    } else if lowered.starts_with("<!doctype html") || lowered.starts_with("<html") {
        Some("html")
    } else if (head.starts_with('{') || head.starts_with('['))
        && (truncated || serde_json::from_str::<serde_json::Value>(text).is_ok())
    {
        Some("json")
    } else {
        Some("txt")
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}
