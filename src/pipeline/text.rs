//! Best-effort text extraction from uploaded documents.
//!
//! Converts plain-text uploads and naively-readable digital PDFs into text
//! for the classifier's OCR sample. Extraction is never fatal: scanned PDFs,
//! images and anything unreadable yield an empty string and the pipeline
//! continues. The attachment itself remains the primary source of truth for
//! the vision-capable skills.

use std::sync::OnceLock;

use regex::Regex;

/// Extract plain text from raw document bytes. Total: never fails.
pub fn extract_text(bytes: &[u8], media_type: &str) -> String {
    if bytes.is_empty() {
        return String::new();
    }

    if media_type.starts_with("text/") || media_type == "application/json" {
        return sanitize_text(&String::from_utf8_lossy(bytes));
    }

    if media_type == "application/pdf" || bytes.starts_with(b"%PDF") {
        return sanitize_text(&pdf_literal_text(bytes));
    }

    // No declared text type: accept bytes that decode as mostly-printable
    // UTF-8 (uploads from tools that omit the media type).
    if let Ok(text) = std::str::from_utf8(bytes) {
        if looks_like_text(text) {
            return sanitize_text(text);
        }
    }

    String::new()
}

/// Naive digital-PDF fallback: collect parenthesized string literals from
/// uncompressed content streams. Compressed or scanned PDFs yield nothing,
/// which is fine: this only feeds the classifier's bounded sample.
fn pdf_literal_text(bytes: &[u8]) -> String {
    let mut out = String::new();
    let mut depth = 0usize;
    let mut current = Vec::new();
    let mut escape = false;

    for &b in bytes {
        if depth == 0 {
            if b == b'(' {
                depth = 1;
                current.clear();
            }
            continue;
        }
        if escape {
            current.push(b);
            escape = false;
            continue;
        }
        match b {
            b'\\' => escape = true,
            b'(' => {
                depth += 1;
                current.push(b);
            }
            b')' => {
                depth -= 1;
                if depth == 0 {
                    if let Ok(chunk) = std::str::from_utf8(&current) {
                        if looks_like_text(chunk) {
                            out.push_str(chunk);
                            out.push(' ');
                        }
                    }
                } else {
                    current.push(b);
                }
            }
            _ => current.push(b),
        }
    }

    out
}

fn looks_like_text(s: &str) -> bool {
    if s.is_empty() {
        return false;
    }
    let printable = s
        .chars()
        .filter(|c| !c.is_control() || matches!(c, '\n' | '\r' | '\t'))
        .count();
    printable * 10 >= s.chars().count() * 9
}

/// Strip control characters and collapse whitespace runs.
fn sanitize_text(text: &str) -> String {
    static SPACES: OnceLock<Regex> = OnceLock::new();
    static NEWLINES: OnceLock<Regex> = OnceLock::new();

    let without_control: String = text
        .chars()
        .filter(|c| !c.is_control() || matches!(c, '\n' | '\t'))
        .collect();

    let spaces = SPACES.get_or_init(|| Regex::new(r"[ \t]{2,}").expect("static regex"));
    let newlines = NEWLINES.get_or_init(|| Regex::new(r"\n{3,}").expect("static regex"));

    let collapsed = spaces.replace_all(&without_control, " ");
    newlines.replace_all(&collapsed, "\n\n").trim().to_string()
}
