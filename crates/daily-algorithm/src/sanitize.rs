//! Helpers for sanitizing data before it enters log lines and span fields,
//! plus the filename derivation used for rendered output.

use std::path::Path;

use sha2::{Digest, Sha256};

/// Returns only the filename component of a path (no directory).
pub fn redact_path(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("<unknown>")
        .to_string()
}

/// Drops the query string and fragment from a URL.
///
/// - `https://host/v1/files?key=abc` → `https://host/v1/files`
/// - `https://youtube.com/shorts/xyz` → unchanged
pub fn redact_url(url: &str) -> String {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    url[..end].to_string()
}

/// Returns a short deterministic hex digest of `text`, stable across runs.
pub fn short_hash(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    digest.iter().take(6).map(|b| format!("{:02x}", b)).collect()
}

/// Lowercase ASCII slug of `text` limited to `max_len` characters.
///
/// Runs of anything that is not alphanumeric collapse into a single `-`.
pub fn slugify(text: &str, max_len: usize) -> String {
    let mut slug = String::with_capacity(max_len);
    let mut pending_dash = false;

    for c in text.chars() {
        if slug.len() >= max_len {
            break;
        }
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    while slug.ends_with('-') || slug.len() > max_len {
        slug.pop();
    }

    if slug.is_empty() {
        "video".to_string()
    } else {
        slug
    }
}

/// Truncates to at most `max_chars` characters on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
