//! Unicode cleanup for edited source files
//!
//! The assistant occasionally pastes invisible or typographic Unicode into
//! source files: zero-width characters, bidi controls, smart quotes. This
//! pass normalizes them to plain ASCII equivalents and strips the
//! invisible ones. Files are only rewritten when the content changed;
//! non-UTF-8 files are skipped.

use mend_core::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Characters removed outright (invisible / layout-control)
const STRIPPED: &[char] = &[
    '\u{200B}', // zero-width space
    '\u{200C}', // zero-width non-joiner
    '\u{200D}', // zero-width joiner
    '\u{FEFF}', // BOM / zero-width no-break space
    '\u{202A}', '\u{202B}', '\u{202C}', '\u{202D}', '\u{202E}', // bidi embeds
    '\u{2066}', '\u{2067}', '\u{2068}', '\u{2069}', // bidi isolates
];

/// Normalize one character to its ASCII replacement, if any
fn replacement(c: char) -> Option<&'static str> {
    match c {
        '\u{00A0}' => Some(" "),               // no-break space
        '\u{2018}' | '\u{2019}' => Some("'"),  // smart single quotes
        '\u{201C}' | '\u{201D}' => Some("\""), // smart double quotes
        '\u{2013}' | '\u{2014}' => Some("-"),  // en/em dash
        '\u{2026}' => Some("..."),             // ellipsis
        _ => None,
    }
}

/// Clean a text buffer; returns the cleaned text and whether it changed
pub fn clean_text(input: &str) -> (String, bool) {
    let mut output = String::with_capacity(input.len());
    let mut changed = false;

    for c in input.chars() {
        if STRIPPED.contains(&c) {
            changed = true;
            continue;
        }
        if let Some(repl) = replacement(c) {
            output.push_str(repl);
            changed = true;
            continue;
        }
        output.push(c);
    }

    (output, changed)
}

/// Clean a set of files in place; returns the files that were rewritten
///
/// Missing and non-UTF-8 files are skipped, never an error.
pub async fn clean_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut cleaned = Vec::new();

    for path in paths {
        if clean_file(path).await? {
            cleaned.push(path.clone());
        }
    }

    if !cleaned.is_empty() {
        info!("Unicode cleanup rewrote {} file(s)", cleaned.len());
    }
    Ok(cleaned)
}

/// Clean one file in place; returns true if it was rewritten
pub async fn clean_file(path: &Path) -> Result<bool> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(_) => {
            debug!("Skipping unreadable file {}", path.display());
            return Ok(false);
        }
    };

    let content = match String::from_utf8(bytes) {
        Ok(content) => content,
        Err(_) => {
            debug!("Skipping non-UTF-8 file {}", path.display());
            return Ok(false);
        }
    };

    let (cleaned, changed) = clean_text(&content);
    if !changed {
        return Ok(false);
    }

    tokio::fs::write(path, cleaned).await?;
    debug!("Cleaned {}", path.display());
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_strips_zero_width_and_bom() {
        let (out, changed) = clean_text("a\u{200B}b\u{FEFF}c");
        assert!(changed);
        assert_eq!(out, "abc");
    }

    #[test]
    fn test_normalizes_smart_punctuation() {
        let (out, changed) = clean_text("\u{201C}hi\u{201D} \u{2014} it\u{2019}s");
        assert!(changed);
        assert_eq!(out, "\"hi\" - it's");
    }

    #[test]
    fn test_ascii_passes_through() {
        let (out, changed) = clean_text("def f():\n    return 1\n");
        assert!(!changed);
        assert_eq!(out, "def f():\n    return 1\n");
    }

    #[tokio::test]
    async fn test_clean_files_rewrites_only_dirty() {
        let temp = TempDir::new().unwrap();
        let dirty = temp.path().join("dirty.py");
        let clean = temp.path().join("clean.py");
        tokio::fs::write(&dirty, "x = \u{201C}s\u{201D}\n").await.unwrap();
        tokio::fs::write(&clean, "x = 's'\n").await.unwrap();

        let cleaned = clean_files(&[dirty.clone(), clean.clone()]).await.unwrap();

        assert_eq!(cleaned, vec![dirty.clone()]);
        let content = tokio::fs::read_to_string(&dirty).await.unwrap();
        assert_eq!(content, "x = \"s\"\n");
    }

    #[tokio::test]
    async fn test_missing_file_is_skipped() {
        let cleaned = clean_files(&[PathBuf::from("/no/such/file.py")])
            .await
            .unwrap();
        assert!(cleaned.is_empty());
    }
}
