//! Best-effort parsing of formatter output
//!
//! Formatter tools report violations as free text, not a structured
//! protocol. A line counts as evidence of a changed or violating file when
//! it contains one of the marker substrings below; the first
//! whitespace-delimited token that looks like a path is taken as the file
//! path.
//!
//! Known fragility: these markers track the current output of the upstream
//! tools and will silently stop matching if that output changes. Callers
//! must tolerate empty results.

use std::path::PathBuf;

/// Marker substrings that flag a line as referring to a changed file
///
/// - `"would be reformatted"` / `"reformatted"`: check and write mode
/// - `"Fixing"`: import-sorter write mode
const CHANGE_MARKERS: &[&str] = &["would be reformatted", "reformatted", "Fixing"];

/// Diff header prefixes emitted by `--diff` modes
const DIFF_PREFIXES: &[&str] = &["--- ", "+++ "];

/// Tokens that are markers themselves and never paths
const NON_PATH_TOKENS: &[&str] = &["---", "+++", "reformatted", "would", "be", "Fixing"];

fn is_marker_line(line: &str) -> bool {
    CHANGE_MARKERS.iter().any(|m| line.contains(m))
        || DIFF_PREFIXES.iter().any(|p| line.starts_with(p))
}

/// Extract the path token from a marker line, if any
///
/// The path is the first whitespace-delimited token that is not itself a
/// marker word and looks path-like (contains a separator or an extension).
fn extract_path(line: &str) -> Option<&str> {
    line.split_whitespace()
        .map(|t| t.trim_end_matches([',', '.']))
        // isort diff headers label the path as `<path>:before` / `<path>:after`
        .map(|t| t.trim_end_matches(":before").trim_end_matches(":after"))
        .filter(|t| !NON_PATH_TOKENS.contains(t))
        .find(|t| t.contains('/') || t.contains('.'))
}

/// Collect changed/violating file paths from formatter output
///
/// Scans both stdout and stderr style text; deduplicates while preserving
/// first-seen order.
pub fn changed_files(output: &str) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = Vec::new();

    for line in output.lines() {
        if !is_marker_line(line) {
            continue;
        }
        if let Some(token) = extract_path(line) {
            let path = PathBuf::from(token);
            if !files.contains(&path) {
                files.push(path);
            }
        }
    }

    files
}

/// Collect error lines from formatter stderr
///
/// Lines mentioning "error" (case-insensitive) are captured verbatim.
pub fn error_lines(stderr: &str) -> Vec<String> {
    stderr
        .lines()
        .filter(|line| line.to_ascii_lowercase().contains("error"))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_black_check_output() {
        let output = "would reformat src/app.py\n\
                      src/util.py would be reformatted\n\
                      All done!\n\
                      1 file would be reformatted, 3 files would be left unchanged.";

        let files = changed_files(output);
        assert!(files.contains(&PathBuf::from("src/util.py")));
    }

    #[test]
    fn test_black_write_output() {
        let output = "reformatted src/app.py\nAll done!";
        assert_eq!(changed_files(output), vec![PathBuf::from("src/app.py")]);
    }

    #[test]
    fn test_isort_fixing_output() {
        let output = "Fixing /repo/src/models.py\nFixing /repo/src/views.py";
        assert_eq!(
            changed_files(output),
            vec![
                PathBuf::from("/repo/src/models.py"),
                PathBuf::from("/repo/src/views.py")
            ]
        );
    }

    #[test]
    fn test_diff_headers() {
        let output = "--- /repo/a.py:before\t2024-01-01\n+++ /repo/a.py:after\t2024-01-01\n-import os";
        let files = changed_files(output);
        assert_eq!(files.len(), 1);
        assert!(files[0].to_string_lossy().contains("a.py"));
    }

    #[test]
    fn test_clean_output_yields_nothing() {
        let output = "All done!\n5 files left unchanged.";
        assert!(changed_files(output).is_empty());
    }

    #[test]
    fn test_parsing_is_idempotent_on_clean_output() {
        // A formatted file produces no markers; a second check produces the
        // same empty result.
        let output = "All done!\n1 file left unchanged.";
        assert!(changed_files(output).is_empty());
        assert!(changed_files(output).is_empty());
    }

    #[test]
    fn test_summary_line_yields_no_path() {
        let output = "1 file would be reformatted, 3 files would be left unchanged.";
        assert!(changed_files(output).is_empty());
    }

    #[test]
    fn test_dedupes_repeated_files() {
        let output = "reformatted x.py\nreformatted x.py";
        assert_eq!(changed_files(output).len(), 1);
    }

    #[test]
    fn test_error_lines() {
        let stderr = "error: cannot format bad.py: Cannot parse\nAll done!";
        let errors = error_lines(stderr);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("Cannot parse"));
    }
}
