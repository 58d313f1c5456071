//! Fenced code-block extraction over complete accumulated text.
//!
//! Extraction is deliberately not incremental: fence boundaries are not
//! guaranteed to be flush with fragment boundaries, so the scan runs once
//! over the whole text after the stream ends.

use crate::pipeline::GeneratedFile;

/// Marker on a fence-open line that tags the block with its target path,
/// e.g. ` ```typescript filename:src/server.ts `.
const FILENAME_MARKER: &str = "filename:";

/// Scanner state while walking the text line by line.
enum State {
    /// Between blocks.
    Outside,
    /// Inside a block tagged with a file path.
    InFile { path: String, lines: Vec<String> },
    /// Inside a fenced block with no filename tag; contents are skipped.
    InPlain,
}

/// Extracts all `filename:`-tagged fenced blocks as `(path, content)` pairs.
///
/// Untagged fenced blocks are skipped. Text with no matching fences yields an
/// empty vec — the expected degenerate case when the model ignores the
/// fencing instruction, surfaced by callers as "zero files produced", not an
/// error. A block left unterminated at end of text is flushed with the
/// content accumulated so far.
#[must_use]
pub fn extract_files(text: &str) -> Vec<GeneratedFile> {
    let mut files = Vec::new();
    let mut state = State::Outside;

    for line in text.lines() {
        let trimmed = line.trim_start();
        state = match state {
            State::Outside => {
                if is_fence(trimmed) {
                    match fence_filename(trimmed) {
                        Some(path) => State::InFile { path, lines: Vec::new() },
                        None => State::InPlain,
                    }
                } else {
                    State::Outside
                }
            }
            State::InFile { path, mut lines } => {
                if is_fence(trimmed) {
                    files.push(finish_block(path, &lines));
                    // A fence line carrying its own filename both closes the
                    // previous block and opens the next one; models sometimes
                    // omit the bare closing fence between adjacent files.
                    match fence_filename(trimmed) {
                        Some(next) => State::InFile { path: next, lines: Vec::new() },
                        None => State::Outside,
                    }
                } else {
                    lines.push(line.to_string());
                    State::InFile { path, lines }
                }
            }
            State::InPlain => {
                if is_fence(trimmed) {
                    match fence_filename(trimmed) {
                        Some(path) => State::InFile { path, lines: Vec::new() },
                        None => State::Outside,
                    }
                } else {
                    State::InPlain
                }
            }
        };
    }

    if let State::InFile { path, lines } = state {
        files.push(finish_block(path, &lines));
    }

    files
}

/// Returns `true` for a Markdown fence delimiter line.
fn is_fence(trimmed_line: &str) -> bool {
    trimmed_line.starts_with("```")
}

/// Pulls the `filename:` path out of a fence-open line, trimmed.
fn fence_filename(trimmed_line: &str) -> Option<String> {
    let marker = trimmed_line.find(FILENAME_MARKER)?;
    let path = trimmed_line[marker + FILENAME_MARKER.len()..].trim();
    if path.is_empty() {
        None
    } else {
        Some(path.to_string())
    }
}

/// Builds the file record for a closed block, trimming the content.
fn finish_block(path: String, lines: &[String]) -> GeneratedFile {
    GeneratedFile { path, content: lines.join("\n").trim().to_string() }
}
