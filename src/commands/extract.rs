//! `weave extract` command: the buffered, non-streaming path.

use std::path::Path;

use crate::pipeline::{build_archive, build_endpoint_map, extract_files};

/// Execute the `extract` command: pull fenced file blocks out of a saved
/// model response and bundle them into an archive.
///
/// # Errors
///
/// Returns an error string when the input cannot be read or the archive
/// cannot be built or written.
pub fn run(input: &Path, out: &Path) -> Result<(), String> {
    let text = std::fs::read_to_string(input)
        .map_err(|e| format!("failed to read {}: {e}", input.display()))?;

    let files = extract_files(&text);
    if files.is_empty() {
        eprintln!(
            "warning: no filename-tagged fenced blocks found in {}; the archive is empty",
            input.display()
        );
    }

    let endpoints = build_endpoint_map(&files);
    let archive = build_archive(&files, &endpoints).map_err(|e| e.to_string())?;

    std::fs::write(out, archive)
        .map_err(|e| format!("failed to write archive {}: {e}", out.display()))?;
    println!(
        "Archive written to {} ({} files, {} endpoints)",
        out.display(),
        files.len(),
        endpoints.len()
    );
    Ok(())
}
