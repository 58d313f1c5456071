//! `weave generate` command.

use std::io::Write as _;
use std::path::{Path, PathBuf};

use crate::context::ServiceContext;
use crate::orchestrator::{GenerationOutcome, GenerationRequest, JobHandle};
use crate::ports::Fragment;
use crate::prompt::{Architecture, GenerationMode};

/// Execute the `generate` command: stream fragments to stdout live, then
/// write the assembled archive to `out`.
///
/// # Errors
///
/// Returns an error string when the specification cannot be resolved, the
/// job fails, or the archive cannot be written.
pub async fn run(
    ctx: &ServiceContext,
    spec: Option<String>,
    spec_file: Option<PathBuf>,
    mode: GenerationMode,
    architecture: Architecture,
    out: &Path,
    job: Option<String>,
) -> Result<(), String> {
    let specification = resolve_spec(spec, spec_file)?;
    let job_key = job.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let request = GenerationRequest { specification, mode, architecture, source_code: None };
    let orchestrator = ctx.orchestrator();
    let handle = orchestrator.generate(&request, &job_key).map_err(|e| e.to_string())?;

    let outcome = stream_to_stdout(handle).await?;
    write_archive(&outcome, out)
}

/// Forwards live fragments to stdout and waits for the job's result.
///
/// The terminal error marker goes to stderr so partial generated output and
/// the failure notice stay distinguishable.
pub(crate) async fn stream_to_stdout(mut handle: JobHandle) -> Result<GenerationOutcome, String> {
    let mut stdout = std::io::stdout();
    while let Some(fragment) = handle.fragments.recv().await {
        match fragment {
            Fragment::Text(chunk) => {
                let _ = stdout.write_all(chunk.as_bytes());
                let _ = stdout.flush();
            }
            Fragment::Failed(message) => eprintln!("\nstream error: {message}"),
        }
    }
    handle
        .outcome
        .await
        .map_err(|_| "generation task ended unexpectedly".to_string())?
        .map_err(|e| e.to_string())
}

/// Writes the archive and prints the completion summary.
pub(crate) fn write_archive(outcome: &GenerationOutcome, out: &Path) -> Result<(), String> {
    std::fs::write(out, &outcome.archive)
        .map_err(|e| format!("failed to write archive {}: {e}", out.display()))?;

    if outcome.file_count == 0 {
        eprintln!("warning: the model produced no recognizable files; the archive is empty");
    }
    println!(
        "\nArchive written to {} ({} files, {} endpoints)",
        out.display(),
        outcome.file_count,
        outcome.endpoint_count
    );
    Ok(())
}

/// Resolves the specification from inline text or a file.
fn resolve_spec(spec: Option<String>, spec_file: Option<PathBuf>) -> Result<String, String> {
    match (spec, spec_file) {
        (Some(text), _) => Ok(text),
        (None, Some(path)) => std::fs::read_to_string(&path)
            .map_err(|e| format!("failed to read spec file {}: {e}", path.display())),
        (None, None) => Err("provide a specification via --spec or --spec-file".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::resolve_spec;

    #[test]
    fn inline_spec_wins() {
        assert_eq!(resolve_spec(Some("text".into()), None).unwrap(), "text");
    }

    #[test]
    fn missing_both_is_an_error() {
        let err = resolve_spec(None, None).unwrap_err();
        assert!(err.contains("--spec"));
    }

    #[test]
    fn spec_file_is_read_from_disk() {
        let dir = std::env::temp_dir().join("weave_generate_spec_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("spec.md");
        std::fs::write(&path, "a blog system").unwrap();

        assert_eq!(resolve_spec(None, Some(path)).unwrap(), "a blog system");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn unreadable_spec_file_reports_its_path() {
        let err = resolve_spec(None, Some("/nonexistent/spec.md".into())).unwrap_err();
        assert!(err.contains("/nonexistent/spec.md"));
    }
}
