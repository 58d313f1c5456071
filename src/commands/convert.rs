//! `weave convert` command.

use std::path::Path;

use crate::commands::generate::{stream_to_stdout, write_archive};
use crate::context::ServiceContext;
use crate::orchestrator::GenerationRequest;
use crate::prompt::{Architecture, ConversionDirection, GenerationMode};

/// Execute the `convert` command: derive one side of a project from the
/// other, streaming output live and writing the archive to `out`.
///
/// # Errors
///
/// Returns an error string when the source cannot be read, the job fails,
/// or the archive cannot be written.
pub async fn run(
    ctx: &ServiceContext,
    direction: ConversionDirection,
    source: &Path,
    spec: &str,
    out: &Path,
    job: Option<String>,
) -> Result<(), String> {
    let source_code = std::fs::read_to_string(source)
        .map_err(|e| format!("failed to read source file {}: {e}", source.display()))?;
    let job_key = job.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let specification = if spec.is_empty() { default_spec(direction) } else { spec.to_string() };
    let request = GenerationRequest {
        specification,
        mode: target_mode(direction),
        architecture: Architecture::Monolith,
        source_code: Some(source_code),
    };

    let orchestrator = ctx.orchestrator();
    let handle =
        orchestrator.convert(direction, &request, &job_key).map_err(|e| e.to_string())?;

    let outcome = stream_to_stdout(handle).await?;
    write_archive(&outcome, out)
}

/// The side of the project a conversion produces.
fn target_mode(direction: ConversionDirection) -> GenerationMode {
    match direction {
        ConversionDirection::FrontendToBackend => GenerationMode::Backend,
        ConversionDirection::BackendToFrontend => GenerationMode::Frontend,
    }
}

/// Instructions used when the caller supplies none.
fn default_spec(direction: ConversionDirection) -> String {
    match direction {
        ConversionDirection::FrontendToBackend => {
            "Build the backend this frontend expects, covering every API call it makes."
        }
        ConversionDirection::BackendToFrontend => {
            "Build a frontend that exercises every route this backend exposes."
        }
    }
    .to_string()
}
