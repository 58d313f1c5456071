//! Generation orchestration: one job drives prompt rendering, model
//! streaming, extraction, and archive assembly.
//!
//! Each job runs on its own task and makes one forward-only pass over one
//! model stream — or, for multi-file mode, N+1 sequential streams: one
//! planning stream then one per manifest entry, in manifest order, never in
//! parallel. Every fragment is teed to the job's live channel as it arrives,
//! so a caller can forward output to a client before archiving completes.

pub mod fallback;
pub mod singleflight;

use std::path::Path;
use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::sync::oneshot;

use crate::error::{ArchiveError, GenerateError, PlanParseError};
use crate::pipeline::{self, FileManifestEntry, GeneratedFile, PlanAccumulator};
use crate::ports::{Fragment, FragmentReceiver, ModelStream, StreamRequest};
use crate::prompt::{self, Architecture, ConversionDirection, GenerationMode};

pub use fallback::FallbackChain;
pub use singleflight::{InFlightGuard, InFlightRegistry};

/// An immutable request for one generation job.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Free-text specification (or source dump) to generate from.
    pub specification: String,
    /// What kind of project to produce.
    pub mode: GenerationMode,
    /// Backend architecture selector.
    pub architecture: Architecture,
    /// Counterpart source for conversion-style requests.
    pub source_code: Option<String>,
}

/// Completed result of one generation job.
#[derive(Debug)]
pub struct GenerationOutcome {
    /// The assembled `.tar.gz` bytes.
    pub archive: Vec<u8>,
    /// Number of file entries written to the archive.
    pub file_count: usize,
    /// Number of endpoint records derived from the files.
    pub endpoint_count: usize,
}

/// Live handle to a running job: the fragment feed plus the eventual archive.
///
/// Cancellation is cooperative: dropping the handle stops fragment delivery
/// and discards the eventual result; the job itself runs to completion and
/// releases its key.
#[derive(Debug)]
pub struct JobHandle {
    /// Every fragment of every stream the job consumes, in arrival order.
    pub fragments: FragmentReceiver,
    /// Resolves once the job reaches its terminal state.
    pub outcome: oneshot::Receiver<Result<GenerationOutcome, GenerateError>>,
}

impl JobHandle {
    /// Drains remaining live fragments and waits for the final result.
    ///
    /// # Errors
    ///
    /// Returns the job's failure, or [`GenerateError::TaskEnded`] when the
    /// job task died without reporting one.
    pub async fn finish(mut self) -> Result<GenerationOutcome, GenerateError> {
        while self.fragments.recv().await.is_some() {}
        self.outcome.await.map_err(|_| GenerateError::TaskEnded)?
    }
}

/// Job progress states, logged on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JobState {
    Planning,
    PerFileGeneration,
    Streaming,
    Archiving,
    Done,
    Failed,
}

/// Logs a state transition for one job.
fn transition(key: &str, state: JobState) {
    log::debug!("job {key}: state -> {state:?}");
}

/// Sequences generation jobs over a model stream.
pub struct Orchestrator {
    model: Arc<dyn ModelStream>,
    preferred_model: String,
    inflight: InFlightRegistry,
}

impl Orchestrator {
    /// Creates an orchestrator over the given model adapter.
    ///
    /// `model` is typically a [`FallbackChain`]; `preferred_model` is the
    /// identifier placed on every stream request.
    #[must_use]
    pub fn new(model: Arc<dyn ModelStream>, preferred_model: String) -> Self {
        Self { model, preferred_model, inflight: InFlightRegistry::new() }
    }

    /// Starts a generation job for `request` under `job_key`.
    ///
    /// # Errors
    ///
    /// Fails immediately with [`GenerateError::JobInProgress`] when a job for
    /// the same key is live, or with a template error when the mode's prompt
    /// cannot be rendered. Later failures arrive through the handle.
    pub fn generate(
        &self,
        request: &GenerationRequest,
        job_key: &str,
    ) -> Result<JobHandle, GenerateError> {
        let guard = self
            .inflight
            .acquire(job_key)
            .ok_or_else(|| GenerateError::JobInProgress(job_key.to_string()))?;
        let plan = JobPlan::from_request(request)?;
        Ok(self.spawn(plan, guard, job_key))
    }

    /// Starts a conversion job deriving one side of a project from the other.
    ///
    /// # Errors
    ///
    /// As [`Orchestrator::generate`]; additionally fails when the request
    /// carries no `source_code`, since conversion templates require the
    /// counterpart source.
    pub fn convert(
        &self,
        direction: ConversionDirection,
        request: &GenerationRequest,
        job_key: &str,
    ) -> Result<JobHandle, GenerateError> {
        let guard = self
            .inflight
            .acquire(job_key)
            .ok_or_else(|| GenerateError::JobInProgress(job_key.to_string()))?;
        let plan =
            JobPlan::conversion(direction, &request.specification, request.source_code.as_deref())?;
        Ok(self.spawn(plan, guard, job_key))
    }

    /// Spawns the job task; the in-flight guard rides along so the slot is
    /// released whenever the task exits.
    fn spawn(&self, plan: JobPlan, guard: InFlightGuard, job_key: &str) -> JobHandle {
        let (live_sender, live_receiver) = mpsc::unbounded_channel();
        let (done_sender, done_receiver) = oneshot::channel();
        let model = Arc::clone(&self.model);
        let preferred = self.preferred_model.clone();
        let key = job_key.to_string();

        tokio::spawn(async move {
            let result = run_job(model.as_ref(), &preferred, plan, &key, &live_sender).await;
            match &result {
                Ok(outcome) => {
                    transition(&key, JobState::Done);
                    log::info!(
                        "job {key}: archived {} files, {} endpoints",
                        outcome.file_count,
                        outcome.endpoint_count
                    );
                }
                Err(err) => {
                    transition(&key, JobState::Failed);
                    log::error!("job {key}: {err}");
                }
            }
            // Free the job key before the outcome resolves, so a caller that
            // awaited the result can resubmit immediately. The guard also
            // drops on panic unwind, which is what keeps a wedged key from
            // ever blocking later submissions.
            drop(guard);
            let _ = done_sender.send(result);
        });

        JobHandle { fragments: live_receiver, outcome: done_receiver }
    }
}

/// Resolved shape of one job, with prompts rendered up front so template
/// errors fail the call, not the task.
enum JobPlan {
    /// One stream, extract fenced blocks from the whole response.
    SingleShot { prompt: String },
    /// One planning stream; the manifest itself is the deliverable.
    Planning { prompt: String },
    /// Planning stream then one stream per manifest entry.
    MultiFile {
        planning_prompt: String,
        per_file_context: String,
        fallback_manifest: Option<Vec<FileManifestEntry>>,
    },
}

impl JobPlan {
    /// Maps a generation request onto a job shape.
    fn from_request(request: &GenerationRequest) -> Result<Self, GenerateError> {
        let prompt =
            prompt::render_generation(request.mode, request.architecture, &request.specification)?;
        match (request.mode, request.architecture) {
            (GenerationMode::Planning, _) => Ok(JobPlan::Planning { prompt }),
            (GenerationMode::Backend, Architecture::Microservices) => Ok(JobPlan::MultiFile {
                planning_prompt: prompt,
                per_file_context: request.specification.clone(),
                // No default plan here: fabricating file names diverges from
                // the model's intent, so plan failure is fatal.
                fallback_manifest: None,
            }),
            _ => Ok(JobPlan::SingleShot { prompt }),
        }
    }

    /// Builds the multi-file shape for a conversion job.
    fn conversion(
        direction: ConversionDirection,
        specification: &str,
        source: Option<&str>,
    ) -> Result<Self, GenerateError> {
        let planning_prompt = prompt::render_conversion_plan(direction, specification, source)?;
        let source = source.unwrap_or_default();
        Ok(JobPlan::MultiFile {
            planning_prompt,
            per_file_context: format!("{specification}\n\nCounterpart source:\n{source}"),
            fallback_manifest: Some(conversion_fallback_manifest(direction)),
        })
    }
}

/// Fixed manifest substituted when conversion planning fails.
///
/// A deliberate product decision for the conversion workflow only: a skeletal
/// project beats a dead job when the counterpart source is available to fill
/// it in. Generation jobs never get this.
fn conversion_fallback_manifest(direction: ConversionDirection) -> Vec<FileManifestEntry> {
    let entries: &[(&str, &str)] = match direction {
        ConversionDirection::FrontendToBackend => &[
            ("package.json", "backend package manifest"),
            ("src/server.js", "Express entry point"),
            ("src/routes/api.js", "routes serving the frontend's API calls"),
        ],
        ConversionDirection::BackendToFrontend => &[
            ("package.json", "frontend package manifest"),
            ("index.html", "Vite HTML shell"),
            ("src/main.jsx", "frontend entry point"),
            ("src/App.jsx", "root component covering the backend's routes"),
        ],
    };
    entries
        .iter()
        .map(|(path, description)| FileManifestEntry {
            path: (*path).to_string(),
            description: (*description).to_string(),
        })
        .collect()
}

/// Drives one job to its terminal state.
async fn run_job(
    model: &dyn ModelStream,
    preferred: &str,
    plan: JobPlan,
    key: &str,
    live: &UnboundedSender<Fragment>,
) -> Result<GenerationOutcome, GenerateError> {
    match plan {
        JobPlan::SingleShot { prompt } => {
            transition(key, JobState::Streaming);
            let text = collect_stream(model, preferred, &prompt, live)
                .await
                .map_err(GenerateError::Stream)?;
            assemble(key, &pipeline::extract_files(&text))
        }
        JobPlan::Planning { prompt } => {
            transition(key, JobState::Planning);
            let manifest = stream_plan(model, preferred, &prompt, live).await?;
            transition(key, JobState::Archiving);
            let content =
                serde_json::to_string_pretty(&manifest).map_err(ArchiveError::Metadata)?;
            let files = vec![GeneratedFile { path: "plan.json".into(), content }];
            let archive = pipeline::build_archive(&files, &[])?;
            Ok(GenerationOutcome { archive, file_count: files.len(), endpoint_count: 0 })
        }
        JobPlan::MultiFile { planning_prompt, per_file_context, fallback_manifest } => {
            transition(key, JobState::Planning);
            let manifest = match stream_plan(model, preferred, &planning_prompt, live).await {
                Ok(manifest) => manifest,
                Err(err) => match fallback_manifest {
                    Some(manifest) => {
                        log::warn!(
                            "job {key}: plan parsing failed ({err}); using the fixed conversion manifest"
                        );
                        manifest
                    }
                    None => return Err(err.into()),
                },
            };

            let mut text = String::new();
            for entry in &manifest {
                transition(key, JobState::PerFileGeneration);
                let prompt = prompt::render_per_file(&per_file_context, entry, &manifest)?;
                let content = match collect_stream(model, preferred, &prompt, live).await {
                    Ok(output) => per_file_content(&output, &entry.path),
                    Err(message) => {
                        // One failed file must not discard the rest of an
                        // otherwise-successful generation.
                        log::warn!("job {key}: generation for {} failed: {message}", entry.path);
                        format!("// generation failed for {}: {message}", entry.path)
                    }
                };
                text.push_str(&wrap_file_block(&entry.path, &content));
            }

            assemble(key, &pipeline::extract_files(&text))
        }
    }
}

/// Streams one call to completion, teeing fragments live.
///
/// Returns the concatenated text, or the failure message when the stream's
/// terminal error marker arrives.
async fn collect_stream(
    model: &dyn ModelStream,
    model_id: &str,
    prompt: &str,
    live: &UnboundedSender<Fragment>,
) -> Result<String, String> {
    let request = StreamRequest { model: model_id.to_string(), prompt: prompt.to_string() };
    let mut receiver = model.stream(&request).await.map_err(|e| e.to_string())?;

    let mut text = String::new();
    while let Some(fragment) = receiver.recv().await {
        let _ = live.send(fragment.clone());
        match fragment {
            Fragment::Text(chunk) => text.push_str(&chunk),
            Fragment::Failed(message) => return Err(message),
        }
    }
    Ok(text)
}

/// Streams a planning call until the manifest parses, teeing fragments live.
///
/// Stops consuming for planning purposes as soon as a manifest is returned;
/// the rest of the planning stream is discarded.
async fn stream_plan(
    model: &dyn ModelStream,
    model_id: &str,
    prompt: &str,
    live: &UnboundedSender<Fragment>,
) -> Result<Vec<FileManifestEntry>, PlanParseError> {
    let request = StreamRequest { model: model_id.to_string(), prompt: prompt.to_string() };
    let mut receiver = model
        .stream(&request)
        .await
        .map_err(|e| PlanParseError::StreamFailed(e.to_string()))?;

    let mut accumulator = PlanAccumulator::new();
    while let Some(fragment) = receiver.recv().await {
        let _ = live.send(fragment.clone());
        match fragment {
            Fragment::Text(chunk) => {
                if let Some(manifest) = accumulator.push(&chunk) {
                    return Ok(manifest);
                }
            }
            Fragment::Failed(message) => return Err(PlanParseError::StreamFailed(message)),
        }
    }
    Err(PlanParseError::StreamExhausted)
}

/// Derives the endpoint map and bundles everything into the archive.
fn assemble(key: &str, files: &[GeneratedFile]) -> Result<GenerationOutcome, GenerateError> {
    transition(key, JobState::Archiving);
    if files.is_empty() {
        // Expected degenerate case when the model ignored the fencing
        // instruction; a warning, not a failure.
        log::warn!("job {key}: zero files extracted from model output");
    }
    let endpoints = pipeline::build_endpoint_map(files);
    let archive = pipeline::build_archive(files, &endpoints)?;
    Ok(GenerationOutcome {
        archive,
        file_count: files.len(),
        endpoint_count: endpoints.len(),
    })
}

/// Normalizes one per-file response to bare file content.
///
/// Prefers a fenced block tagged with the expected path, then a lone tagged
/// block under any path, then the response with a plain outer fence removed.
fn per_file_content(output: &str, path: &str) -> String {
    let mut extracted = pipeline::extract_files(output);
    if let Some(index) = extracted.iter().position(|file| file.path == path) {
        return extracted.swap_remove(index).content;
    }
    if extracted.len() == 1 {
        return extracted.remove(0).content;
    }
    strip_outer_fence(output).trim().to_string()
}

/// Removes one surrounding plain fence pair, when present.
fn strip_outer_fence(text: &str) -> &str {
    let trimmed = text.trim();
    if let Some(rest) = trimmed.strip_prefix("```") {
        if let Some(newline) = rest.find('\n') {
            if let Some(body) = rest[newline + 1..].trim_end().strip_suffix("```") {
                return body;
            }
        }
    }
    trimmed
}

/// Wraps content in the canonical fenced block the extractor recognizes.
fn wrap_file_block(path: &str, content: &str) -> String {
    format!("```{} filename:{path}\n{content}\n```\n\n", language_tag(path))
}

/// Picks a fence language tag from the file extension.
fn language_tag(path: &str) -> &'static str {
    match Path::new(path).extension().and_then(|ext| ext.to_str()) {
        Some("js" | "jsx" | "mjs") => "javascript",
        Some("ts" | "tsx") => "typescript",
        Some("json") => "json",
        Some("html") => "html",
        Some("css") => "css",
        Some("md") => "markdown",
        Some("yml" | "yaml") => "yaml",
        _ => "text",
    }
}
