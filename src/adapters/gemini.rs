//! Live adapter for the Gemini streaming API.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::{forward_sse, truncate_provider_error};
use crate::ports::{ModelStream, StreamFuture, StreamRequest};

/// Default Gemini API host.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Streams completions from the Gemini `streamGenerateContent` endpoint.
pub struct GeminiModel {
    client: Client,
    base_url: String,
    api_key: String,
}

impl GeminiModel {
    /// Creates a Gemini adapter against the given host (or the default).
    #[must_use]
    pub fn new(api_key: String, base_url: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key,
        }
    }
}

/// Request body for `streamGenerateContent`.
#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

/// A single content turn in the request.
#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

/// One text part of a content turn.
#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

/// One SSE chunk of the streamed response.
#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

/// A candidate completion inside a chunk.
#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

/// Content of a candidate.
#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

/// One text part of candidate content.
#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

/// Extracts the text payload of one `data:` line, if any.
fn parse_sse_line(line: &str) -> Option<String> {
    let payload = line.strip_prefix("data:")?.trim();
    if payload.is_empty() || payload == "[DONE]" {
        return None;
    }
    let chunk: StreamChunk = serde_json::from_str(payload).ok()?;
    let text: String = chunk
        .candidates
        .into_iter()
        .filter_map(|candidate| candidate.content)
        .flat_map(|content| content.parts)
        .map(|part| part.text)
        .collect();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

impl ModelStream for GeminiModel {
    fn stream(&self, request: &StreamRequest) -> StreamFuture<'_> {
        let url = format!(
            "{}/v1beta/models/{}:streamGenerateContent?alt=sse",
            self.base_url, request.model
        );
        let client = self.client.clone();
        let api_key = self.api_key.clone();
        let prompt = request.prompt.clone();

        Box::pin(async move {
            let body =
                GenerateRequest { contents: vec![Content { parts: vec![Part { text: &prompt }] }] };

            let response = client
                .post(&url)
                .header("x-goog-api-key", &api_key)
                .json(&body)
                .send()
                .await
                .map_err(|e| -> Box<dyn std::error::Error + Send + Sync> {
                    format!("Gemini request failed: {e}").into()
                })?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(format!(
                    "Gemini API error ({}): {}",
                    status.as_u16(),
                    truncate_provider_error(&body)
                )
                .into());
            }

            let (sender, receiver) = mpsc::unbounded_channel();
            tokio::spawn(forward_sse(response, sender, parse_sse_line, "Gemini"));
            Ok(receiver)
        })
    }
}
