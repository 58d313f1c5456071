//! Live adapter for a locally hosted OpenAI-compatible endpoint
//! (llama.cpp server, Ollama, vLLM and friends).

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::{forward_sse, truncate_provider_error};
use crate::ports::{ModelStream, StreamFuture, StreamRequest};

/// Streams completions from a local `/v1/chat/completions` endpoint.
pub struct LocalModel {
    client: Client,
    base_url: String,
}

impl LocalModel {
    /// Creates an adapter for the given base URL (e.g. `http://127.0.0.1:11434`).
    #[must_use]
    pub fn new(base_url: String) -> Self {
        Self { client: Client::new(), base_url }
    }
}

/// Request body for the chat-completions endpoint.
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
}

/// One chat message in the request.
#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// One SSE chunk of the streamed response.
#[derive(Deserialize)]
struct ChatChunk {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

/// A choice inside a chunk.
#[derive(Deserialize)]
struct ChatChoice {
    #[serde(default)]
    delta: ChatDelta,
}

/// The incremental delta of a choice.
#[derive(Deserialize, Default)]
struct ChatDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Extracts the delta text of one `data:` line, if any.
fn parse_sse_line(line: &str) -> Option<String> {
    let payload = line.strip_prefix("data:")?.trim();
    if payload.is_empty() || payload == "[DONE]" {
        return None;
    }
    let chunk: ChatChunk = serde_json::from_str(payload).ok()?;
    let text: String =
        chunk.choices.into_iter().filter_map(|choice| choice.delta.content).collect();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

impl ModelStream for LocalModel {
    fn stream(&self, request: &StreamRequest) -> StreamFuture<'_> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let client = self.client.clone();
        let model = request.model.clone();
        let prompt = request.prompt.clone();

        Box::pin(async move {
            let body = ChatRequest {
                model: &model,
                messages: vec![ChatMessage { role: "user", content: &prompt }],
                stream: true,
            };

            let response = client.post(&url).json(&body).send().await.map_err(
                |e| -> Box<dyn std::error::Error + Send + Sync> {
                    format!("local model request failed: {e}").into()
                },
            )?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(format!(
                    "local model error ({}): {}",
                    status.as_u16(),
                    truncate_provider_error(&body)
                )
                .into());
            }

            let (sender, receiver) = mpsc::unbounded_channel();
            tokio::spawn(forward_sse(response, sender, parse_sse_line, "local model"));
            Ok(receiver)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::parse_sse_line;

    #[test]
    fn delta_content_is_extracted() {
        let line = r#"data: {"choices":[{"delta":{"content":"chunk"}}]}"#;
        assert_eq!(parse_sse_line(line), Some("chunk".to_string()));
    }

    #[test]
    fn role_only_deltas_yield_nothing() {
        let line = r#"data: {"choices":[{"delta":{"role":"assistant"}}]}"#;
        assert_eq!(parse_sse_line(line), None);
    }

    #[test]
    fn done_marker_terminates_cleanly() {
        assert_eq!(parse_sse_line("data: [DONE]"), None);
    }
}
