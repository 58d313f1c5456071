//! Adapter implementations of the model stream port.
//!
//! Live adapters speak to Gemini or a locally hosted OpenAI-compatible
//! endpoint; the scripted adapter replays transcripts for offline runs and
//! tests; the recording adapter tees live calls into a transcript.

pub mod gemini;
pub mod local;
pub mod recording;
pub mod scripted;

use futures::StreamExt;
use tokio::sync::mpsc::UnboundedSender;

use crate::ports::Fragment;

/// Bound on provider diagnostics embedded in errors and stream markers, so
/// an over-long provider error body never dominates what a caller sees.
const MAX_PROVIDER_ERROR_LEN: usize = 500;

/// Truncates a provider message to [`MAX_PROVIDER_ERROR_LEN`] bytes,
/// respecting char boundaries.
pub(crate) fn truncate_provider_error(message: &str) -> String {
    if message.len() <= MAX_PROVIDER_ERROR_LEN {
        return message.to_string();
    }
    let mut end = MAX_PROVIDER_ERROR_LEN;
    while !message.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &message[..end])
}

/// Forwards an SSE response body line by line into a fragment channel.
///
/// `parse_line` turns one complete line into fragment text (or `None` for
/// keep-alives, `[DONE]` markers, and unparsable lines). A transport error
/// mid-stream becomes a terminal [`Fragment::Failed`] marker. A dropped
/// receiver stops forwarding silently; that is the cancellation path.
pub(crate) async fn forward_sse(
    response: reqwest::Response,
    sender: UnboundedSender<Fragment>,
    parse_line: fn(&str) -> Option<String>,
    provider: &'static str,
) {
    let mut stream = response.bytes_stream();
    let mut buffer = String::new();

    while let Some(chunk) = stream.next().await {
        match chunk {
            Ok(bytes) => {
                buffer.push_str(&String::from_utf8_lossy(&bytes));
                while let Some(newline) = buffer.find('\n') {
                    let line: String = buffer.drain(..=newline).collect();
                    if let Some(text) = parse_line(line.trim()) {
                        if !text.is_empty() && sender.send(Fragment::Text(text)).is_err() {
                            return;
                        }
                    }
                }
            }
            Err(err) => {
                let message = truncate_provider_error(&format!("{provider} stream error: {err}"));
                let _ = sender.send(Fragment::Failed(message));
                return;
            }
        }
    }

    // Trailing line without a newline terminator.
    if let Some(text) = parse_line(buffer.trim()) {
        if !text.is_empty() {
            let _ = sender.send(Fragment::Text(text));
        }
    }
}
