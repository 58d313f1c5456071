//! Scripted adapter replaying recorded fragment sequences.
//!
//! Serves one [`TranscriptCall`] per `stream` invocation, in order. This is
//! the test double for everything downstream of the model boundary and the
//! engine behind offline transcript replay.

use std::collections::VecDeque;
use std::sync::Mutex;

use tokio::sync::mpsc;

use crate::ports::{Fragment, ModelStream, StreamFuture, StreamRequest};
use crate::transcript::{Transcript, TranscriptCall};

/// Replays scripted model calls in sequence.
pub struct ScriptedModel {
    calls: Mutex<VecDeque<TranscriptCall>>,
}

impl ScriptedModel {
    /// Creates a scripted model from an explicit call sequence.
    #[must_use]
    pub fn new(calls: Vec<TranscriptCall>) -> Self {
        Self { calls: Mutex::new(calls.into()) }
    }

    /// Creates a scripted model replaying a recorded transcript.
    #[must_use]
    pub fn from_transcript(transcript: Transcript) -> Self {
        Self::new(transcript.calls)
    }

    /// A call that streams the given fragments and ends cleanly.
    #[must_use]
    pub fn call(fragments: &[&str]) -> TranscriptCall {
        TranscriptCall {
            model: String::new(),
            fragments: fragments.iter().map(ToString::to_string).collect(),
            error: None,
        }
    }

    /// A call that fails outright before producing any fragment.
    #[must_use]
    pub fn failing_call(error: &str) -> TranscriptCall {
        TranscriptCall { model: String::new(), fragments: vec![], error: Some(error.to_string()) }
    }

    /// A call that streams some fragments and then dies mid-stream.
    #[must_use]
    pub fn dying_call(fragments: &[&str], error: &str) -> TranscriptCall {
        TranscriptCall {
            model: String::new(),
            fragments: fragments.iter().map(ToString::to_string).collect(),
            error: Some(error.to_string()),
        }
    }
}

impl ModelStream for ScriptedModel {
    fn stream(&self, _request: &StreamRequest) -> StreamFuture<'_> {
        let next = self.calls.lock().expect("scripted calls lock").pop_front();

        Box::pin(async move {
            let Some(call) = next else {
                return Err("scripted model exhausted: no more calls recorded".into());
            };

            // An error with no fragments models a call that never started
            // streaming; it surfaces as a call-level failure, not a marker.
            if call.fragments.is_empty() {
                if let Some(error) = call.error {
                    return Err(error.into());
                }
            }

            let (sender, receiver) = mpsc::unbounded_channel();
            for fragment in call.fragments {
                let _ = sender.send(Fragment::Text(fragment));
            }
            if let Some(error) = call.error {
                let _ = sender.send(Fragment::Failed(error));
            }
            Ok(receiver)
        })
    }
}
