//! Recording wrapper that tees model calls into a transcript.
//!
//! Wraps any [`ModelStream`] and records each call's model, fragments, and
//! terminal error while forwarding everything unchanged. The accumulated
//! transcript is taken with [`RecordingModel::finish`] once the run is done.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use tokio::sync::mpsc;

use crate::ports::{Fragment, ModelStream, StreamFuture, StreamRequest};
use crate::transcript::{Transcript, TranscriptCall};

/// Tees calls through to an inner adapter while recording them.
pub struct RecordingModel {
    inner: Arc<dyn ModelStream>,
    calls: Arc<Mutex<Vec<TranscriptCall>>>,
}

impl RecordingModel {
    /// Wraps `inner`, recording every call made through this adapter.
    #[must_use]
    pub fn new(inner: Arc<dyn ModelStream>) -> Self {
        Self { inner, calls: Arc::new(Mutex::new(Vec::new())) }
    }

    /// Takes the recorded calls as a named transcript.
    ///
    /// Calls still in flight when this is taken are not included.
    #[must_use]
    pub fn finish(&self, name: &str) -> Transcript {
        let calls = std::mem::take(&mut *self.calls.lock().expect("recorded calls lock"));
        Transcript { name: name.to_string(), recorded_at: Utc::now(), calls }
    }
}

impl ModelStream for RecordingModel {
    fn stream(&self, request: &StreamRequest) -> StreamFuture<'_> {
        let inner = Arc::clone(&self.inner);
        let calls = Arc::clone(&self.calls);
        let request = request.clone();

        Box::pin(async move {
            let mut source = match inner.stream(&request).await {
                Ok(receiver) => receiver,
                Err(err) => {
                    calls.lock().expect("recorded calls lock").push(TranscriptCall {
                        model: request.model.clone(),
                        fragments: vec![],
                        error: Some(err.to_string()),
                    });
                    return Err(err);
                }
            };

            let (sender, receiver) = mpsc::unbounded_channel();
            tokio::spawn(async move {
                let mut fragments = Vec::new();
                let mut error = None;
                while let Some(fragment) = source.recv().await {
                    match &fragment {
                        Fragment::Text(text) => fragments.push(text.clone()),
                        Fragment::Failed(message) => error = Some(message.clone()),
                    }
                    if sender.send(fragment).is_err() {
                        break;
                    }
                }
                calls.lock().expect("recorded calls lock").push(TranscriptCall {
                    model: request.model,
                    fragments,
                    error,
                });
            });
            Ok(receiver)
        })
    }
}
