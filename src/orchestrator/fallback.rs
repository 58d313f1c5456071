//! Ordered model fallback chain.
//!
//! Wraps an inner [`ModelStream`] with an ordered list of model identifiers.
//! Each call tries the preferred model first; a model that fails to start,
//! ends with zero fragments, or dies before producing any text advances the
//! chain to the next identifier. Once a model has produced one text fragment
//! the chain is committed to it. Exhausting the chain yields exactly one
//! terminal [`Fragment::Failed`] marker and a clean end-of-stream — the chain
//! itself never raises.

use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedSender};

use crate::adapters::truncate_provider_error;
use crate::ports::{Fragment, ModelStream, StreamFuture, StreamRequest};

/// A [`ModelStream`] that retries across an ordered model list.
pub struct FallbackChain {
    inner: Arc<dyn ModelStream>,
    models: Vec<String>,
}

impl FallbackChain {
    /// Builds a chain trying `preferred` first, then each fallback in order.
    ///
    /// Duplicates of the preferred model in the fallback list are dropped so
    /// a failing model is not retried twice in one call.
    #[must_use]
    pub fn new(inner: Arc<dyn ModelStream>, preferred: String, fallbacks: &[String]) -> Self {
        let mut models = vec![preferred];
        for fallback in fallbacks {
            if !models.contains(fallback) {
                models.push(fallback.clone());
            }
        }
        Self { inner, models }
    }

    /// The model identifiers in the order they will be tried.
    #[must_use]
    pub fn models(&self) -> &[String] {
        &self.models
    }
}

impl ModelStream for FallbackChain {
    fn stream(&self, request: &StreamRequest) -> StreamFuture<'_> {
        // The caller's requested model leads; the configured chain follows.
        let mut models = vec![request.model.clone()];
        for model in &self.models {
            if !models.contains(model) {
                models.push(model.clone());
            }
        }
        let inner = Arc::clone(&self.inner);
        let prompt = request.prompt.clone();

        Box::pin(async move {
            let (sender, receiver) = mpsc::unbounded_channel();
            tokio::spawn(run_chain(inner, models, prompt, sender));
            Ok(receiver)
        })
    }
}

/// Walks the model list until one commits or the list is exhausted.
async fn run_chain(
    inner: Arc<dyn ModelStream>,
    models: Vec<String>,
    prompt: String,
    sender: UnboundedSender<Fragment>,
) {
    let mut last_error = String::from("no models configured");

    for model in &models {
        let request = StreamRequest { model: model.clone(), prompt: prompt.clone() };
        let mut source = match inner.stream(&request).await {
            Ok(receiver) => receiver,
            Err(err) => {
                last_error = truncate_provider_error(&err.to_string());
                log::warn!("model {model} failed to start, trying next in chain: {last_error}");
                continue;
            }
        };

        match source.recv().await {
            None => {
                last_error = format!("model {model} produced no output");
                log::warn!("{last_error}; trying next in chain");
            }
            Some(Fragment::Failed(message)) => {
                last_error = message;
                log::warn!("model {model} failed before producing output: {last_error}");
            }
            Some(first @ Fragment::Text(_)) => {
                // Committed: forward this model's stream to the end,
                // including any mid-stream failure marker.
                if sender.send(first).is_err() {
                    return;
                }
                while let Some(fragment) = source.recv().await {
                    if sender.send(fragment).is_err() {
                        return;
                    }
                }
                return;
            }
        }
    }

    let _ = sender.send(Fragment::Failed(format!(
        "all models in the fallback chain failed; last error: {last_error}"
    )));
}
