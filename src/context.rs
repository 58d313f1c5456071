//! Service context wiring the model port to its adapters.
//!
//! Constructors select an adapter stack: `live` talks to Gemini or a local
//! endpoint behind the configured fallback chain, `recording` additionally
//! tees every call into a transcript, and `replaying` serves a recorded
//! transcript with no network at all.

use std::path::Path;
use std::sync::Arc;

use crate::adapters::gemini::GeminiModel;
use crate::adapters::local::LocalModel;
use crate::adapters::recording::RecordingModel;
use crate::adapters::scripted::ScriptedModel;
use crate::config::Config;
use crate::orchestrator::{FallbackChain, Orchestrator};
use crate::ports::ModelStream;
use crate::transcript::Transcript;

/// Bundles the configured model adapter with the runtime configuration.
pub struct ServiceContext {
    /// The model stream every generation call goes through.
    pub model: Arc<dyn ModelStream>,
    /// Resolved runtime configuration.
    pub config: Config,
    /// Present when this context records calls for later replay.
    recorder: Option<Arc<RecordingModel>>,
}

// `dyn ModelStream` is not `Debug`, so `ServiceContext` cannot derive it; this
// manual impl reports the non-trait-object fields and whether a recorder is set.
impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("config", &self.config)
            .field("recording", &self.recorder.is_some())
            .finish()
    }
}

impl ServiceContext {
    /// Creates a live context: Gemini when an API key is configured,
    /// otherwise the local endpoint, wrapped in the fallback chain.
    ///
    /// # Errors
    ///
    /// Returns an error string when neither backend is configured.
    pub fn live(config: Config) -> Result<Self, String> {
        let base: Arc<dyn ModelStream> = if let Some(key) = &config.gemini_api_key {
            Arc::new(GeminiModel::new(key.clone(), config.gemini_base_url.clone()))
        } else if let Some(url) = &config.local_base_url {
            Arc::new(LocalModel::new(url.clone()))
        } else {
            return Err(
                "no model backend configured: set GEMINI_API_KEY or WEAVE_LOCAL_URL".to_string()
            );
        };

        let chain =
            FallbackChain::new(base, config.preferred_model.clone(), &config.fallback_models);
        Ok(Self { model: Arc::new(chain), config, recorder: None })
    }

    /// Creates a live context that records every model call.
    ///
    /// The recorder sits outside the fallback chain, so the transcript holds
    /// the chain's net output — one call per pipeline stream — and replays
    /// without needing the chain again.
    ///
    /// # Errors
    ///
    /// As [`ServiceContext::live`].
    pub fn recording(config: Config) -> Result<Self, String> {
        let live = Self::live(config)?;
        let recorder = Arc::new(RecordingModel::new(live.model));
        let model: Arc<dyn ModelStream> = recorder.clone();
        Ok(Self { model, config: live.config, recorder: Some(recorder) })
    }

    /// Creates a replaying context serving a recorded transcript.
    ///
    /// # Errors
    ///
    /// Returns an error string when the transcript cannot be loaded.
    pub fn replaying(path: &Path, config: Config) -> Result<Self, String> {
        let transcript = Transcript::load(path)?;
        Ok(Self {
            model: Arc::new(ScriptedModel::from_transcript(transcript)),
            config,
            recorder: None,
        })
    }

    /// Takes the recorded transcript, when this context records.
    #[must_use]
    pub fn take_transcript(&self, name: &str) -> Option<Transcript> {
        self.recorder.as_ref().map(|recorder| recorder.finish(name))
    }

    /// Builds an orchestrator over this context's model.
    #[must_use]
    pub fn orchestrator(&self) -> Orchestrator {
        Orchestrator::new(Arc::clone(&self.model), self.config.preferred_model.clone())
    }
}
