//! Transcript data structures for recording and replaying model calls.
//!
//! A transcript captures every model call of one generation run: the model
//! asked for and either the fragment sequence it produced or the error it
//! failed with. Recorded transcripts replay through
//! [`crate::adapters::scripted::ScriptedModel`] for offline runs and tests.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One recorded model call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptCall {
    /// Model identifier the call targeted.
    pub model: String,
    /// Fragments the call produced, in arrival order.
    #[serde(default)]
    pub fragments: Vec<String>,
    /// Error message when the call failed. With no fragments the call failed
    /// outright; after fragments it died mid-stream.
    #[serde(default)]
    pub error: Option<String>,
}

/// A full recorded generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    /// Human-readable name for this transcript.
    pub name: String,
    /// When the run was recorded.
    pub recorded_at: DateTime<Utc>,
    /// Ordered list of model calls.
    pub calls: Vec<TranscriptCall>,
}

impl Transcript {
    /// Loads a transcript from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error string when the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read transcript {}: {e}", path.display()))?;
        serde_yaml::from_str(&content)
            .map_err(|e| format!("failed to parse transcript {}: {e}", path.display()))
    }

    /// Writes the transcript to a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error string when serialization or the write fails.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let yaml = serde_yaml::to_string(self)
            .map_err(|e| format!("failed to serialize transcript: {e}"))?;
        std::fs::write(path, yaml)
            .map_err(|e| format!("failed to write transcript {}: {e}", path.display()))
    }
}
