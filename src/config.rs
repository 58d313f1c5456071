//! Environment-driven configuration.
//!
//! Everything is read from the environment (with `.env` support via
//! `dotenvy` in the binary entrypoint); there is no config file. The
//! fallback chain is configuration, not control flow, so tests can exercise
//! it by substituting a scripted adapter.

use std::env;

/// Preferred model when `WEAVE_MODEL` is unset.
const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Fallback chain when `WEAVE_FALLBACK_MODELS` is unset.
const DEFAULT_FALLBACKS: &[&str] = &["gemini-1.5-flash", "gemini-1.5-pro"];

/// Resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Model tried first on every call.
    pub preferred_model: String,
    /// Models tried in order after the preferred one.
    pub fallback_models: Vec<String>,
    /// Gemini API key; its presence selects the Gemini backend.
    pub gemini_api_key: Option<String>,
    /// Override for the Gemini API host.
    pub gemini_base_url: Option<String>,
    /// Base URL of a local OpenAI-compatible endpoint.
    pub local_base_url: Option<String>,
}

impl Config {
    /// Reads configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Reads configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        Self {
            preferred_model: non_empty("WEAVE_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            fallback_models: non_empty("WEAVE_FALLBACK_MODELS")
                .map_or_else(default_fallbacks, |raw| parse_model_list(&raw)),
            gemini_api_key: non_empty("GEMINI_API_KEY"),
            gemini_base_url: non_empty("GEMINI_BASE_URL"),
            local_base_url: non_empty("WEAVE_LOCAL_URL"),
        }
    }
}

/// The built-in fallback chain.
fn default_fallbacks() -> Vec<String> {
    DEFAULT_FALLBACKS.iter().map(ToString::to_string).collect()
}

/// Splits a comma-separated model list, dropping empty segments.
fn parse_model_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(ToString::to_string)
        .collect()
}
