//! Runtime configuration with environment overrides.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::constants;

/// Engine configuration. Defaults come from [`crate::constants`]; each
/// field can be overridden by the matching environment variable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngramConfig {
    /// `AUTO_CHECKPOINT_THRESHOLD` — buffered events before auto-checkpoint.
    pub auto_checkpoint_threshold: usize,
    /// `ERROR_BURST_THRESHOLD` — consecutive failures triggering a checkpoint.
    pub error_burst_threshold: usize,
    /// `DISCLOSURE_THRESHOLD` — events between cadence disclosures.
    pub disclosure_threshold: usize,
    /// `CONTEXT_THRESHOLD_PERCENT` — usage percent before checkpoint-and-clear.
    pub context_threshold_percent: u32,
    /// `DECAY_RATE` — exponential decay rate per day.
    pub decay_rate: f64,
    /// `REINFORCE_BOOST` — strength added per reinforcing access.
    pub reinforce_boost: f64,
    /// `TOKENIZER_PATH` — optional tokenizer vocabulary; absent means the
    /// bundled encoder, falling back to a chars/4 estimate.
    pub tokenizer_path: Option<PathBuf>,
    /// Inline-vs-blob size limit for event content, in bytes.
    pub inline_content_limit: usize,
}

impl Default for EngramConfig {
    fn default() -> Self {
        Self {
            auto_checkpoint_threshold: constants::AUTO_CHECKPOINT_THRESHOLD,
            error_burst_threshold: constants::ERROR_BURST_THRESHOLD,
            disclosure_threshold: constants::DISCLOSURE_THRESHOLD,
            context_threshold_percent: constants::CONTEXT_THRESHOLD_PERCENT,
            decay_rate: constants::DECAY_RATE,
            reinforce_boost: constants::REINFORCE_BOOST,
            tokenizer_path: None,
            inline_content_limit: constants::INLINE_CONTENT_LIMIT,
        }
    }
}

impl EngramConfig {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Some(v) = env_parse("AUTO_CHECKPOINT_THRESHOLD") {
            cfg.auto_checkpoint_threshold = v;
        }
        if let Some(v) = env_parse("ERROR_BURST_THRESHOLD") {
            cfg.error_burst_threshold = v;
        }
        if let Some(v) = env_parse("DISCLOSURE_THRESHOLD") {
            cfg.disclosure_threshold = v;
        }
        if let Some(v) = env_parse("CONTEXT_THRESHOLD_PERCENT") {
            cfg.context_threshold_percent = v;
        }
        if let Some(v) = env_parse("DECAY_RATE") {
            cfg.decay_rate = v;
        }
        if let Some(v) = env_parse("REINFORCE_BOOST") {
            cfg.reinforce_boost = v;
        }
        if let Ok(v) = std::env::var("TOKENIZER_PATH") {
            if !v.is_empty() {
                cfg.tokenizer_path = Some(PathBuf::from(v));
            }
        }
        if let Some(v) = env_parse("INLINE_CONTENT_LIMIT") {
            cfg.inline_content_limit = v;
        }
        cfg
    }
}

/// Parse an env var, ignoring unset or malformed values.
fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}
