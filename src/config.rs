//! Pipeline configuration.
//!
//! One explicit struct injected into the orchestrator, no ambient
//! environment lookups inside the pipeline. Environment variables are read
//! exactly once, at startup, by `PipelineConfig::from_env`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub const APP_NAME: &str = "Notaria";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn default_log_filter() -> &'static str {
    "notaria=info,warn"
}

/// Get the application data directory (~/Notaria/)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("Notaria")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Uploads above this size run asynchronously behind a job row.
    pub async_threshold_bytes: u64,
    /// Overall wall-clock budget per ingestion, checked at stage boundaries.
    pub overall_budget_secs: u64,
    /// Jurisdiction assumed for assets when the extractor does not name one.
    pub default_jurisdiction: String,
    /// Base URL of the semantic reasoning gateway.
    pub reasoning_base_url: String,
    /// Model requested from the gateway.
    pub reasoning_model: String,
    /// Per-request timeout for reasoning calls.
    pub reasoning_timeout_secs: u64,
    /// OCR sample length sent to the classifier, in characters.
    pub classification_sample_chars: usize,
    /// Root directory for the SQLite store and blob storage.
    pub data_dir: PathBuf,
    /// Bind address for the HTTP surface.
    pub bind_addr: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            async_threshold_bytes: 2 * 1024 * 1024,
            overall_budget_secs: 300,
            default_jurisdiction: "BAHIA BLANCA".to_string(),
            reasoning_base_url: "http://localhost:8089".to_string(),
            reasoning_model: "gold-latest".to_string(),
            reasoning_timeout_secs: 120,
            classification_sample_chars: 1000,
            data_dir: app_data_dir(),
            bind_addr: "127.0.0.1:4545".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Build a config from the environment, falling back to defaults.
    /// This is the only place the pipeline reads environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            async_threshold_bytes: env_parse("NOTARIA_ASYNC_THRESHOLD_BYTES")
                .unwrap_or(defaults.async_threshold_bytes),
            overall_budget_secs: env_parse("NOTARIA_BUDGET_SECS")
                .unwrap_or(defaults.overall_budget_secs),
            default_jurisdiction: std::env::var("NOTARIA_DEFAULT_JURISDICTION")
                .unwrap_or(defaults.default_jurisdiction),
            reasoning_base_url: std::env::var("NOTARIA_REASONING_URL")
                .unwrap_or(defaults.reasoning_base_url),
            reasoning_model: std::env::var("NOTARIA_REASONING_MODEL")
                .unwrap_or(defaults.reasoning_model),
            reasoning_timeout_secs: env_parse("NOTARIA_REASONING_TIMEOUT_SECS")
                .unwrap_or(defaults.reasoning_timeout_secs),
            classification_sample_chars: defaults.classification_sample_chars,
            data_dir: std::env::var("NOTARIA_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            bind_addr: std::env::var("NOTARIA_BIND_ADDR").unwrap_or(defaults.bind_addr),
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("notaria.db")
    }

    pub fn blobs_dir(&self) -> PathBuf {
        self.data_dir.join("escrituras_raw")
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok()?.parse().ok()
}
