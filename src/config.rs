//! Fetch and extraction tuning, optionally loaded from a TOML file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Knobs for the range fetcher, the EOCD search and the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Transport timeout per HTTP request, in seconds. Requests are not retried.
    pub timeout_secs: u64,
    /// Bytes added to the EOCD search window on each attempt.
    pub eocd_chunk_size: u64,
    /// Attempts before the EOCD search gives up.
    pub eocd_max_attempts: u32,
    /// Upper bound on entries extracted at the same time.
    pub max_concurrent_entries: usize,
    /// Optional `User-Agent` for HTTP requests.
    pub user_agent: Option<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            eocd_chunk_size: 256,
            eocd_max_attempts: 4,
            max_concurrent_entries: 16,
            user_agent: None,
        }
    }
}

impl FetchConfig {
    /// Load configuration from a TOML file. Missing keys take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let cfg: FetchConfig = toml::from_str(&data)
            .with_context(|| format!("parsing config {}", path.display()))?;
        tracing::debug!("loaded config from {}", path.display());
        Ok(cfg)
    }
}
