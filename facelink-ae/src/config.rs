//! Service settings
//!
//! The settings document is a TOML file with four sections:
//! - `[config]` — global pipeline behavior and default conditions
//! - `[[stream_configurations]]` — per-stream overrides
//! - `[target]` — the recognition platform's REST API
//! - `[server]` — the ingestion/health HTTP listener
//!
//! Selection weights are fixed constants (see `services::tracklet`), not
//! settings. Thresholds, timeouts and debounce windows are configurable.

use facelink_common::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::models::{Conditions, StreamConfiguration};

/// How a validated, debounced notification reaches enrollment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EnrollStrategy {
    /// Enroll the first notification that passes validation and debouncing
    FirstPassingCriteria,
    /// Buffer per tracklet and enroll the best-scored notification after
    /// the tracklet window expires
    #[default]
    BestOfTracklet,
}

/// Global pipeline behavior (`[config]` section).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Apply the default conditions to streams with no explicit entry
    pub apply_for_all_streams: bool,
    /// Default target watchlists, unioned with `conditions.watchlist_ids`
    pub watchlist_ids: Vec<String>,
    /// Default rule set merged into every stream entry
    pub conditions: Conditions,
    /// When set, selected crops are also written here as `<member-id>.jpg`
    pub debug_output_folder: Option<PathBuf>,
    pub enroll_strategy: EnrollStrategy,
    pub max_parallel_blocks: Option<usize>,
    pub register_max_faces: Option<u32>,
    pub register_min_face_size: Option<u32>,
    pub register_max_face_size: Option<u32>,
    pub register_face_confidence: Option<u32>,
    /// Similarity threshold for the pre-enrollment duplicate search;
    /// unset or zero disables the search
    pub duplicate_search_threshold: Option<i64>,
    pub tracklet_timeout_ms: Option<u64>,
    pub hard_absolute_expiration_ms: Option<u64>,
}

impl GlobalConfig {
    pub fn max_parallel_blocks(&self) -> usize {
        self.max_parallel_blocks.unwrap_or(4)
    }

    pub fn register_max_faces(&self) -> u32 {
        self.register_max_faces.unwrap_or(3)
    }

    pub fn register_min_face_size(&self) -> u32 {
        self.register_min_face_size.unwrap_or(30)
    }

    pub fn register_max_face_size(&self) -> u32 {
        self.register_max_face_size.unwrap_or(600)
    }

    pub fn register_face_confidence(&self) -> u32 {
        self.register_face_confidence.unwrap_or(450)
    }

    pub fn tracklet_timeout_ms(&self) -> u64 {
        self.tracklet_timeout_ms.unwrap_or(5_000)
    }

    pub fn hard_absolute_expiration_ms(&self) -> u64 {
        self.hard_absolute_expiration_ms.unwrap_or(10_000)
    }
}

/// Recognition platform REST API (`[target]` section).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Base URL, e.g. `http://sfapi:8098`
    pub base_url: String,
    pub request_timeout_secs: u64,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            base_url: "http://sfapi:8098".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Ingestion/health HTTP listener (`[server]` section).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8790".to_string(),
        }
    }
}

/// Complete settings document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub config: GlobalConfig,
    pub stream_configurations: Vec<StreamConfiguration>,
    pub target: TargetConfig,
    pub server: ServerConfig,
}

impl Settings {
    /// Load and parse a settings document from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        Self::parse(&content)
    }

    /// Parse a settings document from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Parse settings failed: {}", e)))
    }
}
