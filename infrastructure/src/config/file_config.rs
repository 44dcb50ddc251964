//! Configuration file schema
//!
//! Every field has a default so a bare install works with nothing but an
//! API key in the environment.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration, merged from defaults and `conductor.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub model: ModelConfig,
    pub runtime: RuntimeConfig,
    pub paths: PathsConfig,
    pub history: HistoryConfig,
}

/// Model selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Default model for every pipeline stage.
    pub default: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            default: "gpt-4o".to_string(),
        }
    }
}

/// Invocation runtime settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Base URL of the OpenAI-compatible API.
    pub base_url: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Upper bound on tool-use turns within one agent run.
    pub max_tool_turns: usize,
    /// Per-stage timeout in seconds; absent means unbounded.
    pub stage_timeout_secs: Option<u64>,
    /// HTTP request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            max_tool_turns: 8,
            stage_timeout_secs: Some(120),
            request_timeout_secs: 60,
        }
    }
}

/// Filesystem locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory holding generated tool files.
    pub tools_dir: PathBuf,
    /// Scratch directory generated tools may write to.
    pub cache_dir: PathBuf,
    /// Directory for the daily log file.
    pub logs_dir: PathBuf,
    /// Persisted history location.
    pub history_file: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        let base = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("conductor");
        Self {
            tools_dir: base.join("tools"),
            cache_dir: base.join("cache"),
            logs_dir: base.join("logs"),
            history_file: base.join("history.json"),
        }
    }
}

/// History bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub max_items: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { max_items: 10 }
    }
}
