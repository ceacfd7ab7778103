use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub output_dir: Option<String>,
    pub ffmpeg_path: Option<String>,
    pub file_ttl_hours: Option<u64>,
    pub cleanup_interval_hours: Option<u64>,
    pub cors_origins: Option<Vec<String>>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub metrics_port: Option<u16>,
    pub logging_level: Option<String>,
    pub conversion_timeout_sec: Option<u64>,
    pub probe_timeout_sec: Option<u64>,
    pub max_batch_items: Option<usize>,
    pub batch_concurrency: Option<usize>,

    // Feature configs
    pub fetch_tool: Option<FetchToolConfig>,
}

/// `[fetch_tool]` section: how the fetch tool is invoked.
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct FetchToolConfig {
    /// Executable, overrides `--fetch-tool`.
    pub path: Option<String>,
    pub audio_format: Option<String>,
    pub postprocessor_args: Option<String>,
    pub extra_args: Option<Vec<String>>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
