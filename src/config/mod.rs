mod file_config;

pub use file_config::{FetchToolConfig, FileConfig};

use crate::converter::ToolConfig;
use crate::server::RequestsLoggingLevel;
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_OUTPUT_DIR: &str = "converted_audio";
pub const DEFAULT_FETCH_TOOL: &str = "yt-dlp";
pub const DEFAULT_FILE_TTL_HOURS: u64 = 24;
pub const DEFAULT_CLEANUP_INTERVAL_HOURS: u64 = 1;
pub const DEFAULT_CORS_ORIGINS: &str = "http://localhost:5173,http://localhost:5174";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_METRICS_PORT: u16 = 9091;
pub const DEFAULT_CONVERSION_TIMEOUT_SEC: u64 = 300;
pub const DEFAULT_PROBE_TIMEOUT_SEC: u64 = 5;
pub const DEFAULT_MAX_BATCH_ITEMS: usize = 50;
pub const DEFAULT_BATCH_CONCURRENCY: usize = 1;
pub const DEFAULT_AUDIO_FORMAT: &str = "mp3";

const SECS_PER_HOUR: u64 = 60 * 60;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub output_dir: PathBuf,
    pub fetch_tool: PathBuf,
    pub ffmpeg_path: Option<PathBuf>,
    pub file_ttl_hours: u64,
    pub cleanup_interval_hours: u64,
    pub cors_origins: Vec<String>,
    pub host: String,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub conversion_timeout_sec: u64,
    pub probe_timeout_sec: u64,
    pub max_batch_items: usize,
    pub batch_concurrency: usize,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            fetch_tool: PathBuf::from(DEFAULT_FETCH_TOOL),
            ffmpeg_path: None,
            file_ttl_hours: DEFAULT_FILE_TTL_HOURS,
            cleanup_interval_hours: DEFAULT_CLEANUP_INTERVAL_HOURS,
            cors_origins: DEFAULT_CORS_ORIGINS
                .split(',')
                .map(str::to_string)
                .collect(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            metrics_port: DEFAULT_METRICS_PORT,
            logging_level: RequestsLoggingLevel::default(),
            conversion_timeout_sec: DEFAULT_CONVERSION_TIMEOUT_SEC,
            probe_timeout_sec: DEFAULT_PROBE_TIMEOUT_SEC,
            max_batch_items: DEFAULT_MAX_BATCH_ITEMS,
            batch_concurrency: DEFAULT_BATCH_CONCURRENCY,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    // Core settings
    pub output_dir: PathBuf,
    pub file_ttl_hours: u64,
    pub cleanup_interval_hours: u64,
    pub cors_origins: Vec<String>,
    pub host: String,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub max_batch_items: usize,
    pub batch_concurrency: usize,

    // External tools
    pub fetch_tool: FetchToolSettings,
}

#[derive(Debug, Clone)]
pub struct FetchToolSettings {
    pub path: PathBuf,
    pub ffmpeg_path: Option<PathBuf>,
    pub audio_format: String,
    pub postprocessor_args: Option<String>,
    pub extra_args: Vec<String>,
    pub conversion_timeout_sec: u64,
    pub probe_timeout_sec: u64,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let output_dir = file
            .output_dir
            .map(PathBuf::from)
            .unwrap_or_else(|| cli.output_dir.clone());
        if output_dir.exists() && !output_dir.is_dir() {
            bail!("output_dir is not a directory: {:?}", output_dir);
        }

        let file_ttl_hours = file.file_ttl_hours.unwrap_or(cli.file_ttl_hours);
        let cleanup_interval_hours = file
            .cleanup_interval_hours
            .unwrap_or(cli.cleanup_interval_hours);
        if cleanup_interval_hours == 0 {
            bail!("cleanup_interval_hours must be greater than 0");
        }

        let cors_origins: Vec<String> = file
            .cors_origins
            .unwrap_or_else(|| cli.cors_origins.clone())
            .iter()
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let host = file.host.unwrap_or_else(|| cli.host.clone());
        let port = file.port.unwrap_or(cli.port);
        let metrics_port = file.metrics_port.unwrap_or(cli.metrics_port);

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let max_batch_items = file.max_batch_items.unwrap_or(cli.max_batch_items);
        if max_batch_items == 0 {
            bail!("max_batch_items must be greater than 0");
        }
        let batch_concurrency = file.batch_concurrency.unwrap_or(cli.batch_concurrency);
        if batch_concurrency == 0 {
            bail!("batch_concurrency must be greater than 0");
        }

        let conversion_timeout_sec = file
            .conversion_timeout_sec
            .unwrap_or(cli.conversion_timeout_sec);
        if conversion_timeout_sec == 0 {
            bail!("conversion_timeout_sec must be greater than 0");
        }
        let probe_timeout_sec = file.probe_timeout_sec.unwrap_or(cli.probe_timeout_sec);
        if probe_timeout_sec == 0 {
            bail!("probe_timeout_sec must be greater than 0");
        }

        // Fetch tool settings - merge file config with CLI and defaults
        let ft_file = file.fetch_tool.unwrap_or_default();
        let audio_format = ft_file
            .audio_format
            .unwrap_or_else(|| DEFAULT_AUDIO_FORMAT.to_string());
        if audio_format.trim().is_empty() {
            bail!("fetch_tool.audio_format must not be empty");
        }
        let fetch_tool = FetchToolSettings {
            path: ft_file
                .path
                .map(PathBuf::from)
                .unwrap_or_else(|| cli.fetch_tool.clone()),
            ffmpeg_path: file
                .ffmpeg_path
                .map(PathBuf::from)
                .or_else(|| cli.ffmpeg_path.clone()),
            audio_format,
            postprocessor_args: ft_file.postprocessor_args,
            extra_args: ft_file.extra_args.unwrap_or_default(),
            conversion_timeout_sec,
            probe_timeout_sec,
        };

        Ok(Self {
            output_dir,
            file_ttl_hours,
            cleanup_interval_hours,
            cors_origins,
            host,
            port,
            metrics_port,
            logging_level,
            max_batch_items,
            batch_concurrency,
            fetch_tool,
        })
    }

    pub fn file_ttl(&self) -> Duration {
        Duration::from_secs(self.file_ttl_hours * SECS_PER_HOUR)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_hours * SECS_PER_HOUR)
    }

    pub fn tool_config(&self) -> ToolConfig {
        ToolConfig {
            fetch_tool: self.fetch_tool.path.clone(),
            ffmpeg_location: self.fetch_tool.ffmpeg_path.clone(),
            audio_format: self.fetch_tool.audio_format.clone(),
            postprocessor_args: self.fetch_tool.postprocessor_args.clone(),
            extra_args: self.fetch_tool.extra_args.clone(),
            conversion_timeout: Duration::from_secs(self.fetch_tool.conversion_timeout_sec),
            probe_timeout: Duration::from_secs(self.fetch_tool.probe_timeout_sec),
        }
    }
}

fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
