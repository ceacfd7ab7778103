use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use audio_fetch_server::background_jobs::jobs::ArtifactReaperJob;
use audio_fetch_server::background_jobs::PeriodicJobRunner;
use audio_fetch_server::config;
use audio_fetch_server::metrics;
use audio_fetch_server::server::{run_server, RequestsLoggingLevel, ServerConfig};
use audio_fetch_server::{ArtifactStore, Converter};

fn parse_path(s: &str) -> Result<PathBuf, String> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(format!("Error resolving path '{}': {}", s, msg));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir().map_err(|e| format!("Failed to get current dir: {}", e))?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
#[clap(version, about = "Converts remote media into downloadable audio files")]
struct CliArgs {
    /// Path to TOML configuration file. Values in the file override CLI arguments.
    #[clap(long, env = "CONFIG_FILE", value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Directory where converted audio files are stored.
    #[clap(long, env = "OUTPUT_DIR", value_parser = parse_path, default_value = config::DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    /// The fetch tool executable (yt-dlp).
    #[clap(long, env = "FETCH_TOOL", default_value = config::DEFAULT_FETCH_TOOL)]
    pub fetch_tool: PathBuf,

    /// ffmpeg binary, or the directory containing it. Defaults to the one on PATH.
    #[clap(long, env = "FFMPEG_PATH")]
    pub ffmpeg_path: Option<PathBuf>,

    /// Hours a converted file stays available before being deleted.
    #[clap(long, env = "FILE_TTL_HOURS", default_value_t = config::DEFAULT_FILE_TTL_HOURS)]
    pub file_ttl_hours: u64,

    /// Hours between two sweeps of expired files.
    #[clap(long, env = "CLEANUP_INTERVAL_HOURS", default_value_t = config::DEFAULT_CLEANUP_INTERVAL_HOURS)]
    pub cleanup_interval_hours: u64,

    /// Comma separated list of origins allowed by CORS.
    #[clap(long, env = "CORS_ORIGINS", value_delimiter = ',', default_value = config::DEFAULT_CORS_ORIGINS)]
    pub cors_origins: Vec<String>,

    /// The address to bind.
    #[clap(long, env = "SERVER_HOST", default_value = config::DEFAULT_HOST)]
    pub host: String,

    /// The port to listen on.
    #[clap(short, long, env = "PORT", default_value_t = config::DEFAULT_PORT)]
    pub port: u16,

    /// The port for the metrics server (Prometheus scraping).
    #[clap(long, env = "METRICS_PORT", default_value_t = config::DEFAULT_METRICS_PORT)]
    pub metrics_port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, env = "LOGGING_LEVEL", default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Wall-clock limit in seconds for a single conversion.
    #[clap(long, env = "CONVERSION_TIMEOUT_SEC", default_value_t = config::DEFAULT_CONVERSION_TIMEOUT_SEC)]
    pub conversion_timeout_sec: u64,

    /// Timeout in seconds for tool availability checks.
    #[clap(long, env = "PROBE_TIMEOUT_SEC", default_value_t = config::DEFAULT_PROBE_TIMEOUT_SEC)]
    pub probe_timeout_sec: u64,

    /// Maximum number of URLs plus search queries in one request.
    #[clap(long, env = "MAX_BATCH_ITEMS", default_value_t = config::DEFAULT_MAX_BATCH_ITEMS)]
    pub max_batch_items: usize,

    /// Number of items of one request converted at the same time.
    #[clap(long, env = "BATCH_CONCURRENCY", default_value_t = config::DEFAULT_BATCH_CONCURRENCY)]
    pub batch_concurrency: usize,
}

impl From<&CliArgs> for config::CliConfig {
    fn from(args: &CliArgs) -> Self {
        config::CliConfig {
            output_dir: args.output_dir.clone(),
            fetch_tool: args.fetch_tool.clone(),
            ffmpeg_path: args.ffmpeg_path.clone(),
            file_ttl_hours: args.file_ttl_hours,
            cleanup_interval_hours: args.cleanup_interval_hours,
            cors_origins: args.cors_origins.clone(),
            host: args.host.clone(),
            port: args.port,
            metrics_port: args.metrics_port,
            logging_level: args.logging_level.clone(),
            conversion_timeout_sec: args.conversion_timeout_sec,
            probe_timeout_sec: args.probe_timeout_sec,
            max_batch_items: args.max_batch_items,
            batch_concurrency: args.batch_concurrency,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;

    // Load TOML config if provided
    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            Some(config::FileConfig::load(path)?)
        }
        None => None,
    };

    // Resolve final configuration (TOML overrides CLI)
    let cli_config: config::CliConfig = (&cli_args).into();
    let app_config = config::AppConfig::resolve(&cli_config, file_config)?;

    info!("Configuration loaded:");
    info!("  output_dir: {:?}", app_config.output_dir);
    info!("  fetch_tool: {:?}", app_config.fetch_tool.path);
    info!("  ffmpeg_path: {:?}", app_config.fetch_tool.ffmpeg_path);
    info!(
        "  file_ttl_hours: {}, cleanup_interval_hours: {}",
        app_config.file_ttl_hours, app_config.cleanup_interval_hours
    );
    info!("  cors_origins: {:?}", app_config.cors_origins);

    std::fs::create_dir_all(&app_config.output_dir).with_context(|| {
        format!(
            "Failed to create output directory {:?}",
            app_config.output_dir
        )
    })?;

    info!("Initializing metrics...");
    metrics::init_metrics();

    let converter = Converter::new(&app_config.output_dir, app_config.tool_config());
    let artifact_store = ArtifactStore::new(&app_config.output_dir, app_config.file_ttl());

    let mut reaper = PeriodicJobRunner::new(Arc::new(ArtifactReaperJob::new(
        artifact_store.clone(),
        app_config.cleanup_interval(),
    )));
    reaper.start();

    let server_config = ServerConfig {
        requests_logging_level: app_config.logging_level.clone(),
        host: app_config.host.clone(),
        port: app_config.port,
        metrics_port: app_config.metrics_port,
        cors_origins: app_config.cors_origins.clone(),
        max_batch_items: app_config.max_batch_items,
        batch_concurrency: app_config.batch_concurrency,
        file_ttl_hours: app_config.file_ttl_hours,
    };

    let result = tokio::select! {
        result = run_server(server_config, converter, artifact_store) => {
            info!("HTTP server stopped: {:?}", result);
            result
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, initiating graceful shutdown");
            Ok(())
        }
    };

    reaper.stop().await;
    result
}
