//! Test server lifecycle management
//!
//! Each test gets an isolated server with its own output directory.

use super::constants::*;
use super::fixtures::stub_tool_config;
use audio_fetch_server::converter::ToolConfig;
use audio_fetch_server::server::{make_app, RequestsLoggingLevel, ServerConfig};
use audio_fetch_server::{ArtifactStore, Converter};
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Test server instance with an isolated output directory
///
/// When dropped, the server gracefully shuts down and the directory is removed.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    pub port: u16,

    // Private fields - keep resources alive until drop
    output_dir: TempDir,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a test server backed by the stub tools on a random port
    pub async fn spawn() -> Self {
        Self::spawn_with_tools(stub_tool_config()).await
    }

    /// Spawns a test server using the given tool configuration
    ///
    /// # Panics
    ///
    /// Panics if port binding fails or the server doesn't become ready
    /// within timeout.
    pub async fn spawn_with_tools(tool_config: ToolConfig) -> Self {
        let output_dir = TempDir::new().expect("Failed to create output dir");

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let config = ServerConfig {
            requests_logging_level: RequestsLoggingLevel::None,
            host: "127.0.0.1".to_string(),
            port,
            max_batch_items: TEST_MAX_BATCH_ITEMS,
            batch_concurrency: 2,
            file_ttl_hours: TEST_FILE_TTL_HOURS,
            ..Default::default()
        };
        let converter = Converter::new(output_dir.path(), tool_config);
        let artifact_store = ArtifactStore::new(
            output_dir.path(),
            Duration::from_secs(TEST_FILE_TTL_HOURS * 3600),
        );
        let app = make_app(config, converter, artifact_store);

        // Spawn server in background task with graceful shutdown
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            output_dir,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// Directory the server converts into
    pub fn output_dir(&self) -> &Path {
        self.output_dir.path()
    }

    /// Waits for the server to become ready by polling the home endpoint
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!("Server did not become ready within {:?}", timeout);
            }

            if let Ok(response) = client.get(format!("{}/", self.base_url)).send().await {
                if response.status().is_success() {
                    return;
                }
            }

            tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
