use super::RequestsLoggingLevel;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub requests_logging_level: RequestsLoggingLevel,
    pub host: String,
    pub port: u16,
    pub metrics_port: u16,
    /// Origins allowed to call the API from a browser.
    pub cors_origins: Vec<String>,
    /// Upper bound on URLs plus search queries in one request.
    pub max_batch_items: usize,
    pub batch_concurrency: usize,
    /// Reported in download 404 messages.
    pub file_ttl_hours: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            requests_logging_level: RequestsLoggingLevel::Path,
            host: "0.0.0.0".to_string(),
            port: 8000,
            metrics_port: 9091,
            cors_origins: vec![
                "http://localhost:5173".to_string(),
                "http://localhost:5174".to_string(),
            ],
            max_batch_items: 50,
            batch_concurrency: 1,
            file_ttl_hours: 24,
        }
    }
}
