//! HTTP client for end-to-end tests
//!
//! When API routes or request formats change, update only this file.

use super::constants::*;
use reqwest::Response;
use serde_json::json;
use std::time::Duration;

pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    // ========================================================================
    // Conversion
    // ========================================================================

    /// POST /api/convert
    pub async fn convert(&self, urls: &[&str], search_queries: &[&str]) -> Response {
        self.convert_raw(json!({
            "urls": urls,
            "searchQueries": search_queries,
        }))
        .await
    }

    /// POST /api/convert with an arbitrary JSON body
    pub async fn convert_raw(&self, body: serde_json::Value) -> Response {
        self.client
            .post(format!("{}/api/convert", self.base_url))
            .json(&body)
            .send()
            .await
            .expect("Convert request failed")
    }

    // ========================================================================
    // Download
    // ========================================================================

    /// GET /api/download/{file_id}
    pub async fn download(&self, file_id: &str) -> Response {
        self.client
            .get(format!("{}/api/download/{}", self.base_url, file_id))
            .send()
            .await
            .expect("Download request failed")
    }

    // ========================================================================
    // Service
    // ========================================================================

    /// GET /api/health
    pub async fn health(&self) -> Response {
        self.client
            .get(format!("{}/api/health", self.base_url))
            .send()
            .await
            .expect("Health request failed")
    }

    /// GET /
    pub async fn home(&self) -> Response {
        self.client
            .get(format!("{}/", self.base_url))
            .send()
            .await
            .expect("Home request failed")
    }
}
