use anyhow::{Context, Result};
use std::time::{Duration, Instant};

use axum::{
    extract::State,
    http::{HeaderValue, Method},
    middleware,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

use super::convert_routes::make_convert_routes;
use super::download::make_download_routes;
use super::health::make_health_routes;
use super::{log_requests, state::ServerState, ServerConfig};
use crate::artifact_store::ArtifactStore;
use crate::converter::Converter;
use crate::metrics::metrics_handler;

const SERVICE_NAME: &str = "Audio Fetch Server";

#[derive(Serialize)]
struct ServerStats {
    pub name: &'static str,
    pub version: &'static str,
    pub uptime: String,
    pub hash: String,
    pub endpoints: Endpoints,
}

#[derive(Serialize)]
struct Endpoints {
    pub convert: &'static str,
    pub download: &'static str,
    pub health: &'static str,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        name: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
        endpoints: Endpoints {
            convert: "POST /api/convert",
            download: "GET /api/download/{file_id}",
            health: "GET /api/health",
        },
    };
    Json(stats)
}

/// Origin entry that allows every origin.
const ANY_ORIGIN: &str = "*";

fn make_cors_layer(origins: &[String]) -> CorsLayer {
    // A literal `*` is invalid next to credentials, echoing the caller's
    // origin grants the same access
    let allow_origin = if origins.iter().any(|origin| origin == ANY_ORIGIN) {
        AllowOrigin::mirror_request()
    } else {
        let origins: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| match origin.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!("Ignoring invalid CORS origin {:?}", origin);
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
        ])
}

pub fn make_app(config: ServerConfig, converter: Converter, artifact_store: ArtifactStore) -> Router {
    let state = ServerState {
        config: config.clone(),
        start_time: Instant::now(),
        converter,
        artifact_store,
        hash: env!("GIT_HASH").to_owned(),
    };

    let api_routes: Router = make_convert_routes(state.clone())
        .merge(make_download_routes(state.clone()))
        .merge(make_health_routes(state.clone()));

    let home_router: Router = Router::new()
        .route("/", get(home))
        .with_state(state.clone());

    home_router
        .nest("/api", api_routes)
        .layer(middleware::from_fn_with_state(state, log_requests))
        .layer(make_cors_layer(&config.cors_origins))
}

/// Router exposing Prometheus metrics, served on its own port.
pub fn make_metrics_app() -> Router {
    Router::new().route("/metrics", get(metrics_handler))
}

pub async fn run_server(
    config: ServerConfig,
    converter: Converter,
    artifact_store: ArtifactStore,
) -> Result<()> {
    let address = format!("{}:{}", config.host, config.port);
    let metrics_address = format!("{}:{}", config.host, config.metrics_port);
    let app = make_app(config, converter, artifact_store);

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    let metrics_listener = tokio::net::TcpListener::bind(&metrics_address)
        .await
        .with_context(|| format!("Failed to bind metrics port {}", metrics_address))?;

    info!("Ready to serve at {}", address);
    info!("Metrics available at {}/metrics", metrics_address);

    tokio::try_join!(
        async {
            axum::serve(listener, app)
                .await
                .context("API server failed")
        },
        async {
            axum::serve(metrics_listener, make_metrics_app())
                .await
                .context("Metrics server failed")
        },
    )?;
    Ok(())
}
