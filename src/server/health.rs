use super::state::ServerState;
use crate::converter::{probe, ToolAvailability};
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

#[derive(Serialize, Debug, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: &'static str,
    pub ytdlp_available: bool,
    pub ytdlp_version: Option<String>,
    pub ffmpeg_available: bool,
    pub ffmpeg_version: Option<String>,
}

impl From<ToolAvailability> for HealthResponse {
    fn from(availability: ToolAvailability) -> Self {
        Self {
            status: if availability.all_ok() {
                "healthy"
            } else {
                "degraded"
            },
            ytdlp_available: availability.fetch_tool_ok,
            ytdlp_version: availability.fetch_tool_version,
            ffmpeg_available: availability.transcode_tool_ok,
            ffmpeg_version: availability.transcode_tool_version,
        }
    }
}

/// Always answers 200; missing tools show up as `degraded`.
async fn health(State(state): State<ServerState>) -> Json<HealthResponse> {
    let availability = probe(state.converter.tool_config()).await;
    Json(availability.into())
}

pub fn make_health_routes(state: ServerState) -> Router {
    Router::new()
        .route("/health", get(health))
        .with_state(state)
}
