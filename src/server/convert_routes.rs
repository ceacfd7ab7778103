//! Batch conversion endpoint.

use super::state::ServerState;
use super::ApiError;
use crate::converter::{
    convert_batch, BatchSummary, ConversionAttempt, ConversionOutcome, FailureKind,
};
use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;

pub const EMPTY_REQUEST_DETAIL: &str = "At least one URL or search query must be provided";

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ConvertRequestBody {
    #[serde(default)]
    pub urls: Option<Vec<String>>,
    #[serde(default)]
    pub search_queries: Option<Vec<String>>,
}

/// One entry of the response, shaped for the web frontend.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResultDto {
    pub id: String,
    pub filename: String,
    pub title: String,
    pub size: Option<u64>,
    pub duration: Option<String>,
    pub success: bool,
    pub error: Option<String>,
    pub error_kind: Option<FailureKind>,
    pub was_search: bool,
    pub original_input: String,
}

impl From<ConversionAttempt> for ConversionResultDto {
    fn from(attempt: ConversionAttempt) -> Self {
        let id = attempt.id.to_string();
        match attempt.outcome {
            ConversionOutcome::Success(artifact) => Self {
                id,
                filename: artifact.filename,
                title: artifact.title,
                size: artifact.size_bytes,
                duration: artifact.duration,
                success: true,
                error: None,
                error_kind: None,
                was_search: attempt.was_search,
                original_input: attempt.original_input,
            },
            ConversionOutcome::Failure(failure) => Self {
                id,
                filename: String::new(),
                title: attempt.original_input.clone(),
                size: None,
                duration: None,
                success: false,
                error: Some(failure.message),
                error_kind: Some(failure.kind),
                was_search: attempt.was_search,
                original_input: attempt.original_input,
            },
        }
    }
}

#[derive(Serialize, Debug)]
pub struct ConvertResponse {
    pub results: Vec<ConversionResultDto>,
    pub summary: BatchSummary,
}

fn non_blank(items: Option<Vec<String>>) -> Vec<String> {
    items
        .unwrap_or_default()
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

/// Cleans up the request lists and enforces the batch limits.
fn validate(
    body: ConvertRequestBody,
    max_batch_items: usize,
) -> Result<(Vec<String>, Vec<String>), ApiError> {
    let urls = non_blank(body.urls);
    let search_queries = non_blank(body.search_queries);

    let total = urls.len() + search_queries.len();
    if total == 0 {
        return Err(ApiError::bad_request(EMPTY_REQUEST_DETAIL));
    }
    if total > max_batch_items {
        return Err(ApiError::bad_request(format!(
            "Too many items: {} submitted, at most {} allowed per request",
            total, max_batch_items
        )));
    }
    Ok((urls, search_queries))
}

async fn convert(
    State(state): State<ServerState>,
    body: Result<Json<ConvertRequestBody>, JsonRejection>,
) -> Result<Json<ConvertResponse>, ApiError> {
    let Json(body) = body.map_err(|rejection| ApiError::new(rejection.status(), rejection.body_text()))?;
    let (urls, search_queries) = validate(body, state.config.max_batch_items)?;

    info!(
        "Converting {} urls and {} search queries",
        urls.len(),
        search_queries.len()
    );
    let attempts = convert_batch(
        &state.converter,
        &urls,
        &search_queries,
        state.config.batch_concurrency,
    )
    .await;

    let summary = BatchSummary::from_attempts(&attempts);
    let results = attempts.into_iter().map(ConversionResultDto::from).collect();
    Ok(Json(ConvertResponse { results, summary }))
}

pub fn make_convert_routes(state: ServerState) -> Router {
    Router::new()
        .route("/convert", post(convert))
        .with_state(state)
}
