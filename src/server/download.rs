//! Artifact download endpoint.

use super::state::ServerState;
use super::ApiError;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tokio_util::io::ReaderStream;
use tracing::{debug, error};

const MP3_CONTENT_TYPE: &str = "audio/mpeg";
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

fn not_found(file_ttl_hours: u64) -> ApiError {
    ApiError::not_found(format!(
        "File not found or has been deleted. Files are automatically removed after {} hours.",
        file_ttl_hours
    ))
}

/// `Content-Disposition` offering `display_name` as the saved file name.
///
/// Names that are not plain printable ASCII go through the RFC 5987
/// extended form.
fn content_disposition(display_name: &str) -> HeaderValue {
    let plain = display_name
        .chars()
        .all(|c| c.is_ascii() && !c.is_ascii_control() && c != '"' && c != '\\');
    let value = if plain {
        format!("attachment; filename=\"{}\"", display_name)
    } else {
        format!(
            "attachment; filename*=utf-8''{}",
            urlencoding::encode(display_name)
        )
    };
    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

/// Audio type sniffed from the file header. Headerless MPEG streams are only
/// recognizable by their extension.
fn content_type(path: &std::path::Path) -> &'static str {
    match infer::get_from_path(path) {
        Ok(Some(kind)) if matches!(kind.matcher_type(), infer::MatcherType::Audio) => {
            kind.mime_type()
        }
        _ if path.extension().is_some_and(|ext| ext == "mp3") => MP3_CONTENT_TYPE,
        _ => FALLBACK_CONTENT_TYPE,
    }
}

async fn download(
    State(state): State<ServerState>,
    Path(file_id): Path<String>,
) -> Result<Response, ApiError> {
    let ttl_hours = state.config.file_ttl_hours;

    // Directory scan and header sniffing block, keep them off the runtime
    let store = state.artifact_store.clone();
    let lookup_id = file_id.clone();
    let lookup = tokio::task::spawn_blocking(move || {
        store.locate(&lookup_id).map(|found| {
            found.map(|artifact| {
                let mime = content_type(&artifact.path);
                (artifact, mime)
            })
        })
    })
    .await;

    let (artifact, mime) = match lookup {
        Ok(Ok(Some(found))) => found,
        Ok(Ok(None)) => return Err(not_found(ttl_hours)),
        Ok(Err(e)) => {
            error!("Failed to look up artifact {}: {}", file_id, e);
            return Err(ApiError::internal("Failed to look up file"));
        }
        Err(e) => {
            error!("Lookup of artifact {} did not complete: {}", file_id, e);
            return Err(ApiError::internal("Failed to look up file"));
        }
    };

    // The reaper may delete the file between lookup and open
    let file = match tokio::fs::File::open(&artifact.path).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("Artifact {:?} vanished before download", artifact.path);
            return Err(not_found(ttl_hours));
        }
        Err(e) => {
            error!("Failed to open artifact {:?}: {}", artifact.path, e);
            return Err(ApiError::internal("Failed to open file"));
        }
    };
    let content_length = file.metadata().await.ok().map(|m| m.len());

    let mut response = Body::from_stream(ReaderStream::new(file)).into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(mime));
    headers.insert(
        header::CONTENT_DISPOSITION,
        content_disposition(&artifact.display_name),
    );
    if let Some(length) = content_length {
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
    }
    Ok(response)
}

pub fn make_download_routes(state: ServerState) -> Router {
    Router::new()
        .route("/download/{file_id}", get(download))
        .with_state(state)
}
