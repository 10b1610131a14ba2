//! Extraction handlers: single video, playlist report, playlist archive.

use super::{ExtractRequest, MessageResponse};
use crate::api::AppState;
use crate::api::error_response::bad_request;
use crate::error::{Error, Result};
use crate::resolver;
use crate::temp_files::OutputScope;
use crate::types::PlaylistReport;
use crate::utils::sanitize_filename;
use axum::{
    Json,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};

/// POST /api/v1/extract-audio - Extract one video as MP3
#[utoipa::path(
    post,
    path = "/api/v1/extract-audio",
    tag = "extraction",
    request_body = ExtractRequest,
    responses(
        (status = 200, description = "Tagged MP3 file", content_type = "audio/mpeg"),
        (status = 400, description = "Invalid URL or extraction failed", body = crate::error::ApiError)
    )
)]
pub async fn extract_audio(
    State(state): State<AppState>,
    Json(request): Json<ExtractRequest>,
) -> Response {
    match extract_audio_inner(&state, &request.url).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(url = %request.url, error = %e, "audio extraction failed");
            bad_request(e)
        }
    }
}

async fn extract_audio_inner(state: &AppState, url: &str) -> Result<Response> {
    let result = state
        .extractor
        .extract(url, &OutputScope::Standalone)
        .await?;

    // The file is ours once the bytes are in memory
    let bytes = tokio::fs::read(&result.file_path).await;
    state
        .extractor
        .temp_store()
        .remove_file(&result.file_path)
        .await;
    let bytes = bytes?;

    let extension = state.extractor.temp_store().extension();
    let display_name = format!("{}.{}", result.title, extension);
    let disposition = content_disposition(&result.filename, Some(&display_name))?;

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("audio/mpeg"));
    headers.insert(header::CONTENT_DISPOSITION, disposition);

    Ok((StatusCode::OK, headers, bytes).into_response())
}

/// POST /api/v1/extract-playlist - Extract every playlist entry and report outcomes
#[utoipa::path(
    post,
    path = "/api/v1/extract-playlist",
    tag = "extraction",
    request_body = ExtractRequest,
    responses(
        (status = 200, description = "Per-entry outcomes", body = PlaylistReport),
        (status = 400, description = "Playlist metadata unavailable", body = crate::error::ApiError),
        (status = 500, description = "Unexpected failure", body = crate::error::ApiError)
    )
)]
pub async fn extract_playlist(
    State(state): State<AppState>,
    Json(request): Json<ExtractRequest>,
) -> Result<Json<PlaylistReport>> {
    tracing::info!(url = %request.url, "processing playlist request");
    let report = state.extractor.report_collection(&request.url).await?;
    Ok(Json(report))
}

/// POST /api/v1/extract-album - Extract every playlist entry into one ZIP archive
#[utoipa::path(
    post,
    path = "/api/v1/extract-album",
    tag = "extraction",
    request_body = ExtractRequest,
    responses(
        (status = 200, description = "ZIP archive of tagged MP3 files, or a JSON message if the URL has no playlist", content_type = "application/zip"),
        (status = 400, description = "Extraction or packaging failed", body = crate::error::ApiError)
    )
)]
pub async fn extract_album(
    State(state): State<AppState>,
    Json(request): Json<ExtractRequest>,
) -> Response {
    let has_collection = match resolver::resolve(&request.url) {
        Ok(resolved) => resolved.is_collection_ref,
        // Pure playlist URLs carry no item id
        Err(_) => resolver::collection_ref(&request.url).is_some(),
    };
    if !has_collection {
        return Json(MessageResponse {
            message: "No playlist found in URL".to_string(),
        })
        .into_response();
    }

    match extract_album_inner(&state, &request.url).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(url = %request.url, error = %e, "album extraction failed");
            bad_request(e)
        }
    }
}

async fn extract_album_inner(state: &AppState, url: &str) -> Result<Response> {
    let archive = state.extractor.extract_collection(url).await?;

    let stem = match sanitize_filename(&archive.collection_title) {
        s if s.is_empty() => "playlist".to_string(),
        s => s,
    };
    let disposition = content_disposition(&format!("{}.zip", stem), None)?;
    let failed = HeaderValue::from(archive.failure_count());

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/zip"));
    headers.insert(header::CONTENT_DISPOSITION, disposition);
    headers.insert("x-failed-items", failed);

    Ok((StatusCode::OK, headers, archive.archive_bytes).into_response())
}

/// `attachment; filename="<ascii>"`, plus an RFC 5987 `filename*` when a
/// display name is given
fn content_disposition(ascii_name: &str, display_name: Option<&str>) -> Result<HeaderValue> {
    let value = match display_name {
        Some(display) => format!(
            "attachment; filename=\"{}\"; filename*=UTF-8''{}",
            ascii_name,
            urlencoding::encode(display)
        ),
        None => format!("attachment; filename=\"{}\"", ascii_name),
    };
    HeaderValue::from_str(&value)
        .map_err(|e| Error::Other(format!("invalid Content-Disposition header: {}", e)))
}
