//! # API Endpoint Handlers
//!
//! The store is synchronous and its writes serialize on the engine's
//! single writer, so every store call runs on a blocking worker rather
//! than on the async executor.

use super::{
    AppState,
    types::{
        ConnectRequest, ConnectResponse, HealthResponse, MediaResponse, StatusResponse,
        TopicResponse, UploadRequestJson, UploadResponse,
    },
};
use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use herus_core::{HerusError, KnowledgeStore, MediaHash};
use std::sync::Arc;

// =============================================================================
// HELPERS
// =============================================================================

/// HTTP status for an error kind. Kinds are never reclassified.
pub fn status_for(err: &HerusError) -> StatusCode {
    if err.is_missing() {
        StatusCode::NOT_FOUND
    } else if err.is_duplicate() {
        StatusCode::CONFLICT
    } else if matches!(err, HerusError::InvalidInput(_)) {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

/// Run `f` against the store on a blocking worker thread.
async fn with_store<T, F>(state: &AppState, f: F) -> Result<T, HerusError>
where
    F: FnOnce(&KnowledgeStore) -> Result<T, HerusError> + Send + 'static,
    T: Send + 'static,
{
    let store = Arc::clone(&state.store);
    tokio::task::spawn_blocking(move || f(&store))
        .await
        .map_err(|e| HerusError::Engine(format!("store worker failed: {}", e)))?
}

fn log_failure(operation: &'static str, err: &HerusError) {
    let status = status_for(err);
    if status.is_server_error() {
        tracing::error!(operation, kind = err.kind(), error = %err, "request failed");
    } else {
        tracing::debug!(operation, kind = err.kind(), error = %err, "request rejected");
    }
}

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// STATUS HANDLER
// =============================================================================

/// Topic and media counts.
pub async fn status_handler(State(state): State<AppState>) -> Response {
    match with_store(&state, |store| store.stats()).await {
        Ok(stats) => (
            StatusCode::OK,
            Json(StatusResponse {
                topics: stats.topics,
                media: stats.media,
            }),
        )
            .into_response(),
        Err(e) => {
            log_failure("status", &e);
            (status_for(&e), e.to_string()).into_response()
        }
    }
}

// =============================================================================
// UPLOAD HANDLER
// =============================================================================

/// Upload media under a topic or as an elaboration of other media.
pub async fn upload_handler(
    State(state): State<AppState>,
    Json(body): Json<UploadRequestJson>,
) -> impl IntoResponse {
    let request = match body.to_upload() {
        Ok(request) => request,
        Err(e) => {
            log_failure("upload", &e);
            return (status_for(&e), Json(UploadResponse::error(&e)));
        }
    };

    match with_store(&state, move |store| store.upload_media(&request)).await {
        Ok(receipt) => (StatusCode::OK, Json(UploadResponse::success(&receipt))),
        Err(e) => {
            log_failure("upload", &e);
            (status_for(&e), Json(UploadResponse::error(&e)))
        }
    }
}

// =============================================================================
// CONNECT HANDLER
// =============================================================================

/// Link one existing topic to another.
pub async fn connect_handler(
    State(state): State<AppState>,
    Json(body): Json<ConnectRequest>,
) -> impl IntoResponse {
    let result = with_store(&state, move |store| {
        let submitter = body.submitter.as_deref().filter(|s| !s.is_empty());
        store.connect_topics(&body.source, &body.destination, submitter)
    })
    .await;

    match result {
        Ok(relation) => (StatusCode::OK, Json(ConnectResponse::success(&relation))),
        Err(e) => {
            log_failure("connect", &e);
            (status_for(&e), Json(ConnectResponse::error(&e)))
        }
    }
}

// =============================================================================
// VIEW HANDLERS
// =============================================================================

/// Topic view: relations and attached media.
pub async fn topic_handler(
    State(state): State<AppState>,
    Path(topic): Path<String>,
) -> impl IntoResponse {
    let raw = topic.clone();
    match with_store(&state, move |store| store.topic_view(&raw)).await {
        Ok(Some(view)) => (StatusCode::OK, Json(TopicResponse::found(&view))),
        Ok(None) => (StatusCode::NOT_FOUND, Json(TopicResponse::not_found(&topic))),
        Err(e) => {
            log_failure("topic", &e);
            (status_for(&e), Json(TopicResponse::error(&topic, &e)))
        }
    }
}

/// Media view: title and elaborations.
pub async fn media_handler(
    State(state): State<AppState>,
    Path(hash): Path<String>,
) -> impl IntoResponse {
    let result = match MediaHash::parse(&hash) {
        Ok(parsed) => with_store(&state, move |store| store.media_view(&parsed)).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(Some(view)) => (StatusCode::OK, Json(MediaResponse::found(&view))),
        Ok(None) => (StatusCode::NOT_FOUND, Json(MediaResponse::not_found(&hash))),
        Err(e) => {
            log_failure("media", &e);
            (status_for(&e), Json(MediaResponse::error(&hash, &e)))
        }
    }
}

/// Raw uploaded bytes.
pub async fn blob_handler(State(state): State<AppState>, Path(hash): Path<String>) -> Response {
    let result = match MediaHash::parse(&hash) {
        Ok(parsed) => with_store(&state, move |store| store.read_blob(&parsed)).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(Some(bytes)) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/octet-stream")],
            bytes,
        )
            .into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "media not found").into_response(),
        Err(e) => {
            log_failure("blob", &e);
            (status_for(&e), e.to_string()).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use herus_core::{TopicName, content};

    #[test]
    fn error_kinds_map_to_statuses() {
        let topic = TopicName::normalize("t");
        let hash = content::digest(b"x");

        assert_eq!(
            status_for(&HerusError::MissingDestination(topic.clone())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&HerusError::MissingParentMedia(hash.clone())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&HerusError::DuplicateAssociation { topic, media: hash }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_for(&HerusError::InvalidInput("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&HerusError::CorruptRecord("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_for(&HerusError::Engine("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
