//! Question-answering endpoint

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};

use super::ApiState;

/// Largest accepted upload; generous for a minute of webm speech
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Build the QA router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/qa", post(qa))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

/// Answer a spoken question
///
/// Accepts a multipart upload with one audio file field, runs the full
/// pipeline, publishes the synthesized answer for later streaming, and
/// returns the same audio directly.
async fn qa(State(state): State<Arc<ApiState>>, mut multipart: Multipart) -> Response {
    let mut upload: Option<(Vec<u8>, Option<String>)> = None;

    while let Ok(Some(field)) = multipart.next_field().await {
        let is_file = field.file_name().is_some() || field.name() == Some("file");
        if !is_file {
            continue;
        }
        let content_type = field.content_type().map(ToString::to_string);
        match field.bytes().await {
            Ok(bytes) => {
                upload = Some((bytes.to_vec(), content_type));
                break;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to read upload field");
                return StatusCode::BAD_REQUEST.into_response();
            }
        }
    }

    let Some((raw, content_type)) = upload else {
        return StatusCode::BAD_REQUEST.into_response();
    };

    tracing::info!(bytes = raw.len(), content_type = ?content_type, "audio question received");

    match state.pipeline.run(&raw, content_type.as_deref()).await {
        Ok(wav) => {
            // keep the answer around for /play even though we return it here
            let id = state.coordinator.publish(wav.clone());
            tracing::info!(answer_id = %id, bytes = wav.len(), "answer ready");

            ([(header::CONTENT_TYPE, "audio/wav")], wav).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "question answering failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
