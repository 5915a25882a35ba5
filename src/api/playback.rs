//! Playback endpoints: stream, stop, and availability polling

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use futures::StreamExt;
use serde::Serialize;
use uuid::Uuid;

use super::ApiState;

/// Build the playback router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/play", get(play))
        .route("/stop", post(stop))
        .route("/check_audio", get(check_audio))
        .with_state(state)
}

/// Response for /stop
#[derive(Debug, Serialize)]
pub struct StopResponse {
    pub stopped: bool,
    pub id: Option<Uuid>,
}

/// Response for /check_audio
#[derive(Debug, Serialize)]
pub struct CheckAudioResponse {
    pub audio_available: bool,
    pub audio_id: Option<Uuid>,
}

/// Stream the current answer as chunked WAV
///
/// 204 when nothing has been published yet. The stream is bound to the
/// answer current at this moment; later publishes don't affect it.
async fn play(State(state): State<Arc<ApiState>>) -> Response {
    match state.coordinator.stream() {
        None => StatusCode::NO_CONTENT.into_response(),
        Some(chunks) => {
            let body = Body::from_stream(chunks.map(Ok::<_, Infallible>));
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "audio/wav")],
                body,
            )
                .into_response()
        }
    }
}

/// Cut off any in-flight stream of the current answer
async fn stop(State(state): State<Arc<ApiState>>) -> Json<StopResponse> {
    let id = state.coordinator.cancel();
    tracing::info!(answer_id = ?id, "playback stop requested");
    Json(StopResponse { stopped: true, id })
}

/// Non-blocking availability poll
async fn check_audio(State(state): State<Arc<ApiState>>) -> Json<CheckAudioResponse> {
    let status = state.coordinator.status();
    Json(CheckAudioResponse {
        audio_available: status.available,
        audio_id: status.id,
    })
}
