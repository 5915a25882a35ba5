//! Soil-humidity endpoints

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::ApiState;
use crate::sensor::humidity_message;

/// Build the humidity router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/get_humidity", get(get_humidity))
        .route("/humidity_audio", get(humidity_audio))
        .with_state(state)
}

/// Successful sensor reading
#[derive(Debug, Serialize)]
struct HumidityResponse {
    humidity: i64,
}

/// Structured sensor failure; this path never masks errors with audio
#[derive(Debug, Serialize)]
struct SensorErrorResponse {
    error: String,
}

/// Query parameters for /humidity_audio
#[derive(Debug, Deserialize)]
struct HumidityAudioParams {
    h: i64,
}

/// Poll the sensor and return the reading as JSON
async fn get_humidity(State(state): State<Arc<ApiState>>) -> Response {
    match state.sensor.read_humidity().await {
        Ok(humidity) => Json(HumidityResponse { humidity }).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "humidity read failed");
            Json(SensorErrorResponse {
                error: e.to_string(),
            })
            .into_response()
        }
    }
}

/// Speak a humidity reading
///
/// Thresholds a percentage into one of four fixed reports and returns it
/// synthesized. Does not touch the playback coordinator.
async fn humidity_audio(
    State(state): State<Arc<ApiState>>,
    Query(params): Query<HumidityAudioParams>,
) -> Response {
    let message = humidity_message(params.h);

    match state.synthesizer.synthesize(&message).await {
        Ok(wav) => ([(header::CONTENT_TYPE, "audio/wav")], wav).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "humidity synthesis failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
