//! Shared test utilities
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use agrovoice_gateway::api::ApiState;
use agrovoice_gateway::audio::{samples_to_wav, Normalizer, SAMPLE_RATE};
use agrovoice_gateway::{
    Answerer, Error, PlaybackCoordinator, QaPipeline, Result, SensorClient, Synthesizer,
    Transcriber,
};

/// A short silent upload in canonical WAV format
#[must_use]
pub fn silent_wav() -> Vec<u8> {
    samples_to_wav(&vec![0.0_f32; 1600], SAMPLE_RATE).expect("failed to encode test wav")
}

/// Transcriber returning a fixed transcript, or failing when `None`
pub struct FixedTranscriber {
    pub transcript: Option<String>,
}

impl FixedTranscriber {
    #[must_use]
    pub fn ok(transcript: &str) -> Self {
        Self {
            transcript: Some(transcript.to_string()),
        }
    }

    #[must_use]
    pub const fn failing() -> Self {
        Self { transcript: None }
    }
}

#[async_trait]
impl Transcriber for FixedTranscriber {
    async fn transcribe(&self, _audio: &[u8]) -> Result<String> {
        self.transcript
            .clone()
            .ok_or_else(|| Error::Stt("mock transcription failure".to_string()))
    }
}

/// What the mock answerer should do when called
pub enum AnswererBehavior {
    Reply(String),
    Empty,
    Fail,
}

/// Answerer with scripted behavior that records whether it was called
pub struct ScriptedAnswerer {
    pub behavior: AnswererBehavior,
    pub called: AtomicBool,
}

impl ScriptedAnswerer {
    #[must_use]
    pub fn new(behavior: AnswererBehavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            called: AtomicBool::new(false),
        })
    }

    #[must_use]
    pub fn was_called(&self) -> bool {
        self.called.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Answerer for ScriptedAnswerer {
    async fn answer(&self, _question: &str) -> Result<String> {
        self.called.store(true, Ordering::SeqCst);
        match &self.behavior {
            AnswererBehavior::Reply(text) => Ok(text.clone()),
            AnswererBehavior::Empty => Ok(String::new()),
            AnswererBehavior::Fail => Err(Error::Llm("mock connectivity failure".to_string())),
        }
    }
}

/// Synthesizer that returns the input text as bytes, so tests can assert
/// which message the pipeline chose without a real TTS install
pub struct EchoSynthesizer;

#[async_trait]
impl Synthesizer for EchoSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        if text.trim().is_empty() {
            return Err(Error::Tts("empty text".to_string()));
        }
        Ok(text.as_bytes().to_vec())
    }
}

/// Build a pipeline over mock collaborators
#[must_use]
pub fn build_pipeline(
    transcriber: Arc<dyn Transcriber>,
    answerer: Arc<dyn Answerer>,
) -> QaPipeline {
    QaPipeline::new(
        Normalizer::new(SAMPLE_RATE),
        transcriber,
        answerer,
        Arc::new(EchoSynthesizer),
    )
}

/// Sensor client pointed at a closed local port so reads fail fast
#[must_use]
pub fn unreachable_sensor() -> SensorClient {
    SensorClient::new(
        "http://127.0.0.1:9/humidity".to_string(),
        Duration::from_millis(200),
    )
    .expect("failed to build sensor client")
}

/// Build API state over mock collaborators
#[must_use]
pub fn build_state(
    transcriber: Arc<dyn Transcriber>,
    answerer: Arc<dyn Answerer>,
) -> Arc<ApiState> {
    Arc::new(ApiState {
        coordinator: PlaybackCoordinator::new(),
        pipeline: build_pipeline(transcriber, answerer),
        synthesizer: Arc::new(EchoSynthesizer),
        sensor: unreachable_sensor(),
    })
}

/// Build the full route set over mock collaborators
#[must_use]
pub fn build_router(state: Arc<ApiState>) -> axum::Router {
    axum::Router::new()
        .merge(agrovoice_gateway::api::qa::router(state.clone()))
        .merge(agrovoice_gateway::api::playback::router(state.clone()))
        .merge(agrovoice_gateway::api::humidity::router(state))
        .merge(agrovoice_gateway::api::health::router())
}
