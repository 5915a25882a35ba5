//! Agrovoice Gateway - Voice question-answering backend for a field assistant
//!
//! This library provides the core functionality for the agrovoice gateway:
//! - Audio normalization to canonical PCM (16 kHz mono)
//! - Speech-to-text against a local whisper server or Google Speech
//! - Answer generation via a local Ollama endpoint
//! - Speech synthesis and shared playback with cancelable streaming
//! - Soil-humidity reporting from a network sensor
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                  HTTP interface                      │
//! │   /qa  │  /play  /stop  /check_audio  │  humidity   │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                 QA pipeline                          │
//! │  Normalize │ Transcribe │ Answer │ Synthesize        │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │            Playback coordinator                      │
//! │   single answer slot │ chunked, cancelable stream    │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod audio;
pub mod config;
pub mod error;
pub mod llm;
pub mod playback;
pub mod qa;
pub mod sensor;
pub mod stt;
pub mod tts;

pub use config::Config;
pub use error::{Error, Result};
pub use llm::{Answerer, OllamaClient};
pub use playback::{PlaybackCoordinator, PlaybackStatus};
pub use qa::QaPipeline;
pub use sensor::{HumidityLevel, SensorClient};
pub use stt::{SpeechToText, Transcriber};
pub use tts::{EspeakTts, Synthesizer};
