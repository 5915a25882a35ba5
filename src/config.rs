//! Configuration management for the agrovoice gateway
//!
//! All settings are environment-sourced with defaults matching a
//! single-board field deployment. A `.env` file is honored when present.

use std::path::PathBuf;
use std::time::Duration;

use crate::{Error, Result};

/// Canonical audio sample rate used across normalization, STT, and TTS
pub const SAMPLE_RATE: u32 = 16_000;

/// Gateway configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Ollama base URL (e.g. `http://localhost:11434`)
    pub ollama_url: String,

    /// Ollama model identifier
    pub ollama_model: String,

    /// Speech-to-text configuration
    pub stt: SttConfig,

    /// Text-to-speech configuration
    pub tts: TtsConfig,

    /// Humidity sensor configuration
    pub sensor: SensorConfig,

    /// Path to the companion web client, if served by this process
    pub static_dir: Option<PathBuf>,
}

/// Speech-to-text configuration
#[derive(Debug, Clone)]
pub struct SttConfig {
    /// Use the local whisper server instead of the remote Google backend
    pub use_local: bool,

    /// BCP-47 language tag passed to the transcriber (e.g. "es-PE")
    pub language: String,

    /// Base URL of the local whisper server
    pub whisper_url: String,

    /// Google Speech API key (remote backend only)
    pub google_api_key: Option<String>,
}

/// Text-to-speech configuration
#[derive(Debug, Clone)]
pub struct TtsConfig {
    /// Synthesizer binary (espeak-ng compatible)
    pub bin: String,

    /// Voice identifier passed to the synthesizer
    pub voice: String,
}

/// Humidity sensor configuration
#[derive(Debug, Clone)]
pub struct SensorConfig {
    /// Full URL of the sensor's humidity endpoint
    pub url: String,

    /// Request timeout; elapsed timeouts are reported as sensor failures
    pub timeout: Duration,
}

impl Config {
    /// Load configuration from the environment
    ///
    /// # Errors
    ///
    /// Returns error if a set variable fails to parse
    pub fn from_env() -> Result<Self> {
        let use_local = match std::env::var("USE_LOCAL_STT") {
            Ok(v) => parse_flag(&v)
                .ok_or_else(|| Error::Config(format!("invalid USE_LOCAL_STT: {v}")))?,
            Err(_) => true,
        };

        let timeout_secs = match std::env::var("SENSOR_TIMEOUT_SECS") {
            Ok(v) => v
                .parse::<u64>()
                .map_err(|e| Error::Config(format!("invalid SENSOR_TIMEOUT_SECS: {e}")))?,
            Err(_) => 5,
        };

        let static_dir = std::env::var("STATIC_DIR").ok().map(PathBuf::from);

        Ok(Self {
            ollama_url: env_or("OLLAMA_URL", "http://localhost:11434"),
            ollama_model: env_or("OLLAMA_MODEL", "gemma3:1b"),
            stt: SttConfig {
                use_local,
                language: env_or("LANG_STT", "es-PE"),
                whisper_url: env_or("WHISPER_URL", "http://localhost:8178"),
                google_api_key: std::env::var("GOOGLE_STT_API_KEY").ok(),
            },
            tts: TtsConfig {
                bin: env_or("TTS_BIN", "espeak-ng"),
                voice: env_or("TTS_VOICE", "es"),
            },
            sensor: SensorConfig {
                url: env_or("SENSOR_URL", "http://192.168.18.42:80/humidity"),
                timeout: Duration::from_secs(timeout_secs),
            },
            static_dir,
        })
    }
}

/// Read an environment variable with a fallback default
fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse a boolean-ish flag ("1"/"0", "true"/"false", "yes"/"no")
fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
