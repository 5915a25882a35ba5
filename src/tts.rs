//! Text-to-speech (TTS) processing
//!
//! Synthesis runs through an espeak-ng-compatible binary so the gateway
//! speaks without any network dependency. The synthesizer's native output
//! rate varies by build, so every result is re-normalized to canonical PCM.

use async_trait::async_trait;

use crate::audio::Normalizer;
use crate::{Error, Result};

/// Synthesizes speech from text
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Synthesize text into canonical WAV bytes
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>>;
}

/// Local subprocess-based speech synthesizer
pub struct EspeakTts {
    bin: String,
    voice: String,
    normalizer: Normalizer,
}

impl EspeakTts {
    /// Create a new synthesizer
    ///
    /// The binary is looked up on `PATH` at construction so a missing
    /// installation is reported at startup rather than mid-request.
    ///
    /// # Errors
    ///
    /// Returns error if the synthesizer binary cannot be found
    pub fn new(bin: String, voice: String, sample_rate: u32) -> Result<Self> {
        which::which(&bin)
            .map_err(|_| Error::Config(format!("TTS binary not found on PATH: {bin}")))?;

        Ok(Self {
            bin,
            voice,
            normalizer: Normalizer::new(sample_rate),
        })
    }
}

#[async_trait]
impl Synthesizer for EspeakTts {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        if text.trim().is_empty() {
            return Err(Error::Tts("empty text".to_string()));
        }

        let output = tempfile::Builder::new()
            .prefix("agrovoice-tts-")
            .suffix(".wav")
            .tempfile()?;

        tracing::debug!(chars = text.len(), voice = %self.voice, "synthesizing speech");

        let status = tokio::process::Command::new(&self.bin)
            .args(["-v", self.voice.as_str()])
            .arg("-w")
            .arg(output.path())
            .arg(text)
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()
            .await?;

        if !status.success() {
            return Err(Error::Tts(format!("{} exited with {status}", self.bin)));
        }

        let wav = std::fs::read(output.path())?;
        if wav.is_empty() {
            return Err(Error::Tts("synthesizer produced no audio".to_string()));
        }

        // espeak-ng emits 22.05 kHz mono; bring it to the canonical rate
        self.normalizer.normalize(&wav, Some("audio/wav")).await
    }
}
