//! Question-answering pipeline
//!
//! Sequences normalize → transcribe → answer → synthesize. The caller is a
//! voice-only client with no way to render an error, so every anticipated
//! failure is replaced by a fixed spoken message and the pipeline still
//! returns audio.

use std::sync::Arc;

use crate::audio::Normalizer;
use crate::llm::Answerer;
use crate::stt::Transcriber;
use crate::tts::Synthesizer;
use crate::Result;

/// Spoken apology when the upload cannot be converted
pub const MSG_CONVERSION_FAILED: &str =
    "No pude convertir el audio. Instala FFmpeg y vuelve a intentar.";

/// Spoken prompt when nothing intelligible was transcribed
pub const MSG_NOT_UNDERSTOOD: &str =
    "No te entendí bien. Repite la pregunta más cerca del micrófono.";

/// Spoken fallback when the model returned an empty answer
pub const MSG_UNSURE: &str = "No estoy seguro. Intenta reformular.";

/// Spoken diagnosis when the local model endpoint is unreachable
pub const MSG_LLM_DOWN: &str =
    "La IA local no respondió. Asegúrate de que Ollama está en ejecución.";

/// Orchestrates the four stages of the question-answering flow
pub struct QaPipeline {
    normalizer: Normalizer,
    transcriber: Arc<dyn Transcriber>,
    answerer: Arc<dyn Answerer>,
    synthesizer: Arc<dyn Synthesizer>,
}

impl QaPipeline {
    /// Create a pipeline over the given collaborators
    #[must_use]
    pub fn new(
        normalizer: Normalizer,
        transcriber: Arc<dyn Transcriber>,
        answerer: Arc<dyn Answerer>,
        synthesizer: Arc<dyn Synthesizer>,
    ) -> Self {
        Self {
            normalizer,
            transcriber,
            answerer,
            synthesizer,
        }
    }

    /// Run the full flow and return the synthesized answer as WAV bytes
    ///
    /// # Errors
    ///
    /// Returns error only if synthesis itself fails; every earlier stage
    /// failure becomes a spoken fallback message instead
    pub async fn run(&self, raw: &[u8], content_type: Option<&str>) -> Result<Vec<u8>> {
        let text = self.spoken_answer(raw, content_type).await;
        self.synthesizer.synthesize(&text).await
    }

    /// Decide what the assistant should say for this upload
    async fn spoken_answer(&self, raw: &[u8], content_type: Option<&str>) -> String {
        let wav = match self.normalizer.normalize(raw, content_type).await {
            Ok(wav) => wav,
            Err(e) => {
                tracing::warn!(error = %e, "audio conversion failed");
                return MSG_CONVERSION_FAILED.to_string();
            }
        };

        // a failed transcription reads the same as silence
        let transcript = self
            .transcriber
            .transcribe(&wav)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "transcription failed");
                String::new()
            });

        if transcript.trim().is_empty() {
            return MSG_NOT_UNDERSTOOD.to_string();
        }
        tracing::info!(transcript = %transcript, "question recognized");

        match self.answerer.answer(transcript.trim()).await {
            Ok(answer) if answer.trim().is_empty() => MSG_UNSURE.to_string(),
            Ok(answer) => answer,
            Err(e) => {
                tracing::error!(error = %e, "answer generation failed");
                MSG_LLM_DOWN.to_string()
            }
        }
    }
}
