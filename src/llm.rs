//! Answer generation via a local Ollama endpoint

use std::time::Duration;

use async_trait::async_trait;

use crate::{Error, Result};

/// Fixed agronomy system prompt prepended to every question
const SYSTEM_PROMPT: &str = "Eres un asistente técnico de agricultura, Te llamas AgroWaly. \
    Responde en español peruano, breve (2 a 3 frases), con consejos prácticos y seguros. \
    Si no sabes, dilo y sugiere alternativa. Pero no inventes información falsa ni \
    respondas más de lo que te pregunte.\n";

/// How long to wait for a completion before treating the model as down
const GENERATE_TIMEOUT: Duration = Duration::from_secs(60);

/// Produces a short natural-language answer for a transcribed question
#[async_trait]
pub trait Answerer: Send + Sync {
    /// Answer a question; empty string means the model had nothing usable
    async fn answer(&self, question: &str) -> Result<String>;
}

/// Request body for Ollama `/api/generate`
#[derive(serde::Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

/// Response body from Ollama `/api/generate`
#[derive(serde::Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

/// Client for a local-network Ollama text-generation endpoint
pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    /// Create a new Ollama client
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be constructed
    pub fn new(base_url: String, model: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(GENERATE_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url,
            model,
        })
    }
}

#[async_trait]
impl Answerer for OllamaClient {
    async fn answer(&self, question: &str) -> Result<String> {
        let request = GenerateRequest {
            model: &self.model,
            prompt: build_prompt(question),
            temperature: 0.6,
            max_tokens: 100,
            stream: false,
        };

        let url = format!("{}/api/generate", self.base_url.trim_end_matches('/'));
        tracing::debug!(model = %self.model, "sending question to Ollama");

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Ollama request failed");
                e
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Ollama error");
            return Err(Error::Llm(format!("Ollama error {status}: {body}")));
        }

        let result: GenerateResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse Ollama response");
            e
        })?;

        let answer = clean_answer(&result.response);
        tracing::info!(answer = %answer, "answer generated");
        Ok(answer)
    }
}

/// Build the full generation prompt for a question
fn build_prompt(question: &str) -> String {
    format!("{SYSTEM_PROMPT}\n\nPregunta:¿{question}?")
}

/// Flatten newlines and trim model output for speech synthesis
fn clean_answer(raw: &str) -> String {
    raw.replace('\n', " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_carries_system_text_and_question() {
        let prompt = build_prompt("cuándo riego el maíz");
        assert!(prompt.starts_with(SYSTEM_PROMPT));
        assert!(prompt.ends_with("Pregunta:¿cuándo riego el maíz?"));
    }

    #[test]
    fn answers_are_flattened_for_speech() {
        assert_eq!(
            clean_answer("  Riega al amanecer.\nEvita el mediodía.  "),
            "Riega al amanecer. Evita el mediodía."
        );
        assert_eq!(clean_answer("\n\n"), "");
    }
}
