//! Speech-to-text (STT) processing
//!
//! Two backends in one client: a local whisper-style HTTP server (the
//! default for field deployments with no uplink) and Google Speech for
//! installations that prefer the hosted recognizer. Both return an empty
//! transcript, not an error, when nothing intelligible was detected.

use async_trait::async_trait;
use base64::Engine as _;

use crate::{Error, Result};

/// Transcribes canonical PCM audio into text
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe WAV audio to text; empty string means nothing detected
    async fn transcribe(&self, audio: &[u8]) -> Result<String>;
}

/// Response from a whisper-server `/inference` call
#[derive(serde::Deserialize)]
struct WhisperResponse {
    text: String,
}

/// Response from the Google Speech `speech:recognize` API
#[derive(serde::Deserialize)]
struct GoogleResponse {
    #[serde(default)]
    results: Vec<GoogleResult>,
}

#[derive(serde::Deserialize)]
struct GoogleResult {
    #[serde(default)]
    alternatives: Vec<GoogleAlternative>,
}

#[derive(serde::Deserialize)]
struct GoogleAlternative {
    #[serde(default)]
    transcript: String,
}

/// STT provider backend
#[derive(Clone, Debug)]
enum SttProvider {
    /// whisper.cpp-style server reachable at the given base URL
    WhisperServer { base_url: String },
    /// Google Speech API with the given key
    Google { api_key: String },
}

/// Transcribes speech to text
pub struct SpeechToText {
    client: reqwest::Client,
    language: String,
    sample_rate: u32,
    provider: SttProvider,
}

impl SpeechToText {
    /// Create an STT instance backed by a local whisper server
    ///
    /// # Errors
    ///
    /// Returns error if the server URL is empty
    pub fn new_whisper_server(base_url: String, language: String, sample_rate: u32) -> Result<Self> {
        if base_url.is_empty() {
            return Err(Error::Config(
                "whisper server URL required for local STT".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            language,
            sample_rate,
            provider: SttProvider::WhisperServer { base_url },
        })
    }

    /// Create an STT instance backed by Google Speech
    ///
    /// # Errors
    ///
    /// Returns error if the API key is empty
    pub fn new_google(api_key: String, language: String, sample_rate: u32) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "Google API key required for remote STT".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            language,
            sample_rate,
            provider: SttProvider::Google { api_key },
        })
    }

    /// Transcribe against the local whisper server
    async fn transcribe_whisper(&self, base_url: &str, audio: &[u8]) -> Result<String> {
        tracing::debug!(audio_bytes = audio.len(), "starting whisper transcription");

        // whisper takes the primary subtag only
        let language = self
            .language
            .split('-')
            .next()
            .unwrap_or(&self.language)
            .to_string();

        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(audio.to_vec())
                    .file_name("audio.wav")
                    .mime_str("audio/wav")
                    .map_err(|e| Error::Stt(e.to_string()))?,
            )
            .text("language", language)
            .text("response_format", "json");

        let url = format!("{}/inference", base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "whisper request failed");
                e
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "whisper server error");
            return Err(Error::Stt(format!("whisper server error {status}: {body}")));
        }

        let result: WhisperResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse whisper response");
            e
        })?;

        let transcript = result.text.trim().to_string();
        tracing::info!(transcript = %transcript, "transcription complete");
        Ok(transcript)
    }

    /// Transcribe against Google Speech
    async fn transcribe_google(&self, api_key: &str, audio: &[u8]) -> Result<String> {
        tracing::debug!(audio_bytes = audio.len(), "starting Google transcription");

        let body = serde_json::json!({
            "config": {
                "encoding": "LINEAR16",
                "sampleRateHertz": self.sample_rate,
                "languageCode": self.language,
            },
            "audio": {
                "content": base64::engine::general_purpose::STANDARD.encode(audio),
            },
        });

        let url = format!("https://speech.googleapis.com/v1/speech:recognize?key={api_key}");
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Google Speech request failed");
                e
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Google Speech error");
            return Err(Error::Stt(format!("Google Speech error {status}: {body}")));
        }

        let result: GoogleResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse Google response");
            e
        })?;

        // no results means silence, which is not an error
        let transcript = collect_transcript(&result);
        tracing::info!(transcript = %transcript, "transcription complete");
        Ok(transcript)
    }
}

#[async_trait]
impl Transcriber for SpeechToText {
    async fn transcribe(&self, audio: &[u8]) -> Result<String> {
        match &self.provider {
            SttProvider::WhisperServer { base_url } => {
                self.transcribe_whisper(base_url, audio).await
            }
            SttProvider::Google { api_key } => self.transcribe_google(api_key, audio).await,
        }
    }
}

/// Join the best alternative of every result segment
fn collect_transcript(response: &GoogleResponse) -> String {
    response
        .results
        .iter()
        .filter_map(|r| r.alternatives.first())
        .map(|a| a.transcript.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn google_transcript_segments_are_joined() {
        let response: GoogleResponse = serde_json::from_str(
            r#"{"results": [
                {"alternatives": [{"transcript": " cuándo riego "}]},
                {"alternatives": [{"transcript": "el maíz"}, {"transcript": "ignored"}]}
            ]}"#,
        )
        .unwrap();

        assert_eq!(collect_transcript(&response), "cuándo riego el maíz");
    }

    #[test]
    fn google_silence_yields_empty_transcript() {
        let response: GoogleResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(collect_transcript(&response), "");
    }

    #[test]
    fn empty_credentials_are_rejected() {
        assert!(SpeechToText::new_whisper_server(String::new(), "es-PE".into(), 16_000).is_err());
        assert!(SpeechToText::new_google(String::new(), "es-PE".into(), 16_000).is_err());
    }
}
