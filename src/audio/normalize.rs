//! Normalization of uploaded audio to canonical PCM
//!
//! WAV and MP3 uploads are decoded in-process; anything else (typically
//! webm/ogg from a browser recorder) is handed to `ffmpeg`, which must be
//! on `PATH` for those formats to work.

use std::io::Write;

use rubato::{FftFixedIn, Resampler};

use crate::audio::{samples_to_wav, wav_to_samples};
use crate::{Error, Result};

/// Container formats the normalizer recognizes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputFormat {
    Wav,
    Mp3,
    /// Anything else, carrying the scratch-file extension for ffmpeg
    Other(&'static str),
}

/// Converts arbitrary uploaded audio into mono 16-bit WAV at a fixed rate
#[derive(Debug, Clone)]
pub struct Normalizer {
    sample_rate: u32,
}

impl Normalizer {
    /// Create a normalizer targeting the given output sample rate
    #[must_use]
    pub const fn new(sample_rate: u32) -> Self {
        Self { sample_rate }
    }

    /// Normalize raw upload bytes to canonical WAV
    ///
    /// # Errors
    ///
    /// Returns error on corrupt input, an unsupported format, or when the
    /// ffmpeg fallback is needed but unavailable
    pub async fn normalize(&self, raw: &[u8], content_type: Option<&str>) -> Result<Vec<u8>> {
        if raw.is_empty() {
            return Err(Error::Audio("empty audio upload".to_string()));
        }

        match sniff_format(raw, content_type) {
            InputFormat::Wav => self.normalize_wav(raw),
            InputFormat::Mp3 => self.normalize_mp3(raw),
            InputFormat::Other(ext) => self.normalize_via_ffmpeg(raw, ext).await,
        }
    }

    /// Decode WAV, downmix, and resample to the target rate
    fn normalize_wav(&self, data: &[u8]) -> Result<Vec<u8>> {
        let (samples, rate) = wav_to_samples(data)?;
        self.finish(samples, rate)
    }

    /// Decode MP3 frames with minimp3, then resample
    #[allow(clippy::cast_sign_loss)]
    fn normalize_mp3(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut decoder = minimp3::Decoder::new(data);
        let mut samples: Vec<f32> = Vec::new();
        let mut rate = self.sample_rate;

        loop {
            match decoder.next_frame() {
                Ok(frame) => {
                    rate = frame.sample_rate as u32;
                    if frame.channels == 2 {
                        for chunk in frame.data.chunks(2) {
                            let mono =
                                f32::midpoint(f32::from(chunk[0]), f32::from(chunk[1])) / 32768.0;
                            samples.push(mono);
                        }
                    } else {
                        for &s in &frame.data {
                            samples.push(f32::from(s) / 32768.0);
                        }
                    }
                }
                Err(minimp3::Error::Eof) => break,
                Err(e) => return Err(Error::Audio(format!("MP3 decode error: {e}"))),
            }
        }

        if samples.is_empty() {
            return Err(Error::Audio("no decodable MP3 frames".to_string()));
        }

        self.finish(samples, rate)
    }

    /// Convert an unrecognized container through ffmpeg
    async fn normalize_via_ffmpeg(&self, data: &[u8], ext: &str) -> Result<Vec<u8>> {
        let ffmpeg = which::which("ffmpeg")
            .map_err(|_| Error::Audio("ffmpeg not found on PATH".to_string()))?;

        let mut input = tempfile::Builder::new()
            .prefix("agrovoice-in-")
            .suffix(&format!(".{ext}"))
            .tempfile()?;
        input.write_all(data)?;
        input.flush()?;

        let output = tempfile::Builder::new()
            .prefix("agrovoice-out-")
            .suffix(".wav")
            .tempfile()?;

        let rate = self.sample_rate.to_string();
        let status = tokio::process::Command::new(&ffmpeg)
            .arg("-y")
            .arg("-i")
            .arg(input.path())
            .args(["-ac", "1", "-ar", rate.as_str()])
            .args(["-acodec", "pcm_s16le"])
            .arg(output.path())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()
            .await?;

        if !status.success() {
            return Err(Error::Audio(format!("ffmpeg conversion failed: {status}")));
        }

        let wav = std::fs::read(output.path())?;
        // ffmpeg already produced the target layout; re-wrap for a uniform header
        self.normalize_wav(&wav)
    }

    /// Resample if needed and encode the canonical WAV
    fn finish(&self, samples: Vec<f32>, rate: u32) -> Result<Vec<u8>> {
        let resampled = if rate == self.sample_rate {
            samples
        } else {
            resample(&samples, rate, self.sample_rate)?
        };
        samples_to_wav(&resampled, self.sample_rate)
    }
}

/// Resample mono audio with rubato
#[allow(clippy::cast_possible_truncation)]
fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    let chunk_size = 1024;
    let sub_chunks = 2;

    let mut resampler =
        FftFixedIn::<f64>::new(from_rate as usize, to_rate as usize, chunk_size, sub_chunks, 1)
            .map_err(|e| Error::Audio(format!("resampler init failed: {e}")))?;

    let input: Vec<f64> = samples.iter().map(|&s| f64::from(s)).collect();

    let mut output = Vec::new();
    for chunk in input.chunks(chunk_size) {
        let result = if chunk.len() == chunk_size {
            resampler.process(&[chunk.to_vec()], None)
        } else {
            // tail shorter than one chunk
            resampler.process_partial(Some(&[chunk.to_vec()]), None)
        }
        .map_err(|e| Error::Audio(format!("resample failed: {e}")))?;
        output.extend_from_slice(&result[0]);
    }

    Ok(output.iter().map(|&s| s as f32).collect())
}

/// Guess the container from magic bytes, falling back to the declared type
fn sniff_format(raw: &[u8], content_type: Option<&str>) -> InputFormat {
    if raw.len() >= 12 && &raw[0..4] == b"RIFF" && &raw[8..12] == b"WAVE" {
        return InputFormat::Wav;
    }
    if raw.len() >= 3 && (&raw[0..3] == b"ID3" || (raw[0] == 0xFF && raw[1] & 0xE0 == 0xE0)) {
        return InputFormat::Mp3;
    }

    let hint = content_type.unwrap_or("").to_ascii_lowercase();
    if hint.contains("wav") {
        InputFormat::Wav
    } else if hint.contains("mpeg") || hint.contains("mp3") {
        InputFormat::Mp3
    } else if hint.contains("ogg") || hint.contains("opus") {
        InputFormat::Other("ogg")
    } else {
        // browser MediaRecorder default
        InputFormat::Other("webm")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::SAMPLE_RATE;

    #[test]
    fn sniffs_wav_magic_over_hint() {
        let wav = samples_to_wav(&[0.0; 16], SAMPLE_RATE).unwrap();
        assert_eq!(sniff_format(&wav, Some("audio/webm")), InputFormat::Wav);
    }

    #[test]
    fn sniffs_mp3_magic() {
        assert_eq!(sniff_format(b"ID3\x04rest", None), InputFormat::Mp3);
        assert_eq!(sniff_format(&[0xFF, 0xFB, 0x90, 0x00], None), InputFormat::Mp3);
    }

    #[test]
    fn falls_back_to_declared_type() {
        assert_eq!(
            sniff_format(b"\x1aEv\x00", Some("audio/wav")),
            InputFormat::Wav
        );
        assert_eq!(
            sniff_format(b"\x1aEv\x00", Some("audio/ogg; codecs=opus")),
            InputFormat::Other("ogg")
        );
        assert_eq!(sniff_format(b"\x1aEv\x00", None), InputFormat::Other("webm"));
    }

    #[tokio::test]
    async fn passthrough_wav_at_target_rate() {
        let normalizer = Normalizer::new(SAMPLE_RATE);
        let wav = samples_to_wav(&vec![0.25_f32; 320], SAMPLE_RATE).unwrap();

        let out = normalizer.normalize(&wav, Some("audio/wav")).await.unwrap();
        let (samples, rate) = wav_to_samples(&out).unwrap();
        assert_eq!(rate, SAMPLE_RATE);
        assert_eq!(samples.len(), 320);
    }

    #[tokio::test]
    async fn resamples_to_target_rate() {
        let normalizer = Normalizer::new(SAMPLE_RATE);
        // one second of 8 kHz audio
        let wav = samples_to_wav(&vec![0.1_f32; 8000], 8000).unwrap();

        let out = normalizer.normalize(&wav, Some("audio/wav")).await.unwrap();
        let (samples, rate) = wav_to_samples(&out).unwrap();
        assert_eq!(rate, SAMPLE_RATE);
        // roughly one second at the new rate (the FFT resampler carries
        // a small amount of filter delay)
        let expected = SAMPLE_RATE as usize;
        assert!(
            samples.len() > expected * 3 / 4 && samples.len() < expected * 5 / 4,
            "unexpected resampled length: {}",
            samples.len()
        );
    }

    #[tokio::test]
    async fn empty_upload_is_rejected() {
        let normalizer = Normalizer::new(SAMPLE_RATE);
        assert!(normalizer.normalize(&[], None).await.is_err());
    }
}
