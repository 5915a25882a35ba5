//! Audio handling
//!
//! Uploads arrive in whatever container the client recorder produced
//! (WAV, MP3, webm/ogg). Everything is normalized to canonical PCM —
//! mono, 16 kHz, 16-bit — before STT, and synthesized speech is brought
//! to the same format before playback.

mod normalize;
mod wav;

pub use crate::config::SAMPLE_RATE;
pub use normalize::Normalizer;
pub use wav::{samples_to_wav, wav_to_samples};
