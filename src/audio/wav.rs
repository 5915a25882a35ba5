//! WAV encode/decode helpers for canonical PCM buffers

use crate::{Error, Result};

/// Convert f32 samples to mono 16-bit WAV bytes
///
/// # Errors
///
/// Returns error if WAV encoding fails
pub fn samples_to_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer =
            hound::WavWriter::new(&mut cursor, spec).map_err(|e| Error::Audio(e.to_string()))?;

        for &sample in samples {
            // f32 [-1.0, 1.0] to i16
            #[allow(clippy::cast_possible_truncation)]
            let sample_i16 = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
            writer
                .write_sample(sample_i16)
                .map_err(|e| Error::Audio(e.to_string()))?;
        }

        writer.finalize().map_err(|e| Error::Audio(e.to_string()))?;
    }

    Ok(cursor.into_inner())
}

/// Decode WAV bytes to mono f32 samples plus the source sample rate
///
/// Multi-channel input is downmixed by averaging. Integer sample widths up
/// to 32 bits and IEEE float are accepted.
///
/// # Errors
///
/// Returns error on malformed WAV data or an unsupported sample format
pub fn wav_to_samples(data: &[u8]) -> Result<(Vec<f32>, u32)> {
    let mut reader = hound::WavReader::new(std::io::Cursor::new(data))
        .map_err(|e| Error::Audio(format!("WAV parse error: {e}")))?;
    let spec = reader.spec();
    let channels = usize::from(spec.channels.max(1));

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| Error::Audio(format!("WAV read error: {e}")))?,
        hound::SampleFormat::Int => {
            let max = f32::from(i16::MAX);
            match spec.bits_per_sample {
                16 => reader
                    .samples::<i16>()
                    .map(|s| s.map(|v| f32::from(v) / max))
                    .collect::<std::result::Result<_, _>>()
                    .map_err(|e| Error::Audio(format!("WAV read error: {e}")))?,
                bits if bits <= 32 => {
                    #[allow(clippy::cast_precision_loss)]
                    let scale = (1_i64 << (bits - 1)) as f32;
                    reader
                        .samples::<i32>()
                        .map(|s| {
                            #[allow(clippy::cast_precision_loss)]
                            s.map(|v| v as f32 / scale)
                        })
                        .collect::<std::result::Result<_, _>>()
                        .map_err(|e| Error::Audio(format!("WAV read error: {e}")))?
                }
                bits => {
                    return Err(Error::Audio(format!("unsupported WAV bit depth: {bits}")));
                }
            }
        }
    };

    let mono = if channels == 1 {
        interleaved
    } else {
        #[allow(clippy::cast_precision_loss)]
        let divisor = channels as f32;
        interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / divisor)
            .collect()
    };

    Ok((mono, spec.sample_rate))
}
