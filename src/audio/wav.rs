//! WAV decoding and encoding.
//!
//! Converts WAV bytes to interleaved f32 PCM and back using the hound crate.

use std::io::Cursor;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use crate::error::{MelodyError, Result};

/// Decoded, interleaved PCM audio normalized to [-1.0, 1.0].
#[derive(Debug, Clone, PartialEq)]
pub struct PcmAudio {
    /// Interleaved samples: `[L, R, L, R, ...]` for stereo.
    pub samples: Vec<f32>,
    /// Number of interleaved channels.
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

impl PcmAudio {
    /// Number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / self.channels as usize
        }
    }

    /// Duration in seconds.
    pub fn duration_sec(&self) -> f32 {
        samples_to_duration(self.frames(), self.sample_rate)
    }

    /// Shortens the audio to at most `frames` frames.
    pub fn truncate_frames(&mut self, frames: usize) {
        self.samples.truncate(frames * self.channels as usize);
    }
}

/// Decodes WAV bytes into interleaved f32 samples.
///
/// Integer formats of 8 to 32 bits and 32-bit float are supported.
pub fn decode_wav(bytes: &[u8]) -> Result<PcmAudio> {
    let reader = WavReader::new(Cursor::new(bytes))
        .map_err(|e| MelodyError::mix_failed(format!("Failed to read WAV header: {}", e)))?;
    let spec = reader.spec();

    if spec.channels == 0 {
        return Err(MelodyError::mix_failed("WAV declares zero channels"));
    }
    if spec.sample_rate == 0 {
        return Err(MelodyError::mix_failed("WAV declares a zero sample rate"));
    }

    let samples: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, 32) => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| MelodyError::mix_failed(format!("Failed to read sample: {}", e)))?,
        (SampleFormat::Int, bits @ 8..=32) => {
            let scale = (1i64 << (bits - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<std::result::Result<_, _>>()
                .map_err(|e| MelodyError::mix_failed(format!("Failed to read sample: {}", e)))?
        }
        (format, bits) => {
            return Err(MelodyError::mix_failed(format!(
                "Unsupported WAV sample format: {:?} {} bits",
                format, bits
            )))
        }
    };

    Ok(PcmAudio {
        samples,
        channels: spec.channels,
        sample_rate: spec.sample_rate,
    })
}

/// Writes interleaved samples to an in-memory 32-bit float WAV buffer.
///
/// Returns the WAV file contents as a byte vector.
pub fn write_wav_to_buffer(samples: &[f32], channels: u16, sample_rate: u32) -> Result<Vec<u8>> {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec).map_err(|e| {
            MelodyError::mix_failed(format!("Failed to create WAV writer: {}", e))
        })?;

        for sample in samples {
            writer.write_sample(*sample).map_err(|e| {
                MelodyError::mix_failed(format!("Failed to write sample: {}", e))
            })?;
        }

        writer.finalize().map_err(|e| {
            MelodyError::mix_failed(format!("Failed to finalize WAV buffer: {}", e))
        })?;
    }

    Ok(cursor.into_inner())
}

/// Calculates the duration of audio in seconds from frame count.
pub fn samples_to_duration(frame_count: usize, sample_rate: u32) -> f32 {
    if sample_rate == 0 {
        return 0.0;
    }
    frame_count as f32 / sample_rate as f32
}
