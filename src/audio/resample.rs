//! Audio resampling.
//!
//! Brings the vocal track to the instrumental's sample rate before mixing.

use rubato::{FftFixedIn, Resampler};

use crate::error::{MelodyError, Result};

use super::wav::PcmAudio;

/// Frames fed to the resampler per call.
const CHUNK_SIZE: usize = 1024;

/// Resamples interleaved audio to `to_rate`.
///
/// Uses FFT-based resampling on each channel. The output length is
/// `frames * to_rate / from_rate`, rounded.
pub fn resample(audio: &PcmAudio, to_rate: u32) -> Result<PcmAudio> {
    if audio.sample_rate == to_rate || audio.samples.is_empty() {
        return Ok(PcmAudio {
            samples: audio.samples.clone(),
            channels: audio.channels,
            sample_rate: to_rate,
        });
    }

    let channels = audio.channels as usize;
    let frames = audio.frames();

    let mut resampler = FftFixedIn::<f32>::new(
        audio.sample_rate as usize,
        to_rate as usize,
        CHUNK_SIZE,
        2,
        channels,
    )
    .map_err(|e| MelodyError::mix_failed(format!("Failed to create resampler: {}", e)))?;

    // De-interleave
    let planar: Vec<Vec<f32>> = (0..channels)
        .map(|c| audio.samples.iter().skip(c).step_by(channels).copied().collect())
        .collect();

    // The FFT resampler emits `delay` frames of latency before the signal
    // starts; keep feeding padded chunks until the delayed tail is out too.
    let delay = resampler.output_delay();
    let expected = (frames as f64 * to_rate as f64 / audio.sample_rate as f64).round() as usize;
    let needed = delay + expected;

    let mut output: Vec<Vec<f32>> = vec![Vec::new(); channels];
    let input_frames = resampler.input_frames_next();
    let mut position = 0;

    while output.iter().map(Vec::len).min().unwrap_or(0) < needed {
        let start = position.min(frames);
        let end = (position + input_frames).min(frames);
        let chunk: Vec<Vec<f32>> = planar
            .iter()
            .map(|ch| {
                let mut c = ch[start..end].to_vec();
                // Pad the last chunk
                c.resize(input_frames, 0.0);
                c
            })
            .collect();

        let resampled = resampler
            .process(&chunk, None)
            .map_err(|e| MelodyError::mix_failed(format!("Resampling failed: {}", e)))?;

        for (out, res) in output.iter_mut().zip(resampled) {
            out.extend_from_slice(&res);
        }
        position += input_frames;
    }

    let out_frames = expected;
    let mut samples = Vec::with_capacity(out_frames * channels);
    for i in delay..delay + out_frames {
        for ch in &output {
            samples.push(ch[i]);
        }
    }

    Ok(PcmAudio {
        samples,
        channels: audio.channels,
        sample_rate: to_rate,
    })
}
