//! MP3 encoding via libmp3lame.

use mp3lame_encoder::{Bitrate, Builder, FlushNoGap, InterleavedPcm, Quality};

use crate::error::{MelodyError, Result};

/// Sample rates the MP3 encoder accepts.
pub const MP3_SAMPLE_RATES: &[u32] = &[8000, 11025, 12000, 16000, 22050, 24000, 32000, 44100, 48000];

/// Maps a kbps value to the encoder's bitrate setting.
pub fn bitrate_from_kbps(kbps: u32) -> Option<Bitrate> {
    let bitrate = match kbps {
        8 => Bitrate::Kbps8,
        16 => Bitrate::Kbps16,
        24 => Bitrate::Kbps24,
        32 => Bitrate::Kbps32,
        40 => Bitrate::Kbps40,
        48 => Bitrate::Kbps48,
        64 => Bitrate::Kbps64,
        80 => Bitrate::Kbps80,
        96 => Bitrate::Kbps96,
        112 => Bitrate::Kbps112,
        128 => Bitrate::Kbps128,
        160 => Bitrate::Kbps160,
        192 => Bitrate::Kbps192,
        224 => Bitrate::Kbps224,
        256 => Bitrate::Kbps256,
        320 => Bitrate::Kbps320,
        _ => return None,
    };
    Some(bitrate)
}

/// Encodes interleaved stereo f32 samples to MP3 bytes at a constant bitrate.
///
/// `samples` must be interleaved stereo: `[L, R, L, R, ...]`.
pub fn encode_mp3(samples: &[f32], sample_rate: u32, bitrate_kbps: u32) -> Result<Vec<u8>> {
    let bitrate = bitrate_from_kbps(bitrate_kbps).ok_or_else(|| {
        MelodyError::mix_failed(format!("Unsupported MP3 bitrate: {} kbps", bitrate_kbps))
    })?;
    if !MP3_SAMPLE_RATES.contains(&sample_rate) {
        return Err(MelodyError::mix_failed(format!(
            "Unsupported MP3 sample rate: {} Hz",
            sample_rate
        )));
    }
    if samples.len() % 2 != 0 {
        return Err(MelodyError::mix_failed(
            "MP3 encoder expects interleaved stereo samples",
        ));
    }

    let mut encoder = Builder::new()
        .ok_or_else(|| MelodyError::mix_failed("Failed to create LAME encoder"))?
        .with_num_channels(2)
        .map_err(|e| MelodyError::mix_failed(format!("LAME set_num_channels failed: {e:?}")))?
        .with_sample_rate(sample_rate)
        .map_err(|e| MelodyError::mix_failed(format!("LAME set_sample_rate failed: {e:?}")))?
        .with_brate(bitrate)
        .map_err(|e| MelodyError::mix_failed(format!("LAME set_brate failed: {e:?}")))?
        .with_quality(Quality::Best)
        .map_err(|e| MelodyError::mix_failed(format!("LAME set_quality failed: {e:?}")))?
        .build()
        .map_err(|e| MelodyError::mix_failed(format!("LAME build failed: {e:?}")))?;

    let frames = samples.len() / 2;
    let mut buf = Vec::new();
    buf.reserve(mp3lame_encoder::max_required_buffer_size(frames));

    let encoded_size = encoder
        .encode(InterleavedPcm(samples), buf.spare_capacity_mut())
        .map_err(|e| MelodyError::mix_failed(format!("LAME encode failed: {e:?}")))?;
    // SAFETY: encode filled exactly `encoded_size` bytes into spare capacity.
    unsafe { buf.set_len(encoded_size) };

    let flush_size = encoder
        .flush::<FlushNoGap>(buf.spare_capacity_mut())
        .map_err(|e| MelodyError::mix_failed(format!("LAME flush failed: {e:?}")))?;
    // SAFETY: flush filled exactly `flush_size` bytes into spare capacity.
    unsafe { buf.set_len(buf.len() + flush_size) };

    Ok(buf)
}
