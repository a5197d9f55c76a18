//! Two-track mixer: vocals over instrumental, encoded to MP3.
//!
//! The mix never exceeds the shorter input: both tracks are cut to the
//! same length, gain-staged with fixed offsets and summed sample by sample.

use tracing::debug;

use crate::config::MixConfig;
use crate::error::{MelodyError, Result};
use crate::types::{AudioAsset, AudioFormat, Stage};

use super::mp3::{encode_mp3, MP3_SAMPLE_RATES};
use super::resample::resample;
use super::wav::{decode_wav, PcmAudio};

/// Sample rate used when the instrumental's rate cannot be encoded.
const FALLBACK_SAMPLE_RATE: u32 = 44100;

/// Converts a gain in decibels to a linear amplitude factor.
pub fn db_to_linear(db: f32) -> f32 {
    10f32.powf(db / 20.0)
}

/// Mixes vocals and instrumental into one MP3 asset.
#[derive(Debug, Clone)]
pub struct AudioMixer {
    vocal_gain: f32,
    instrumental_gain: f32,
    bitrate_kbps: u32,
}

impl AudioMixer {
    pub fn new(config: &MixConfig) -> Self {
        Self {
            vocal_gain: db_to_linear(config.vocal_gain_db),
            instrumental_gain: db_to_linear(config.instrumental_gain_db),
            bitrate_kbps: config.bitrate_kbps,
        }
    }

    /// Mixes the two assets.
    ///
    /// Both inputs must be WAV. The result is stereo MP3 at the
    /// instrumental's sample rate (or 44.1kHz if the encoder cannot use it),
    /// lasting as long as the shorter input.
    pub fn mix(&self, vocals: &AudioAsset, instrumental: &AudioAsset) -> Result<AudioAsset> {
        let vocals = decode_asset(vocals)?;
        let instrumental = decode_asset(instrumental)?;

        let target_rate = if MP3_SAMPLE_RATES.contains(&instrumental.sample_rate) {
            instrumental.sample_rate
        } else {
            FALLBACK_SAMPLE_RATE
        };

        let vocals = resample(&to_stereo(vocals), target_rate)?;
        let instrumental = resample(&to_stereo(instrumental), target_rate)?;

        let mixed = self.mix_pcm(vocals, instrumental);
        debug!(
            frames = mixed.frames(),
            sample_rate = mixed.sample_rate,
            "Encoding mix to MP3 at {} kbps",
            self.bitrate_kbps
        );

        let duration = mixed.duration_sec();
        let bytes = encode_mp3(&mixed.samples, mixed.sample_rate, self.bitrate_kbps)?;
        Ok(AudioAsset::new(Stage::Mix, AudioFormat::Mp3, bytes).with_duration_hint(duration))
    }

    /// Trims, gain-stages and overlays two tracks of identical layout.
    ///
    /// Output samples are clamped to full scale.
    pub fn mix_pcm(&self, mut vocals: PcmAudio, mut instrumental: PcmAudio) -> PcmAudio {
        debug_assert_eq!(vocals.channels, instrumental.channels);
        debug_assert_eq!(vocals.sample_rate, instrumental.sample_rate);

        let target_frames = vocals.frames().min(instrumental.frames());
        vocals.truncate_frames(target_frames);
        instrumental.truncate_frames(target_frames);

        let samples = vocals
            .samples
            .iter()
            .zip(&instrumental.samples)
            .map(|(v, i)| (v * self.vocal_gain + i * self.instrumental_gain).clamp(-1.0, 1.0))
            .collect();

        PcmAudio {
            samples,
            channels: instrumental.channels,
            sample_rate: instrumental.sample_rate,
        }
    }
}

/// Decodes an asset, checking that its bytes match the declared format.
///
/// A WAV without any audio frames is rejected.
fn decode_asset(asset: &AudioAsset) -> Result<PcmAudio> {
    match (asset.format(), AudioFormat::sniff(asset.bytes())) {
        (AudioFormat::Wav, Some(AudioFormat::Wav)) => {
            let audio = decode_wav(asset.bytes())?;
            if audio.frames() == 0 {
                return Err(MelodyError::mix_failed(format!(
                    "{} asset contains no audio frames",
                    asset.stage()
                )));
            }
            Ok(audio)
        }
        (AudioFormat::Wav, found) => Err(MelodyError::mix_failed(format!(
            "{} asset is declared WAV but contains {}",
            asset.stage(),
            found.map_or("unrecognized data".to_string(), |f| f.to_string())
        ))),
        (AudioFormat::Mp3, _) => Err(MelodyError::mix_failed(format!(
            "{} asset is MP3; only WAV inputs can be mixed",
            asset.stage()
        ))),
    }
}

/// Converts any channel layout to interleaved stereo.
///
/// Mono is duplicated; layouts wider than stereo keep their first two channels.
fn to_stereo(audio: PcmAudio) -> PcmAudio {
    let samples = match audio.channels {
        2 => audio.samples,
        1 => audio.samples.iter().flat_map(|s| [*s, *s]).collect(),
        n => audio
            .samples
            .chunks_exact(n as usize)
            .flat_map(|frame| [frame[0], frame[1]])
            .collect(),
    };
    PcmAudio {
        samples,
        channels: 2,
        sample_rate: audio.sample_rate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::write_wav_to_buffer;

    fn mixer() -> AudioMixer {
        AudioMixer::new(&MixConfig::default())
    }

    fn constant(value: f32, frames: usize, channels: u16, rate: u32) -> PcmAudio {
        PcmAudio {
            samples: vec![value; frames * channels as usize],
            channels,
            sample_rate: rate,
        }
    }

    fn wav_asset(stage: Stage, frames: usize, channels: u16, rate: u32) -> AudioAsset {
        let samples: Vec<f32> = (0..frames * channels as usize)
            .map(|i| ((i / channels as usize) as f32 * 0.03).sin() * 0.4)
            .collect();
        let bytes = write_wav_to_buffer(&samples, channels, rate).unwrap();
        AudioAsset::new(stage, AudioFormat::Wav, bytes)
    }

    #[test]
    fn db_conversion() {
        assert!((db_to_linear(0.0) - 1.0).abs() < 1e-6);
        assert!((db_to_linear(-6.0) - 0.501_187).abs() < 1e-4);
        assert!((db_to_linear(3.0) - 1.412_538).abs() < 1e-4);
    }

    #[test]
    fn mix_pcm_applies_fixed_gains() {
        let out = mixer().mix_pcm(constant(0.1, 4, 2, 100), constant(0.2, 4, 2, 100));
        let expected = 0.1 * db_to_linear(3.0) + 0.2 * db_to_linear(-6.0);
        assert!(out.samples.iter().all(|s| (s - expected).abs() < 1e-6));
    }

    #[test]
    fn mix_pcm_truncates_to_shorter() {
        let out = mixer().mix_pcm(constant(0.1, 10, 2, 100), constant(0.1, 7, 2, 100));
        assert_eq!(out.frames(), 7);

        let out = mixer().mix_pcm(constant(0.1, 3, 2, 100), constant(0.1, 7, 2, 100));
        assert_eq!(out.frames(), 3);
    }

    #[test]
    fn mix_pcm_clamps() {
        let out = mixer().mix_pcm(constant(0.9, 2, 2, 100), constant(0.9, 2, 2, 100));
        assert!(out.samples.iter().all(|s| *s == 1.0));
    }

    #[test]
    fn to_stereo_layouts() {
        let mono = to_stereo(PcmAudio {
            samples: vec![0.1, 0.2],
            channels: 1,
            sample_rate: 10,
        });
        assert_eq!(mono.samples, vec![0.1, 0.1, 0.2, 0.2]);

        let quad = to_stereo(PcmAudio {
            samples: vec![1.0, 2.0, 3.0, 4.0],
            channels: 4,
            sample_rate: 10,
        });
        assert_eq!(quad.samples, vec![1.0, 2.0]);
    }

    #[test]
    fn mix_duration_bounded_by_shorter_input() {
        let vocals = wav_asset(Stage::Vocals, 24000, 1, 24000); // 1.0s
        let instrumental = wav_asset(Stage::Instrumental, 66150, 2, 44100); // 1.5s

        let mixed = mixer().mix(&vocals, &instrumental).unwrap();
        assert_eq!(mixed.format(), AudioFormat::Mp3);
        assert_eq!(mixed.stage(), Stage::Mix);
        let duration = mixed.duration_hint().unwrap();
        assert!(duration <= 1.0 + 1e-3, "duration {}", duration);
        assert!(duration > 0.9, "duration {}", duration);
    }

    #[test]
    fn mixing_is_deterministic() {
        let vocals = wav_asset(Stage::Vocals, 22050, 2, 44100);
        let instrumental = wav_asset(Stage::Instrumental, 44100, 2, 44100);

        let a = mixer().mix(&vocals, &instrumental).unwrap();
        let b = mixer().mix(&vocals, &instrumental).unwrap();
        assert_eq!(a.bytes(), b.bytes());
    }

    #[test]
    fn rejects_mismatched_declared_format() {
        let bogus = AudioAsset::new(Stage::Vocals, AudioFormat::Wav, b"{\"error\":\"x\"}".to_vec());
        let instrumental = wav_asset(Stage::Instrumental, 100, 2, 44100);
        let err = mixer().mix(&bogus, &instrumental).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::MixFailed);
        assert!(err.message.contains("vocals"));
    }

    #[test]
    fn rejects_mp3_input() {
        let vocals = wav_asset(Stage::Vocals, 100, 1, 24000);
        let mp3 = AudioAsset::new(Stage::Instrumental, AudioFormat::Mp3, vec![0xFF, 0xFB, 0, 0]);
        let err = mixer().mix(&vocals, &mp3).unwrap_err();
        assert_eq!(err.stage, Some(Stage::Mix));
    }

    #[test]
    fn rejects_empty_input() {
        let empty = wav_asset(Stage::Vocals, 0, 1, 24000);
        let instrumental = wav_asset(Stage::Instrumental, 100, 2, 44100);
        let err = mixer().mix(&empty, &instrumental).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::MixFailed);
        assert_eq!(err.stage, Some(Stage::Mix));
        assert!(err.message.contains("no audio frames"));

        let vocals = wav_asset(Stage::Vocals, 100, 1, 24000);
        let empty = wav_asset(Stage::Instrumental, 0, 2, 44100);
        let err = mixer().mix(&vocals, &empty).unwrap_err();
        assert!(err.message.contains("instrumental"));
    }
}
