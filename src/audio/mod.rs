//! Audio processing module.
//!
//! WAV decoding, resampling, MP3 encoding and the two-track mixer.

pub mod mix;
pub mod mp3;
pub mod resample;
pub mod wav;

// Re-export commonly used items
pub use mix::{db_to_linear, AudioMixer};
pub use mp3::encode_mp3;
pub use resample::resample;
pub use wav::{decode_wav, samples_to_duration, write_wav_to_buffer, PcmAudio};
