//! AudioAsset: an immutable audio blob produced by one pipeline stage.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::Stage;

/// Container format of an audio blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    Wav,
    Mp3,
}

impl AudioFormat {
    /// File extension without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Wav => "wav",
            AudioFormat::Mp3 => "mp3",
        }
    }

    /// Guesses the format from the leading bytes.
    ///
    /// WAV starts with `RIFF....WAVE`; MP3 starts with an ID3 tag or an
    /// MPEG frame sync (11 set bits).
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WAVE" {
            return Some(AudioFormat::Wav);
        }
        if bytes.len() >= 3 && &bytes[0..3] == b"ID3" {
            return Some(AudioFormat::Mp3);
        }
        if bytes.len() >= 2 && bytes[0] == 0xFF && (bytes[1] & 0xE0) == 0xE0 {
            return Some(AudioFormat::Mp3);
        }
        None
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// Audio bytes with their declared format.
///
/// Assets are identified only by the stage that produced them (vocals,
/// instrumental or mix); identical bytes from two runs are not deduplicated.
#[derive(Clone, PartialEq)]
pub struct AudioAsset {
    bytes: Vec<u8>,
    format: AudioFormat,
    duration_hint: Option<f32>,
    stage: Stage,
}

impl AudioAsset {
    pub fn new(stage: Stage, format: AudioFormat, bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            format,
            duration_hint: None,
            stage,
        }
    }

    /// Sets the known duration in seconds.
    pub fn with_duration_hint(mut self, seconds: f32) -> Self {
        self.duration_hint = Some(seconds);
        self
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }

    /// Duration in seconds, when known.
    pub fn duration_hint(&self) -> Option<f32> {
        self.duration_hint
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for AudioAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioAsset")
            .field("stage", &self.stage)
            .field("format", &self.format)
            .field("len", &self.bytes.len())
            .field("duration_hint", &self.duration_hint)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniff_formats() {
        let mut wav = b"RIFF".to_vec();
        wav.extend_from_slice(&[0, 0, 0, 0]);
        wav.extend_from_slice(b"WAVEfmt ");
        assert_eq!(AudioFormat::sniff(&wav), Some(AudioFormat::Wav));
        assert_eq!(AudioFormat::sniff(b"ID3\x04\x00"), Some(AudioFormat::Mp3));
        assert_eq!(AudioFormat::sniff(&[0xFF, 0xFB, 0x90]), Some(AudioFormat::Mp3));
        assert_eq!(AudioFormat::sniff(b"{\"error\":1}"), None);
        assert_eq!(AudioFormat::sniff(&[]), None);
    }

    #[test]
    fn debug_omits_bytes() {
        let asset = AudioAsset::new(Stage::Vocals, AudioFormat::Wav, vec![1; 4096])
            .with_duration_hint(1.5);
        let text = format!("{:?}", asset);
        assert!(text.contains("len: 4096"));
        assert!(text.contains("Vocals"));
        assert_eq!(asset.duration_hint(), Some(1.5));
    }
}
