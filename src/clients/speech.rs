//! Text-to-speech client for the vocal track.

use reqwest::{Client, StatusCode};
use serde::Serialize;
use tracing::debug;

use crate::audio::decode_wav;
use crate::config::SpeechConfig;
use crate::error::{MelodyError, Result};
use crate::types::{AudioAsset, AudioFormat, Stage};

use super::http::{error_body, ApiEndpoint};

const TTS_PATH: &str = "/v1/tts";

/// Line prefixes that mark structural annotations rather than sung text.
const MARKER_PREFIXES: &[char] = &['[', '(', '-'];

#[derive(Debug, Serialize)]
struct TtsRequest<'a> {
    model: &'a str,
    text: &'a str,
    container: &'a str,
    encoding: &'a str,
    sample_rate: u32,
}

/// Prepares lyrics for speech synthesis.
///
/// Drops blank lines and lines starting with `[`, `(` or `-` (such as
/// "[Chorus]" or "(repeat)"), then truncates to `max_chars` characters.
pub fn clean_lyrics(text: &str, max_chars: usize) -> String {
    let cleaned = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with(MARKER_PREFIXES))
        .collect::<Vec<_>>()
        .join("\n");

    match cleaned.char_indices().nth(max_chars) {
        Some((end, _)) => cleaned[..end].to_string(),
        None => cleaned,
    }
}

/// Synthesizes vocals in a single synchronous request.
#[derive(Debug, Clone)]
pub struct SpeechSynthesisClient {
    client: Client,
    endpoint: ApiEndpoint,
    config: SpeechConfig,
}

impl SpeechSynthesisClient {
    pub fn new(client: Client, endpoint: ApiEndpoint, config: SpeechConfig) -> Self {
        Self {
            client,
            endpoint,
            config,
        }
    }

    /// Synthesizes `text` with the given provider voice.
    ///
    /// The text is cleaned with [`clean_lyrics`] first. Only a 201 response
    /// counts as success.
    pub async fn synthesize_vocals(&self, text: &str, voice_id: &str) -> Result<AudioAsset> {
        let cleaned = clean_lyrics(text, self.config.max_chars);
        if cleaned.is_empty() {
            return Err(MelodyError::generation_failed(
                Stage::Vocals,
                "no singable lines left after removing annotations",
            ));
        }

        let body = TtsRequest {
            model: voice_id,
            text: &cleaned,
            container: &self.config.container,
            encoding: &self.config.encoding,
            sample_rate: self.config.sample_rate,
        };

        debug!(voice_id, chars = cleaned.chars().count(), "Requesting speech synthesis");

        let response = self
            .client
            .post(self.endpoint.url(TTS_PATH))
            .bearer_auth(self.endpoint.api_key())
            .json(&body)
            .send()
            .await
            .map_err(|e| MelodyError::transport(Stage::Vocals, e))?;

        let status = response.status();
        if status != StatusCode::CREATED {
            let body = error_body(response).await;
            return Err(MelodyError::generation_failed(
                Stage::Vocals,
                format!("HTTP {}: {}", status, body),
            ));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| MelodyError::transport(Stage::Vocals, e))?
            .to_vec();

        if bytes.is_empty() {
            return Err(MelodyError::generation_failed(
                Stage::Vocals,
                "speech response was empty",
            ));
        }

        let format = AudioFormat::sniff(&bytes).unwrap_or(AudioFormat::Wav);
        let mut asset = AudioAsset::new(Stage::Vocals, format, bytes);
        if format == AudioFormat::Wav {
            if let Ok(pcm) = decode_wav(asset.bytes()) {
                asset = asset.with_duration_hint(pcm.duration_sec());
            }
        }
        Ok(asset)
    }
}
