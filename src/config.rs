//! Runtime configuration.
//!
//! Holds the API credential, endpoint, model names and every tuning
//! constant of the pipeline. Defaults equal the values the service was
//! tuned with; each can be overridden from the environment or the CLI.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default base URL shared by all three remote services.
pub const DEFAULT_API_BASE_URL: &str = "https://api.aimlapi.com";

/// MP3 bitrates the encoder accepts, in kbps.
pub const SUPPORTED_BITRATES: &[u32] = &[
    8, 16, 24, 32, 40, 48, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320,
];

/// Longest accepted delay between instrumental status queries, in seconds.
pub const MAX_POLL_INTERVAL_SEC: f32 = 3600.0;

/// Chat-completion settings for lyrics and title.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextConfig {
    /// Chat model name.
    pub model: String,
    /// Sampling temperature for both calls.
    pub temperature: f32,
    /// Token limit for the lyrics call.
    pub lyrics_max_tokens: u32,
    /// Token limit for the title call.
    pub title_max_tokens: u32,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            temperature: 0.7,
            lyrics_max_tokens: 300,
            title_max_tokens: 20,
        }
    }
}

/// Text-to-speech output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    /// Container of the returned audio. Must be "wav" for mixing.
    pub container: String,
    /// Sample encoding inside the container.
    pub encoding: String,
    /// Output sample rate in Hz.
    pub sample_rate: u32,
    /// Upstream character limit; cleaned lyrics are truncated to this.
    pub max_chars: usize,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            container: "wav".to_string(),
            encoding: "linear16".to_string(),
            sample_rate: 24000,
            max_chars: 3000,
        }
    }
}

/// Instrumental job settings and polling budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstrumentalConfig {
    /// Audio generation model name.
    pub model: String,
    /// Requested length of the instrumental in seconds.
    pub duration_sec: u32,
    /// Diffusion steps requested from the service.
    pub steps: u32,
    /// Maximum number of status queries.
    pub max_attempts: u32,
    /// Fixed delay between status queries, in seconds.
    pub poll_interval_sec: f32,
}

impl InstrumentalConfig {
    /// Poll interval as a Duration, clamped to `0..=MAX_POLL_INTERVAL_SEC`.
    pub fn poll_interval(&self) -> Duration {
        let max = Duration::from_secs(MAX_POLL_INTERVAL_SEC as u64);
        Duration::try_from_secs_f32(self.poll_interval_sec.clamp(0.0, MAX_POLL_INTERVAL_SEC))
            .unwrap_or(max)
    }

    /// Upper bound on time spent waiting between polls.
    pub fn max_wait(&self) -> Duration {
        self.poll_interval() * self.max_attempts
    }
}

impl Default for InstrumentalConfig {
    fn default() -> Self {
        Self {
            model: "stable-audio".to_string(),
            duration_sec: 30,
            steps: 100,
            max_attempts: 15,
            poll_interval_sec: 5.0,
        }
    }
}

/// Gain staging and encoding of the final mix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MixConfig {
    /// Gain applied to the vocals, in dB.
    pub vocal_gain_db: f32,
    /// Gain applied to the instrumental, in dB.
    pub instrumental_gain_db: f32,
    /// MP3 bitrate in kbps.
    pub bitrate_kbps: u32,
}

impl Default for MixConfig {
    fn default() -> Self {
        Self {
            vocal_gain_db: 3.0,
            instrumental_gain_db: -6.0,
            bitrate_kbps: 192,
        }
    }
}

/// Runtime configuration for the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MelodyConfig {
    /// Bearer credential used for all three services.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Base URL of the API.
    pub api_base_url: String,

    /// Per-request network timeout in seconds.
    pub request_timeout_sec: u64,

    /// Directory for lyrics and songs.
    /// If None, uses the platform-specific default location.
    pub output_path: Option<PathBuf>,

    pub text: TextConfig,
    pub speech: SpeechConfig,
    pub instrumental: InstrumentalConfig,
    pub mix: MixConfig,
}

impl MelodyConfig {
    /// Creates a MelodyConfig with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a MelodyConfig from environment variables.
    ///
    /// Reads the following environment variables:
    /// - `MELODY_API_KEY` (or `AIML_API_KEY`) - Bearer credential
    /// - `MELODY_API_BASE_URL` - Base URL of the API
    /// - `MELODY_TIMEOUT` - Per-request timeout in seconds
    /// - `MELODY_OUTPUT_PATH` - Output directory
    /// - `MELODY_CHAT_MODEL` - Chat model for lyrics and title
    /// - `MELODY_DURATION` - Instrumental length in seconds
    /// - `MELODY_STEPS` - Instrumental diffusion steps
    /// - `MELODY_POLL_ATTEMPTS` - Maximum status queries
    /// - `MELODY_POLL_INTERVAL` - Seconds between status queries
    /// - `MELODY_VOCAL_GAIN_DB` / `MELODY_INSTRUMENTAL_GAIN_DB` - Mix gains
    /// - `MELODY_BITRATE` - MP3 bitrate in kbps
    ///
    /// Falls back to defaults for unset or unparsable variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        config.api_key = std::env::var("MELODY_API_KEY")
            .or_else(|_| std::env::var("AIML_API_KEY"))
            .ok()
            .filter(|k| !k.trim().is_empty());

        if let Ok(url) = std::env::var("MELODY_API_BASE_URL") {
            if !url.trim().is_empty() {
                config.api_base_url = url.trim().trim_end_matches('/').to_string();
            }
        }

        if let Some(timeout) = env_parse::<u64>("MELODY_TIMEOUT").filter(|t| *t > 0) {
            config.request_timeout_sec = timeout;
        }

        if let Ok(path) = std::env::var("MELODY_OUTPUT_PATH") {
            config.output_path = Some(PathBuf::from(path));
        }

        if let Ok(model) = std::env::var("MELODY_CHAT_MODEL") {
            if !model.trim().is_empty() {
                config.text.model = model;
            }
        }

        if let Some(duration) = env_parse::<u32>("MELODY_DURATION") {
            if (1..=180).contains(&duration) {
                config.instrumental.duration_sec = duration;
            }
        }

        if let Some(steps) = env_parse::<u32>("MELODY_STEPS").filter(|s| *s > 0) {
            config.instrumental.steps = steps;
        }

        if let Some(attempts) = env_parse::<u32>("MELODY_POLL_ATTEMPTS").filter(|a| *a > 0) {
            config.instrumental.max_attempts = attempts;
        }

        if let Some(interval) = env_parse::<f32>("MELODY_POLL_INTERVAL") {
            if (0.0..=MAX_POLL_INTERVAL_SEC).contains(&interval) {
                config.instrumental.poll_interval_sec = interval;
            }
        }

        if let Some(gain) = env_parse::<f32>("MELODY_VOCAL_GAIN_DB").filter(|g| g.is_finite()) {
            config.mix.vocal_gain_db = gain;
        }

        if let Some(gain) =
            env_parse::<f32>("MELODY_INSTRUMENTAL_GAIN_DB").filter(|g| g.is_finite())
        {
            config.mix.instrumental_gain_db = gain;
        }

        if let Some(bitrate) = env_parse::<u32>("MELODY_BITRATE") {
            if SUPPORTED_BITRATES.contains(&bitrate) {
                config.mix.bitrate_kbps = bitrate;
            }
        }

        config
    }

    /// Per-request timeout as a Duration.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_sec)
    }

    /// Returns the effective output path, using platform defaults if not specified.
    pub fn effective_output_path(&self) -> PathBuf {
        if let Some(ref path) = self.output_path {
            path.clone()
        } else {
            default_output_path()
        }
    }

    /// Validates the configuration.
    ///
    /// Returns an error message if validation fails, None otherwise.
    pub fn validate(&self) -> Option<String> {
        match self.api_key.as_deref() {
            None => return Some("API key is not set (MELODY_API_KEY)".to_string()),
            Some(key) if key.trim().is_empty() => {
                return Some("API key is empty".to_string());
            }
            _ => {}
        }

        if self.api_base_url.trim().is_empty() {
            return Some("api_base_url must not be empty".to_string());
        }

        if self.request_timeout_sec == 0 {
            return Some("request_timeout_sec must be > 0".to_string());
        }

        if self.speech.max_chars == 0 {
            return Some("speech.max_chars must be > 0".to_string());
        }

        if self.instrumental.max_attempts == 0 {
            return Some("instrumental.max_attempts must be > 0".to_string());
        }

        if !(0.0..=MAX_POLL_INTERVAL_SEC).contains(&self.instrumental.poll_interval_sec) {
            return Some(format!(
                "instrumental.poll_interval_sec must be between 0 and {}, got {}",
                MAX_POLL_INTERVAL_SEC, self.instrumental.poll_interval_sec
            ));
        }

        if self.instrumental.duration_sec == 0 {
            return Some("instrumental.duration_sec must be > 0".to_string());
        }

        if !SUPPORTED_BITRATES.contains(&self.mix.bitrate_kbps) {
            return Some(format!(
                "Unsupported MP3 bitrate: {} kbps",
                self.mix.bitrate_kbps
            ));
        }

        if !self.mix.vocal_gain_db.is_finite() || !self.mix.instrumental_gain_db.is_finite() {
            return Some("mix gains must be finite".to_string());
        }

        None
    }
}

impl Default for MelodyConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_sec: 120,
            output_path: None,
            text: TextConfig::default(),
            speech: SpeechConfig::default(),
            instrumental: InstrumentalConfig::default(),
            mix: MixConfig::default(),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse::<T>().ok())
}

/// Returns the platform-specific default output path.
///
/// Uses the `directories` crate to find appropriate locations:
/// - macOS: ~/Library/Application Support/melody-maker/songs
/// - Linux: ~/.local/share/melody-maker/songs
/// - Windows: C:\Users\<user>\AppData\Roaming\melody-maker\data\songs
fn default_output_path() -> PathBuf {
    if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "melody-maker") {
        proj_dirs.data_dir().join("songs")
    } else {
        // Fallback to current directory
        PathBuf::from("./songs")
    }
}
