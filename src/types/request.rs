//! SongRequest and its enumerated inputs.
//!
//! A SongRequest is the immutable input to one pipeline run. Fields are
//! private so a request cannot change once it has been validated.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{MelodyError, Result};

/// Maximum length of the optional keywords, in characters.
pub const MAX_KEYWORDS_CHARS: usize = 200;

/// Mood of the song.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    #[default]
    Happy,
    Sad,
    Chill,
    Energetic,
}

impl Mood {
    /// Display name used in prompts.
    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Happy => "Happy",
            Mood::Sad => "Sad",
            Mood::Chill => "Chill",
            Mood::Energetic => "Energetic",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Musical genre of the song.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Genre {
    #[default]
    Pop,
    HipHop,
    Classical,
    Edm,
    Rock,
}

impl Genre {
    /// Display name used in prompts.
    pub fn as_str(&self) -> &'static str {
        match self {
            Genre::Pop => "Pop",
            Genre::HipHop => "Hip Hop",
            Genre::Classical => "Classical",
            Genre::Edm => "EDM",
            Genre::Rock => "Rock",
        }
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A selectable singing voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Voice {
    /// Name shown to the user.
    pub display_name: &'static str,
    /// Identifier sent to the speech provider as the model.
    pub provider_id: &'static str,
}

/// Fixed catalogue of voices offered by the speech provider.
pub const VOICES: &[Voice] = &[
    Voice { display_name: "Asteria", provider_id: "#g1_aura-asteria-en" },
    Voice { display_name: "Luna", provider_id: "#g1_aura-luna-en" },
    Voice { display_name: "Stella", provider_id: "#g1_aura-stella-en" },
    Voice { display_name: "Athena", provider_id: "#g1_aura-athena-en" },
    Voice { display_name: "Hera", provider_id: "#g1_aura-hera-en" },
    Voice { display_name: "Orion", provider_id: "#g1_aura-orion-en" },
    Voice { display_name: "Arcas", provider_id: "#g1_aura-arcas-en" },
    Voice { display_name: "Perseus", provider_id: "#g1_aura-perseus-en" },
    Voice { display_name: "Angus", provider_id: "#g1_aura-angus-en" },
    Voice { display_name: "Orpheus", provider_id: "#g1_aura-orpheus-en" },
    Voice { display_name: "Helios", provider_id: "#g1_aura-helios-en" },
    Voice { display_name: "Zeus", provider_id: "#g1_aura-zeus-en" },
];

/// Voice used when none is chosen.
pub const DEFAULT_VOICE: &str = "Asteria";

/// Looks up a voice by display name (case-insensitive) or by provider id.
pub fn find_voice(name_or_id: &str) -> Option<&'static Voice> {
    let needle = name_or_id.trim();
    VOICES
        .iter()
        .find(|v| v.display_name.eq_ignore_ascii_case(needle) || v.provider_id == needle)
}

/// Immutable input to a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SongRequest {
    mood: Mood,
    genre: Genre,
    keywords: Option<String>,
    voice_id: String,
}

impl SongRequest {
    /// Creates a validated request.
    ///
    /// `voice` may be a display name or a provider id from [`VOICES`].
    /// Blank keywords are stored as `None`.
    pub fn new(mood: Mood, genre: Genre, keywords: Option<String>, voice: &str) -> Result<Self> {
        let voice = find_voice(voice)
            .ok_or_else(|| MelodyError::invalid_request(format!("Unknown voice: {:?}", voice)))?;

        let keywords = keywords
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());

        if let Some(ref k) = keywords {
            let len = k.chars().count();
            if len > MAX_KEYWORDS_CHARS {
                return Err(MelodyError::invalid_request(format!(
                    "Keywords too long: {} characters (max {})",
                    len, MAX_KEYWORDS_CHARS
                )));
            }
        }

        Ok(Self {
            mood,
            genre,
            keywords,
            voice_id: voice.provider_id.to_string(),
        })
    }

    pub fn mood(&self) -> Mood {
        self.mood
    }

    pub fn genre(&self) -> Genre {
        self.genre
    }

    pub fn keywords(&self) -> Option<&str> {
        self.keywords.as_deref()
    }

    /// Provider voice identifier.
    pub fn voice_id(&self) -> &str {
        &self.voice_id
    }

    /// Prompt for the instrumental generation job.
    pub fn instrumental_prompt(&self) -> String {
        format!(
            "A {} {} melody about {}",
            self.mood.as_str().to_lowercase(),
            self.genre.as_str().to_lowercase(),
            self.keywords().unwrap_or("anything")
        )
    }
}
