//! Pipeline stages.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One discrete step of a song run, each with its own failure tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Lyrics from the chat-completion model.
    Lyrics,
    /// Title derived from the lyrics.
    Title,
    /// Vocals from the text-to-speech model.
    Vocals,
    /// Instrumental from the asynchronous audio job.
    Instrumental,
    /// Local mix of vocals and instrumental.
    Mix,
}

impl Stage {
    /// Stages in execution order.
    pub const ALL: [Stage; 5] = [
        Stage::Lyrics,
        Stage::Title,
        Stage::Vocals,
        Stage::Instrumental,
        Stage::Mix,
    ];

    /// Returns the string representation of the stage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Lyrics => "lyrics",
            Stage::Title => "title",
            Stage::Vocals => "vocals",
            Stage::Instrumental => "instrumental",
            Stage::Mix => "mix",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
