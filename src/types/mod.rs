//! Core types for melody-maker.
//!
//! This module re-exports all the core data types used throughout the crate:
//! - [`SongRequest`]: The immutable input of one pipeline run
//! - [`LyricsResult`]: Lyrics text and derived title
//! - [`AudioAsset`]: Audio bytes produced by a stage
//! - [`GenerationJob`]: Local snapshot of a remote audio job
//! - [`Stage`]: Pipeline stage tags

mod asset;
mod job;
mod lyrics;
mod request;
mod stage;

// Re-export all types at the module level
pub use asset::{AudioAsset, AudioFormat};
pub use job::{GenerationJob, JobStatus};
pub use lyrics::{clean_title, sanitize_file_stem, LyricsResult, FALLBACK_TITLE};
pub use request::{
    find_voice, Genre, Mood, SongRequest, Voice, DEFAULT_VOICE, MAX_KEYWORDS_CHARS, VOICES,
};
pub use stage::Stage;
