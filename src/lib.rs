//! melody-maker: AI song generation from mood, genre and keywords.
//!
//! The library drives three remote generative services and mixes their
//! output locally:
//!
//! 1. chat completion writes the lyrics and a title,
//! 2. text-to-speech sings the lyrics,
//! 3. an asynchronous audio job produces the instrumental,
//! 4. the mixer overlays both tracks and encodes an MP3.
//!
//! # Modules
//!
//! - [`types`]: Core data types (SongRequest, LyricsResult, AudioAsset, GenerationJob)
//! - [`clients`]: HTTP clients for the three services
//! - [`generation`]: The stage pipeline, job poller and progress events
//! - [`audio`]: WAV decoding, resampling, mixing and MP3 encoding
//! - [`config`]: Runtime configuration (MelodyConfig)
//! - [`error`]: Error types and codes (MelodyError, ErrorCode)
//!
//! # Example
//!
//! ```rust,ignore
//! use melody_maker::{Genre, MelodyConfig, Mood, SongPipeline, SongRequest};
//!
//! let config = MelodyConfig::from_env();
//! let pipeline = SongPipeline::from_config(&config)?;
//!
//! let request = SongRequest::new(Mood::Chill, Genre::HipHop, Some("rain".into()), "Luna")?;
//! let result = pipeline
//!     .run_with_progress(&request, |event| eprintln!("{}", event.describe()))
//!     .await?;
//!
//! std::fs::write(result.song_filename(), result.song.bytes())?;
//! ```

pub mod audio;
pub mod cli;
pub mod clients;
pub mod config;
pub mod error;
pub mod generation;
pub mod types;

// Re-export commonly used types at crate root for convenience
pub use config::MelodyConfig;
pub use error::{ErrorCode, MelodyError, Result};
pub use generation::{ProgressEvent, RunResult, SongPipeline};
pub use types::{
    AudioAsset, AudioFormat, GenerationJob, Genre, JobStatus, LyricsResult, Mood, SongRequest,
    Stage,
};
