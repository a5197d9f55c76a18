//! Command-line arguments for the standalone song generator.
//!
//! Flags override the matching [`MelodyConfig`] fields after the
//! environment has been read.

use std::path::PathBuf;

use clap::Parser;

use crate::config::{MelodyConfig, MAX_POLL_INTERVAL_SEC};
use crate::error::Result;
use crate::types::{Genre, Mood, SongRequest, DEFAULT_VOICE};

/// melody-maker: AI song generation from mood, genre and keywords
#[derive(Parser, Debug)]
#[command(name = "melody-maker")]
#[command(about = "Generate a song: lyrics, sung vocals, instrumental and final MP3 mix")]
#[command(version)]
pub struct Cli {
    /// Mood of the song
    #[arg(short, long, value_enum, required_unless_present = "list_voices")]
    pub mood: Option<Mood>,

    /// Genre of the song
    #[arg(short, long, value_enum, required_unless_present = "list_voices")]
    pub genre: Option<Genre>,

    /// Optional themes for the lyrics and instrumental (comma separated)
    #[arg(short, long)]
    pub keywords: Option<String>,

    /// Voice display name or provider voice id
    #[arg(short, long, default_value = DEFAULT_VOICE)]
    pub voice: String,

    /// Directory for the lyrics file and the MP3
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Instrumental length in seconds
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=180))]
    pub duration: Option<u32>,

    /// Diffusion steps for the instrumental
    #[arg(long)]
    pub steps: Option<u32>,

    /// Maximum number of instrumental status checks
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub attempts: Option<u32>,

    /// Seconds between instrumental status checks
    #[arg(long, value_parser = parse_interval)]
    pub interval: Option<f32>,

    /// Also save the vocal and instrumental tracks
    #[arg(long)]
    pub keep_stems: bool,

    /// Print the available voices and exit
    #[arg(long)]
    pub list_voices: bool,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Applies flag overrides on top of `config`.
    pub fn apply_to(&self, config: &mut MelodyConfig) {
        if let Some(ref dir) = self.output_dir {
            config.output_path = Some(dir.clone());
        }
        if let Some(duration) = self.duration {
            config.instrumental.duration_sec = duration;
        }
        if let Some(steps) = self.steps {
            config.instrumental.steps = steps;
        }
        if let Some(attempts) = self.attempts {
            config.instrumental.max_attempts = attempts;
        }
        if let Some(interval) = self.interval {
            config.instrumental.poll_interval_sec = interval;
        }
    }

    /// Builds the song request from the flags.
    ///
    /// Mood and genre fall back to their defaults when absent, which only
    /// happens together with `--list-voices`.
    pub fn song_request(&self) -> Result<SongRequest> {
        SongRequest::new(
            self.mood.unwrap_or_default(),
            self.genre.unwrap_or_default(),
            self.keywords.clone(),
            &self.voice,
        )
    }
}

/// Parses a poll interval in seconds, bounded to `0..=MAX_POLL_INTERVAL_SEC`.
fn parse_interval(s: &str) -> std::result::Result<f32, String> {
    let interval: f32 = s.parse().map_err(|_| format!("`{}` is not a number", s))?;
    if (0.0..=MAX_POLL_INTERVAL_SEC).contains(&interval) {
        Ok(interval)
    } else {
        Err(format!(
            "interval must be between 0 and {} seconds",
            MAX_POLL_INTERVAL_SEC
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn parses_minimal_invocation() {
        let cli = Cli::try_parse_from(["melody-maker", "--mood", "chill", "--genre", "hip-hop"]).unwrap();
        assert_eq!(cli.mood, Some(Mood::Chill));
        assert_eq!(cli.genre, Some(Genre::HipHop));
        assert_eq!(cli.voice, DEFAULT_VOICE);
        assert!(!cli.keep_stems);
    }

    #[test]
    fn mood_and_genre_required_without_list_voices() {
        assert!(Cli::try_parse_from(["melody-maker", "--mood", "sad"]).is_err());
        assert!(Cli::try_parse_from(["melody-maker", "--list-voices"]).is_ok());
    }

    #[test]
    fn duration_range_enforced() {
        assert!(Cli::try_parse_from([
            "melody-maker", "--mood", "sad", "--genre", "rock", "--duration", "0"
        ])
        .is_err());
        assert!(Cli::try_parse_from([
            "melody-maker", "--mood", "sad", "--genre", "rock", "--duration", "181"
        ])
        .is_err());
    }

    #[test]
    fn interval_range_enforced() {
        for bad in ["1e20", "-1", "NaN", "soon"] {
            assert!(
                Cli::try_parse_from([
                    "melody-maker", "--mood", "sad", "--genre", "rock", "--interval", bad
                ])
                .is_err(),
                "{} accepted",
                bad
            );
        }
        let cli = Cli::try_parse_from([
            "melody-maker", "--mood", "sad", "--genre", "rock", "--interval", "3600",
        ])
        .unwrap();
        assert_eq!(cli.interval, Some(3600.0));
    }

    #[test]
    fn overrides_apply_to_config() {
        let cli = Cli::try_parse_from([
            "melody-maker",
            "--mood",
            "energetic",
            "--genre",
            "edm",
            "--output-dir",
            "/tmp/out",
            "--duration",
            "45",
            "--attempts",
            "3",
            "--interval",
            "0.5",
        ])
        .unwrap();

        let mut config = MelodyConfig::default();
        cli.apply_to(&mut config);
        assert_eq!(config.output_path, Some(PathBuf::from("/tmp/out")));
        assert_eq!(config.instrumental.duration_sec, 45);
        assert_eq!(config.instrumental.max_attempts, 3);
        assert_eq!(config.instrumental.poll_interval_sec, 0.5);
        assert_eq!(config.instrumental.steps, 100);
    }

    #[test]
    fn song_request_rejects_unknown_voice() {
        let cli = Cli::try_parse_from([
            "melody-maker", "--mood", "happy", "--genre", "pop", "--voice", "Nobody",
        ])
        .unwrap();
        let err = cli.song_request().unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidRequest);
    }

    #[test]
    fn song_request_uses_voice_id() {
        let cli = Cli::try_parse_from([
            "melody-maker", "--mood", "happy", "--genre", "pop", "--voice", "asteria",
            "--keywords", "summer, rain",
        ])
        .unwrap();
        let request = cli.song_request().unwrap();
        assert_eq!(request.voice_id(), "#g1_aura-asteria-en");
        assert_eq!(request.keywords(), Some("summer, rain"));
    }
}
