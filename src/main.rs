//! melody-maker: generate a song from the command line.
//!
//! Runs the full pipeline once and writes the lyrics and the final MP3
//! (optionally the vocal and instrumental tracks) to the output directory.

use std::path::Path;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use melody_maker::cli::Cli;
use melody_maker::config::MelodyConfig;
use melody_maker::generation::{ProgressEvent, RunResult, SongPipeline};
use melody_maker::types::VOICES;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("melody_maker=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse_args();

    if cli.list_voices {
        print_voices();
        return Ok(());
    }

    let mut config = MelodyConfig::from_env();
    cli.apply_to(&mut config);
    let request = cli.song_request()?;
    let pipeline = SongPipeline::from_config(&config)?;
    let output_dir = config.effective_output_path();

    eprintln!("=== melody-maker ===");
    eprintln!("Mood: {}", request.mood());
    eprintln!("Genre: {}", request.genre());
    eprintln!("Keywords: {}", request.keywords().unwrap_or("-"));
    eprintln!("Voice: {}", cli.voice);
    eprintln!(
        "Instrumental: {}s, {} steps, up to {} checks every {:.1}s",
        config.instrumental.duration_sec,
        config.instrumental.steps,
        config.instrumental.max_attempts,
        config.instrumental.poll_interval_sec
    );
    eprintln!("Output: {}", output_dir.display());
    eprintln!();

    let result = pipeline.run_with_progress(&request, print_progress).await?;

    eprintln!();
    eprintln!("Song complete!");
    eprintln!("  Title: {}", result.lyrics.title);
    eprintln!("  Time: {:.2}s", result.elapsed.as_secs_f32());
    if let Some(duration) = result.song.duration_hint() {
        eprintln!("  Audio duration: {:.2}s", duration);
    }
    eprintln!();

    save_outputs(&result, &output_dir, cli.keep_stems)?;

    println!("{}", result.lyrics.text);
    Ok(())
}

fn print_progress(event: ProgressEvent) {
    match event {
        ProgressEvent::StageStarted(_) => eprintln!("{}", event.describe()),
        ProgressEvent::StageCompleted { .. } => eprintln!("  ok: {}", event.describe()),
        ProgressEvent::StageFailed { .. } => eprintln!("  FAILED: {}", event.describe()),
        _ => eprintln!("  {}", event.describe()),
    }
}

/// Writes the lyrics, the song and optionally the stems into `dir`.
fn save_outputs(result: &RunResult, dir: &Path, keep_stems: bool) -> anyhow::Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let lyrics_path = dir.join(result.lyrics_filename());
    std::fs::write(&lyrics_path, &result.lyrics.text)
        .with_context(|| format!("Failed to write {}", lyrics_path.display()))?;
    eprintln!("Saved lyrics to: {}", lyrics_path.display());

    let song_path = dir.join(result.song_filename());
    std::fs::write(&song_path, result.song.bytes())
        .with_context(|| format!("Failed to write {}", song_path.display()))?;
    eprintln!("Saved song to: {}", song_path.display());

    if keep_stems {
        for stem in [&result.vocals, &result.instrumental] {
            let path = dir.join(result.stem_filename(stem));
            std::fs::write(&path, stem.bytes())
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("Saved {} to: {}", stem.stage(), path.display());
        }
    }

    Ok(())
}

/// Prints the voice catalogue.
fn print_voices() {
    println!("Available voices:");
    for voice in VOICES {
        println!("  {:<10} {}", voice.display_name, voice.provider_id);
    }
}
