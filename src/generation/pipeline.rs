//! Song pipeline.
//!
//! Runs the stages in order: lyrics, title, vocals, instrumental (submit,
//! poll, fetch) and mix. Each run owns its intermediate assets and returns
//! them in a [`RunResult`]; nothing is shared between runs.

use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::audio::AudioMixer;
use crate::clients::{
    build_http_client, ApiEndpoint, AsyncAudioGenerationClient, SpeechSynthesisClient,
    TextGenerationClient,
};
use crate::config::{InstrumentalConfig, MelodyConfig};
use crate::error::{MelodyError, Result};
use crate::types::{AudioAsset, GenerationJob, LyricsResult, SongRequest, Stage};

use super::poller::PollSettings;
use super::progress::ProgressEvent;

/// Everything one successful run produced.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub lyrics: LyricsResult,
    pub vocals: AudioAsset,
    pub instrumental: AudioAsset,
    /// Final MP3.
    pub song: AudioAsset,
    /// Final snapshot of the instrumental job.
    pub job: GenerationJob,
    /// Wall-clock time of the whole run.
    pub elapsed: Duration,
}

impl RunResult {
    /// File name for the lyrics download, e.g. `Summer_Rain_lyrics.txt`.
    pub fn lyrics_filename(&self) -> String {
        format!("{}_lyrics.txt", self.lyrics.file_stem())
    }

    /// File name for the song download, e.g. `Summer_Rain.mp3`.
    pub fn song_filename(&self) -> String {
        format!("{}.{}", self.lyrics.file_stem(), self.song.format().extension())
    }

    /// File name for an intermediate track, e.g. `Summer_Rain_vocals.wav`.
    pub fn stem_filename(&self, asset: &AudioAsset) -> String {
        format!(
            "{}_{}.{}",
            self.lyrics.file_stem(),
            asset.stage(),
            asset.format().extension()
        )
    }
}

/// Orchestrates the remote clients and the mixer.
#[derive(Debug, Clone)]
pub struct SongPipeline {
    text: TextGenerationClient,
    speech: SpeechSynthesisClient,
    instrumental: AsyncAudioGenerationClient,
    mixer: AudioMixer,
    settings: InstrumentalConfig,
}

impl SongPipeline {
    /// Builds the pipeline and its clients from configuration.
    pub fn from_config(config: &MelodyConfig) -> Result<Self> {
        if let Some(reason) = config.validate() {
            return Err(MelodyError::invalid_config(reason));
        }
        let api_key = config
            .api_key
            .as_deref()
            .ok_or_else(|| MelodyError::invalid_config("API key is not set"))?;

        let client = build_http_client(config.request_timeout())?;
        let endpoint = ApiEndpoint::new(config.api_base_url.clone(), api_key);

        Ok(Self::new(
            TextGenerationClient::new(client.clone(), endpoint.clone(), config.text.clone()),
            SpeechSynthesisClient::new(client.clone(), endpoint.clone(), config.speech.clone()),
            AsyncAudioGenerationClient::new(client, endpoint, config.instrumental.clone()),
            AudioMixer::new(&config.mix),
            config.instrumental.clone(),
        ))
    }

    /// Assembles a pipeline from already-built parts.
    pub fn new(
        text: TextGenerationClient,
        speech: SpeechSynthesisClient,
        instrumental: AsyncAudioGenerationClient,
        mixer: AudioMixer,
        settings: InstrumentalConfig,
    ) -> Self {
        Self {
            text,
            speech,
            instrumental,
            mixer,
            settings,
        }
    }

    /// Runs all stages for `request`.
    pub async fn run(&self, request: &SongRequest) -> Result<RunResult> {
        self.run_with_progress(request, |_| {}).await
    }

    /// Runs all stages, reporting progress through `on_progress`.
    ///
    /// Lyrics, vocals, instrumental and mix failures abort the run; later
    /// stages are not attempted. A title failure is reported and replaced by
    /// the fallback title. An instrumental job that was already submitted is
    /// left running on the service when a later stage fails.
    pub async fn run_with_progress<F>(
        &self,
        request: &SongRequest,
        mut on_progress: F,
    ) -> Result<RunResult>
    where
        F: FnMut(ProgressEvent),
    {
        let run_started = Instant::now();

        // Lyrics
        let started = begin(&mut on_progress, Stage::Lyrics);
        let text = self
            .text
            .generate_lyrics(request.genre(), request.mood(), request.keywords())
            .await
            .map_err(|e| report_failure(&mut on_progress, Stage::Lyrics, e))?;
        finish(&mut on_progress, Stage::Lyrics, started);

        // Title
        let started = begin(&mut on_progress, Stage::Title);
        let title = match self.text.generate_title(&text).await {
            Ok(title) => {
                finish(&mut on_progress, Stage::Title, started);
                Some(title)
            }
            Err(e) => {
                report_failure(&mut on_progress, Stage::Title, e);
                None
            }
        };
        let fell_back = title.is_none();
        let lyrics = LyricsResult::new(text, title);
        if fell_back {
            on_progress(ProgressEvent::TitleFallback {
                title: lyrics.title.clone(),
            });
        }

        // Vocals
        let started = begin(&mut on_progress, Stage::Vocals);
        let vocals = self
            .speech
            .synthesize_vocals(&lyrics.text, request.voice_id())
            .await
            .map_err(|e| report_failure(&mut on_progress, Stage::Vocals, e))?;
        finish(&mut on_progress, Stage::Vocals, started);

        // Instrumental
        let started = begin(&mut on_progress, Stage::Instrumental);
        let mut job = self
            .instrumental
            .submit(
                &request.instrumental_prompt(),
                self.settings.duration_sec,
                self.settings.steps,
            )
            .await
            .map_err(|e| report_failure(&mut on_progress, Stage::Instrumental, e))?;
        on_progress(ProgressEvent::JobSubmitted {
            job_id: job.id.clone(),
        });

        let settings = PollSettings::new(self.settings.max_attempts, self.settings.poll_interval());
        let polled = self
            .instrumental
            .poll_until_done_with_progress(&mut job, settings, |progress| {
                on_progress(ProgressEvent::JobPolled(progress.clone()))
            })
            .await;
        let instrumental =
            polled.map_err(|e| report_failure(&mut on_progress, Stage::Instrumental, e))?;
        finish(&mut on_progress, Stage::Instrumental, started);

        // Mix
        let started = begin(&mut on_progress, Stage::Mix);
        let song = self
            .mixer
            .mix(&vocals, &instrumental)
            .map_err(|e| report_failure(&mut on_progress, Stage::Mix, e))?;
        finish(&mut on_progress, Stage::Mix, started);

        let elapsed = run_started.elapsed();
        info!(
            title = %lyrics.title,
            elapsed_sec = elapsed.as_secs_f32(),
            "Song complete"
        );

        Ok(RunResult {
            lyrics,
            vocals,
            instrumental,
            song,
            job,
            elapsed,
        })
    }
}

fn begin<F: FnMut(ProgressEvent)>(on_progress: &mut F, stage: Stage) -> Instant {
    on_progress(ProgressEvent::StageStarted(stage));
    Instant::now()
}

fn finish<F: FnMut(ProgressEvent)>(on_progress: &mut F, stage: Stage, started: Instant) {
    let elapsed = started.elapsed();
    info!(%stage, elapsed_sec = elapsed.as_secs_f32(), "Stage complete");
    on_progress(ProgressEvent::StageCompleted { stage, elapsed });
}

fn report_failure<F: FnMut(ProgressEvent)>(
    on_progress: &mut F,
    stage: Stage,
    err: MelodyError,
) -> MelodyError {
    let stage = err.stage.unwrap_or(stage);
    warn!(%stage, code = err.code.as_str(), "Stage failed: {}", err.message);
    on_progress(ProgressEvent::StageFailed {
        stage,
        message: err.message.clone(),
    });
    err
}
