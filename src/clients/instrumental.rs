//! Asynchronous audio-generation client for the instrumental track.
//!
//! Generation takes longer than an HTTP request may stay open, so the
//! service works on a job: submit once, poll the status endpoint, then
//! download the result from the URL the finished job reports.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::audio::decode_wav;
use crate::config::InstrumentalConfig;
use crate::error::{MelodyError, Result};
use crate::generation::poller::{poll_job, PollOutcome, PollProgress, PollSettings, StatusCheck};
use crate::types::{AudioAsset, AudioFormat, GenerationJob, JobStatus, Stage};

use super::http::{error_body, ApiEndpoint};

const GENERATE_AUDIO_PATH: &str = "/v2/generate/audio";

#[derive(Debug, Serialize)]
struct SubmitRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    seconds_start: u32,
    seconds_total: u32,
    steps: u32,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    #[serde(alias = "generation_id")]
    id: String,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    audio_file: Option<AudioFile>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct AudioFile {
    #[serde(default)]
    url: Option<String>,
}

impl StatusResponse {
    fn into_check(self) -> StatusCheck {
        let Some(status) = self.status else {
            return StatusCheck::Transient("status field missing".to_string());
        };
        StatusCheck::Snapshot {
            status: JobStatus::parse(&status),
            result_url: self
                .audio_file
                .and_then(|f| f.url)
                .filter(|u| !u.trim().is_empty()),
            error: self.error.and_then(error_message),
        }
    }
}

/// Extracts a message from an error that may be a string or an object.
fn error_message(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Object(ref map) => match map.get("message") {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            _ => Some(value.to_string()),
        },
        other => Some(other.to_string()),
    }
}

/// Submits instrumental jobs and waits for them to finish.
#[derive(Debug, Clone)]
pub struct AsyncAudioGenerationClient {
    client: Client,
    endpoint: ApiEndpoint,
    config: InstrumentalConfig,
}

impl AsyncAudioGenerationClient {
    pub fn new(client: Client, endpoint: ApiEndpoint, config: InstrumentalConfig) -> Self {
        Self {
            client,
            endpoint,
            config,
        }
    }

    /// Submits a generation job.
    ///
    /// Only a 201 response is accepted; anything else fails the stage and no
    /// polling should follow.
    pub async fn submit(&self, prompt: &str, duration_sec: u32, steps: u32) -> Result<GenerationJob> {
        let body = SubmitRequest {
            model: &self.config.model,
            prompt,
            seconds_start: 0,
            seconds_total: duration_sec,
            steps,
        };

        debug!(prompt, duration_sec, steps, "Submitting instrumental job");

        let response = self
            .client
            .post(self.endpoint.url(GENERATE_AUDIO_PATH))
            .bearer_auth(self.endpoint.api_key())
            .json(&body)
            .send()
            .await
            .map_err(|e| MelodyError::transport(Stage::Instrumental, e))?;

        let status = response.status();
        if status != StatusCode::CREATED {
            let body = error_body(response).await;
            return Err(MelodyError::generation_failed(
                Stage::Instrumental,
                format!("job submission rejected with HTTP {}: {}", status, body),
            ));
        }

        let parsed: SubmitResponse = response.json().await.map_err(|e| {
            MelodyError::generation_failed(
                Stage::Instrumental,
                format!("invalid submission response: {}", e),
            )
        })?;

        let status = parsed
            .status
            .as_deref()
            .map(JobStatus::parse)
            .unwrap_or_default();
        info!(job_id = %parsed.id, status = status.as_str(), "Instrumental job submitted");
        Ok(GenerationJob::submitted(parsed.id, status))
    }

    /// Queries the job status once.
    ///
    /// Transport errors, non-2xx responses and unreadable bodies come back
    /// as [`StatusCheck::Transient`].
    pub async fn query_status(&self, job_id: &str) -> StatusCheck {
        let response = match self
            .client
            .get(self.endpoint.url(GENERATE_AUDIO_PATH))
            .bearer_auth(self.endpoint.api_key())
            .query(&[("generation_id", job_id)])
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return StatusCheck::Transient(format!("request failed: {}", e)),
        };

        let status = response.status();
        if !status.is_success() {
            let body = error_body(response).await;
            return StatusCheck::Transient(format!("HTTP {}: {}", status, body));
        }

        match response.json::<StatusResponse>().await {
            Ok(parsed) => parsed.into_check(),
            Err(e) => StatusCheck::Transient(format!("invalid status response: {}", e)),
        }
    }

    /// Polls `job_id` and downloads the result.
    pub async fn poll_until_done(
        &self,
        job_id: &str,
        max_attempts: u32,
        poll_interval: Duration,
    ) -> Result<AudioAsset> {
        let mut job = GenerationJob::submitted(job_id, JobStatus::Queued);
        self.poll_until_done_with_progress(
            &mut job,
            PollSettings::new(max_attempts, poll_interval),
            |_| {},
        )
        .await
    }

    /// Polls the job, reporting each attempt, and downloads the result.
    ///
    /// A remote failure becomes JOB_FAILED with the server's message; an
    /// exhausted budget becomes JOB_TIMED_OUT.
    pub async fn poll_until_done_with_progress<P>(
        &self,
        job: &mut GenerationJob,
        settings: PollSettings,
        on_progress: P,
    ) -> Result<AudioAsset>
    where
        P: FnMut(&PollProgress),
    {
        let outcome = poll_job(
            job,
            settings,
            |id| async move { self.query_status(&id).await },
            on_progress,
        )
        .await;

        match outcome {
            PollOutcome::Done { url, attempts } => {
                info!(job_id = %job.id, attempts, "Instrumental job completed");
                self.fetch_result(&url).await
            }
            PollOutcome::Failed { error, .. } => Err(MelodyError::job_failed(&job.id, error)),
            PollOutcome::TimedOut { attempts } => Err(MelodyError::job_timed_out(
                &job.id,
                attempts,
                settings.interval,
            )),
        }
    }

    /// Downloads the finished audio from its result URL.
    pub async fn fetch_result(&self, url: &str) -> Result<AudioAsset> {
        debug!(url, "Downloading instrumental");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| MelodyError::transport(Stage::Instrumental, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = error_body(response).await;
            return Err(MelodyError::generation_failed(
                Stage::Instrumental,
                format!("result download failed with HTTP {}: {}", status, body),
            ));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| MelodyError::transport(Stage::Instrumental, e))?
            .to_vec();

        if bytes.is_empty() {
            return Err(MelodyError::generation_failed(
                Stage::Instrumental,
                "result download was empty",
            ));
        }

        let format = AudioFormat::sniff(&bytes).unwrap_or(AudioFormat::Wav);
        let mut asset = AudioAsset::new(Stage::Instrumental, format, bytes);
        if format == AudioFormat::Wav {
            if let Ok(pcm) = decode_wav(asset.bytes()) {
                asset = asset.with_duration_hint(pcm.duration_sec());
            }
        }
        Ok(asset)
    }
}
