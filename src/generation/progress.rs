//! Progress events emitted while a song is generated.
//!
//! The pipeline reports through a caller-supplied callback; the front end
//! decides how to show each stage.

use std::time::Duration;

use crate::types::Stage;

use super::poller::{Observation, PollProgress};

/// One progress report from a pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// A stage began.
    StageStarted(Stage),
    /// A stage finished successfully.
    StageCompleted { stage: Stage, elapsed: Duration },
    /// A stage failed. Fatal unless followed by [`ProgressEvent::TitleFallback`].
    StageFailed { stage: Stage, message: String },
    /// Title generation failed and the fallback title is used instead.
    TitleFallback { title: String },
    /// The instrumental job was accepted by the service.
    JobSubmitted { job_id: String },
    /// One status query of the instrumental job finished.
    JobPolled(PollProgress),
}

impl ProgressEvent {
    /// Returns the stage the event belongs to.
    pub fn stage(&self) -> Stage {
        match self {
            ProgressEvent::StageStarted(stage)
            | ProgressEvent::StageCompleted { stage, .. }
            | ProgressEvent::StageFailed { stage, .. } => *stage,
            ProgressEvent::TitleFallback { .. } => Stage::Title,
            ProgressEvent::JobSubmitted { .. } | ProgressEvent::JobPolled(_) => Stage::Instrumental,
        }
    }

    /// One-line human-readable description.
    pub fn describe(&self) -> String {
        match self {
            ProgressEvent::StageStarted(stage) => format!("Generating {}...", stage),
            ProgressEvent::StageCompleted { stage, elapsed } => {
                format!("{} done in {:.1}s", capitalize(stage.as_str()), elapsed.as_secs_f32())
            }
            ProgressEvent::StageFailed { stage, message } => {
                format!("{} failed: {}", capitalize(stage.as_str()), message)
            }
            ProgressEvent::TitleFallback { title } => {
                format!("Using fallback title \"{}\"", title)
            }
            ProgressEvent::JobSubmitted { job_id } => format!("Instrumental job {} submitted", job_id),
            ProgressEvent::JobPolled(progress) => {
                let status = match &progress.observation {
                    Observation::InProgress(status) => status.as_str().to_string(),
                    Observation::Completed(_) => "completed".to_string(),
                    Observation::Failed(error) => format!("failed ({})", error),
                    Observation::Transient(reason) => format!("status unavailable ({})", reason),
                };
                format!(
                    "Attempt {}/{}: {}",
                    progress.attempt, progress.max_attempts, status
                )
            }
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
