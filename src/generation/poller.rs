//! Job-completion polling.
//!
//! An explicit state machine (`PollState` + `transition`) driven by an async
//! loop that queries a status closure at a fixed interval until the job
//! reaches a terminal status or the attempt budget runs out. There is no
//! backoff; the worst-case wait is `max_attempts * interval`.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::types::{GenerationJob, JobStatus};

/// Attempt budget and fixed delay between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl PollSettings {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }

    /// Upper bound on total delay between attempts.
    pub fn max_wait(&self) -> Duration {
        self.interval * self.max_attempts
    }
}

/// Result of one status query.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusCheck {
    /// The service answered with a status snapshot.
    Snapshot {
        status: JobStatus,
        result_url: Option<String>,
        error: Option<String>,
    },
    /// The query failed (transport error or non-2xx). Polling continues.
    Transient(String),
}

/// What one attempt revealed, after applying it to the local job view.
#[derive(Debug, Clone, PartialEq)]
pub enum Observation {
    /// Still queued or processing (including completed without a URL).
    InProgress(JobStatus),
    /// Completed with a downloadable result.
    Completed(String),
    /// Failed with the server's error message.
    Failed(String),
    /// The status query itself failed.
    Transient(String),
}

impl Observation {
    /// Reads the observation from the job's latest snapshot.
    pub fn from_job(job: &GenerationJob) -> Self {
        match job.status {
            JobStatus::Completed => match job.result_url.clone() {
                Some(url) => Observation::Completed(url),
                None => Observation::InProgress(JobStatus::Processing),
            },
            JobStatus::Failed => Observation::Failed(
                job.error.clone().unwrap_or_else(|| "unknown error".to_string()),
            ),
            status => Observation::InProgress(status),
        }
    }
}

/// State of a polling run.
#[derive(Debug, Clone, PartialEq)]
pub enum PollState {
    /// Job accepted, no status query made yet.
    Submitted,
    /// At least one query made, job not finished.
    Polling { attempts: u32 },
    /// Job completed; the result can be fetched from `url`.
    Done { url: String, attempts: u32 },
    /// Job failed remotely.
    Failed { error: String, attempts: u32 },
    /// Attempt budget exhausted without a terminal status.
    TimedOut { attempts: u32 },
}

impl PollState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PollState::Done { .. } | PollState::Failed { .. } | PollState::TimedOut { .. }
        )
    }

    /// Number of status queries made so far.
    pub fn attempts(&self) -> u32 {
        match self {
            PollState::Submitted => 0,
            PollState::Polling { attempts }
            | PollState::Done { attempts, .. }
            | PollState::Failed { attempts, .. }
            | PollState::TimedOut { attempts } => *attempts,
        }
    }

    /// Applies the outcome of one attempt.
    ///
    /// Terminal states absorb every further observation.
    pub fn transition(self, observation: &Observation, max_attempts: u32) -> PollState {
        if self.is_terminal() {
            return self;
        }
        let attempts = self.attempts() + 1;

        match observation {
            Observation::Completed(url) => PollState::Done {
                url: url.clone(),
                attempts,
            },
            Observation::Failed(error) => PollState::Failed {
                error: error.clone(),
                attempts,
            },
            Observation::InProgress(_) | Observation::Transient(_) => {
                if attempts >= max_attempts {
                    PollState::TimedOut { attempts }
                } else {
                    PollState::Polling { attempts }
                }
            }
        }
    }
}

/// Terminal outcome of [`poll_job`].
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Done { url: String, attempts: u32 },
    Failed { error: String, attempts: u32 },
    TimedOut { attempts: u32 },
}

/// Progress report emitted after every attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct PollProgress {
    /// 1-based attempt number.
    pub attempt: u32,
    pub max_attempts: u32,
    /// What the attempt observed.
    pub observation: Observation,
}

impl PollProgress {
    /// Share of the attempt budget used, 0-100.
    pub fn percent(&self) -> u8 {
        if self.max_attempts == 0 {
            return 100;
        }
        ((self.attempt.min(self.max_attempts) as f32 / self.max_attempts as f32) * 100.0) as u8
    }
}

/// Polls `check` until the job reaches a terminal state.
///
/// Attempts are strictly sequential; the delay runs only between attempts,
/// never after the last one. Every snapshot is applied to `job`, so the job
/// ends holding the latest monotonic status.
pub async fn poll_job<F, Fut, P>(
    job: &mut GenerationJob,
    settings: PollSettings,
    mut check: F,
    mut on_progress: P,
) -> PollOutcome
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = StatusCheck>,
    P: FnMut(&PollProgress),
{
    if settings.max_attempts == 0 {
        return PollOutcome::TimedOut { attempts: 0 };
    }
    let mut state = PollState::Submitted;

    loop {
        let observation = match check(job.id.clone()).await {
            StatusCheck::Snapshot {
                status,
                result_url,
                error,
            } => {
                job.observe(status, result_url, error);
                Observation::from_job(job)
            }
            StatusCheck::Transient(reason) => {
                warn!(job_id = %job.id, "Status query failed, will retry: {}", reason);
                Observation::Transient(reason)
            }
        };

        state = state.transition(&observation, settings.max_attempts);
        debug!(job_id = %job.id, attempt = state.attempts(), ?observation, "Polled job");

        on_progress(&PollProgress {
            attempt: state.attempts(),
            max_attempts: settings.max_attempts,
            observation,
        });

        state = match state {
            PollState::Done { url, attempts } => return PollOutcome::Done { url, attempts },
            PollState::Failed { error, attempts } => {
                return PollOutcome::Failed { error, attempts }
            }
            PollState::TimedOut { attempts } => return PollOutcome::TimedOut { attempts },
            pending => {
                tokio::time::sleep(settings.interval).await;
                pending
            }
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use tokio::time::Instant;

    fn snapshot(status: JobStatus) -> StatusCheck {
        StatusCheck::Snapshot {
            status,
            result_url: None,
            error: None,
        }
    }

    fn completed(url: &str) -> StatusCheck {
        StatusCheck::Snapshot {
            status: JobStatus::Completed,
            result_url: Some(url.to_string()),
            error: None,
        }
    }

    fn failed(error: &str) -> StatusCheck {
        StatusCheck::Snapshot {
            status: JobStatus::Failed,
            result_url: None,
            error: Some(error.to_string()),
        }
    }

    /// Serves a fixed sequence of checks, repeating the last one forever.
    fn scripted(
        checks: Vec<StatusCheck>,
    ) -> (
        Arc<Mutex<u32>>,
        impl FnMut(String) -> std::future::Ready<StatusCheck>,
    ) {
        let calls = Arc::new(Mutex::new(0u32));
        let counter = Arc::clone(&calls);
        let mut queue: VecDeque<StatusCheck> = checks.into();
        let check = move |_id: String| {
            *counter.lock().unwrap() += 1;
            let next = if queue.len() > 1 {
                queue.pop_front().unwrap()
            } else {
                queue.front().cloned().unwrap()
            };
            std::future::ready(next)
        };
        (calls, check)
    }

    fn settings(max_attempts: u32) -> PollSettings {
        PollSettings::new(max_attempts, Duration::from_secs(5))
    }

    #[test]
    fn transition_table() {
        let s = PollState::Submitted.transition(&Observation::InProgress(JobStatus::Queued), 3);
        assert_eq!(s, PollState::Polling { attempts: 1 });

        let s = s.transition(&Observation::Transient("503".into()), 3);
        assert_eq!(s, PollState::Polling { attempts: 2 });

        let s = s.transition(&Observation::InProgress(JobStatus::Processing), 3);
        assert_eq!(s, PollState::TimedOut { attempts: 3 });

        // Terminal states absorb further observations
        let s = s.transition(&Observation::Completed("u".into()), 3);
        assert_eq!(s, PollState::TimedOut { attempts: 3 });

        let done = PollState::Polling { attempts: 1 }.transition(&Observation::Completed("u".into()), 3);
        assert_eq!(done, PollState::Done { url: "u".into(), attempts: 2 });

        let failed = PollState::Submitted.transition(&Observation::Failed("E".into()), 3);
        assert_eq!(failed, PollState::Failed { error: "E".into(), attempts: 1 });
    }

    #[tokio::test(start_paused = true)]
    async fn completes_after_three_attempts() {
        let (calls, check) = scripted(vec![
            snapshot(JobStatus::Processing),
            snapshot(JobStatus::Processing),
            completed("https://cdn/a.wav"),
        ]);
        let mut job = GenerationJob::submitted("job-1", JobStatus::Queued);
        let start = Instant::now();

        let outcome = poll_job(&mut job, settings(15), check, |_| {}).await;

        assert_eq!(
            outcome,
            PollOutcome::Done {
                url: "https://cdn/a.wav".into(),
                attempts: 3
            }
        );
        assert_eq!(*calls.lock().unwrap(), 3);
        assert_eq!(start.elapsed(), Duration::from_secs(10));
        assert_eq!(job.status, JobStatus::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_stops_polling_immediately() {
        let (calls, check) = scripted(vec![snapshot(JobStatus::Processing), failed("E")]);
        let mut job = GenerationJob::submitted("job-2", JobStatus::Queued);

        let outcome = poll_job(&mut job, settings(15), check, |_| {}).await;

        assert_eq!(
            outcome,
            PollOutcome::Failed {
                error: "E".into(),
                attempts: 2
            }
        );
        assert_eq!(*calls.lock().unwrap(), 2);
        assert_eq!(job.error.as_deref(), Some("E"));
    }

    #[tokio::test(start_paused = true)]
    async fn never_terminal_times_out_within_budget() {
        let (calls, check) = scripted(vec![snapshot(JobStatus::Processing)]);
        let mut job = GenerationJob::submitted("job-3", JobStatus::Queued);
        let settings = settings(15);
        let start = Instant::now();

        let outcome = poll_job(&mut job, settings, check, |_| {}).await;

        assert_eq!(outcome, PollOutcome::TimedOut { attempts: 15 });
        assert_eq!(*calls.lock().unwrap(), 15);
        assert!(start.elapsed() <= settings.max_wait());
    }

    #[tokio::test(start_paused = true)]
    async fn transient_errors_do_not_stop_polling() {
        let (calls, check) = scripted(vec![
            StatusCheck::Transient("HTTP 502".into()),
            StatusCheck::Transient("HTTP 502".into()),
            completed("u"),
        ]);
        let mut job = GenerationJob::submitted("job-4", JobStatus::Queued);

        let outcome = poll_job(&mut job, settings(5), check, |_| {}).await;

        assert!(matches!(outcome, PollOutcome::Done { attempts: 3, .. }));
        assert_eq!(*calls.lock().unwrap(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn completed_without_url_is_not_done() {
        let (calls, check) = scripted(vec![snapshot(JobStatus::Completed)]);
        let mut job = GenerationJob::submitted("job-5", JobStatus::Queued);

        let outcome = poll_job(&mut job, settings(4), check, |_| {}).await;

        assert_eq!(outcome, PollOutcome::TimedOut { attempts: 4 });
        assert_eq!(*calls.lock().unwrap(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn progress_reported_per_attempt() {
        let (_, check) = scripted(vec![
            snapshot(JobStatus::Queued),
            snapshot(JobStatus::Processing),
            completed("u"),
        ]);
        let mut job = GenerationJob::submitted("job-6", JobStatus::Queued);
        let mut reports = Vec::new();

        poll_job(&mut job, settings(10), check, |p| reports.push(p.clone())).await;

        assert_eq!(reports.len(), 3);
        assert_eq!(reports[0].attempt, 1);
        assert_eq!(reports[0].percent(), 10);
        assert_eq!(
            reports[1].observation,
            Observation::InProgress(JobStatus::Processing)
        );
        assert_eq!(reports[2].observation, Observation::Completed("u".into()));
    }

    #[tokio::test]
    async fn zero_budget_times_out_without_querying() {
        let (calls, check) = scripted(vec![completed("u")]);
        let mut job = GenerationJob::submitted("job-7", JobStatus::Queued);

        let outcome = poll_job(&mut job, settings(0), check, |_| {}).await;

        assert_eq!(outcome, PollOutcome::TimedOut { attempts: 0 });
        assert_eq!(*calls.lock().unwrap(), 0);
    }
}
