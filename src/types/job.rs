//! GenerationJob type for tracking remote audio generation.
//!
//! The job itself lives on the remote service. Locally only its id and the
//! latest status snapshot are held; snapshots are applied monotonically.

use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Status of a remote generation job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Accepted, waiting for a worker.
    #[default]
    Queued,
    /// Actively generating audio.
    Processing,
    /// Finished with a downloadable result.
    Completed,
    /// Finished with an error.
    Failed,
}

impl JobStatus {
    /// Parses a status string from the remote service.
    ///
    /// Unknown strings are treated as in-progress so polling continues.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "queued" | "pending" | "waiting" => JobStatus::Queued,
            "completed" | "complete" | "succeeded" | "success" => JobStatus::Completed,
            "failed" | "error" | "cancelled" | "canceled" => JobStatus::Failed,
            _ => JobStatus::Processing,
        }
    }

    /// Returns true if the job is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Position in the lifecycle; statuses never move to a lower rank.
    fn rank(&self) -> u8 {
        match self {
            JobStatus::Queued => 0,
            JobStatus::Processing => 1,
            JobStatus::Completed | JobStatus::Failed => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

/// Local view of a remote generation job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationJob {
    /// Opaque job identifier assigned by the service.
    pub id: String,

    /// Latest observed status.
    pub status: JobStatus,

    /// Download URL of the result, once completed.
    pub result_url: Option<String>,

    /// Server-provided error message, once failed.
    pub error: Option<String>,

    /// Number of status snapshots observed.
    pub snapshots: u32,

    /// When the job was submitted.
    #[serde(with = "system_time_serde")]
    pub submitted_at: SystemTime,

    /// When the job reached a terminal status (None until then).
    #[serde(with = "option_system_time_serde")]
    pub finished_at: Option<SystemTime>,
}

impl GenerationJob {
    /// Creates a job from a submission response.
    pub fn submitted(id: impl Into<String>, status: JobStatus) -> Self {
        let mut job = Self {
            id: id.into(),
            status: JobStatus::Queued,
            result_url: None,
            error: None,
            snapshots: 0,
            submitted_at: SystemTime::now(),
            finished_at: None,
        };
        // A submission can only report queued or processing.
        if status == JobStatus::Processing {
            job.status = status;
        }
        job
    }

    /// Applies a status snapshot.
    ///
    /// Snapshots that would move the status backwards, or that arrive after a
    /// terminal status, are ignored. A `completed` snapshot without a result
    /// URL is recorded as `processing`: the job is not done until it can be
    /// downloaded. Returns true if the snapshot changed the status.
    pub fn observe(
        &mut self,
        status: JobStatus,
        result_url: Option<String>,
        error: Option<String>,
    ) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.snapshots += 1;

        let status = match (status, result_url.as_deref()) {
            (JobStatus::Completed, None) | (JobStatus::Completed, Some("")) => JobStatus::Processing,
            _ => status,
        };

        if status.rank() < self.status.rank() {
            return false;
        }

        let changed = status != self.status;
        self.status = status;
        match status {
            JobStatus::Completed => self.result_url = result_url,
            JobStatus::Failed => {
                self.error = Some(error.unwrap_or_else(|| "unknown error".to_string()))
            }
            _ => {}
        }
        if status.is_terminal() {
            self.finished_at = Some(SystemTime::now());
        }
        changed
    }
}

/// Custom serde implementation for SystemTime.
mod system_time_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    pub fn serialize<S>(time: &SystemTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let duration = time.duration_since(UNIX_EPOCH).unwrap_or(Duration::ZERO);
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<SystemTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(UNIX_EPOCH + Duration::from_secs(secs))
    }
}

/// Custom serde implementation for Option<SystemTime>.
mod option_system_time_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    pub fn serialize<S>(time: &Option<SystemTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        time.map(|t| t.duration_since(UNIX_EPOCH).unwrap_or(Duration::ZERO).as_secs())
            .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<SystemTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let opt = Option::<u64>::deserialize(deserializer)?;
        Ok(opt.map(|secs| UNIX_EPOCH + Duration::from_secs(secs)))
    }
}
