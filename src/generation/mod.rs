//! Song generation.
//!
//! The stage pipeline, the job poller it drives for the instrumental, and
//! the progress events it reports.

pub mod pipeline;
pub mod poller;
pub mod progress;

// Re-export commonly used items
pub use pipeline::{RunResult, SongPipeline};
pub use poller::{
    poll_job, Observation, PollOutcome, PollProgress, PollSettings, PollState, StatusCheck,
};
pub use progress::ProgressEvent;
