//! Error types for melody-maker.
//!
//! Defines the error codes and the stage-tagged error type used throughout
//! the pipeline for consistent error handling and reporting.

use std::fmt;
use std::time::Duration;

use crate::types::Stage;

/// Error codes identifying the kind of failure.
///
/// Every code except `InvalidRequest` and `InvalidConfig` is produced by a
/// pipeline stage and carries that stage alongside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// A remote call failed at the transport level or returned a non-success status.
    /// Trigger: network error, timeout, 4xx/5xx, malformed response body.
    GenerationFailed,

    /// The remote audio job reported a terminal failure.
    /// Trigger: status endpoint returned `failed` with an error message.
    JobFailed,

    /// The remote audio job did not finish within the attempt budget.
    /// Trigger: `max_attempts` status queries without a terminal status.
    JobTimedOut,

    /// Local decoding or encoding of audio failed.
    /// Trigger: corrupt WAV, unsupported input format, encoder error.
    MixFailed,

    /// The song request is invalid.
    /// Trigger: unknown voice, keywords too long.
    InvalidRequest,

    /// The configuration is invalid.
    /// Trigger: missing API key, zero attempts, unsupported bitrate.
    InvalidConfig,
}

impl ErrorCode {
    /// Returns the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::GenerationFailed => "GENERATION_FAILED",
            ErrorCode::JobFailed => "JOB_FAILED",
            ErrorCode::JobTimedOut => "JOB_TIMED_OUT",
            ErrorCode::MixFailed => "MIX_FAILED",
            ErrorCode::InvalidRequest => "INVALID_REQUEST",
            ErrorCode::InvalidConfig => "INVALID_CONFIG",
        }
    }

    /// Returns a human-readable description of the error.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::GenerationFailed => "A remote generation request failed",
            ErrorCode::JobFailed => "The remote audio generation job failed",
            ErrorCode::JobTimedOut => "The remote audio generation job did not finish in time",
            ErrorCode::MixFailed => "Mixing vocals and instrumental failed",
            ErrorCode::InvalidRequest => "The song request is invalid",
            ErrorCode::InvalidConfig => "The configuration is invalid",
        }
    }

    /// Returns a recovery hint suggesting how to resolve this error.
    pub fn recovery_hint(&self) -> &'static str {
        match self {
            ErrorCode::GenerationFailed => {
                "Check network access and the API key, then run the pipeline again"
            }
            ErrorCode::JobFailed => {
                "Try a different prompt or fewer steps, then run the pipeline again"
            }
            ErrorCode::JobTimedOut => {
                "Raise --attempts or --interval, or request a shorter instrumental"
            }
            ErrorCode::MixFailed => {
                "Make sure both stems are WAV audio; keep the stems with --keep-stems to inspect them"
            }
            ErrorCode::InvalidRequest => {
                "Run with --list-voices to see valid voices and keep keywords short"
            }
            ErrorCode::InvalidConfig => {
                "Set MELODY_API_KEY (or AIML_API_KEY) and check the MELODY_* tuning variables"
            }
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Main error type for pipeline operations.
#[derive(Debug)]
pub struct MelodyError {
    /// The error code identifying the type of error.
    pub code: ErrorCode,
    /// The pipeline stage that failed, if any.
    pub stage: Option<Stage>,
    /// Human-readable error message with context.
    pub message: String,
    /// Optional underlying cause of the error.
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl MelodyError {
    /// Creates a new MelodyError with the given code and message.
    pub fn new(code: ErrorCode, stage: Option<Stage>, message: impl Into<String>) -> Self {
        Self {
            code,
            stage,
            message: message.into(),
            source: None,
        }
    }

    /// Attaches an underlying cause.
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Creates a GENERATION_FAILED error for the given stage.
    pub fn generation_failed(stage: Stage, reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::GenerationFailed, Some(stage), reason)
    }

    /// Creates a GENERATION_FAILED error from a transport error.
    pub fn transport(stage: Stage, err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            format!("request timed out: {}", err)
        } else {
            format!("request failed: {}", err)
        };
        Self::generation_failed(stage, message).with_source(err)
    }

    /// Creates a JOB_FAILED error carrying the server-provided message.
    pub fn job_failed(job_id: &str, error: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::JobFailed,
            Some(Stage::Instrumental),
            format!("job {} failed: {}", job_id, error.into()),
        )
    }

    /// Creates a JOB_TIMED_OUT error.
    pub fn job_timed_out(job_id: &str, attempts: u32, interval: Duration) -> Self {
        Self::new(
            ErrorCode::JobTimedOut,
            Some(Stage::Instrumental),
            format!(
                "job {} not finished after {} attempts ({}s apart)",
                job_id,
                attempts,
                interval.as_secs_f32()
            ),
        )
    }

    /// Creates a MIX_FAILED error.
    pub fn mix_failed(reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::MixFailed, Some(Stage::Mix), reason)
    }

    /// Creates an INVALID_REQUEST error.
    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, None, reason)
    }

    /// Creates an INVALID_CONFIG error.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidConfig, None, reason)
    }

    /// Returns true if the pipeline may continue past this error.
    ///
    /// Only a title failure is recoverable; it is replaced by the fallback title.
    pub fn is_recoverable(&self) -> bool {
        self.code == ErrorCode::GenerationFailed && self.stage == Some(Stage::Title)
    }
}

impl fmt::Display for MelodyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.stage {
            Some(stage) => write!(
                f,
                "[{}] {} stage: {}. Recovery: {}",
                self.code,
                stage,
                self.message,
                self.code.recovery_hint()
            ),
            None => write!(
                f,
                "[{}] {}. Recovery: {}",
                self.code,
                self.message,
                self.code.recovery_hint()
            ),
        }
    }
}

impl std::error::Error for MelodyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Result type alias using MelodyError.
pub type Result<T> = std::result::Result<T, MelodyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_as_str() {
        assert_eq!(ErrorCode::GenerationFailed.as_str(), "GENERATION_FAILED");
        assert_eq!(ErrorCode::JobFailed.as_str(), "JOB_FAILED");
        assert_eq!(ErrorCode::JobTimedOut.as_str(), "JOB_TIMED_OUT");
        assert_eq!(ErrorCode::MixFailed.as_str(), "MIX_FAILED");
        assert_eq!(ErrorCode::InvalidRequest.as_str(), "INVALID_REQUEST");
        assert_eq!(ErrorCode::InvalidConfig.as_str(), "INVALID_CONFIG");
    }

    #[test]
    fn error_code_recovery_hints_not_empty() {
        for code in [
            ErrorCode::GenerationFailed,
            ErrorCode::JobFailed,
            ErrorCode::JobTimedOut,
            ErrorCode::MixFailed,
            ErrorCode::InvalidRequest,
            ErrorCode::InvalidConfig,
        ] {
            assert!(!code.recovery_hint().is_empty());
            assert!(!code.description().is_empty());
        }
    }

    #[test]
    fn display_includes_stage() {
        let err = MelodyError::generation_failed(Stage::Vocals, "HTTP 500");
        let text = err.to_string();
        assert!(text.contains("GENERATION_FAILED"));
        assert!(text.contains("vocals stage"));
        assert!(text.contains("HTTP 500"));
        assert!(text.contains("Recovery:"));
    }

    #[test]
    fn job_errors_are_tagged_instrumental() {
        let failed = MelodyError::job_failed("abc", "out of credits");
        assert_eq!(failed.stage, Some(Stage::Instrumental));
        assert!(failed.message.contains("out of credits"));

        let timed_out = MelodyError::job_timed_out("abc", 15, Duration::from_secs(5));
        assert_eq!(timed_out.code, ErrorCode::JobTimedOut);
        assert!(timed_out.message.contains("15 attempts"));
    }

    #[test]
    fn only_title_failure_is_recoverable() {
        assert!(MelodyError::generation_failed(Stage::Title, "x").is_recoverable());
        assert!(!MelodyError::generation_failed(Stage::Lyrics, "x").is_recoverable());
        assert!(!MelodyError::mix_failed("x").is_recoverable());
        assert!(!MelodyError::job_failed("id", "x").is_recoverable());
    }
}
