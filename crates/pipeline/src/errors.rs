//! Error types for the generation pipeline domain.
//!
//! [`PipelineError`] covers conditions that terminate a pipeline run. Stage
//! fallbacks absorb [`LlmError`], so a generation failure alone never becomes
//! a [`PipelineError`]. [`StorageError`] is raised by artifact persistence
//! after the pipeline has finished.

use thiserror::Error;

use crate::Step;

// ---------------------------------------------------------------------------
// Pipeline-level errors
// ---------------------------------------------------------------------------

/// Errors that terminate a pipeline run without producing an artifact.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A stage ran before the stage that owns one of its inputs.
    #[error("{stage} stage is missing its input '{field}'")]
    MissingStageInput {
        /// Step label of the stage that could not run.
        stage: Step,
        /// Name of the state field that was not yet set.
        field: &'static str,
    },

    /// A stage tried to overwrite a field already set by an earlier run.
    #[error("state field '{field}' was already set")]
    StageOutputAlreadySet {
        /// Name of the write-once state field.
        field: &'static str,
    },

    /// A stage failed in a way its own fallback does not cover.
    #[error("{stage} stage failed: {reason}")]
    StageFailed {
        /// Step label of the failing stage.
        stage: Step,
        /// Human-readable description of the failure.
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// Generation errors
// ---------------------------------------------------------------------------

/// Failures of the external text-generation service.
#[derive(Debug, Error)]
pub enum LlmError {
    /// The request could not be sent or the connection failed.
    #[error("transport error: {0}")]
    Transport(String),

    /// The call did not complete within the configured timeout.
    #[error("generation timed out after {seconds}s")]
    Timeout {
        /// Configured timeout.
        seconds: u64,
    },

    /// The service answered with a non-success status.
    #[error("API error (status {status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body or error message.
        message: String,
    },

    /// The response could not be interpreted.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

// ---------------------------------------------------------------------------
// Storage errors
// ---------------------------------------------------------------------------

/// Failures while persisting a finished artifact.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The request id cannot be used to name a file.
    #[error("request id '{0}' cannot be used as an artifact name")]
    UnsafeName(String),

    /// The filesystem rejected the write.
    #[error("failed to write artifact '{path}': {source}")]
    Io {
        /// Target path.
        path: String,
        #[source]
        source: std::io::Error,
    },
}
