//! Port traits implemented by the orchestration and infrastructure crates.
//!
//! | Trait | Implemented in |
//! |-------|----------------|
//! | [`LlmProvider`] | `llm` |
//! | [`ArtifactStore`] | `storage` |
//! | [`Stage`] | `nodes` |

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;

use crate::{LlmError, PipelineError, PipelineState, RequestId, StorageError, Step};

// ---------------------------------------------------------------------------
// Text generation
// ---------------------------------------------------------------------------

/// Shape of the reply requested from the generation service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ResponseFormat {
    /// Free-form text.
    Text,
    /// A single JSON object.
    JsonObject,
}

/// One completion call: a system prompt and a user message.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Instructions for the model.
    pub system: String,
    /// The request itself.
    pub user: String,
    pub temperature: f32,
    pub response_format: ResponseFormat,
}

impl CompletionRequest {
    /// Temperature used by every stage.
    pub const DEFAULT_TEMPERATURE: f32 = 0.7;

    /// A free-text completion request.
    pub fn text(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            temperature: Self::DEFAULT_TEMPERATURE,
            response_format: ResponseFormat::Text,
        }
    }

    /// A completion request whose reply must be a JSON object.
    pub fn json(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            response_format: ResponseFormat::JsonObject,
            ..Self::text(system, user)
        }
    }
}

/// A hosted language model.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Sends one completion request and returns the reply text.
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError>;
}

// ---------------------------------------------------------------------------
// Artifact persistence
// ---------------------------------------------------------------------------

/// Where a finished artifact was written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactLocation(PathBuf);

impl ArtifactLocation {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

impl std::fmt::Display for ArtifactLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Durable storage for generated documents, keyed by request id.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Writes `html` for `request_id`, replacing any earlier artifact.
    async fn persist(
        &self,
        request_id: &RequestId,
        html: &str,
    ) -> Result<ArtifactLocation, StorageError>;
}

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

/// One step of the fixed generation sequence.
///
/// A stage receives the full accumulated state and returns it with exactly
/// its own output set. Stage-level generation failures are absorbed by the
/// stage; an `Err` terminates the run.
#[async_trait]
pub trait Stage: Send + Sync {
    /// The progress label this stage records.
    fn step(&self) -> Step;

    /// Runs the stage, returning `state` with this stage's output set and
    /// `current_step` equal to [`Stage::step`].
    async fn run(&self, state: PipelineState) -> Result<PipelineState, PipelineError>;
}
