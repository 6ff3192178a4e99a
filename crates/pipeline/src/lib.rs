//! Core domain for the VibeInvite generation pipeline.
//!
//! This crate contains the state container threaded through the three
//! generation stages, the value types it carries, the error taxonomy, and the
//! port traits implemented by the other crates. It performs no I/O.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | `RequestId`, `RunId` |
//! | [`types`] | Preferences, assets, stage outputs, `Step`, `Timestamp` |
//! | [`state`] | `PipelineState` |
//! | [`errors`] | `PipelineError`, `LlmError`, `StorageError` |
//! | [`ports`] | `LlmProvider`, `ArtifactStore`, `Stage` |
//!
//! ## Privacy
//!
//! Nothing in this crate can hold a photo URL or a personal identifier.
//! Photos are represented by their description only.

pub mod errors;
pub mod identifiers;
pub mod ports;
pub mod state;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use errors::{LlmError, PipelineError, StorageError};
pub use identifiers::{RequestId, RunId, MAX_REQUEST_ID_LEN};
pub use ports::{
    ArtifactLocation, ArtifactStore, CompletionRequest, LlmProvider, ResponseFormat, Stage,
};
pub use state::PipelineState;
pub use types::{
    Assets, AuditReport, BrandPlan, PhotoMetadata, Preferences, Step, Timestamp, VisualStyle,
};
