//! VibeInvite pipeline stages and executor.
//!
//! This crate provides the three generation stages (planner, coder, auditor),
//! their prompt templates, and the [`PipelineExecutor`] that runs them as a
//! fixed linear sequence.
//!
//! ## Architectural Layer
//!
//! **Orchestration layer.** Stages sequence calls between the domain types in
//! the [`pipeline`] crate and the [`pipeline::LlmProvider`] port. Transport
//! details live in the `llm` crate.

pub mod auditor;
pub mod coder;
pub mod executor;
pub mod planner;
pub mod prompts;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use auditor::{AuditRule, Auditor, BackgroundMusicRule};
pub use coder::{Coder, ERROR_DOCUMENT};
pub use executor::{PipelineExecutor, PipelineRun};
pub use planner::Planner;
