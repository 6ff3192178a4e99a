//! In-memory job status registry.
//!
//! The registry is the only state shared between concurrent requests. Each
//! pipeline still owns its own [`pipeline::PipelineState`]; the registry only
//! records status transitions, so locks are held for a single map operation
//! and never across an `.await`.
//!
//! Active jobs are always kept. Finished jobs are kept up to a fixed
//! retention count, oldest evicted first.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, PoisonError, RwLock};

use pipeline::{ArtifactLocation, AuditReport, RequestId, Step, Timestamp};
use serde::Serialize;

use crate::ServiceError;

/// Finished records kept by [`JobRegistry::new`].
pub const DEFAULT_RETAINED_JOBS: usize = 1024;

/// Lifecycle of a submitted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Accepted, pipeline not yet started.
    Queued,
    /// A pipeline stage is executing.
    Running,
    /// The pipeline finished; the document was persisted if one was produced.
    Completed,
    /// The pipeline or persistence failed; nothing was persisted.
    Failed,
}

impl JobState {
    /// `true` while the job may still change state.
    pub fn is_active(self) -> bool {
        matches!(self, JobState::Queued | JobState::Running)
    }
}

/// Observable status of one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobRecord {
    pub request_id: RequestId,
    /// Where the job is in its lifecycle.
    pub state: JobState,
    /// Last pipeline step reached.
    pub step: Step,
    /// When `POST /generate` accepted the request.
    pub accepted_at: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<Timestamp>,
    /// Where the document was written, on completion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<ArtifactLocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audit_report: Option<AuditReport>,
    /// Failure reason, on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobRecord {
    fn queued(request_id: RequestId) -> Self {
        Self {
            request_id,
            state: JobState::Queued,
            step: Step::Created,
            accepted_at: Timestamp::now(),
            finished_at: None,
            artifact: None,
            audit_report: None,
            error: None,
        }
    }
}

#[derive(Debug)]
struct Jobs {
    records: HashMap<RequestId, JobRecord>,
    /// Finished ids, oldest first.
    finished: VecDeque<RequestId>,
    retain: usize,
}

impl Jobs {
    fn finish(&mut self, request_id: &RequestId) {
        self.finished.push_back(request_id.clone());
        while self.finished.len() > self.retain {
            if let Some(oldest) = self.finished.pop_front() {
                self.records.remove(&oldest);
            }
        }
    }
}

/// Shared, cloneable handle to the status of every known request.
#[derive(Debug, Clone)]
pub struct JobRegistry {
    jobs: Arc<RwLock<Jobs>>,
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::with_retention(DEFAULT_RETAINED_JOBS)
    }
}

impl JobRegistry {
    /// A registry with [`DEFAULT_RETAINED_JOBS`] retention.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry keeping at most `retain` finished records.
    pub fn with_retention(retain: usize) -> Self {
        Self {
            jobs: Arc::new(RwLock::new(Jobs {
                records: HashMap::new(),
                finished: VecDeque::new(),
                retain,
            })),
        }
    }

    /// Registers a queued job, refusing ids whose job is still active.
    ///
    /// A finished job with the same id is replaced.
    pub fn accept(&self, request_id: &RequestId) -> Result<(), ServiceError> {
        let mut jobs = self.jobs.write().unwrap_or_else(PoisonError::into_inner);
        match jobs.records.get(request_id).map(|j| j.state.is_active()) {
            Some(true) => return Err(ServiceError::AlreadyInProgress(request_id.to_string())),
            Some(false) => jobs.finished.retain(|id| id != request_id),
            None => {}
        }
        jobs.records
            .insert(request_id.clone(), JobRecord::queued(request_id.clone()));
        Ok(())
    }

    /// Records that the pipeline reached `step`.
    pub fn advance(&self, request_id: &RequestId, step: Step) {
        let mut jobs = self.jobs.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(job) = jobs.records.get_mut(request_id) {
            job.state = JobState::Running;
            job.step = step;
        }
    }

    /// Marks the job completed.
    pub fn complete(
        &self,
        request_id: &RequestId,
        artifact: Option<ArtifactLocation>,
        audit_report: Option<AuditReport>,
    ) {
        self.finish(request_id, |job| {
            job.state = JobState::Completed;
            job.step = Step::Done;
            job.artifact = artifact;
            job.audit_report = audit_report;
        });
    }

    /// Marks the job failed with `reason`.
    pub fn fail(&self, request_id: &RequestId, reason: String) {
        self.finish(request_id, |job| {
            job.state = JobState::Failed;
            job.error = Some(reason);
        });
    }

    /// Snapshot of the job's record, if it is still known.
    pub fn get(&self, request_id: &RequestId) -> Option<JobRecord> {
        self.jobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .records
            .get(request_id)
            .cloned()
    }

    /// Number of records currently held.
    pub fn len(&self) -> usize {
        self.jobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .records
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn finish(&self, request_id: &RequestId, f: impl FnOnce(&mut JobRecord)) {
        let mut jobs = self.jobs.write().unwrap_or_else(PoisonError::into_inner);
        let Some(job) = jobs.records.get_mut(request_id) else {
            return;
        };
        if !job.state.is_active() {
            return;
        }
        f(job);
        job.finished_at = Some(Timestamp::now());
        jobs.finish(request_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> RequestId {
        RequestId::new(s).unwrap()
    }

    #[test]
    fn lifecycle_transitions() {
        let jobs = JobRegistry::new();
        jobs.accept(&id("req-1")).unwrap();
        assert_eq!(jobs.get(&id("req-1")).unwrap().state, JobState::Queued);

        jobs.advance(&id("req-1"), Step::Coding);
        let job = jobs.get(&id("req-1")).unwrap();
        assert_eq!(job.state, JobState::Running);
        assert_eq!(job.step, Step::Coding);

        jobs.complete(&id("req-1"), None, Some(AuditReport::from_issues(vec![])));
        let job = jobs.get(&id("req-1")).unwrap();
        assert_eq!(job.state, JobState::Completed);
        assert_eq!(job.step, Step::Done);
        assert!(job.finished_at.is_some());
    }

    #[test]
    fn active_ids_cannot_be_resubmitted() {
        let jobs = JobRegistry::new();
        jobs.accept(&id("req-1")).unwrap();
        assert!(matches!(
            jobs.accept(&id("req-1")),
            Err(ServiceError::AlreadyInProgress(_))
        ));

        jobs.fail(&id("req-1"), "boom".into());
        assert_eq!(jobs.get(&id("req-1")).unwrap().error.as_deref(), Some("boom"));
        jobs.accept(&id("req-1")).unwrap();
        assert_eq!(jobs.get(&id("req-1")).unwrap().state, JobState::Queued);
    }

    #[test]
    fn updates_to_unknown_ids_are_ignored() {
        let jobs = JobRegistry::new();
        jobs.advance(&id("ghost"), Step::Planning);
        assert!(jobs.get(&id("ghost")).is_none());
    }

    #[test]
    fn finished_records_are_evicted_oldest_first() {
        let jobs = JobRegistry::with_retention(2);
        for n in 0..5 {
            let request_id = id(&format!("req-{n}"));
            jobs.accept(&request_id).unwrap();
            jobs.complete(&request_id, None, None);
        }

        assert_eq!(jobs.len(), 2);
        assert!(jobs.get(&id("req-2")).is_none());
        assert!(jobs.get(&id("req-3")).is_some());
        assert!(jobs.get(&id("req-4")).is_some());
    }

    #[test]
    fn active_records_are_never_evicted() {
        let jobs = JobRegistry::with_retention(1);
        jobs.accept(&id("running")).unwrap();
        jobs.advance(&id("running"), Step::Planning);
        for n in 0..3 {
            let request_id = id(&format!("done-{n}"));
            jobs.accept(&request_id).unwrap();
            jobs.fail(&request_id, "boom".into());
        }

        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs.get(&id("running")).unwrap().state, JobState::Running);
        assert!(jobs.get(&id("done-2")).is_some());
    }

    #[test]
    fn resubmitted_id_is_not_evicted_by_its_earlier_run() {
        let jobs = JobRegistry::with_retention(2);
        jobs.accept(&id("a")).unwrap();
        jobs.complete(&id("a"), None, None);
        jobs.accept(&id("b")).unwrap();
        jobs.complete(&id("b"), None, None);

        jobs.accept(&id("a")).unwrap();
        jobs.complete(&id("a"), None, None);
        jobs.accept(&id("c")).unwrap();
        jobs.complete(&id("c"), None, None);

        assert!(jobs.get(&id("b")).is_none());
        assert!(jobs.get(&id("a")).is_some());
        assert!(jobs.get(&id("c")).is_some());
    }

    #[test]
    fn record_serializes_snake_case_state() {
        let jobs = JobRegistry::new();
        jobs.accept(&id("req-1")).unwrap();
        let json = serde_json::to_value(jobs.get(&id("req-1")).unwrap()).unwrap();
        assert_eq!(json["state"], "queued");
        assert_eq!(json["step"], "CREATED");
        assert!(json.get("artifact").is_none());
    }
}
