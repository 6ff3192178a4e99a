//! Background job runner.
//!
//! Each accepted request becomes one independent tokio task. The pipeline
//! itself runs in a nested task so that a panic inside a stage is caught
//! here, logged, and recorded as a failed job like any other pipeline error.
//! A failed job never persists an artifact.

use std::sync::Arc;

use nodes::{PipelineExecutor, PipelineRun};
use pipeline::{ArtifactStore, PipelineState, RequestId, Step};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::JobRegistry;

#[derive(Clone)]
pub struct JobRunner {
    executor: Arc<PipelineExecutor>,
    store: Arc<dyn ArtifactStore>,
    jobs: JobRegistry,
}

impl JobRunner {
    pub fn new(
        executor: Arc<PipelineExecutor>,
        store: Arc<dyn ArtifactStore>,
        jobs: JobRegistry,
    ) -> Self {
        Self {
            executor,
            store,
            jobs,
        }
    }

    /// The registry this runner reports to.
    pub fn jobs(&self) -> &JobRegistry {
        &self.jobs
    }

    /// Schedules `state` without waiting for it. The job must already be
    /// registered with [`JobRegistry::accept`].
    pub fn spawn(&self, state: PipelineState) -> JoinHandle<()> {
        let runner = self.clone();
        tokio::spawn(async move { runner.run(state).await })
    }

    /// Runs the pipeline for `state`, persists the document, and records the
    /// outcome in the registry.
    pub async fn run(&self, state: PipelineState) {
        let request_id = state.request_id().clone();
        info!(%request_id, "starting workflow");

        let executor = self.executor.clone();
        let jobs = self.jobs.clone();
        let observed_id = request_id.clone();
        let pipeline = tokio::spawn(async move {
            let observe = move |step: Step| jobs.advance(&observed_id, step);
            executor.run_observed(state, &observe).await
        });

        match pipeline.await {
            Ok(Ok(run)) => self.finish(&request_id, run).await,
            Ok(Err(e)) => {
                error!(%request_id, error = %e, "workflow failed");
                self.jobs.fail(&request_id, e.to_string());
            }
            Err(e) => {
                error!(%request_id, error = %e, "workflow task aborted");
                self.jobs.fail(&request_id, format!("workflow task aborted: {e}"));
            }
        }
    }

    async fn finish(&self, request_id: &RequestId, run: PipelineRun) {
        let report = run.state.audit_report().cloned();
        let html = run.state.html_content().filter(|h| !h.is_empty());

        let artifact = match html {
            Some(html) => match self.store.persist(request_id, html).await {
                Ok(location) => Some(location),
                Err(e) => {
                    error!(%request_id, run_id = %run.run_id, error = %e, "failed to save artifact");
                    self.jobs.fail(request_id, e.to_string());
                    return;
                }
            },
            None => {
                warn!(%request_id, run_id = %run.run_id, "workflow produced no document");
                None
            }
        };

        info!(%request_id, run_id = %run.run_id, "workflow completed");
        self.jobs.complete(request_id, artifact, report);
    }
}
