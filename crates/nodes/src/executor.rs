//! The pipeline executor: runs planner, coder and auditor strictly in order.
//!
//! The sequence is fixed. Every stage runs exactly once, no stage output
//! decides which stage runs next, and an invalid audit report still completes
//! the run. The only way a run ends early is a stage returning `Err`.

use std::sync::Arc;

use pipeline::{LlmProvider, PipelineError, PipelineState, RunId, Stage, Step};
use tracing::{info, info_span, Instrument};

use crate::{Auditor, Coder, Planner};

/// A finished run.
#[derive(Debug)]
pub struct PipelineRun {
    /// Id attached to this run's tracing span.
    pub run_id: RunId,
    /// Final state, every stage output set.
    pub state: PipelineState,
    /// Steps executed, in order.
    pub steps: Vec<Step>,
}

/// Runs the fixed stage sequence over a [`PipelineState`].
pub struct PipelineExecutor {
    stages: Vec<Arc<dyn Stage>>,
}

impl PipelineExecutor {
    /// Builds the standard planner → coder → auditor sequence.
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        let stages: Vec<Arc<dyn Stage>> = vec![
            Arc::new(Planner::new(llm.clone())),
            Arc::new(Coder::new(llm)),
            Arc::new(Auditor::default()),
        ];
        Self { stages }
    }

    #[cfg(test)]
    fn with_stages(stages: Vec<Arc<dyn Stage>>) -> Self {
        Self { stages }
    }

    /// Runs every stage on `state`.
    pub async fn run(&self, state: PipelineState) -> Result<PipelineRun, PipelineError> {
        self.run_observed(state, &|_| {}).await
    }

    /// Runs every stage, calling `observe` with each step as it starts and
    /// with [`Step::Done`] once the last stage has finished.
    pub async fn run_observed(
        &self,
        mut state: PipelineState,
        observe: &(dyn Fn(Step) + Send + Sync),
    ) -> Result<PipelineRun, PipelineError> {
        let run_id = RunId::new_random();
        let span = info_span!("pipeline", request_id = %state.request_id(), %run_id);

        async move {
            info!("starting workflow");
            let mut steps = Vec::with_capacity(self.stages.len());
            for stage in &self.stages {
                let step = stage.step();
                observe(step);
                state = stage
                    .run(state)
                    .instrument(info_span!("stage", %step))
                    .await?;
                if state.current_step() != step {
                    return Err(PipelineError::StageFailed {
                        stage: step,
                        reason: format!("stage left current_step at {}", state.current_step()),
                    });
                }
                steps.push(step);
            }
            observe(Step::Done);
            info!(steps = steps.len(), "workflow completed");
            Ok(PipelineRun {
                run_id,
                state,
                steps,
            })
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use pipeline::{Assets, PhotoMetadata, Preferences, RequestId};

    use super::*;
    use crate::auditor::BGM_MISSING;
    use crate::coder::{inject_bootstrap, photo_indices, ERROR_DOCUMENT};
    use crate::testing::{Reply, ScriptedProvider};

    fn state(id: &str, color: &str, photos: usize, bgm: Option<&str>) -> PipelineState {
        PipelineState::new(
            RequestId::new(id).unwrap(),
            Preferences {
                style: "Garden Party".into(),
                primary_color: color.into(),
                page_format: "long".into(),
                bgm_url: bgm.map(str::to_string),
            },
            Assets {
                photos: (0..photos)
                    .map(|i| PhotoMetadata {
                        description: Some(format!("photo {i}")),
                    })
                    .collect(),
            },
        )
    }

    #[tokio::test]
    async fn steps_run_in_fixed_order() {
        let executor = PipelineExecutor::new(Arc::new(ScriptedProvider::offline()));
        let seen = Mutex::new(Vec::new());
        let run = executor
            .run_observed(state("req-1", "", 0, None), &|s| seen.lock().unwrap().push(s))
            .await
            .unwrap();

        assert_eq!(run.steps, vec![Step::Planning, Step::Coding, Step::Auditing]);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![Step::Planning, Step::Coding, Step::Auditing, Step::Done]
        );
        assert_eq!(run.state.current_step(), Step::Auditing);
    }

    #[tokio::test]
    async fn offline_generation_still_completes_with_fallbacks() {
        let executor = PipelineExecutor::new(Arc::new(ScriptedProvider::offline()));
        let run = executor.run(state("req-a", "#FF0000", 2, None)).await.unwrap();

        let plan = run.state.brand_plan().unwrap();
        assert_eq!(plan.visual_style.primary_color, "#FF0000");
        let id = RequestId::new("req-a").unwrap();
        assert_eq!(
            run.state.html_content(),
            Some(inject_bootstrap(ERROR_DOCUMENT, &id).as_str())
        );
        assert!(run.state.html_content().unwrap().contains("window.PROJECT_ID = 'req-a';"));
        assert!(run.state.audit_report().unwrap().valid);
    }

    #[tokio::test]
    async fn failed_audit_does_not_stop_the_run() {
        let llm = Arc::new(ScriptedProvider::new(
            Reply::Fail,
            Reply::Text("<html><head></head><body>silent</body></html>".into()),
        ));
        let run = PipelineExecutor::new(llm)
            .run(state("req-b", "", 0, Some("song.mp3")))
            .await
            .unwrap();

        let report = run.state.audit_report().unwrap();
        assert!(!report.valid);
        assert_eq!(report.issues, vec![BGM_MISSING]);
        assert_eq!(run.steps.len(), 3);
    }

    #[tokio::test]
    async fn zero_photos_reaches_the_end() {
        let llm = Arc::new(ScriptedProvider::new(
            Reply::Fail,
            Reply::Text("<html><head></head><body></body></html>".into()),
        ));
        let run = PipelineExecutor::new(llm.clone())
            .run(state("req-c", "", 0, None))
            .await
            .unwrap();

        assert!(photo_indices(run.state.html_content().unwrap()).is_empty());
        assert!(!llm.requests()[1].user.contains("Photos available"));
    }

    #[tokio::test]
    async fn n_photos_yield_n_ordered_markers() {
        let llm = Arc::new(ScriptedProvider::new(
            Reply::Fail,
            Reply::Text("<html><head></head><body><h1>hi</h1></body></html>".into()),
        ));
        let run = PipelineExecutor::new(llm)
            .run(state("req-d", "", 5, None))
            .await
            .unwrap();
        assert_eq!(
            photo_indices(run.state.html_content().unwrap()),
            vec![0, 1, 2, 3, 4]
        );
    }

    #[tokio::test]
    async fn stage_error_terminates_the_run() {
        let stages: Vec<Arc<dyn Stage>> = vec![
            Arc::new(Coder::new(Arc::new(ScriptedProvider::offline()))),
            Arc::new(Auditor::default()),
        ];
        let executor = PipelineExecutor::with_stages(stages);
        let err = executor.run(state("req-e", "", 0, None)).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::MissingStageInput { stage: Step::Coding, .. }
        ));
    }

    #[tokio::test]
    async fn stage_that_misreports_its_step_is_rejected() {
        struct Lying;
        #[async_trait]
        impl Stage for Lying {
            fn step(&self) -> Step {
                Step::Coding
            }
            async fn run(&self, state: PipelineState) -> Result<PipelineState, PipelineError> {
                Ok(state)
            }
        }
        let executor = PipelineExecutor::with_stages(vec![Arc::new(Lying)]);
        let err = executor.run(state("req-f", "", 0, None)).await.unwrap_err();
        assert!(matches!(err, PipelineError::StageFailed { stage: Step::Coding, .. }));
    }
}
