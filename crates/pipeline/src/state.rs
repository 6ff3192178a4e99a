//! The state container threaded through the pipeline.
//!
//! Each stage takes the state by value and returns a new one carrying its own
//! output. Stage outputs are write-once: the `with_*` setters refuse to
//! replace a value that is already present.

use serde::{Deserialize, Serialize};

use crate::{Assets, AuditReport, BrandPlan, PipelineError, Preferences, RequestId, Step};

/// Accumulated state for one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineState {
    request_id: RequestId,
    preferences: Preferences,
    assets: Assets,
    brand_plan: Option<BrandPlan>,
    html_content: Option<String>,
    audit_report: Option<AuditReport>,
    current_step: Step,
}

impl PipelineState {
    /// Creates the initial state for a request. No stage output is set.
    pub fn new(request_id: RequestId, preferences: Preferences, assets: Assets) -> Self {
        Self {
            request_id,
            preferences,
            assets,
            brand_plan: None,
            html_content: None,
            audit_report: None,
            current_step: Step::Created,
        }
    }

    /// Caller-supplied id of the request.
    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    /// Style preferences from the request.
    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    /// Photo descriptions from the request.
    pub fn assets(&self) -> &Assets {
        &self.assets
    }

    /// Planner output, once the planner has run.
    pub fn brand_plan(&self) -> Option<&BrandPlan> {
        self.brand_plan.as_ref()
    }

    /// Coder output, once the coder has run.
    pub fn html_content(&self) -> Option<&str> {
        self.html_content.as_deref()
    }

    /// Auditor output, once the auditor has run.
    pub fn audit_report(&self) -> Option<&AuditReport> {
        self.audit_report.as_ref()
    }

    /// Label of the last stage that ran.
    pub fn current_step(&self) -> Step {
        self.current_step
    }

    /// Returns the state with the planner's output recorded.
    pub fn with_brand_plan(mut self, plan: BrandPlan) -> Result<Self, PipelineError> {
        if self.brand_plan.is_some() {
            return Err(PipelineError::StageOutputAlreadySet {
                field: "brand_plan",
            });
        }
        self.brand_plan = Some(plan);
        self.current_step = Step::Planning;
        Ok(self)
    }

    /// Returns the state with the coder's output recorded.
    pub fn with_html_content(mut self, html: String) -> Result<Self, PipelineError> {
        if self.html_content.is_some() {
            return Err(PipelineError::StageOutputAlreadySet {
                field: "html_content",
            });
        }
        self.html_content = Some(html);
        self.current_step = Step::Coding;
        Ok(self)
    }

    /// Returns the state with the auditor's output recorded.
    pub fn with_audit_report(mut self, report: AuditReport) -> Result<Self, PipelineError> {
        if self.audit_report.is_some() {
            return Err(PipelineError::StageOutputAlreadySet {
                field: "audit_report",
            });
        }
        self.audit_report = Some(report);
        self.current_step = Step::Auditing;
        Ok(self)
    }
}
