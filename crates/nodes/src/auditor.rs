//! Auditor stage: checks the finished document against a fixed rule set.
//!
//! The auditor is a pure checker. It never edits the document, and a failing
//! report does not stop the pipeline.

use async_trait::async_trait;
use pipeline::{AuditReport, PipelineError, PipelineState, Preferences, Stage, Step};
use tracing::{debug, info, warn};

pub const BGM_MISSING: &str = "BGM requested but not found in HTML";

/// One compliance check over a generated document.
pub trait AuditRule: Send + Sync {
    fn name(&self) -> &'static str;

    /// Returns an issue description if the document violates the rule.
    fn check(&self, html: &str, prefs: &Preferences) -> Option<String>;
}

/// Requested background music must be realised by an audio element or a
/// scripted `new Audio(...)` call.
#[derive(Debug, Default)]
pub struct BackgroundMusicRule;

impl AuditRule for BackgroundMusicRule {
    fn name(&self) -> &'static str {
        "background_music"
    }

    fn check(&self, html: &str, prefs: &Preferences) -> Option<String> {
        let has_audio = html.contains("<audio") || html.contains("new Audio");
        (prefs.wants_background_music() && !has_audio).then(|| BGM_MISSING.to_string())
    }
}

/// Runs an ordered set of [`AuditRule`]s over the generated document.
pub struct Auditor {
    rules: Vec<Box<dyn AuditRule>>,
}

impl Default for Auditor {
    fn default() -> Self {
        Self::with_rules(vec![Box::new(BackgroundMusicRule)])
    }
}

impl Auditor {
    pub fn with_rules(rules: Vec<Box<dyn AuditRule>>) -> Self {
        Self { rules }
    }

    /// Runs every rule in order and collects the issues.
    pub fn audit(&self, html: &str, prefs: &Preferences) -> AuditReport {
        let issues = self
            .rules
            .iter()
            .filter_map(|rule| {
                let issue = rule.check(html, prefs)?;
                debug!(rule = rule.name(), %issue, "audit rule violated");
                Some(issue)
            })
            .collect();
        AuditReport::from_issues(issues)
    }
}

#[async_trait]
impl Stage for Auditor {
    fn step(&self) -> Step {
        Step::Auditing
    }

    async fn run(&self, state: PipelineState) -> Result<PipelineState, PipelineError> {
        info!(request_id = %state.request_id(), "auditor is working");
        let html = state.html_content().ok_or(PipelineError::MissingStageInput {
            stage: Step::Auditing,
            field: "html_content",
        })?;
        let report = self.audit(html, state.preferences());
        if !report.valid {
            warn!(request_id = %state.request_id(), issues = ?report.issues, "audit found issues");
        }
        state.with_audit_report(report)
    }
}
