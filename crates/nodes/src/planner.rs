//! Planner stage: preferences → brand style plan.
//!
//! The planner asks the model for a JSON plan. If the call fails or the reply
//! cannot be parsed, a deterministic plan is built from the preferences, so
//! this stage always produces a usable plan. An explicit colour preference
//! overrides whatever colour the model picked.

use std::sync::Arc;

use async_trait::async_trait;
use pipeline::{
    BrandPlan, CompletionRequest, LlmError, LlmProvider, PipelineError, PipelineState,
    Preferences, Stage, Step, VisualStyle,
};
use thiserror::Error;
use tracing::{info, warn};

use crate::prompts;

// Fallback plan values.
pub const DEFAULT_THEME: &str = "modern";
pub const DEFAULT_COLOR: &str = "#000000";
pub const DEFAULT_FONT: &str = "serif";
pub const DEFAULT_LAYOUT: &str = "single-page";

/// Why a generated plan could not be used.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error(transparent)]
    Generation(#[from] LlmError),

    #[error("unparseable plan: {0}")]
    Parse(String),
}

/// Produces the brand style plan from the request's preferences.
pub struct Planner {
    llm: Arc<dyn LlmProvider>,
}

impl Planner {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    /// Produces the plan for `prefs`. Never fails.
    pub async fn plan(&self, prefs: &Preferences) -> BrandPlan {
        let plan = match self.generate(prefs).await {
            Ok(plan) => plan,
            Err(e) => {
                warn!(error = %e, "plan generation failed; using fallback plan");
                fallback_plan(prefs)
            }
        };
        apply_color_override(plan, prefs)
    }

    async fn generate(&self, prefs: &Preferences) -> Result<BrandPlan, PlanError> {
        let request = CompletionRequest::json(prompts::PLANNER_SYSTEM, prompts::planner_user(prefs));
        let reply = self.llm.complete(request).await?;
        parse_plan(&reply).map_err(PlanError::Parse)
    }
}

#[async_trait]
impl Stage for Planner {
    fn step(&self) -> Step {
        Step::Planning
    }

    async fn run(&self, state: PipelineState) -> Result<PipelineState, PipelineError> {
        info!(request_id = %state.request_id(), "planner is working");
        let plan = self.plan(state.preferences()).await;
        state.with_brand_plan(plan)
    }
}

/// Plan built directly from the preferences.
pub fn fallback_plan(prefs: &Preferences) -> BrandPlan {
    let or_default = |value: &str, default: &str| {
        let v = value.trim();
        if v.is_empty() {
            default.to_string()
        } else {
            v.to_string()
        }
    };
    BrandPlan {
        visual_style: VisualStyle {
            theme: or_default(&prefs.style, DEFAULT_THEME),
            primary_color: or_default(&prefs.primary_color, DEFAULT_COLOR),
            font_family: DEFAULT_FONT.to_string(),
            layout: DEFAULT_LAYOUT.to_string(),
        },
    }
}

/// An explicit colour choice is a harder constraint than inferred style.
pub fn apply_color_override(mut plan: BrandPlan, prefs: &Preferences) -> BrandPlan {
    if let Some(color) = prefs.explicit_color() {
        plan.visual_style.primary_color = color.to_string();
    }
    plan
}

/// Parses a plan from a model reply.
///
/// Accepts a bare JSON object, one wrapped in a code fence, or the first
/// balanced `{...}` object embedded in surrounding prose.
pub fn parse_plan(reply: &str) -> Result<BrandPlan, String> {
    let trimmed = reply.trim();
    if let Ok(plan) = serde_json::from_str::<BrandPlan>(trimmed) {
        return Ok(plan);
    }
    match first_json_object(trimmed) {
        Some(obj) => serde_json::from_str::<BrandPlan>(obj).map_err(|e| e.to_string()),
        None => Err("no JSON object in reply".to_string()),
    }
}

/// Returns the first top-level `{...}` substring, honouring string literals.
fn first_json_object(s: &str) -> Option<&str> {
    let mut start = None;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in s.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' if start.is_some() => in_string = true,
            '{' => {
                start.get_or_insert(i);
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    return start.map(|st| &s[st..=i]);
                }
            }
            _ => {}
        }
    }
    None
}
