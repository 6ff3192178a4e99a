//! Shared value types for the generation pipeline.
//!
//! None of these types carry personal data. Preferences are abstract style
//! tags; photos are described, never located.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Style preferences chosen by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    /// Theme label, e.g. `"Retro Cinema"`.
    pub style: String,
    /// Explicit colour choice. Empty means "let the planner decide".
    pub primary_color: String,
    /// Layout keyword, e.g. `"long-scroll"`.
    pub page_format: String,
    /// Music source for background audio. `None` or empty means no music.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bgm_url: Option<String>,
}

impl Preferences {
    /// Returns `true` if background music was requested.
    pub fn wants_background_music(&self) -> bool {
        self.bgm_url.as_deref().is_some_and(|u| !u.trim().is_empty())
    }

    /// Returns the explicit colour choice, if one was made.
    pub fn explicit_color(&self) -> Option<&str> {
        let c = self.primary_color.trim();
        (!c.is_empty()).then_some(c)
    }
}

/// Metadata for one photo. Deliberately has no URL field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoMetadata {
    #[serde(default)]
    pub description: Option<String>,
}

/// Non-personal assets available to the coder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assets {
    #[serde(default)]
    pub photos: Vec<PhotoMetadata>,
}

// ---------------------------------------------------------------------------
// Stage outputs
// ---------------------------------------------------------------------------

/// Concrete visual decisions derived from the preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualStyle {
    /// Overall look, e.g. `"modern"` or `"retro"`.
    pub theme: String,
    /// CSS colour, usually `#RRGGBB`.
    pub primary_color: String,
    /// CSS font family for headings and body text.
    pub font_family: String,
    /// Page arrangement, e.g. `"single-page"`.
    pub layout: String,
}

/// Structured style plan produced by the planner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandPlan {
    /// The visual decisions the coder implements.
    pub visual_style: VisualStyle,
}

/// Result of checking the generated document against the audit rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditReport {
    /// `true` exactly when `issues` is empty.
    pub valid: bool,
    /// Human-readable rule violations, in rule order.
    pub issues: Vec<String>,
}

impl AuditReport {
    /// Builds a report from an ordered issue list. `valid` is derived.
    pub fn from_issues(issues: Vec<String>) -> Self {
        Self {
            valid: issues.is_empty(),
            issues,
        }
    }
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Pipeline progress label.
///
/// Transitions are strictly `Created → Planning → Coding → Auditing → Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Step {
    Created,
    Planning,
    Coding,
    Auditing,
    Done,
}

impl Step {
    /// The wire label, e.g. `"PLANNING"`.
    pub fn as_str(self) -> &'static str {
        match self {
            Step::Created => "CREATED",
            Step::Planning => "PLANNING",
            Step::Coding => "CODING",
            Step::Auditing => "AUDITING",
            Step::Done => "DONE",
        }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time as a [`Timestamp`].
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Returns the underlying [`DateTime<Utc>`].
    pub fn as_datetime(self) -> DateTime<Utc> {
        self.0
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}
