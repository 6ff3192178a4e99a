//! Newtype domain identifiers.
//!
//! A [`RequestId`] is supplied by the caller and names both the pipeline run
//! in logs and the persisted artifact on disk. A [`RunId`] is generated
//! internally for every execution so repeated submissions of the same request
//! can be told apart in traces.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum length accepted for a request id used as a file stem.
pub const MAX_REQUEST_ID_LEN: usize = 128;

// ---------------------------------------------------------------------------
// Identifiers — caller-supplied
// ---------------------------------------------------------------------------

/// Identifies one invitation generation request.
///
/// Unique per caller; used as the value of `window.PROJECT_ID` in the
/// generated document and as the stem of the persisted `.html` file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(String);

impl RequestId {
    /// Creates a new identifier, returning `None` if the value is empty.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let v = value.into();
        if v.is_empty() {
            None
        } else {
            Some(Self(v))
        }
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the identifier can be used verbatim as a file stem.
    ///
    /// Accepts ASCII alphanumerics, `-`, `_` and `.`, up to
    /// [`MAX_REQUEST_ID_LEN`] characters. `.` and `..` are rejected so the id
    /// can never address a directory.
    pub fn is_file_safe(&self) -> bool {
        self.0.len() <= MAX_REQUEST_ID_LEN
            && self.0 != "."
            && self.0 != ".."
            && self
                .0
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Identifiers — UUID-backed (internally generated)
// ---------------------------------------------------------------------------

/// Identifies a single pipeline execution run.
///
/// Generated fresh for every execution; propagated through spans so all
/// activity from a single run can be correlated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(Uuid);

impl RunId {
    /// Generates a new random run identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying [`Uuid`].
    pub fn as_uuid(self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
