//! Inbound request and acknowledgement payloads.
//!
//! [`GenerateRequest`] only has room for style preferences and photo
//! descriptions. Extra fields a caller sends (photo URLs, names) are dropped
//! during deserialisation and never reach the pipeline.

use pipeline::{Assets, PhotoMetadata, PipelineState, Preferences, RequestId};
use serde::{Deserialize, Serialize};

use crate::ServiceError;

/// Body of `POST /generate`.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateRequest {
    /// Caller-chosen id; also names the persisted document.
    pub request_id: String,
    /// Style keyword; becomes the plan's theme.
    pub theme: String,
    /// Preferred primary colour. Overrides the generated one when non-empty.
    pub color: String,
    /// Page arrangement preference.
    pub layout: String,
    #[serde(default)]
    pub photos: Vec<PhotoMetadata>,
    /// Optional background-music source.
    #[serde(default)]
    pub bgm_url: Option<String>,
}

impl GenerateRequest {
    /// Checks the fields the pipeline relies on and returns the request id.
    ///
    /// The id is taken verbatim, so the echoed id, the job key and the
    /// artifact name all match what the caller sent.
    pub fn validate(&self) -> Result<RequestId, ServiceError> {
        let id = RequestId::new(self.request_id.as_str())
            .ok_or_else(|| ServiceError::InvalidRequest("request_id must not be empty".into()))?;
        if !id.is_file_safe() {
            return Err(ServiceError::InvalidRequest(format!(
                "request_id '{}' may only contain letters, digits, '-', '_' and '.' (max {} chars)",
                self.request_id,
                pipeline::MAX_REQUEST_ID_LEN
            )));
        }
        if self.theme.trim().is_empty() {
            return Err(ServiceError::InvalidRequest("theme must not be empty".into()));
        }
        Ok(id)
    }

    /// Builds the initial pipeline state.
    pub fn into_state(self, request_id: RequestId) -> PipelineState {
        let preferences = Preferences {
            style: self.theme,
            primary_color: self.color,
            page_format: self.layout,
            bgm_url: self.bgm_url,
        };
        let assets = Assets {
            photos: self.photos,
        };
        PipelineState::new(request_id, preferences, assets)
    }
}

/// Body of the `202 Accepted` acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// Always `"accepted"`.
    pub status: String,
    pub message: String,
    /// Echo of the submitted id.
    pub request_id: String,
}

impl GenerateResponse {
    pub fn accepted(request_id: &RequestId) -> Self {
        Self {
            status: "accepted".into(),
            message: "Agent workflow started".into(),
            request_id: request_id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(id: &str, theme: &str) -> GenerateRequest {
        GenerateRequest {
            request_id: id.into(),
            theme: theme.into(),
            color: "#FF0000".into(),
            layout: "long".into(),
            photos: vec![],
            bgm_url: None,
        }
    }

    #[test]
    fn valid_request_passes() {
        let id = request("req-1", "Garden").validate().unwrap();
        assert_eq!(id.as_str(), "req-1");
    }

    #[test]
    fn invalid_ids_and_missing_theme_are_rejected() {
        assert!(request("", "Garden").validate().is_err());
        assert!(request("   ", "Garden").validate().is_err());
        assert!(request("../../etc", "Garden").validate().is_err());
        assert!(request("req-1", " ").validate().is_err());
    }

    #[test]
    fn ids_with_surrounding_whitespace_are_rejected() {
        assert!(matches!(
            request(" req-1 ", "Garden").validate(),
            Err(ServiceError::InvalidRequest(_))
        ));
        assert!(request("req-1\n", "Garden").validate().is_err());
    }

    #[test]
    fn photo_urls_are_dropped() {
        let req: GenerateRequest = serde_json::from_str(
            r#"{
                "request_id": "req-1",
                "theme": "Retro",
                "color": "",
                "layout": "long",
                "photos": [{"description": "kiss at sunset", "url": "https://private/1.jpg"}]
            }"#,
        )
        .unwrap();
        let id = req.validate().unwrap();
        let state = req.into_state(id);
        let serialized = serde_json::to_string(&state).unwrap();
        assert!(!serialized.contains("https://private"));
        assert_eq!(
            state.assets().photos[0].description.as_deref(),
            Some("kiss at sunset")
        );
    }

    #[test]
    fn preferences_are_mapped_from_request_fields() {
        let mut req = request("req-1", "Retro");
        req.bgm_url = Some("song.mp3".into());
        let id = req.validate().unwrap();
        let state = req.into_state(id);
        let prefs = state.preferences();
        assert_eq!(prefs.style, "Retro");
        assert_eq!(prefs.primary_color, "#FF0000");
        assert_eq!(prefs.page_format, "long");
        assert!(prefs.wants_background_music());
    }
}
