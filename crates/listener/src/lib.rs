//! VibeInvite service boundary.
//!
//! Exposes the HTTP intake for generation requests:
//!
//! | Route | Behaviour |
//! |-------|-----------|
//! | `POST /generate` | validate, register, spawn the pipeline, answer `202` at once |
//! | `GET /health` | liveness, always `{"status": "ok"}` |
//! | `GET /jobs/:request_id` | status record of a submitted request |
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Request parsing, job scheduling and status tracking
//! live here. The pipeline sees only a fully built
//! [`pipeline::PipelineState`].

pub mod error;
pub mod jobs;
pub mod request;
pub mod runner;

use std::future::Future;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use pipeline::RequestId;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tracing::info;

pub use error::ServiceError;
pub use jobs::{JobRecord, JobRegistry, JobState, DEFAULT_RETAINED_JOBS};
pub use request::{GenerateRequest, GenerateResponse};
pub use runner::JobRunner;

/// Builds the HTTP router.
pub fn router(runner: JobRunner) -> Router {
    Router::new()
        .route("/generate", post(generate))
        .route("/health", get(health))
        .route("/jobs/:request_id", get(job_status))
        .with_state(runner)
}

/// Serves the router on `listener` until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    runner: JobRunner,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    info!(addr = ?listener.local_addr().ok(), "listening");
    axum::serve(listener, router(runner))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn generate(
    State(runner): State<JobRunner>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<GenerateResponse>), ServiceError> {
    let Json(request) = payload.map_err(|e| ServiceError::InvalidRequest(e.body_text()))?;
    let request_id = request.validate()?;

    runner.jobs().accept(&request_id)?;
    info!(%request_id, photos = request.photos.len(), "generation request accepted");
    runner.spawn(request.into_state(request_id.clone()));

    Ok((
        StatusCode::ACCEPTED,
        Json(GenerateResponse::accepted(&request_id)),
    ))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn job_status(
    State(runner): State<JobRunner>,
    Path(request_id): Path<String>,
) -> Result<Json<JobRecord>, ServiceError> {
    RequestId::new(request_id.clone())
        .and_then(|id| runner.jobs().get(&id))
        .map(Json)
        .ok_or(ServiceError::UnknownRequest(request_id))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use nodes::testing::{Reply, ScriptedProvider};
    use nodes::PipelineExecutor;
    use storage::FsArtifactStore;
    use tempfile::TempDir;
    use tower::ServiceExt;

    use super::*;

    fn app(dir: &TempDir, llm: ScriptedProvider) -> (Router, JobRegistry) {
        let jobs = JobRegistry::new();
        let runner = JobRunner::new(
            Arc::new(PipelineExecutor::new(Arc::new(llm))),
            Arc::new(FsArtifactStore::new(dir.path())),
            jobs.clone(),
        );
        (router(runner), jobs)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn wait_until_finished(jobs: &JobRegistry, id: &str) -> JobRecord {
        let id = RequestId::new(id).unwrap();
        for _ in 0..200 {
            if let Some(job) = jobs.get(&id).filter(|j| !j.state.is_active()) {
                return job;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job {id} did not finish");
    }

    #[tokio::test]
    async fn health_is_ok() {
        let dir = TempDir::new().unwrap();
        let (app, _) = app(&dir, ScriptedProvider::offline());
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn generate_acknowledges_then_persists() {
        let dir = TempDir::new().unwrap();
        let (app, jobs) = app(&dir, ScriptedProvider::offline());

        let response = app
            .oneshot(post_json(
                "/generate",
                json!({
                    "request_id": "req-a",
                    "theme": "Retro",
                    "color": "#FF0000",
                    "layout": "long",
                    "photos": [{"description": "beach"}]
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(
            body_json(response).await,
            json!({
                "status": "accepted",
                "message": "Agent workflow started",
                "request_id": "req-a"
            })
        );

        let job = wait_until_finished(&jobs, "req-a").await;
        assert_eq!(job.state, JobState::Completed);
        let html = std::fs::read_to_string(dir.path().join("req-a.html")).unwrap();
        assert!(html.contains("window.PROJECT_ID = 'req-a';"));
    }

    #[tokio::test]
    async fn malformed_body_is_rejected_before_scheduling() {
        let dir = TempDir::new().unwrap();
        let (app, jobs) = app(&dir, ScriptedProvider::offline());

        let response = app
            .oneshot(post_json("/generate", json!({"request_id": "req-1"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["status"], "error");
        assert!(jobs.get(&RequestId::new("req-1").unwrap()).is_none());
    }

    #[tokio::test]
    async fn unsafe_request_id_is_rejected() {
        let dir = TempDir::new().unwrap();
        let (app, _) = app(&dir, ScriptedProvider::offline());
        let response = app
            .oneshot(post_json(
                "/generate",
                json!({"request_id": "../x", "theme": "a", "color": "", "layout": ""}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn in_flight_request_id_conflicts() {
        let dir = TempDir::new().unwrap();
        let (app, jobs) = app(&dir, ScriptedProvider::offline());
        jobs.accept(&RequestId::new("req-1").unwrap()).unwrap();

        let response = app
            .oneshot(post_json(
                "/generate",
                json!({"request_id": "req-1", "theme": "a", "color": "", "layout": ""}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn job_status_reports_audit_outcome() {
        let dir = TempDir::new().unwrap();
        let (app, jobs) = app(
            &dir,
            ScriptedProvider::new(
                Reply::Fail,
                Reply::Text("<html><head></head><body>no music</body></html>".into()),
            ),
        );

        let response = app
            .clone()
            .oneshot(post_json(
                "/generate",
                json!({
                    "request_id": "req-b",
                    "theme": "Retro",
                    "color": "",
                    "layout": "long",
                    "bgm_url": "song.mp3"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        wait_until_finished(&jobs, "req-b").await;

        let response = app
            .oneshot(Request::get("/jobs/req-b").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["state"], "completed");
        assert_eq!(body["step"], "DONE");
        assert_eq!(
            body["audit_report"],
            json!({"valid": false, "issues": ["BGM requested but not found in HTML"]})
        );
    }

    #[tokio::test]
    async fn unknown_job_is_not_found() {
        let dir = TempDir::new().unwrap();
        let (app, _) = app(&dir, ScriptedProvider::offline());
        let response = app
            .oneshot(Request::get("/jobs/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
