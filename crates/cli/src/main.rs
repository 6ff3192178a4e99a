//! VibeInvite entry point.
//!
//! This binary is the composition root for the entire system:
//!
//! 1. **Parse configuration** — flags with environment fallbacks (see [`config`]).
//! 2. **Wire observability** — `tracing-subscriber` with a text or JSON layer
//!    and an optional OpenTelemetry OTLP exporter.
//! 3. **Construct infrastructure** — the chat-completions provider and the
//!    filesystem artifact store, injected into the `PipelineExecutor`.
//! 4. **Serve** — run the HTTP service boundary until Ctrl-C.

mod config;
mod telemetry;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use listener::{JobRegistry, JobRunner};
use llm::OpenAiProvider;
use nodes::PipelineExecutor;
use storage::FsArtifactStore;
use tokio::net::TcpListener;
use tracing::{info, warn};

use config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    let _telemetry = telemetry::init(config.log_format, config.otlp_endpoint.as_deref())?;

    let provider =
        OpenAiProvider::new(config.llm_config()).context("failed to configure LLM provider")?;
    info!(model = provider.model(), api_base = %config.api_base, "LLM provider ready");

    let executor = Arc::new(PipelineExecutor::new(Arc::new(provider)));
    let store = Arc::new(FsArtifactStore::new(&config.output_dir));
    info!(output_dir = %store.root().display(), "artifact store ready");
    let runner = JobRunner::new(
        executor,
        store,
        JobRegistry::with_retention(config.retained_jobs),
    );

    let tcp = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    listener::serve(tcp, runner, shutdown_signal()).await?;

    info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown requested"),
        Err(e) => {
            warn!(error = %e, "cannot listen for Ctrl-C; running until killed");
            std::future::pending::<()>().await;
        }
    }
}
