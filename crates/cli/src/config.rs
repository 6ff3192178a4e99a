//! Runtime configuration: command-line flags with environment fallbacks.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use llm::OpenAiConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per event.
    Json,
}

/// VibeInvite agent engine: turns style preferences into a single-file
/// invitation page.
#[derive(Debug, Parser)]
#[command(name = "vibeinvite", version, about)]
pub struct Config {
    /// Address the HTTP service listens on.
    #[arg(long, env = "VIBEINVITE_BIND", default_value = "0.0.0.0:8000")]
    pub bind: SocketAddr,

    /// Directory generated documents are written to.
    #[arg(long, env = "VIBEINVITE_OUTPUT_DIR", default_value = storage::DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    /// API key for the chat-completions service.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: String,

    #[arg(long, env = "OPENAI_MODEL_NAME", default_value = llm::DEFAULT_MODEL)]
    pub model: String,

    /// Base URL of the chat-completions API (without `/chat/completions`).
    #[arg(long, env = "OPENAI_API_BASE", default_value = llm::DEFAULT_API_BASE)]
    pub api_base: String,

    /// Finished job records kept for `GET /jobs/:request_id`; older ones are
    /// forgotten.
    #[arg(long, env = "VIBEINVITE_RETAINED_JOBS", default_value_t = listener::DEFAULT_RETAINED_JOBS)]
    pub retained_jobs: usize,

    /// Timeout for a single generation call, in seconds.
    #[arg(long, env = "VIBEINVITE_LLM_TIMEOUT_SECS", default_value_t = 120)]
    pub llm_timeout_secs: u64,

    #[arg(long, env = "VIBEINVITE_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// OTLP collector endpoint. Tracing export is disabled when unset.
    #[arg(long, env = "OTEL_EXPORTER_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,
}

impl Config {
    /// Settings for the chat-completions provider.
    pub fn llm_config(&self) -> OpenAiConfig {
        OpenAiConfig {
            api_key: self.api_key.clone(),
            model: self.model.clone(),
            api_base: self.api_base.clone(),
            timeout: Duration::from_secs(self.llm_timeout_secs),
        }
    }
}
