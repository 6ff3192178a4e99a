//! Scripted [`LlmProvider`] fakes for tests.
//!
//! Replies are chosen by the requested [`ResponseFormat`]: JSON-object
//! requests come from the planner, free-text requests from the coder.

use std::sync::Mutex;

use async_trait::async_trait;
use pipeline::{CompletionRequest, LlmError, LlmProvider, ResponseFormat};

/// What the fake returns for one kind of request.
#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    Fail,
    Panic,
}

/// Returns canned replies and records every request it receives.
#[derive(Debug)]
pub struct ScriptedProvider {
    plan: Reply,
    html: Reply,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedProvider {
    pub fn new(plan: Reply, html: Reply) -> Self {
        Self {
            plan,
            html,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A provider whose every call fails, as if the service were offline.
    pub fn offline() -> Self {
        Self::new(Reply::Fail, Reply::Fail)
    }

    /// Requests received so far, in order.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
        let reply = match request.response_format {
            ResponseFormat::JsonObject => self.plan.clone(),
            ResponseFormat::Text => self.html.clone(),
        };
        if let Ok(mut log) = self.requests.lock() {
            log.push(request);
        }
        match reply {
            Reply::Text(text) => Ok(text),
            Reply::Fail => Err(LlmError::Transport("connection refused".into())),
            Reply::Panic => panic!("scripted provider panic"),
        }
    }
}
