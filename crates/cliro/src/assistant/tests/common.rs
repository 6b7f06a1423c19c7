use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use serde_json::Value;

use crate::assistant::{
    AssistantService, GenerationClient, GenerationError, UsageEvent, UsageLog,
};

/// Records prompts and answers with a canned reply.
#[derive(Default)]
pub(super) struct RecordingClient {
    prompts: Mutex<Vec<String>>,
    reply: Option<String>,
}

impl RecordingClient {
    pub(super) fn replying(reply: &str) -> Self {
        Self {
            prompts: Mutex::new(Vec::new()),
            reply: Some(reply.to_string()),
        }
    }

    pub(super) fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("prompt mutex poisoned").clone()
    }

    pub(super) fn last_prompt(&self) -> String {
        self.prompts().pop().expect("a prompt was sent")
    }
}

#[async_trait]
impl GenerationClient for RecordingClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.prompts
            .lock()
            .expect("prompt mutex poisoned")
            .push(prompt.to_string());
        Ok(self.reply.clone().unwrap_or_else(|| "ok".to_string()))
    }
}

/// Fails every request with a fixed error.
pub(super) struct FailingClient {
    pub(super) make_error: fn() -> GenerationError,
}

#[async_trait]
impl GenerationClient for FailingClient {
    async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
        Err((self.make_error)())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct RecordedUsage {
    pub(super) action: String,
    pub(super) chars: usize,
    pub(super) user_id: Option<String>,
}

#[derive(Default)]
pub(super) struct MemoryUsageLog {
    events: Mutex<Vec<RecordedUsage>>,
}

impl MemoryUsageLog {
    pub(super) fn events(&self) -> Vec<RecordedUsage> {
        self.events.lock().expect("usage mutex poisoned").clone()
    }
}

impl UsageLog for MemoryUsageLog {
    fn record(&self, event: &UsageEvent<'_>) {
        self.events
            .lock()
            .expect("usage mutex poisoned")
            .push(RecordedUsage {
                action: event.action.id().to_string(),
                chars: event.chars,
                user_id: event.user_id.map(str::to_string),
            });
    }
}

pub(super) fn build_service(
    reply: &str,
) -> (
    AssistantService<Arc<RecordingClient>>,
    Arc<RecordingClient>,
    Arc<MemoryUsageLog>,
) {
    let client = Arc::new(RecordingClient::replying(reply));
    let usage = Arc::new(MemoryUsageLog::default());
    let service = AssistantService::with_usage_log(client.clone(), usage.clone());
    (service, client, usage)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
