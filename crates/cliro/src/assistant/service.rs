use std::sync::Arc;

use tracing::{info, warn};

use super::action::Action;
use super::client::{GenerationClient, GenerationError};
use super::prompt::build_prompt;

/// One processed request, as seen by a [`UsageLog`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageEvent<'a> {
    pub action: Action,
    pub chars: usize,
    pub user_id: Option<&'a str>,
    pub client_ip: Option<&'a str>,
}

/// Sink for usage records. Recording never fails the request it describes.
pub trait UsageLog: Send + Sync {
    fn record(&self, event: &UsageEvent<'_>);
}

/// Writes usage records to the tracing subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingUsageLog;

impl UsageLog for TracingUsageLog {
    fn record(&self, event: &UsageEvent<'_>) {
        info!(
            target: "cliro::usage",
            action = %event.action,
            chars = event.chars,
            user_id = event.user_id.unwrap_or("-"),
            client_ip = event.client_ip.unwrap_or("-"),
            "assistant usage"
        );
    }
}

/// Parameters of a single text operation.
#[derive(Debug, Clone, Copy)]
pub struct AssistantRequest<'a> {
    pub action: &'a str,
    pub text: &'a str,
    pub payload: Option<&'a str>,
    pub user_id: Option<&'a str>,
    pub client_ip: Option<&'a str>,
}

/// Caller-facing failure of a text operation.
#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    #[error("Usage limit exceeded. Please try again later.")]
    RateLimited,
    #[error("The content could not be processed due to safety policies.")]
    ContentPolicy,
    #[error("AI processing error: {0}")]
    Generation(String),
}

impl AssistantError {
    /// Whether the message is the normalized one rather than upstream detail.
    pub fn is_normalized(&self) -> bool {
        !matches!(self, AssistantError::Generation(_))
    }
}

impl From<GenerationError> for AssistantError {
    fn from(value: GenerationError) -> Self {
        let message = value.to_string();
        let lowered = message.to_lowercase();
        if lowered.contains("quota") {
            AssistantError::RateLimited
        } else if lowered.contains("safety") {
            AssistantError::ContentPolicy
        } else {
            AssistantError::Generation(message)
        }
    }
}

/// Builds prompts for text actions and forwards them to a [`GenerationClient`].
pub struct AssistantService<C> {
    client: C,
    usage: Arc<dyn UsageLog>,
}

impl<C> AssistantService<C>
where
    C: GenerationClient + 'static,
{
    pub fn new(client: C) -> Self {
        Self::with_usage_log(client, Arc::new(TracingUsageLog))
    }

    pub fn with_usage_log(client: C, usage: Arc<dyn UsageLog>) -> Self {
        Self { client, usage }
    }

    /// Run `action` over `text` and return the generator's text unchanged.
    pub async fn process_action(
        &self,
        action: &str,
        text: &str,
        payload: Option<&str>,
    ) -> Result<String, AssistantError> {
        self.process(AssistantRequest {
            action,
            text,
            payload,
            user_id: None,
            client_ip: None,
        })
        .await
    }

    pub async fn process(&self, request: AssistantRequest<'_>) -> Result<String, AssistantError> {
        let action = Action::parse(request.action, request.payload);
        let prompt = build_prompt(action, request.text);

        let output = match self.client.generate(&prompt).await {
            Ok(output) => output,
            Err(err) => {
                warn!(action = %action, error = %err, "text generation failed");
                return Err(err.into());
            }
        };

        self.usage.record(&UsageEvent {
            action,
            chars: request.text.chars().count(),
            user_id: request.user_id,
            client_ip: request.client_ip,
        });

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_errors_are_classified_by_message() {
        let quota = GenerationError::Api {
            status: 429,
            message: "You exceeded your current Quota".to_string(),
        };
        assert!(matches!(AssistantError::from(quota), AssistantError::RateLimited));

        let blocked = GenerationError::Blocked("SAFETY".to_string());
        assert!(matches!(
            AssistantError::from(blocked),
            AssistantError::ContentPolicy
        ));

        let other = AssistantError::from(GenerationError::Transport("connection reset".to_string()));
        assert!(!other.is_normalized());
        assert!(other.to_string().contains("connection reset"));
    }
}
