use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use super::client::GenerationClient;
use super::service::{AssistantRequest, AssistantService};
use crate::catalog::{ASSISTANT_ACTIONS, DISPLAY_LANGUAGES, REWRITE_TONES};
use crate::validation::{sanitize_input, DEFAULT_MAX_INPUT_LENGTH};

pub(crate) struct AssistantState<C> {
    pub(crate) service: Arc<AssistantService<C>>,
    pub(crate) expose_errors: bool,
}

impl<C> Clone for AssistantState<C> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            expose_errors: self.expose_errors,
        }
    }
}

/// Query string of `GET /ai/process`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProcessQuery {
    pub action: String,
    #[serde(rename = "userText")]
    pub user_text: String,
    pub payload: Option<String>,
    pub tone: Option<String>,
    pub language: Option<String>,
    pub user_id: Option<String>,
}

impl ProcessQuery {
    /// First non-blank of `payload`, `tone` and `language`.
    fn modifier(&self) -> Option<&str> {
        [&self.payload, &self.tone, &self.language]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|value| !value.trim().is_empty())
    }
}

pub fn assistant_router<C>(service: Arc<AssistantService<C>>, expose_errors: bool) -> Router
where
    C: GenerationClient + 'static,
{
    Router::new()
        .route("/ai/process", get(process_handler::<C>))
        .route("/ai/actions", get(actions_handler))
        .with_state(AssistantState {
            service,
            expose_errors,
        })
}

pub(crate) async fn process_handler<C>(
    State(state): State<AssistantState<C>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    Query(query): Query<ProcessQuery>,
) -> Response
where
    C: GenerationClient + 'static,
{
    let Some(text) = sanitize_input(&query.user_text, DEFAULT_MAX_INPUT_LENGTH) else {
        let payload = json!({
            "success": false,
            "error": "userText must not be empty",
            "action": query.action,
        });
        return (StatusCode::BAD_REQUEST, Json(payload)).into_response();
    };

    let chars = text.chars().count();
    let client_ip = connect_info.map(|ConnectInfo(addr)| addr.ip().to_string());
    info!(action = %query.action, chars, "processing assistant action");

    let result = state
        .service
        .process(AssistantRequest {
            action: &query.action,
            text: &text,
            payload: query.modifier(),
            user_id: query.user_id.as_deref(),
            client_ip: client_ip.as_deref(),
        })
        .await;

    match result {
        Ok(output) => {
            let payload = json!({
                "success": true,
                "result": output,
                "action": query.action,
                "metadata": {
                    "chars_processed": chars,
                    "action_type": query.action,
                    "language": query.language.as_deref().unwrap_or("auto"),
                },
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => {
            error!(action = %query.action, error = %err, "assistant action failed");
            let message = if err.is_normalized() || state.expose_errors {
                err.to_string()
            } else {
                "Error processing request".to_string()
            };
            let payload = json!({
                "success": false,
                "error": message,
                "action": query.action,
            });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}

pub(crate) async fn actions_handler() -> Response {
    let languages: Vec<&str> = DISPLAY_LANGUAGES.iter().map(|lang| lang.code).collect();
    let payload = json!({
        "actions": ASSISTANT_ACTIONS,
        "rewrite_tones": REWRITE_TONES,
        "supported_languages": languages,
    });
    (StatusCode::OK, Json(payload)).into_response()
}
