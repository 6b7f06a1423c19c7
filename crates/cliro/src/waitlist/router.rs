use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::json;
use tracing::error;

use super::domain::SignupRequest;
use super::service::{DatabaseHealth, WaitlistService};
use crate::persistence::TableStore;

pub(crate) struct WaitlistState<S> {
    pub(crate) service: Arc<WaitlistService<S>>,
    /// Include internal error detail in 500 bodies.
    pub(crate) expose_errors: bool,
}

impl<S> Clone for WaitlistState<S> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            expose_errors: self.expose_errors,
        }
    }
}

/// Router exposing signup, stats, email checks and the database health probe.
pub fn waitlist_router<S>(service: Arc<WaitlistService<S>>, expose_errors: bool) -> Router
where
    S: TableStore + 'static,
{
    Router::new()
        .route("/waitlist/join", post(join_handler::<S>))
        .route("/waitlist/stats", get(stats_handler::<S>))
        .route("/waitlist/check-email/:email", get(check_email_handler::<S>))
        .route("/health/db", get(database_health_handler::<S>))
        .with_state(WaitlistState {
            service,
            expose_errors,
        })
}

pub(crate) async fn join_handler<S>(
    State(state): State<WaitlistState<S>>,
    Json(request): Json<SignupRequest>,
) -> Response
where
    S: TableStore + 'static,
{
    let candidate = match request.validate() {
        Ok(candidate) => candidate,
        Err(error) => {
            let payload = json!({
                "success": false,
                "message": error.to_string(),
                "error": "validation_error",
            });
            return (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response();
        }
    };

    match state.service.join_waitlist(candidate).await {
        Ok(outcome) => {
            let status = if outcome.is_success() {
                StatusCode::CREATED
            } else {
                StatusCode::OK
            };
            (status, Json(outcome.view())).into_response()
        }
        Err(err) => {
            error!(error = %err, "waitlist join failed");
            let detail = if state.expose_errors {
                err.to_string()
            } else {
                "contact_support".to_string()
            };
            let payload = json!({
                "success": false,
                "message": "Internal server error",
                "error": detail,
            });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}

pub(crate) async fn stats_handler<S>(State(state): State<WaitlistState<S>>) -> Response
where
    S: TableStore + 'static,
{
    let stats = state.service.get_waitlist_stats().await;
    (StatusCode::OK, Json(stats)).into_response()
}

pub(crate) async fn check_email_handler<S>(
    State(state): State<WaitlistState<S>>,
    Path(email): Path<String>,
) -> Response
where
    S: TableStore + 'static,
{
    let check = state.service.check_email(&email).await;
    (StatusCode::OK, Json(check)).into_response()
}

pub(crate) async fn database_health_handler<S>(State(state): State<WaitlistState<S>>) -> Response
where
    S: TableStore + 'static,
{
    let timestamp = Utc::now();
    let payload = match state.service.database_health().await {
        DatabaseHealth::Healthy => json!({ "database": "healthy", "timestamp": timestamp }),
        DatabaseHealth::Unhealthy => json!({ "database": "unhealthy", "timestamp": timestamp }),
        DatabaseHealth::Error(detail) => json!({
            "database": "error",
            "error": detail,
            "timestamp": timestamp,
        }),
    };
    (StatusCode::OK, Json(payload)).into_response()
}
