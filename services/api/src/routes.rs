use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Extension;
use axum::Json;
use cliro::assistant::{assistant_router, AssistantService, GenerationClient};
use cliro::persistence::TableStore;
use cliro::waitlist::{waitlist_router, WaitlistService};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_service_routes<S, C>(
    waitlist: Arc<WaitlistService<S>>,
    assistant: Arc<AssistantService<C>>,
    expose_errors: bool,
) -> axum::Router
where
    S: TableStore + 'static,
    C: GenerationClient + 'static,
{
    waitlist_router(waitlist, expose_errors)
        .merge(assistant_router(assistant, expose_errors))
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/config/public", get(public_config_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn public_config_endpoint(
    Extension(state): Extension<AppState>,
) -> impl IntoResponse {
    Json(state.public.as_ref().clone())
}
