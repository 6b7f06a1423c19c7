use crate::cli::ServeArgs;
use crate::infra::{rate_limit, AppState, PublicConfig, RateLimiter, RateRule};
use crate::routes::with_service_routes;
use axum::http::Method;
use axum::{middleware, Extension};
use axum_prometheus::PrometheusMetricLayer;
use cliro::assistant::{AssistantService, GeminiClient, GenerationClient, UnconfiguredClient};
use cliro::config::AppConfig;
use cliro::error::AppError;
use cliro::persistence::{Gateway, InMemoryStore, PostgrestStore, TableStore};
use cliro::telemetry;
use cliro::waitlist::{WaitlistService, WAITLIST_TABLE};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = if args.in_memory {
        AppConfig::load_without_credentials()?
    } else {
        AppConfig::load()?
    };

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    if args.in_memory {
        warn!("serving from an in-memory table store; signups are lost on restart");
        let store = InMemoryStore::new().with_unique(WAITLIST_TABLE, "email");
        serve(config, store).await
    } else {
        let store = PostgrestStore::new(&config.store)?;
        serve(config, store).await
    }
}

async fn serve<S>(config: AppConfig, store: S) -> Result<(), AppError>
where
    S: TableStore + 'static,
{
    let gateway = Gateway::connect(store, config.store.probe_interval).await?;
    let waitlist = Arc::new(WaitlistService::new(Arc::new(gateway)));

    let client: Arc<dyn GenerationClient> = if config.generation.api_key.is_empty() {
        warn!("GEMINI_API_KEY is not set; assistant requests will fail");
        Arc::new(UnconfiguredClient)
    } else {
        Arc::new(GeminiClient::new(&config.generation)?)
    };
    let assistant = Arc::new(AssistantService::new(client));

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        public: Arc::new(PublicConfig::new(
            config.app.version.clone(),
            config.app.max_languages_per_user,
        )),
    };

    let limiter = Arc::new(RateLimiter::new(vec![
        RateRule::per_minute(
            Method::POST,
            "/waitlist/join",
            config.limits.waitlist_join_per_minute,
        ),
        RateRule::per_hour(
            Method::GET,
            "/ai/process",
            config.limits.ai_requests_per_hour,
        ),
    ]));

    let app = with_service_routes(waitlist, assistant, config.app.debug)
        .layer(middleware::from_fn_with_state(limiter, rate_limit))
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        name = %config.app.name,
        version = %config.app.version,
        "cliro api ready"
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
