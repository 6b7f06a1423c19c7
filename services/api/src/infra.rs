use axum::extract::{ConnectInfo, Request, State};
use axum::http::{header, Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use cliro::catalog::{
    InterestReasonInfo, ToneInfo, DISPLAY_LANGUAGES, INTEREST_REASONS, REWRITE_TONES,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::warn;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) public: Arc<PublicConfig>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct PublicLanguage {
    pub(crate) code: &'static str,
    pub(crate) name: &'static str,
}

/// Body of `GET /config/public`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct PublicConfig {
    pub(crate) supported_languages: Vec<PublicLanguage>,
    pub(crate) interest_reasons: &'static [InterestReasonInfo],
    pub(crate) rewrite_tones: &'static [ToneInfo],
    pub(crate) max_languages: usize,
    pub(crate) version: String,
}

impl PublicConfig {
    pub(crate) fn new(version: impl Into<String>, max_languages: usize) -> Self {
        Self {
            supported_languages: DISPLAY_LANGUAGES
                .iter()
                .map(|lang| PublicLanguage {
                    code: lang.code,
                    name: lang.native,
                })
                .collect(),
            interest_reasons: &INTEREST_REASONS,
            rewrite_tones: &REWRITE_TONES,
            max_languages,
            version: version.into(),
        }
    }
}

/// Request budget for one method and path.
#[derive(Debug, Clone)]
pub(crate) struct RateRule {
    method: Method,
    path: &'static str,
    limit: u32,
    window: Duration,
}

impl RateRule {
    pub(crate) fn per_minute(method: Method, path: &'static str, limit: u32) -> Self {
        Self {
            method,
            path,
            limit,
            window: Duration::from_secs(60),
        }
    }

    pub(crate) fn per_hour(method: Method, path: &'static str, limit: u32) -> Self {
        Self {
            method,
            path,
            limit,
            window: Duration::from_secs(3600),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    hits: u32,
}

/// Expired windows are dropped every this many limited requests.
const CLEANUP_INTERVAL: u64 = 100;

/// Fixed-window limiter keyed by rule and client address. Process-local.
#[derive(Debug)]
pub(crate) struct RateLimiter {
    rules: Vec<RateRule>,
    windows: Mutex<HashMap<(usize, String), Window>>,
    checks: AtomicU64,
}

impl RateLimiter {
    pub(crate) fn new(rules: Vec<RateRule>) -> Self {
        Self {
            rules,
            windows: Mutex::new(HashMap::new()),
            checks: AtomicU64::new(0),
        }
    }

    fn retain_live(&self, windows: &mut HashMap<(usize, String), Window>, now: Instant) {
        windows.retain(|(rule_index, _), window| {
            self.rules
                .get(*rule_index)
                .is_some_and(|rule| now.duration_since(window.started) < rule.window)
        });
    }

    /// Drop every window that has already expired at `now`.
    pub(crate) fn cleanup(&self, now: Instant) {
        let mut windows = self
            .windows
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        self.retain_live(&mut windows, now);
    }

    pub(crate) fn tracked_windows(&self) -> usize {
        self.windows
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    /// Count a request; `Err` carries the time until the window resets.
    pub(crate) fn check(
        &self,
        method: &Method,
        path: &str,
        client: &str,
        now: Instant,
    ) -> Result<(), Duration> {
        let Some((index, rule)) = self
            .rules
            .iter()
            .enumerate()
            .find(|(_, rule)| rule.method == *method && rule.path == path)
        else {
            return Ok(());
        };
        if rule.limit == 0 {
            return Ok(());
        }

        let mut windows = self
            .windows
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let checks = self.checks.fetch_add(1, Ordering::Relaxed) + 1;
        if checks % CLEANUP_INTERVAL == 0 {
            self.retain_live(&mut windows, now);
        }

        let window = windows
            .entry((index, client.to_string()))
            .or_insert(Window {
                started: now,
                hits: 0,
            });
        if now.duration_since(window.started) >= rule.window {
            *window = Window {
                started: now,
                hits: 0,
            };
        }

        if window.hits >= rule.limit {
            return Err(rule.window.saturating_sub(now.duration_since(window.started)));
        }
        window.hits += 1;
        Ok(())
    }
}

pub(crate) async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request,
    next: Next,
) -> Response {
    let client = connect_info
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let verdict = limiter.check(
        request.method(),
        request.uri().path(),
        &client,
        Instant::now(),
    );

    match verdict {
        Ok(()) => next.run(request).await,
        Err(retry_after) => {
            warn!(%client, path = request.uri().path(), "rate limit exceeded");
            let seconds = retry_after.as_secs().max(1);
            (
                StatusCode::TOO_MANY_REQUESTS,
                [(header::RETRY_AFTER, seconds.to_string())],
                Json(json!({
                    "success": false,
                    "error": "rate_limited",
                    "message": "Too many requests. Please try again later.",
                })),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter() -> RateLimiter {
        RateLimiter::new(vec![
            RateRule::per_minute(Method::POST, "/waitlist/join", 2),
            RateRule::per_hour(Method::GET, "/ai/process", 0),
        ])
    }

    #[test]
    fn limit_applies_per_client_and_window() {
        let limiter = limiter();
        let start = Instant::now();

        assert!(limiter.check(&Method::POST, "/waitlist/join", "a", start).is_ok());
        assert!(limiter.check(&Method::POST, "/waitlist/join", "a", start).is_ok());
        let retry = limiter
            .check(&Method::POST, "/waitlist/join", "a", start)
            .expect_err("third request is limited");
        assert_eq!(retry, Duration::from_secs(60));

        assert!(limiter.check(&Method::POST, "/waitlist/join", "b", start).is_ok());

        let later = start + Duration::from_secs(61);
        assert!(limiter.check(&Method::POST, "/waitlist/join", "a", later).is_ok());
    }

    #[test]
    fn unmatched_and_disabled_rules_pass() {
        let limiter = limiter();
        let now = Instant::now();
        for _ in 0..10 {
            assert!(limiter.check(&Method::GET, "/waitlist/stats", "a", now).is_ok());
            assert!(limiter.check(&Method::GET, "/ai/process", "a", now).is_ok());
        }
    }

    #[test]
    fn expired_windows_are_dropped_while_live_ones_stay() {
        let limiter = limiter();
        let start = Instant::now();
        for client in 0..5 {
            let client = format!("10.0.0.{client}");
            assert!(limiter.check(&Method::POST, "/waitlist/join", &client, start).is_ok());
        }
        assert_eq!(limiter.tracked_windows(), 5);

        limiter.cleanup(start + Duration::from_secs(30));
        assert_eq!(limiter.tracked_windows(), 5);

        limiter.cleanup(start + Duration::from_secs(61));
        assert_eq!(limiter.tracked_windows(), 0);
    }

    #[test]
    fn periodic_cleanup_bounds_tracked_clients() {
        let limiter = limiter();
        let start = Instant::now();
        for client in 0..CLEANUP_INTERVAL - 1 {
            let client = format!("client-{client}");
            assert!(limiter.check(&Method::POST, "/waitlist/join", &client, start).is_ok());
        }
        assert_eq!(limiter.tracked_windows(), 99);

        let later = start + Duration::from_secs(61);
        assert!(limiter.check(&Method::POST, "/waitlist/join", "late", later).is_ok());
        assert_eq!(limiter.tracked_windows(), 1);
    }
}
