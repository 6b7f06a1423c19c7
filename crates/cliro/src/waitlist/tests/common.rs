use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};

use crate::persistence::{
    FilterOp, Gateway, InMemoryStore, Select, SelectResult, StoreError, TableStore,
};
use crate::waitlist::{SignupRequest, WaitlistCandidate, WaitlistService, WAITLIST_TABLE};

pub(super) fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 15, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn signup(email: &str) -> SignupRequest {
    SignupRequest {
        email: email.to_string(),
        name: "Test User".to_string(),
        interest_reason: "productivity".to_string(),
        preferred_languages: vec!["es".to_string(), "en".to_string()],
    }
}

pub(super) fn candidate(email: &str) -> WaitlistCandidate {
    signup(email).validate().expect("valid signup")
}

pub(super) fn waitlist_store() -> Arc<InMemoryStore> {
    Arc::new(InMemoryStore::new().with_unique(WAITLIST_TABLE, "email"))
}

pub(super) async fn build_service<S>(store: S) -> WaitlistService<S>
where
    S: TableStore + 'static,
{
    let gateway = Gateway::connect(store, Duration::from_secs(300))
        .await
        .expect("store reachable");
    WaitlistService::with_clock(Arc::new(gateway), Arc::new(fixed_now))
}

/// Store whose inserts race a concurrent signup for the same email.
pub(super) struct RacingStore {
    pub(super) inner: Arc<InMemoryStore>,
    rival: Mutex<Option<Value>>,
}

impl RacingStore {
    pub(super) fn new(email: &str) -> Self {
        Self {
            inner: waitlist_store(),
            rival: Mutex::new(Some(json!({
                "email": email,
                "name": "Rival Signup",
                "interest_reason": "other",
                "preferred_languages": ["en"],
                "created_at": "2026-10-15T11:59:59Z",
                "verification_token": "rival",
                "is_verified": false
            }))),
        }
    }
}

#[async_trait]
impl TableStore for RacingStore {
    async fn insert(&self, table: &str, row: Value) -> Result<Vec<Value>, StoreError> {
        let rival = self.rival.lock().expect("rival mutex poisoned").take();
        if let Some(rival) = rival {
            self.inner.insert(table, rival).await?;
        }
        self.inner.insert(table, row).await
    }

    async fn select(&self, table: &str, query: &Select) -> Result<SelectResult, StoreError> {
        self.inner.select(table, query).await
    }
}

/// Store that accepts inserts without echoing the stored row.
#[derive(Default)]
pub(super) struct SilentInsertStore {
    inner: InMemoryStore,
}

#[async_trait]
impl TableStore for SilentInsertStore {
    async fn insert(&self, table: &str, row: Value) -> Result<Vec<Value>, StoreError> {
        self.inner.insert(table, row).await?;
        Ok(Vec::new())
    }

    async fn select(&self, table: &str, query: &Select) -> Result<SelectResult, StoreError> {
        self.inner.select(table, query).await
    }
}

/// Store that accepts signups but cannot count rows ahead of an id.
#[derive(Default)]
pub(super) struct RankBlindStore {
    inner: InMemoryStore,
}

#[async_trait]
impl TableStore for RankBlindStore {
    async fn insert(&self, table: &str, row: Value) -> Result<Vec<Value>, StoreError> {
        self.inner.insert(table, row).await
    }

    async fn select(&self, table: &str, query: &Select) -> Result<SelectResult, StoreError> {
        if query
            .filters
            .iter()
            .any(|filter| filter.column == "id" && filter.op == FilterOp::Lt)
        {
            return Err(StoreError::Transport("connection reset".to_string()));
        }
        self.inner.select(table, query).await
    }
}

/// Store that answers probes but rejects every write.
#[derive(Default)]
pub(super) struct RejectingStore {
    inner: InMemoryStore,
}

#[async_trait]
impl TableStore for RejectingStore {
    async fn insert(&self, _table: &str, _row: Value) -> Result<Vec<Value>, StoreError> {
        Err(StoreError::Api {
            status: 500,
            message: "relation is read only".to_string(),
        })
    }

    async fn select(&self, table: &str, query: &Select) -> Result<SelectResult, StoreError> {
        self.inner.select(table, query).await
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
