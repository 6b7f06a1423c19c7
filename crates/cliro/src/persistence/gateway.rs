use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::{debug, error, info};

use super::{Select, SelectResult, StoreError, TableStore};

/// Table used for connectivity probes.
pub const PRIMARY_TABLE: &str = "waitlist_users";

/// Process-wide handle to the table store.
///
/// The only mutable state is the timestamp of the last successful probe, kept in an atomic
/// so concurrent requests can read and refresh it without locking.
pub struct Gateway<S> {
    store: S,
    probe_interval: Duration,
    started: Instant,
    /// Milliseconds since `started` (offset by one) of the last good probe; zero means never.
    last_probe: AtomicU64,
}

impl<S> std::fmt::Debug for Gateway<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("probe_interval", &self.probe_interval)
            .finish_non_exhaustive()
    }
}

impl<S: TableStore> Gateway<S> {
    /// Wrap `store` and require an initial successful probe.
    pub async fn connect(store: S, probe_interval: Duration) -> Result<Self, StoreError> {
        let gateway = Self {
            store,
            probe_interval,
            started: Instant::now(),
            last_probe: AtomicU64::new(0),
        };

        if let Err(err) = gateway.check().await {
            error!(error = %err, "unable to reach table store");
            return Err(err);
        }

        info!("table store connection established");
        Ok(gateway)
    }

    /// Issue a cheap count query against the primary table.
    pub async fn probe(&self) -> bool {
        match self.check().await {
            Ok(()) => {
                debug!("table store probe succeeded");
                true
            }
            Err(err) => {
                error!(error = %err, "table store probe failed");
                false
            }
        }
    }

    /// Like [`Gateway::probe`], but reports why the store is unreachable.
    pub async fn check(&self) -> Result<(), StoreError> {
        self.store
            .select(PRIMARY_TABLE, &Select::count_only().limit(1))
            .await?;
        self.last_probe.store(self.now_tick(), Ordering::Release);
        Ok(())
    }

    fn now_tick(&self) -> u64 {
        let millis = u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX - 1);
        millis.saturating_add(1)
    }

    fn probe_due(&self) -> bool {
        let last = self.last_probe.load(Ordering::Acquire);
        if last == 0 {
            return true;
        }
        let interval = u64::try_from(self.probe_interval.as_millis()).unwrap_or(u64::MAX);
        self.now_tick().saturating_sub(last) >= interval
    }

    /// Handle to `name`, re-probing first when the last probe is stale.
    ///
    /// A failed due probe fails fast with [`StoreError::Unavailable`].
    pub async fn table(&self, name: &str) -> Result<TableHandle<'_, S>, StoreError> {
        if self.probe_due() && !self.probe().await {
            return Err(StoreError::Unavailable(
                "connectivity probe failed".to_string(),
            ));
        }

        debug!(table = name, "accessing table");
        Ok(TableHandle {
            store: &self.store,
            name: name.to_string(),
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

/// Borrowed view of a single table.
pub struct TableHandle<'a, S> {
    store: &'a S,
    name: String,
}

impl<S: TableStore> TableHandle<'_, S> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn insert(&self, row: Value) -> Result<Vec<Value>, StoreError> {
        self.store.insert(&self.name, row).await
    }

    pub async fn select(&self, query: &Select) -> Result<SelectResult, StoreError> {
        self.store.select(&self.name, query).await
    }
}
