//! Remote table store access.
//!
//! [`TableStore`] is the seam to the hosted store; [`Gateway`] owns one store handle for the
//! whole process and re-validates it with a cheap count probe when the last successful probe
//! is older than the configured interval.

mod gateway;
pub mod memory;
pub mod postgrest;

use async_trait::async_trait;
use serde_json::Value;

pub use gateway::{Gateway, TableHandle, PRIMARY_TABLE};
pub use memory::InMemoryStore;
pub use postgrest::PostgrestStore;

/// Comparison applied by a [`Filter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Lt,
    Gte,
    Lte,
}

impl FilterOp {
    pub fn as_str(self) -> &'static str {
        match self {
            FilterOp::Eq => "eq",
            FilterOp::Lt => "lt",
            FilterOp::Gte => "gte",
            FilterOp::Lte => "lte",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub op: FilterOp,
    pub value: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CountMode {
    #[default]
    None,
    Exact,
}

/// Select request; filters are combined with AND.
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub columns: String,
    pub filters: Vec<Filter>,
    pub count: CountMode,
    /// Only the count is wanted; no rows are transferred.
    pub head: bool,
    pub limit: Option<usize>,
}

impl Select {
    pub fn columns(columns: impl Into<String>) -> Self {
        Self {
            columns: columns.into(),
            filters: Vec::new(),
            count: CountMode::None,
            head: false,
            limit: None,
        }
    }

    /// `SELECT count(*)` over whatever filters follow.
    pub fn count_only() -> Self {
        let mut select = Self::columns("id");
        select.count = CountMode::Exact;
        select.head = true;
        select
    }

    fn filter(mut self, column: &str, op: FilterOp, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            column: column.to_string(),
            op,
            value: value.into(),
        });
        self
    }

    pub fn eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(column, FilterOp::Eq, value)
    }

    pub fn lt(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(column, FilterOp::Lt, value)
    }

    pub fn gte(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(column, FilterOp::Gte, value)
    }

    pub fn lte(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(column, FilterOp::Lte, value)
    }

    pub fn count(mut self, mode: CountMode) -> Self {
        self.count = mode;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectResult {
    pub rows: Vec<Value>,
    /// Present when [`CountMode::Exact`] was requested.
    pub count: Option<u64>,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store transport error: {0}")]
    Transport(String),
    #[error("store API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("row conflicts with an existing unique value: {0}")]
    Conflict(String),
    #[error("store payload could not be decoded: {0}")]
    Decode(String),
    #[error("store connection lost: {0}")]
    Unavailable(String),
}

impl From<reqwest::Error> for StoreError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(value.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Decode(value.to_string())
    }
}

/// Row-oriented access to a remote table store.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Insert one row and return the stored representation(s).
    async fn insert(&self, table: &str, row: Value) -> Result<Vec<Value>, StoreError>;

    async fn select(&self, table: &str, query: &Select) -> Result<SelectResult, StoreError>;
}

#[async_trait]
impl<T: TableStore + ?Sized> TableStore for std::sync::Arc<T> {
    async fn insert(&self, table: &str, row: Value) -> Result<Vec<Value>, StoreError> {
        (**self).insert(table, row).await
    }

    async fn select(&self, table: &str, query: &Select) -> Result<SelectResult, StoreError> {
        (**self).select(table, query).await
    }
}
