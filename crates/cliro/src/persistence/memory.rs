//! Process-local [`TableStore`] used by tests and by `serve --in-memory`.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::DateTime;
use serde_json::{Map, Value};

use super::{CountMode, Filter, FilterOp, Select, SelectResult, StoreError, TableStore};

#[derive(Default)]
struct Table {
    rows: Vec<Value>,
    next_id: i64,
}

/// Tables of JSON rows with auto-increment `id` and optional unique columns.
pub struct InMemoryStore {
    tables: Mutex<HashMap<String, Table>>,
    unique: HashMap<String, Vec<String>>,
    available: AtomicBool,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStore")
            .field("unique", &self.unique)
            .finish_non_exhaustive()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(HashMap::new()),
            unique: HashMap::new(),
            available: AtomicBool::new(true),
        }
    }

    /// Enforce uniqueness of `column` in `table`, mirroring a store-level constraint.
    pub fn with_unique(mut self, table: &str, column: &str) -> Self {
        self.unique
            .entry(table.to_string())
            .or_default()
            .push(column.to_string());
        self
    }

    /// Simulate losing (or regaining) connectivity.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, AtomicOrdering::Release);
    }

    /// Number of rows currently held in `table`.
    pub fn len(&self, table: &str) -> usize {
        self.lock_tables()
            .map(|tables| tables.get(table).map_or(0, |t| t.rows.len()))
            .unwrap_or(0)
    }

    pub fn is_empty(&self, table: &str) -> bool {
        self.len(table) == 0
    }

    fn lock_tables(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, Table>>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Unavailable("in-memory store poisoned".to_string()))
    }

    fn ensure_available(&self) -> Result<(), StoreError> {
        if self.available.load(AtomicOrdering::Acquire) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("in-memory store offline".to_string()))
        }
    }
}

#[async_trait]
impl TableStore for InMemoryStore {
    async fn insert(&self, table: &str, row: Value) -> Result<Vec<Value>, StoreError> {
        self.ensure_available()?;

        let Value::Object(mut fields) = row else {
            return Err(StoreError::Api {
                status: 400,
                message: "row must be a JSON object".to_string(),
            });
        };

        let mut tables = self.lock_tables()?;
        let data = tables.entry(table.to_string()).or_default();

        if let Some(columns) = self.unique.get(table) {
            for column in columns {
                let Some(candidate) = fields.get(column) else {
                    continue;
                };
                let taken = data
                    .rows
                    .iter()
                    .any(|existing| existing.get(column) == Some(candidate));
                if taken {
                    return Err(StoreError::Conflict(format!(
                        "duplicate value for {table}.{column}"
                    )));
                }
            }
        }

        if !fields.contains_key("id") {
            data.next_id += 1;
            fields.insert("id".to_string(), Value::from(data.next_id));
        } else if let Some(id) = fields.get("id").and_then(Value::as_i64) {
            data.next_id = data.next_id.max(id);
        }

        let stored = Value::Object(fields);
        data.rows.push(stored.clone());
        Ok(vec![stored])
    }

    async fn select(&self, table: &str, query: &Select) -> Result<SelectResult, StoreError> {
        self.ensure_available()?;

        let tables = self.lock_tables()?;
        let matching: Vec<&Value> = tables
            .get(table)
            .map(|data| {
                data.rows
                    .iter()
                    .filter(|row| query.filters.iter().all(|filter| matches(row, filter)))
                    .collect()
            })
            .unwrap_or_default();

        let count = match query.count {
            CountMode::Exact => Some(matching.len() as u64),
            CountMode::None => None,
        };

        let rows = if query.head {
            Vec::new()
        } else {
            matching
                .into_iter()
                .take(query.limit.unwrap_or(usize::MAX))
                .map(|row| project(row, &query.columns))
                .collect()
        };

        Ok(SelectResult { rows, count })
    }
}

fn project(row: &Value, columns: &str) -> Value {
    let columns = columns.trim();
    if columns == "*" {
        return row.clone();
    }

    let mut projected = Map::new();
    for column in columns.split(',').map(str::trim).filter(|c| !c.is_empty()) {
        if let Some(value) = row.get(column) {
            projected.insert(column.to_string(), value.clone());
        }
    }
    Value::Object(projected)
}

fn matches(row: &Value, filter: &Filter) -> bool {
    let Some(actual) = row.get(&filter.column) else {
        return false;
    };

    match filter.op {
        FilterOp::Eq => {
            actual == &filter.value || compare(actual, &filter.value) == Some(Ordering::Equal)
        }
        FilterOp::Lt => compare(actual, &filter.value) == Some(Ordering::Less),
        FilterOp::Gte => matches!(
            compare(actual, &filter.value),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        FilterOp::Lte => matches!(
            compare(actual, &filter.value),
            Some(Ordering::Less | Ordering::Equal)
        ),
    }
}

/// Numbers numerically, RFC 3339 timestamps chronologically, other strings lexically.
fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            _ => a.as_f64()?.partial_cmp(&b.as_f64()?),
        },
        (Value::String(a), Value::String(b)) => {
            match (DateTime::parse_from_rfc3339(a), DateTime::parse_from_rfc3339(b)) {
                (Ok(a), Ok(b)) => Some(a.cmp(&b)),
                _ => Some(a.cmp(b)),
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn insert_assigns_increasing_ids() {
        let store = InMemoryStore::new();
        let first = store
            .insert("people", json!({ "name": "Ada" }))
            .await
            .expect("insert");
        let second = store
            .insert("people", json!({ "name": "Grace" }))
            .await
            .expect("insert");

        assert_eq!(first[0]["id"], json!(1));
        assert_eq!(second[0]["id"], json!(2));
        assert_eq!(store.len("people"), 2);
    }

    #[tokio::test]
    async fn unique_columns_raise_conflicts() {
        let store = InMemoryStore::new().with_unique("people", "email");
        store
            .insert("people", json!({ "email": "a@example.com" }))
            .await
            .expect("first insert");

        let result = store
            .insert("people", json!({ "email": "a@example.com" }))
            .await;
        assert!(matches!(result, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn select_applies_filters_projection_and_count() {
        let store = InMemoryStore::new();
        for (name, at) in [
            ("a", "2026-10-14T23:59:59.900000Z"),
            ("b", "2026-10-15T00:00:00.000000Z"),
            ("c", "2026-10-15T12:30:00.000000Z"),
            ("d", "2026-10-16T00:00:00.000000Z"),
        ] {
            store
                .insert("events", json!({ "name": name, "created_at": at }))
                .await
                .expect("insert");
        }

        let today = Select::columns("name")
            .gte("created_at", "2026-10-15T00:00:00Z")
            .lt("created_at", "2026-10-16T00:00:00Z")
            .count(CountMode::Exact);
        let result = store.select("events", &today).await.expect("select");
        assert_eq!(result.count, Some(2));
        assert_eq!(
            result.rows,
            vec![json!({ "name": "b" }), json!({ "name": "c" })]
        );

        let before_three = Select::count_only().lt("id", 3);
        let result = store.select("events", &before_three).await.expect("count");
        assert_eq!(result.count, Some(2));
        assert!(result.rows.is_empty());
    }

    #[tokio::test]
    async fn limit_bounds_rows_but_not_count() {
        let store = InMemoryStore::new();
        for value in 0..5 {
            store
                .insert("numbers", json!({ "value": value }))
                .await
                .expect("insert");
        }

        let query = Select::columns("*").count(CountMode::Exact).limit(2);
        let result = store.select("numbers", &query).await.expect("select");
        assert_eq!(result.rows.len(), 2);
        assert_eq!(result.count, Some(5));
    }

    #[tokio::test]
    async fn offline_store_rejects_operations() {
        let store = InMemoryStore::new();
        store.set_available(false);
        let result = store.select("anything", &Select::count_only()).await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
    }
}
