//! [`TableStore`] backed by a PostgREST endpoint (the Supabase REST API).

use async_trait::async_trait;
use reqwest::header::{HeaderMap, CONTENT_RANGE};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::Value;

use super::{CountMode, Select, SelectResult, StoreError, TableStore};
use crate::config::StoreConfig;

const PREFER: &str = "Prefer";

#[derive(Clone)]
pub struct PostgrestStore {
    client: Client,
    base_url: String,
    service_key: String,
}

impl std::fmt::Debug for PostgrestStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgrestStore")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl PostgrestStore {
    pub fn new(config: &StoreConfig) -> Result<Self, StoreError> {
        let client = Client::builder()
            .connect_timeout(config.timeout.min(std::time::Duration::from_secs(5)))
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            service_key: config.service_key.clone(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }
}

fn filter_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn query_params(query: &Select) -> Vec<(String, String)> {
    let mut params = vec![("select".to_string(), query.columns.clone())];
    params.extend(query.filters.iter().map(|filter| {
        (
            filter.column.clone(),
            format!("{}.{}", filter.op.as_str(), filter_value(&filter.value)),
        )
    }));
    if let Some(limit) = query.limit {
        params.push(("limit".to_string(), limit.to_string()));
    }
    params
}

/// Total from a `Content-Range` header such as `0-24/3573` or `*/0`.
fn parse_content_range(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_RANGE)?
        .to_str()
        .ok()?
        .rsplit('/')
        .next()?
        .parse()
        .ok()
}

async fn error_for_status(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|json| json.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or(body);

    if status == StatusCode::CONFLICT {
        return Err(StoreError::Conflict(message));
    }

    Err(StoreError::Api {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl TableStore for PostgrestStore {
    async fn insert(&self, table: &str, row: Value) -> Result<Vec<Value>, StoreError> {
        let request = self
            .authorized(self.client.post(self.table_url(table)))
            .header(PREFER, "return=representation")
            .json(&row);

        let response = error_for_status(request.send().await?).await?;
        let rows = response.json::<Vec<Value>>().await?;
        Ok(rows)
    }

    async fn select(&self, table: &str, query: &Select) -> Result<SelectResult, StoreError> {
        let url = self.table_url(table);
        let builder = if query.head {
            self.client.head(url)
        } else {
            self.client.get(url)
        };

        let mut request = self.authorized(builder).query(&query_params(query));
        if query.count == CountMode::Exact {
            request = request.header(PREFER, "count=exact");
        }

        let response = error_for_status(request.send().await?).await?;
        let count = match query.count {
            CountMode::Exact => Some(parse_content_range(response.headers()).ok_or_else(|| {
                StoreError::Decode("missing or malformed Content-Range header".to_string())
            })?),
            CountMode::None => None,
        };

        let rows = if query.head {
            Vec::new()
        } else {
            response.json::<Vec<Value>>().await?
        };

        Ok(SelectResult { rows, count })
    }
}
