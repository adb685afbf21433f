//! Append-only order ledger backed by a spreadsheet.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};
use url::Url;

use crate::errors::{CheckoutError, Result};
use crate::row::{col_to_a1, parse_updated_range_row};
use crate::token::AccessTokenSource;

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com";

/// Row store keyed by session id in the first column. Rows and columns are
/// 1-based.
#[async_trait]
pub trait OrderLedger: Send + Sync {
    /// Writes `header` to the first row unless that row already has content.
    async fn ensure_header(&self, header: &[&str]) -> Result<()>;
    async fn find_session_row(&self, session_id: &str) -> Result<Option<usize>>;
    /// Appends `row` and returns its index when the API reports it.
    async fn append_row(&self, row: &[Value]) -> Result<Option<usize>>;
    async fn read_cell(&self, column: usize, row: usize) -> Result<String>;
    async fn write_cell(&self, column: usize, row: usize, value: &str) -> Result<()>;
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ValueRange {
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct AppendResponse {
    updates: AppendUpdates,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct AppendUpdates {
    updated_range: String,
}

pub struct GoogleSheetsLedger {
    client: Client,
    tokens: Arc<dyn AccessTokenSource>,
    api_base: String,
    sheet_id: String,
    tab: String,
}

impl GoogleSheetsLedger {
    pub fn new(client: Client, tokens: Arc<dyn AccessTokenSource>, sheet_id: String, tab: String) -> Self {
        Self {
            client,
            tokens,
            api_base: SHEETS_API_BASE.to_string(),
            sheet_id,
            tab,
        }
    }

    pub fn with_base_url(mut self, api_base: String) -> Self {
        self.api_base = api_base;
        self
    }

    /// `.../v4/spreadsheets/{id}/values/{range}[:{action}]?{query}`. The
    /// action suffix stays a literal colon.
    pub fn values_url(&self, range: &str, action: Option<&str>, query: &[(&str, &str)]) -> Result<Url> {
        let mut url = Url::parse(&self.api_base)
            .map_err(|e| CheckoutError::Config(format!("Sheets API URL: {e}")))?;
        let last = match action {
            Some(action) => format!("{range}:{action}"),
            None => range.to_string(),
        };
        url.path_segments_mut()
            .map_err(|_| CheckoutError::Config("Sheets API URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", self.sheet_id.as_str(), "values", last.as_str()]);
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    async fn request(
        &self,
        method: Method,
        range: &str,
        action: Option<&str>,
        query: &[(&str, &str)],
        body: Option<Value>,
    ) -> Result<Value> {
        let url = self.values_url(range, action, query)?;
        let token = self.tokens.access_token().await?;

        let mut req = self.client.request(method.clone(), url).bearer_auth(token);
        if let Some(body) = body {
            req = req.json(&body);
        }
        let resp = req.send().await?;

        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        let data: Value = serde_json::from_str(&text).unwrap_or_else(|_| json!({}));

        if !status.is_success() {
            let api_error = &data["error"];
            let msg = api_error["message"]
                .as_str()
                .or_else(|| api_error["status"].as_str())
                .map(str::to_string)
                .or_else(|| (!text.is_empty()).then(|| text.chars().take(500).collect()))
                .or_else(|| status.canonical_reason().map(str::to_string))
                .unwrap_or_else(|| "Google Sheets API error".to_string());
            let code = api_error["code"].as_u64().unwrap_or(u64::from(status.as_u16()));
            let hint = match code {
                403 => " (vérifie le partage du Sheet au service account + l’API Sheets activée)",
                404 => " (vérifie GOOGLE_SHEETS_ID)",
                _ => "",
            };
            return Err(CheckoutError::Upstream(format!(
                "Google Sheets API ({}) {method} {range}: {msg}{hint}",
                status.as_u16()
            )));
        }

        Ok(data)
    }

    async fn get_values(&self, range: &str) -> Result<Vec<Vec<Value>>> {
        let data = self.request(Method::GET, range, None, &[], None).await?;
        let parsed: ValueRange = serde_json::from_value(data).unwrap_or_default();
        Ok(parsed.values)
    }

    async fn put_values(&self, range: &str, values: Value) -> Result<()> {
        self.request(
            Method::PUT,
            range,
            None,
            &[("valueInputOption", "RAW")],
            Some(json!({"range": range, "majorDimension": "ROWS", "values": values})),
        )
        .await?;
        Ok(())
    }

    fn cell(&self, column: usize, row: usize) -> String {
        format!("{}!{}{}", self.tab, col_to_a1(column), row)
    }
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[async_trait]
impl OrderLedger for GoogleSheetsLedger {
    async fn ensure_header(&self, header: &[&str]) -> Result<()> {
        let range = format!("{}!A1:{}1", self.tab, col_to_a1(header.len()));
        let current = self.get_values(&range).await?;
        let has_header = current
            .first()
            .is_some_and(|row| row.iter().any(|v| !cell_text(v).trim().is_empty()));
        if has_header {
            return Ok(());
        }

        info!(tab = %self.tab, "writing ledger header row");
        self.put_values(&format!("{}!A1", self.tab), json!([header])).await
    }

    async fn find_session_row(&self, session_id: &str) -> Result<Option<usize>> {
        let column = self.get_values(&format!("{}!A:A", self.tab)).await?;
        Ok(column
            .iter()
            .position(|row| row.first().map(cell_text).as_deref() == Some(session_id))
            .map(|i| i + 1))
    }

    async fn append_row(&self, row: &[Value]) -> Result<Option<usize>> {
        let range = format!("{}!A:{}", self.tab, col_to_a1(row.len()));
        let data = self
            .request(
                Method::POST,
                &range,
                Some("append"),
                &[("valueInputOption", "RAW"), ("insertDataOption", "INSERT_ROWS")],
                Some(json!({"majorDimension": "ROWS", "values": [row]})),
            )
            .await?;
        let parsed: AppendResponse = serde_json::from_value(data).unwrap_or_default();
        let index = parse_updated_range_row(&parsed.updates.updated_range);
        debug!(row = index, "ledger row appended");
        Ok((index > 0).then_some(index))
    }

    async fn read_cell(&self, column: usize, row: usize) -> Result<String> {
        let values = self.get_values(&self.cell(column, row)).await?;
        Ok(values
            .first()
            .and_then(|r| r.first())
            .map(cell_text)
            .unwrap_or_default())
    }

    async fn write_cell(&self, column: usize, row: usize, value: &str) -> Result<()> {
        self.put_values(&self.cell(column, row), json!([[value]])).await
    }
}
