//! Google Sheets v4 backend.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, Url};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use dotpoint_core::traits::{a1_range, quote_tab, SpreadsheetBackend};

use crate::auth::TokenSource;
use crate::error::SheetsError;

pub const DEFAULT_BASE_URL: &str = "https://sheets.googleapis.com";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Client for one spreadsheet document.
pub struct GoogleSheetsClient {
    spreadsheet_id: String,
    base_url: String,
    tokens: Arc<dyn TokenSource>,
    client: reqwest::Client,
}

impl GoogleSheetsClient {
    pub fn new(
        spreadsheet_id: &str,
        tokens: Arc<dyn TokenSource>,
        base_url: Option<String>,
    ) -> Result<Self, SheetsError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| SheetsError::NetworkError(e.to_string()))?;

        Ok(Self {
            spreadsheet_id: spreadsheet_id.to_string(),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            tokens,
            client,
        })
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    /// `{base}/v4/spreadsheets/{id}{suffix}/{extra...}` with every segment percent-encoded.
    fn url(&self, id_suffix: &str, extra: &[&str]) -> Result<Url, SheetsError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| SheetsError::NetworkError(format!("invalid base URL: {e}")))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| SheetsError::NetworkError("base URL cannot have a path".into()))?;
            segments
                .pop_if_empty()
                .extend(["v4", "spreadsheets"])
                .push(&format!("{}{}", self.spreadsheet_id, id_suffix))
                .extend(extra);
        }
        Ok(url)
    }

    /// Attach the bearer token, send, and map error statuses.
    async fn send(&self, request: RequestBuilder) -> Result<Response, SheetsError> {
        let token = self.tokens.access_token().await?;
        let response = request
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| SheetsError::from_transport(e, DEFAULT_TIMEOUT_SECS))?;

        let status = response.status().as_u16();
        if status >= 400 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());
            let body = response.text().await.unwrap_or_default();
            return Err(SheetsError::from_status(status, retry_after, body));
        }

        Ok(response)
    }

    async fn parse<T: for<'de> Deserialize<'de>>(response: Response) -> Result<T, SheetsError> {
        response.json().await.map_err(|e| SheetsError::ApiError {
            status: 0,
            message: format!("failed to parse response: {e}"),
        })
    }
}

#[derive(Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Serialize, Deserialize)]
struct SheetProperties {
    title: String,
}

#[derive(Serialize)]
struct BatchUpdateRequest {
    requests: Vec<BatchRequest>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchRequest {
    add_sheet: AddSheet,
}

#[derive(Serialize)]
struct AddSheet {
    properties: SheetProperties,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ValueRangeBody<'a> {
    range: &'a str,
    major_dimension: &'static str,
    values: &'a [Vec<String>],
}

#[derive(Deserialize)]
struct ValueRangeResponse {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateResponse {
    #[serde(default)]
    updated_range: Option<String>,
}

fn cell_to_string(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[async_trait]
impl SpreadsheetBackend for GoogleSheetsClient {
    fn name(&self) -> &str {
        "google-sheets"
    }

    #[instrument(skip(self), fields(spreadsheet = %self.spreadsheet_id))]
    async fn list_tabs(&self) -> anyhow::Result<Vec<String>> {
        let url = self.url("", &[])?;
        let response = self
            .send(
                self.client
                    .get(url)
                    .query(&[("fields", "sheets.properties.title")]),
            )
            .await?;
        let meta: SpreadsheetMeta = Self::parse(response).await?;
        Ok(meta.sheets.into_iter().map(|s| s.properties.title).collect())
    }

    #[instrument(skip(self), fields(spreadsheet = %self.spreadsheet_id))]
    async fn create_tab(&self, title: &str) -> anyhow::Result<()> {
        let url = self.url(":batchUpdate", &[])?;
        let body = BatchUpdateRequest {
            requests: vec![BatchRequest {
                add_sheet: AddSheet {
                    properties: SheetProperties {
                        title: title.to_string(),
                    },
                },
            }],
        };
        self.send(self.client.post(url).json(&body)).await?;
        Ok(())
    }

    #[instrument(skip(self), fields(spreadsheet = %self.spreadsheet_id))]
    async fn read_values(&self, tab: &str) -> anyhow::Result<Vec<Vec<String>>> {
        let range = quote_tab(tab);
        let url = self.url("", &["values", range.as_str()])?;
        let response = self.send(self.client.get(url)).await?;
        let body: ValueRangeResponse = Self::parse(response).await?;
        Ok(body
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_to_string).collect())
            .collect())
    }

    #[instrument(skip(self, rows), fields(spreadsheet = %self.spreadsheet_id, rows = rows.len()))]
    async fn write_values(
        &self,
        tab: &str,
        start_row: usize,
        rows: &[Vec<String>],
    ) -> anyhow::Result<String> {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let range = a1_range(tab, start_row, rows.len(), width);
        let url = self.url("", &["values", range.as_str()])?;
        let body = ValueRangeBody {
            range: &range,
            major_dimension: "ROWS",
            values: rows,
        };

        let response = self
            .send(
                self.client
                    .put(url)
                    .query(&[("valueInputOption", "RAW")])
                    .json(&body),
            )
            .await?;
        let update: UpdateResponse = Self::parse(response).await?;

        Ok(update.updated_range.unwrap_or(range))
    }
}
