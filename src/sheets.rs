//! Google Sheets row store
//!
//! `RowStore` is the row-oriented boundary the todo adapter is written
//! against: a rectangular cell grid addressed by A1 ranges. `SheetsClient`
//! implements it over the Sheets v4 REST API.

mod auth;
mod setup;

#[cfg(test)]
pub mod testing;

pub use auth::{KeyFileError, ServiceAccountKey, TokenProvider};
pub use setup::initialize;

use async_trait::async_trait;
use reqwest::{Client, Method, Url};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors from the row store
#[derive(Debug, Error)]
pub enum SheetsError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Sheets API error {status}: {message}")]
    Api { status: u16, message: String },
    #[error("Authentication failed: {0}")]
    Auth(String),
    #[error("Invalid request URL: {0}")]
    Url(String),
    #[error("Unexpected sheet contents: {0}")]
    Data(String),
}

impl SheetsError {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// HTTP status for API errors
    pub fn status(&self) -> Option<u16> {
        match self {
            SheetsError::Api { status, .. } => Some(*status),
            SheetsError::Http(e) => e.status().map(|s| s.as_u16()),
            SheetsError::Auth(_) | SheetsError::Url(_) | SheetsError::Data(_) => None,
        }
    }
}

pub type SheetsResult<T> = Result<T, SheetsError>;

/// A1-notation range builder for a single sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct A1Range {
    sheet: String,
}

impl A1Range {
    pub fn new(sheet: impl Into<String>) -> Self {
        Self {
            sheet: sheet.into(),
        }
    }

    pub fn sheet(&self) -> &str {
        &self.sheet
    }

    /// `Sheet!A1:D1`
    pub fn cells(&self, from_col: char, from_row: usize, to_col: char, to_row: usize) -> String {
        format!("{}!{from_col}{from_row}:{to_col}{to_row}", self.sheet)
    }

    /// `Sheet!C5`
    pub fn cell(&self, col: char, row: usize) -> String {
        format!("{}!{col}{row}", self.sheet)
    }

    /// `Sheet!A2:D` - open-ended to the last populated row
    pub fn columns_from(&self, from_col: char, from_row: usize, to_col: char) -> String {
        format!("{}!{from_col}{from_row}:{to_col}", self.sheet)
    }
}

/// Rectangular cell store
///
/// Reads return rows as the Sheets API does: trailing blank rows and
/// trailing blank cells within a row are omitted.
#[async_trait]
pub trait RowStore: Send + Sync {
    async fn read_range(&self, range: &str) -> SheetsResult<Vec<Vec<String>>>;

    /// Overwrite the cells of `range` starting at its top-left corner
    async fn write_range(&self, range: &str, rows: Vec<Vec<String>>) -> SheetsResult<()>;

    /// Append a row after the last populated row of the table at `range`
    async fn append_row(&self, range: &str, row: Vec<String>) -> SheetsResult<()>;

    /// Blank out every cell in `range` without shifting other rows
    async fn clear_range(&self, range: &str) -> SheetsResult<()>;
}

/// Spreadsheet-level metadata used by the startup checks
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpreadsheetInfo {
    pub title: String,
    pub sheet_titles: Vec<String>,
}

/// Access to spreadsheet metadata
#[async_trait]
pub trait SpreadsheetMetadata: Send + Sync {
    async fn spreadsheet_info(&self) -> SheetsResult<SpreadsheetInfo>;
}

#[async_trait]
impl<T: RowStore + ?Sized> RowStore for Arc<T> {
    async fn read_range(&self, range: &str) -> SheetsResult<Vec<Vec<String>>> {
        (**self).read_range(range).await
    }

    async fn write_range(&self, range: &str, rows: Vec<Vec<String>>) -> SheetsResult<()> {
        (**self).write_range(range, rows).await
    }

    async fn append_row(&self, range: &str, row: Vec<String>) -> SheetsResult<()> {
        (**self).append_row(range, row).await
    }

    async fn clear_range(&self, range: &str) -> SheetsResult<()> {
        (**self).clear_range(range).await
    }
}

#[async_trait]
impl<T: SpreadsheetMetadata + ?Sized> SpreadsheetMetadata for Arc<T> {
    async fn spreadsheet_info(&self) -> SheetsResult<SpreadsheetInfo> {
        (**self).spreadsheet_info().await
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
struct Spreadsheet {
    #[serde(default)]
    properties: Option<SheetProperties>,
    #[serde(default)]
    sheets: Vec<Sheet>,
}

#[derive(Debug, Deserialize)]
struct Sheet {
    #[serde(default)]
    properties: Option<SheetProperties>,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    #[serde(default)]
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorBody {
    error: GoogleError,
}

#[derive(Debug, Deserialize)]
struct GoogleError {
    #[serde(default)]
    message: String,
}

/// Cells come back as strings under the default render option, but a
/// hand-edited sheet can hold numbers or booleans too.
fn cell_to_string(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

// ============================================================================
// Client
// ============================================================================

/// Sheets v4 REST client bound to one spreadsheet
pub struct SheetsClient {
    http: Client,
    base_url: String,
    spreadsheet_id: String,
    auth: TokenProvider,
}

impl SheetsClient {
    pub fn new(spreadsheet_id: impl Into<String>, auth: TokenProvider) -> SheetsResult<Self> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: SHEETS_API_BASE.to_string(),
            spreadsheet_id: spreadsheet_id.into(),
            auth,
        })
    }

    #[cfg(test)]
    fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn url(&self, segments: &[&str]) -> SheetsResult<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|e| SheetsError::Url(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| SheetsError::Url(self.base_url.clone()))?
            .push(&self.spreadsheet_id)
            .extend(segments);
        Ok(url)
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<serde_json::Value>,
    ) -> SheetsResult<reqwest::Response> {
        let token = self.auth.access_token().await?;
        let mut request = self.http.request(method, url).bearer_auth(token);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<GoogleErrorBody>(&text)
            .map(|b| b.error.message)
            .unwrap_or(text);
        Err(SheetsError::api(status.as_u16(), message))
    }
}

#[async_trait]
impl RowStore for SheetsClient {
    async fn read_range(&self, range: &str) -> SheetsResult<Vec<Vec<String>>> {
        let url = self.url(&["values", range])?;
        let response = self.send(Method::GET, url, None).await?;
        let body: ValueRange = response.json().await?;
        Ok(body
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_to_string).collect())
            .collect())
    }

    async fn write_range(&self, range: &str, rows: Vec<Vec<String>>) -> SheetsResult<()> {
        let mut url = self.url(&["values", range])?;
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");
        let body = json!({ "range": range, "majorDimension": "ROWS", "values": rows });
        self.send(Method::PUT, url, Some(body)).await?;
        Ok(())
    }

    async fn append_row(&self, range: &str, row: Vec<String>) -> SheetsResult<()> {
        let mut url = self.url(&["values", &format!("{range}:append")])?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "RAW")
            .append_pair("insertDataOption", "INSERT_ROWS");
        let body = json!({ "majorDimension": "ROWS", "values": [row] });
        self.send(Method::POST, url, Some(body)).await?;
        Ok(())
    }

    async fn clear_range(&self, range: &str) -> SheetsResult<()> {
        let url = self.url(&["values", &format!("{range}:clear")])?;
        self.send(Method::POST, url, Some(json!({}))).await?;
        Ok(())
    }
}

#[async_trait]
impl SpreadsheetMetadata for SheetsClient {
    async fn spreadsheet_info(&self) -> SheetsResult<SpreadsheetInfo> {
        let mut url = self.url(&[])?;
        url.query_pairs_mut()
            .append_pair("fields", "properties.title,sheets.properties.title");
        let response = self.send(Method::GET, url, None).await?;
        let body: Spreadsheet = response.json().await?;
        Ok(SpreadsheetInfo {
            title: body
                .properties
                .and_then(|p| p.title)
                .unwrap_or_else(|| "Unknown".to_string()),
            sheet_titles: body
                .sheets
                .into_iter()
                .filter_map(|s| s.properties.and_then(|p| p.title))
                .collect(),
        })
    }
}

pub fn spreadsheet_url(spreadsheet_id: &str) -> String {
    format!("https://docs.google.com/spreadsheets/d/{spreadsheet_id}/edit")
}
