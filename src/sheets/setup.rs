//! Startup verification of the backing spreadsheet
//!
//! Every failure here is fatal: the bot must not start against a
//! spreadsheet it cannot read and write.

use super::{spreadsheet_url, A1Range, RowStore, SheetsError, SpreadsheetMetadata};
use thiserror::Error;

const HEADER: [&str; 4] = ["ID", "Text", "Completed", "UserID"];

#[derive(Debug, Error)]
pub enum SetupError {
    #[error(
        "Spreadsheet not found. Open {url} to check it exists, \
         or set SPREADSHEET_ID to the id of an existing spreadsheet."
    )]
    SpreadsheetNotFound { url: String },

    #[error(
        "Permission denied. Share the spreadsheet with your service account: \
         1. Open {url} 2. Click \"Share\" 3. Add {service_account} \
         4. Give it \"Editor\" permission 5. Restart the bot."
    )]
    PermissionDenied { url: String, service_account: String },

    #[error(
        "Sheet \"{sheet}\" not found in spreadsheet. Create it manually: \
         1. Open {url} 2. Click + at the bottom to add a sheet \
         3. Rename it to exactly \"{sheet}\" (case sensitive) 4. Restart the bot."
    )]
    MissingSheet { sheet: String, url: String },

    #[error(
        "Permission denied accessing sheet content. {service_account} needs \
         \"Editor\" (not \"Viewer\") permission on {url}."
    )]
    ReadOnlyAccess { url: String, service_account: String },

    #[error("Google Sheets API error: {0}")]
    Api(#[from] SheetsError),
}

/// Verify the spreadsheet and sheet exist and are writable, and write the
/// header row if it is missing.
pub async fn initialize<S>(
    store: &S,
    spreadsheet_id: &str,
    range: &A1Range,
    service_account: &str,
) -> Result<(), SetupError>
where
    S: RowStore + SpreadsheetMetadata,
{
    let url = spreadsheet_url(spreadsheet_id);
    tracing::info!(spreadsheet_id, service_account, "Initializing Google Sheets");

    let info = store.spreadsheet_info().await.map_err(|e| match e.status() {
        Some(404) => SetupError::SpreadsheetNotFound { url: url.clone() },
        Some(403) => SetupError::PermissionDenied {
            url: url.clone(),
            service_account: service_account.to_string(),
        },
        _ => SetupError::Api(e),
    })?;

    tracing::info!(
        title = %info.title,
        sheets = ?info.sheet_titles,
        "Connected to spreadsheet"
    );

    if !info.sheet_titles.iter().any(|t| t == range.sheet()) {
        return Err(SetupError::MissingSheet {
            sheet: range.sheet().to_string(),
            url,
        });
    }

    let header_range = range.cells('A', 1, 'D', 1);
    let content_error = |e: SheetsError| match e.status() {
        Some(403) => SetupError::ReadOnlyAccess {
            url: url.clone(),
            service_account: service_account.to_string(),
        },
        _ => SetupError::Api(e),
    };

    let header = store
        .read_range(&header_range)
        .await
        .map_err(content_error)?;

    if header.iter().all(Vec::is_empty) {
        tracing::info!(range = %header_range, "No header row found, writing one");
        let row: Vec<String> = HEADER.iter().map(ToString::to_string).collect();
        store
            .write_range(&header_range, vec![row])
            .await
            .map_err(content_error)?;
    } else {
        tracing::info!(header = ?header.first(), "Header row present");
    }

    Ok(())
}
