//! In-memory row store for testing
//!
//! Mimics the parts of Sheets semantics the adapter relies on: trailing
//! blank cells and rows are dropped on read, blank rows in the middle come
//! back as empty rows, and appends land after the last non-blank row.

use super::{
    RowStore, ServiceAccountKey, SheetsError, SheetsResult, SpreadsheetInfo, SpreadsheetMetadata,
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Zero-based cell rectangle; `None` end means open-ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Rect {
    first_row: usize,
    last_row: Option<usize>,
    first_col: usize,
    last_col: usize,
}

fn parse_cell(cell: &str) -> Option<(usize, Option<usize>)> {
    let letters: String = cell.chars().take_while(char::is_ascii_alphabetic).collect();
    let digits: String = cell.chars().skip(letters.len()).collect();
    let mut col = 0usize;
    for ch in letters.chars() {
        col = col * 26 + (ch.to_ascii_uppercase() as usize - 'A' as usize + 1);
    }
    let col = col.checked_sub(1)?;
    let row = if digits.is_empty() {
        None
    } else {
        Some(digits.parse::<usize>().ok()?.checked_sub(1)?)
    };
    Some((col, row))
}

fn parse_range(range: &str) -> Rect {
    let cells = range.split_once('!').map_or(range, |(_, cells)| cells);
    let (start, end) = cells.split_once(':').unwrap_or((cells, cells));
    let (first_col, first_row) = parse_cell(start).expect("valid start cell");
    let (last_col, last_row) = parse_cell(end).expect("valid end cell");
    Rect {
        first_row: first_row.unwrap_or(0),
        last_row,
        first_col,
        last_col,
    }
}

/// Grid-backed `RowStore` with failure injection and a call log
#[derive(Default)]
pub struct MemoryRowStore {
    sheet_titles: Vec<String>,
    grid: Mutex<Vec<Vec<String>>>,
    next_error: Mutex<Option<SheetsError>>,
    always_fail: AtomicBool,
    /// Every range operation, e.g. `clear Todos!A3:D3`
    pub calls: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl MemoryRowStore {
    pub fn new() -> Self {
        Self::with_sheets(&["Todos"])
    }

    pub fn with_sheets(titles: &[&str]) -> Self {
        Self {
            sheet_titles: titles.iter().map(ToString::to_string).collect(),
            ..Default::default()
        }
    }

    /// Replace sheet row `row_number` (1-based) with `cells`
    pub fn set_row(&self, row_number: usize, cells: &[&str]) {
        let mut grid = self.grid.lock().unwrap();
        let index = row_number - 1;
        if grid.len() <= index {
            grid.resize(index + 1, Vec::new());
        }
        grid[index] = cells.iter().map(ToString::to_string).collect();
    }

    /// Raw contents of sheet row `row_number` (1-based)
    pub fn row(&self, row_number: usize) -> Vec<String> {
        self.grid
            .lock()
            .unwrap()
            .get(row_number - 1)
            .cloned()
            .unwrap_or_default()
    }

    /// Fail the next operation with `error`
    pub fn fail_with(&self, error: SheetsError) {
        *self.next_error.lock().unwrap() = Some(error);
    }

    /// Fail every operation until switched off
    pub fn set_failing(&self, failing: bool) {
        self.always_fail.store(failing, Ordering::SeqCst);
    }

    pub fn recorded_calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn check(&self, op: &str, range: &str) -> SheetsResult<()> {
        self.calls.lock().unwrap().push(format!("{op} {range}"));
        if let Some(error) = self.next_error.lock().unwrap().take() {
            return Err(error);
        }
        if self.always_fail.load(Ordering::SeqCst) {
            return Err(SheetsError::api(503, "The service is currently unavailable."));
        }
        Ok(())
    }

    fn write_cells(grid: &mut Vec<Vec<String>>, row: usize, first_col: usize, cells: &[String]) {
        if grid.len() <= row {
            grid.resize(row + 1, Vec::new());
        }
        let target = &mut grid[row];
        if target.len() < first_col + cells.len() {
            target.resize(first_col + cells.len(), String::new());
        }
        for (offset, cell) in cells.iter().enumerate() {
            target[first_col + offset].clone_from(cell);
        }
    }
}

#[async_trait]
impl RowStore for MemoryRowStore {
    async fn read_range(&self, range: &str) -> SheetsResult<Vec<Vec<String>>> {
        self.check("read", range)?;
        let rect = parse_range(range);
        let grid = self.grid.lock().unwrap();

        let last_row = rect
            .last_row
            .unwrap_or_else(|| grid.len().saturating_sub(1));
        let mut rows: Vec<Vec<String>> = (rect.first_row..=last_row)
            .map(|r| {
                let source = grid.get(r).cloned().unwrap_or_default();
                let mut cells: Vec<String> = (rect.first_col..=rect.last_col)
                    .map(|c| source.get(c).cloned().unwrap_or_default())
                    .collect();
                while cells.last().is_some_and(String::is_empty) {
                    cells.pop();
                }
                cells
            })
            .collect();
        while rows.last().is_some_and(Vec::is_empty) {
            rows.pop();
        }
        Ok(rows)
    }

    async fn write_range(&self, range: &str, rows: Vec<Vec<String>>) -> SheetsResult<()> {
        self.check("write", range)?;
        let rect = parse_range(range);
        let mut grid = self.grid.lock().unwrap();
        for (offset, cells) in rows.iter().enumerate() {
            Self::write_cells(&mut grid, rect.first_row + offset, rect.first_col, cells);
        }
        Ok(())
    }

    async fn append_row(&self, range: &str, row: Vec<String>) -> SheetsResult<()> {
        self.check("append", range)?;
        let rect = parse_range(range);
        let mut grid = self.grid.lock().unwrap();
        let after_last = grid
            .iter()
            .rposition(|r| r.iter().any(|c| !c.is_empty()))
            .map_or(0, |i| i + 1);
        let target = after_last.max(rect.first_row);
        Self::write_cells(&mut grid, target, rect.first_col, &row);
        Ok(())
    }

    async fn clear_range(&self, range: &str) -> SheetsResult<()> {
        self.check("clear", range)?;
        let rect = parse_range(range);
        let mut grid = self.grid.lock().unwrap();
        let last_row = rect
            .last_row
            .unwrap_or_else(|| grid.len().saturating_sub(1));
        for r in rect.first_row..=last_row {
            if let Some(cells) = grid.get_mut(r) {
                for c in rect.first_col..=rect.last_col {
                    if let Some(cell) = cells.get_mut(c) {
                        cell.clear();
                    }
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl SpreadsheetMetadata for MemoryRowStore {
    async fn spreadsheet_info(&self) -> SheetsResult<SpreadsheetInfo> {
        self.check("metadata", "")?;
        Ok(SpreadsheetInfo {
            title: "Test Spreadsheet".to_string(),
            sheet_titles: self.sheet_titles.clone(),
        })
    }
}

/// Key file with a real 2048-bit RSA key, trading tokens at `token_uri`
pub fn signing_key(token_uri: &str) -> ServiceAccountKey {
    ServiceAccountKey {
        client_email: "todo-bot@project.iam.gserviceaccount.com".to_string(),
        private_key: include_str!("testdata/service_account_key.pem").to_string(),
        token_uri: token_uri.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_range() {
        assert_eq!(
            parse_range("Todos!A2:D"),
            Rect {
                first_row: 1,
                last_row: None,
                first_col: 0,
                last_col: 3
            }
        );
        assert_eq!(
            parse_range("Todos!C5"),
            Rect {
                first_row: 4,
                last_row: Some(4),
                first_col: 2,
                last_col: 2
            }
        );
    }

    #[tokio::test]
    async fn test_cleared_middle_row_reads_as_empty() {
        let store = MemoryRowStore::new();
        store.set_row(2, &["1", "a", "false", "7"]);
        store.set_row(3, &["2", "b", "false", "7"]);
        store.set_row(4, &["3", "c", "false", "7"]);

        store.clear_range("Todos!A3:D3").await.unwrap();
        let rows = store.read_range("Todos!A2:D").await.unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows[1].is_empty());

        store.clear_range("Todos!A4:D4").await.unwrap();
        let rows = store.read_range("Todos!A2:D").await.unwrap();
        assert_eq!(rows.len(), 1, "trailing blank rows are dropped");
    }

    #[tokio::test]
    async fn test_append_after_last_populated_row() {
        let store = MemoryRowStore::new();
        store.set_row(1, &["ID", "Text", "Completed", "UserID"]);
        store
            .append_row("Todos!A2", vec!["1".into(), "x".into()])
            .await
            .unwrap();
        assert_eq!(store.row(2), vec!["1", "x"]);

        store.clear_range("Todos!A2:D2").await.unwrap();
        store
            .append_row("Todos!A2", vec!["2".into(), "y".into()])
            .await
            .unwrap();
        assert_eq!(store.row(2), vec!["2", "y"]);
    }
}
