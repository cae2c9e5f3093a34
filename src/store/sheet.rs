//! `TodoStore` over a row store
//!
//! Column layout: A = id, B = text, C = completed (`"true"`/`"false"`),
//! D = owner id. Row 1 is the header; data starts at row 2. Deleted todos
//! leave blank rows behind, which are skipped on read.

use super::{OwnerId, StoreError, StoreOp, StoreResult, Todo, TodoStore};
use crate::sheets::{A1Range, RowStore, SheetsError};
use async_trait::async_trait;

const COL_ID: usize = 0;
const COL_TEXT: usize = 1;
const COL_COMPLETED: usize = 2;
const COL_OWNER: usize = 3;

/// Sheet row number of the first data row
const FIRST_DATA_ROW: usize = 2;

/// Parse one data row; `None` for blank or malformed rows
fn parse_row(row: &[String]) -> Option<Todo> {
    let cell = |i: usize| row.get(i).map_or("", |c| c.trim());
    let id = cell(COL_ID).parse::<i64>().ok()?;
    let owner_id = cell(COL_OWNER).parse::<OwnerId>().ok()?;
    Some(Todo {
        id,
        text: row.get(COL_TEXT).cloned().unwrap_or_default(),
        completed: cell(COL_COMPLETED) == "true",
        owner_id,
    })
}

fn encode_row(todo: &Todo) -> Vec<String> {
    vec![
        todo.id.to_string(),
        todo.text.clone(),
        todo.completed.to_string(),
        todo.owner_id.to_string(),
    ]
}

/// Todo adapter bound to one sheet of a `RowStore`
pub struct SheetTodoStore<R: RowStore> {
    rows: R,
    range: A1Range,
}

impl<R: RowStore> SheetTodoStore<R> {
    pub fn new(rows: R, range: A1Range) -> Self {
        Self { rows, range }
    }

    #[allow(dead_code)] // Used in tests
    pub fn rows(&self) -> &R {
        &self.rows
    }

    /// All data rows, paired with their sheet row numbers
    async fn read_all(&self) -> Result<Vec<(usize, Todo)>, SheetsError> {
        let data = self
            .rows
            .read_range(&self.range.columns_from('A', FIRST_DATA_ROW, 'D'))
            .await?;
        Ok(data
            .iter()
            .enumerate()
            .filter_map(|(i, row)| parse_row(row).map(|todo| (i + FIRST_DATA_ROW, todo)))
            .collect())
    }

    /// Sheet row number of the todo matching both `id` and `owner`
    async fn find_row(&self, id: i64, owner: OwnerId) -> Result<Option<usize>, SheetsError> {
        Ok(self
            .read_all()
            .await?
            .into_iter()
            .find(|(_, todo)| todo.id == id && todo.owner_id == owner)
            .map(|(row, _)| row))
    }
}

#[async_trait]
impl<R: RowStore> TodoStore for SheetTodoStore<R> {
    async fn list_by_owner(&self, owner: OwnerId) -> StoreResult<Vec<Todo>> {
        let all = self
            .read_all()
            .await
            .map_err(|e| StoreError::new(StoreOp::List, format!("owner {owner}"), e))?;
        Ok(all
            .into_iter()
            .map(|(_, todo)| todo)
            .filter(|todo| todo.owner_id == owner)
            .collect())
    }

    async fn next_id(&self) -> StoreResult<i64> {
        let ids = self
            .rows
            .read_range(&self.range.columns_from('A', FIRST_DATA_ROW, 'A'))
            .await
            .map_err(|e| StoreError::new(StoreOp::NextId, "all owners", e))?;
        let max = ids
            .iter()
            .filter_map(|row| row.first()?.trim().parse::<i64>().ok())
            .max();
        match max {
            None => Ok(1),
            Some(max) => max.checked_add(1).ok_or_else(|| {
                StoreError::new(
                    StoreOp::NextId,
                    "all owners",
                    SheetsError::Data(format!("id {max} has no successor")),
                )
            }),
        }
    }

    async fn add(&self, todo: &Todo) -> StoreResult<()> {
        self.rows
            .append_row(&self.range.cell('A', FIRST_DATA_ROW), encode_row(todo))
            .await
            .map_err(|e| {
                StoreError::new(
                    StoreOp::Add,
                    format!("todo {} for owner {}", todo.id, todo.owner_id),
                    e,
                )
            })
    }

    async fn set_completed(&self, id: i64, owner: OwnerId, completed: bool) -> StoreResult<bool> {
        let context = || format!("todo {id} for owner {owner}, completed={completed}");

        let Some(row) = self
            .find_row(id, owner)
            .await
            .map_err(|e| StoreError::new(StoreOp::SetCompleted, context(), e))?
        else {
            tracing::debug!(id, owner, "Todo not found for status update");
            return Ok(false);
        };

        self.rows
            .write_range(
                &self.range.cell('C', row),
                vec![vec![completed.to_string()]],
            )
            .await
            .map_err(|e| StoreError::new(StoreOp::SetCompleted, context(), e))?;
        Ok(true)
    }

    async fn remove(&self, id: i64, owner: OwnerId) -> StoreResult<bool> {
        let context = || format!("todo {id} for owner {owner}");

        let Some(row) = self
            .find_row(id, owner)
            .await
            .map_err(|e| StoreError::new(StoreOp::Remove, context(), e))?
        else {
            tracing::debug!(id, owner, "Todo not found for deletion");
            return Ok(false);
        };

        self.rows
            .clear_range(&self.range.cells('A', row, 'D', row))
            .await
            .map_err(|e| StoreError::new(StoreOp::Remove, context(), e))?;
        Ok(true)
    }
}
