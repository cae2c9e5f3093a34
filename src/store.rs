//! Todo persistence
//!
//! `TodoStore` is the domain-facing contract the dispatcher talks to.
//! `SheetTodoStore` implements it on top of any `RowStore`, translating
//! each operation into range reads/writes/clears against the `Todos` sheet.

mod sheet;


pub use sheet::SheetTodoStore;

use crate::sheets::SheetsError;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Opaque identifier of the chat participant that owns records and sessions
pub type OwnerId = i64;

/// A persisted task entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Todo {
    pub id: i64,
    pub text: String,
    pub completed: bool,
    pub owner_id: OwnerId,
}

impl Todo {
    /// A freshly created, not yet completed todo
    pub fn new(id: i64, text: impl Into<String>, owner_id: OwnerId) -> Self {
        Self {
            id,
            text: text.into(),
            completed: false,
            owner_id,
        }
    }
}

/// Which adapter operation failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    List,
    NextId,
    Add,
    SetCompleted,
    Remove,
}

impl fmt::Display for StoreOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StoreOp::List => "list todos",
            StoreOp::NextId => "get next id",
            StoreOp::Add => "add todo",
            StoreOp::SetCompleted => "update todo status",
            StoreOp::Remove => "delete todo",
        };
        f.write_str(name)
    }
}

/// Row store failure, or sheet contents the adapter cannot work with
#[derive(Debug, Error)]
#[error("Failed to {op} ({context}): {source}")]
pub struct StoreError {
    pub op: StoreOp,
    /// Ids and owner involved, for logs
    pub context: String,
    #[source]
    pub source: SheetsError,
}

impl StoreError {
    pub fn new(op: StoreOp, context: impl Into<String>, source: SheetsError) -> Self {
        Self {
            op,
            context: context.into(),
            source,
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Record store keyed by owner
///
/// Lookups for mutation always match on the `(id, owner)` pair so one user
/// can never touch another user's rows, even with a guessed id.
#[async_trait]
pub trait TodoStore: Send + Sync {
    /// All todos belonging to `owner`, in store order
    async fn list_by_owner(&self, owner: OwnerId) -> StoreResult<Vec<Todo>>;

    /// One past the largest id across all owners, or 1 for an empty store.
    /// Errors when the largest id has no successor.
    ///
    /// Best-effort: two writers calling this concurrently may get the same id.
    async fn next_id(&self) -> StoreResult<i64>;

    /// Append a todo; the caller is responsible for id freshness
    async fn add(&self, todo: &Todo) -> StoreResult<()>;

    /// Overwrite the completed flag; `Ok(false)` when no row matches
    async fn set_completed(&self, id: i64, owner: OwnerId, completed: bool) -> StoreResult<bool>;

    /// Blank out the matching row; `Ok(false)` when no row matches
    async fn remove(&self, id: i64, owner: OwnerId) -> StoreResult<bool>;
}

#[async_trait]
impl<T: TodoStore + ?Sized> TodoStore for Arc<T> {
    async fn list_by_owner(&self, owner: OwnerId) -> StoreResult<Vec<Todo>> {
        (**self).list_by_owner(owner).await
    }

    async fn next_id(&self) -> StoreResult<i64> {
        (**self).next_id().await
    }

    async fn add(&self, todo: &Todo) -> StoreResult<()> {
        (**self).add(todo).await
    }

    async fn set_completed(&self, id: i64, owner: OwnerId, completed: bool) -> StoreResult<bool> {
        (**self).set_completed(id, owner, completed).await
    }

    async fn remove(&self, id: i64, owner: OwnerId) -> StoreResult<bool> {
        (**self).remove(id, owner).await
    }
}
