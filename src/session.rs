//! Per-user pending action
//!
//! Process-local and never persisted: a restart drops every user back to idle.

use crate::bot::PendingAction;
use crate::store::OwnerId;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// Storage for each user's pending action
pub trait SessionStore: Send + Sync {
    /// Current pending action, `Idle` for users never seen before
    fn get(&self, owner: OwnerId) -> PendingAction;

    fn set(&self, owner: OwnerId, action: PendingAction);
}

/// In-memory session map
#[derive(Debug, Default)]
pub struct InMemorySessions {
    sessions: Mutex<HashMap<OwnerId, PendingAction>>,
}

impl InMemorySessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of users with a non-idle session
    #[allow(dead_code)] // Used in tests
    pub fn pending_count(&self) -> usize {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl SessionStore for InMemorySessions {
    fn get(&self, owner: OwnerId) -> PendingAction {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&owner)
            .copied()
            .unwrap_or_default()
    }

    fn set(&self, owner: OwnerId, action: PendingAction) {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        if action.is_idle() {
            sessions.remove(&owner);
        } else {
            sessions.insert(owner, action);
        }
    }
}
