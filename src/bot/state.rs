//! Session state types

/// The single follow-up a user owes the bot, if any
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PendingAction {
    /// Nothing pending; free text gets the "use the buttons" hint
    #[default]
    Idle,
    /// Next message is the text of a new todo
    AwaitingAddText,
    /// Next message is the id of a todo to toggle
    AwaitingCompleteId,
    /// Next message is the id of a todo to delete
    AwaitingDeleteId,
}

impl PendingAction {
    pub fn is_idle(self) -> bool {
        self == PendingAction::Idle
    }
}

/// The two flows that ask the user to pick a todo by id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PickKind {
    Complete,
    Delete,
}

impl PickKind {
    /// Pending action that waits for this kind of pick
    pub fn awaiting(self) -> PendingAction {
        match self {
            PickKind::Complete => PendingAction::AwaitingCompleteId,
            PickKind::Delete => PendingAction::AwaitingDeleteId,
        }
    }

    /// Inverse of `awaiting`
    pub fn from_pending(pending: PendingAction) -> Option<Self> {
        match pending {
            PendingAction::AwaitingCompleteId => Some(PickKind::Complete),
            PendingAction::AwaitingDeleteId => Some(PickKind::Delete),
            PendingAction::Idle | PendingAction::AwaitingAddText => None,
        }
    }
}
