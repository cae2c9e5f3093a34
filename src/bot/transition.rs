//! Pure state transition function
//!
//! Maps (pending action, event) to the step to perform and the pending
//! action to store before performing it. No I/O happens here; steps whose
//! outcome depends on store contents are resolved by the dispatcher.

use super::{Delivery, Event, PendingAction, PickKind};
use crate::ui::Action;

/// What the dispatcher should do for an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// `/start`: welcome text and top-level menu
    Welcome,
    /// Fetch and render the user's list
    ShowList { delivery: Delivery },
    /// Ask for the text of a new todo
    PromptAdd,
    /// Follow-up text was blank; ask again
    RepromptAdd,
    /// Show the list for picking; enters the awaiting state only if the
    /// user has todos
    BeginPick(PickKind),
    /// Create a todo from the follow-up text
    AddTodo { text: String },
    /// Toggle or delete the todo the user picked
    ApplyPick { kind: PickKind, id: i64 },
    /// Follow-up was not a number; ask again
    InvalidNumber,
    /// Unsupported command
    CommandHint,
    /// Free text with nothing pending
    TextHint,
    /// Nothing to do
    Ignore,
}

/// Result of a state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// Pending action to store before the step runs
    pub next: PendingAction,
    pub step: Step,
}

impl Transition {
    fn new(next: PendingAction, step: Step) -> Self {
        Self { next, step }
    }
}

/// Pure transition function
///
/// Explicit commands and button presses abandon whatever was pending.
/// Free text is interpreted according to the pending action.
pub fn transition(pending: PendingAction, event: &Event) -> Transition {
    match event {
        Event::Command { name } => match name.as_str() {
            "start" => Transition::new(PendingAction::Idle, Step::Welcome),
            "list" => Transition::new(
                PendingAction::Idle,
                Step::ShowList {
                    delivery: Delivery::Reply,
                },
            ),
            _ => Transition::new(pending, Step::CommandHint),
        },

        Event::Button { action } => match action {
            Action::List => Transition::new(
                PendingAction::Idle,
                Step::ShowList {
                    delivery: Delivery::Edit,
                },
            ),
            Action::Add => Transition::new(PendingAction::AwaitingAddText, Step::PromptAdd),
            Action::Complete => {
                Transition::new(PendingAction::Idle, Step::BeginPick(PickKind::Complete))
            }
            Action::Delete => {
                Transition::new(PendingAction::Idle, Step::BeginPick(PickKind::Delete))
            }
        },

        Event::Text { text } => text_transition(pending, text),
    }
}

fn text_transition(pending: PendingAction, text: &str) -> Transition {
    match pending {
        PendingAction::Idle => Transition::new(PendingAction::Idle, Step::TextHint),

        PendingAction::AwaitingAddText => {
            let text = text.trim();
            if text.is_empty() {
                Transition::new(pending, Step::RepromptAdd)
            } else {
                Transition::new(
                    PendingAction::Idle,
                    Step::AddTodo {
                        text: text.to_string(),
                    },
                )
            }
        }

        PendingAction::AwaitingCompleteId | PendingAction::AwaitingDeleteId => {
            let Some(kind) = PickKind::from_pending(pending) else {
                return Transition::new(pending, Step::Ignore);
            };
            match text.trim().parse::<i64>() {
                // Not-found is decided later but also resets, so reset now
                Ok(id) => Transition::new(PendingAction::Idle, Step::ApplyPick { kind, id }),
                // Keep waiting so the user can retry
                Err(_) => Transition::new(pending, Step::InvalidNumber),
            }
        }
    }
}
