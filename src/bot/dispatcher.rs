//! Effectful half of the state machine
//!
//! Reads the user's pending action, runs the pure transition, stores the
//! next pending action and then carries out the step against the todo
//! store. Store failures never escape: the user gets an apology and the
//! session is reset.

use super::transition::{transition, Step};
use super::{Delivery, Event, PendingAction, PickKind, Response};
use crate::session::SessionStore;
use crate::store::{OwnerId, StoreResult, Todo, TodoStore};
use crate::ui::{self, ListMode};

/// Routes events to handlers based on each user's pending action
pub struct Dispatcher<S: TodoStore, P: SessionStore> {
    store: S,
    sessions: P,
}

impl<S: TodoStore, P: SessionStore> Dispatcher<S, P> {
    pub fn new(store: S, sessions: P) -> Self {
        Self { store, sessions }
    }

    #[allow(dead_code)] // Used in tests
    pub fn sessions(&self) -> &P {
        &self.sessions
    }

    /// Handle one event for `owner` and return what to send back
    pub async fn dispatch(&self, owner: OwnerId, event: Event) -> Vec<Response> {
        let pending = self.sessions.get(owner);
        let result = transition(pending, &event);

        tracing::debug!(
            owner,
            from = ?pending,
            to = ?result.next,
            step = ?result.step,
            "Transition"
        );
        self.sessions.set(owner, result.next);

        let mut responses = match self.execute(owner, result.step).await {
            Ok(responses) => responses,
            Err(e) => {
                tracing::error!(owner, error = %e, "Todo store operation failed");
                self.sessions.set(owner, PendingAction::Idle);
                vec![Response::Reply(ui::store_failure())]
            }
        };

        // Every button press is answered exactly once
        let acknowledged = responses
            .iter()
            .any(|r| matches!(r, Response::Acknowledge { .. }));
        if event.is_button() && !acknowledged {
            responses.insert(0, Response::Acknowledge { text: None });
        }
        responses
    }

    async fn execute(&self, owner: OwnerId, step: Step) -> StoreResult<Vec<Response>> {
        let responses = match step {
            Step::Welcome => vec![Response::Reply(ui::welcome())],

            Step::ShowList { delivery } => {
                let todos = self.store.list_by_owner(owner).await?;
                vec![Response::deliver(
                    delivery,
                    ui::render_list(&todos, ListMode::Browse),
                )]
            }

            Step::PromptAdd => vec![Response::Edit(ui::add_prompt())],
            Step::RepromptAdd => vec![Response::Reply(ui::add_prompt())],

            Step::BeginPick(kind) => self.begin_pick(owner, kind).await?,

            Step::AddTodo { text } => {
                let id = self.store.next_id().await?;
                let todo = Todo::new(id, text, owner);
                self.store.add(&todo).await?;
                tracing::info!(owner, id, "Added todo");
                vec![Response::Reply(ui::added(&todo.text))]
            }

            Step::ApplyPick { kind, id } => {
                vec![Response::Reply(self.apply_pick(owner, kind, id).await?)]
            }

            Step::InvalidNumber => vec![Response::Reply(ui::invalid_number())],
            Step::CommandHint => vec![Response::Reply(ui::command_hint())],
            Step::TextHint => vec![Response::Reply(ui::text_hint())],
            Step::Ignore => Vec::new(),
        };
        Ok(responses)
    }

    /// Show the list in pick mode, or bounce back to the list if it is empty
    async fn begin_pick(&self, owner: OwnerId, kind: PickKind) -> StoreResult<Vec<Response>> {
        let todos = self.store.list_by_owner(owner).await?;
        if todos.is_empty() {
            return Ok(vec![
                Response::Acknowledge {
                    text: Some(ui::nothing_to(kind)),
                },
                Response::deliver(Delivery::Edit, ui::render_list(&todos, ListMode::Browse)),
            ]);
        }

        self.sessions.set(owner, kind.awaiting());
        Ok(vec![Response::Edit(ui::render_list(
            &todos,
            ListMode::Pick(kind),
        ))])
    }

    async fn apply_pick(&self, owner: OwnerId, kind: PickKind, id: i64) -> StoreResult<ui::View> {
        let todos = self.store.list_by_owner(owner).await?;
        let Some(todo) = todos.into_iter().find(|t| t.id == id) else {
            tracing::debug!(owner, id, "Picked todo not found");
            return Ok(ui::not_found(id));
        };

        match kind {
            PickKind::Complete => {
                let completed = !todo.completed;
                if !self.store.set_completed(id, owner, completed).await? {
                    return Ok(ui::not_found(id));
                }
                tracing::info!(owner, id, completed, "Toggled todo");
                Ok(ui::toggled(id, completed))
            }
            PickKind::Delete => {
                if !self.store.remove(id, owner).await? {
                    return Ok(ui::not_found(id));
                }
                tracing::info!(owner, id, "Deleted todo");
                Ok(ui::deleted(&todo.text))
            }
        }
    }
}
