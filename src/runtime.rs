//! Update loop
//!
//! Long-polls the transport and feeds each update through the dispatcher,
//! strictly one at a time. A failing update is logged and skipped; a
//! failing poll is retried after a short pause.

#[cfg(test)]
pub mod testing;

use crate::bot::{Dispatcher, Event, Response};
use crate::session::SessionStore;
use crate::store::TodoStore;
use crate::telegram::{
    CallbackQuery, ChatTransport, Message, TelegramResult, Update, LONG_POLL_TIMEOUT_SECS,
};
use crate::ui::Action;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const POLL_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Where the responses to one update go
struct Origin<'a> {
    chat_id: i64,
    /// Message carrying the pressed button, if any
    message_id: Option<i64>,
    callback_id: Option<&'a str>,
}

pub struct BotRuntime<T: ChatTransport, S: TodoStore, P: SessionStore> {
    transport: T,
    dispatcher: Dispatcher<S, P>,
    retry_delay: Duration,
}

impl<T: ChatTransport, S: TodoStore, P: SessionStore> BotRuntime<T, S, P> {
    pub fn new(transport: T, dispatcher: Dispatcher<S, P>) -> Self {
        Self {
            transport,
            dispatcher,
            retry_delay: POLL_RETRY_DELAY,
        }
    }

    #[cfg(test)]
    fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Poll until `cancel` fires
    pub async fn run(&self, cancel: CancellationToken) {
        let mut offset = 0i64;
        tracing::info!("Polling for updates");

        loop {
            let polled = tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                polled = self.transport.get_updates(offset, LONG_POLL_TIMEOUT_SECS) => polled,
            };

            match polled {
                Ok(updates) => {
                    for update in updates {
                        offset = offset.max(update.update_id.saturating_add(1));
                        let update_id = update.update_id;
                        if let Err(e) = self.handle_update(update).await {
                            tracing::error!(update_id, error = %e, "Failed to handle update");
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "getUpdates failed, retrying");
                    tokio::select! {
                        biased;
                        () = cancel.cancelled() => break,
                        () = tokio::time::sleep(self.retry_delay) => {}
                    }
                }
            }
        }

        tracing::info!("Stopped polling");
    }

    pub async fn handle_update(&self, update: Update) -> TelegramResult<()> {
        if let Some(query) = update.callback_query {
            return self.handle_callback(query).await;
        }
        if let Some(message) = update.message {
            return self.handle_message(message).await;
        }
        tracing::debug!(update_id = update.update_id, "Ignoring update kind");
        Ok(())
    }

    async fn handle_message(&self, message: Message) -> TelegramResult<()> {
        let Some(text) = message.text.as_deref() else {
            tracing::debug!(chat_id = message.chat.id, "Ignoring message without text");
            return Ok(());
        };
        let owner = message.from.as_ref().map_or(message.chat.id, |u| u.id);

        let responses = self
            .dispatcher
            .dispatch(owner, Event::from_message_text(text))
            .await;

        let origin = Origin {
            chat_id: message.chat.id,
            message_id: None,
            callback_id: None,
        };
        self.deliver(&origin, responses).await
    }

    async fn handle_callback(&self, query: CallbackQuery) -> TelegramResult<()> {
        let Some(action) = query.data.as_deref().and_then(Action::from_callback_data) else {
            tracing::debug!(data = ?query.data, "Ignoring unknown callback data");
            return self.transport.answer_callback(&query.id, None).await;
        };

        let responses = self
            .dispatcher
            .dispatch(query.from.id, Event::Button { action })
            .await;

        // Private chats share the user's id
        let origin = Origin {
            chat_id: query.message.as_ref().map_or(query.from.id, |m| m.chat.id),
            message_id: query.message.as_ref().map(|m| m.message_id),
            callback_id: Some(&query.id),
        };
        self.deliver(&origin, responses).await
    }

    async fn deliver(&self, origin: &Origin<'_>, responses: Vec<Response>) -> TelegramResult<()> {
        for response in responses {
            match response {
                Response::Reply(view) => {
                    self.transport.send_message(origin.chat_id, &view).await?;
                }
                Response::Edit(view) => {
                    let Some(message_id) = origin.message_id else {
                        self.transport.send_message(origin.chat_id, &view).await?;
                        continue;
                    };
                    if let Err(e) = self
                        .transport
                        .edit_message(origin.chat_id, message_id, &view)
                        .await
                    {
                        tracing::warn!(message_id, error = %e, "Edit failed, sending instead");
                        self.transport.send_message(origin.chat_id, &view).await?;
                    }
                }
                Response::Acknowledge { text } => {
                    let Some(callback_id) = origin.callback_id else {
                        continue;
                    };
                    // Stale queries can no longer be answered; not worth aborting over
                    if let Err(e) = self
                        .transport
                        .answer_callback(callback_id, text.as_deref())
                        .await
                    {
                        tracing::warn!(error = %e, "Failed to answer callback query");
                    }
                }
            }
        }
        Ok(())
    }
}
