//! Mock transport for testing
//!
//! Serves queued update batches and records everything the runtime sends.

use crate::telegram::{ChatTransport, TelegramError, TelegramResult, Update};
use crate::ui::View;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// One outbound call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Message {
        chat_id: i64,
        view: View,
    },
    Edit {
        chat_id: i64,
        message_id: i64,
        view: View,
    },
    Answer {
        callback_id: String,
        text: Option<String>,
    },
}

/// Mock transport with queued polls and a record of outbound calls
#[allow(dead_code)]
pub struct MockTransport {
    polls: Mutex<VecDeque<TelegramResult<Vec<Update>>>>,
    /// Cancelled once every queued poll has been served
    drained: CancellationToken,
    fail_edits: Mutex<bool>,
    /// Offsets passed to `get_updates`
    pub offsets: Mutex<Vec<i64>>,
    pub sent: Mutex<Vec<Sent>>,
}

#[allow(dead_code)]
impl MockTransport {
    pub fn new(drained: CancellationToken) -> Self {
        Self {
            polls: Mutex::new(VecDeque::new()),
            drained,
            fail_edits: Mutex::new(false),
            offsets: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Queue one `getUpdates` result built from raw update JSON
    pub fn queue_updates(&self, updates: serde_json::Value) {
        let updates: Vec<Update> = serde_json::from_value(updates).unwrap();
        self.polls.lock().unwrap().push_back(Ok(updates));
    }

    pub fn queue_error(&self, error: TelegramError) {
        self.polls.lock().unwrap().push_back(Err(error));
    }

    /// Make every edit fail as if the message no longer exists
    pub fn fail_edits(&self) {
        *self.fail_edits.lock().unwrap() = true;
    }

    pub fn recorded(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn recorded_offsets(&self) -> Vec<i64> {
        self.offsets.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatTransport for MockTransport {
    async fn get_updates(&self, offset: i64, _timeout_secs: u64) -> TelegramResult<Vec<Update>> {
        self.offsets.lock().unwrap().push(offset);
        let next = self.polls.lock().unwrap().pop_front();
        match next {
            Some(result) => result,
            None => {
                self.drained.cancel();
                Ok(Vec::new())
            }
        }
    }

    async fn send_message(&self, chat_id: i64, view: &View) -> TelegramResult<()> {
        self.sent.lock().unwrap().push(Sent::Message {
            chat_id,
            view: view.clone(),
        });
        Ok(())
    }

    async fn edit_message(
        &self,
        chat_id: i64,
        message_id: i64,
        view: &View,
    ) -> TelegramResult<()> {
        if *self.fail_edits.lock().unwrap() {
            return Err(TelegramError::Api {
                method: "editMessageText",
                description: "Bad Request: message to edit not found".to_string(),
            });
        }
        self.sent.lock().unwrap().push(Sent::Edit {
            chat_id,
            message_id,
            view: view.clone(),
        });
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> TelegramResult<()> {
        self.sent.lock().unwrap().push(Sent::Answer {
            callback_id: callback_id.to_string(),
            text: text.map(ToString::to_string),
        });
        Ok(())
    }
}
