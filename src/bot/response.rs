//! Responses produced by the dispatcher

use crate::ui::View;

/// How a view reaches the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// New message in the chat
    Reply,
    /// Replace the message whose button was pressed
    Edit,
}

/// Output to be carried out by the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Reply(View),
    Edit(View),
    /// Answer the callback query of a button press, optionally with a toast
    Acknowledge { text: Option<String> },
}

impl Response {
    pub fn deliver(delivery: Delivery, view: View) -> Self {
        match delivery {
            Delivery::Reply => Response::Reply(view),
            Delivery::Edit => Response::Edit(view),
        }
    }

    #[allow(dead_code)] // Used in tests
    pub fn view(&self) -> Option<&View> {
        match self {
            Response::Reply(view) | Response::Edit(view) => Some(view),
            Response::Acknowledge { .. } => None,
        }
    }
}
