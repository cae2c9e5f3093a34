//! Inbound events

use crate::ui::Action;

/// Something a user did that the bot must react to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// `/name` message; `name` has the slash and any `@botname` suffix removed
    Command { name: String },
    /// Inline keyboard button press
    Button { action: Action },
    /// Any other text message
    Text { text: String },
}

impl Event {
    /// Classify a message's text as a command or free text
    pub fn from_message_text(text: &str) -> Self {
        let trimmed = text.trim_start();
        match trimmed.strip_prefix('/') {
            Some(rest) => {
                let word = rest.split_whitespace().next().unwrap_or_default();
                let name = word.split('@').next().unwrap_or_default();
                Event::Command {
                    name: name.to_string(),
                }
            }
            None => Event::Text {
                text: text.to_string(),
            },
        }
    }

    #[allow(dead_code)] // Used in tests
    pub fn command(name: &str) -> Self {
        Event::Command {
            name: name.to_string(),
        }
    }

    #[allow(dead_code)] // Used in tests
    pub fn text(text: &str) -> Self {
        Event::Text {
            text: text.to_string(),
        }
    }

    pub fn is_button(&self) -> bool {
        matches!(self, Event::Button { .. })
    }
}
