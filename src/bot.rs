//! Conversation state machine
//!
//! A pure transition function decides what an inbound event means given the
//! user's pending action; the dispatcher carries that decision out against
//! the todo store and produces the responses to send.

mod dispatcher;
mod event;
mod response;
mod state;
mod transition;


pub use dispatcher::Dispatcher;
pub use event::Event;
pub use response::{Delivery, Response};
pub use state::{PendingAction, PickKind};
