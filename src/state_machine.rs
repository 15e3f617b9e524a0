//! Conversation state machine
//!
//! Inputs (user actions and stream events) are applied to an explicitly
//! owned [`ChatState`]; each transition returns the [`Effect`]s the session
//! must carry out. The state machine itself performs no I/O.

mod conversation;
mod effect;
mod input;
mod state;
mod transition;

#[cfg(test)]
mod proptests;

pub use conversation::{Conversation, Message, MessageStatus};
pub use effect::Effect;
pub use input::Input;
pub use state::{ChatState, Generation, SessionStatus};
pub use transition::{Rejection, SessionError};
