//! Chat messages and the node inbox
//!
//! # Message Flow
//!
//! **Sending:**
//! 1. [`ChatNode::send_message`](crate::ChatNode::send_message) builds a [`ChatMessage`]
//! 2. The message is postcard-encoded and written on one chat stream
//!
//! **Receiving:**
//! 1. The chat protocol handler reads one stream to its end
//! 2. The decoded message is pushed to the [`Inbox`]
//! 3. Clients poll with [`Inbox::drain`] using the last id they saw

mod inbox;
mod message;

pub use inbox::{Inbox, DEFAULT_INBOX_CAPACITY};
pub use message::ChatMessage;
