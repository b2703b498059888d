//! Outcome publication
//!
//! The core emits semantic `Outcome`s to an `OutcomeSink`. Formatting and
//! delivery (templates, audiences) live behind the sink.

pub mod messages;
pub mod outcome;

pub use messages::MessageCatalog;
pub use outcome::{
    Audience, ChannelSink, MessageRouter, Notifier, Outcome, OutcomeSink, COMMAND_PERMISSION,
    MESSAGE_PERMISSION,
};
