//! Semantic outcomes and where they go

use serde::Serialize;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::mpsc;

use crate::notify::messages::MessageCatalog;

/// Permission required to receive broadcast outcomes
pub const MESSAGE_PERMISSION: &str = "clearlag.message";

/// Permission required to run the clearlag command
pub const COMMAND_PERMISSION: &str = "clearlag.command";

/// What happened, without any formatting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    /// A scheduled reduction pass is about to run
    CleanupImminent,
    ThresholdExceeded { count: usize, limit: usize },
    CleanupDone { removed: usize, manual: bool },
    /// A pass that could not complete. Entities already removed stay removed.
    CleanupFailed { removed: usize, manual: bool },
}

impl Outcome {
    pub fn is_manual(&self) -> bool {
        matches!(
            self,
            Outcome::CleanupDone { manual: true, .. } | Outcome::CleanupFailed { manual: true, .. }
        )
    }

    pub fn audience(&self) -> Audience {
        if self.is_manual() {
            Audience::Invoker
        } else {
            Audience::Permission(MESSAGE_PERMISSION.to_string())
        }
    }
}

/// Who should receive a formatted outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Audience {
    /// Everyone holding the permission
    Permission(String),
    /// Only whoever invoked the command
    Invoker,
}

/// Receives semantic outcomes from the core
pub trait OutcomeSink: Send + Sync {
    fn publish(&self, outcome: Outcome);

    /// Called after a configuration reload with the new templates
    fn messages_reloaded(&self, _messages: &MessageCatalog) {}
}

/// Delivers formatted text to recipients
pub trait Notifier: Send + Sync {
    fn deliver(&self, message: &str, audience: &Audience);
}

/// Formats outcomes with a message catalog and hands them to a notifier
pub struct MessageRouter<N> {
    messages: RwLock<Arc<MessageCatalog>>,
    notifier: N,
}

impl<N: Notifier> MessageRouter<N> {
    pub fn new(messages: MessageCatalog, notifier: N) -> Self {
        Self {
            messages: RwLock::new(Arc::new(messages)),
            notifier,
        }
    }

    pub fn messages(&self) -> Arc<MessageCatalog> {
        self.messages
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }
}

impl<N: Notifier> OutcomeSink for MessageRouter<N> {
    fn publish(&self, outcome: Outcome) {
        let text = self.messages().render_outcome(&outcome);
        self.notifier.deliver(&text, &outcome.audience());
    }

    fn messages_reloaded(&self, messages: &MessageCatalog) {
        *self.messages.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(messages.clone());
    }
}

/// Forwards outcomes onto an unbounded channel
#[derive(Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Outcome>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Outcome>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl OutcomeSink for ChannelSink {
    fn publish(&self, outcome: Outcome) {
        if self.tx.send(outcome).is_err() {
            tracing::debug!(?outcome, "Outcome receiver dropped");
        }
    }
}

impl<S: OutcomeSink + ?Sized> OutcomeSink for Arc<S> {
    fn publish(&self, outcome: Outcome) {
        (**self).publish(outcome)
    }

    fn messages_reloaded(&self, messages: &MessageCatalog) {
        (**self).messages_reloaded(messages)
    }
}
