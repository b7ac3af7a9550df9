//! Broadcast subscriber registry

use std::collections::HashSet;
use std::sync::{PoisonError, RwLock};

use crate::channels::RecipientId;

/// Result of a subscribe request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscribeOutcome {
    NewlySubscribed,
    AlreadySubscribed,
}

/// Result of an unsubscribe request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsubscribeOutcome {
    WasSubscribed,
    NotSubscribed,
}

/// Set of recipients receiving scheduled quizzes
///
/// Shared between command handlers and the scheduler. [`list`](Self::list)
/// returns a copy, so callers can iterate while others mutate.
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    subscribers: RwLock<HashSet<RecipientId>>,
}

impl SubscriptionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, recipient: RecipientId) -> SubscribeOutcome {
        let inserted = self
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(recipient);

        if inserted {
            tracing::info!(recipient, "subscribed to quizzes");
            SubscribeOutcome::NewlySubscribed
        } else {
            SubscribeOutcome::AlreadySubscribed
        }
    }

    pub fn unsubscribe(&self, recipient: RecipientId) -> UnsubscribeOutcome {
        let removed = self
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&recipient);

        if removed {
            tracing::info!(recipient, "unsubscribed from quizzes");
            UnsubscribeOutcome::WasSubscribed
        } else {
            UnsubscribeOutcome::NotSubscribed
        }
    }

    /// Snapshot of current subscribers
    #[must_use]
    pub fn list(&self) -> HashSet<RecipientId> {
        self.subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn contains(&self, recipient: RecipientId) -> bool {
        self.subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&recipient)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
