//! Outbound notification channel for dashboard/UI consumers.
//!
//! Fire-and-forget broadcast: the engine publishes without caring whether
//! anyone is listening, and a slow subscriber only loses its own backlog.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::models::{NewToken, Position};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionAction {
    Buy,
    MetadataUpdate,
    PriceUpdate,
    Sell,
}

/// Messages broadcast to subscribers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Notification {
    /// A token passed the filters
    NewToken {
        token: NewToken,
        timestamp: DateTime<Utc>,
    },

    /// A tracked position changed
    PositionUpdate {
        action: PositionAction,
        position: Position,
        timestamp: DateTime<Utc>,
    },

    /// A trade was executed
    Transaction {
        mint: String,
        action: String, // "buy" or "sell"
        sol_amount: f64,
        signature: String,
        timestamp: DateTime<Utc>,
    },

    /// Non-fatal error surfaced to the UI
    Error {
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// Historical backfill progress
    LoadingStatus {
        message: String,
        processed: usize,
        total: usize,
        done: bool,
        timestamp: DateTime<Utc>,
    },
}

#[derive(Clone)]
pub struct NotificationSink {
    tx: broadcast::Sender<Notification>,
}

impl NotificationSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }

    /// Publish without blocking. With no subscribers the message is dropped.
    pub fn publish(&self, notification: Notification) {
        let _ = self.tx.send(notification);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.publish(Notification::Error {
            message: message.into(),
            timestamp: Utc::now(),
        });
    }
}

impl Default for NotificationSink {
    fn default() -> Self {
        Self::new(256)
    }
}
