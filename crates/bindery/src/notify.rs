//! Terminal notifications for background ingestion runs.
//!
//! The sink is fire-and-forget: the core enqueues exactly one terminal
//! notification per run and never waits for acknowledgment. Delivery to
//! the publisher (push, e-mail, whatever the outer service wires up) is
//! a subscriber concern.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Success,
    Failure,
}

/// Terminal outcome of one ingestion run.
///
/// `PartiallyFailed` still notifies as success: per-episode failures are
/// folded into the counts rather than surfaced individually. The run
/// ledger keeps the detailed record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    Done,
    PartiallyFailed,
    TimedOut,
    Failed,
}

impl RunOutcome {
    pub fn notification_kind(&self) -> NotificationKind {
        match self {
            RunOutcome::Done | RunOutcome::PartiallyFailed => NotificationKind::Success,
            RunOutcome::TimedOut | RunOutcome::Failed => NotificationKind::Failure,
        }
    }
}

impl std::fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunOutcome::Done => write!(f, "done"),
            RunOutcome::PartiallyFailed => write!(f, "partially_failed"),
            RunOutcome::TimedOut => write!(f, "timed_out"),
            RunOutcome::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub kind: NotificationKind,
    /// Publisher the notification is addressed to.
    pub recipient: String,
    pub comic_id: String,
    pub outcome: RunOutcome,
    pub episodes_total: usize,
    pub episodes_completed: usize,
    pub episodes_failed: usize,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Notification {
    /// Creates the terminal notification for a run; the kind follows the
    /// outcome.
    pub fn terminal(
        recipient: &str,
        comic_id: &str,
        outcome: RunOutcome,
        episodes_total: usize,
        episodes_completed: usize,
        episodes_failed: usize,
        error: Option<String>,
    ) -> Self {
        Self {
            kind: outcome.notification_kind(),
            recipient: recipient.to_string(),
            comic_id: comic_id.to_string(),
            outcome,
            episodes_total,
            episodes_completed,
            episodes_failed,
            timestamp: Utc::now(),
            error,
        }
    }
}

/// Cloneable handle over a broadcast channel of notifications.
#[derive(Clone)]
pub struct NotificationSink {
    sender: broadcast::Sender<Notification>,
}

impl NotificationSink {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    /// Enqueues a notification. Having no subscribers is not an error.
    pub fn enqueue(&self, notification: Notification) {
        if self.sender.send(notification).is_err() {
            log::debug!("Notification dropped: no subscribers");
        }
    }
}

impl Default for NotificationSink {
    fn default() -> Self {
        Self::new(64)
    }
}
