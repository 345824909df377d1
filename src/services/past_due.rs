use sqlx::SqlitePool;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::db::repository;
use crate::error::AppError;

/// Raised by a read that observed a NOT_DONE item whose due date has elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PastDueEvent {
    pub todo_id: i64,
}

/// Sending half of the past-due channel. Publishing never blocks the reader.
#[derive(Clone)]
pub struct PastDuePublisher {
    tx: mpsc::UnboundedSender<PastDueEvent>,
}

impl PastDuePublisher {
    pub fn publish(&self, todo_id: i64) {
        debug!(todo_id, "publishing past-due event");
        if self.tx.send(PastDueEvent { todo_id }).is_err() {
            warn!(todo_id, "past-due listener is gone, event dropped");
        }
    }
}

/// Persists past-due transitions reported by the read path, one transaction
/// per event. Failures are logged and the item is picked up again by the next
/// read that finds it stale.
pub struct PastDueListener {
    db: SqlitePool,
    rx: mpsc::UnboundedReceiver<PastDueEvent>,
}

pub fn channel(db: SqlitePool) -> (PastDuePublisher, PastDueListener) {
    let (tx, rx) = mpsc::unbounded_channel();
    (PastDuePublisher { tx }, PastDueListener { db, rx })
}

impl PastDueListener {
    /// Runs until every publisher has been dropped.
    pub async fn start(mut self) {
        info!("Starting past-due listener");

        while let Some(event) = self.rx.recv().await {
            match self.handle(event).await {
                Ok(true) => info!(todo_id = event.todo_id, "todo item updated with status PAST_DUE"),
                Ok(false) => debug!(todo_id = event.todo_id, "past-due event had nothing to update"),
                Err(e) => warn!(todo_id = event.todo_id, "past-due update failed: {:?}", e),
            }
        }

        info!("Past-due listener stopped");
    }

    async fn handle(&self, event: PastDueEvent) -> Result<bool, AppError> {
        debug!(todo_id = event.todo_id, "past-due event received");
        let mut tx = self.db.begin().await?;
        let updated = repository::mark_past_due(&mut *tx, event.todo_id).await?;
        tx.commit().await?;
        Ok(updated)
    }
}
