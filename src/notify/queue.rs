//! Ordered delivery of category change notifications.
//!
//! A single consumer task drains a bounded channel, so events reach the
//! [`Notifier`] in the order they were enqueued, which is the order their
//! changes were committed. Callers never wait on delivery.

use crate::{
    config::EngineConfig,
    domain::CategoryBoardEvent,
    error::{CategoryBoardsError, Result},
    notify::{deliver, Notifier},
};
use std::{sync::Arc, time::Duration};
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};
use tracing::{debug, warn};

enum Message {
    Event(CategoryBoardEvent),
    Flush(oneshot::Sender<()>),
}

pub struct ChangeQueue {
    tx: mpsc::Sender<Message>,
    worker: JoinHandle<()>,
}

impl ChangeQueue {
    /// Starts the consumer task. Must be called from within a tokio runtime.
    pub fn new(notifier: Arc<dyn Notifier>, config: &EngineConfig) -> Self {
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        let worker = tokio::spawn(run(
            rx,
            notifier,
            config.notify_max_attempts.max(1),
            config.notify_retry_delay(),
        ));

        Self { tx, worker }
    }

    /// Hands an event to the consumer without waiting.
    ///
    /// Fails with `QueueFull` when `queue_capacity` events are pending and
    /// with `QueueClosed` when the consumer has stopped.
    pub fn enqueue(&self, event: CategoryBoardEvent) -> Result<()> {
        self.tx.try_send(Message::Event(event)).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => CategoryBoardsError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => CategoryBoardsError::QueueClosed,
        })
    }

    /// Waits until every event enqueued before this call has been handled
    pub async fn flush(&self) -> Result<()> {
        let (done_tx, done_rx) = oneshot::channel();
        self.tx
            .send(Message::Flush(done_tx))
            .await
            .map_err(|_| CategoryBoardsError::QueueClosed)?;
        done_rx.await.map_err(|_| CategoryBoardsError::QueueClosed)
    }

    /// Number of messages waiting for the consumer
    pub fn pending(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    /// Stops accepting events and waits for the pending ones to be delivered
    pub async fn shutdown(self) {
        let Self { tx, worker } = self;
        drop(tx);
        if let Err(e) = worker.await {
            warn!(error = %e, "change queue worker ended abnormally");
        }
    }
}

async fn run(
    mut rx: mpsc::Receiver<Message>,
    notifier: Arc<dyn Notifier>,
    max_attempts: u32,
    retry_delay: Duration,
) {
    while let Some(message) = rx.recv().await {
        match message {
            Message::Event(event) => {
                deliver_with_retry(notifier.as_ref(), &event, max_attempts, retry_delay).await
            }
            Message::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
    debug!("change queue drained");
}

async fn deliver_with_retry(
    notifier: &dyn Notifier,
    event: &CategoryBoardEvent,
    max_attempts: u32,
    retry_delay: Duration,
) {
    for attempt in 1..=max_attempts {
        match deliver(notifier, event).await {
            Ok(()) => {
                debug!(
                    user_id = %event.user_id,
                    category_id = %event.category_id(),
                    attempt,
                    "notification delivered"
                );
                return;
            }
            Err(e) if attempt < max_attempts => {
                debug!(error = %e, attempt, "notification failed, retrying");
                tokio::time::sleep(retry_delay).await;
            }
            Err(e) => {
                warn!(
                    error = %e,
                    user_id = %event.user_id,
                    team_id = %event.team_id,
                    category_id = %event.category_id(),
                    attempts = max_attempts,
                    "dropping notification after repeated failures"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{BoardId, CategoryId, TeamId, UserId},
        testing::RecordingNotifier,
    };

    fn event(board: &str) -> CategoryBoardEvent {
        CategoryBoardEvent::board_change(
            TeamId::new("t1"),
            UserId::new("u1"),
            BoardId::new(board),
            CategoryId::new("c1"),
        )
    }

    fn config() -> EngineConfig {
        EngineConfig {
            notify_retry_delay_ms: 1,
            ..EngineConfig::default()
        }
    }

    #[tokio::test]
    async fn test_delivers_in_enqueue_order() {
        let notifier = Arc::new(RecordingNotifier::new());
        let queue = ChangeQueue::new(notifier.clone(), &config());

        let events: Vec<_> = (0..20).map(|i| event(&format!("b{i}"))).collect();
        for e in &events {
            queue.enqueue(e.clone()).unwrap();
        }
        queue.flush().await.unwrap();

        assert_eq!(notifier.events(), events);
    }

    #[tokio::test]
    async fn test_retries_transient_failures() {
        let notifier = Arc::new(RecordingNotifier::failing_first(2));
        let queue = ChangeQueue::new(notifier.clone(), &config());

        queue.enqueue(event("b1")).unwrap();
        queue.flush().await.unwrap();

        assert_eq!(notifier.attempts(), 3);
        assert_eq!(notifier.events(), vec![event("b1")]);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts_and_moves_on() {
        let notifier = Arc::new(RecordingNotifier::failing_first(3));
        let queue = ChangeQueue::new(notifier.clone(), &config());

        queue.enqueue(event("b1")).unwrap();
        queue.enqueue(event("b2")).unwrap();
        queue.flush().await.unwrap();

        assert_eq!(notifier.events(), vec![event("b2")]);
    }

    #[tokio::test]
    async fn test_full_queue_rejects_without_blocking() {
        let notifier = Arc::new(RecordingNotifier::new());
        notifier.pause();
        let queue = ChangeQueue::new(
            notifier.clone(),
            &EngineConfig {
                queue_capacity: 1,
                ..config()
            },
        );

        // first event is taken by the worker and parks inside the paused notifier
        queue.enqueue(event("b1")).unwrap();
        while queue.pending() > 0 {
            tokio::task::yield_now().await;
        }
        queue.enqueue(event("b2")).unwrap();
        assert!(matches!(
            queue.enqueue(event("b3")),
            Err(CategoryBoardsError::QueueFull)
        ));

        notifier.resume();
        queue.flush().await.unwrap();
        assert_eq!(notifier.events(), vec![event("b1"), event("b2")]);
    }

    #[tokio::test]
    async fn test_shutdown_drains_pending_events() {
        let notifier = Arc::new(RecordingNotifier::new());
        let queue = ChangeQueue::new(notifier.clone(), &config());

        queue.enqueue(event("b1")).unwrap();
        queue.enqueue(event("b2")).unwrap();
        queue.shutdown().await;

        assert_eq!(notifier.events().len(), 2);
    }
}
