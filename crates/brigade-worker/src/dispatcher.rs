//! Notification dispatcher: drains the outbox the reconciliation loop fills.
//!
//! Delivery is best-effort per recipient. A failed send is logged, counted
//! against the row's attempt budget, and never aborts the batch or reaches
//! the reconciliation transaction, which committed long before.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use brigade_core::{AppError, NotificationSender};
use brigade_db::NotificationRepository;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[derive(Clone, Debug)]
pub struct DispatcherConfig {
    /// Seconds between outbox polls.
    pub poll_interval_secs: u64,
    /// Rows claimed per poll.
    pub batch_size: i64,
    /// Delivery attempts before a row is marked failed.
    pub max_attempts: i32,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 5,
            batch_size: 50,
            max_attempts: 3,
        }
    }
}

/// Handle to a running dispatcher.
pub struct DispatcherHandle {
    shutdown_tx: mpsc::Sender<()>,
    join: JoinHandle<()>,
}

impl DispatcherHandle {
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        if let Err(e) = self.join.await {
            tracing::error!(error = %e, "Dispatcher task panicked");
        }
    }
}

pub struct NotificationDispatcher {
    notifications: NotificationRepository,
    sender: Arc<dyn NotificationSender>,
    config: DispatcherConfig,
}

impl NotificationDispatcher {
    pub fn new(
        notifications: NotificationRepository,
        sender: Arc<dyn NotificationSender>,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            notifications,
            sender,
            config,
        }
    }

    /// Start the polling loop.
    pub fn start(self: Arc<Self>) -> DispatcherHandle {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        let join = tokio::spawn(async move {
            tracing::info!(
                poll_interval_secs = self.config.poll_interval_secs,
                batch_size = self.config.batch_size,
                "Notification dispatcher started"
            );

            let mut interval =
                tokio::time::interval(StdDuration::from_secs(self.config.poll_interval_secs));
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        if let Err(e) = self.drain_once().await {
                            tracing::error!(error = %e, "Dispatcher poll failed");
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        tracing::info!("Notification dispatcher shutting down");
                        break;
                    }
                }
            }

            tracing::info!("Notification dispatcher stopped");
        });

        DispatcherHandle { shutdown_tx, join }
    }

    /// Claim one batch and deliver it. Returns the number of successful
    /// deliveries.
    #[tracing::instrument(skip(self))]
    pub async fn drain_once(&self) -> Result<usize, AppError> {
        let batch = self
            .notifications
            .claim_pending(self.config.batch_size)
            .await?;
        if batch.is_empty() {
            return Ok(0);
        }

        let mut delivered = 0;
        for row in batch {
            match self.sender.send(row.chat_id, &row.body).await {
                Ok(()) => {
                    self.notifications.mark_sent(row.id).await?;
                    delivered += 1;
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        notification_id = %row.id,
                        chat_id = row.chat_id,
                        attempts = row.attempts,
                        "Notification delivery failed"
                    );
                    if !row.can_retry(self.config.max_attempts) {
                        self.notifications.mark_failed(row.id).await?;
                        tracing::error!(
                            notification_id = %row.id,
                            attempts = row.attempts,
                            "Notification gave up after max attempts"
                        );
                    }
                }
            }
        }

        tracing::debug!(delivered, "Dispatcher batch processed");
        Ok(delivered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brigade_core::ports::test_support::RecordingSender;

    #[test]
    fn default_config_is_sane() {
        let config = DispatcherConfig::default();
        assert!(config.poll_interval_secs > 0);
        assert!(config.batch_size > 0);
        assert!(config.max_attempts > 0);
    }

    #[tokio::test]
    async fn sender_failures_stay_local() {
        // The per-recipient contract: one refusing recipient does not stop
        // delivery to the others.
        let sender = RecordingSender {
            failing_chat_ids: vec![2],
            ..Default::default()
        };
        assert!(sender.send(1, "first").await.is_ok());
        assert!(sender.send(2, "second").await.is_err());
        assert!(sender.send(3, "third").await.is_ok());

        let sent = sender.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].0, 1);
        assert_eq!(sent[1].0, 3);
    }
}
