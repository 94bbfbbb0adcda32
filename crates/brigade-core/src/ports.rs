//! Outbound ports implemented by external collaborators.

use async_trait::async_trait;

/// Delivery channel for user notifications. The Telegram transport lives in
/// the bot front end; the worker only needs this seam. Errors are caught and
/// logged per recipient by the dispatcher, never propagated.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, chat_id: i64, text: &str) -> anyhow::Result<()>;
}

/// Sender that writes deliveries to the log. Used by the standalone worker
/// binary, where no chat transport is attached.
#[derive(Debug, Clone, Default)]
pub struct LogNotificationSender;

#[async_trait]
impl NotificationSender for LogNotificationSender {
    async fn send(&self, chat_id: i64, text: &str) -> anyhow::Result<()> {
        tracing::info!(chat_id, text, "Notification delivered to log sink");
        Ok(())
    }
}

pub mod test_support {
    use super::*;
    use std::sync::Mutex;

    /// Records every send; optionally fails for a configured set of chat ids.
    #[derive(Debug, Default)]
    pub struct RecordingSender {
        pub sent: Mutex<Vec<(i64, String)>>,
        pub failing_chat_ids: Vec<i64>,
    }

    #[async_trait]
    impl NotificationSender for RecordingSender {
        async fn send(&self, chat_id: i64, text: &str) -> anyhow::Result<()> {
            if self.failing_chat_ids.contains(&chat_id) {
                anyhow::bail!("delivery refused for chat {}", chat_id);
            }
            self.sent
                .lock()
                .expect("sender mutex poisoned")
                .push((chat_id, text.to_string()));
            Ok(())
        }
    }
}
