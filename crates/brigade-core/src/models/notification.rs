use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use uuid::Uuid;

/// What a queued notification is about.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "notification_kind", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    TrialReminder,
    SubscriptionReminder,
    TrialExpired,
    SubscriptionExpired,
}

impl Display for NotificationKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            NotificationKind::TrialReminder => write!(f, "trial_reminder"),
            NotificationKind::SubscriptionReminder => write!(f, "subscription_reminder"),
            NotificationKind::TrialExpired => write!(f, "trial_expired"),
            NotificationKind::SubscriptionExpired => write!(f, "subscription_expired"),
        }
    }
}

/// Delivery state of an outbox row.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "notification_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
    Pending,
    Sent,
    Failed,
}

/// Persisted notification intent. The reconciliation loop enqueues these in
/// the same transaction as the state change they announce; the dispatcher
/// delivers them best-effort afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Notification {
    pub id: Uuid,
    pub company_id: Uuid,
    pub chat_id: i64,
    pub kind: NotificationKind,
    pub body: String,
    pub status: NotificationStatus,
    pub attempts: i32,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
}

impl Notification {
    /// Whether the dispatcher should try this row again after a failure.
    pub fn can_retry(&self, max_attempts: i32) -> bool {
        self.attempts < max_attempts
    }
}

/// Notification to enqueue, before the store assigns id and timestamps.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub company_id: Uuid,
    pub chat_id: i64,
    pub kind: NotificationKind,
    pub body: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_stops_at_attempt_cap() {
        let row = Notification {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            chat_id: 7,
            kind: NotificationKind::TrialExpired,
            body: "trial ended".to_string(),
            status: NotificationStatus::Pending,
            attempts: 2,
            created_at: Utc::now(),
            sent_at: None,
        };
        assert!(row.can_retry(3));
        assert!(!row.can_retry(2));
    }

    #[test]
    fn kind_names_are_stable() {
        assert_eq!(NotificationKind::TrialReminder.to_string(), "trial_reminder");
        assert_eq!(
            NotificationKind::SubscriptionExpired.to_string(),
            "subscription_expired"
        );
    }
}
