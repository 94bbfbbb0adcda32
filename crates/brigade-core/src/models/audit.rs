use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use uuid::Uuid;

/// Action recorded in the audit log. Written once per state-changing
/// operation, inside that operation's transaction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    CompanyCreated,
    TrialStarted,
    TrialExtended,
    TrialExpired,
    SubscriptionStarted,
    SubscriptionPaused,
    SubscriptionResumed,
    SubscriptionCanceled,
    SubscriptionExpired,
    TaskCreated,
    StatusChanged,
    TaskReassigned,
    TaskDeleted,
}

impl Display for AuditAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            AuditAction::CompanyCreated => write!(f, "company_created"),
            AuditAction::TrialStarted => write!(f, "trial_started"),
            AuditAction::TrialExtended => write!(f, "trial_extended"),
            AuditAction::TrialExpired => write!(f, "trial_expired"),
            AuditAction::SubscriptionStarted => write!(f, "subscription_started"),
            AuditAction::SubscriptionPaused => write!(f, "subscription_paused"),
            AuditAction::SubscriptionResumed => write!(f, "subscription_resumed"),
            AuditAction::SubscriptionCanceled => write!(f, "subscription_canceled"),
            AuditAction::SubscriptionExpired => write!(f, "subscription_expired"),
            AuditAction::TaskCreated => write!(f, "task_created"),
            AuditAction::StatusChanged => write!(f, "status_changed"),
            AuditAction::TaskReassigned => write!(f, "task_reassigned"),
            AuditAction::TaskDeleted => write!(f, "task_deleted"),
        }
    }
}

/// Immutable audit record. Written once, never mutated, consumed only by
/// external reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct AuditEvent {
    pub id: Uuid,
    pub company_id: Option<Uuid>,
    pub actor_chat_id: Option<i64>,
    pub action: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<Uuid>,
    pub payload: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// Event to append, before the store assigns id and timestamp.
#[derive(Debug, Clone)]
pub struct NewAuditEvent {
    pub company_id: Option<Uuid>,
    pub actor_chat_id: Option<i64>,
    pub action: AuditAction,
    pub entity_type: Option<String>,
    pub entity_id: Option<Uuid>,
    pub payload: Option<serde_json::Value>,
}

impl NewAuditEvent {
    pub fn new(action: AuditAction) -> Self {
        Self {
            company_id: None,
            actor_chat_id: None,
            action,
            entity_type: None,
            entity_id: None,
            payload: None,
        }
    }

    pub fn company(mut self, company_id: Uuid) -> Self {
        self.company_id = Some(company_id);
        self
    }

    pub fn actor(mut self, chat_id: Option<i64>) -> Self {
        self.actor_chat_id = chat_id;
        self
    }

    pub fn entity(mut self, entity_type: &str, entity_id: Uuid) -> Self {
        self.entity_type = Some(entity_type.to_string());
        self.entity_id = Some(entity_id);
        self
    }

    pub fn payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_fills_all_fields() {
        let company = Uuid::new_v4();
        let task = Uuid::new_v4();
        let event = NewAuditEvent::new(AuditAction::StatusChanged)
            .company(company)
            .actor(Some(42))
            .entity("task", task)
            .payload(serde_json::json!({"new_status": "ready"}));

        assert_eq!(event.company_id, Some(company));
        assert_eq!(event.actor_chat_id, Some(42));
        assert_eq!(event.action, AuditAction::StatusChanged);
        assert_eq!(event.entity_type.as_deref(), Some("task"));
        assert_eq!(event.entity_id, Some(task));
        assert_eq!(
            event.payload.unwrap()["new_status"],
            serde_json::json!("ready")
        );
    }

    #[test]
    fn action_names_are_stable() {
        assert_eq!(AuditAction::StatusChanged.to_string(), "status_changed");
        assert_eq!(AuditAction::TrialExpired.to_string(), "trial_expired");
        assert_eq!(
            AuditAction::SubscriptionStarted.to_string(),
            "subscription_started"
        );
    }
}
