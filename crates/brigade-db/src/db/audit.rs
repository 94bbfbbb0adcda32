use brigade_core::models::{AuditEvent, NewAuditEvent};
use brigade_core::AppError;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

/// Append-only sink for state-changing operations. Every mutation writes its
/// event through `append_tx` inside the mutation's own transaction, so the
/// action and its record are all-or-nothing.
#[derive(Clone)]
pub struct AuditLogRepository;

impl AuditLogRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn append_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        event: &NewAuditEvent,
    ) -> Result<AuditEvent, AppError> {
        let record = sqlx::query_as::<_, AuditEvent>(
            r#"
            INSERT INTO audit_log
                (id, company_id, actor_chat_id, action, entity_type, entity_id, payload, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, NOW())
            RETURNING id, company_id, actor_chat_id, action, entity_type, entity_id, payload, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(event.company_id)
        .bind(event.actor_chat_id)
        .bind(event.action.to_string())
        .bind(event.entity_type.as_deref())
        .bind(event.entity_id)
        .bind(event.payload.as_ref())
        .fetch_one(&mut **tx)
        .await?;

        tracing::debug!(
            action = %event.action,
            entity_type = ?event.entity_type,
            entity_id = ?event.entity_id,
            "Audit event appended"
        );
        Ok(record)
    }
}

impl Default for AuditLogRepository {
    fn default() -> Self {
        Self::new()
    }
}
