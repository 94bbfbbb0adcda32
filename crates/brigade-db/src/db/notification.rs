use brigade_core::models::{NewNotification, Notification};
use brigade_core::AppError;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

const NOTIFICATION_COLUMNS: &str =
    "id, company_id, chat_id, kind, body, status, attempts, created_at, sent_at";

#[derive(Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Enqueue a delivery intent inside the transaction of the state change
    /// it announces. The row is durable once that transaction commits.
    pub async fn enqueue_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        notification: &NewNotification,
    ) -> Result<Notification, AppError> {
        let row = sqlx::query_as::<_, Notification>(&format!(
            r#"
            INSERT INTO notifications
                (id, company_id, chat_id, kind, body, status, attempts, created_at)
            VALUES ($1, $2, $3, $4, $5, 'pending', 0, NOW())
            RETURNING {}
            "#,
            NOTIFICATION_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(notification.company_id)
        .bind(notification.chat_id)
        .bind(notification.kind)
        .bind(&notification.body)
        .fetch_one(&mut **tx)
        .await?;

        Ok(row)
    }

    /// Atomically claim a batch of pending rows for delivery. Each claim
    /// counts as an attempt; concurrent dispatchers skip each other's rows.
    #[tracing::instrument(skip(self))]
    pub async fn claim_pending(&self, limit: i64) -> Result<Vec<Notification>, AppError> {
        let mut tx = self.pool.begin().await?;

        let rows = sqlx::query_as::<_, Notification>(&format!(
            r#"
            UPDATE notifications
            SET attempts = attempts + 1
            WHERE id IN (
                SELECT id
                FROM notifications
                WHERE status = 'pending'
                ORDER BY created_at ASC
                LIMIT $1
                FOR UPDATE SKIP LOCKED
            )
            RETURNING {}
            "#,
            NOTIFICATION_COLUMNS
        ))
        .bind(limit)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        if !rows.is_empty() {
            tracing::debug!(count = rows.len(), "Claimed pending notifications");
        }
        Ok(rows)
    }

    /// Record successful delivery.
    #[tracing::instrument(skip(self))]
    pub async fn mark_sent(&self, notification_id: Uuid) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE notifications
            SET status = 'sent', sent_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(notification_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Give up on a row after the attempt cap is reached.
    #[tracing::instrument(skip(self))]
    pub async fn mark_failed(&self, notification_id: Uuid) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE notifications
            SET status = 'failed'
            WHERE id = $1
            "#,
        )
        .bind(notification_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
