use brigade_core::models::{Subscription, SubscriptionStatus};
use brigade_core::AppError;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

const SUBSCRIPTION_COLUMNS: &str = "id, company_id, plan_id, status, starts_at, expires_at, \
     created_by, updated_by, created_at, updated_at";

#[derive(Clone)]
pub struct SubscriptionRepository {
    pool: PgPool,
}

impl SubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The company's current subscription: latest expiry wins. Older rows
    /// are history and are never touched again.
    #[tracing::instrument(skip(self))]
    pub async fn latest_by_company(
        &self,
        company_id: Uuid,
    ) -> Result<Option<Subscription>, AppError> {
        let subscription = sqlx::query_as::<_, Subscription>(&format!(
            r#"
            SELECT {}
            FROM subscriptions
            WHERE company_id = $1
            ORDER BY expires_at DESC
            LIMIT 1
            "#,
            SUBSCRIPTION_COLUMNS
        ))
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(subscription)
    }

    /// Row-locked variant for mutations inside an enclosing transaction.
    pub async fn latest_by_company_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        company_id: Uuid,
    ) -> Result<Option<Subscription>, AppError> {
        let subscription = sqlx::query_as::<_, Subscription>(&format!(
            r#"
            SELECT {}
            FROM subscriptions
            WHERE company_id = $1
            ORDER BY expires_at DESC
            LIMIT 1
            FOR UPDATE
            "#,
            SUBSCRIPTION_COLUMNS
        ))
        .bind(company_id)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(subscription)
    }

    /// Append a new subscription row. History is append-only; prior rows
    /// keep whatever status they had.
    #[allow(clippy::too_many_arguments)]
    pub async fn insert_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        company_id: Uuid,
        plan_id: Uuid,
        status: SubscriptionStatus,
        starts_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
        created_by: Option<i64>,
    ) -> Result<Subscription, AppError> {
        let subscription = sqlx::query_as::<_, Subscription>(&format!(
            r#"
            INSERT INTO subscriptions
                (id, company_id, plan_id, status, starts_at, expires_at, created_by, updated_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7, NOW(), NOW())
            RETURNING {}
            "#,
            SUBSCRIPTION_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(company_id)
        .bind(plan_id)
        .bind(status)
        .bind(starts_at)
        .bind(expires_at)
        .bind(created_by)
        .fetch_one(&mut **tx)
        .await?;

        tracing::info!(
            company_id = %company_id,
            subscription_id = %subscription.id,
            expires_at = %subscription.expires_at,
            "Subscription created"
        );
        Ok(subscription)
    }

    /// Set the status of one subscription row by id.
    pub async fn set_status_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        subscription_id: Uuid,
        status: SubscriptionStatus,
        updated_by: Option<i64>,
    ) -> Result<Subscription, AppError> {
        let subscription = sqlx::query_as::<_, Subscription>(&format!(
            r#"
            UPDATE subscriptions
            SET status = $2, updated_by = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            SUBSCRIPTION_COLUMNS
        ))
        .bind(subscription_id)
        .bind(status)
        .bind(updated_by)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| {
            if matches!(e, sqlx::Error::RowNotFound) {
                AppError::NotFound("Subscription not found".to_string())
            } else {
                AppError::Database(e)
            }
        })?;

        tracing::info!(
            subscription_id = %subscription_id,
            status = %status,
            "Subscription status updated"
        );
        Ok(subscription)
    }

    /// Active subscriptions expiring within `[now, until]` (reminder pass).
    pub async fn list_expiring_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        now: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<Subscription>, AppError> {
        let subscriptions = sqlx::query_as::<_, Subscription>(&format!(
            r#"
            SELECT {}
            FROM subscriptions
            WHERE status = 'active' AND expires_at >= $1 AND expires_at <= $2
            ORDER BY expires_at ASC
            "#,
            SUBSCRIPTION_COLUMNS
        ))
        .bind(now)
        .bind(until)
        .fetch_all(&mut **tx)
        .await?;

        Ok(subscriptions)
    }

    /// Subscriptions still marked active but past expiry (enforcement pass).
    /// Stops matching once the row is flipped to expired.
    pub async fn list_expired_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Subscription>, AppError> {
        let subscriptions = sqlx::query_as::<_, Subscription>(&format!(
            r#"
            SELECT {}
            FROM subscriptions
            WHERE status = 'active' AND expires_at <= $1
            ORDER BY expires_at ASC
            "#,
            SUBSCRIPTION_COLUMNS
        ))
        .bind(now)
        .fetch_all(&mut **tx)
        .await?;

        Ok(subscriptions)
    }
}
