use brigade_core::models::Trial;
use brigade_core::AppError;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

const TRIAL_COLUMNS: &str =
    "id, company_id, starts_at, expires_at, is_active, created_by, created_at, updated_at";

#[derive(Clone)]
pub struct TrialRepository {
    pool: PgPool,
}

impl TrialRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The company's single trial row, if one exists.
    #[tracing::instrument(skip(self))]
    pub async fn get_by_company(&self, company_id: Uuid) -> Result<Option<Trial>, AppError> {
        let trial = sqlx::query_as::<_, Trial>(&format!(
            "SELECT {} FROM trials WHERE company_id = $1",
            TRIAL_COLUMNS
        ))
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(trial)
    }

    /// Row-locked read for mutations inside an enclosing transaction.
    pub async fn get_by_company_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        company_id: Uuid,
    ) -> Result<Option<Trial>, AppError> {
        let trial = sqlx::query_as::<_, Trial>(&format!(
            "SELECT {} FROM trials WHERE company_id = $1 FOR UPDATE",
            TRIAL_COLUMNS
        ))
        .bind(company_id)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(trial)
    }

    /// Insert the trial row. One per company; callers must have checked for
    /// an existing row first.
    pub async fn insert_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        company_id: Uuid,
        starts_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
        created_by: Option<i64>,
    ) -> Result<Trial, AppError> {
        let trial = sqlx::query_as::<_, Trial>(&format!(
            r#"
            INSERT INTO trials (id, company_id, starts_at, expires_at, is_active, created_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, TRUE, $5, NOW(), NOW())
            RETURNING {}
            "#,
            TRIAL_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(company_id)
        .bind(starts_at)
        .bind(expires_at)
        .bind(created_by)
        .fetch_one(&mut **tx)
        .await?;

        tracing::info!(
            company_id = %company_id,
            expires_at = %trial.expires_at,
            "Trial started"
        );
        Ok(trial)
    }

    /// Move the expiry forward and force the trial active (extension path).
    pub async fn update_expiry_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        company_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<Trial, AppError> {
        let trial = sqlx::query_as::<_, Trial>(&format!(
            r#"
            UPDATE trials
            SET expires_at = $2, is_active = TRUE, updated_at = NOW()
            WHERE company_id = $1
            RETURNING {}
            "#,
            TRIAL_COLUMNS
        ))
        .bind(company_id)
        .bind(expires_at)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| {
            if matches!(e, sqlx::Error::RowNotFound) {
                AppError::NotFound("Trial not found".to_string())
            } else {
                AppError::Database(e)
            }
        })?;

        tracing::info!(company_id = %company_id, expires_at = %expires_at, "Trial extended");
        Ok(trial)
    }

    /// Flip `is_active` off. Used when a paid subscription supersedes the
    /// trial and by reconciliation enforcement. Idempotent.
    pub async fn deactivate_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        company_id: Uuid,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE trials
            SET is_active = FALSE, updated_at = NOW()
            WHERE company_id = $1 AND is_active = TRUE
            "#,
        )
        .bind(company_id)
        .execute(&mut **tx)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Active trials expiring within `[now, until]` (reminder pass).
    pub async fn list_expiring_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        now: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<Trial>, AppError> {
        let trials = sqlx::query_as::<_, Trial>(&format!(
            r#"
            SELECT {}
            FROM trials
            WHERE is_active = TRUE AND expires_at >= $1 AND expires_at <= $2
            ORDER BY expires_at ASC
            "#,
            TRIAL_COLUMNS
        ))
        .bind(now)
        .bind(until)
        .fetch_all(&mut **tx)
        .await?;

        Ok(trials)
    }

    /// Active trials already past expiry (enforcement pass). The predicate
    /// stops matching once the row is deactivated, which is what makes
    /// repeated enforcement runs no-ops.
    pub async fn list_expired_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Trial>, AppError> {
        let trials = sqlx::query_as::<_, Trial>(&format!(
            r#"
            SELECT {}
            FROM trials
            WHERE is_active = TRUE AND expires_at <= $1
            ORDER BY expires_at ASC
            "#,
            TRIAL_COLUMNS
        ))
        .bind(now)
        .fetch_all(&mut **tx)
        .await?;

        Ok(trials)
    }
}
