use brigade_core::models::{Plan, PlanSpec};
use brigade_core::AppError;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

const PLAN_COLUMNS: &str =
    "id, code, name, monthly_price_cents, period_days, features, created_at, updated_at";

#[derive(Clone)]
pub struct PlanRepository {
    pool: PgPool,
}

impl PlanRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Upsert a catalog entry by code. The only write path for plans:
    /// referenced plans are never deleted, only corrected in place.
    #[tracing::instrument(skip(self, spec), fields(plan.code = %spec.code))]
    pub async fn upsert(&self, spec: &PlanSpec) -> Result<Plan, AppError> {
        spec.validate()?;

        let plan = sqlx::query_as::<_, Plan>(&format!(
            r#"
            INSERT INTO plans (id, code, name, monthly_price_cents, period_days, features, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, NOW(), NOW())
            ON CONFLICT (code) DO UPDATE
            SET name = EXCLUDED.name,
                monthly_price_cents = EXCLUDED.monthly_price_cents,
                period_days = EXCLUDED.period_days,
                features = EXCLUDED.features,
                updated_at = NOW()
            RETURNING {}
            "#,
            PLAN_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&spec.code)
        .bind(&spec.name)
        .bind(spec.monthly_price_cents)
        .bind(spec.period_days)
        .bind(&spec.features)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(plan_id = %plan.id, code = %plan.code, "Plan upserted");
        Ok(plan)
    }

    /// Resolve a plan by its catalog code.
    #[tracing::instrument(skip(self))]
    pub async fn get_by_code(&self, code: &str) -> Result<Option<Plan>, AppError> {
        let plan = sqlx::query_as::<_, Plan>(&format!(
            "SELECT {} FROM plans WHERE code = $1",
            PLAN_COLUMNS
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(plan)
    }

    /// Full catalog, stable order.
    #[tracing::instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Plan>, AppError> {
        let plans = sqlx::query_as::<_, Plan>(&format!(
            "SELECT {} FROM plans ORDER BY monthly_price_cents ASC",
            PLAN_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(plans)
    }
}
