use brigade_core::models::Company;
use brigade_core::AppError;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

#[derive(Clone)]
pub struct CompanyRepository {
    pool: PgPool,
}

impl CompanyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new company. Part of the onboarding transaction that also
    /// creates the trial and the creator membership.
    pub async fn create_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        name: &str,
        created_by: Option<i64>,
    ) -> Result<Company, AppError> {
        let company = sqlx::query_as::<_, Company>(
            r#"
            INSERT INTO companies (id, name, status, created_by, created_at, updated_at)
            VALUES ($1, $2, 'active', $3, NOW(), NOW())
            RETURNING id, name, status, created_by, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(created_by)
        .fetch_one(&mut **tx)
        .await?;

        tracing::info!(company_id = %company.id, name = %company.name, "Created new company");
        Ok(company)
    }

    /// Get company by ID
    #[tracing::instrument(skip(self))]
    pub async fn get_by_id(&self, company_id: Uuid) -> Result<Option<Company>, AppError> {
        let company = sqlx::query_as::<_, Company>(
            r#"
            SELECT id, name, status, created_by, created_at, updated_at
            FROM companies
            WHERE id = $1
            "#,
        )
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(company)
    }

    /// Get company by exact name
    #[tracing::instrument(skip(self))]
    pub async fn get_by_name(&self, name: &str) -> Result<Option<Company>, AppError> {
        let company = sqlx::query_as::<_, Company>(
            r#"
            SELECT id, name, status, created_by, created_at, updated_at
            FROM companies
            WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(company)
    }
}
