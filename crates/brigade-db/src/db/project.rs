use brigade_core::models::Project;
use brigade_core::AppError;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct ProjectRepository {
    pool: PgPool,
}

impl ProjectRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a project for a company.
    #[tracing::instrument(skip(self))]
    pub async fn create(&self, company_id: Uuid, name: &str) -> Result<Project, AppError> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (id, company_id, name, created_at, updated_at)
            VALUES ($1, $2, $3, NOW(), NOW())
            RETURNING id, company_id, name, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(company_id)
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(project_id = %project.id, company_id = %company_id, "Project created");
        Ok(project)
    }

    /// Company-scoped lookup. A foreign company's project id yields None,
    /// which is how cross-tenant references get rejected at the boundary.
    #[tracing::instrument(skip(self))]
    pub async fn get_by_id_and_company(
        &self,
        project_id: Uuid,
        company_id: Uuid,
    ) -> Result<Option<Project>, AppError> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            SELECT id, company_id, name, created_at, updated_at
            FROM projects
            WHERE id = $1 AND company_id = $2
            "#,
        )
        .bind(project_id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(project)
    }
}
