use brigade_core::models::{Task, TaskStatus};
use brigade_core::AppError;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

const TASK_COLUMNS: &str = "id, company_id, project_id, assignee_chat_id, title, description, \
     status, deleted_at, created_at, updated_at";

#[derive(Clone)]
pub struct TaskRepository {
    pool: PgPool,
}

impl TaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a task inside an enclosing transaction (paired with its audit
    /// event).
    pub async fn create_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        company_id: Uuid,
        project_id: Option<Uuid>,
        assignee_chat_id: Option<i64>,
        title: &str,
        description: Option<&str>,
    ) -> Result<Task, AppError> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks
                (id, company_id, project_id, assignee_chat_id, title, description, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, 'todo', NOW(), NOW())
            RETURNING {}
            "#,
            TASK_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(company_id)
        .bind(project_id)
        .bind(assignee_chat_id)
        .bind(title)
        .bind(description)
        .fetch_one(&mut **tx)
        .await?;

        tracing::info!(task_id = %task.id, company_id = %company_id, "Task created");
        Ok(task)
    }

    /// Company-scoped lookup. Soft-deleted rows are invisible; a foreign
    /// company's task id yields None rather than a filtered row.
    #[tracing::instrument(skip(self))]
    pub async fn get_by_id_and_company(
        &self,
        task_id: Uuid,
        company_id: Uuid,
    ) -> Result<Option<Task>, AppError> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            SELECT {}
            FROM tasks
            WHERE id = $1 AND company_id = $2 AND deleted_at IS NULL
            "#,
            TASK_COLUMNS
        ))
        .bind(task_id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(task)
    }

    /// Row-locked company-scoped read for the status-transition transaction.
    pub async fn get_by_id_and_company_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        task_id: Uuid,
        company_id: Uuid,
    ) -> Result<Option<Task>, AppError> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            SELECT {}
            FROM tasks
            WHERE id = $1 AND company_id = $2 AND deleted_at IS NULL
            FOR UPDATE
            "#,
            TASK_COLUMNS
        ))
        .bind(task_id)
        .bind(company_id)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(task)
    }

    /// Write the new status. Tenant scoping is part of the predicate: a
    /// cross-tenant id updates nothing and returns None.
    pub async fn set_status_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        task_id: Uuid,
        company_id: Uuid,
        status: TaskStatus,
    ) -> Result<Option<Task>, AppError> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND company_id = $2 AND deleted_at IS NULL
            RETURNING {}
            "#,
            TASK_COLUMNS
        ))
        .bind(task_id)
        .bind(company_id)
        .bind(status)
        .fetch_optional(&mut **tx)
        .await?;

        if let Some(ref task) = task {
            tracing::info!(task_id = %task.id, status = %status, "Task status updated");
        }
        Ok(task)
    }

    /// Change the assignee. Distinct from a status change and tenant-scoped
    /// the same way.
    pub async fn reassign_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        task_id: Uuid,
        company_id: Uuid,
        assignee_chat_id: Option<i64>,
    ) -> Result<Option<Task>, AppError> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks
            SET assignee_chat_id = $3, updated_at = NOW()
            WHERE id = $1 AND company_id = $2 AND deleted_at IS NULL
            RETURNING {}
            "#,
            TASK_COLUMNS
        ))
        .bind(task_id)
        .bind(company_id)
        .bind(assignee_chat_id)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(task)
    }

    /// Tasks assigned to a chat user within one company.
    #[tracing::instrument(skip(self))]
    pub async fn list_for_assignee(
        &self,
        company_id: Uuid,
        assignee_chat_id: i64,
    ) -> Result<Vec<Task>, AppError> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            r#"
            SELECT {}
            FROM tasks
            WHERE company_id = $1 AND assignee_chat_id = $2 AND deleted_at IS NULL
            ORDER BY created_at DESC
            "#,
            TASK_COLUMNS
        ))
        .bind(company_id)
        .bind(assignee_chat_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tasks)
    }

    /// Soft delete: set the marker, keep the row.
    pub async fn soft_delete_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        task_id: Uuid,
        company_id: Uuid,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE tasks
            SET deleted_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND company_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(task_id)
        .bind(company_id)
        .execute(&mut **tx)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
