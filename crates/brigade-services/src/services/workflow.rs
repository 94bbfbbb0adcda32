use brigade_core::models::{AuditAction, NewAuditEvent, Task, TaskStatus};
use brigade_core::AppError;
use brigade_db::{AuditLogRepository, ProjectRepository, TaskRepository, TransactionGuard};
use sqlx::PgPool;
use uuid::Uuid;

/// Per-task state machine. Every operation is company-scoped by query
/// predicate; a task belonging to another company is indistinguishable from
/// a missing one. Each successful transition emits exactly one audit event
/// before its transaction commits.
#[derive(Clone)]
pub struct TaskWorkflowService {
    pool: PgPool,
    tasks: TaskRepository,
    projects: ProjectRepository,
    audit: AuditLogRepository,
}

impl TaskWorkflowService {
    pub fn new(
        pool: PgPool,
        tasks: TaskRepository,
        projects: ProjectRepository,
        audit: AuditLogRepository,
    ) -> Self {
        Self {
            pool,
            tasks,
            projects,
            audit,
        }
    }

    /// Create a task in `todo`. A project reference must resolve within the
    /// calling company; a foreign project id is rejected before any write.
    #[tracing::instrument(skip(self, description))]
    pub async fn create_task(
        &self,
        company_id: Uuid,
        project_id: Option<Uuid>,
        assignee_chat_id: Option<i64>,
        title: &str,
        description: Option<&str>,
        actor_chat_id: Option<i64>,
    ) -> Result<Task, AppError> {
        if title.trim().is_empty() {
            return Err(AppError::InvalidArgument(
                "Task title must not be empty".to_string(),
            ));
        }

        if let Some(project_id) = project_id {
            self.projects
                .get_by_id_and_company(project_id, company_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;
        }

        let mut tx = TransactionGuard::begin(&self.pool).await?;

        let task = self
            .tasks
            .create_tx(
                &mut tx,
                company_id,
                project_id,
                assignee_chat_id,
                title.trim(),
                description,
            )
            .await?;

        self.audit
            .append_tx(
                &mut tx,
                &NewAuditEvent::new(AuditAction::TaskCreated)
                    .company(company_id)
                    .actor(actor_chat_id)
                    .entity("task", task.id)
                    .payload(serde_json::json!({"title": task.title})),
            )
            .await?;

        tx.commit().await?;
        Ok(task)
    }

    /// Move a task to `new_status`. Only the transitions in the workflow
    /// table are accepted; anything else fails with `InvalidTransition`
    /// without touching the row.
    #[tracing::instrument(skip(self))]
    pub async fn set_status(
        &self,
        task_id: Uuid,
        company_id: Uuid,
        new_status: TaskStatus,
        actor_chat_id: Option<i64>,
    ) -> Result<Task, AppError> {
        let mut tx = TransactionGuard::begin(&self.pool).await?;

        let task = self
            .tasks
            .get_by_id_and_company_tx(&mut tx, task_id, company_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Task not found".to_string()))?;

        if !task.status.can_transition_to(new_status) {
            return Err(AppError::InvalidTransition {
                from: task.status,
                to: new_status,
            });
        }

        let updated = self
            .tasks
            .set_status_tx(&mut tx, task_id, company_id, new_status)
            .await?
            .ok_or_else(|| AppError::NotFound("Task not found".to_string()))?;

        self.audit
            .append_tx(
                &mut tx,
                &NewAuditEvent::new(AuditAction::StatusChanged)
                    .company(company_id)
                    .actor(actor_chat_id)
                    .entity("task", task_id)
                    .payload(serde_json::json!({"new_status": new_status})),
            )
            .await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Change the assignee. A distinct operation from a status change; it
    /// emits its own audit action and no status event.
    #[tracing::instrument(skip(self))]
    pub async fn reassign_task(
        &self,
        task_id: Uuid,
        company_id: Uuid,
        assignee_chat_id: Option<i64>,
        actor_chat_id: Option<i64>,
    ) -> Result<Task, AppError> {
        let mut tx = TransactionGuard::begin(&self.pool).await?;

        let task = self
            .tasks
            .reassign_tx(&mut tx, task_id, company_id, assignee_chat_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Task not found".to_string()))?;

        self.audit
            .append_tx(
                &mut tx,
                &NewAuditEvent::new(AuditAction::TaskReassigned)
                    .company(company_id)
                    .actor(actor_chat_id)
                    .entity("task", task_id)
                    .payload(serde_json::json!({"assignee_chat_id": assignee_chat_id})),
            )
            .await?;

        tx.commit().await?;
        Ok(task)
    }

    /// Soft-delete a task. The row stays for audit history; every query
    /// stops seeing it.
    #[tracing::instrument(skip(self))]
    pub async fn delete_task(
        &self,
        task_id: Uuid,
        company_id: Uuid,
        actor_chat_id: Option<i64>,
    ) -> Result<(), AppError> {
        let mut tx = TransactionGuard::begin(&self.pool).await?;

        let deleted = self
            .tasks
            .soft_delete_tx(&mut tx, task_id, company_id)
            .await?;
        if !deleted {
            return Err(AppError::NotFound("Task not found".to_string()));
        }

        self.audit
            .append_tx(
                &mut tx,
                &NewAuditEvent::new(AuditAction::TaskDeleted)
                    .company(company_id)
                    .actor(actor_chat_id)
                    .entity("task", task_id),
            )
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Company-scoped read.
    #[tracing::instrument(skip(self))]
    pub async fn get_task(
        &self,
        task_id: Uuid,
        company_id: Uuid,
    ) -> Result<Option<Task>, AppError> {
        self.tasks.get_by_id_and_company(task_id, company_id).await
    }

    /// Tasks assigned to a chat user within the company.
    #[tracing::instrument(skip(self))]
    pub async fn list_my_tasks(
        &self,
        company_id: Uuid,
        assignee_chat_id: i64,
    ) -> Result<Vec<Task>, AppError> {
        self.tasks
            .list_for_assignee(company_id, assignee_chat_id)
            .await
    }
}
