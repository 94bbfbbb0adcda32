use brigade_core::models::{CompanyMember, MemberRole};
use brigade_core::AppError;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

#[derive(Clone)]
pub struct MemberRepository {
    pool: PgPool,
}

impl MemberRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a membership inside an enclosing transaction (company onboarding).
    pub async fn add_member_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        company_id: Uuid,
        chat_id: i64,
        role: MemberRole,
    ) -> Result<CompanyMember, AppError> {
        let member = sqlx::query_as::<_, CompanyMember>(
            r#"
            INSERT INTO company_members (id, company_id, chat_id, role, created_at, updated_at)
            VALUES ($1, $2, $3, $4, NOW(), NOW())
            RETURNING id, company_id, chat_id, role, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(company_id)
        .bind(chat_id)
        .bind(role)
        .fetch_one(&mut **tx)
        .await?;

        Ok(member)
    }

    /// Insert a membership directly (join flow).
    #[tracing::instrument(skip(self))]
    pub async fn add_member(
        &self,
        company_id: Uuid,
        chat_id: i64,
        role: MemberRole,
    ) -> Result<CompanyMember, AppError> {
        let member = sqlx::query_as::<_, CompanyMember>(
            r#"
            INSERT INTO company_members (id, company_id, chat_id, role, created_at, updated_at)
            VALUES ($1, $2, $3, $4, NOW(), NOW())
            RETURNING id, company_id, chat_id, role, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(company_id)
        .bind(chat_id)
        .bind(role)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(
            company_id = %company_id,
            chat_id,
            role = %role,
            "Member joined company"
        );
        Ok(member)
    }

    /// Members with role admin or manager: the recipients of billing
    /// reminders and blocking notifications.
    #[tracing::instrument(skip(self))]
    pub async fn list_billing_contacts(
        &self,
        company_id: Uuid,
    ) -> Result<Vec<CompanyMember>, AppError> {
        let members = sqlx::query_as::<_, CompanyMember>(
            r#"
            SELECT id, company_id, chat_id, role, created_at, updated_at
            FROM company_members
            WHERE company_id = $1 AND role IN ('admin', 'manager')
            ORDER BY created_at ASC
            "#,
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(members)
    }

    /// Same as [`list_billing_contacts`], for use inside the reconciliation
    /// cycle transaction.
    pub async fn list_billing_contacts_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        company_id: Uuid,
    ) -> Result<Vec<CompanyMember>, AppError> {
        let members = sqlx::query_as::<_, CompanyMember>(
            r#"
            SELECT id, company_id, chat_id, role, created_at, updated_at
            FROM company_members
            WHERE company_id = $1 AND role IN ('admin', 'manager')
            ORDER BY created_at ASC
            "#,
        )
        .bind(company_id)
        .fetch_all(&mut **tx)
        .await?;

        Ok(members)
    }

    /// Earliest membership of a chat user, if any. How the front end maps
    /// an incoming chat id to its company.
    #[tracing::instrument(skip(self))]
    pub async fn find_for_chat(&self, chat_id: i64) -> Result<Option<CompanyMember>, AppError> {
        let member = sqlx::query_as::<_, CompanyMember>(
            r#"
            SELECT id, company_id, chat_id, role, created_at, updated_at
            FROM company_members
            WHERE chat_id = $1
            ORDER BY created_at ASC
            LIMIT 1
            "#,
        )
        .bind(chat_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(member)
    }
}
