use brigade_core::models::{AuditAction, Company, CompanyMember, MemberRole, NewAuditEvent, Trial};
use brigade_core::AppError;
use brigade_db::{
    AuditLogRepository, CompanyRepository, MemberRepository, TransactionGuard, TrialRepository,
};
use chrono::{Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// Company onboarding: a company, its trial, and the creator's manager
/// membership are born in one transaction.
#[derive(Clone)]
pub struct CompanyService {
    pool: PgPool,
    companies: CompanyRepository,
    members: MemberRepository,
    trials: TrialRepository,
    audit: AuditLogRepository,
    trial_days_default: i64,
}

impl CompanyService {
    pub fn new(
        pool: PgPool,
        companies: CompanyRepository,
        members: MemberRepository,
        trials: TrialRepository,
        audit: AuditLogRepository,
        trial_days_default: i64,
    ) -> Self {
        Self {
            pool,
            companies,
            members,
            trials,
            audit,
            trial_days_default,
        }
    }

    /// Create a company with its trial already running and the creator
    /// registered as manager.
    #[tracing::instrument(skip(self))]
    pub async fn create_company(
        &self,
        name: &str,
        creator_chat_id: i64,
    ) -> Result<(Company, Trial), AppError> {
        if name.trim().is_empty() {
            return Err(AppError::InvalidArgument(
                "Company name must not be empty".to_string(),
            ));
        }

        let now = Utc::now();
        let mut tx = TransactionGuard::begin(&self.pool).await?;

        let company = self
            .companies
            .create_tx(&mut tx, name.trim(), Some(creator_chat_id))
            .await?;

        let trial = self
            .trials
            .insert_tx(
                &mut tx,
                company.id,
                now,
                now + Duration::days(self.trial_days_default),
                Some(creator_chat_id),
            )
            .await?;

        self.members
            .add_member_tx(&mut tx, company.id, creator_chat_id, MemberRole::Manager)
            .await?;

        self.audit
            .append_tx(
                &mut tx,
                &NewAuditEvent::new(AuditAction::CompanyCreated)
                    .company(company.id)
                    .actor(Some(creator_chat_id))
                    .entity("company", company.id)
                    .payload(serde_json::json!({
                        "name": company.name,
                        "trial_expires_at": trial.expires_at,
                    })),
            )
            .await?;

        tx.commit().await?;
        Ok((company, trial))
    }

    /// Attach a chat user to an existing company with the given role.
    #[tracing::instrument(skip(self))]
    pub async fn join_company(
        &self,
        company_id: Uuid,
        chat_id: i64,
        role: MemberRole,
    ) -> Result<CompanyMember, AppError> {
        let company = self
            .companies
            .get_by_id(company_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Company not found".to_string()))?;

        self.members.add_member(company.id, chat_id, role).await
    }

    /// Company lookup for the front end.
    #[tracing::instrument(skip(self))]
    pub async fn get_company(&self, company_id: Uuid) -> Result<Option<Company>, AppError> {
        self.companies.get_by_id(company_id).await
    }

    /// Company lookup by exact name (the join-by-name flow).
    #[tracing::instrument(skip(self))]
    pub async fn find_company_by_name(&self, name: &str) -> Result<Option<Company>, AppError> {
        self.companies.get_by_name(name).await
    }

    /// Resolve an incoming chat id to its membership, if any. The gate's
    /// `no_company` leg is fed from this.
    #[tracing::instrument(skip(self))]
    pub async fn membership_for_chat(
        &self,
        chat_id: i64,
    ) -> Result<Option<CompanyMember>, AppError> {
        self.members.find_for_chat(chat_id).await
    }
}
