use brigade_core::models::{AuditAction, NewAuditEvent, Trial};
use brigade_core::AppError;
use brigade_db::{AuditLogRepository, TransactionGuard, TrialRepository};
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// Creates, extends, and evaluates trials. Company onboarding is the only
/// legitimate caller of `start_trial`.
#[derive(Clone)]
pub struct TrialService {
    pool: PgPool,
    trials: TrialRepository,
    audit: AuditLogRepository,
}

impl TrialService {
    pub fn new(pool: PgPool, trials: TrialRepository, audit: AuditLogRepository) -> Self {
        Self {
            pool,
            trials,
            audit,
        }
    }

    /// Start a trial of `days` for a company that has never consumed one.
    /// An active trial already in place is an invariant violation on the
    /// caller's side and fails hard; an inactive row is restarted in place
    /// so the one-row-per-company invariant holds.
    #[tracing::instrument(skip(self))]
    pub async fn start_trial(
        &self,
        company_id: Uuid,
        actor_chat_id: Option<i64>,
        days: i64,
    ) -> Result<Trial, AppError> {
        if days <= 0 {
            return Err(AppError::InvalidArgument(
                "Trial length must be positive".to_string(),
            ));
        }

        let now = Utc::now();
        let mut tx = TransactionGuard::begin(&self.pool).await?;

        let existing = self.trials.get_by_company_tx(&mut tx, company_id).await?;
        let trial = match existing {
            Some(ref t) if t.is_active => {
                return Err(AppError::DuplicateTrial(company_id));
            }
            Some(_) => {
                self.trials
                    .update_expiry_tx(&mut tx, company_id, now + Duration::days(days))
                    .await?
            }
            None => {
                self.trials
                    .insert_tx(&mut tx, company_id, now, now + Duration::days(days), actor_chat_id)
                    .await?
            }
        };

        self.audit
            .append_tx(
                &mut tx,
                &NewAuditEvent::new(AuditAction::TrialStarted)
                    .company(company_id)
                    .actor(actor_chat_id)
                    .entity("trial", trial.id)
                    .payload(serde_json::json!({
                        "days": days,
                        "expires_at": trial.expires_at,
                    })),
            )
            .await?;

        tx.commit().await?;
        Ok(trial)
    }

    /// Extend (or lazily create) the company's trial. Never shortens: the
    /// new expiry is `max(now, current expiry) + extra_days` and the row is
    /// forced active.
    #[tracing::instrument(skip(self))]
    pub async fn extend_trial(&self, company_id: Uuid, extra_days: i64) -> Result<Trial, AppError> {
        if extra_days <= 0 {
            return Err(AppError::InvalidArgument(
                "Trial extension days must be positive".to_string(),
            ));
        }

        let now = Utc::now();
        let mut tx = TransactionGuard::begin(&self.pool).await?;

        let trial = match self.trials.get_by_company_tx(&mut tx, company_id).await? {
            None => {
                self.trials
                    .insert_tx(&mut tx, company_id, now, now + Duration::days(extra_days), None)
                    .await?
            }
            Some(existing) => {
                let new_expiry = existing.extended_expiry(now, extra_days);
                self.trials
                    .update_expiry_tx(&mut tx, company_id, new_expiry)
                    .await?
            }
        };

        self.audit
            .append_tx(
                &mut tx,
                &NewAuditEvent::new(AuditAction::TrialExtended)
                    .company(company_id)
                    .entity("trial", trial.id)
                    .payload(serde_json::json!({
                        "extra_days": extra_days,
                        "expires_at": trial.expires_at,
                    })),
            )
            .await?;

        tx.commit().await?;
        Ok(trial)
    }

    /// Pure predicate over the stored row: exists, active, not yet expired.
    #[tracing::instrument(skip(self))]
    pub async fn is_trial_active(
        &self,
        company_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let trial = self.trials.get_by_company(company_id).await?;
        Ok(trial.map(|t| t.is_active_at(now)).unwrap_or(false))
    }
}
