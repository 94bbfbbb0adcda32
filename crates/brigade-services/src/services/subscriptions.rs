use brigade_core::entitlement::{evaluate_entitlement, EntitlementStatus};
use brigade_core::models::subscription::paid_period_end;
use brigade_core::models::{AuditAction, NewAuditEvent, Plan, Subscription, SubscriptionStatus};
use brigade_core::AppError;
use brigade_db::{
    AuditLogRepository, PlanRepository, SubscriptionRepository, TransactionGuard, TrialRepository,
};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// Owns the subscription history and computes the authoritative entitlement
/// verdict. No other code path decides entitlement.
#[derive(Clone)]
pub struct SubscriptionService {
    pool: PgPool,
    subscriptions: SubscriptionRepository,
    trials: TrialRepository,
    plans: PlanRepository,
    audit: AuditLogRepository,
}

impl SubscriptionService {
    pub fn new(
        pool: PgPool,
        subscriptions: SubscriptionRepository,
        trials: TrialRepository,
        plans: PlanRepository,
        audit: AuditLogRepository,
    ) -> Self {
        Self {
            pool,
            subscriptions,
            trials,
            plans,
            audit,
        }
    }

    /// Activate a paid period: append a new `active` subscription row and
    /// retire the trial if one is still running. Prior subscription rows
    /// are history and stay untouched.
    ///
    /// Expiry uses the fixed 30-day month convention.
    #[tracing::instrument(skip(self))]
    pub async fn start_paid_subscription(
        &self,
        company_id: Uuid,
        plan_code: &str,
        months: i64,
        actor_chat_id: Option<i64>,
    ) -> Result<Subscription, AppError> {
        if months <= 0 {
            return Err(AppError::InvalidArgument(
                "Subscription months must be positive".to_string(),
            ));
        }

        let plan = self
            .plans
            .get_by_code(plan_code)
            .await?
            .ok_or_else(|| AppError::PlanNotFound(plan_code.to_string()))?;

        let now = Utc::now();
        let mut tx = TransactionGuard::begin(&self.pool).await?;

        let subscription = self
            .subscriptions
            .insert_tx(
                &mut tx,
                company_id,
                plan.id,
                SubscriptionStatus::Active,
                now,
                paid_period_end(now, months),
                actor_chat_id,
            )
            .await?;

        // The paid period supersedes the trial the moment it starts.
        let trial_retired = self.trials.deactivate_tx(&mut tx, company_id).await?;
        if trial_retired {
            tracing::info!(company_id = %company_id, "Trial superseded by paid subscription");
        }

        self.audit
            .append_tx(
                &mut tx,
                &NewAuditEvent::new(AuditAction::SubscriptionStarted)
                    .company(company_id)
                    .actor(actor_chat_id)
                    .entity("subscription", subscription.id)
                    .payload(serde_json::json!({
                        "plan": plan_code,
                        "months": months,
                        "expires_at": subscription.expires_at,
                    })),
            )
            .await?;

        tx.commit().await?;
        Ok(subscription)
    }

    /// Pause the current subscription. Returns false when the company has
    /// no subscription at all; nothing to pause is a valid outcome, not an
    /// error. Status checks are the caller's concern at this level.
    #[tracing::instrument(skip(self))]
    pub async fn pause_subscription(
        &self,
        company_id: Uuid,
        actor_chat_id: Option<i64>,
    ) -> Result<bool, AppError> {
        self.transition_latest(
            company_id,
            SubscriptionStatus::Paused,
            AuditAction::SubscriptionPaused,
            actor_chat_id,
        )
        .await
    }

    /// Resume the current subscription; counterpart of `pause_subscription`.
    #[tracing::instrument(skip(self))]
    pub async fn resume_subscription(
        &self,
        company_id: Uuid,
        actor_chat_id: Option<i64>,
    ) -> Result<bool, AppError> {
        self.transition_latest(
            company_id,
            SubscriptionStatus::Active,
            AuditAction::SubscriptionResumed,
            actor_chat_id,
        )
        .await
    }

    /// Cancel the current subscription (terminal).
    #[tracing::instrument(skip(self))]
    pub async fn cancel_subscription(
        &self,
        company_id: Uuid,
        actor_chat_id: Option<i64>,
    ) -> Result<bool, AppError> {
        self.transition_latest(
            company_id,
            SubscriptionStatus::Canceled,
            AuditAction::SubscriptionCanceled,
            actor_chat_id,
        )
        .await
    }

    async fn transition_latest(
        &self,
        company_id: Uuid,
        status: SubscriptionStatus,
        action: AuditAction,
        actor_chat_id: Option<i64>,
    ) -> Result<bool, AppError> {
        let mut tx = TransactionGuard::begin(&self.pool).await?;

        let Some(current) = self
            .subscriptions
            .latest_by_company_tx(&mut tx, company_id)
            .await?
        else {
            tx.rollback().await?;
            return Ok(false);
        };

        let updated = self
            .subscriptions
            .set_status_tx(&mut tx, current.id, status, actor_chat_id)
            .await?;

        self.audit
            .append_tx(
                &mut tx,
                &NewAuditEvent::new(action)
                    .company(company_id)
                    .actor(actor_chat_id)
                    .entity("subscription", updated.id)
                    .payload(serde_json::json!({"status": status})),
            )
            .await?;

        tx.commit().await?;
        Ok(true)
    }

    /// The authoritative verdict: trial OR subscription active at `now`.
    /// Pure read; the gate calls this on every request.
    #[tracing::instrument(skip(self))]
    pub async fn get_entitlement_status(
        &self,
        company_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<EntitlementStatus, AppError> {
        let trial = self.trials.get_by_company(company_id).await?;
        let subscription = self.subscriptions.latest_by_company(company_id).await?;
        Ok(evaluate_entitlement(trial.as_ref(), subscription.as_ref(), now))
    }

    /// Plan catalog, for the front end's subscription menu.
    #[tracing::instrument(skip(self))]
    pub async fn list_plans(&self) -> Result<Vec<Plan>, AppError> {
        self.plans.list().await
    }

    /// Idempotent expiry: flip the current subscription to `expired` only
    /// when it is still `active` past its expiry. Safe to call repeatedly;
    /// once flipped, the predicate no longer matches.
    #[tracing::instrument(skip(self))]
    pub async fn mark_expired_if_needed(
        &self,
        company_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let mut tx = TransactionGuard::begin(&self.pool).await?;

        let Some(current) = self
            .subscriptions
            .latest_by_company_tx(&mut tx, company_id)
            .await?
        else {
            tx.rollback().await?;
            return Ok(false);
        };

        if !current.is_expired_at(now) {
            tx.rollback().await?;
            return Ok(false);
        }

        self.subscriptions
            .set_status_tx(&mut tx, current.id, SubscriptionStatus::Expired, None)
            .await?;

        self.audit
            .append_tx(
                &mut tx,
                &NewAuditEvent::new(AuditAction::SubscriptionExpired)
                    .company(company_id)
                    .entity("subscription", current.id)
                    .payload(serde_json::json!({"expires_at": current.expires_at})),
            )
            .await?;

        tx.commit().await?;
        Ok(true)
    }
}
