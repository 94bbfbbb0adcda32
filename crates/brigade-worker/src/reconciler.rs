//! Reconciliation loop: reminder and enforcement passes over trials and
//! subscriptions, independent of user traffic.
//!
//! One cycle is one database transaction. State transitions and the
//! notification intents they produce commit together; delivery happens
//! later through the outbox dispatcher. On any error the whole cycle rolls
//! back and the next tick retries the same rows, which is safe because the
//! selection predicates stop matching once a row is enforced.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use brigade_core::models::{
    AuditAction, NewAuditEvent, NewNotification, NotificationKind, Subscription,
    SubscriptionStatus, Trial,
};
use brigade_core::AppError;
use brigade_db::{
    AuditLogRepository, MemberRepository, NotificationRepository, SubscriptionRepository,
    TransactionGuard, TrialRepository,
};
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::metrics::ReconcilerMetrics;

#[derive(Clone, Debug)]
pub struct ReconcilerConfig {
    /// Seconds between cycles.
    pub interval_secs: u64,
    /// Days before expiry at which reminders start going out.
    pub remind_window_days: i64,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            interval_secs: 3600,
            remind_window_days: 3,
        }
    }
}

/// Counts of work done in one cycle.
#[derive(Debug, Default, Clone, Copy)]
pub struct CycleReport {
    pub reminders_enqueued: u64,
    pub trials_expired: u64,
    pub subscriptions_expired: u64,
}

/// Handle to a running reconciler. Shutdown finishes or abandons the
/// in-flight cycle; an abandoned cycle's transaction rolls back, so no
/// half-applied batch survives.
pub struct ReconcilerHandle {
    shutdown_tx: mpsc::Sender<()>,
    join: JoinHandle<()>,
}

impl ReconcilerHandle {
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        if let Err(e) = self.join.await {
            tracing::error!(error = %e, "Reconciler task panicked");
        }
    }
}

pub struct Reconciler {
    pool: PgPool,
    trials: TrialRepository,
    subscriptions: SubscriptionRepository,
    members: MemberRepository,
    notifications: NotificationRepository,
    audit: AuditLogRepository,
    config: ReconcilerConfig,
    metrics: Arc<ReconcilerMetrics>,
}

impl Reconciler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        pool: PgPool,
        trials: TrialRepository,
        subscriptions: SubscriptionRepository,
        members: MemberRepository,
        notifications: NotificationRepository,
        audit: AuditLogRepository,
        config: ReconcilerConfig,
        metrics: Arc<ReconcilerMetrics>,
    ) -> Self {
        Self {
            pool,
            trials,
            subscriptions,
            members,
            notifications,
            audit,
            config,
            metrics,
        }
    }

    /// Start the background loop. Runs one cycle immediately, then on the
    /// configured interval until shutdown.
    pub fn start(self: Arc<Self>) -> ReconcilerHandle {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        let join = tokio::spawn(async move {
            tracing::info!(
                interval_secs = self.config.interval_secs,
                remind_window_days = self.config.remind_window_days,
                "Reconciliation loop started"
            );

            let mut interval =
                tokio::time::interval(StdDuration::from_secs(self.config.interval_secs));
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        self.metrics.record_cycle();
                        match self.run_cycle(Utc::now()).await {
                            Ok(report) => {
                                self.metrics.record_reminders(report.reminders_enqueued);
                                self.metrics.record_trials_expired(report.trials_expired);
                                self.metrics.record_subscriptions_expired(report.subscriptions_expired);
                                tracing::info!(
                                    reminders = report.reminders_enqueued,
                                    trials_expired = report.trials_expired,
                                    subscriptions_expired = report.subscriptions_expired,
                                    "Reconciliation cycle completed"
                                );
                            }
                            Err(e) => {
                                self.metrics.record_cycle_failure();
                                tracing::error!(error = %e, "Reconciliation cycle failed, will retry on next tick");
                            }
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        tracing::info!("Reconciliation loop shutting down");
                        break;
                    }
                }
            }

            tracing::info!("Reconciliation loop stopped");
        });

        ReconcilerHandle { shutdown_tx, join }
    }

    /// One full cycle at `now`: reminder pass, then enforcement pass, one
    /// commit. Public so operators can trigger a cycle out of schedule.
    #[tracing::instrument(skip(self))]
    pub async fn run_cycle(&self, now: DateTime<Utc>) -> Result<CycleReport, AppError> {
        let window_end = now + Duration::days(self.config.remind_window_days);
        let mut report = CycleReport::default();
        let mut tx = TransactionGuard::begin(&self.pool).await?;

        // Reminder pass
        for trial in self.trials.list_expiring_tx(&mut tx, now, window_end).await? {
            report.reminders_enqueued += self
                .fan_out(
                    &mut tx,
                    trial.company_id,
                    NotificationKind::TrialReminder,
                    trial_reminder_body(&trial),
                )
                .await?;
        }
        for subscription in self
            .subscriptions
            .list_expiring_tx(&mut tx, now, window_end)
            .await?
        {
            report.reminders_enqueued += self
                .fan_out(
                    &mut tx,
                    subscription.company_id,
                    NotificationKind::SubscriptionReminder,
                    subscription_reminder_body(&subscription),
                )
                .await?;
        }

        // Enforcement pass
        for trial in self.trials.list_expired_tx(&mut tx, now).await? {
            self.trials.deactivate_tx(&mut tx, trial.company_id).await?;
            self.audit
                .append_tx(
                    &mut tx,
                    &NewAuditEvent::new(AuditAction::TrialExpired)
                        .company(trial.company_id)
                        .entity("trial", trial.id)
                        .payload(serde_json::json!({"expires_at": trial.expires_at})),
                )
                .await?;
            self.fan_out(
                &mut tx,
                trial.company_id,
                NotificationKind::TrialExpired,
                trial_expired_body(&trial),
            )
            .await?;
            report.trials_expired += 1;
        }

        for subscription in self.subscriptions.list_expired_tx(&mut tx, now).await? {
            self.subscriptions
                .set_status_tx(&mut tx, subscription.id, SubscriptionStatus::Expired, None)
                .await?;
            self.audit
                .append_tx(
                    &mut tx,
                    &NewAuditEvent::new(AuditAction::SubscriptionExpired)
                        .company(subscription.company_id)
                        .entity("subscription", subscription.id)
                        .payload(serde_json::json!({"expires_at": subscription.expires_at})),
                )
                .await?;
            self.fan_out(
                &mut tx,
                subscription.company_id,
                NotificationKind::SubscriptionExpired,
                subscription_expired_body(&subscription),
            )
            .await?;
            report.subscriptions_expired += 1;
        }

        tx.commit().await?;
        Ok(report)
    }

    /// Enqueue one notification per admin/manager of the company. Returns
    /// the number of rows enqueued.
    async fn fan_out(
        &self,
        tx: &mut TransactionGuard<'_>,
        company_id: uuid::Uuid,
        kind: NotificationKind,
        body: String,
    ) -> Result<u64, AppError> {
        let contacts = self.members.list_billing_contacts_tx(tx, company_id).await?;
        if contacts.is_empty() {
            tracing::warn!(company_id = %company_id, kind = %kind, "No billing contacts to notify");
            return Ok(0);
        }

        let mut enqueued = 0;
        for contact in contacts {
            self.notifications
                .enqueue_tx(
                    tx,
                    &NewNotification {
                        company_id,
                        chat_id: contact.chat_id,
                        kind,
                        body: body.clone(),
                    },
                )
                .await?;
            enqueued += 1;
        }
        Ok(enqueued)
    }
}

fn trial_reminder_body(trial: &Trial) -> String {
    format!(
        "Trial for company {} ends {}. Extend it or start a subscription.",
        trial.company_id,
        trial.expires_at.format("%Y-%m-%d")
    )
}

fn subscription_reminder_body(subscription: &Subscription) -> String {
    format!(
        "Subscription for company {} expires {}. Renew to avoid losing access.",
        subscription.company_id,
        subscription.expires_at.format("%Y-%m-%d")
    )
}

fn trial_expired_body(trial: &Trial) -> String {
    format!(
        "Trial for company {} has ended. Access is restricted.",
        trial.company_id
    )
}

fn subscription_expired_body(subscription: &Subscription) -> String {
    format!(
        "Subscription for company {} has expired. Access is restricted.",
        subscription.company_id
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn sample_trial(expires_at: DateTime<Utc>) -> Trial {
        Trial {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            starts_at: expires_at - Duration::days(14),
            expires_at,
            is_active: true,
            created_by: None,
            created_at: expires_at - Duration::days(14),
            updated_at: expires_at - Duration::days(14),
        }
    }

    #[test]
    fn default_config_matches_daily_billing_cadence() {
        let config = ReconcilerConfig::default();
        assert_eq!(config.interval_secs, 3600);
        assert_eq!(config.remind_window_days, 3);
    }

    #[test]
    fn reminder_body_names_company_and_date() {
        let now = Utc::now();
        let trial = sample_trial(now + Duration::days(2));
        let body = trial_reminder_body(&trial);
        assert!(body.contains(&trial.company_id.to_string()));
        assert!(body.contains(&trial.expires_at.format("%Y-%m-%d").to_string()));
    }

    #[test]
    fn expired_body_announces_restriction() {
        let trial = sample_trial(Utc::now() - Duration::days(1));
        let body = trial_expired_body(&trial);
        assert!(body.contains("Access is restricted"));
        assert!(body.contains(&trial.company_id.to_string()));
    }
}
