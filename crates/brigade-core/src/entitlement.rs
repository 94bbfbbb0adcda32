//! Entitlement verdict evaluation.
//!
//! The verdict is a pure function of the stored trial row, the company's
//! current subscription row, and `now`. Nothing here mutates state; expiry
//! transitions belong to the reconciliation loop alone, so this can be
//! called at arbitrary frequency on the request path.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Subscription, SubscriptionStatus, Trial};

/// Trial portion of the verdict.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrialSummary {
    pub exists: bool,
    pub is_active: bool,
    pub starts_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Subscription portion of the verdict.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubscriptionSummary {
    pub exists: bool,
    pub status: Option<SubscriptionStatus>,
    pub starts_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub plan_id: Option<Uuid>,
}

/// The authoritative answer to "does this company have access right now".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EntitlementStatus {
    pub available: bool,
    pub trial: TrialSummary,
    pub subscription: SubscriptionSummary,
}

/// Combine trial and current subscription into the verdict.
///
/// Access is granted by either condition: a trial the loop has not yet
/// deactivated still counts even when a paid subscription is also live.
pub fn evaluate_entitlement(
    trial: Option<&Trial>,
    subscription: Option<&Subscription>,
    now: DateTime<Utc>,
) -> EntitlementStatus {
    let trial_active = trial.map(|t| t.is_active_at(now)).unwrap_or(false);
    let subscription_active = subscription.map(|s| s.is_active_at(now)).unwrap_or(false);

    EntitlementStatus {
        available: trial_active || subscription_active,
        trial: TrialSummary {
            exists: trial.is_some(),
            is_active: trial_active,
            starts_at: trial.map(|t| t.starts_at),
            expires_at: trial.map(|t| t.expires_at),
        },
        subscription: SubscriptionSummary {
            exists: subscription.is_some(),
            status: subscription.map(|s| s.status),
            starts_at: subscription.map(|s| s.starts_at),
            expires_at: subscription.map(|s| s.expires_at),
            plan_id: subscription.map(|s| s.plan_id),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn trial(now: DateTime<Utc>, expires_in_days: i64, is_active: bool) -> Trial {
        Trial {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            starts_at: now - Duration::days(1),
            expires_at: now + Duration::days(expires_in_days),
            is_active,
            created_by: None,
            created_at: now - Duration::days(1),
            updated_at: now - Duration::days(1),
        }
    }

    fn subscription(
        now: DateTime<Utc>,
        status: SubscriptionStatus,
        expires_in_days: i64,
    ) -> Subscription {
        Subscription {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            plan_id: Uuid::new_v4(),
            status,
            starts_at: now - Duration::days(1),
            expires_at: now + Duration::days(expires_in_days),
            created_by: None,
            updated_by: None,
            created_at: now - Duration::days(1),
            updated_at: now - Duration::days(1),
        }
    }

    #[test]
    fn no_rows_means_no_access() {
        let status = evaluate_entitlement(None, None, Utc::now());
        assert!(!status.available);
        assert!(!status.trial.exists);
        assert!(!status.subscription.exists);
    }

    #[test]
    fn live_trial_alone_grants_access() {
        let now = Utc::now();
        let t = trial(now, 7, true);
        let status = evaluate_entitlement(Some(&t), None, now);
        assert!(status.available);
        assert!(status.trial.is_active);
        assert_eq!(status.trial.expires_at, Some(t.expires_at));
    }

    #[test]
    fn active_subscription_alone_grants_access() {
        let now = Utc::now();
        let s = subscription(now, SubscriptionStatus::Active, 20);
        let status = evaluate_entitlement(None, Some(&s), now);
        assert!(status.available);
        assert_eq!(status.subscription.status, Some(SubscriptionStatus::Active));
        assert_eq!(status.subscription.plan_id, Some(s.plan_id));
    }

    #[test]
    fn verdict_is_permissive_when_both_are_live() {
        // Possible between reconciliation runs; either condition grants.
        let now = Utc::now();
        let t = trial(now, 2, true);
        let s = subscription(now, SubscriptionStatus::Active, 20);
        let status = evaluate_entitlement(Some(&t), Some(&s), now);
        assert!(status.available);
        assert!(status.trial.is_active);
    }

    #[test]
    fn paused_subscription_and_dead_trial_deny_access() {
        let now = Utc::now();
        let t = trial(now, -1, true);
        let s = subscription(now, SubscriptionStatus::Paused, 20);
        let status = evaluate_entitlement(Some(&t), Some(&s), now);
        assert!(!status.available);
        assert!(status.trial.exists);
        assert!(!status.trial.is_active);
        assert_eq!(status.subscription.status, Some(SubscriptionStatus::Paused));
    }

    #[test]
    fn expired_subscription_reports_metadata_without_access() {
        let now = Utc::now();
        let s = subscription(now, SubscriptionStatus::Expired, -3);
        let status = evaluate_entitlement(None, Some(&s), now);
        assert!(!status.available);
        assert!(status.subscription.exists);
        assert_eq!(status.subscription.expires_at, Some(s.expires_at));
    }

    #[test]
    fn evaluation_is_idempotent_for_fixed_now() {
        let now = Utc::now();
        let t = trial(now, 7, true);
        let s = subscription(now, SubscriptionStatus::Active, 20);
        let first = evaluate_entitlement(Some(&t), Some(&s), now);
        let second = evaluate_entitlement(Some(&t), Some(&s), now);
        assert_eq!(first, second);
    }
}
