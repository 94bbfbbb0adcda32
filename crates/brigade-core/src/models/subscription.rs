use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use uuid::Uuid;

/// Subscription status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "subscription_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Trial,
    Active,
    Paused,
    Canceled,
    Expired,
}

impl SubscriptionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SubscriptionStatus::Canceled | SubscriptionStatus::Expired)
    }
}

impl Display for SubscriptionStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            SubscriptionStatus::Trial => write!(f, "trial"),
            SubscriptionStatus::Active => write!(f, "active"),
            SubscriptionStatus::Paused => write!(f, "paused"),
            SubscriptionStatus::Canceled => write!(f, "canceled"),
            SubscriptionStatus::Expired => write!(f, "expired"),
        }
    }
}

impl FromStr for SubscriptionStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "trial" => Ok(SubscriptionStatus::Trial),
            "active" => Ok(SubscriptionStatus::Active),
            "paused" => Ok(SubscriptionStatus::Paused),
            "canceled" => Ok(SubscriptionStatus::Canceled),
            "expired" => Ok(SubscriptionStatus::Expired),
            _ => Err(anyhow::anyhow!("Invalid subscription status: {}", s)),
        }
    }
}

/// Paid access record. Subscriptions are append-only history per company:
/// the current one is the row with the latest expiry, and older rows are
/// never touched once a newer one exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Subscription {
    pub id: Uuid,
    pub company_id: Uuid,
    pub plan_id: Uuid,
    pub status: SubscriptionStatus,
    pub starts_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub created_by: Option<i64>,
    pub updated_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fixed 30-day month convention for paid periods, not calendar-accurate.
pub const DAYS_PER_BILLING_MONTH: i64 = 30;

/// Expiry instant for a paid period of `months` starting at `now`.
pub fn paid_period_end(now: DateTime<Utc>, months: i64) -> DateTime<Utc> {
    now + Duration::days(DAYS_PER_BILLING_MONTH * months)
}

impl Subscription {
    /// Pure validity predicate: the subscription grants access at `now`.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.status == SubscriptionStatus::Active && self.expires_at > now
    }

    /// Enforcement-pass predicate: still marked active but past expiry.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.status == SubscriptionStatus::Active && self.expires_at <= now
    }

    /// Reminder-pass predicate: active and expiring within `[now, now + window]`.
    pub fn expires_within(&self, now: DateTime<Utc>, window: Duration) -> bool {
        self.status == SubscriptionStatus::Active
            && self.expires_at >= now
            && self.expires_at <= now + window
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subscription(status: SubscriptionStatus, expires_at: DateTime<Utc>) -> Subscription {
        let starts = expires_at - Duration::days(30);
        Subscription {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            plan_id: Uuid::new_v4(),
            status,
            starts_at: starts,
            expires_at,
            created_by: None,
            updated_by: None,
            created_at: starts,
            updated_at: starts,
        }
    }

    #[test]
    fn only_active_unexpired_grants_access() {
        let now = Utc::now();
        let future = now + Duration::days(10);
        assert!(subscription(SubscriptionStatus::Active, future).is_active_at(now));
        assert!(!subscription(SubscriptionStatus::Paused, future).is_active_at(now));
        assert!(!subscription(SubscriptionStatus::Canceled, future).is_active_at(now));
        assert!(!subscription(SubscriptionStatus::Expired, future).is_active_at(now));
        assert!(!subscription(SubscriptionStatus::Active, now).is_active_at(now));
    }

    #[test]
    fn enforcement_predicate_only_matches_active_rows() {
        let now = Utc::now();
        let past = now - Duration::hours(1);
        assert!(subscription(SubscriptionStatus::Active, past).is_expired_at(now));
        // Already expired rows stop matching, so repeated enforcement is a no-op.
        assert!(!subscription(SubscriptionStatus::Expired, past).is_expired_at(now));
        assert!(!subscription(SubscriptionStatus::Paused, past).is_expired_at(now));
    }

    #[test]
    fn paid_period_uses_fixed_thirty_day_months() {
        let now = Utc::now();
        assert_eq!(paid_period_end(now, 1), now + Duration::days(30));
        assert_eq!(paid_period_end(now, 12), now + Duration::days(360));
    }

    #[test]
    fn terminal_statuses() {
        assert!(SubscriptionStatus::Canceled.is_terminal());
        assert!(SubscriptionStatus::Expired.is_terminal());
        assert!(!SubscriptionStatus::Active.is_terminal());
        assert!(!SubscriptionStatus::Paused.is_terminal());
        assert!(!SubscriptionStatus::Trial.is_terminal());
    }

    #[test]
    fn status_round_trips_through_str() {
        for status in [
            SubscriptionStatus::Trial,
            SubscriptionStatus::Active,
            SubscriptionStatus::Paused,
            SubscriptionStatus::Canceled,
            SubscriptionStatus::Expired,
        ] {
            assert_eq!(
                status.to_string().parse::<SubscriptionStatus>().unwrap(),
                status
            );
        }
    }
}
