use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Time-boxed grace period granted once per company. At most one row per
/// company exists at any time; extension mutates the row in place, expiry
/// and paid-subscription activation flip `is_active` off without deleting it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Trial {
    pub id: Uuid,
    pub company_id: Uuid,
    pub starts_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub is_active: bool,
    pub created_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Trial {
    /// Pure validity predicate: the trial grants access at `now`.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.expires_at > now
    }

    /// True once the trial has crossed its expiry while still flagged active;
    /// this is the enforcement-pass predicate.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.expires_at <= now
    }

    /// True when the trial is still active and expires within
    /// `[now, now + window]`; this is the reminder-pass predicate.
    pub fn expires_within(&self, now: DateTime<Utc>, window: Duration) -> bool {
        self.is_active && self.expires_at >= now && self.expires_at <= now + window
    }

    /// New expiry after extending by `extra_days`. Extension never shortens:
    /// the base is the current expiry or `now`, whichever is later.
    pub fn extended_expiry(&self, now: DateTime<Utc>, extra_days: i64) -> DateTime<Utc> {
        let base = if self.expires_at > now {
            self.expires_at
        } else {
            now
        };
        base + Duration::days(extra_days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trial_expiring_at(expires_at: DateTime<Utc>, is_active: bool) -> Trial {
        let now = expires_at - Duration::days(14);
        Trial {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            starts_at: now,
            expires_at,
            is_active,
            created_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn active_before_expiry_inactive_after() {
        let now = Utc::now();
        let trial = trial_expiring_at(now + Duration::days(3), true);
        assert!(trial.is_active_at(now));
        assert!(!trial.is_active_at(now + Duration::days(3)));
        assert!(!trial.is_active_at(now + Duration::days(4)));
    }

    #[test]
    fn deactivated_trial_never_grants_access() {
        let now = Utc::now();
        let trial = trial_expiring_at(now + Duration::days(3), false);
        assert!(!trial.is_active_at(now));
        assert!(!trial.is_expired_at(now + Duration::days(4)));
    }

    #[test]
    fn enforcement_predicate_matches_only_stale_active_rows() {
        let now = Utc::now();
        let trial = trial_expiring_at(now - Duration::hours(1), true);
        assert!(trial.is_expired_at(now));

        // Once deactivated the predicate stops matching, which is what makes
        // a second reconciliation pass a no-op.
        let mut flipped = trial.clone();
        flipped.is_active = false;
        assert!(!flipped.is_expired_at(now));
    }

    #[test]
    fn reminder_window_is_inclusive() {
        let now = Utc::now();
        let window = Duration::days(3);
        assert!(trial_expiring_at(now + Duration::days(1), true).expires_within(now, window));
        assert!(trial_expiring_at(now + Duration::days(3), true).expires_within(now, window));
        assert!(!trial_expiring_at(now + Duration::days(4), true).expires_within(now, window));
        assert!(!trial_expiring_at(now - Duration::hours(1), true).expires_within(now, window));
    }

    #[test]
    fn extension_from_live_trial_adds_to_current_expiry() {
        let now = Utc::now();
        let trial = trial_expiring_at(now + Duration::days(5), true);
        assert_eq!(
            trial.extended_expiry(now, 7),
            now + Duration::days(5) + Duration::days(7)
        );
    }

    #[test]
    fn extension_from_lapsed_trial_restarts_from_now() {
        let now = Utc::now();
        let trial = trial_expiring_at(now - Duration::days(10), true);
        assert_eq!(trial.extended_expiry(now, 7), now + Duration::days(7));
    }

    #[test]
    fn extension_is_monotonic() {
        let now = Utc::now();
        let mut trial = trial_expiring_at(now + Duration::days(2), true);
        let mut last = trial.expires_at;
        for days in [1, 5, 2, 30] {
            trial.expires_at = trial.extended_expiry(now, days);
            assert!(trial.expires_at >= last);
            last = trial.expires_at;
        }
    }
}
