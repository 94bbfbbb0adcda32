//! Configuration module
//!
//! Environment-driven configuration for the worker and services. Every knob
//! has an explicit default; only `DATABASE_URL` is required.

use std::env;

use crate::error::AppError;

// Common defaults
const DB_MAX_CONNECTIONS: u32 = 10;
const DB_TIMEOUT_SECS: u64 = 30;
const TRIAL_DAYS_DEFAULT: i64 = 14;
const BILLING_REMIND_DAYS: i64 = 3;
const RECONCILE_INTERVAL_SECS: u64 = 3600;
const NOTIFY_POLL_INTERVAL_SECS: u64 = 5;
const NOTIFY_BATCH_SIZE: i64 = 50;
const NOTIFY_MAX_ATTEMPTS: i32 = 3;

/// Configuration for the worker binary and the services it hosts.
#[derive(Clone, Debug)]
pub struct WorkerConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    /// Length of the trial granted at company creation.
    pub trial_days_default: i64,
    /// Days before expiry at which billing reminders start.
    pub billing_remind_days: i64,
    /// Seconds between reconciliation cycles.
    pub reconcile_interval_secs: u64,
    /// Seconds between notification dispatcher polls.
    pub notify_poll_interval_secs: u64,
    /// Pending notifications claimed per dispatcher poll.
    pub notify_batch_size: i64,
    /// Delivery attempts before an outbox row is marked failed.
    pub notify_max_attempts: i32,
    pub environment: String,
}

impl WorkerConfig {
    /// Build the configuration from process environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| AppError::InvalidArgument("DATABASE_URL is not set".to_string()))?;

        let config = Self {
            database_url,
            db_max_connections: parse_env("DB_MAX_CONNECTIONS", DB_MAX_CONNECTIONS)?,
            db_timeout_seconds: parse_env("DB_TIMEOUT_SECONDS", DB_TIMEOUT_SECS)?,
            trial_days_default: parse_env("TRIAL_DAYS_DEFAULT", TRIAL_DAYS_DEFAULT)?,
            billing_remind_days: parse_env("BILLING_REMIND_DAYS", BILLING_REMIND_DAYS)?,
            reconcile_interval_secs: parse_env("RECONCILE_INTERVAL_SECS", RECONCILE_INTERVAL_SECS)?,
            notify_poll_interval_secs: parse_env(
                "NOTIFY_POLL_INTERVAL_SECS",
                NOTIFY_POLL_INTERVAL_SECS,
            )?,
            notify_batch_size: parse_env("NOTIFY_BATCH_SIZE", NOTIFY_BATCH_SIZE)?,
            notify_max_attempts: parse_env("NOTIFY_MAX_ATTEMPTS", NOTIFY_MAX_ATTEMPTS)?,
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.trial_days_default <= 0 {
            return Err(AppError::InvalidArgument(
                "TRIAL_DAYS_DEFAULT must be positive".to_string(),
            ));
        }
        if self.billing_remind_days < 0 {
            return Err(AppError::InvalidArgument(
                "BILLING_REMIND_DAYS must not be negative".to_string(),
            ));
        }
        if self.reconcile_interval_secs == 0 {
            return Err(AppError::InvalidArgument(
                "RECONCILE_INTERVAL_SECS must be positive".to_string(),
            ));
        }
        if self.notify_batch_size <= 0 {
            return Err(AppError::InvalidArgument(
                "NOTIFY_BATCH_SIZE must be positive".to_string(),
            ));
        }
        if self.notify_max_attempts <= 0 {
            return Err(AppError::InvalidArgument(
                "NOTIFY_MAX_ATTEMPTS must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T, AppError> {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| AppError::InvalidArgument(format!("{} has an invalid value", key))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> WorkerConfig {
        WorkerConfig {
            database_url: "postgres://localhost/brigade".to_string(),
            db_max_connections: DB_MAX_CONNECTIONS,
            db_timeout_seconds: DB_TIMEOUT_SECS,
            trial_days_default: TRIAL_DAYS_DEFAULT,
            billing_remind_days: BILLING_REMIND_DAYS,
            reconcile_interval_secs: RECONCILE_INTERVAL_SECS,
            notify_poll_interval_secs: NOTIFY_POLL_INTERVAL_SECS,
            notify_batch_size: NOTIFY_BATCH_SIZE,
            notify_max_attempts: NOTIFY_MAX_ATTEMPTS,
            environment: "test".to_string(),
        }
    }

    #[test]
    fn defaults_pass_validation() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn rejects_nonpositive_trial_length() {
        let mut config = base_config();
        config.trial_days_default = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_reconcile_interval() {
        let mut config = base_config();
        config.reconcile_interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_nonpositive_notify_batch() {
        let mut config = base_config();
        config.notify_batch_size = 0;
        assert!(config.validate().is_err());
    }
}
