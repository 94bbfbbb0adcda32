//! Brigade Core Library
//!
//! This crate provides the domain models, lifecycle predicates, entitlement
//! evaluation, error types, and configuration shared across all Brigade
//! components.

pub mod config;
pub mod entitlement;
pub mod error;
pub mod models;
pub mod ports;

// Re-export commonly used types
pub use config::WorkerConfig;
pub use entitlement::{evaluate_entitlement, EntitlementStatus, SubscriptionSummary, TrialSummary};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use ports::{LogNotificationSender, NotificationSender};
