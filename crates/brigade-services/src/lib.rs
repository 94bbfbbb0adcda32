//! Brigade Services
//!
//! Business services over the database layer: company onboarding, the
//! trial and subscription managers, the entitlement gate, and the task
//! workflow engine. Every state-changing operation commits its audit
//! event in the same transaction as the mutation.

pub mod services;

pub use services::{
    CompanyService, DenyReason, EntitlementDecision, EntitlementGate, SubscriptionService,
    TaskWorkflowService, TrialService,
};
