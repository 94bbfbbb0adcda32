pub mod companies;
pub mod entitlement;
pub mod subscriptions;
pub mod trials;
pub mod workflow;

pub use companies::CompanyService;
pub use entitlement::{DenyReason, EntitlementDecision, EntitlementGate};
pub use subscriptions::SubscriptionService;
pub use trials::TrialService;
pub use workflow::TaskWorkflowService;
