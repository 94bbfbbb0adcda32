//! Brigade Worker
//!
//! The background side of the system: the reconciliation loop that enforces
//! trial/subscription expiry and enqueues reminders, and the dispatcher that
//! delivers queued notifications. Both run independently of user traffic.

pub mod dispatcher;
pub mod metrics;
pub mod reconciler;

pub use dispatcher::{DispatcherConfig, NotificationDispatcher};
pub use metrics::{MetricsSnapshot, ReconcilerMetrics};
pub use reconciler::{Reconciler, ReconcilerConfig};
