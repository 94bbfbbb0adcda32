use brigade_core::models::CompanyStatus;
use brigade_core::AppError;
use brigade_db::CompanyRepository;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::services::subscriptions::SubscriptionService;

/// Stable reason codes for a denial, rendered by the bot front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// The caller is not attached to any (live) company.
    NoCompany,
    /// The company has neither an active trial nor an active subscription.
    NoEntitlement,
}

impl DenyReason {
    pub fn code(&self) -> &'static str {
        match self {
            DenyReason::NoCompany => "no_company",
            DenyReason::NoEntitlement => "no_entitlement",
        }
    }
}

/// Outcome of the gate check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntitlementDecision {
    Allow,
    Deny(DenyReason),
}

impl EntitlementDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, EntitlementDecision::Allow)
    }
}

/// Synchronous guard invoked before any gated action. Read-only by design:
/// expiry transitions belong to the reconciliation loop, so this can run at
/// arbitrary request frequency without write contention.
#[derive(Clone)]
pub struct EntitlementGate {
    companies: CompanyRepository,
    subscriptions: SubscriptionService,
}

impl EntitlementGate {
    pub fn new(companies: CompanyRepository, subscriptions: SubscriptionService) -> Self {
        Self {
            companies,
            subscriptions,
        }
    }

    /// Check whether the tenant may execute a gated action at `now`.
    #[tracing::instrument(skip(self))]
    pub async fn check(
        &self,
        company_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<EntitlementDecision, AppError> {
        let Some(company_id) = company_id else {
            return Ok(EntitlementDecision::Deny(DenyReason::NoCompany));
        };

        let company = match self.companies.get_by_id(company_id).await? {
            Some(company) if company.status != CompanyStatus::Deleted => company,
            _ => return Ok(EntitlementDecision::Deny(DenyReason::NoCompany)),
        };

        let status = self
            .subscriptions
            .get_entitlement_status(company.id, now)
            .await?;

        if status.available {
            Ok(EntitlementDecision::Allow)
        } else {
            tracing::debug!(company_id = %company.id, "Entitlement check denied");
            Ok(EntitlementDecision::Deny(DenyReason::NoEntitlement))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deny_reason_codes_are_stable() {
        assert_eq!(DenyReason::NoCompany.code(), "no_company");
        assert_eq!(DenyReason::NoEntitlement.code(), "no_entitlement");
    }

    #[test]
    fn only_allow_is_allowed() {
        assert!(EntitlementDecision::Allow.is_allowed());
        assert!(!EntitlementDecision::Deny(DenyReason::NoCompany).is_allowed());
        assert!(!EntitlementDecision::Deny(DenyReason::NoEntitlement).is_allowed());
    }
}
