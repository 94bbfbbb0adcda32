use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Static catalog entry a subscription references. Immutable once referenced;
/// the only write path is upsert-by-code.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Plan {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub monthly_price_cents: i32,
    pub period_days: i32,
    pub features: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for a plan catalog upsert.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PlanSpec {
    #[validate(length(min = 1, max = 50))]
    pub code: String,
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(range(min = 0))]
    pub monthly_price_cents: i32,
    #[validate(range(min = 1))]
    pub period_days: i32,
    pub features: serde_json::Value,
}

impl PlanSpec {
    /// Plans shipped by default. Seeded idempotently on worker startup.
    pub fn catalog_defaults() -> Vec<PlanSpec> {
        vec![
            PlanSpec {
                code: "start".to_string(),
                name: "Start".to_string(),
                monthly_price_cents: 190_000,
                period_days: 30,
                features: serde_json::json!({"projects": 3, "file_uploads": true}),
            },
            PlanSpec {
                code: "pro".to_string(),
                name: "Pro".to_string(),
                monthly_price_cents: 490_000,
                period_days: 30,
                features: serde_json::json!({"projects": null, "file_uploads": true, "reports": true}),
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_specs_are_valid() {
        for spec in PlanSpec::catalog_defaults() {
            assert!(spec.validate().is_ok(), "invalid default plan {}", spec.code);
        }
    }

    #[test]
    fn rejects_empty_code_and_nonpositive_period() {
        let spec = PlanSpec {
            code: String::new(),
            name: "Broken".to_string(),
            monthly_price_cents: -1,
            period_days: 0,
            features: serde_json::json!({}),
        };
        let errs = spec.validate().unwrap_err();
        assert!(errs.field_errors().contains_key("code"));
        assert!(errs.field_errors().contains_key("monthly_price_cents"));
        assert!(errs.field_errors().contains_key("period_days"));
    }
}
