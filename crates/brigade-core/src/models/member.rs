use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use uuid::Uuid;

/// Role of a user inside a company. Billing reminders fan out to admins
/// and managers only.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "member_role", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Admin,
    Manager,
    Foreman,
    Worker,
}

impl MemberRole {
    /// Roles that receive billing reminders and blocking notifications.
    pub fn is_billing_contact(&self) -> bool {
        matches!(self, MemberRole::Admin | MemberRole::Manager)
    }
}

impl Display for MemberRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            MemberRole::Admin => write!(f, "admin"),
            MemberRole::Manager => write!(f, "manager"),
            MemberRole::Foreman => write!(f, "foreman"),
            MemberRole::Worker => write!(f, "worker"),
        }
    }
}

impl FromStr for MemberRole {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(MemberRole::Admin),
            "manager" => Ok(MemberRole::Manager),
            "foreman" => Ok(MemberRole::Foreman),
            "worker" => Ok(MemberRole::Worker),
            _ => Err(anyhow::anyhow!("Invalid member role: {}", s)),
        }
    }
}

/// Membership of a chat user in a company.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CompanyMember {
    pub id: Uuid,
    pub company_id: Uuid,
    /// Opaque messenger chat id delivered by the front end.
    pub chat_id: i64,
    pub role: MemberRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn billing_contacts_are_admin_and_manager() {
        assert!(MemberRole::Admin.is_billing_contact());
        assert!(MemberRole::Manager.is_billing_contact());
        assert!(!MemberRole::Foreman.is_billing_contact());
        assert!(!MemberRole::Worker.is_billing_contact());
    }

    #[test]
    fn role_round_trips_through_str() {
        for role in [
            MemberRole::Admin,
            MemberRole::Manager,
            MemberRole::Foreman,
            MemberRole::Worker,
        ] {
            assert_eq!(role.to_string().parse::<MemberRole>().unwrap(), role);
        }
        assert!("client".parse::<MemberRole>().is_err());
    }
}
