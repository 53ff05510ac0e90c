//! Accounts and roles for fretetrack.
//!
//! Access control is a closed set of role variants with explicit capability
//! checks. Credential storage is deliberately plain: hardening the login is
//! out of scope for this system.

use serde::{Deserialize, Serialize};

/// An administrator account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminAccount {
    /// Login name, unique.
    pub username: String,
    /// Plaintext password.
    pub password: String,
}

/// A driver account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Driver {
    /// Stable identifier.
    pub id: String,
    /// Full name, used for login and shown on shipments.
    pub name: String,
    /// Plaintext password.
    pub password: String,
    /// Contact phone, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Who is acting on the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Back-office administrator: full shipment and account management.
    Admin,
    /// Driver: position reports and expenses on their shipments.
    Driver,
    /// Anonymous customer: read-only tracking by code.
    Customer,
}

impl Role {
    /// Whether this role may create, edit, or remove shipments and accounts.
    #[must_use]
    pub fn can_manage_shipments(&self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Whether this role may push GPS position updates and expenses.
    #[must_use]
    pub fn can_report_position(&self) -> bool {
        matches!(self, Self::Admin | Self::Driver)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::Driver => write!(f, "driver"),
            Self::Customer => write!(f, "customer"),
        }
    }
}
