//! Roles and status enums.

use serde::{Deserialize, Serialize};

/// Account role carried in the session token.
///
/// Serialized exactly as the backend spells it (`"Owner"`, `"Employee"`,
/// `"Customer"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    /// Store owner. Full access to the admin area.
    Owner,
    /// Counter staff. Access to the admin area and POS.
    Employee,
    /// Online storefront customer.
    Customer,
}

impl Role {
    /// All roles, in declaration order.
    pub const ALL: [Self; 3] = [Self::Owner, Self::Employee, Self::Customer];

    /// Whether this role belongs to store staff (Owner or Employee).
    #[must_use]
    pub const fn is_privileged(self) -> bool {
        matches!(self, Self::Owner | Self::Employee)
    }

    /// The backend spelling of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Owner => "Owner",
            Self::Employee => "Employee",
            Self::Customer => "Customer",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown role string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid role: {0}")]
pub struct RoleParseError(pub String);

impl std::str::FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Owner" | "owner" => Ok(Self::Owner),
            "Employee" | "employee" => Ok(Self::Employee),
            "Customer" | "customer" => Ok(Self::Customer),
            _ => Err(RoleParseError(s.to_owned())),
        }
    }
}

/// Status of an asynchronous request surfaced to the UI.
///
/// `Loading` always ends in `Success` or `Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

impl RequestStatus {
    /// Whether a request is currently in flight.
    #[must_use]
    pub const fn is_loading(self) -> bool {
        matches!(self, Self::Loading)
    }
}
