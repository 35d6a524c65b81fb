use serde::{Deserialize, Serialize};

use crossdock_core::DomainError;

/// Role of an authenticated actor, as asserted by the upstream auth layer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Owner,
    Admin,
    Manager,
    Cashier,
}

impl ActorRole {
    /// Owner/admin class: unrestricted across the organization's locations.
    pub fn is_elevated(self) -> bool {
        matches!(self, ActorRole::Owner | ActorRole::Admin)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ActorRole::Owner => "owner",
            ActorRole::Admin => "admin",
            ActorRole::Manager => "manager",
            ActorRole::Cashier => "cashier",
        }
    }
}

impl core::fmt::Display for ActorRole {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for ActorRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(ActorRole::Owner),
            "admin" => Ok(ActorRole::Admin),
            "manager" => Ok(ActorRole::Manager),
            "cashier" => Ok(ActorRole::Cashier),
            other => Err(DomainError::validation(format!("unknown role: {other}"))),
        }
    }
}
