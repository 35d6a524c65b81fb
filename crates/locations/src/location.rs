use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crossdock_core::{DomainError, Entity, EntityId, OrgId};

/// Location identifier (org-scoped via the `org_id` field on the entity).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationId(pub EntityId);

impl LocationId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for LocationId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl core::str::FromStr for LocationId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// Kind of stock-holding location.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationKind {
    Branch,
    Warehouse,
}

/// Entity: a Branch or Warehouse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub org_id: OrgId,
    pub name: String,
    pub kind: LocationKind,
    pub created_at: DateTime<Utc>,
}

impl Location {
    pub fn new(
        id: LocationId,
        org_id: OrgId,
        name: impl Into<String>,
        kind: LocationKind,
        created_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("location name cannot be empty"));
        }
        Ok(Self {
            id,
            org_id,
            name,
            kind,
            created_at,
        })
    }

    pub fn is_branch(&self) -> bool {
        self.kind == LocationKind::Branch
    }
}

impl Entity for Location {
    type Id = LocationId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_name() {
        let err = Location::new(
            LocationId::new(EntityId::new()),
            OrgId::new(),
            "   ",
            LocationKind::Branch,
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn branch_and_warehouse_are_distinct_kinds() {
        let branch = Location::new(
            LocationId::new(EntityId::new()),
            OrgId::new(),
            "Main Street",
            LocationKind::Branch,
            Utc::now(),
        )
        .unwrap();
        let warehouse = Location::new(
            LocationId::new(EntityId::new()),
            OrgId::new(),
            "Central Depot",
            LocationKind::Warehouse,
            Utc::now(),
        )
        .unwrap();

        assert!(branch.is_branch());
        assert!(!warehouse.is_branch());
    }
}
