use serde::{Deserialize, Serialize};

use crossdock_core::UserId;
use crossdock_locations::LocationId;

use crate::roles::ActorRole;

/// An authenticated actor with the locations they manage.
///
/// `managed_locations` only matters for `Manager`; elevated roles have
/// authority everywhere within the org.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: UserId,
    pub role: ActorRole,
    pub managed_locations: Vec<LocationId>,
}

impl Actor {
    pub fn new(user_id: UserId, role: ActorRole, managed_locations: Vec<LocationId>) -> Self {
        Self {
            user_id,
            role,
            managed_locations,
        }
    }

    pub fn is_elevated(&self) -> bool {
        self.role.is_elevated()
    }

    /// Branch-management authority over one location.
    pub fn has_location_authority(&self, location: LocationId) -> bool {
        if self.is_elevated() {
            return true;
        }
        self.role == ActorRole::Manager && self.managed_locations.contains(&location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossdock_core::EntityId;

    fn loc() -> LocationId {
        LocationId::new(EntityId::new())
    }

    #[test]
    fn elevated_roles_have_authority_everywhere() {
        let admin = Actor::new(UserId::new(), ActorRole::Admin, vec![]);
        assert!(admin.has_location_authority(loc()));
        assert!(admin.is_elevated());
    }

    #[test]
    fn manager_authority_is_scoped_to_managed_locations() {
        let managed = loc();
        let other = loc();
        let manager = Actor::new(UserId::new(), ActorRole::Manager, vec![managed]);

        assert!(manager.has_location_authority(managed));
        assert!(!manager.has_location_authority(other));
        assert!(!manager.is_elevated());
    }

    #[test]
    fn cashier_has_no_branch_authority() {
        let location = loc();
        let cashier = Actor::new(UserId::new(), ActorRole::Cashier, vec![location]);
        assert!(!cashier.has_location_authority(location));
    }
}
