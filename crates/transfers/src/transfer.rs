use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crossdock_access::Actor;
use crossdock_core::{DomainError, Entity, EntityId, OrgId};
use crossdock_locations::LocationId;
use crossdock_products::ProductId;

/// Transfer identifier (org-scoped via the `org_id` field on the entity).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransferId(pub EntityId);

impl TransferId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for TransferId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl core::str::FromStr for TransferId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// Transfer status lifecycle. `Received` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    Pending,
    Approved,
    InTransit,
    Received,
    Cancelled,
}

impl TransferStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TransferStatus::Received | TransferStatus::Cancelled)
    }

    /// The full transition table. Everything not listed here is invalid —
    /// including re-entering the current status.
    pub fn can_transition(self, next: TransferStatus) -> bool {
        matches!(
            (self, next),
            (TransferStatus::Pending, TransferStatus::Approved)
                | (TransferStatus::Pending, TransferStatus::Cancelled)
                | (TransferStatus::Approved, TransferStatus::InTransit)
                | (TransferStatus::InTransit, TransferStatus::Received)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TransferStatus::Pending => "pending",
            TransferStatus::Approved => "approved",
            TransferStatus::InTransit => "in_transit",
            TransferStatus::Received => "received",
            TransferStatus::Cancelled => "cancelled",
        }
    }
}

impl core::fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Line item embedded in a transfer.
///
/// `requested` is fixed at creation. `received` is recorded at receipt time
/// and may differ (partial receipt). The `debited`/`credited` markers track
/// which ledger applications have already happened, so a transition retried
/// after a partial failure only applies the remainder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferItem {
    pub product_id: ProductId,
    pub requested: i64,
    /// Unit cost in the smallest currency unit (e.g., cents).
    pub unit_cost: u64,
    pub received: Option<i64>,
    #[serde(default)]
    pub debited: bool,
    #[serde(default)]
    pub credited: bool,
}

impl TransferItem {
    pub fn new(product_id: ProductId, requested: i64, unit_cost: u64) -> Self {
        Self {
            product_id,
            requested,
            unit_cost,
            received: None,
            debited: false,
            credited: false,
        }
    }

    /// Quantity to credit at receipt: the recorded receipt quantity, or the
    /// requested quantity when none was supplied.
    pub fn received_or_requested(&self) -> i64 {
        self.received.unwrap_or(self.requested)
    }
}

/// Entity: a request to move specific quantities between two locations.
///
/// Never physically deleted — cancellation is a terminal status, not a delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub id: TransferId,
    pub org_id: OrgId,
    pub source: LocationId,
    pub destination: LocationId,
    pub items: Vec<TransferItem>,
    pub status: TransferStatus,
    pub reason: Option<String>,
    pub requires_approval: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transfer {
    pub fn new(
        id: TransferId,
        org_id: OrgId,
        source: LocationId,
        destination: LocationId,
        items: Vec<TransferItem>,
        reason: Option<String>,
        requires_approval: bool,
        created_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if source == destination {
            return Err(DomainError::validation(
                "source and destination must differ",
            ));
        }
        if items.is_empty() {
            return Err(DomainError::validation("transfer needs at least one item"));
        }
        if let Some(bad) = items.iter().find(|i| i.requested <= 0) {
            return Err(DomainError::validation(format!(
                "requested quantity must be positive (product {})",
                bad.product_id
            )));
        }

        Ok(Self {
            id,
            org_id,
            source,
            destination,
            items,
            status: TransferStatus::Pending,
            reason,
            requires_approval,
            notes: None,
            created_at,
            updated_at: created_at,
        })
    }

    fn ensure_transition(&self, next: TransferStatus) -> Result<(), DomainError> {
        if !self.status.can_transition(next) {
            return Err(DomainError::invalid_transition(format!(
                "{} -> {}",
                self.status, next
            )));
        }
        Ok(())
    }

    /// Approval debits the source, so it needs branch-management authority
    /// over the destination (the party asking for the goods).
    pub fn ensure_can_approve(&self, actor: &Actor) -> Result<(), DomainError> {
        self.ensure_transition(TransferStatus::Approved)?;
        if !actor.has_location_authority(self.destination) {
            return Err(DomainError::Unauthorized);
        }
        Ok(())
    }

    /// Pure status marker; restricted to the owner/admin class.
    pub fn ensure_can_mark_in_transit(&self, actor: &Actor) -> Result<(), DomainError> {
        self.ensure_transition(TransferStatus::InTransit)?;
        if !actor.is_elevated() {
            return Err(DomainError::Unauthorized);
        }
        Ok(())
    }

    pub fn ensure_can_receive(&self, actor: &Actor) -> Result<(), DomainError> {
        self.ensure_transition(TransferStatus::Received)?;
        if !actor.has_location_authority(self.destination) {
            return Err(DomainError::Unauthorized);
        }
        Ok(())
    }

    /// Cancellation is only reachable before any stock has moved.
    pub fn ensure_can_cancel(&self, actor: &Actor) -> Result<(), DomainError> {
        self.ensure_transition(TransferStatus::Cancelled)?;
        if !(actor.has_location_authority(self.source)
            || actor.has_location_authority(self.destination))
        {
            return Err(DomainError::Unauthorized);
        }
        Ok(())
    }

    /// Whether every item's source debit has been applied.
    pub fn fully_debited(&self) -> bool {
        self.items.iter().all(|i| i.debited)
    }

    /// Whether every item's destination credit has been applied.
    pub fn fully_credited(&self) -> bool {
        self.items.iter().all(|i| i.credited)
    }

    pub(crate) fn advance(&mut self, next: TransferStatus, at: DateTime<Utc>) {
        debug_assert!(self.status.can_transition(next));
        self.status = next;
        self.updated_at = at;
    }

    /// Record per-item receipt quantities. Items not mentioned default to
    /// their requested quantity at credit time. Unknown products and negative
    /// quantities are rejected.
    pub(crate) fn record_receipt(
        &mut self,
        quantities: &[(ProductId, i64)],
    ) -> Result<(), DomainError> {
        for (product_id, received) in quantities {
            if *received < 0 {
                return Err(DomainError::validation(format!(
                    "received quantity cannot be negative (product {product_id})"
                )));
            }
            let item = self
                .items
                .iter_mut()
                .find(|i| i.product_id == *product_id)
                .ok_or_else(|| {
                    DomainError::validation(format!("product {product_id} is not on this transfer"))
                })?;
            item.received = Some(*received);
        }
        Ok(())
    }
}

impl Entity for Transfer {
    type Id = TransferId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossdock_access::ActorRole;
    use crossdock_core::UserId;

    fn loc() -> LocationId {
        LocationId::new(EntityId::new())
    }

    fn prod() -> ProductId {
        ProductId::new(EntityId::new())
    }

    fn transfer() -> Transfer {
        Transfer::new(
            TransferId::new(EntityId::new()),
            OrgId::new(),
            loc(),
            loc(),
            vec![TransferItem::new(prod(), 5, 1250)],
            Some("weekly restock".to_string()),
            true,
            Utc::now(),
        )
        .unwrap()
    }

    fn admin() -> Actor {
        Actor::new(UserId::new(), ActorRole::Admin, vec![])
    }

    #[test]
    fn starts_pending() {
        assert_eq!(transfer().status, TransferStatus::Pending);
    }

    #[test]
    fn rejects_same_source_and_destination() {
        let l = loc();
        let err = Transfer::new(
            TransferId::new(EntityId::new()),
            OrgId::new(),
            l,
            l,
            vec![TransferItem::new(prod(), 1, 100)],
            None,
            false,
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn rejects_empty_and_nonpositive_items() {
        let err = Transfer::new(
            TransferId::new(EntityId::new()),
            OrgId::new(),
            loc(),
            loc(),
            vec![],
            None,
            false,
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let err = Transfer::new(
            TransferId::new(EntityId::new()),
            OrgId::new(),
            loc(),
            loc(),
            vec![TransferItem::new(prod(), 0, 100)],
            None,
            false,
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn transition_table_matches_lifecycle() {
        use TransferStatus::*;

        assert!(Pending.can_transition(Approved));
        assert!(Pending.can_transition(Cancelled));
        assert!(Approved.can_transition(InTransit));
        assert!(InTransit.can_transition(Received));

        // Nothing else, including self-transitions and skips.
        assert!(!Pending.can_transition(Pending));
        assert!(!Pending.can_transition(InTransit));
        assert!(!Pending.can_transition(Received));
        assert!(!Approved.can_transition(Approved));
        assert!(!Approved.can_transition(Cancelled));
        assert!(!Approved.can_transition(Received));
        assert!(!InTransit.can_transition(Cancelled));
        assert!(!Received.can_transition(Pending));
        assert!(!Cancelled.can_transition(Approved));
        assert!(Received.is_terminal());
        assert!(Cancelled.is_terminal());
    }

    #[test]
    fn receive_on_pending_is_an_invalid_transition() {
        let t = transfer();
        let err = t.ensure_can_receive(&admin()).unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition(_)));
    }

    #[test]
    fn approving_twice_is_rejected_by_the_table() {
        let mut t = transfer();
        t.ensure_can_approve(&admin()).unwrap();
        t.advance(TransferStatus::Approved, Utc::now());

        let err = t.ensure_can_approve(&admin()).unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition(_)));
    }

    #[test]
    fn approval_requires_destination_authority() {
        let t = transfer();

        let outsider = Actor::new(UserId::new(), ActorRole::Manager, vec![loc()]);
        assert!(matches!(
            t.ensure_can_approve(&outsider).unwrap_err(),
            DomainError::Unauthorized
        ));

        let dest_manager = Actor::new(UserId::new(), ActorRole::Manager, vec![t.destination]);
        t.ensure_can_approve(&dest_manager).unwrap();
    }

    #[test]
    fn in_transit_requires_elevated_role() {
        let mut t = transfer();
        t.advance(TransferStatus::Approved, Utc::now());

        let dest_manager = Actor::new(UserId::new(), ActorRole::Manager, vec![t.destination]);
        assert!(matches!(
            t.ensure_can_mark_in_transit(&dest_manager).unwrap_err(),
            DomainError::Unauthorized
        ));

        t.ensure_can_mark_in_transit(&admin()).unwrap();
    }

    #[test]
    fn receipt_recording_validates_products_and_quantities() {
        let mut t = transfer();
        let on_transfer = t.items[0].product_id;

        t.record_receipt(&[(on_transfer, 3)]).unwrap();
        assert_eq!(t.items[0].received, Some(3));
        assert_eq!(t.items[0].received_or_requested(), 3);

        assert!(t.record_receipt(&[(prod(), 1)]).is_err());
        assert!(t.record_receipt(&[(on_transfer, -1)]).is_err());
    }

    #[test]
    fn unreceipted_item_defaults_to_requested() {
        let t = transfer();
        assert_eq!(t.items[0].received_or_requested(), 5);
    }
}
