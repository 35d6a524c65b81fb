use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crossdock_availability::AvailabilityGuard;
use crossdock_core::OrgId;
use crossdock_ledger::StockLedger;
use crossdock_locations::{Location, LocationId};
use crossdock_products::{Product, ProductId};
use crossdock_store::{InMemoryStockStore, InMemoryTransferStore};
use crossdock_transfers::TransferWorkflow;

type StockStore = Arc<InMemoryStockStore>;

/// Org-scoped product catalog.
///
/// In-memory for the single-process build; a persistent registry slots in
/// behind the same methods.
#[derive(Debug, Default)]
pub struct ProductRegistry {
    inner: RwLock<HashMap<(OrgId, ProductId), Product>>,
}

impl ProductRegistry {
    pub fn insert(&self, product: Product) {
        let mut inner = self.inner.write().unwrap();
        inner.insert((product.org_id, product.id), product);
    }

    pub fn get(&self, org_id: OrgId, id: ProductId) -> Option<Product> {
        self.inner.read().unwrap().get(&(org_id, id)).cloned()
    }

    pub fn list(&self, org_id: OrgId) -> Vec<Product> {
        let inner = self.inner.read().unwrap();
        let mut out: Vec<_> = inner
            .iter()
            .filter(|((org, _), _)| *org == org_id)
            .map(|(_, p)| p.clone())
            .collect();
        out.sort_by_key(|p| (p.created_at, p.id));
        out
    }

    pub fn remove(&self, org_id: OrgId, id: ProductId) -> Option<Product> {
        self.inner.write().unwrap().remove(&(org_id, id))
    }
}

/// Org-scoped location registry.
#[derive(Debug, Default)]
pub struct LocationRegistry {
    inner: RwLock<HashMap<(OrgId, LocationId), Location>>,
}

impl LocationRegistry {
    pub fn insert(&self, location: Location) {
        let mut inner = self.inner.write().unwrap();
        inner.insert((location.org_id, location.id), location);
    }

    pub fn get(&self, org_id: OrgId, id: LocationId) -> Option<Location> {
        self.inner.read().unwrap().get(&(org_id, id)).cloned()
    }

    pub fn list(&self, org_id: OrgId) -> Vec<Location> {
        let inner = self.inner.read().unwrap();
        let mut out: Vec<_> = inner
            .iter()
            .filter(|((org, _), _)| *org == org_id)
            .map(|(_, l)| l.clone())
            .collect();
        out.sort_by_key(|l| (l.created_at, l.id));
        out
    }
}

/// Everything the handlers need, wired over one shared stock store so the
/// ledger, the guard and the workflow all see the same rows.
pub struct AppServices {
    pub ledger: StockLedger<StockStore>,
    pub guard: AvailabilityGuard<StockStore>,
    pub workflow: TransferWorkflow<StockStore, Arc<InMemoryTransferStore>>,
    pub products: ProductRegistry,
    pub locations: LocationRegistry,
}

impl AppServices {
    pub fn new() -> Self {
        let stock: StockStore = Arc::new(InMemoryStockStore::new());
        let transfers = Arc::new(InMemoryTransferStore::new());

        Self {
            ledger: StockLedger::new(stock.clone()),
            guard: AvailabilityGuard::new(StockLedger::new(stock.clone())),
            workflow: TransferWorkflow::new(stock, transfers),
            products: ProductRegistry::default(),
            locations: LocationRegistry::default(),
        }
    }
}

impl Default for AppServices {
    fn default() -> Self {
        Self::new()
    }
}
