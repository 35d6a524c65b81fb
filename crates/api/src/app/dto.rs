use chrono::NaiveDate;
use serde::Deserialize;

use crossdock_ledger::AdjustMode;
use crossdock_locations::LocationKind;
use crossdock_products::ProductAttributes;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct AdjustStockRequest {
    pub quantity: i64,
    pub mode: AdjustMode,
}

#[derive(Debug, Deserialize)]
pub struct CreateLocationRequest {
    pub name: String,
    pub kind: LocationKind,
}

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub sku: String,
    pub barcode: Option<String>,
    pub category: String,
    pub selling_price: u64,
    pub unit_cost: u64,
    #[serde(default)]
    pub reorder_threshold: i64,
    pub expires_on: Option<NaiveDate>,
}

impl CreateProductRequest {
    pub fn into_attributes(self) -> ProductAttributes {
        ProductAttributes {
            name: self.name,
            sku: self.sku,
            barcode: self.barcode,
            category: self.category,
            selling_price: self.selling_price,
            unit_cost: self.unit_cost,
            reorder_threshold: self.reorder_threshold,
            expires_on: self.expires_on,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateTransferRequest {
    pub source: String,
    pub destination: String,
    pub items: Vec<TransferItemRequest>,
    pub reason: Option<String>,
    #[serde(default = "default_true")]
    pub requires_approval: bool,
    #[serde(default)]
    pub override_zero_stock: bool,
}

#[derive(Debug, Deserialize)]
pub struct TransferItemRequest {
    pub product_id: String,
    pub requested: i64,
    #[serde(default)]
    pub unit_cost: u64,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReceiveTransferRequest {
    /// Per-item received quantities; items not listed default to `requested`.
    #[serde(default)]
    pub items: Vec<ReceiveItemRequest>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReceiveItemRequest {
    pub product_id: String,
    pub received: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListTransfersQuery {
    pub location: Option<String>,
}

fn default_true() -> bool {
    true
}
