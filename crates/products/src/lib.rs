//! `crossdock-products` — the product catalog entity.
//!
//! Identity is immutable; attributes are edited independently of stock. Stock
//! quantities themselves live in `crossdock-ledger`.

pub mod product;

pub use product::{Product, ProductAttributes, ProductId, ProductStatus};
