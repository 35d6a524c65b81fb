//! `crossdock-locations` — branches and warehouses.
//!
//! Branches and warehouses are tracked as separate kinds, but both are valid
//! endpoints for stock records and transfers.

pub mod location;

pub use location::{Location, LocationId, LocationKind};
