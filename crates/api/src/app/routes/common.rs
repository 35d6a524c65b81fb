use axum::http::StatusCode;

use crossdock_core::OrgId;
use crossdock_locations::Location;
use crossdock_products::Product;

use crate::app::errors;
use crate::app::services::AppServices;

/// Parse a path/body identifier, answering 400 on malformed input.
pub fn parse_id<T: core::str::FromStr>(
    raw: &str,
    what: &'static str,
) -> Result<T, axum::response::Response> {
    raw.parse().map_err(|_| {
        errors::json_error(
            StatusCode::BAD_REQUEST,
            "invalid_id",
            format!("invalid {what} id"),
        )
    })
}

/// Resolve a location by path id, answering 404 when the org has no such
/// location.
pub fn require_location(
    services: &AppServices,
    org_id: OrgId,
    raw: &str,
) -> Result<Location, axum::response::Response> {
    let id = parse_id(raw, "location")?;
    services
        .locations
        .get(org_id, id)
        .ok_or_else(|| errors::json_error(StatusCode::NOT_FOUND, "not_found", "location not found"))
}

pub fn require_product(
    services: &AppServices,
    org_id: OrgId,
    raw: &str,
) -> Result<Product, axum::response::Response> {
    let id = parse_id(raw, "product")?;
    services
        .products
        .get(org_id, id)
        .ok_or_else(|| errors::json_error(StatusCode::NOT_FOUND, "not_found", "product not found"))
}
