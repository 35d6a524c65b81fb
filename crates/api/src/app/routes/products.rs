use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::json;

use crossdock_core::EntityId;
use crossdock_products::{Product, ProductId};

use crate::app::routes::common;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::OrgContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_product).get(list_products))
        .route("/:id", get(get_product).delete(delete_product))
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrgContext>,
    Json(body): Json<dto::CreateProductRequest>,
) -> axum::response::Response {
    let product = match Product::new(
        ProductId::new(EntityId::new()),
        org.org_id(),
        body.into_attributes(),
        Utc::now(),
    ) {
        Ok(p) => p,
        Err(e) => return errors::domain_error_to_response(e),
    };

    services.products.insert(product.clone());
    (StatusCode::CREATED, Json(product)).into_response()
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrgContext>,
) -> axum::response::Response {
    Json(json!({ "products": services.products.list(org.org_id()) })).into_response()
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrgContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    match common::require_product(&services, org.org_id(), &id) {
        Ok(product) => Json(product).into_response(),
        Err(r) => r,
    }
}

/// Delete a product and cascade: every stock row for it, at every location,
/// goes too.
pub async fn delete_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrgContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let product = match common::require_product(&services, org.org_id(), &id) {
        Ok(p) => p,
        Err(r) => return r,
    };

    services.products.remove(org.org_id(), product.id);
    match services.ledger.purge_product(org.org_id(), product.id).await {
        Ok(removed) => Json(json!({
            "deleted": true,
            "stock_rows_removed": removed,
        }))
        .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
