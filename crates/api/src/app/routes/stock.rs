use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::json;

use crate::app::routes::common;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::OrgContext;

/// Stock routes, nested under `/locations`.
pub fn router() -> Router {
    Router::new()
        .route("/:id/stock", get(location_stock))
        .route("/:id/stock/low", get(low_stock))
        .route("/:id/stock/cleanup", post(cleanup))
        .route("/:id/stock/:product_id", post(adjust_stock))
}

pub async fn location_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrgContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let location = match common::require_location(&services, org.org_id(), &id) {
        Ok(l) => l,
        Err(r) => return r,
    };

    let rows = match services.ledger.location_rows(org.org_id(), location.id).await {
        Ok(rows) => rows,
        Err(e) => return errors::store_error_to_response(e),
    };

    Json(json!({
        "stock": rows
            .iter()
            .map(|r| json!({
                "product_id": r.product_id,
                "quantity": r.quantity,
                "last_updated": r.last_updated,
            }))
            .collect::<Vec<_>>(),
    }))
    .into_response()
}

/// Products at this location whose reconciled quantity sits at or below their
/// reorder threshold.
pub async fn low_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrgContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let location = match common::require_location(&services, org.org_id(), &id) {
        Ok(l) => l,
        Err(r) => return r,
    };

    let stock = match services.ledger.location_stock(org.org_id(), location.id).await {
        Ok(stock) => stock,
        Err(e) => return errors::store_error_to_response(e),
    };

    let mut low = Vec::new();
    for (product_id, quantity) in stock {
        let Some(product) = services.products.get(org.org_id(), product_id) else {
            continue;
        };
        if product.is_low_stock(quantity) {
            low.push(json!({
                "product_id": product_id,
                "name": product.attributes.name,
                "sku": product.attributes.sku,
                "quantity": quantity,
                "reorder_threshold": product.attributes.reorder_threshold,
            }));
        }
    }

    Json(json!({ "low": low })).into_response()
}

pub async fn adjust_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrgContext>,
    Path((id, product_id)): Path<(String, String)>,
    Json(body): Json<dto::AdjustStockRequest>,
) -> axum::response::Response {
    let location = match common::require_location(&services, org.org_id(), &id) {
        Ok(l) => l,
        Err(r) => return r,
    };
    let product = match common::require_product(&services, org.org_id(), &product_id) {
        Ok(p) => p,
        Err(r) => return r,
    };

    let quantity = match services
        .ledger
        .adjust(org.org_id(), location.id, product.id, body.quantity, body.mode, Utc::now())
        .await
    {
        Ok(q) => q,
        Err(e) => return errors::store_error_to_response(e),
    };

    Json(json!({
        "success": true,
        "stock": { "quantity": quantity },
        "oversold": quantity < 0,
    }))
    .into_response()
}

pub async fn cleanup(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrgContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let location = match common::require_location(&services, org.org_id(), &id) {
        Ok(l) => l,
        Err(r) => return r,
    };

    match services
        .ledger
        .reconcile_duplicates(org.org_id(), location.id)
        .await
    {
        Ok(report) => Json(report).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
