use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::json;

use crossdock_locations::LocationId;
use crossdock_transfers::{NewTransfer, NewTransferItem, ReceivedItem, TransferId, TransferUpdate};

use crate::app::routes::common;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::{ActorContext, OrgContext};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_transfer).get(list_transfers))
        .route("/:id", get(get_transfer))
        .route("/:id/approve", post(approve_transfer))
        .route("/:id/transit", post(mark_in_transit))
        .route("/:id/receive", post(receive_transfer))
        .route("/:id/cancel", post(cancel_transfer))
}

pub async fn create_transfer(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrgContext>,
    Json(body): Json<dto::CreateTransferRequest>,
) -> axum::response::Response {
    let source = match common::require_location(&services, org.org_id(), &body.source) {
        Ok(l) => l,
        Err(r) => return r,
    };
    let destination = match common::require_location(&services, org.org_id(), &body.destination) {
        Ok(l) => l,
        Err(r) => return r,
    };

    let mut items = Vec::with_capacity(body.items.len());
    for item in &body.items {
        let product = match common::require_product(&services, org.org_id(), &item.product_id) {
            Ok(p) => p,
            Err(r) => return r,
        };
        items.push(NewTransferItem {
            product_id: product.id,
            requested: item.requested,
            unit_cost: if item.unit_cost > 0 {
                item.unit_cost
            } else {
                product.attributes.unit_cost
            },
        });
    }

    let request = NewTransfer {
        org_id: org.org_id(),
        source: source.id,
        destination: destination.id,
        items,
        reason: body.reason,
        requires_approval: body.requires_approval,
        override_zero_stock: body.override_zero_stock,
    };

    let transfer = match services.workflow.create(request, Utc::now()).await {
        Ok(t) => t,
        Err(e) => return errors::workflow_error_to_response(e),
    };

    // Entry-time availability warnings for items accepted against zero stock.
    let mut warnings = Vec::new();
    for item in &transfer.items {
        if let Ok(0) = services
            .guard
            .available(org.org_id(), transfer.source, item.product_id)
            .await
        {
            warnings.push(json!({
                "product_id": item.product_id,
                "warning": "zero_stock",
            }));
        }
    }

    (
        StatusCode::CREATED,
        Json(json!({ "transfer": transfer, "warnings": warnings })),
    )
        .into_response()
}

pub async fn list_transfers(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrgContext>,
    Query(query): Query<dto::ListTransfersQuery>,
) -> axum::response::Response {
    let location: Option<LocationId> = match query.location.as_deref() {
        Some(raw) => match common::parse_id(raw, "location") {
            Ok(id) => Some(id),
            Err(r) => return r,
        },
        None => None,
    };

    match services.workflow.list(org.org_id(), location).await {
        Ok(transfers) => Json(json!({ "transfers": transfers })).into_response(),
        Err(e) => errors::workflow_error_to_response(e),
    }
}

pub async fn get_transfer(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrgContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: TransferId = match common::parse_id(&id, "transfer") {
        Ok(id) => id,
        Err(r) => return r,
    };

    match services.workflow.get(org.org_id(), id).await {
        Ok(transfer) => Json(transfer).into_response(),
        Err(e) => errors::workflow_error_to_response(e),
    }
}

pub async fn approve_transfer(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrgContext>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: TransferId = match common::parse_id(&id, "transfer") {
        Ok(id) => id,
        Err(r) => return r,
    };

    match services
        .workflow
        .approve(org.org_id(), id, actor.actor(), Utc::now())
        .await
    {
        Ok(update) => update_response(update),
        Err(e) => errors::workflow_error_to_response(e),
    }
}

pub async fn mark_in_transit(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrgContext>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: TransferId = match common::parse_id(&id, "transfer") {
        Ok(id) => id,
        Err(r) => return r,
    };

    match services
        .workflow
        .mark_in_transit(org.org_id(), id, actor.actor(), Utc::now())
        .await
    {
        Ok(transfer) => Json(json!({ "transfer": transfer })).into_response(),
        Err(e) => errors::workflow_error_to_response(e),
    }
}

pub async fn receive_transfer(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrgContext>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::ReceiveTransferRequest>,
) -> axum::response::Response {
    let id: TransferId = match common::parse_id(&id, "transfer") {
        Ok(id) => id,
        Err(r) => return r,
    };

    let mut items = Vec::with_capacity(body.items.len());
    for item in &body.items {
        let product_id = match common::parse_id(&item.product_id, "product") {
            Ok(id) => id,
            Err(r) => return r,
        };
        items.push(ReceivedItem {
            product_id,
            received: item.received,
        });
    }

    match services
        .workflow
        .receive(org.org_id(), id, actor.actor(), items, body.notes, Utc::now())
        .await
    {
        Ok(update) => update_response(update),
        Err(e) => errors::workflow_error_to_response(e),
    }
}

pub async fn cancel_transfer(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrgContext>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: TransferId = match common::parse_id(&id, "transfer") {
        Ok(id) => id,
        Err(r) => return r,
    };

    match services
        .workflow
        .cancel(org.org_id(), id, actor.actor(), Utc::now())
        .await
    {
        Ok(transfer) => Json(json!({ "transfer": transfer })).into_response(),
        Err(e) => errors::workflow_error_to_response(e),
    }
}

fn update_response(update: TransferUpdate) -> axum::response::Response {
    Json(json!({
        "transfer": update.transfer,
        "outcomes": update.outcomes,
    }))
    .into_response()
}
