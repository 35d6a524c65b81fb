use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use chrono::Utc;

use crossdock_core::EntityId;
use crossdock_locations::{Location, LocationId};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::OrgContext;

pub fn router() -> Router {
    Router::new().route("/", post(create_location).get(list_locations))
}

pub async fn create_location(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrgContext>,
    Json(body): Json<dto::CreateLocationRequest>,
) -> axum::response::Response {
    let location = match Location::new(
        LocationId::new(EntityId::new()),
        org.org_id(),
        body.name,
        body.kind,
        Utc::now(),
    ) {
        Ok(l) => l,
        Err(e) => return errors::domain_error_to_response(e),
    };

    services.locations.insert(location.clone());
    (StatusCode::CREATED, Json(location)).into_response()
}

pub async fn list_locations(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrgContext>,
) -> axum::response::Response {
    Json(serde_json::json!({
        "locations": services.locations.list(org.org_id()),
    }))
    .into_response()
}
