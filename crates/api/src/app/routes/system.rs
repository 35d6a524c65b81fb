use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};

use crate::context::{ActorContext, OrgContext};

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(
    Extension(org): Extension<OrgContext>,
    Extension(actor): Extension<ActorContext>,
) -> impl IntoResponse {
    let actor = actor.actor();
    Json(serde_json::json!({
        "org_id": org.org_id(),
        "user_id": actor.user_id,
        "role": actor.role.as_str(),
        "managed_locations": actor.managed_locations,
    }))
}
