use axum::{
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

use crossdock_access::{Actor, ActorRole};
use crossdock_core::{OrgId, UserId};
use crossdock_locations::LocationId;

use crate::context::{ActorContext, OrgContext};

/// Identity headers stamped by the fronting gateway after it authenticates the
/// request. This service trusts them as-is; sessions and tokens live upstream.
pub const ORG_HEADER: &str = "x-org-id";
pub const USER_HEADER: &str = "x-user-id";
pub const ROLE_HEADER: &str = "x-actor-role";
/// Comma-separated location ids the actor manages (managers only).
pub const LOCATIONS_HEADER: &str = "x-actor-locations";

pub async fn context_middleware(
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let headers = req.headers();

    let org_id: OrgId = parse_header(headers, ORG_HEADER)?;
    let user_id: UserId = parse_header(headers, USER_HEADER)?;
    let role: ActorRole = parse_header(headers, ROLE_HEADER)?;
    let managed = parse_locations(headers)?;

    req.extensions_mut().insert(OrgContext::new(org_id));
    req.extensions_mut()
        .insert(ActorContext::new(Actor::new(user_id, role, managed)));

    Ok(next.run(req).await)
}

fn parse_header<T: core::str::FromStr>(headers: &HeaderMap, name: &str) -> Result<T, StatusCode> {
    headers
        .get(name)
        .ok_or(StatusCode::UNAUTHORIZED)?
        .to_str()
        .map_err(|_| StatusCode::UNAUTHORIZED)?
        .trim()
        .parse()
        .map_err(|_| StatusCode::UNAUTHORIZED)
}

fn parse_locations(headers: &HeaderMap) -> Result<Vec<LocationId>, StatusCode> {
    let Some(raw) = headers.get(LOCATIONS_HEADER) else {
        return Ok(vec![]);
    };
    let raw = raw.to_str().map_err(|_| StatusCode::UNAUTHORIZED)?;

    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse().map_err(|_| StatusCode::UNAUTHORIZED))
        .collect()
}
