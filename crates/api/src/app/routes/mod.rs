use axum::{routing::get, Router};

pub mod common;
pub mod locations;
pub mod products;
pub mod stock;
pub mod system;
pub mod transfers;

/// Router for all identity-scoped endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/locations", locations::router().merge(stock::router()))
        .nest("/products", products::router())
        .nest("/transfers", transfers::router())
}
