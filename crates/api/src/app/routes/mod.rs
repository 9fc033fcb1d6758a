use axum::{routing::get, Router};

pub mod addresses;
pub mod carts;
pub mod products;
pub mod system;

/// Router for every shop endpoint. Paths are the ones both front-ends call.
pub fn router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .route("/keep-alive", get(system::keep_alive))
        .merge(products::router())
        .merge(carts::router())
        .merge(addresses::router())
}
