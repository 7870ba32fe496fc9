//! Placeholder HTTP service
//!
//! Exposes a greeting, an item echo and a fake classification endpoint.
//! None of these touch the trained model.

pub mod routes;

use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the application router
pub fn app() -> Router {
    Router::new()
        .route("/", get(routes::root::read_root))
        .route("/items/:item_id", get(routes::items::read_item))
        .route(
            "/classification/:picture_id",
            get(routes::classification::classify_picture),
        )
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}
