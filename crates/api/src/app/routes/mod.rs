use axum::Router;

pub mod common;
pub mod listings;
pub mod system;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .nest("/products", listings::product_router())
        .nest("/variants", listings::variant_router())
}
