use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use storefront_catalog::ProductChannelListingUpdateInput;

use crate::app::routes::common::CmdAuth;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub fn product_router() -> Router {
    Router::new()
        .route("/:id", get(get_product))
        .route("/:id/channel-listings", post(update_product_channel_listings))
}

pub fn variant_router() -> Router {
    Router::new()
        .route("/:id", get(get_variant))
        .route("/:id/channel-listings", post(update_variant_channel_listings))
}

pub async fn update_product_channel_listings(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<ProductChannelListingUpdateInput>,
) -> axum::response::Response {
    let cmd = CmdAuth::manage_products(body);
    if let Err(e) = crate::authz::authorize_command(&principal, &cmd) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    match services.update_product_listings(&id, cmd.inner).await {
        Ok(ctx) => (
            StatusCode::OK,
            Json(dto::ProductUpdateResponse {
                product: dto::ProductDto::from(&ctx.node),
                errors: vec![],
            }),
        )
            .into_response(),
        Err(e) => errors::listing_error_to_response(e),
    }
}

pub async fn update_variant_channel_listings(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::VariantChannelListingUpdateRequest>,
) -> axum::response::Response {
    let cmd = CmdAuth::manage_products(body.input);
    if let Err(e) = crate::authz::authorize_command(&principal, &cmd) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    match services.update_variant_listings(&id, cmd.inner).await {
        Ok(ctx) => (
            StatusCode::OK,
            Json(dto::VariantUpdateResponse {
                variant: dto::VariantDto::from(&ctx.node),
                errors: vec![],
            }),
        )
            .into_response(),
        Err(e) => errors::listing_error_to_response(e),
    }
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    match services.product(&id).await {
        Ok(Some(view)) => (StatusCode::OK, Json(dto::ProductDto::from(&view))).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "product not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_variant(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    match services.variant(&id).await {
        Ok(Some(view)) => (StatusCode::OK, Json(dto::VariantDto::from(&view))).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "variant not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}
