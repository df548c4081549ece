use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use storefront_infra::{ListingUpdateError, StoreError};

use crate::app::dto::ListingErrorDto;

pub fn listing_error_to_response(err: ListingUpdateError) -> axum::response::Response {
    match err {
        ListingUpdateError::Rejected(report) => {
            let errors: Vec<ListingErrorDto> = report.violations().iter().map(Into::into).collect();
            (StatusCode::BAD_REQUEST, axum::Json(json!({ "errors": errors }))).into_response()
        }
        ListingUpdateError::Store(e) => store_error_to_response(e),
    }
}

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    tracing::error!(error = %err, "catalog store failure");
    json_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "store_error",
        err.to_string(),
    )
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
