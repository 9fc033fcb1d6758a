use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use crate::app::{dto, errors};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/update-address", post(update_address))
        .route("/address/:user_id", get(get_address))
}

pub async fn update_address(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::UpdateAddressRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::json_rejection(e),
    };
    let user_id = match dto::parse_user_id(&body.user_id) {
        Ok(id) => id,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.addresses.upsert_address(&user_id, &body.address).await {
        Ok(address) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": "Address updated successfully",
                "address": address,
            })),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_address(
    Extension(services): Extension<Arc<AppServices>>,
    Path(user_id): Path<String>,
) -> axum::response::Response {
    let user_id = match dto::parse_user_id(&user_id) {
        Ok(id) => id,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.addresses.get_address(&user_id).await {
        Ok(address) => {
            (StatusCode::OK, Json(json!({ "success": true, "address": address }))).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}
