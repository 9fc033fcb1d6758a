use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::json;

use crate::app::{dto, errors};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/add-to-cart", post(add_to_cart))
        .route("/cart/:user_id", get(get_cart))
        .route("/cart/:user_id/summary", get(cart_summary))
        .route("/delete-items", delete(remove_item))
        .route("/update-quantity", put(update_quantity))
}

pub async fn add_to_cart(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::AddToCartRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::json_rejection(e),
    };
    let ids = dto::parse_user_id(&body.user_id)
        .and_then(|u| dto::parse_product_id(&body.product_id).map(|p| (u, p)));
    let (user_id, product_id) = match ids {
        Ok(ids) => ids,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.carts.add_item(&user_id, &product_id, body.quantity).await {
        Ok(cart) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": "Product added to cart successfully",
                "cart": cart,
            })),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// Returns the line items only, as the storefront expects.
pub async fn get_cart(
    Extension(services): Extension<Arc<AppServices>>,
    Path(user_id): Path<String>,
) -> axum::response::Response {
    let user_id = match dto::parse_user_id(&user_id) {
        Ok(id) => id,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.carts.get_cart(&user_id).await {
        Ok(cart) => {
            (StatusCode::OK, Json(json!({ "success": true, "cart": cart.lines() }))).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn cart_summary(
    Extension(services): Extension<Arc<AppServices>>,
    Path(user_id): Path<String>,
) -> axum::response::Response {
    let user_id = match dto::parse_user_id(&user_id) {
        Ok(id) => id,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.carts.summary(&user_id).await {
        Ok(summary) => {
            (StatusCode::OK, Json(json!({ "success": true, "summary": summary }))).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn remove_item(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::RemoveItemRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::json_rejection(e),
    };
    let ids = dto::parse_user_id(&body.user_id)
        .and_then(|u| dto::parse_product_id(&body.product_id).map(|p| (u, p)));
    let (user_id, product_id) = match ids {
        Ok(ids) => ids,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.carts.remove_item(&user_id, &product_id).await {
        Ok(cart) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": "Product removed from cart successfully",
                "cart": cart,
            })),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_quantity(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::UpdateQuantityRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::json_rejection(e),
    };
    let ids = dto::parse_user_id(&body.user_id)
        .and_then(|u| dto::parse_product_id(&body.product_id).map(|p| (u, p)));
    let (user_id, product_id) = match ids {
        Ok(ids) => ids,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services
        .carts
        .update_quantity(&user_id, &product_id, body.product_qty)
        .await
    {
        Ok(cart) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": "Product quantity updated successfully",
                "cart": cart,
            })),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
