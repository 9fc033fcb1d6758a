use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde_json::json;

use shopfront_catalog::{ProductDraft, StockLevels, Visibility};

use crate::app::{dto, errors};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/create-product", post(create_product))
        .route("/get-product", get(list_products))
        .route("/product/:product_id", get(get_product))
        .route("/update-visibility", put(update_visibility))
        .route("/instock-update", post(update_stock))
        .route("/assign-productid", get(assign_product_ids))
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::CreateProductRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::json_rejection(e),
    };

    match services.catalog.create_product(ProductDraft::from(body)).await {
        Ok(product) => (
            StatusCode::CREATED,
            Json(json!({
                "success": true,
                "message": "Product created successfully",
                "product": product,
            })),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// `?scope=storefront` drops products whose visibility is off.
pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
    query: Result<Query<dto::ListProductsQuery>, QueryRejection>,
) -> axum::response::Response {
    let Query(query) = match query {
        Ok(q) => q,
        Err(e) => return errors::query_rejection(e),
    };
    let scope = match query.scope() {
        Ok(s) => s,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.catalog.list_products(scope).await {
        Ok(products) => {
            (StatusCode::OK, Json(json!({ "success": true, "products": products }))).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(product_id): Path<String>,
) -> axum::response::Response {
    let product_id = match dto::parse_product_id(&product_id) {
        Ok(id) => id,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.catalog.get_product(&product_id).await {
        Ok(product) => {
            (StatusCode::OK, Json(json!({ "success": true, "product": product }))).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_visibility(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::UpdateVisibilityRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::json_rejection(e),
    };
    let parsed = dto::parse_product_id(&body.product_id)
        .and_then(|id| Visibility::parse(&body.visibility).map(|v| (id, v)));
    let (product_id, visibility) = match parsed {
        Ok(p) => p,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.catalog.set_visibility(&product_id, visibility).await {
        Ok(product) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": "Product visibility updated successfully",
                "product": product,
            })),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_stock(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::StockUpdateRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::json_rejection(e),
    };
    let parsed = dto::parse_product_id(&body.product_id)
        .and_then(|id| StockLevels::new(body.in_stock_value, body.sold_stock_value).map(|s| (id, s)));
    let (product_id, stock) = match parsed {
        Ok(p) => p,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.catalog.update_stock(&product_id, stock).await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({ "success": true, "message": "Stock status updated successfully" })),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn assign_product_ids(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.catalog.backfill_identifiers().await {
        Ok(products) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": "Product IDs assigned successfully",
                "products": products,
            })),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
