use rust_decimal::Decimal;
use serde::Deserialize;

use shopfront_catalog::{ListingScope, ProductDraft};
use shopfront_core::{DomainError, ProductId, UserId};

// -------------------------
// Request DTOs
// -------------------------

/// Admin console product form. `price` may be sent as a number or a string.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    #[serde(default)]
    pub name: String,
    pub price: Decimal,
    #[serde(default)]
    pub category: String,
    pub rating: Option<f64>,
    pub img: Option<String>,
    pub in_stock_value: Option<i64>,
    pub sold_stock_value: Option<i64>,
    pub visibility: Option<String>,
}

impl From<CreateProductRequest> for ProductDraft {
    fn from(req: CreateProductRequest) -> Self {
        ProductDraft {
            name: req.name,
            price: req.price,
            category: req.category,
            rating: req.rating,
            img: req.img,
            in_stock_value: req.in_stock_value,
            sold_stock_value: req.sold_stock_value,
            visibility: req.visibility,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVisibilityRequest {
    pub product_id: String,
    pub visibility: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockUpdateRequest {
    pub product_id: String,
    pub in_stock_value: i64,
    pub sold_stock_value: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListProductsQuery {
    pub scope: Option<String>,
}

impl ListProductsQuery {
    pub fn scope(&self) -> Result<ListingScope, DomainError> {
        match self.scope.as_deref().map(str::trim) {
            None | Some("") | Some("all") => Ok(ListingScope::All),
            Some("storefront") => Ok(ListingScope::Storefront),
            Some(other) => Err(DomainError::validation(format!(
                "scope must be 'all' or 'storefront', got '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub user_id: String,
    pub product_id: String,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveItemRequest {
    pub user_id: String,
    pub product_id: String,
}

/// The admin console sends `productQty`; the storefront sends `quantity`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuantityRequest {
    pub user_id: String,
    pub product_id: String,
    #[serde(alias = "quantity")]
    pub product_qty: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAddressRequest {
    pub user_id: String,
    pub address: String,
}

// -------------------------
// Parsing helpers
// -------------------------

pub fn parse_product_id(raw: &str) -> Result<ProductId, DomainError> {
    ProductId::parse(raw).map_err(|_| DomainError::invalid_id("productId is required"))
}

pub fn parse_user_id(raw: &str) -> Result<UserId, DomainError> {
    UserId::parse(raw).map_err(|_| DomainError::invalid_id("userId is required"))
}
