use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shopfront_core::{DomainError, DomainResult, ProductId};

/// Storage-assigned surrogate key of a product record.
///
/// Distinct from [`ProductId`]: legacy records exist before they are given a
/// product id, so the store needs a key that is always present.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub i64);

impl core::fmt::Display for RecordId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Closed set of catalog categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Boys' Wear")]
    BoysWear,
    #[serde(rename = "Girls' Wear")]
    GirlsWear,
    #[serde(rename = "Sarees")]
    Sarees,
    #[serde(rename = "Ganzy Clothes")]
    GanzyClothes,
    #[serde(rename = "Men's Wear")]
    MensWear,
    #[serde(rename = "Women's Wear")]
    WomensWear,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::BoysWear,
        Category::GirlsWear,
        Category::Sarees,
        Category::GanzyClothes,
        Category::MensWear,
        Category::WomensWear,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::BoysWear => "Boys' Wear",
            Category::GirlsWear => "Girls' Wear",
            Category::Sarees => "Sarees",
            Category::GanzyClothes => "Ganzy Clothes",
            Category::MensWear => "Men's Wear",
            Category::WomensWear => "Women's Wear",
        }
    }

    /// Exact, case-sensitive match against the display names.
    pub fn parse(raw: &str) -> DomainResult<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == raw)
            .ok_or_else(|| DomainError::InvalidCategory(raw.to_string()))
    }
}

impl core::fmt::Display for Category {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Storefront-listing eligibility flag. Independent of stock level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    On,
    Off,
}

impl Visibility {
    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::On => "on",
            Visibility::Off => "off",
        }
    }

    pub fn parse(raw: &str) -> DomainResult<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "on" => Ok(Visibility::On),
            "off" => Ok(Visibility::Off),
            other => Err(DomainError::validation(format!(
                "visibility must be 'on' or 'off', got '{other}'"
            ))),
        }
    }
}

/// Which products a listing returns.
///
/// Visibility only affects the storefront listing; lookups by id and the
/// admin listing always see every product.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListingScope {
    #[default]
    All,
    Storefront,
}

impl ListingScope {
    pub fn includes(self, product: &Product) -> bool {
        match self {
            ListingScope::All => true,
            ListingScope::Storefront => product.visibility == Visibility::On,
        }
    }
}

/// Inventory counters of a product.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockLevels {
    pub in_stock_value: u32,
    pub sold_stock_value: u32,
}

impl StockLevels {
    /// Validate raw counters; both must be non-negative and fit in 32 bits.
    pub fn new(in_stock_value: i64, sold_stock_value: i64) -> DomainResult<Self> {
        Ok(Self {
            in_stock_value: counter("inStockValue", in_stock_value)?,
            sold_stock_value: counter("soldStockValue", sold_stock_value)?,
        })
    }
}

fn counter(field: &str, value: i64) -> DomainResult<u32> {
    u32::try_from(value)
        .ok()
        .filter(|v| i32::try_from(*v).is_ok())
        .ok_or_else(|| DomainError::validation(format!("{field} must be a non-negative integer, got {value}")))
}

/// A catalog record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(skip)]
    pub record_id: RecordId,
    /// `None` only for legacy records awaiting backfill.
    pub product_id: Option<ProductId>,
    pub name: String,
    pub price: Decimal,
    pub category: Category,
    pub rating: f64,
    pub img: Option<String>,
    pub in_stock_value: u32,
    pub sold_stock_value: u32,
    pub visibility: Visibility,
}

impl Product {
    pub fn is_visible(&self) -> bool {
        self.visibility == Visibility::On
    }

    /// Materialize a validated draft as a record.
    pub fn from_new(record_id: RecordId, product_id: Option<ProductId>, new: NewProduct) -> Self {
        Self {
            record_id,
            product_id,
            name: new.name,
            price: new.price,
            category: new.category,
            rating: new.rating,
            img: new.img,
            in_stock_value: new.stock.in_stock_value,
            sold_stock_value: new.stock.sold_stock_value,
            visibility: new.visibility,
        }
    }
}

/// Unvalidated product fields as submitted by the admin console.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductDraft {
    pub name: String,
    pub price: Decimal,
    pub category: String,
    pub rating: Option<f64>,
    pub img: Option<String>,
    pub in_stock_value: Option<i64>,
    pub sold_stock_value: Option<i64>,
    pub visibility: Option<String>,
}

/// Validated product fields, ready to be inserted under a fresh id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub price: Decimal,
    pub category: Category,
    pub rating: f64,
    pub img: Option<String>,
    pub stock: StockLevels,
    pub visibility: Visibility,
}

impl NewProduct {
    pub const MAX_RATING: f64 = 5.0;

    /// Validate a draft. The category is checked first so a bad category is
    /// always reported as such.
    pub fn validate(draft: ProductDraft) -> DomainResult<Self> {
        let category = Category::parse(&draft.category)?;

        let name = draft.name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }

        if draft.price.is_sign_negative() {
            return Err(DomainError::validation("price cannot be negative"));
        }

        let rating = draft.rating.unwrap_or(0.0);
        if !rating.is_finite() || !(0.0..=Self::MAX_RATING).contains(&rating) {
            return Err(DomainError::validation(format!(
                "rating must be between 0 and {}, got {rating}",
                Self::MAX_RATING
            )));
        }

        let stock = StockLevels::new(
            draft.in_stock_value.unwrap_or(0),
            draft.sold_stock_value.unwrap_or(0),
        )?;

        let visibility = match draft.visibility.as_deref() {
            None => Visibility::default(),
            Some(raw) if raw.trim().is_empty() => Visibility::default(),
            Some(raw) => Visibility::parse(raw)?,
        };

        Ok(Self {
            name: name.to_string(),
            price: draft.price,
            category,
            rating,
            img: draft.img.filter(|s| !s.trim().is_empty()),
            stock,
            visibility,
        })
    }
}
