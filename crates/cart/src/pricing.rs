//! Cart pricing.
//!
//! Stateless: the caller supplies the lines and a catalog lookup. Lines whose
//! product is gone or hidden from the storefront are skipped, never an error.
//! So are lines whose total would overflow `Decimal`.

use rust_decimal::Decimal;
use serde::Serialize;

use shopfront_catalog::Product;
use shopfront_core::ProductId;

use crate::cart::LineItem;

/// A line that contributed to the totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricedLine {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
    pub lines: Vec<PricedLine>,
    /// Lines left out because the product is missing, not visible, or too
    /// expensive to total.
    pub skipped: Vec<ProductId>,
    pub subtotal: Decimal,
    /// Equal to the subtotal; taxes and shipping are computed elsewhere.
    pub total: Decimal,
}

pub fn price_cart<'a, F>(lines: &[LineItem], lookup: F) -> CartSummary
where
    F: Fn(&ProductId) -> Option<&'a Product>,
{
    let mut priced = Vec::with_capacity(lines.len());
    let mut skipped = Vec::new();
    let mut subtotal = Decimal::ZERO;

    for line in lines {
        let Some(product) = lookup(&line.product_id).filter(|p| p.is_visible()) else {
            skipped.push(line.product_id.clone());
            continue;
        };
        let quantity = line.quantity.get();
        let totals = product
            .price
            .checked_mul(Decimal::from(quantity))
            .and_then(|line_total| subtotal.checked_add(line_total).map(|s| (line_total, s)));
        match totals {
            Some((line_total, next_subtotal)) => {
                subtotal = next_subtotal;
                priced.push(PricedLine {
                    product_id: line.product_id.clone(),
                    name: product.name.clone(),
                    quantity,
                    unit_price: product.price,
                    line_total,
                });
            }
            None => skipped.push(line.product_id.clone()),
        }
    }

    CartSummary {
        lines: priced,
        skipped,
        subtotal,
        total: subtotal,
    }
}
