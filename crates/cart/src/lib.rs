//! Cart domain module.
//!
//! One cart per user, at most one line per product, quantities always >= 1.
//! Pricing is a pure function over the cart and the current catalog.

pub mod cart;
pub mod pricing;

pub use cart::{Cart, LineItem, Quantity};
pub use pricing::{CartSummary, PricedLine, price_cart};
