use serde::{Deserialize, Serialize};

use shopfront_core::{DomainError, DomainResult, ProductId, UserId};

/// Quantity of one cart line. Always in `1..=Quantity::MAX`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct Quantity(u32);

impl Quantity {
    /// Largest storable quantity (fits a Postgres `INTEGER`).
    pub const MAX: u32 = i32::MAX as u32;

    pub fn new(raw: i64) -> DomainResult<Self> {
        if raw < 1 || raw > i64::from(Self::MAX) {
            return Err(DomainError::InvalidQuantity(raw));
        }
        Ok(Self(raw as u32))
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// Add another quantity to this one, rejecting overflow past [`Quantity::MAX`].
    pub fn merge(self, added: Quantity) -> DomainResult<Self> {
        Self::new(i64::from(self.0) + i64::from(added.0))
    }
}

impl TryFrom<i64> for Quantity {
    type Error = DomainError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for u32 {
    fn from(value: Quantity) -> Self {
        value.0
    }
}

impl core::fmt::Display for Quantity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Cart line: product and how many of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product_id: ProductId,
    #[serde(rename = "productQty")]
    pub quantity: Quantity,
}

/// A user's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    user_id: UserId,
    #[serde(rename = "productsInCart")]
    lines: Vec<LineItem>,
}

impl Cart {
    /// An empty cart. Carts only come into existence through a first add, so
    /// callers normally follow this with [`Cart::add`].
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            lines: Vec::new(),
        }
    }

    /// Rebuild a cart from stored lines, collapsing duplicates by summing them.
    pub fn from_lines(user_id: UserId, lines: impl IntoIterator<Item = LineItem>) -> DomainResult<Self> {
        let mut cart = Self::new(user_id);
        for line in lines {
            cart.add(line.product_id, line.quantity)?;
        }
        Ok(cart)
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn lines(&self) -> &[LineItem] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn line(&self, product_id: &ProductId) -> Option<&LineItem> {
        self.lines.iter().find(|l| &l.product_id == product_id)
    }

    /// Total number of units across all lines.
    pub fn unit_count(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.quantity.get())).sum()
    }

    /// Add units of a product, merging into the existing line if there is one.
    ///
    /// On overflow the cart is left unchanged.
    pub fn add(&mut self, product_id: ProductId, quantity: Quantity) -> DomainResult<&LineItem> {
        let idx = match self.lines.iter().position(|l| l.product_id == product_id) {
            Some(idx) => {
                self.lines[idx].quantity = self.lines[idx].quantity.merge(quantity)?;
                idx
            }
            None => {
                self.lines.push(LineItem {
                    product_id,
                    quantity,
                });
                self.lines.len() - 1
            }
        };
        Ok(&self.lines[idx])
    }

    /// Overwrite the quantity of an existing line.
    pub fn set_quantity(&mut self, product_id: &ProductId, quantity: Quantity) -> DomainResult<()> {
        let line = self
            .lines
            .iter_mut()
            .find(|l| &l.product_id == product_id)
            .ok_or(DomainError::not_found("cart line item"))?;
        line.quantity = quantity;
        Ok(())
    }

    /// Remove the line for a product. Returns whether a line was removed.
    pub fn remove(&mut self, product_id: &ProductId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| &l.product_id != product_id);
        self.lines.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> UserId {
        UserId::parse("u1").unwrap()
    }

    fn pid(s: &str) -> ProductId {
        ProductId::parse(s).unwrap()
    }

    fn qty(n: i64) -> Quantity {
        Quantity::new(n).unwrap()
    }

    #[test]
    fn quantity_rejects_zero_and_negatives() {
        assert_eq!(Quantity::new(0), Err(DomainError::InvalidQuantity(0)));
        assert_eq!(Quantity::new(-4), Err(DomainError::InvalidQuantity(-4)));
        assert_eq!(qty(1).get(), 1);
    }

    #[test]
    fn quantity_rejects_values_past_max() {
        assert!(Quantity::new(i64::from(Quantity::MAX) + 1).is_err());
        assert!(qty(i64::from(Quantity::MAX)).merge(qty(1)).is_err());
    }

    #[test]
    fn repeated_add_merges_into_one_line() {
        let mut cart = Cart::new(user());
        cart.add(pid("p"), qty(2)).unwrap();
        cart.add(pid("p"), qty(3)).unwrap();
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.line(&pid("p")).unwrap().quantity.get(), 5);
    }

    #[test]
    fn overflowing_add_leaves_cart_unchanged() {
        let mut cart = Cart::new(user());
        cart.add(pid("p"), qty(i64::from(Quantity::MAX))).unwrap();
        let before = cart.clone();
        assert!(cart.add(pid("p"), qty(1)).is_err());
        assert_eq!(cart, before);
    }

    #[test]
    fn set_quantity_requires_existing_line() {
        let mut cart = Cart::new(user());
        assert_eq!(
            cart.set_quantity(&pid("p"), qty(2)),
            Err(DomainError::not_found("cart line item"))
        );
        cart.add(pid("p"), qty(1)).unwrap();
        cart.set_quantity(&pid("p"), qty(7)).unwrap();
        assert_eq!(cart.unit_count(), 7);
    }

    #[test]
    fn remove_is_idempotent() {
        let mut cart = Cart::new(user());
        cart.add(pid("a"), qty(1)).unwrap();
        assert!(!cart.remove(&pid("b")));
        assert_eq!(cart.lines().len(), 1);
        assert!(cart.remove(&pid("a")));
        assert!(!cart.remove(&pid("a")));
        assert!(cart.is_empty());
    }

    #[test]
    fn from_lines_collapses_duplicates() {
        let lines = vec![
            LineItem { product_id: pid("a"), quantity: qty(1) },
            LineItem { product_id: pid("a"), quantity: qty(2) },
        ];
        let cart = Cart::from_lines(user(), lines).unwrap();
        assert_eq!(cart.lines(), &[LineItem { product_id: pid("a"), quantity: qty(3) }]);
    }

    #[test]
    fn wire_shape_matches_storefront() {
        let mut cart = Cart::new(user());
        cart.add(pid("p1"), qty(2)).unwrap();
        let json = serde_json::to_value(&cart).unwrap();
        assert_eq!(json["userId"], "u1");
        assert_eq!(json["productsInCart"][0]["productId"], "p1");
        assert_eq!(json["productsInCart"][0]["productQty"], 2);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: any sequence of adds yields one line per product whose
            /// quantity is the sum of everything added for it.
            #[test]
            fn adds_aggregate_by_product(adds in prop::collection::vec((0u8..5, 1i64..100), 1..40)) {
                let mut cart = Cart::new(user());
                let mut expected = std::collections::HashMap::new();
                for (p, n) in &adds {
                    cart.add(pid(&format!("p{p}")), qty(*n)).unwrap();
                    *expected.entry(format!("p{p}")).or_insert(0i64) += n;
                }

                prop_assert_eq!(cart.lines().len(), expected.len());
                for (p, n) in expected {
                    prop_assert_eq!(i64::from(cart.line(&pid(&p)).unwrap().quantity.get()), n);
                }
            }
        }
    }
}
