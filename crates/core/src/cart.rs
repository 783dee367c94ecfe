//! Session cart.
//!
//! The cart is a plain value: product ID to quantity. The web layer loads it
//! from the session, calls one of the methods below and writes it back, so two
//! concurrent requests for the same session are last-write-wins.
//!
//! Quantities are always positive. An entry is removed rather than stored
//! with zero.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{Price, ProductId};

/// Errors raised while pricing a cart.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    /// The cart references a product that no longer exists.
    #[error("product {0} in cart no longer exists")]
    UnknownProduct(ProductId),
}

/// Anything that can be priced in a cart.
pub trait Priced {
    /// Product identifier.
    fn product_id(&self) -> ProductId;
    /// Current unit price.
    fn unit_price(&self) -> Price;
}

/// Product ID to quantity, ordered by product ID.
///
/// Serializes as a JSON object with string keys, e.g. `{"3": 2}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    lines: BTreeMap<ProductId, u32>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one unit of a product.
    pub fn add(&mut self, product_id: ProductId) {
        let quantity = self.lines.entry(product_id).or_insert(0);
        *quantity = quantity.saturating_add(1);
    }

    /// Remove a product entirely. Returns whether it was present.
    pub fn remove(&mut self, product_id: ProductId) -> bool {
        self.lines.remove(&product_id).is_some()
    }

    /// Set a product's quantity. Zero or negative removes the entry.
    pub fn set_quantity(&mut self, product_id: ProductId, quantity: i64) {
        if quantity <= 0 {
            self.lines.remove(&product_id);
        } else {
            let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
            self.lines.insert(product_id, quantity);
        }
    }

    /// Quantity of a product, zero if absent.
    #[must_use]
    pub fn quantity(&self, product_id: ProductId) -> u32 {
        self.lines.get(&product_id).copied().unwrap_or(0)
    }

    /// Iterate `(product, quantity)` in product ID order.
    pub fn lines(&self) -> impl Iterator<Item = (ProductId, u32)> + '_ {
        self.lines.iter().map(|(id, qty)| (*id, *qty))
    }

    /// Product IDs in the cart, ascending.
    #[must_use]
    pub fn product_ids(&self) -> Vec<ProductId> {
        self.lines.keys().copied().collect()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of distinct products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Total units across all lines (for the cart badge).
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lines.values().map(|q| u64::from(*q)).sum()
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Drop lines whose product is not in `known`. Returns the dropped IDs.
    pub fn retain_known(&mut self, known: &[ProductId]) -> Vec<ProductId> {
        let stale: Vec<ProductId> = self
            .lines
            .keys()
            .filter(|id| !known.contains(id))
            .copied()
            .collect();
        for id in &stale {
            self.lines.remove(id);
        }
        stale
    }

    /// Price every line against the given products.
    ///
    /// Lines come back in product ID order.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::UnknownProduct`] for the first cart line that has
    /// no matching product.
    pub fn summarize<'a, P: Priced>(
        &self,
        products: &'a [P],
    ) -> Result<CartSummary<'a, P>, CartError> {
        let lines = self
            .lines()
            .map(|(id, quantity)| {
                let product = products
                    .iter()
                    .find(|p| p.product_id() == id)
                    .ok_or(CartError::UnknownProduct(id))?;
                Ok(CartLine {
                    product,
                    quantity,
                    subtotal: product.unit_price().times(quantity),
                })
            })
            .collect::<Result<Vec<_>, CartError>>()?;

        let total = lines.iter().map(|line| line.subtotal).sum();
        Ok(CartSummary { lines, total })
    }
}

/// One priced cart line.
#[derive(Debug)]
pub struct CartLine<'a, P> {
    pub product: &'a P,
    pub quantity: u32,
    /// `unit price x quantity`
    pub subtotal: Price,
}

/// A priced cart.
#[derive(Debug)]
pub struct CartSummary<'a, P> {
    pub lines: Vec<CartLine<'a, P>>,
    /// Sum of all line subtotals.
    pub total: Price,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Item {
        id: ProductId,
        price: Price,
    }

    impl Priced for Item {
        fn product_id(&self) -> ProductId {
            self.id
        }

        fn unit_price(&self) -> Price {
            self.price
        }
    }

    fn item(id: i32, cents: u32) -> Item {
        Item {
            id: ProductId::new(id),
            price: Price::from_cents(cents),
        }
    }

    #[test]
    fn test_add_twice_increments() {
        let mut cart = Cart::new();
        let p = ProductId::new(1);
        cart.add(p);
        cart.add(p);
        assert_eq!(cart.quantity(p), 2);
        assert_eq!(cart.len(), 1);
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let mut cart = Cart::new();
        cart.add(ProductId::new(1));
        assert!(!cart.remove(ProductId::new(99)));
        assert!(cart.remove(ProductId::new(1)));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_zero_or_negative_removes() {
        let mut cart = Cart::new();
        let p = ProductId::new(4);
        cart.set_quantity(p, 3);
        assert_eq!(cart.quantity(p), 3);

        cart.set_quantity(p, 0);
        assert!(cart.is_empty());

        cart.set_quantity(p, 2);
        cart.set_quantity(p, -5);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_on_absent_product_adds_it() {
        let mut cart = Cart::new();
        cart.set_quantity(ProductId::new(8), 5);
        assert_eq!(cart.quantity(ProductId::new(8)), 5);
    }

    #[test]
    fn test_summary_total_is_sum_of_subtotals() {
        let products = vec![item(1, 1000), item(2, 250), item(3, 1)];
        let mut cart = Cart::new();
        cart.set_quantity(ProductId::new(1), 2);
        cart.set_quantity(ProductId::new(2), 3);
        cart.set_quantity(ProductId::new(3), 7);

        let summary = cart.summarize(&products).unwrap();
        assert_eq!(summary.lines.len(), 3);
        assert_eq!(summary.lines[0].subtotal, Price::from_cents(2000));
        assert_eq!(summary.lines[1].subtotal, Price::from_cents(750));
        assert_eq!(summary.lines[2].subtotal, Price::from_cents(7));
        assert_eq!(summary.total, Price::from_cents(2757));
    }

    #[test]
    fn test_empty_summary_totals_zero() {
        let products: Vec<Item> = Vec::new();
        let summary = Cart::new().summarize(&products).unwrap();
        assert!(summary.lines.is_empty());
        assert_eq!(summary.total, Price::ZERO);
    }

    #[test]
    fn test_summary_fails_on_stale_entry() {
        let products = vec![item(1, 500)];
        let mut cart = Cart::new();
        cart.add(ProductId::new(1));
        cart.add(ProductId::new(2));
        assert_eq!(
            cart.summarize(&products).unwrap_err(),
            CartError::UnknownProduct(ProductId::new(2))
        );
    }

    #[test]
    fn test_retain_known_prunes_stale_lines() {
        let mut cart = Cart::new();
        cart.add(ProductId::new(1));
        cart.add(ProductId::new(2));
        let dropped = cart.retain_known(&[ProductId::new(1)]);
        assert_eq!(dropped, vec![ProductId::new(2)]);
        assert_eq!(cart.product_ids(), vec![ProductId::new(1)]);
    }

    #[test]
    fn test_item_count_sums_quantities() {
        let mut cart = Cart::new();
        cart.set_quantity(ProductId::new(1), 2);
        cart.set_quantity(ProductId::new(2), 5);
        assert_eq!(cart.item_count(), 7);
    }

    #[test]
    fn test_session_json_shape() {
        let mut cart = Cart::new();
        cart.add(ProductId::new(12));
        cart.add(ProductId::new(12));
        let json = serde_json::to_value(&cart).unwrap();
        assert_eq!(json, serde_json::json!({ "12": 2 }));

        let back: Cart = serde_json::from_value(json).unwrap();
        assert_eq!(back, cart);
    }
}
