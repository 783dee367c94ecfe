//! Checkout planning.
//!
//! [`plan_checkout`] decides whether a cart can become an order against a
//! snapshot of the products it references. It does no I/O. The storefront
//! loads the snapshot with row locks inside a transaction, runs the plan,
//! then applies it (order row, item rows, stock decrements) in that same
//! transaction. A failed plan means nothing is written.

use crate::cart::Cart;
use crate::types::{Capability, PermissionDenied, Price, ProductId, Role};

/// Why a checkout was refused.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckoutError {
    #[error(transparent)]
    PermissionDenied(#[from] PermissionDenied),

    #[error("Cart is empty")]
    EmptyCart,

    #[error("product {0} no longer exists")]
    NotFound(ProductId),

    #[error("not enough stock for {name}: {available} left, {requested} requested")]
    InsufficientStock {
        product_id: ProductId,
        name: String,
        available: u32,
        requested: u32,
    },
}

/// The fields of a product that checkout depends on, as read under lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockedProduct {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    pub stock: u32,
}

/// One line of an accepted checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    /// Price captured onto the order item.
    pub unit_price: Price,
    /// Stock to write back to the product.
    pub remaining_stock: u32,
}

impl CheckoutLine {
    /// `unit_price x quantity`
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.unit_price.times(self.quantity)
    }
}

/// An accepted checkout, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutPlan {
    /// In product ID order, which is also the lock order.
    pub lines: Vec<CheckoutLine>,
}

impl CheckoutPlan {
    /// Order total.
    #[must_use]
    pub fn total(&self) -> Price {
        self.lines.iter().map(CheckoutLine::subtotal).sum()
    }
}

/// Validate a cart for checkout.
///
/// Checks run in this order: the role must grant [`Capability::Checkout`],
/// the cart must be non-empty, then every line must reference a product in
/// `products` with enough stock. The first failing line is reported.
///
/// # Errors
///
/// Returns the first [`CheckoutError`] encountered.
pub fn plan_checkout(
    role: Role,
    cart: &Cart,
    products: &[StockedProduct],
) -> Result<CheckoutPlan, CheckoutError> {
    role.ensure(Capability::Checkout)?;

    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    let lines = cart
        .lines()
        .map(|(product_id, quantity)| {
            let product = products
                .iter()
                .find(|p| p.id == product_id)
                .ok_or(CheckoutError::NotFound(product_id))?;

            let remaining_stock = product.stock.checked_sub(quantity).ok_or_else(|| {
                CheckoutError::InsufficientStock {
                    product_id,
                    name: product.name.clone(),
                    available: product.stock,
                    requested: quantity,
                }
            })?;

            Ok(CheckoutLine {
                product_id,
                product_name: product.name.clone(),
                quantity,
                unit_price: product.price,
                remaining_stock,
            })
        })
        .collect::<Result<Vec<_>, CheckoutError>>()?;

    Ok(CheckoutPlan { lines })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(id: i32, cents: u32, stock: u32) -> StockedProduct {
        StockedProduct {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            price: Price::from_cents(cents),
            stock,
        }
    }

    fn cart_of(lines: &[(i32, i64)]) -> Cart {
        let mut cart = Cart::new();
        for (id, qty) in lines {
            cart.set_quantity(ProductId::new(*id), *qty);
        }
        cart
    }

    #[test]
    fn test_buyer_checkout_decrements_stock() {
        let products = vec![product(1, 1000, 5)];
        let cart = cart_of(&[(1, 2)]);

        let plan = plan_checkout(Role::Buyer, &cart, &products).unwrap();
        assert_eq!(plan.lines.len(), 1);
        assert_eq!(plan.lines[0].remaining_stock, 3);
        assert_eq!(plan.lines[0].unit_price, Price::from_cents(1000));
        assert_eq!(plan.total(), Price::from_cents(2000));
    }

    #[test]
    fn test_vendor_cannot_checkout() {
        let products = vec![product(1, 1000, 5)];
        let cart = cart_of(&[(1, 1)]);

        let err = plan_checkout(Role::Vendor, &cart, &products).unwrap_err();
        assert_eq!(err.to_string(), "Only buyers can checkout");
    }

    #[test]
    fn test_role_is_checked_before_empty_cart() {
        let err = plan_checkout(Role::Vendor, &Cart::new(), &[]).unwrap_err();
        assert!(matches!(err, CheckoutError::PermissionDenied(_)));
    }

    #[test]
    fn test_empty_cart_is_rejected() {
        let err = plan_checkout(Role::Buyer, &Cart::new(), &[]).unwrap_err();
        assert_eq!(err, CheckoutError::EmptyCart);
        assert_eq!(err.to_string(), "Cart is empty");
    }

    #[test]
    fn test_missing_product_is_rejected() {
        let products = vec![product(1, 100, 5)];
        let cart = cart_of(&[(1, 1), (9, 1)]);

        let err = plan_checkout(Role::Buyer, &cart, &products).unwrap_err();
        assert_eq!(err, CheckoutError::NotFound(ProductId::new(9)));
    }

    #[test]
    fn test_insufficient_stock_is_rejected() {
        let products = vec![product(1, 100, 10), product(2, 100, 1)];
        let cart = cart_of(&[(1, 3), (2, 2)]);

        let err = plan_checkout(Role::Buyer, &cart, &products).unwrap_err();
        assert_eq!(
            err,
            CheckoutError::InsufficientStock {
                product_id: ProductId::new(2),
                name: "Product 2".to_string(),
                available: 1,
                requested: 2,
            }
        );
    }

    #[test]
    fn test_buying_exact_stock_leaves_zero() {
        let products = vec![product(1, 250, 4)];
        let cart = cart_of(&[(1, 4)]);

        let plan = plan_checkout(Role::Buyer, &cart, &products).unwrap();
        assert_eq!(plan.lines[0].remaining_stock, 0);
    }

    #[test]
    fn test_total_matches_sum_of_lines() {
        let products = vec![product(1, 1999, 10), product(2, 501, 10), product(3, 5, 10)];
        let cart = cart_of(&[(3, 4), (1, 2), (2, 1)]);

        let plan = plan_checkout(Role::Buyer, &cart, &products).unwrap();
        let ids: Vec<_> = plan.lines.iter().map(|l| l.product_id).collect();
        assert_eq!(
            ids,
            vec![ProductId::new(1), ProductId::new(2), ProductId::new(3)]
        );
        // 2 x 19.99 + 1 x 5.01 + 4 x 0.05
        assert_eq!(plan.total(), Price::from_cents(3998 + 501 + 20));
    }

    #[test]
    fn test_later_price_change_does_not_touch_captured_price() {
        let mut products = vec![product(1, 1000, 5)];
        let cart = cart_of(&[(1, 1)]);
        let plan = plan_checkout(Role::Buyer, &cart, &products).unwrap();

        products[0].price = Price::from_cents(5000);
        assert_eq!(plan.lines[0].unit_price, Price::from_cents(1000));
        assert_eq!(plan.total(), Price::from_cents(1000));
    }
}
