//! Orders and order items.

use chrono::{DateTime, Utc};
use serde::Serialize;

use bazaar_core::{OrderId, OrderItemId, Price, ProductId, StoreId};

/// A stored order item.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: u32,
    /// Unit price captured at checkout.
    pub price: Price,
}

/// An order item joined with its product name, for display.
#[derive(Debug, Clone, Serialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Price,
}

impl OrderLine {
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.unit_price.times(self.quantity)
    }
}

/// One of the buyer's orders with its lines.
#[derive(Debug, Clone, Serialize)]
pub struct OrderSummary {
    pub id: OrderId,
    pub created_at: DateTime<Utc>,
    pub lines: Vec<OrderLine>,
}

impl OrderSummary {
    #[must_use]
    pub fn total(&self) -> Price {
        self.lines.iter().map(OrderLine::subtotal).sum()
    }
}

/// An order item that sold one of a vendor's products.
#[derive(Debug, Clone, Serialize)]
pub struct VendorOrderLine {
    pub order_id: OrderId,
    pub ordered_at: DateTime<Utc>,
    pub buyer: String,
    pub store_id: StoreId,
    pub store_name: String,
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Price,
}

impl VendorOrderLine {
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.unit_price.times(self.quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_total() {
        let line = |id: i32, qty: u32, cents: u32| OrderLine {
            product_id: ProductId::new(id),
            product_name: format!("p{id}"),
            quantity: qty,
            unit_price: Price::from_cents(cents),
        };
        let order = OrderSummary {
            id: OrderId::new(1),
            created_at: Utc::now(),
            lines: vec![line(1, 2, 1000), line(2, 1, 250)],
        };
        assert_eq!(order.total(), Price::from_cents(2250));
    }
}
