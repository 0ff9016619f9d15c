//! Order requests.

use common::{Money, ProductId};

/// A single `(product, quantity)` line of an order request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl OrderLine {
    /// Creates a new order line.
    pub fn new(product_id: ProductId, quantity: u32) -> Self {
        Self {
            product_id,
            quantity,
        }
    }
}

/// Request to place a new order.
#[derive(Debug, Clone, Default)]
pub struct PlaceOrder {
    /// Requested lines, kept in request order. Repeated products stay
    /// separate lines.
    pub lines: Vec<OrderLine>,

    /// Caller-supplied total. When absent the total is computed from the
    /// current product prices.
    pub total: Option<Money>,
}

impl PlaceOrder {
    /// Creates a request from lines, with a computed total.
    pub fn new(lines: Vec<OrderLine>) -> Self {
        Self { lines, total: None }
    }

    /// Adds a line.
    pub fn line(mut self, product_id: ProductId, quantity: u32) -> Self {
        self.lines.push(OrderLine::new(product_id, quantity));
        self
    }

    /// Uses the given total verbatim instead of computing one.
    pub fn with_total(mut self, total: Money) -> Self {
        self.total = Some(total);
        self
    }

    /// Distinct product ids referenced by the request, in first-seen order.
    pub fn product_ids(&self) -> Vec<ProductId> {
        let mut ids: Vec<ProductId> = Vec::with_capacity(self.lines.len());
        for line in &self.lines {
            if !ids.contains(&line.product_id) {
                ids.push(line.product_id);
            }
        }
        ids
    }
}
