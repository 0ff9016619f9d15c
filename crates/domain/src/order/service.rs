//! Order service providing the order lifecycle operations.

use common::{Money, OrderId, OrderStatus};
use store::{NewOrder, NewOrderItem, Order, Store, StoreExt};

use crate::error::{DomainError, Result};
use crate::policy;
use crate::principal::Principal;
use crate::validation::require_quantity;

use super::PlaceOrder;

/// Service for managing orders.
///
/// Every operation takes the acting [`Principal`] and applies the rules in
/// [`crate::policy`] before touching the store.
pub struct OrderService<S: Store> {
    store: S,
}

impl<S: Store> OrderService<S> {
    /// Creates a new order service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Places an order for the principal.
    ///
    /// All referenced products must exist. The header and every line are
    /// written in a single store call, so a failure leaves nothing behind.
    #[tracing::instrument(skip(self, cmd), fields(user_id = %principal.user_id, lines = cmd.lines.len()))]
    pub async fn place_order(&self, principal: Principal, cmd: PlaceOrder) -> Result<Order> {
        if cmd.lines.is_empty() {
            return Err(DomainError::validation("Order must contain at least one item"));
        }
        for line in &cmd.lines {
            require_quantity(line.quantity)?;
        }

        let products = self.store.find_products(&cmd.product_ids()).await?;

        let mut items = Vec::with_capacity(cmd.lines.len());
        for line in &cmd.lines {
            let product = products
                .get(&line.product_id)
                .ok_or_else(|| DomainError::not_found("Product", line.product_id))?;
            items.push(NewOrderItem {
                product_id: line.product_id,
                quantity: line.quantity,
                unit_price: product.price,
            });
        }

        let total = match cmd.total {
            Some(total) => total,
            None => order_total(&items)?,
        };

        let order = self
            .store
            .insert_order(NewOrder {
                user_id: principal.user_id,
                total,
                items,
            })
            .await?;

        metrics::counter!("orders_placed_total").increment(1);
        tracing::info!(order_id = %order.id, total = %order.total, "Order placed");

        Ok(order)
    }

    /// Lists the principal's own orders in creation order.
    #[tracing::instrument(skip(self), fields(user_id = %principal.user_id))]
    pub async fn list_orders(&self, principal: Principal) -> Result<Vec<Order>> {
        Ok(self.store.list_orders_for_user(principal.user_id).await?)
    }

    /// Fetches a single order visible to the principal.
    #[tracing::instrument(skip(self), fields(user_id = %principal.user_id))]
    pub async fn get_order(&self, principal: Principal, order_id: OrderId) -> Result<Order> {
        let order = self.load(order_id).await?;
        policy::view_order(&principal, &order).into_result()?;
        Ok(order)
    }

    /// Moves an order to the status named by `label`. Admin only.
    #[tracing::instrument(skip(self), fields(user_id = %principal.user_id))]
    pub async fn update_status(
        &self,
        principal: Principal,
        order_id: OrderId,
        label: &str,
    ) -> Result<Order> {
        let order = self.load(order_id).await?;
        policy::update_order_status(&principal).into_result()?;

        let next = OrderStatus::parse(label).map_err(|e| DomainError::validation(e.to_string()))?;
        let order = self.transition(order, next).await?;

        metrics::counter!("order_status_updates_total", "status" => next.as_str()).increment(1);
        tracing::info!(order_id = %order.id, status = %order.status, "Order status updated");

        Ok(order)
    }

    /// Cancels one of the principal's own orders.
    #[tracing::instrument(skip(self), fields(user_id = %principal.user_id))]
    pub async fn cancel_order(&self, principal: Principal, order_id: OrderId) -> Result<Order> {
        let order = self.load(order_id).await?;
        policy::cancel_order(&principal, &order).into_result()?;

        let order = self.transition(order, OrderStatus::Cancelled).await?;

        metrics::counter!("orders_cancelled_total").increment(1);
        tracing::info!(order_id = %order.id, "Order cancelled");

        Ok(order)
    }

    async fn load(&self, order_id: OrderId) -> Result<Order> {
        self.store
            .find_order(order_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Order", order_id))
    }

    /// Checks the edge against the state machine, then writes it with
    /// compare-and-set on the status that was read.
    async fn transition(&self, order: Order, next: OrderStatus) -> Result<Order> {
        if !order.status.can_transition_to(next) {
            return Err(DomainError::InvalidTransition {
                from: order.status,
                to: next,
            });
        }

        Ok(self
            .store
            .update_order_status(order.id, order.status, next)
            .await?)
    }
}

/// Sums `unit_price * quantity` over the lines.
fn order_total(items: &[NewOrderItem]) -> Result<Money> {
    items.iter().try_fold(Money::zero(), |total, item| {
        item.unit_price
            .checked_multiply(item.quantity)
            .and_then(|line| total.checked_add(line))
            .ok_or_else(|| DomainError::validation("Order total is out of range"))
    })
}
