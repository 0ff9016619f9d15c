//! Integration tests for the order lifecycle.
//!
//! These tests drive the services against the in-memory store and verify
//! placement atomicity, the status state machine and ownership rules.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use common::{Money, OrderId, OrderStatus, ProductId, UserId};
use domain::{CatalogService, DomainError, OrderService, PlaceOrder, Principal};
use store::{
    InMemoryStore, NewOrder, NewProduct, NewUser, Order, Product, ProductChanges, Store, User,
};
use tokio::sync::Barrier;

struct Fixture {
    store: InMemoryStore,
    orders: OrderService<InMemoryStore>,
    catalog: CatalogService<InMemoryStore>,
    admin: Principal,
}

impl Fixture {
    fn new() -> Self {
        let store = InMemoryStore::new();
        Self {
            orders: OrderService::new(store.clone()),
            catalog: CatalogService::new(store.clone()),
            store,
            admin: Principal::admin(UserId::new()),
        }
    }

    async fn user(&self, email: &str) -> Principal {
        let user = self
            .store
            .insert_user(NewUser {
                email: email.to_string(),
                password_hash: "hash".to_string(),
                is_admin: false,
            })
            .await
            .unwrap();
        Principal::user(user.id)
    }

    async fn product(&self, name: &str, price_cents: i64, stock: i32) -> ProductId {
        self.catalog
            .create_product(
                self.admin,
                NewProduct {
                    name: name.to_string(),
                    description: String::new(),
                    price: Money::from_cents(price_cents),
                    stock,
                },
            )
            .await
            .unwrap()
            .id
    }
}

/// Store whose order reads wait on a shared barrier before returning.
///
/// With one barrier slot per task, every task observes the same status
/// before any of them writes, so all but one compare-and-set must lose.
struct LockstepStore {
    inner: InMemoryStore,
    reads: Barrier,
}

impl LockstepStore {
    fn new(inner: InMemoryStore, tasks: usize) -> Self {
        Self {
            inner,
            reads: Barrier::new(tasks),
        }
    }
}

#[async_trait]
impl Store for LockstepStore {
    async fn insert_user(&self, user: NewUser) -> store::Result<User> {
        self.inner.insert_user(user).await
    }

    async fn find_user_by_email(&self, email: &str) -> store::Result<Option<User>> {
        self.inner.find_user_by_email(email).await
    }

    async fn insert_product(&self, product: NewProduct) -> store::Result<Product> {
        self.inner.insert_product(product).await
    }

    async fn find_product(&self, id: ProductId) -> store::Result<Option<Product>> {
        self.inner.find_product(id).await
    }

    async fn find_product_by_name(&self, name: &str) -> store::Result<Option<Product>> {
        self.inner.find_product_by_name(name).await
    }

    async fn list_products(&self) -> store::Result<Vec<Product>> {
        self.inner.list_products().await
    }

    async fn update_product(
        &self,
        id: ProductId,
        changes: ProductChanges,
    ) -> store::Result<Option<Product>> {
        self.inner.update_product(id, changes).await
    }

    async fn delete_product(&self, id: ProductId) -> store::Result<bool> {
        self.inner.delete_product(id).await
    }

    async fn insert_order(&self, order: NewOrder) -> store::Result<Order> {
        self.inner.insert_order(order).await
    }

    async fn find_order(&self, id: OrderId) -> store::Result<Option<Order>> {
        let order = self.inner.find_order(id).await?;
        self.reads.wait().await;
        Ok(order)
    }

    async fn list_orders_for_user(&self, user_id: UserId) -> store::Result<Vec<Order>> {
        self.inner.list_orders_for_user(user_id).await
    }

    async fn update_order_status(
        &self,
        id: OrderId,
        expected: OrderStatus,
        new: OrderStatus,
    ) -> store::Result<Order> {
        self.inner.update_order_status(id, expected, new).await
    }
}

mod order_lifecycle {
    use super::*;

    #[tokio::test]
    async fn widget_order_placed_cancelled_then_cancel_again_fails() {
        let fx = Fixture::new();
        let user = fx.user("u@example.com").await;
        let widget = fx.product("Widget", 1000, 5).await;

        let order = fx
            .orders
            .place_order(user, PlaceOrder::default().line(widget, 2))
            .await
            .unwrap();
        assert_eq!(order.total, Money::from_cents(2000));
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.user_id, user.user_id);
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].quantity, 2);
        assert_eq!(order.items[0].product_id, widget);

        let cancelled = fx.orders.cancel_order(user, order.id).await.unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);

        let again = fx.orders.cancel_order(user, order.id).await;
        assert!(matches!(
            again,
            Err(DomainError::InvalidTransition {
                from: OrderStatus::Cancelled,
                to: OrderStatus::Cancelled,
            })
        ));

        // Stock is left untouched by ordering
        let product = fx.catalog.get_product(widget).await.unwrap();
        assert_eq!(product.stock, 5);
    }

    #[tokio::test]
    async fn multi_item_order_persists_every_line() {
        let fx = Fixture::new();
        let user = fx.user("u@example.com").await;
        let widget = fx.product("Widget", 1000, 5).await;
        let gadget = fx.product("Gadget", 250, 5).await;
        let gizmo = fx.product("Gizmo", 99, 5).await;

        let order = fx
            .orders
            .place_order(
                user,
                PlaceOrder::default()
                    .line(widget, 1)
                    .line(gadget, 4)
                    .line(gizmo, 1),
            )
            .await
            .unwrap();

        assert_eq!(order.items.len(), 3);
        assert_eq!(order.total, Money::from_cents(1000 + 4 * 250 + 99));
        assert_eq!(fx.store.order_count().await, 1);
        assert_eq!(fx.store.order_item_count().await, 3);
    }

    #[tokio::test]
    async fn full_lifecycle_to_delivered() {
        let fx = Fixture::new();
        let user = fx.user("u@example.com").await;
        let widget = fx.product("Widget", 1000, 5).await;
        let order = fx
            .orders
            .place_order(user, PlaceOrder::default().line(widget, 1))
            .await
            .unwrap();

        let shipped = fx
            .orders
            .update_status(fx.admin, order.id, "Shipped")
            .await
            .unwrap();
        assert_eq!(shipped.status, OrderStatus::Shipped);

        let delivered = fx
            .orders
            .update_status(fx.admin, order.id, "Delivered")
            .await
            .unwrap();
        assert_eq!(delivered.status, OrderStatus::Delivered);

        let listed = fx.orders.list_orders(user).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].status, OrderStatus::Delivered);
    }

    #[tokio::test]
    async fn listing_only_returns_own_orders_in_creation_order() {
        let fx = Fixture::new();
        let alice = fx.user("alice@example.com").await;
        let bob = fx.user("bob@example.com").await;
        let widget = fx.product("Widget", 1000, 5).await;

        let mut expected = Vec::new();
        for (principal, quantity) in [(alice, 1), (bob, 1), (alice, 2), (alice, 3)] {
            let order = fx
                .orders
                .place_order(principal, PlaceOrder::default().line(widget, quantity))
                .await
                .unwrap();
            if principal == alice {
                expected.push(order.id);
            }
        }

        let ids: Vec<_> = fx
            .orders
            .list_orders(alice)
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.id)
            .collect();
        assert_eq!(ids, expected);
        assert_eq!(fx.orders.list_orders(bob).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn deleted_products_stay_on_existing_orders() {
        let fx = Fixture::new();
        let user = fx.user("u@example.com").await;
        let widget = fx.product("Widget", 1000, 5).await;
        let order = fx
            .orders
            .place_order(user, PlaceOrder::default().line(widget, 1))
            .await
            .unwrap();

        fx.catalog.delete_product(fx.admin, widget).await.unwrap();

        let order = fx.orders.get_order(user, order.id).await.unwrap();
        assert_eq!(order.items[0].product_id, widget);

        let result = fx
            .orders
            .place_order(user, PlaceOrder::default().line(widget, 1))
            .await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }
}

mod atomicity {
    use super::*;

    #[tokio::test]
    async fn missing_product_persists_nothing() {
        let fx = Fixture::new();
        let user = fx.user("u@example.com").await;
        let widget = fx.product("Widget", 1000, 5).await;
        let missing = ProductId::new();

        let result = fx
            .orders
            .place_order(
                user,
                PlaceOrder::default().line(widget, 1).line(missing, 1),
            )
            .await;

        match result {
            Err(DomainError::NotFound { entity, id }) => {
                assert_eq!(entity, "Product");
                assert_eq!(id, missing.to_string());
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
        assert_eq!(fx.store.order_count().await, 0);
        assert_eq!(fx.store.order_item_count().await, 0);
    }

    /// Runs `count` transitions against one order whose reads are held in
    /// lockstep, returning each outcome and the order's final status.
    async fn race<F, Fut>(
        count: usize,
        op: F,
    ) -> (Vec<Result<Order, DomainError>>, OrderStatus)
    where
        F: Fn(usize, Arc<OrderService<LockstepStore>>, Principal, Principal, OrderId) -> Fut,
        Fut: Future<Output = Result<Order, DomainError>> + Send + 'static,
    {
        let fx = Fixture::new();
        let user = fx.user("u@example.com").await;
        let widget = fx.product("Widget", 1000, 5).await;
        let order = fx
            .orders
            .place_order(user, PlaceOrder::default().line(widget, 1))
            .await
            .unwrap();

        let store = LockstepStore::new(fx.store.clone(), count);
        let orders = Arc::new(OrderService::new(store));
        let handles: Vec<_> = (0..count)
            .map(|i| tokio::spawn(op(i, Arc::clone(&orders), fx.admin, user, order.id)))
            .collect();

        let mut results = Vec::with_capacity(count);
        for handle in handles {
            results.push(handle.await.unwrap());
        }
        let status = fx.store.find_order(order.id).await.unwrap().unwrap().status;
        (results, status)
    }

    fn tally(results: &[Result<Order, DomainError>]) -> (usize, usize) {
        let wins = results.iter().filter(|r| r.is_ok()).count();
        let conflicts = results
            .iter()
            .filter(|r| matches!(r, Err(DomainError::Conflict(_))))
            .count();
        (wins, conflicts)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_transitions_from_same_status_only_one_wins() {
        let (results, status) = race(2, |i, orders, admin, user, id| async move {
            if i == 0 {
                orders.update_status(admin, id, "Shipped").await
            } else {
                orders.cancel_order(user, id).await
            }
        })
        .await;

        let (wins, conflicts) = tally(&results);
        assert_eq!(wins, 1);
        assert_eq!(conflicts, 1);

        let winner = results.iter().find_map(|r| r.as_ref().ok()).unwrap();
        assert_eq!(status, winner.status);
        assert_ne!(status, OrderStatus::Pending);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_cancels_only_one_succeeds() {
        let (results, status) = race(8, |_, orders, _, user, id| async move {
            orders.cancel_order(user, id).await
        })
        .await;

        let (wins, conflicts) = tally(&results);
        assert_eq!(wins, 1);
        assert_eq!(conflicts, 7);
        assert_eq!(status, OrderStatus::Cancelled);
    }
}

mod error_handling {
    use super::*;

    #[tokio::test]
    async fn cannot_cancel_another_users_order() {
        let fx = Fixture::new();
        let owner = fx.user("owner@example.com").await;
        let other = fx.user("other@example.com").await;
        let widget = fx.product("Widget", 1000, 5).await;
        let order = fx
            .orders
            .place_order(owner, PlaceOrder::default().line(widget, 1))
            .await
            .unwrap();

        let result = fx.orders.cancel_order(other, order.id).await;
        assert!(matches!(result, Err(DomainError::Unauthorized(_))));

        let order = fx.orders.get_order(owner, order.id).await.unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn cannot_cancel_delivered_order() {
        let fx = Fixture::new();
        let user = fx.user("u@example.com").await;
        let widget = fx.product("Widget", 1000, 5).await;
        let order = fx
            .orders
            .place_order(user, PlaceOrder::default().line(widget, 1))
            .await
            .unwrap();
        fx.orders
            .update_status(fx.admin, order.id, "Shipped")
            .await
            .unwrap();
        fx.orders
            .update_status(fx.admin, order.id, "Delivered")
            .await
            .unwrap();

        let result = fx.orders.cancel_order(user, order.id).await;
        assert!(matches!(
            result,
            Err(DomainError::InvalidTransition {
                from: OrderStatus::Delivered,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn unknown_status_label_is_rejected_in_every_state() {
        let fx = Fixture::new();
        let user = fx.user("u@example.com").await;
        let widget = fx.product("Widget", 1000, 5).await;
        let order = fx
            .orders
            .place_order(user, PlaceOrder::default().line(widget, 1))
            .await
            .unwrap();

        for next in ["Shipped", "Delivered"] {
            for label in ["Bogus", "pending", "SHIPPED", ""] {
                let result = fx.orders.update_status(fx.admin, order.id, label).await;
                assert!(
                    matches!(result, Err(DomainError::Validation(_))),
                    "label {label:?} should be rejected"
                );
            }
            fx.orders
                .update_status(fx.admin, order.id, next)
                .await
                .unwrap();
        }

        let result = fx.orders.update_status(fx.admin, order.id, "Bogus").await;
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn duplicate_product_name_conflicts() {
        let fx = Fixture::new();
        fx.product("Widget", 1000, 5).await;

        let result = fx
            .catalog
            .create_product(
                fx.admin,
                NewProduct {
                    name: "Widget".to_string(),
                    description: "again".to_string(),
                    price: Money::from_cents(500),
                    stock: 1,
                },
            )
            .await;
        assert!(matches!(result, Err(DomainError::Conflict(_))));

        fx.product("Widget Pro", 1500, 1).await;
    }

    #[tokio::test]
    async fn regular_users_cannot_update_status() {
        let fx = Fixture::new();
        let user = fx.user("u@example.com").await;
        let widget = fx.product("Widget", 1000, 5).await;
        let order = fx
            .orders
            .place_order(user, PlaceOrder::default().line(widget, 1))
            .await
            .unwrap();

        let result = fx.orders.update_status(user, order.id, "Shipped").await;
        assert!(matches!(result, Err(DomainError::Unauthorized(_))));
    }
}
