use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{OrderId, OrderItemId, OrderStatus, ProductId, UserId};
use tokio::sync::RwLock;

use crate::{
    NewOrder, NewProduct, NewUser, Order, OrderItem, Product, ProductChanges, Result, StoreError,
    User,
    store::{Store, validate_new_order},
};

/// A product row, including soft-deleted ones.
#[derive(Debug, Clone)]
struct ProductRow {
    product: Product,
    deleted_at: Option<DateTime<Utc>>,
}

impl ProductRow {
    fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    users: Vec<User>,
    products: Vec<ProductRow>,
    orders: Vec<Order>,
}

impl MemoryState {
    fn active_product(&self, id: ProductId) -> Option<&ProductRow> {
        self.products
            .iter()
            .find(|row| row.product.id == id && row.is_active())
    }

    fn name_taken(&self, name: &str, except: Option<ProductId>) -> bool {
        self.products.iter().any(|row| {
            row.is_active() && row.product.name == name && Some(row.product.id) != except
        })
    }
}

/// In-memory store implementation.
///
/// Stores everything behind a single lock, so each trait method is one atomic
/// unit of work. Provides the same interface as the PostgreSQL implementation.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of orders stored.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    /// Returns the number of order lines stored across all orders.
    pub async fn order_item_count(&self) -> usize {
        self.state
            .read()
            .await
            .orders
            .iter()
            .map(|order| order.items.len())
            .sum()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn insert_user(&self, user: NewUser) -> Result<User> {
        let mut state = self.state.write().await;

        if state.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::DuplicateEmail(user.email));
        }

        let user = User {
            id: UserId::new(),
            email: user.email,
            password_hash: user.password_hash,
            is_admin: user.is_admin,
            created_at: Utc::now(),
        };
        state.users.push(user.clone());
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.email == email).cloned())
    }

    async fn insert_product(&self, product: NewProduct) -> Result<Product> {
        let mut state = self.state.write().await;

        if state.name_taken(&product.name, None) {
            return Err(StoreError::DuplicateName(product.name));
        }

        let now = Utc::now();
        let product = Product {
            id: ProductId::new(),
            name: product.name,
            description: product.description,
            price: product.price,
            stock: product.stock,
            created_at: now,
            updated_at: now,
        };
        state.products.push(ProductRow {
            product: product.clone(),
            deleted_at: None,
        });
        Ok(product)
    }

    async fn find_product(&self, id: ProductId) -> Result<Option<Product>> {
        let state = self.state.read().await;
        Ok(state.active_product(id).map(|row| row.product.clone()))
    }

    async fn find_product_by_name(&self, name: &str) -> Result<Option<Product>> {
        let state = self.state.read().await;
        Ok(state
            .products
            .iter()
            .find(|row| row.is_active() && row.product.name == name)
            .map(|row| row.product.clone()))
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        let state = self.state.read().await;
        Ok(state
            .products
            .iter()
            .filter(|row| row.is_active())
            .map(|row| row.product.clone())
            .collect())
    }

    async fn update_product(
        &self,
        id: ProductId,
        changes: ProductChanges,
    ) -> Result<Option<Product>> {
        let mut state = self.state.write().await;

        if state.active_product(id).is_none() {
            return Ok(None);
        }

        if let Some(name) = &changes.name
            && state.name_taken(name, Some(id))
        {
            return Err(StoreError::DuplicateName(name.clone()));
        }

        let Some(row) = state
            .products
            .iter_mut()
            .find(|row| row.product.id == id && row.is_active())
        else {
            return Ok(None);
        };

        changes.apply_to(&mut row.product);
        row.product.updated_at = Utc::now();
        Ok(Some(row.product.clone()))
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool> {
        let mut state = self.state.write().await;

        match state
            .products
            .iter_mut()
            .find(|row| row.product.id == id && row.is_active())
        {
            Some(row) => {
                let now = Utc::now();
                row.deleted_at = Some(now);
                row.product.updated_at = now;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn insert_order(&self, order: NewOrder) -> Result<Order> {
        validate_new_order(&order)?;

        let mut state = self.state.write().await;

        // Check every product before writing anything
        if let Some(missing) = order
            .items
            .iter()
            .find(|item| state.active_product(item.product_id).is_none())
        {
            return Err(StoreError::ProductNotFound(missing.product_id));
        }

        let order_id = OrderId::new();
        let now = Utc::now();
        let items = order
            .items
            .into_iter()
            .map(|item| OrderItem {
                id: OrderItemId::new(),
                order_id,
                product_id: item.product_id,
                quantity: item.quantity,
                unit_price: item.unit_price,
            })
            .collect();

        let order = Order {
            id: order_id,
            user_id: order.user_id,
            status: OrderStatus::Pending,
            total: order.total,
            ordered_at: now,
            updated_at: now,
            items,
        };
        state.orders.push(order.clone());
        Ok(order)
    }

    async fn find_order(&self, id: OrderId) -> Result<Option<Order>> {
        let state = self.state.read().await;
        Ok(state.orders.iter().find(|o| o.id == id).cloned())
    }

    async fn list_orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        let state = self.state.read().await;
        Ok(state
            .orders
            .iter()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn update_order_status(
        &self,
        id: OrderId,
        expected: OrderStatus,
        new: OrderStatus,
    ) -> Result<Order> {
        let mut state = self.state.write().await;

        let order = state
            .orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or(StoreError::OrderNotFound(id))?;

        if order.status != expected {
            return Err(StoreError::StatusConflict {
                order_id: id,
                expected,
                actual: order.status,
            });
        }

        order.status = new;
        order.updated_at = Utc::now();
        Ok(order.clone())
    }
}

#[cfg(test)]
mod tests {
    use common::Money;

    use super::*;
    use crate::{NewOrderItem, StoreExt};

    fn new_product(name: &str) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            description: String::new(),
            price: Money::from_cents(1000),
            stock: 5,
        }
    }

    fn line(product_id: ProductId, quantity: u32) -> NewOrderItem {
        NewOrderItem {
            product_id,
            quantity,
            unit_price: Money::from_cents(1000),
        }
    }

    #[tokio::test]
    async fn test_insert_and_find_user() {
        let store = InMemoryStore::new();
        let user = store
            .insert_user(NewUser {
                email: "a@example.com".to_string(),
                password_hash: "hash".to_string(),
                is_admin: false,
            })
            .await
            .unwrap();

        let found = store.find_user_by_email("a@example.com").await.unwrap();
        assert_eq!(found, Some(user));
        assert!(store.find_user_by_email("A@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = InMemoryStore::new();
        let new_user = NewUser {
            email: "a@example.com".to_string(),
            password_hash: "hash".to_string(),
            is_admin: false,
        };
        store.insert_user(new_user.clone()).await.unwrap();

        let result = store.insert_user(new_user).await;
        assert!(matches!(result, Err(StoreError::DuplicateEmail(_))));
    }

    #[tokio::test]
    async fn test_duplicate_product_name_rejected() {
        let store = InMemoryStore::new();
        store.insert_product(new_product("Widget")).await.unwrap();

        let result = store.insert_product(new_product("Widget")).await;
        assert!(matches!(result, Err(StoreError::DuplicateName(_))));

        // Exact match only
        assert!(store.insert_product(new_product("widget")).await.is_ok());
    }

    #[tokio::test]
    async fn test_deleted_product_frees_name_and_disappears() {
        let store = InMemoryStore::new();
        let product = store.insert_product(new_product("Widget")).await.unwrap();

        assert!(store.delete_product(product.id).await.unwrap());
        assert!(!store.delete_product(product.id).await.unwrap());
        assert!(store.find_product(product.id).await.unwrap().is_none());
        assert!(store.list_products().await.unwrap().is_empty());
        assert!(!store.product_name_taken("Widget").await.unwrap());

        assert!(store.insert_product(new_product("Widget")).await.is_ok());
    }

    #[tokio::test]
    async fn test_update_product_rename_conflict() {
        let store = InMemoryStore::new();
        store.insert_product(new_product("Widget")).await.unwrap();
        let gadget = store.insert_product(new_product("Gadget")).await.unwrap();

        let result = store
            .update_product(
                gadget.id,
                ProductChanges {
                    name: Some("Widget".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(StoreError::DuplicateName(_))));

        // Renaming onto its own name is fine
        let updated = store
            .update_product(
                gadget.id,
                ProductChanges {
                    name: Some("Gadget".to_string()),
                    stock: Some(9),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.stock, 9);

        let missing = store
            .update_product(ProductId::new(), ProductChanges::default())
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_insert_order_with_missing_product_writes_nothing() {
        let store = InMemoryStore::new();
        let product = store.insert_product(new_product("Widget")).await.unwrap();
        let missing = ProductId::new();

        let result = store
            .insert_order(NewOrder {
                user_id: UserId::new(),
                total: Money::from_cents(2000),
                items: vec![line(product.id, 1), line(missing, 1)],
            })
            .await;

        assert!(matches!(result, Err(StoreError::ProductNotFound(id)) if id == missing));
        assert_eq!(store.order_count().await, 0);
        assert_eq!(store.order_item_count().await, 0);
    }

    #[tokio::test]
    async fn test_insert_order_keeps_line_order() {
        let store = InMemoryStore::new();
        let a = store.insert_product(new_product("A")).await.unwrap();
        let b = store.insert_product(new_product("B")).await.unwrap();

        let order = store
            .insert_order(NewOrder {
                user_id: UserId::new(),
                total: Money::from_cents(3000),
                items: vec![line(b.id, 2), line(a.id, 1)],
            })
            .await
            .unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.items[0].product_id, b.id);
        assert_eq!(order.items[1].product_id, a.id);
        assert!(order.items.iter().all(|item| item.order_id == order.id));

        let found = store.find_order(order.id).await.unwrap().unwrap();
        assert_eq!(found, order);
    }

    #[tokio::test]
    async fn test_list_orders_for_user_filters_by_owner() {
        let store = InMemoryStore::new();
        let product = store.insert_product(new_product("Widget")).await.unwrap();
        let alice = UserId::new();
        let bob = UserId::new();

        for user_id in [alice, bob, alice] {
            store
                .insert_order(NewOrder {
                    user_id,
                    total: Money::from_cents(1000),
                    items: vec![line(product.id, 1)],
                })
                .await
                .unwrap();
        }

        let orders = store.list_orders_for_user(alice).await.unwrap();
        assert_eq!(orders.len(), 2);
        assert!(orders.iter().all(|o| o.user_id == alice));
        assert!(orders[0].ordered_at <= orders[1].ordered_at);
    }

    #[tokio::test]
    async fn test_update_order_status_compare_and_set() {
        let store = InMemoryStore::new();
        let product = store.insert_product(new_product("Widget")).await.unwrap();
        let order = store
            .insert_order(NewOrder {
                user_id: UserId::new(),
                total: Money::from_cents(1000),
                items: vec![line(product.id, 1)],
            })
            .await
            .unwrap();

        let shipped = store
            .update_order_status(order.id, OrderStatus::Pending, OrderStatus::Shipped)
            .await
            .unwrap();
        assert_eq!(shipped.status, OrderStatus::Shipped);

        // A second writer that still believes the order is Pending loses
        let result = store
            .update_order_status(order.id, OrderStatus::Pending, OrderStatus::Cancelled)
            .await;
        assert!(matches!(
            result,
            Err(StoreError::StatusConflict {
                actual: OrderStatus::Shipped,
                ..
            })
        ));

        let result = store
            .update_order_status(OrderId::new(), OrderStatus::Pending, OrderStatus::Shipped)
            .await;
        assert!(matches!(result, Err(StoreError::OrderNotFound(_))));
    }
}
