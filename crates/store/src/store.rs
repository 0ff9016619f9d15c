use std::collections::HashMap;

use async_trait::async_trait;
use common::{OrderId, OrderStatus, ProductId, UserId};

use crate::{
    NewOrder, NewProduct, NewUser, Order, Product, ProductChanges, Result, StoreError, User,
};

/// Core trait for persistence gateway implementations.
///
/// Every method is a single unit of work: either all of its writes become
/// visible or none do. All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait Store: Send + Sync {
    /// Inserts a user.
    ///
    /// Fails with `DuplicateEmail` if the email is already registered.
    async fn insert_user(&self, user: NewUser) -> Result<User>;

    /// Finds a user by exact email.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Inserts a product.
    ///
    /// Fails with `DuplicateName` if an active product already has this name.
    async fn insert_product(&self, product: NewProduct) -> Result<Product>;

    /// Finds an active product by id.
    async fn find_product(&self, id: ProductId) -> Result<Option<Product>>;

    /// Finds an active product by exact name.
    async fn find_product_by_name(&self, name: &str) -> Result<Option<Product>>;

    /// Lists active products in creation order.
    async fn list_products(&self) -> Result<Vec<Product>>;

    /// Applies a partial update to an active product.
    ///
    /// Returns None if the product doesn't exist. Fails with `DuplicateName`
    /// if the new name collides with another active product.
    async fn update_product(&self, id: ProductId, changes: ProductChanges)
    -> Result<Option<Product>>;

    /// Soft-deletes an active product.
    ///
    /// Returns false if the product doesn't exist. Order lines keep
    /// referencing deleted products.
    async fn delete_product(&self, id: ProductId) -> Result<bool>;

    /// Inserts an order header and all of its lines atomically.
    ///
    /// Every referenced product is re-checked inside the same unit of work;
    /// if one is missing nothing is written and `ProductNotFound` is returned.
    async fn insert_order(&self, order: NewOrder) -> Result<Order>;

    /// Finds an order (with its lines) by id.
    async fn find_order(&self, id: OrderId) -> Result<Option<Order>>;

    /// Lists a user's orders (with lines) in creation order.
    async fn list_orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>>;

    /// Moves an order from `expected` to `new` status.
    ///
    /// The read of the current status and the write happen in one unit of
    /// work. Fails with `StatusConflict` if the current status is no longer
    /// `expected`, and `OrderNotFound` if the order doesn't exist.
    async fn update_order_status(
        &self,
        id: OrderId,
        expected: OrderStatus,
        new: OrderStatus,
    ) -> Result<Order>;
}

/// Extension trait providing convenience methods for stores.
#[async_trait]
pub trait StoreExt: Store {
    /// Looks up several products at once, keyed by id.
    ///
    /// Missing or deleted products are simply absent from the map.
    async fn find_products(&self, ids: &[ProductId]) -> Result<HashMap<ProductId, Product>> {
        let mut found = HashMap::with_capacity(ids.len());
        for id in ids {
            if found.contains_key(id) {
                continue;
            }
            if let Some(product) = self.find_product(*id).await? {
                found.insert(*id, product);
            }
        }
        Ok(found)
    }

    /// Checks if an active product with this exact name exists.
    async fn product_name_taken(&self, name: &str) -> Result<bool> {
        Ok(self.find_product_by_name(name).await?.is_some())
    }
}

// Blanket implementation for all Store implementations
impl<T: Store + ?Sized> StoreExt for T {}

/// Validates an order before inserting it.
pub fn validate_new_order(order: &NewOrder) -> Result<()> {
    if order.items.is_empty() {
        return Err(StoreError::InvalidWrite(
            "Cannot insert an order without items".to_string(),
        ));
    }

    if let Some(item) = order.items.iter().find(|item| item.quantity == 0) {
        return Err(StoreError::InvalidWrite(format!(
            "Order line for product {} has zero quantity",
            item.product_id
        )));
    }

    if order.items.iter().any(|item| item.quantity > i32::MAX as u32) {
        return Err(StoreError::InvalidWrite(
            "Order line quantity out of range".to_string(),
        ));
    }

    Ok(())
}
