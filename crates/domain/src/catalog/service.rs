//! Catalog service enforcing product rules on top of the store.

use common::ProductId;
use store::{NewProduct, Product, ProductChanges, Store, StoreExt};

use crate::error::{DomainError, Result};
use crate::policy;
use crate::principal::Principal;
use crate::validation::{require_name, require_price, require_stock};

/// Service for managing catalog products.
///
/// Reads are open to everyone. Mutations require the admin capability.
pub struct CatalogService<S: Store> {
    store: S,
}

impl<S: Store> CatalogService<S> {
    /// Creates a new catalog service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Creates a product with a name unique among active products.
    #[tracing::instrument(skip(self, product), fields(name = %product.name))]
    pub async fn create_product(
        &self,
        principal: Principal,
        product: NewProduct,
    ) -> Result<Product> {
        policy::manage_catalog(&principal).into_result()?;

        require_name(&product.name)?;
        require_price(product.price)?;
        require_stock(product.stock)?;

        if self.store.product_name_taken(&product.name).await? {
            return Err(name_conflict(&product.name));
        }

        // Re-checked by the store under its own lock
        let product = self.store.insert_product(product).await?;

        metrics::counter!("products_created_total").increment(1);
        tracing::info!(product_id = %product.id, "Product created");

        Ok(product)
    }

    /// Lists all active products in creation order.
    pub async fn list_products(&self) -> Result<Vec<Product>> {
        Ok(self.store.list_products().await?)
    }

    /// Fetches an active product.
    pub async fn get_product(&self, id: ProductId) -> Result<Product> {
        self.store
            .find_product(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Product", id))
    }

    /// Applies a partial update to a product.
    #[tracing::instrument(skip(self, changes))]
    pub async fn update_product(
        &self,
        principal: Principal,
        id: ProductId,
        changes: ProductChanges,
    ) -> Result<Product> {
        policy::manage_catalog(&principal).into_result()?;
        self.get_product(id).await?;

        if changes.is_empty() {
            return Err(DomainError::validation("No fields to update"));
        }
        if let Some(name) = &changes.name {
            require_name(name)?;
        }
        if let Some(price) = changes.price {
            require_price(price)?;
        }
        if let Some(stock) = changes.stock {
            require_stock(stock)?;
        }

        if let Some(name) = &changes.name
            && let Some(existing) = self.store.find_product_by_name(name).await?
            && existing.id != id
        {
            return Err(name_conflict(name));
        }

        let product = self
            .store
            .update_product(id, changes)
            .await?
            .ok_or_else(|| DomainError::not_found("Product", id))?;

        tracing::info!(product_id = %product.id, "Product updated");
        Ok(product)
    }

    /// Soft-deletes a product. Existing order lines keep referencing it.
    #[tracing::instrument(skip(self))]
    pub async fn delete_product(&self, principal: Principal, id: ProductId) -> Result<()> {
        policy::manage_catalog(&principal).into_result()?;

        if !self.store.delete_product(id).await? {
            return Err(DomainError::not_found("Product", id));
        }

        tracing::info!(product_id = %id, "Product deleted");
        Ok(())
    }
}

fn name_conflict(name: &str) -> DomainError {
    DomainError::Conflict(format!("Product with name {name:?} already exists"))
}
