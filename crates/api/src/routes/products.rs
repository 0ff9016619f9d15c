//! Catalog endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use chrono::{DateTime, Utc};
use common::{Money, ProductId};
use serde::{Deserialize, Serialize};
use store::{NewProduct, Product, ProductChanges, Store};

use crate::AppState;
use crate::error::ApiError;
use crate::extract::AuthUser;
use crate::response::{Envelope, Success};

// -- Request types --

#[derive(Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price_cents: i64,
    pub stock: i32,
}

impl From<CreateProductRequest> for NewProduct {
    fn from(req: CreateProductRequest) -> Self {
        NewProduct {
            name: req.name,
            description: req.description,
            price: Money::from_cents(req.price_cents),
            stock: req.stock,
        }
    }
}

/// Partial update; omitted fields are left unchanged.
#[derive(Deserialize, Default)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub stock: Option<i32>,
}

impl From<UpdateProductRequest> for ProductChanges {
    fn from(req: UpdateProductRequest) -> Self {
        ProductChanges {
            name: req.name,
            description: req.description,
            price: req.price_cents.map(Money::from_cents),
            stock: req.stock,
        }
    }
}

// -- Response types --

#[derive(Serialize)]
pub struct ProductResponse {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price_cents: i64,
    pub stock: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            name: product.name,
            description: product.description,
            price_cents: product.price.cents(),
            stock: product.stock,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

// -- Handlers --

/// GET /products: list active products.
#[tracing::instrument(skip_all)]
pub async fn list<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Success<Vec<ProductResponse>>, ApiError> {
    let products = state.catalog.list_products().await?;

    Ok(Success::ok(
        "Products retrieved successfully",
        products.into_iter().map(ProductResponse::from).collect(),
    ))
}

/// GET /products/{id}: fetch one active product.
#[tracing::instrument(skip_all)]
pub async fn get<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    id: Result<Path<ProductId>, PathRejection>,
) -> Result<Success<ProductResponse>, ApiError> {
    let Path(id) = id?;
    let product = state.catalog.get_product(id).await?;

    Ok(Success::ok("Product retrieved successfully", product.into()))
}

/// POST /products: create a product (admin).
#[tracing::instrument(skip_all)]
pub async fn create<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(principal): AuthUser,
    body: Result<Json<CreateProductRequest>, JsonRejection>,
) -> Result<Success<ProductResponse>, ApiError> {
    let Json(req) = body?;
    let product = state.catalog.create_product(principal, req.into()).await?;

    Ok(Success::created("Product created successfully", product.into()))
}

/// PUT /products/{id}: partially update a product (admin).
#[tracing::instrument(skip_all)]
pub async fn update<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(principal): AuthUser,
    id: Result<Path<ProductId>, PathRejection>,
    body: Result<Json<UpdateProductRequest>, JsonRejection>,
) -> Result<Success<ProductResponse>, ApiError> {
    let Path(id) = id?;
    let Json(req) = body?;
    let product = state
        .catalog
        .update_product(principal, id, req.into())
        .await?;

    Ok(Success::ok("Product updated successfully", product.into()))
}

/// DELETE /products/{id}: soft-delete a product (admin).
#[tracing::instrument(skip_all)]
pub async fn delete<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(principal): AuthUser,
    id: Result<Path<ProductId>, PathRejection>,
) -> Result<Json<Envelope<()>>, ApiError> {
    let Path(id) = id?;
    state.catalog.delete_product(principal, id).await?;

    Ok(Json(Envelope::message("Product deleted successfully")))
}
