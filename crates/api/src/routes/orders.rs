//! Order endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use chrono::{DateTime, Utc};
use common::{Money, OrderId, OrderItemId, OrderStatus, ProductId, UserId};
use domain::{OrderLine, PlaceOrder};
use serde::{Deserialize, Serialize};
use store::{Order, OrderItem, Store};

use crate::AppState;
use crate::error::ApiError;
use crate::extract::AuthUser;
use crate::response::Success;

// -- Request types --

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub items: Vec<OrderItemRequest>,
    /// Overrides the computed total when present.
    pub total_cents: Option<i64>,
}

#[derive(Deserialize)]
pub struct OrderItemRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl From<CreateOrderRequest> for PlaceOrder {
    fn from(req: CreateOrderRequest) -> Self {
        PlaceOrder {
            lines: req
                .items
                .into_iter()
                .map(|item| OrderLine::new(item.product_id, item.quantity))
                .collect(),
            total: req.total_cents.map(Money::from_cents),
        }
    }
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub total_cents: i64,
    pub ordered_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<OrderItemResponse>,
}

#[derive(Serialize)]
pub struct OrderItemResponse {
    pub id: OrderItemId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price_cents: i64,
}

impl From<OrderItem> for OrderItemResponse {
    fn from(item: OrderItem) -> Self {
        Self {
            id: item.id,
            product_id: item.product_id,
            quantity: item.quantity,
            unit_price_cents: item.unit_price.cents(),
        }
    }
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            user_id: order.user_id,
            status: order.status,
            total_cents: order.total.cents(),
            ordered_at: order.ordered_at,
            updated_at: order.updated_at,
            items: order.items.into_iter().map(Into::into).collect(),
        }
    }
}

// -- Handlers --

/// POST /orders: place an order for the caller.
#[tracing::instrument(skip_all)]
pub async fn create<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(principal): AuthUser,
    body: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<Success<OrderResponse>, ApiError> {
    let Json(req) = body?;
    let order = state.orders.place_order(principal, req.into()).await?;

    Ok(Success::created("Order created successfully", order.into()))
}

/// GET /orders: list the caller's orders.
#[tracing::instrument(skip_all)]
pub async fn list<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(principal): AuthUser,
) -> Result<Success<Vec<OrderResponse>>, ApiError> {
    let orders = state.orders.list_orders(principal).await?;

    Ok(Success::ok(
        "Orders retrieved successfully",
        orders.into_iter().map(OrderResponse::from).collect(),
    ))
}

/// GET /orders/{id}: fetch one order (owner or admin).
#[tracing::instrument(skip_all)]
pub async fn get<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(principal): AuthUser,
    id: Result<Path<OrderId>, PathRejection>,
) -> Result<Success<OrderResponse>, ApiError> {
    let Path(id) = id?;
    let order = state.orders.get_order(principal, id).await?;

    Ok(Success::ok("Order retrieved successfully", order.into()))
}

/// PUT /orders/{id}: move an order to a new status (admin).
#[tracing::instrument(skip_all)]
pub async fn update_status<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(principal): AuthUser,
    id: Result<Path<OrderId>, PathRejection>,
    body: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Success<OrderResponse>, ApiError> {
    let Path(id) = id?;
    let Json(req) = body?;
    let order = state
        .orders
        .update_status(principal, id, &req.status)
        .await?;

    Ok(Success::ok("Order status updated successfully", order.into()))
}

/// DELETE /orders/{id}: cancel one of the caller's orders.
#[tracing::instrument(skip_all)]
pub async fn cancel<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(principal): AuthUser,
    id: Result<Path<OrderId>, PathRejection>,
) -> Result<Success<OrderResponse>, ApiError> {
    let Path(id) = id?;
    let order = state.orders.cancel_order(principal, id).await?;

    Ok(Success::ok("Order cancelled successfully", order.into()))
}
