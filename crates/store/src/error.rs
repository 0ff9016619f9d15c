use common::{OrderId, OrderStatus, ProductId};
use thiserror::Error;

/// Errors that can occur when interacting with the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A product referenced by a write does not exist (or was deleted).
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// The order targeted by a status update does not exist.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// Another active product already uses this name.
    #[error("Product name already in use: {0}")]
    DuplicateName(String),

    /// Another user already registered this email.
    #[error("Email already registered: {0}")]
    DuplicateEmail(String),

    /// The order's status changed between read and write.
    #[error(
        "Status conflict for order {order_id}: expected {expected}, found {actual}"
    )]
    StatusConflict {
        order_id: OrderId,
        expected: OrderStatus,
        actual: OrderStatus,
    },

    /// A write was rejected before reaching storage.
    #[error("Invalid write: {0}")]
    InvalidWrite(String),

    /// A stored row could not be mapped back to a record.
    #[error("Corrupt row: {0}")]
    Corrupt(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
