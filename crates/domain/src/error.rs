//! Domain error types.

use common::OrderStatus;
use store::StoreError;
use thiserror::Error;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Malformed or missing input.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A uniqueness rule or a concurrent write was violated.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The principal lacks the capability for this operation.
    #[error("Not authorized: {0}")]
    Unauthorized(String),

    /// The requested status change is not an edge of the state machine.
    #[error("Invalid status transition: cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// The store failed.
    #[error("Store error: {0}")]
    Store(StoreError),
}

impl DomainError {
    /// Creates a `NotFound` error for the given entity kind.
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        DomainError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Creates a `Validation` error.
    pub fn validation(message: impl Into<String>) -> Self {
        DomainError::Validation(message.into())
    }
}

impl From<StoreError> for DomainError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ProductNotFound(id) => DomainError::not_found("Product", id),
            StoreError::OrderNotFound(id) => DomainError::not_found("Order", id),
            StoreError::DuplicateName(name) => {
                DomainError::Conflict(format!("Product with name {name:?} already exists"))
            }
            StoreError::DuplicateEmail(email) => {
                DomainError::Conflict(format!("Email {email:?} is already registered"))
            }
            StoreError::StatusConflict {
                order_id, actual, ..
            } => DomainError::Conflict(format!(
                "Order {order_id} was concurrently moved to {actual}"
            )),
            StoreError::InvalidWrite(message) => DomainError::Validation(message),
            other => DomainError::Store(other),
        }
    }
}

/// Result type for domain operations.
pub type Result<T> = std::result::Result<T, DomainError>;
