//! Domain layer for the storefront.
//!
//! This crate provides the business rules on top of the store:
//! - Order placement, listing and the status state machine
//! - Catalog management with active-name uniqueness
//! - The authorization policy applied to every operation

pub mod catalog;
pub mod error;
pub mod order;
pub mod policy;
pub mod principal;
pub mod validation;

pub use catalog::CatalogService;
pub use error::{DomainError, Result};
pub use order::{OrderLine, OrderService, PlaceOrder};
pub use policy::Decision;
pub use principal::Principal;
