//! Persistence gateway for the storefront.
//!
//! The [`Store`] trait is the only way the domain reaches storage. Two
//! implementations are provided: [`InMemoryStore`] for tests and local runs,
//! and [`PostgresStore`] backed by `sqlx`.

pub mod error;
pub mod memory;
pub mod model;
pub mod postgres;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use model::{
    NewOrder, NewOrderItem, NewProduct, NewUser, Order, OrderItem, Product, ProductChanges, User,
};
pub use postgres::PostgresStore;
pub use store::{Store, StoreExt, validate_new_order};
