//! Product catalog management.

mod service;

pub use service::CatalogService;
