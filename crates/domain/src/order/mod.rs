//! Order placement, listing and the status lifecycle.

mod commands;
mod service;

pub use commands::{OrderLine, PlaceOrder};
pub use service::OrderService;
