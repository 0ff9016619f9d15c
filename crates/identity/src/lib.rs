//! Identity and access for the storefront.
//!
//! Turns credentials into signed session tokens and session tokens into a
//! typed [`domain::Principal`]. Nothing downstream re-reads token claims.

pub mod email;
pub mod error;
pub mod password;
pub mod service;
pub mod token;

pub use email::{Email, EmailError};
pub use error::AuthError;
pub use service::IdentityService;
pub use token::{Claims, IssuedToken, MAX_TTL_HOURS, MIN_TTL_HOURS, TokenIssuer};
