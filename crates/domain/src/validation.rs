//! Field validation shared by the services.

use common::Money;

use crate::error::{DomainError, Result};

/// Rejects blank product names.
pub fn require_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(DomainError::validation("Product name is required"));
    }
    Ok(())
}

/// Rejects non-positive prices.
pub fn require_price(price: Money) -> Result<()> {
    if !price.is_positive() {
        return Err(DomainError::validation(format!(
            "Price must be greater than 0, got {price}"
        )));
    }
    Ok(())
}

/// Rejects negative stock levels.
pub fn require_stock(stock: i32) -> Result<()> {
    if stock < 0 {
        return Err(DomainError::validation(format!(
            "Stock cannot be negative, got {stock}"
        )));
    }
    Ok(())
}

/// Rejects quantities below one.
pub fn require_quantity(quantity: u32) -> Result<()> {
    if quantity == 0 {
        return Err(DomainError::validation("Quantity must be at least 1"));
    }
    if quantity > i32::MAX as u32 {
        return Err(DomainError::validation(format!(
            "Quantity {quantity} is too large"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_names_are_rejected() {
        assert!(require_name("Widget").is_ok());
        assert!(require_name("").is_err());
        assert!(require_name("   ").is_err());
    }

    #[test]
    fn price_must_be_positive() {
        assert!(require_price(Money::from_cents(1)).is_ok());
        assert!(require_price(Money::zero()).is_err());
        assert!(require_price(Money::from_cents(-100)).is_err());
    }

    #[test]
    fn most_negative_price_is_a_validation_error() {
        match require_price(Money::from_cents(i64::MIN)) {
            Err(DomainError::Validation(message)) => {
                assert!(message.ends_with("-$92233720368547758.08"));
            }
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn stock_may_be_zero() {
        assert!(require_stock(0).is_ok());
        assert!(require_stock(5).is_ok());
        assert!(matches!(require_stock(-1), Err(DomainError::Validation(_))));
    }

    #[test]
    fn quantity_bounds() {
        assert!(require_quantity(1).is_ok());
        assert!(require_quantity(0).is_err());
        assert!(require_quantity(u32::MAX).is_err());
    }
}
