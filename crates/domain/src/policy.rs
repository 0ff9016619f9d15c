//! Authorization policy.
//!
//! Every capability check made by the services goes through one of these
//! functions, so the rules live in a single place:
//!
//! | Operation                 | Allowed for            |
//! |---------------------------|------------------------|
//! | catalog mutations         | admins                 |
//! | order status updates      | admins                 |
//! | order cancellation        | the order's owner only |
//! | reading a single order    | owner or admin         |

use store::Order;

use crate::error::DomainError;
use crate::principal::Principal;

/// Outcome of a policy check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(&'static str),
}

impl Decision {
    /// Returns true if the decision allows the operation.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    /// Converts a denial into `DomainError::Unauthorized`.
    pub fn into_result(self) -> Result<(), DomainError> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(reason) => Err(DomainError::Unauthorized(reason.to_string())),
        }
    }
}

fn admin_only(principal: &Principal, reason: &'static str) -> Decision {
    if principal.is_admin {
        Decision::Allow
    } else {
        Decision::Deny(reason)
    }
}

/// Creating, updating or deleting products.
pub fn manage_catalog(principal: &Principal) -> Decision {
    admin_only(principal, "only admins may change the catalog")
}

/// Moving an order through the status state machine.
pub fn update_order_status(principal: &Principal) -> Decision {
    admin_only(principal, "only admins may update order status")
}

/// Cancelling an order. Admins get no implicit override.
pub fn cancel_order(principal: &Principal, order: &Order) -> Decision {
    if principal.is(order.user_id) {
        Decision::Allow
    } else {
        Decision::Deny("you do not have permission to cancel this order")
    }
}

/// Reading a single order.
pub fn view_order(principal: &Principal, order: &Order) -> Decision {
    if principal.is(order.user_id) || principal.is_admin {
        Decision::Allow
    } else {
        Decision::Deny("you do not have permission to view this order")
    }
}
