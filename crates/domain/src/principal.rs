//! The authenticated caller of a domain operation.

use common::UserId;

/// Authenticated identity and capability set attached to a request.
///
/// Produced once by the identity layer from a verified session token and
/// passed by value into every domain operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Principal {
    pub user_id: UserId,
    pub is_admin: bool,
}

impl Principal {
    /// A regular customer.
    pub fn user(user_id: UserId) -> Self {
        Self {
            user_id,
            is_admin: false,
        }
    }

    /// A principal holding the admin capability.
    pub fn admin(user_id: UserId) -> Self {
        Self {
            user_id,
            is_admin: true,
        }
    }

    /// Returns true if this principal is the given owner.
    pub fn is(&self, owner: UserId) -> bool {
        self.user_id == owner
    }
}
