//! User roles and the capabilities they grant.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Marketplace role, chosen at registration and fixed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "user_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Owns stores and lists products.
    Vendor,
    /// Purchases products.
    #[default]
    Buyer,
}

/// An operation class that only some roles may perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Create stores, add products, see orders for own products.
    ManageStores,
    /// Turn a cart into an order.
    Checkout,
}

/// Returned when a role lacks a capability.
///
/// The message is user-facing and is rendered as-is with a 403.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("{}", .0.denial_message())]
pub struct PermissionDenied(pub Capability);

impl Capability {
    /// Message shown to a user who lacks this capability.
    #[must_use]
    pub const fn denial_message(self) -> &'static str {
        match self {
            Self::ManageStores => "Only vendors can manage stores",
            Self::Checkout => "Only buyers can checkout",
        }
    }
}

impl Role {
    /// Whether this role grants the capability.
    #[must_use]
    pub const fn can(self, capability: Capability) -> bool {
        matches!(
            (self, capability),
            (Self::Vendor, Capability::ManageStores) | (Self::Buyer, Capability::Checkout)
        )
    }

    /// Check a capability, failing with a user-facing denial.
    ///
    /// # Errors
    ///
    /// Returns [`PermissionDenied`] if the role does not grant `capability`.
    pub const fn ensure(self, capability: Capability) -> Result<(), PermissionDenied> {
        if self.can(capability) {
            Ok(())
        } else {
            Err(PermissionDenied(capability))
        }
    }

    /// Human-readable label for forms and templates.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Vendor => "Vendor",
            Self::Buyer => "Buyer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vendor => f.write_str("vendor"),
            Self::Buyer => f.write_str("buyer"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vendor" | "v" => Ok(Self::Vendor),
            "buyer" | "b" => Ok(Self::Buyer),
            other => Err(format!("invalid role: {other}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_role_is_buyer() {
        assert_eq!(Role::default(), Role::Buyer);
    }

    #[test]
    fn test_capabilities_are_disjoint() {
        assert!(Role::Vendor.can(Capability::ManageStores));
        assert!(!Role::Vendor.can(Capability::Checkout));
        assert!(Role::Buyer.can(Capability::Checkout));
        assert!(!Role::Buyer.can(Capability::ManageStores));
    }

    #[test]
    fn test_ensure_messages() {
        let err = Role::Vendor.ensure(Capability::Checkout).unwrap_err();
        assert_eq!(err.to_string(), "Only buyers can checkout");

        let err = Role::Buyer.ensure(Capability::ManageStores).unwrap_err();
        assert_eq!(err.to_string(), "Only vendors can manage stores");
    }

    #[test]
    fn test_parse_accepts_short_codes() {
        assert_eq!("V".parse::<Role>().unwrap(), Role::Vendor);
        assert_eq!("buyer".parse::<Role>().unwrap(), Role::Buyer);
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn test_serde_snake_case() {
        assert_eq!(serde_json::to_string(&Role::Vendor).unwrap(), r#""vendor""#);
    }
}
