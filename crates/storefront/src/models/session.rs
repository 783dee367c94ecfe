//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use bazaar_core::{Role, UserId};

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in user. The
/// role never changes after registration, so caching it here is safe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// Login name, shown in the header.
    pub username: String,
    /// Marketplace role.
    pub role: Role,
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the shopping cart (product ID to quantity).
    pub const CART: &str = "cart";

    /// Key for an in-flight Twitter OAuth 2.0 authorization (state + PKCE verifier).
    pub const TWITTER_PENDING: &str = "twitter_pending";

    /// Key for the connected Twitter user access token.
    pub const TWITTER_TOKEN: &str = "twitter_token";
}
