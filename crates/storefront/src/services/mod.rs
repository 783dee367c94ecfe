//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Username/password accounts (Argon2id)
//! - `checkout` - Transactional cart-to-order conversion
//! - `email` - Order confirmation email (SMTP via lettre)
//! - `reviews` - Review submission with verified-purchase detection
//! - `twitter` - Posting tweets with OAuth 1.0a or OAuth 2.0 credentials

pub mod auth;
pub mod checkout;
pub mod email;
pub mod reviews;
pub mod twitter;
