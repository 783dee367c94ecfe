//! Session middleware configuration.
//!
//! Sessions live in `PostgreSQL` (`tower_sessions.session`, created by the
//! migrations) and hold the logged-in user, the cart and the Twitter OAuth
//! state. Anonymous visitors get a session as soon as they add to the cart.

use sqlx::PgPool;
use tower_sessions::cookie::SameSite;
use tower_sessions::cookie::time::Duration;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::StorefrontConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "bazaar_session";

/// Idle time after which a session (and its cart) is dropped: 14 days.
const SESSION_IDLE_DAYS: i64 = 14;

/// Cookie settings derived from the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    pub cookie_name: &'static str,
    /// Only send the cookie over HTTPS.
    pub secure: bool,
    pub idle_timeout: Duration,
}

impl SessionSettings {
    #[must_use]
    pub fn from_config(config: &StorefrontConfig) -> Self {
        Self {
            cookie_name: SESSION_COOKIE_NAME,
            secure: config.is_https(),
            idle_timeout: Duration::days(SESSION_IDLE_DAYS),
        }
    }
}

/// Create the session layer with `PostgreSQL` store.
#[must_use]
pub fn create_session_layer(
    pool: &PgPool,
    config: &StorefrontConfig,
) -> SessionManagerLayer<PostgresStore> {
    let settings = SessionSettings::from_config(config);
    let store = PostgresStore::new(pool.clone());

    // Lax so the Twitter OAuth redirect back to /twitter/callback keeps the session.
    SessionManagerLayer::new(store)
        .with_name(settings.cookie_name)
        .with_expiry(Expiry::OnInactivity(settings.idle_timeout))
        .with_secure(settings.secure)
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    fn config(base_url: &str) -> StorefrontConfig {
        StorefrontConfig {
            database_url: SecretString::from("postgres://localhost/test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: base_url.to_string(),
            session_secret: SecretString::from("x".repeat(32)),
            email: None,
            twitter: None,
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    #[test]
    fn test_cookie_is_secure_only_over_https() {
        assert!(!SessionSettings::from_config(&config("http://localhost:3000")).secure);
        assert!(SessionSettings::from_config(&config("https://bazaar.example")).secure);
    }

    #[test]
    fn test_idle_timeout() {
        let settings = SessionSettings::from_config(&config("http://localhost:3000"));
        assert_eq!(settings.cookie_name, "bazaar_session");
        assert_eq!(settings.idle_timeout.whole_days(), 14);
    }
}
