//! OAuth 2.0 authorization code flow with PKCE.
//!
//! A vendor connects their Twitter account by visiting `/twitter/login`,
//! approving the app on Twitter, and returning to `/twitter/callback`. The
//! resulting user access token is kept in the session and used as a bearer
//! token when posting.

use rand::Rng;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use url::Url;

use super::TwitterError;
use crate::config::TwitterAppConfig;

/// Twitter OAuth 2.0 authorize endpoint.
pub const AUTHORIZE_URL: &str = "https://twitter.com/i/oauth2/authorize";

/// Twitter OAuth 2.0 token endpoint.
pub const TOKEN_URL: &str = "https://api.twitter.com/2/oauth2/token";

/// Scopes needed to post on the user's behalf and refresh the token.
pub const SCOPES: &str = "tweet.read tweet.write users.read offline.access";

/// Length of the generated state and PKCE verifier.
const RANDOM_LENGTH: usize = 64;

/// In-flight authorization, stored in the session between login and callback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingAuthorization {
    /// CSRF token echoed back by Twitter.
    pub state: String,
    /// PKCE code verifier. Sent as-is with method `plain`.
    pub code_verifier: String,
}

impl PendingAuthorization {
    /// Fresh random state and verifier.
    #[must_use]
    pub fn generate() -> Self {
        Self {
            state: random_token(),
            code_verifier: random_token(),
        }
    }

    /// Check the `state` returned on the callback.
    ///
    /// # Errors
    ///
    /// Returns `TwitterError::StateMismatch` if it differs from the stored one.
    pub fn verify_state(&self, returned: &str) -> Result<(), TwitterError> {
        if self.state == returned {
            Ok(())
        } else {
            Err(TwitterError::StateMismatch)
        }
    }
}

/// User access token as returned by the token endpoint.
#[derive(Clone, Serialize, Deserialize)]
pub struct OAuth2Token {
    pub token_type: String,
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub scope: Option<String>,
}

impl std::fmt::Debug for OAuth2Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuth2Token")
            .field("token_type", &self.token_type)
            .field("access_token", &"[REDACTED]")
            .field("expires_in", &self.expires_in)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

impl OAuth2Token {
    /// The access token as a secret, for building a bearer auth.
    #[must_use]
    pub fn bearer(&self) -> SecretString {
        SecretString::from(self.access_token.clone())
    }
}

fn random_token() -> String {
    rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(RANDOM_LENGTH)
        .map(char::from)
        .collect()
}

/// Build the URL the browser is redirected to.
///
/// # Errors
///
/// Returns `TwitterError::Request` if the authorize URL cannot be built.
pub fn authorize_url(
    config: &TwitterAppConfig,
    pending: &PendingAuthorization,
) -> Result<Url, TwitterError> {
    Url::parse_with_params(
        AUTHORIZE_URL,
        &[
            ("response_type", "code"),
            ("client_id", config.client_id.as_str()),
            ("redirect_uri", config.redirect_uri.as_str()),
            ("scope", SCOPES),
            ("state", pending.state.as_str()),
            ("code_challenge", pending.code_verifier.as_str()),
            ("code_challenge_method", "plain"),
        ],
    )
    .map_err(|e| TwitterError::Request(e.to_string()))
}

/// Exchange an authorization code for a user access token.
///
/// # Errors
///
/// Returns `TwitterError::Api` on a non-success status, or a request or
/// response error if the call itself fails.
#[instrument(skip_all)]
pub async fn exchange_code(
    http: &reqwest::Client,
    config: &TwitterAppConfig,
    code: &str,
    pending: &PendingAuthorization,
) -> Result<OAuth2Token, TwitterError> {
    let response = http
        .post(TOKEN_URL)
        .basic_auth(&config.client_id, Some(config.client_secret.expose_secret()))
        .form(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", config.redirect_uri.as_str()),
            ("code_verifier", pending.code_verifier.as_str()),
            ("client_id", config.client_id.as_str()),
        ])
        .send()
        .await
        .map_err(|e| TwitterError::Request(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(TwitterError::Api {
            status: status.as_u16(),
            body,
        });
    }

    let token: OAuth2Token = response
        .json()
        .await
        .map_err(|e| TwitterError::Response(e.to_string()))?;

    tracing::info!(scope = ?token.scope, "Twitter account connected");
    Ok(token)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config() -> TwitterAppConfig {
        TwitterAppConfig {
            client_id: "client-123".to_string(),
            client_secret: SecretString::from("shh"),
            redirect_uri: "http://localhost:3000/twitter/callback".to_string(),
        }
    }

    #[test]
    fn test_authorize_url_carries_pkce_and_scopes() {
        let pending = PendingAuthorization::generate();
        let url = authorize_url(&config(), &pending).unwrap();

        assert_eq!(url.host_str(), Some("twitter.com"));
        let params: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(params["response_type"], "code");
        assert_eq!(params["client_id"], "client-123");
        assert_eq!(params["redirect_uri"], "http://localhost:3000/twitter/callback");
        assert_eq!(params["scope"], SCOPES);
        assert_eq!(params["state"], pending.state);
        assert_eq!(params["code_challenge"], pending.code_verifier);
        assert_eq!(params["code_challenge_method"], "plain");
    }

    #[test]
    fn test_state_check() {
        let pending = PendingAuthorization::generate();
        assert!(pending.verify_state(&pending.state.clone()).is_ok());
        assert!(matches!(
            pending.verify_state("forged"),
            Err(TwitterError::StateMismatch)
        ));
    }

    #[test]
    fn test_generated_values_differ() {
        let a = PendingAuthorization::generate();
        let b = PendingAuthorization::generate();
        assert_ne!(a.state, b.state);
        assert_ne!(a.state, a.code_verifier);
        assert_eq!(a.code_verifier.len(), RANDOM_LENGTH);
    }

    #[test]
    fn test_token_parses_without_optional_fields() {
        let token: OAuth2Token =
            serde_json::from_str(r#"{"token_type":"bearer","access_token":"abc"}"#).unwrap();
        assert_eq!(token.access_token, "abc");
        assert!(token.refresh_token.is_none());
        assert!(!format!("{token:?}").contains("abc"));
    }
}
