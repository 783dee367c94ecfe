//! Twitter posting.
//!
//! Two ways to authorize a post:
//!
//! - [`TwitterAuth::OAuth1`]: a fixed account whose keys live in the
//!   environment. Every request carries a freshly signed OAuth 1.0a header.
//! - [`TwitterAuth::Bearer`]: a user access token from the OAuth 2.0 flow in
//!   [`oauth2`].

mod error;
pub mod oauth1;
pub mod oauth2;

pub use error::TwitterError;
pub use oauth1::{OAuth1Credentials, OAuth1Nonce};
pub use oauth2::{OAuth2Token, PendingAuthorization};

use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::instrument;

/// Twitter API v2 create-tweet endpoint.
pub const TWEETS_URL: &str = "https://api.twitter.com/2/tweets";

/// How a request is authorized.
pub enum TwitterAuth<'a> {
    OAuth1(&'a OAuth1Credentials),
    Bearer(SecretString),
}

/// Body of a create-tweet request.
#[derive(Debug, Clone, Serialize)]
pub struct NewTweet {
    pub text: String,
}

impl NewTweet {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Twitter API client.
#[derive(Debug, Clone, Default)]
pub struct TwitterClient {
    client: Client,
}

impl TwitterClient {
    /// Create a new Twitter client.
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Underlying HTTP client (shared with the OAuth 2.0 token exchange).
    #[must_use]
    pub const fn http(&self) -> &Client {
        &self.client
    }

    /// Post a tweet.
    ///
    /// Returns the parsed JSON response body on 200 or 201.
    ///
    /// # Errors
    ///
    /// Returns `TwitterError::Api` with the status and raw body for any other
    /// status, or a request/response error if the call itself fails.
    #[instrument(skip(self, auth, tweet))]
    pub async fn post_tweet(
        &self,
        auth: &TwitterAuth<'_>,
        tweet: &NewTweet,
    ) -> Result<serde_json::Value, TwitterError> {
        let request = self.client.post(TWEETS_URL).json(tweet);
        let request = match auth {
            TwitterAuth::OAuth1(credentials) => {
                // JSON bodies are not part of the OAuth 1.0a signature.
                let header = credentials.authorization_header(
                    "POST",
                    TWEETS_URL,
                    &[],
                    &OAuth1Nonce::generate(),
                )?;
                request.header(reqwest::header::AUTHORIZATION, header)
            }
            TwitterAuth::Bearer(token) => request.bearer_auth(token.expose_secret()),
        };

        let response = request
            .send()
            .await
            .map_err(|e| TwitterError::Request(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK && status != StatusCode::CREATED {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "Twitter rejected tweet");
            return Err(TwitterError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| TwitterError::Response(e.to_string()))?;

        tracing::info!(tweet_id = ?body.pointer("/data/id"), "Tweet posted");
        Ok(body)
    }
}
