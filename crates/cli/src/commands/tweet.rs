//! Post a tweet as the fixed account.
//!
//! # Environment Variables
//!
//! - `TWITTER_CONSUMER_KEY`
//! - `TWITTER_CONSUMER_SECRET`
//! - `TWITTER_ACCESS_TOKEN`
//! - `TWITTER_ACCESS_TOKEN_SECRET`

use bazaar_storefront::config::ConfigError;
use bazaar_storefront::services::twitter::{
    NewTweet, OAuth1Credentials, TwitterAuth, TwitterClient, TwitterError,
};
use thiserror::Error;

/// Errors that can occur while tweeting.
#[derive(Debug, Error)]
pub enum TweetError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Twitter(#[from] TwitterError),
}

/// Post `text` with OAuth 1.0a user credentials.
///
/// # Errors
///
/// Returns `TweetError::Config` if a key is missing, or `TweetError::Twitter`
/// if Twitter rejects the request.
pub async fn post(text: &str) -> Result<(), TweetError> {
    let credentials = OAuth1Credentials::from_env()?;

    let body = TwitterClient::new()
        .post_tweet(&TwitterAuth::OAuth1(&credentials), &NewTweet::new(text))
        .await?;

    let id = body
        .pointer("/data/id")
        .and_then(|id| id.as_str())
        .unwrap_or("unknown");
    tracing::info!("Tweet posted! ID: {id}");
    Ok(())
}
