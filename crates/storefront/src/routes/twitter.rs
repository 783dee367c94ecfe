//! Twitter account connection (OAuth 2.0 with PKCE).
//!
//! A vendor connects once per session. While connected, every new store is
//! announced with a tweet posted as that vendor.

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::middleware::RequireVendor;
use crate::models::{Store, session_keys};
use crate::services::twitter::{
    NewTweet, OAuth2Token, PendingAuthorization, TwitterAuth, TwitterError, oauth2,
};
use crate::state::AppState;

/// Query parameters Twitter appends to the callback.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// The connected Twitter token, if any.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn session_token(session: &Session) -> Result<Option<OAuth2Token>> {
    Ok(session.get::<OAuth2Token>(session_keys::TWITTER_TOKEN).await?)
}

/// Start the authorization: remember state and verifier, then redirect.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    RequireVendor(user): RequireVendor,
) -> Result<impl IntoResponse> {
    let config = state
        .config()
        .twitter
        .as_ref()
        .ok_or(TwitterError::NotConfigured)?;

    let pending = PendingAuthorization::generate();
    let url = oauth2::authorize_url(config, &pending)?;
    session.insert(session_keys::TWITTER_PENDING, &pending).await?;

    Ok(Redirect::to(url.as_str()))
}

/// Finish the authorization and keep the token in the session.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn callback(
    State(state): State<AppState>,
    session: Session,
    RequireVendor(user): RequireVendor,
    Query(query): Query<CallbackQuery>,
) -> Result<impl IntoResponse> {
    let config = state
        .config()
        .twitter
        .as_ref()
        .ok_or(TwitterError::NotConfigured)?;

    let pending = session
        .remove::<PendingAuthorization>(session_keys::TWITTER_PENDING)
        .await?
        .ok_or(TwitterError::StateMismatch)?;

    if let Some(error) = query.error {
        tracing::warn!(%error, "Twitter authorization declined");
        return Ok(Redirect::to("/manage-store"));
    }

    pending.verify_state(query.state.as_deref().unwrap_or_default())?;
    let code = query
        .code
        .ok_or_else(|| AppError::BadRequest("missing authorization code".to_string()))?;

    let token = oauth2::exchange_code(state.twitter().http(), config, &code, &pending).await?;
    session.insert(session_keys::TWITTER_TOKEN, &token).await?;

    Ok(Redirect::to("/manage-store"))
}

/// Tweet about a new store if the vendor connected Twitter.
///
/// Never fails the request: errors are logged and dropped.
pub async fn announce_store(state: &AppState, session: &Session, store: &Store) {
    let token = match session_token(session).await {
        Ok(Some(token)) => token,
        Ok(None) => return,
        Err(e) => {
            tracing::warn!(error = %e, "Could not read Twitter token from session");
            return;
        }
    };

    let tweet = NewTweet::new(store_announcement(store, &state.config().base_url));
    if let Err(e) = state
        .twitter()
        .post_tweet(&TwitterAuth::Bearer(token.bearer()), &tweet)
        .await
    {
        tracing::warn!(error = %e, store_id = %store.id, "Store announcement tweet failed");
    }
}

/// Tweet text for a new store.
fn store_announcement(store: &Store, base_url: &str) -> String {
    format!(
        "New store on Bazaar: {}! {}/",
        store.name,
        base_url.trim_end_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use bazaar_core::{StoreId, UserId};

    #[test]
    fn test_store_announcement() {
        let store = Store {
            id: StoreId::new(4),
            owner_id: UserId::new(1),
            name: "Mugs & More".to_string(),
            created_at: chrono::Utc::now(),
        };
        assert_eq!(
            store_announcement(&store, "https://bazaar.example/"),
            "New store on Bazaar: Mugs & More! https://bazaar.example/"
        );
    }
}
