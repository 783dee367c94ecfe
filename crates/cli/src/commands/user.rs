//! User management command.
//!
//! Goes through the same validation as the sign-up form, so usernames,
//! emails and passwords follow the same rules.

use bazaar_core::Role;
use bazaar_storefront::services::auth::{AuthError, AuthService, Registration};
use thiserror::Error;

use super::{ConnectError, connect};

/// Errors that can occur while creating a user.
#[derive(Debug, Error)]
pub enum UserError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Create a user.
///
/// # Errors
///
/// Returns `UserError::Auth` for invalid input or a taken username.
pub async fn create(
    username: &str,
    email: &str,
    password: &str,
    role: Role,
) -> Result<(), UserError> {
    let pool = connect().await?;

    let user = AuthService::new(&pool)
        .register(&Registration {
            username,
            email,
            password,
            password_confirm: password,
            role,
        })
        .await?;

    tracing::info!(
        "User created successfully! ID: {}, Username: {}, Role: {}",
        user.id,
        user.username,
        user.role
    );
    Ok(())
}
