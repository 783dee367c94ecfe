//! Authentication route handlers.
//!
//! Username/password registration and login. On failure the form is shown
//! again with the error and the non-secret fields filled back in.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use bazaar_core::Role;

use super::PageContext;
use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::services::auth::{AuthError, AuthService, Registration};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Registration form data.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    #[serde(default)]
    pub role: Role,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub ctx: PageContext,
    pub username: String,
    pub error: Option<String>,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub ctx: PageContext,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub error: Option<String>,
}

impl RegisterTemplate {
    /// Roles offered at sign-up.
    #[must_use]
    pub const fn roles(&self) -> [Role; 2] {
        [Role::Buyer, Role::Vendor]
    }
}

/// Status and message for an auth failure the user can fix, or `None`
/// for server-side failures.
fn user_facing(err: &AuthError) -> Option<(StatusCode, String)> {
    let status = match err {
        AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        AuthError::UserAlreadyExists => StatusCode::CONFLICT,
        AuthError::InvalidEmail(_)
        | AuthError::InvalidUsername(_)
        | AuthError::WeakPassword(_)
        | AuthError::PasswordMismatch => StatusCode::BAD_REQUEST,
        AuthError::Repository(_) | AuthError::PasswordHash => return None,
    };
    let message = match err {
        AuthError::InvalidCredentials => "Invalid username or password".to_string(),
        AuthError::UserAlreadyExists => "That username is already taken".to_string(),
        AuthError::InvalidEmail(_) => "Invalid email address".to_string(),
        AuthError::PasswordMismatch => "Passwords do not match".to_string(),
        AuthError::InvalidUsername(msg) | AuthError::WeakPassword(msg) => msg.clone(),
        AuthError::Repository(_) | AuthError::PasswordHash => return None,
    };
    Some((status, message))
}

/// Log the user in on this session.
async fn start_session(session: &Session, user: &CurrentUser) -> Result<()> {
    set_current_user(session, user).await?;
    set_sentry_user(&user.id, &user.username);
    Ok(())
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(ctx: PageContext) -> impl IntoResponse {
    LoginTemplate {
        ctx,
        username: String::new(),
        error: None,
    }
}

/// Handle login form submission.
#[instrument(skip_all, fields(username = %form.username))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    match AuthService::new(state.pool())
        .login(&form.username, &form.password)
        .await
    {
        Ok(user) => {
            start_session(&session, &CurrentUser::from(&user)).await?;
            tracing::info!(user_id = %user.id, "User logged in");
            Ok(Redirect::to("/").into_response())
        }
        Err(e) => {
            let Some((status, message)) = user_facing(&e) else {
                return Err(AppError::Auth(e));
            };
            tracing::warn!("Login failed: {e}");
            Ok((
                status,
                LoginTemplate {
                    ctx,
                    username: form.username,
                    error: Some(message),
                },
            )
                .into_response())
        }
    }
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page(ctx: PageContext) -> impl IntoResponse {
    RegisterTemplate {
        ctx,
        username: String::new(),
        email: String::new(),
        role: Role::default(),
        error: None,
    }
}

/// Handle registration form submission. A new account is logged in
/// straight away.
#[instrument(skip_all, fields(username = %form.username, role = %form.role))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    let registration = Registration {
        username: &form.username,
        email: &form.email,
        password: &form.password,
        password_confirm: &form.password_confirm,
        role: form.role,
    };

    match AuthService::new(state.pool()).register(&registration).await {
        Ok(user) => {
            start_session(&session, &CurrentUser::from(&user)).await?;
            Ok(Redirect::to("/").into_response())
        }
        Err(e) => {
            let Some((status, message)) = user_facing(&e) else {
                return Err(AppError::Auth(e));
            };
            Ok((
                status,
                RegisterTemplate {
                    ctx,
                    username: form.username,
                    email: form.email,
                    role: form.role,
                    error: Some(message),
                },
            )
                .into_response())
        }
    }
}

// =============================================================================
// Logout
// =============================================================================

/// End the session.
#[instrument(skip_all)]
pub async fn logout(session: Session) -> Result<impl IntoResponse> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    Ok(Redirect::to("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_facing_statuses() {
        assert_eq!(
            user_facing(&AuthError::InvalidCredentials).map(|(s, _)| s),
            Some(StatusCode::UNAUTHORIZED)
        );
        assert_eq!(
            user_facing(&AuthError::UserAlreadyExists).map(|(s, _)| s),
            Some(StatusCode::CONFLICT)
        );
        assert_eq!(
            user_facing(&AuthError::PasswordMismatch),
            Some((StatusCode::BAD_REQUEST, "Passwords do not match".to_string()))
        );
        assert!(user_facing(&AuthError::PasswordHash).is_none());
    }

    #[test]
    fn test_register_form_defaults_to_buyer() {
        let form: RegisterForm = serde_json::from_str(
            r#"{"username":"a","email":"a@b.co","password":"x","password_confirm":"x"}"#,
        )
        .unwrap_or_default();
        assert_eq!(form.role, Role::Buyer);
    }
}
