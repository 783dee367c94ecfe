//! CLI subcommands.

pub mod migrate;
pub mod tweet;
pub mod user;

use secrecy::ExposeSecret;
use sqlx::PgPool;

use bazaar_storefront::config::{ConfigError, database_url_from_env};

/// Connect to the storefront database named by the environment.
pub(crate) async fn connect() -> Result<PgPool, ConnectError> {
    let url = database_url_from_env()?;
    tracing::info!("Connecting to storefront database...");
    Ok(PgPool::connect(url.expose_secret()).await?)
}

/// Errors from [`connect`].
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),
}
