//! Bazaar CLI - database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! bazaar migrate
//!
//! # Create a user
//! bazaar user create -u alice -e alice@example.com -p 'correct horse' -r vendor
//!
//! # Post a tweet from the fixed OAuth 1.0a account
//! bazaar tweet "Spring sale starts today"
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use bazaar_core::Role;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "bazaar")]
#[command(author, version, about = "Bazaar CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run storefront database migrations
    Migrate,
    /// Manage marketplace users
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Post a tweet as the account configured by `TWITTER_*` keys
    Tweet {
        /// Tweet text
        text: String,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new user
    Create {
        /// Login name
        #[arg(short, long)]
        username: String,

        /// Email address
        #[arg(short, long)]
        email: String,

        /// Password (at least 8 characters)
        #[arg(short, long)]
        password: String,

        /// Role (`vendor` or `buyer`)
        #[arg(short, long, default_value = "buyer")]
        role: Role,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::storefront().await?,
        Commands::User { action } => match action {
            UserAction::Create {
                username,
                email,
                password,
                role,
            } => {
                commands::user::create(&username, &email, &password, role).await?;
            }
        },
        Commands::Tweet { text } => commands::tweet::post(&text).await?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_user_create() {
        let cli = Cli::try_parse_from([
            "bazaar", "user", "create", "-u", "ann", "-e", "ann@example.com", "-p", "secret123",
            "-r", "vendor",
        ])
        .unwrap_or_else(|e| panic!("{e}"));

        match cli.command {
            Commands::User {
                action: UserAction::Create { username, role, .. },
            } => {
                assert_eq!(username, "ann");
                assert_eq!(role, Role::Vendor);
            }
            _ => panic!("expected user create"),
        }
    }

    #[test]
    fn test_rejects_unknown_role() {
        assert!(
            Cli::try_parse_from([
                "bazaar", "user", "create", "-u", "ann", "-e", "a@b.c", "-p", "x", "-r", "admin",
            ])
            .is_err()
        );
    }
}
