//! Freshmart CLI - Database migrations, catalog seeding and admin accounts.
//!
//! # Usage
//!
//! ```bash
//! # Apply pending database migrations
//! fm-cli migrate
//!
//! # Upsert categories and products from a YAML file
//! fm-cli seed crates/cli/seed/catalog.yaml
//!
//! # Create an admin account (password from FM_ADMIN_PASSWORD)
//! fm-cli admin create -e admin@example.com -n "Admin Name"
//!
//! # Grant or revoke admin access for an existing account
//! fm-cli admin promote -e someone@example.com
//! fm-cli admin demote -e someone@example.com
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use freshmart_core::UserRole;

mod commands;

use commands::CliError;

#[derive(Debug, Parser)]
#[command(name = "fm-cli")]
#[command(author, version, about = "Freshmart CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Upsert the catalog from a YAML file
    Seed {
        /// Path to the catalog file
        file: PathBuf,

        /// Validate the file without writing anything
        #[arg(long)]
        check: bool,
    },
    /// Manage admin accounts
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Debug, Subcommand)]
enum AdminAction {
    /// Create a new admin account
    Create {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Admin display name
        #[arg(short, long)]
        name: String,
    },
    /// Give an existing account admin access
    Promote {
        #[arg(short, long)]
        email: String,
    },
    /// Turn an admin back into a customer
    Demote {
        #[arg(short, long)]
        email: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        if let CliError::InvalidSeed(problems) = &e {
            for problem in problems {
                tracing::error!("{problem}");
            }
        }
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { file, check: true } => {
            commands::seed::load(&file).await?;
            tracing::info!(path = %file.display(), "Catalog is valid");
        }
        Commands::Seed { file, check: false } => {
            commands::seed::run(&file).await?;
        }
        Commands::Admin { action } => match action {
            AdminAction::Create { email, name } => commands::admin::create(&email, &name).await?,
            AdminAction::Promote { email } => {
                commands::admin::set_role(&email, UserRole::Admin).await?;
            }
            AdminAction::Demote { email } => {
                commands::admin::set_role(&email, UserRole::Customer).await?;
            }
        },
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_seed() {
        let cli = Cli::try_parse_from(["fm-cli", "seed", "catalog.yaml", "--check"]).unwrap();
        let Commands::Seed { file, check } = cli.command else {
            panic!("expected seed");
        };
        assert_eq!(file, PathBuf::from("catalog.yaml"));
        assert!(check);
    }

    #[test]
    fn test_parse_admin_create() {
        let args = ["fm-cli", "admin", "create", "-e", "a@b.co", "-n", "Ops"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Admin {
                action: AdminAction::Create { ref email, ref name }
            } if email == "a@b.co" && name == "Ops"
        ));
    }

    #[test]
    fn test_parse_promote_requires_email() {
        assert!(Cli::try_parse_from(["fm-cli", "admin", "promote"]).is_err());
        assert!(Cli::try_parse_from(["fm-cli", "admin", "demote", "--email", "x@y.z"]).is_ok());
    }

    #[test]
    fn test_no_password_flag() {
        assert!(
            Cli::try_parse_from([
                "fm-cli", "admin", "create", "-e", "a@b.co", "-n", "Ops", "--password", "hunter2"
            ])
            .is_err()
        );
    }
}
