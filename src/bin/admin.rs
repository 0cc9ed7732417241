//! CLI administration tool for shortly.
//!
//! Operates on the same database and cache as the server without going
//! through the HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # Mint a principal token for a user
//! cargo run --bin admin -- token issue user-42
//!
//! # Delete a link with the full cleanup cascade
//! cargo run --bin admin -- link delete 8d5e0f4a-5c7e-4c0b-9b53-0f7f3c1f2a10
//!
//! # Clear a client's rate-limit window
//! cargo run --bin admin -- ratelimit reset 203.0.113.7
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! Same as the server (see `shortly::config`). `token issue` only needs
//! `IDENTITY_SECRET`.

use shortly::application::services::RateLimiter;
use shortly::config::{self, mask_connection_string};
use shortly::domain::repositories::LinkRepository;
use shortly::infrastructure::cache::CacheService;
use shortly::infrastructure::identity::HmacIdentityService;
use shortly::infrastructure::persistence::PgLinkRepository;
use shortly::server::{
    CacheBackend, build_link_service, connect_database, connect_shared_cache,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

/// CLI tool for managing shortly.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Principal tokens
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },

    /// Short links
    Link {
        #[command(subcommand)]
        action: LinkAction,
    },

    /// Rate limit counters
    Ratelimit {
        #[command(subcommand)]
        action: RatelimitAction,
    },

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

#[derive(Subcommand)]
enum TokenAction {
    /// Issue a token for a user id
    Issue {
        /// User id the token names
        user_id: String,
    },
}

#[derive(Subcommand)]
enum LinkAction {
    /// Delete a link and its derived asset, then invalidate its cache entry
    Delete {
        /// Link id (UUID)
        id: Uuid,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum RatelimitAction {
    /// Reset the current window for a client
    Reset {
        /// Client identity, usually an IP address
        client: String,
    },
}

#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Token { action } => handle_token_action(action),
        Commands::Link { action } => handle_link_action(action).await,
        Commands::Ratelimit { action } => handle_ratelimit_action(action).await,
        Commands::Db { action } => handle_db_action(action).await,
    }
}

fn handle_token_action(action: TokenAction) -> Result<()> {
    match action {
        TokenAction::Issue { user_id } => issue_token(&user_id),
    }
}

/// Prints a signed token for `user_id`.
///
/// Anyone holding `IDENTITY_SECRET` can mint tokens; treat the output like a
/// password.
fn issue_token(user_id: &str) -> Result<()> {
    if user_id.is_empty() || user_id.contains('.') {
        anyhow::bail!("User id must be non-empty and must not contain '.'");
    }

    let secret = std::env::var("IDENTITY_SECRET").context("IDENTITY_SECRET must be set")?;
    let token = HmacIdentityService::new(secret).issue(user_id);

    println!("{}", "Principal token".bright_blue().bold());
    println!();
    println!("  User:  {}", user_id.cyan());
    println!("  Token: {}", token.bright_yellow().bold());
    println!();
    println!("{}", "Add this to your requests:".bright_white());
    println!(
        "  {}: Bearer {}",
        "Authorization".bright_cyan(),
        token.bright_yellow()
    );
    println!();

    Ok(())
}

async fn handle_link_action(action: LinkAction) -> Result<()> {
    match action {
        LinkAction::Delete { id, yes } => delete_link(id, yes).await,
    }
}

/// Deletes a link regardless of owner, running every cleanup step.
async fn delete_link(id: Uuid, skip_confirm: bool) -> Result<()> {
    let config = config::load_from_env()?;
    let pool = Arc::new(connect_database(&config).await?);

    let repo = PgLinkRepository::new(pool.clone());
    let Some(link) = repo
        .find_by_id(id)
        .await
        .map_err(|e| anyhow::anyhow!("Database error: {}", e))?
    else {
        println!("{}", "Link not found".yellow());
        return Ok(());
    };

    println!("{}", "Delete short link".bright_blue().bold());
    println!();
    println!("  Slug:    {}", link.slug.cyan());
    println!("  Target:  {}", link.target);
    println!(
        "  Owner:   {}",
        link.owner.as_deref().unwrap_or("anonymous").bright_black()
    );
    println!("  Clicks:  {}", link.click_count);
    println!();

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt("Delete this link?")
            .default(false)
            .interact()?;

        if !confirmed {
            println!("{}", "Cancelled".red());
            return Ok(());
        }
    }

    let backend = match connect_shared_cache(config.redis_url.as_deref()).await? {
        Some(backend) => backend,
        None => {
            println!(
                "  {} REDIS_URL not set; servers keep their cached copy of /{} until it expires",
                "warning:".yellow().bold(),
                link.slug
            );
            CacheBackend::memory()
        }
    };
    // No click worker here; redirects are never served by this process.
    let (click_tx, _click_rx) = mpsc::channel(1);
    let service = build_link_service(&config, pool, &backend, click_tx);

    let report = service
        .delete(id, None)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to delete link: {}", e))?;

    println!("{}", "Link deleted".green().bold());

    for failure in report.failures() {
        println!(
            "  {} {} cleanup failed: {}",
            "warning:".yellow().bold(),
            failure.step.as_str(),
            failure.error.as_deref().unwrap_or_default()
        );
    }
    println!();

    Ok(())
}

async fn handle_ratelimit_action(action: RatelimitAction) -> Result<()> {
    match action {
        RatelimitAction::Reset { client } => reset_rate_limit(&client).await,
    }
}

/// Removes a client's counter so its next request starts a fresh window.
async fn reset_rate_limit(client: &str) -> Result<()> {
    let config = config::load_from_env()?;

    let Some(backend) = connect_shared_cache(config.redis_url.as_deref()).await? else {
        println!(
            "{}",
            "Redis is not configured; counters live in each server process".yellow()
        );
        return Ok(());
    };
    let key = RateLimiter::key_for(client);

    backend
        .cache
        .delete(&key)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to reset counter: {}", e))?;

    println!("{} {}", "Rate limit reset for".green(), client.cyan());
    Ok(())
}

async fn handle_db_action(action: DbAction) -> Result<()> {
    match action {
        DbAction::Check => check_database().await,
    }
}

/// Connects, runs a trivial query and reports link counts.
async fn check_database() -> Result<()> {
    let config = config::load_from_env()?;

    println!("{}", "Database check".bright_blue().bold());
    println!();
    println!("  URL: {}", mask_connection_string(&config.database_url));

    let pool = connect_database(&config).await?;

    let version: String = sqlx::query_scalar("SELECT version()")
        .fetch_one(&pool)
        .await?;
    println!("  {} {}", "Connected:".green(), version.bright_black());

    match sqlx::query_as::<_, (i64, i64)>(
        "SELECT COUNT(*), COUNT(*) FILTER (WHERE user_id IS NULL) FROM urls",
    )
    .fetch_one(&pool)
    .await
    {
        Ok((total, anonymous)) => {
            println!("  Links: {} ({} anonymous)", total, anonymous);
        }
        Err(e) => {
            println!(
                "  {} {}",
                "urls table unavailable (migrations not applied?):".yellow(),
                e
            );
        }
    }

    println!();
    Ok(())
}
