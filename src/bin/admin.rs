//! CLI administration tool for slug-shortener.
//!
//! Inspects the persisted counter range and manages stored links without
//! going through the HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # Show the persisted range without consuming it
//! cargo run --bin admin -- range show
//! cargo run --bin admin -- range show --file /var/lib/shortener/range.dat
//!
//! # List all links
//! cargo run --bin admin -- links list
//!
//! # Delete a link
//! cargo run --bin admin -- links delete 4C92
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` or `DB_*` components: PostgreSQL connection (links and db commands)
//! - `COUNTER_FILE`: default path for `range show`

use slug_shortener::config::{Config, mask_connection_string};
use slug_shortener::domain::range_file;
use slug_shortener::domain::repositories::DurableStore;
use slug_shortener::infrastructure::persistence::PgRecordStore;
use slug_shortener::utils::base62;

use anyhow::{Context, Result};
use chrono::DateTime;
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;
use sqlx::PgPool;
use std::path::PathBuf;
use std::sync::Arc;

/// CLI tool for managing slug-shortener.
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
    /// Inspect the persisted counter range
    Range {
        #[command(subcommand)]
        action: RangeAction,
    },

    /// Manage stored links
    Links {
        #[command(subcommand)]
        action: LinksAction,
    },

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

#[derive(Subcommand)]
enum RangeAction {
    /// Show the persisted range (the file is left untouched)
    Show {
        /// Range file path (defaults to COUNTER_FILE or /tmp/counter_range.dat)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum LinksAction {
    /// List all links
    List,

    /// Delete a link from the store
    Delete {
        /// Slug to delete
        slug: String,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

/// Database operation subcommands.
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
        Commands::Range { action } => handle_range_action(action).await?,
        Commands::Links { action } => {
            let pool = connect().await?;
            handle_links_action(action, &pool).await?
        }
        Commands::Db { action } => {
            let pool = connect().await?;
            handle_db_action(action, &pool).await?
        }
    }

    Ok(())
}

async fn connect() -> Result<PgPool> {
    let database_url = Config::load_database_url()?;

    PgPool::connect(&database_url)
        .await
        .with_context(|| {
            format!(
                "Failed to connect to database {}",
                mask_connection_string(&database_url)
            )
        })
}

/// Shows the persisted range.
///
/// # Output Format
///
/// ```text
/// Counter Range
///
///   File:      /tmp/counter_range.dat
///   Current:   1000042 (4C9i)
///   End:       2000000 (8OI4)
///   Remaining: 999958
/// ```
async fn handle_range_action(action: RangeAction) -> Result<()> {
    match action {
        RangeAction::Show { file } => {
            let path = file
                .or_else(|| std::env::var("COUNTER_FILE").ok().map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from("/tmp/counter_range.dat"));

            println!("{}", "Counter Range".bright_blue().bold());
            println!();
            println!("  File:      {}", path.display().to_string().cyan());

            if !tokio::fs::try_exists(&path).await? {
                println!(
                    "  {}",
                    "No persisted range; the service fetches a fresh one on first create".yellow()
                );
                return Ok(());
            }

            let range = range_file::read(&path).await?;

            println!(
                "  Current:   {} ({})",
                range.current.to_string().bright_white().bold(),
                base62::encode(range.current).bright_black()
            );
            println!(
                "  End:       {} ({})",
                range.end.to_string().bright_white().bold(),
                base62::encode(range.end).bright_black()
            );
            println!(
                "  Remaining: {}",
                range.remaining().to_string().bright_green().bold()
            );
            println!();
        }
    }

    Ok(())
}

/// Dispatches link management commands.
async fn handle_links_action(action: LinksAction, pool: &PgPool) -> Result<()> {
    let store = PgRecordStore::new(Arc::new(pool.clone()));

    match action {
        LinksAction::List => list_links(&store).await?,
        LinksAction::Delete { slug, yes } => delete_link(&store, slug, yes).await?,
    }

    Ok(())
}

/// Lists all links.
///
/// # Output Format
///
/// ```text
/// Links
///
///   Slug     Created              Hits     Target
///   ───────────────────────────────────────────────────────────────────────────
///   4C92     2025-01-15 10:30     17       https://example.com/
/// ```
async fn list_links(store: &PgRecordStore) -> Result<()> {
    println!("{}", "Links".bright_blue().bold());
    println!();

    let links = store
        .list_all()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to list links: {}", e))?;

    if links.is_empty() {
        println!("{}", "  No links found".yellow());
        return Ok(());
    }

    println!(
        "  {:<8} {:<20} {:<8} {}",
        "Slug".bright_white().bold(),
        "Created".bright_white().bold(),
        "Hits".bright_white().bold(),
        "Target".bright_white().bold()
    );
    println!("  {}", "─".repeat(75).bright_black());

    for link in &links {
        let created = i64::try_from(link.created_at)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| link.created_at.to_string());

        println!(
            "  {:<8} {:<20} {:<8} {}",
            link.slug.cyan(),
            created.bright_black(),
            link.hits.to_string().bright_green(),
            link.target
        );
    }

    println!();
    println!("  Total: {}", links.len().to_string().bright_white().bold());
    println!();

    Ok(())
}

/// Deletes a link from the store after confirmation.
///
/// The cache is not touched; a cached copy keeps resolving until its TTL expires.
async fn delete_link(store: &PgRecordStore, slug: String, skip_confirm: bool) -> Result<()> {
    println!("{}", "Delete Link".bright_blue().bold());
    println!();

    let link = store
        .find_by_slug(&slug)
        .await
        .map_err(|e| anyhow::anyhow!("Database error: {}", e))?
        .context("Link not found")?;

    println!("  Slug:   {}", link.slug.cyan());
    println!("  Target: {}", link.target);
    println!("  Hits:   {}", link.hits.to_string().bright_black());
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

    store
        .delete(&slug)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to delete link: {}", e))?;

    println!();
    println!("{}", "Link deleted".green().bold());
    println!(
        "{}",
        "A cached copy may keep resolving until CACHE_TTL_SECONDS expires".yellow()
    );
    println!();

    Ok(())
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "Checking database connection...".bright_blue());

            sqlx::query("SELECT 1").fetch_one(pool).await?;

            let links: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM short_links")
                .fetch_one(pool)
                .await
                .context("Connected, but the short_links table is missing (run the service once to migrate)")?;

            println!("{}", "Database connection OK".green().bold());
            println!("  Links: {}", links.to_string().bright_green().bold());
        }
    }

    Ok(())
}
