//! CLI administration tool for simple-bank.
//!
//! Provides commands for issuing and inspecting access tokens, generating
//! keys, auditing the ledger, and performing database checks without going
//! through the HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # Generate a symmetric key for TOKEN_SYMMETRIC_KEY
//! cargo run --bin admin -- key generate
//!
//! # Issue an access token for a user
//! cargo run --bin admin -- token issue --username alice
//!
//! # Decode and verify a token
//! cargo run --bin admin -- token verify v2.local.AAAA...
//!
//! # Check ledger invariants
//! cargo run --bin admin -- ledger audit
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` or `DB_*`: PostgreSQL connection (ledger and db commands)
//! - `TOKEN_SYMMETRIC_KEY`: 32-byte key (token commands)

use simple_bank::config::{Config, mask_connection_string};
use simple_bank::token::{PasetoMaker, SYMMETRIC_KEY_SIZE, TokenMaker};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::{Confirm, Input};
use sqlx::PgPool;

/// CLI tool for managing simple-bank.
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
    /// Issue and verify access tokens
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },

    /// Symmetric key utilities
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },

    /// Ledger consistency checks
    Ledger {
        #[command(subcommand)]
        action: LedgerAction,
    },

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

/// Token subcommands.
#[derive(Subcommand)]
enum TokenAction {
    /// Issue an access token with the configured key
    Issue {
        /// Username the token is issued to
        #[arg(short, long)]
        username: Option<String>,

        /// Token lifetime in seconds
        #[arg(short, long, default_value_t = 900)]
        duration_seconds: i64,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Verify a token and print its payload
    Verify {
        /// The `v2.local.` token
        token: String,
    },
}

/// Key subcommands.
#[derive(Subcommand)]
enum KeyAction {
    /// Generate a random 32-character key
    Generate {
        /// Print only the key
        #[arg(long)]
        raw: bool,
    },
}

/// Ledger subcommands.
#[derive(Subcommand)]
enum LedgerAction {
    /// Check that entries balance and match account balances
    Audit,
}

/// Database operation subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Show database info
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Token { action } => handle_token_action(action)?,
        Commands::Key { action } => handle_key_action(action),
        Commands::Ledger { action } => {
            let pool = connect().await?;
            handle_ledger_action(action, &pool).await?;
        }
        Commands::Db { action } => {
            let pool = connect().await?;
            handle_db_action(action, &pool).await?;
        }
    }

    Ok(())
}

/// Connects to the database configured by `DATABASE_URL` or `DB_*`.
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

/// Builds a token maker from `TOKEN_SYMMETRIC_KEY`.
fn token_maker() -> Result<PasetoMaker> {
    let key = std::env::var("TOKEN_SYMMETRIC_KEY").context("TOKEN_SYMMETRIC_KEY must be set")?;

    PasetoMaker::new(key.as_bytes()).context("Invalid TOKEN_SYMMETRIC_KEY")
}

/// Dispatches token commands.
fn handle_token_action(action: TokenAction) -> Result<()> {
    match action {
        TokenAction::Issue {
            username,
            duration_seconds,
            yes,
        } => issue_token(username, duration_seconds, yes),
        TokenAction::Verify { token } => verify_token(&token),
    }
}

/// Issues an access token with interactive prompts.
///
/// The token is only printed, never stored: verification is stateless.
fn issue_token(username: Option<String>, duration_seconds: i64, skip_confirm: bool) -> Result<()> {
    println!("{}", "🔑 Issue Access Token".bright_blue().bold());
    println!();

    if duration_seconds <= 0 {
        anyhow::bail!("Duration must be greater than 0, got {duration_seconds}");
    }

    let username = match username {
        Some(u) => u,
        None => Input::new().with_prompt("Username").interact_text()?,
    };

    println!("  Username: {}", username.cyan());
    println!("  Lifetime: {}s", duration_seconds.to_string().cyan());
    println!();

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt("Issue this token?")
            .default(true)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    let maker = token_maker()?;
    let (token, payload) = maker
        .create_token(&username, chrono::Duration::seconds(duration_seconds))
        .map_err(|e| anyhow::anyhow!("Failed to create token: {}", e))?;

    println!();
    println!("{}", "✅ Token issued".green().bold());
    println!();
    println!("  Token:   {}", token.bright_yellow().bold());
    println!("  ID:      {}", payload.id.to_string().bright_black());
    println!(
        "  Expires: {}",
        payload.expired_at.format("%Y-%m-%d %H:%M:%S UTC").to_string().cyan()
    );
    println!();
    println!("{}", "Example:".bright_white());
    println!(
        "  curl -H \"Authorization: Bearer {}\" http://localhost:8080/accounts",
        token.bright_yellow()
    );
    println!();

    Ok(())
}

/// Verifies a token and prints its payload.
fn verify_token(token: &str) -> Result<()> {
    let maker = token_maker()?;

    match maker.verify_token(token) {
        Ok(payload) => {
            println!("{}", "✅ Token is valid".green().bold());
            println!();
            println!("  ID:       {}", payload.id.to_string().bright_black());
            println!("  Username: {}", payload.username.cyan());
            println!(
                "  Issued:   {}",
                payload.issued_at.format("%Y-%m-%d %H:%M:%S UTC")
            );
            println!(
                "  Expires:  {}",
                payload.expired_at.format("%Y-%m-%d %H:%M:%S UTC")
            );
            println!();
            Ok(())
        }
        Err(e) => {
            println!("{} {}", "❌ Token rejected:".red().bold(), e);
            anyhow::bail!("token verification failed: {e}")
        }
    }
}

/// Dispatches key commands.
fn handle_key_action(action: KeyAction) {
    match action {
        KeyAction::Generate { raw } => {
            let key = generate_key();

            if raw {
                println!("{key}");
                return;
            }

            println!("{}", "🔐 Generated symmetric key".bright_blue().bold());
            println!();
            println!("  {}={}", "TOKEN_SYMMETRIC_KEY".bright_cyan(), key.bright_yellow());
            println!();
            println!(
                "{}",
                "⚠️  Changing the key invalidates every issued token."
                    .yellow()
            );
        }
    }
}

/// Dispatches ledger commands.
async fn handle_ledger_action(action: LedgerAction, pool: &PgPool) -> Result<()> {
    match action {
        LedgerAction::Audit => audit_ledger(pool).await,
    }
}

/// Checks ledger invariants over committed data.
///
/// # Checks
///
/// 1. All entries sum to zero
/// 2. There are exactly two entries per transfer
/// 3. Credits add up to the transferred total
/// 4. Every balance equals the sum of its account's entries
async fn audit_ledger(pool: &PgPool) -> Result<()> {
    println!("{}", "📒 Ledger Audit".bright_blue().bold());
    println!();

    let mut failures = 0;

    let entries_sum: i64 = sqlx::query_scalar("SELECT COALESCE(SUM(amount), 0)::BIGINT FROM entries")
        .fetch_one(pool)
        .await?;
    failures += report("Entries sum to zero", entries_sum == 0, &entries_sum.to_string());

    let transfers_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM transfers")
        .fetch_one(pool)
        .await?;
    let entries_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM entries")
        .fetch_one(pool)
        .await?;
    failures += report(
        "Two entries per transfer",
        entries_count == transfers_count * 2,
        &format!("{transfers_count} transfers, {entries_count} entries"),
    );

    let transferred: i64 =
        sqlx::query_scalar("SELECT COALESCE(SUM(amount), 0)::BIGINT FROM transfers")
            .fetch_one(pool)
            .await?;
    let credited: i64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(amount), 0)::BIGINT FROM entries WHERE amount > 0",
    )
    .fetch_one(pool)
    .await?;
    failures += report(
        "Credits match transferred total",
        transferred == credited,
        &format!("transferred {transferred}, credited {credited}"),
    );

    let mismatched: Vec<(i64, i64, i64)> = sqlx::query_as(
        r#"
        SELECT a.id, a.balance, COALESCE(SUM(e.amount), 0)::BIGINT AS entries_total
        FROM accounts a
        LEFT JOIN entries e ON e.account_id = a.id
        GROUP BY a.id, a.balance
        HAVING a.balance <> COALESCE(SUM(e.amount), 0)
        ORDER BY a.id
        "#,
    )
    .fetch_all(pool)
    .await?;
    failures += report(
        "Balances match entries",
        mismatched.is_empty(),
        &format!("{} mismatched accounts", mismatched.len()),
    );

    for (id, balance, entries_total) in &mismatched {
        println!(
            "      account {}: balance {} vs entries {}",
            id.to_string().bright_white(),
            balance.to_string().red(),
            entries_total.to_string().yellow()
        );
    }

    println!();
    if failures == 0 {
        println!("{}", "✅ Ledger is consistent".green().bold());
        Ok(())
    } else {
        println!("{}", format!("❌ {failures} check(s) failed").red().bold());
        anyhow::bail!("ledger audit failed")
    }
}

/// Prints one audit line and returns 1 on failure.
fn report(name: &str, ok: bool, detail: &str) -> usize {
    let status = if ok { "OK".green() } else { "FAIL".red() };
    println!("  {:<34} {:<6} {}", name, status, detail.bright_black());
    usize::from(!ok)
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            sqlx::query("SELECT 1").fetch_one(pool).await?;

            println!("{}", "✅ Database connection OK".green().bold());
        }
        DbAction::Info => {
            println!("{}", "ℹ️  Database Information".bright_blue().bold());
            println!();

            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;

            let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
                .fetch_one(pool)
                .await?;
            let accounts: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM accounts")
                .fetch_one(pool)
                .await?;
            let transfers: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM transfers")
                .fetch_one(pool)
                .await?;

            println!("  PostgreSQL: {}", version.bright_white());
            println!("  Users:      {}", users.to_string().bright_green().bold());
            println!("  Accounts:   {}", accounts.to_string().bright_green().bold());
            println!("  Transfers:  {}", transfers.to_string().bright_green().bold());
            println!();
        }
    }

    Ok(())
}

/// Generates a random symmetric key.
///
/// # Format
///
/// - Length: 32 characters, so 32 bytes as UTF-8
/// - Character set: A-Z, a-z, 0-9
fn generate_key() -> String {
    use rand::Rng;
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

    let mut rng = rand::rng();

    (0..SYMMETRIC_KEY_SIZE)
        .map(|_| {
            let idx = rng.random_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}
