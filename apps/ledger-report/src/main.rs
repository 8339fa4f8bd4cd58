//! # ledger-report
//!
//! Prints SimLedger's derived views as JSON and moves due dates.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  args ──► Cli::parse_args (clap)                                       │
//! │             │                                                           │
//! │             ▼                                                           │
//! │  AppConfig::load (ledger.toml + SIMLEDGER_* env)                       │
//! │             │                                                           │
//! │             ▼                                                           │
//! │  Database::new ──► LedgerService::new(db, config.engine)               │
//! │             │                                                           │
//! │             ▼                                                           │
//! │  run(command) ──► JSON on stdout        errors ──► JSON on stderr      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Logs go to stderr so stdout stays valid JSON.

mod cli;
mod config;
mod error;

use chrono::{DateTime, Utc};
use serde::Serialize;
use simledger_core::reports::DateRange;
use simledger_db::{Database, DbConfig, LedgerService};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::config::AppConfig;
use crate::error::{AppError, ErrorReport};

#[tokio::main]
async fn main() {
    init_tracing();

    if let Err(err) = try_main().await {
        let report = ErrorReport::from(&err);
        match serde_json::to_string_pretty(&report) {
            Ok(json) => eprintln!("{}", json),
            Err(_) => eprintln!("{}", err),
        }
        std::process::exit(err.exit_code());
    }
}

async fn try_main() -> Result<(), AppError> {
    let cli = Cli::parse_args(std::env::args_os())?;

    let mut config = AppConfig::load(cli.config_path.as_deref())?;
    if let Some(path) = &cli.db_path {
        config.database.path = Some(path.clone());
    }

    let db_path = config.database_path()?;
    let db = Database::new(
        DbConfig::new(&db_path).max_connections(config.database.max_connections),
    )
    .await?;

    let service = LedgerService::new(db.clone(), config.engine.clone())?;
    let now = cli.now.unwrap_or_else(Utc::now);
    debug!(now = %now, command = ?cli.command, "Running command");

    let result = run(&service, cli.command, now).await;
    db.close().await;
    result
}

async fn run(service: &LedgerService, command: Command, now: DateTime<Utc>) -> Result<(), AppError> {
    match command {
        Command::Inventory => print(&service.inventory_stats(now).await?),
        Command::Orders => print(&service.order_stats(now).await?),
        Command::Customers => print(&service.customer_stats(now).await?),
        Command::Dashboard(args) => {
            let range = args
                .range()
                .unwrap_or_else(|| DateRange::month_to_date(now.date_naive()));
            print(&service.dashboard(&range, now).await?)
        }
        Command::Collections => print(&service.upcoming_collections(now).await?),
        Command::Monthly(args) => {
            let range = args.range().unwrap_or_else(DateRange::all);
            print(&service.monthly_breakdown(&range, now).await?)
        }
        Command::Daily(args) => print(&service.daily_revenue(&args.range()?, now).await?),
        Command::Debt => print(&service.debt_breakdown(now).await?),
        Command::History { order_id } => print(&service.due_date_history(&order_id).await?),
        Command::Extend {
            order_id,
            new_due_date,
            reason,
        } => {
            let order = service
                .extend_due_date(&order_id, new_due_date, &reason.join(" "), now)
                .await?;
            info!(
                code = %order.code,
                change_count = order.due_date_change_count,
                "Due date moved"
            );

            let stat = service.aggregation(now).await?.order(&order_id).cloned();
            print(&stat)
        }
    }
}

fn print<T: Serialize>(value: &T) -> Result<(), AppError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=simledger_core=debug` - Aggregation passes only
/// - Default: `info`, with sqlx quieted to `warn`
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
