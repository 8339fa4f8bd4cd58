//! Command-line parsing.

use chrono::{DateTime, NaiveDate, Utc};
use clap::error::ErrorKind;
use clap::{Args, Parser, Subcommand};
use simledger_core::reports::{DateRange, MAX_DAILY_SPAN_DAYS};
use std::ffi::OsString;
use std::path::PathBuf;

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(
    name = "ledger-report",
    about = "SimLedger reports",
    version,
    after_help = "Dates are YYYY-MM-DD."
)]
pub struct Cli {
    #[arg(
        short,
        long = "config",
        global = true,
        help = "Config file (default: platform config dir/ledger.toml)"
    )]
    pub config_path: Option<PathBuf>,

    #[arg(short, long = "db", global = true, help = "Database file (overrides config)")]
    pub db_path: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        value_parser = parse_instant,
        help = "Evaluate as of this RFC 3339 instant instead of the clock"
    )]
    pub now: Option<DateTime<Utc>>,

    #[command(subcommand)]
    pub command: Command,
}

/// What to print or do.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Stock, average cost and status per product type
    Inventory,
    /// Derived figures for every sale order
    Orders,
    /// GMV, debt and worst debt level per customer
    Customers,
    /// Headline figures (default: month to date)
    Dashboard(RangeArgs),
    /// Unpaid orders due within the horizon
    Collections,
    /// Cash in/out and profit per month
    Monthly(RangeArgs),
    /// Revenue per day
    Daily(DailyArgs),
    /// Outstanding balance per debt level
    Debt,
    /// Due-date changes of one order
    History { order_id: String },
    /// Move an order's due date
    Extend {
        order_id: String,
        #[arg(value_parser = parse_date)]
        new_due_date: NaiveDate,
        /// Free text, joined with spaces
        reason: Vec<String>,
    },
}

/// Optional `--from` / `--to` bounds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Args)]
pub struct RangeArgs {
    #[arg(long, value_parser = parse_date, help = "First day, inclusive")]
    pub from: Option<NaiveDate>,

    #[arg(long, value_parser = parse_date, help = "Last day, inclusive")]
    pub to: Option<NaiveDate>,
}

impl RangeArgs {
    /// `None` when neither bound was given.
    pub fn range(&self) -> Option<DateRange> {
        match (self.from, self.to) {
            (None, None) => None,
            (start, end) => Some(DateRange { start, end }),
        }
    }
}

/// `daily` needs both bounds, at most a year apart.
#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct DailyArgs {
    #[arg(long, value_parser = parse_date, requires = "to", help = "First day, inclusive")]
    pub from: NaiveDate,

    #[arg(long, value_parser = parse_date, requires = "from", help = "Last day, inclusive")]
    pub to: NaiveDate,
}

impl DailyArgs {
    pub fn range(&self) -> Result<DateRange, AppError> {
        let range = DateRange::between(self.from, self.to);
        match range.span_days() {
            Some(0) => Err(AppError::usage("daily: --from is after --to")),
            Some(span) if span > MAX_DAILY_SPAN_DAYS => Err(AppError::usage(format!(
                "daily: range covers {} days, at most {} allowed",
                span, MAX_DAILY_SPAN_DAYS
            ))),
            _ => Ok(range),
        }
    }
}

impl Cli {
    /// Parses `args`, program name first. `--help` and `--version` print
    /// and exit; any other parse failure becomes a usage error.
    pub fn parse_args<I, T>(args: I) -> Result<Self, AppError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Cli::try_parse_from(args).map_err(|err| match err.kind() {
            ErrorKind::DisplayHelp
            | ErrorKind::DisplayVersion
            | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => err.exit(),
            _ => AppError::usage(err.render().to_string().trim_end()),
        })
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| format!("invalid date '{}', expected YYYY-MM-DD", raw))
}

fn parse_instant(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw)
        .map(|instant| instant.with_timezone(&Utc))
        .map_err(|e| format!("invalid instant '{}': {}", raw, e))
}
