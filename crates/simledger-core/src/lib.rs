//! # simledger-core: Aggregation Engine for SimLedger
//!
//! This crate is the **heart** of SimLedger. It turns the raw ledger
//! (inventory batches, sale orders, payments, customers) into the derived
//! views the back office works from.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        SimLedger Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Presentation (UI / ledger-report CLI)               │   │
//! │  │    Inventory ──► Sales ──► Cash Flow ──► Customers ──► Reports  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ views (InventoryStat, OrderStat, ...)  │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ simledger-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   inventory ──► orders ──► customers ──► reports                │   │
//! │  │        (weighted cost)  (debt level)   (rollup)                 │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS              │   │
//! │  └─────────────────────────────▲───────────────────────────────────┘   │
//! │                                │ LedgerSnapshot                         │
//! │  ┌─────────────────────────────┴───────────────────────────────────┐   │
//! │  │                 simledger-db (Database Layer)                   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Raw ledger records (batches, orders, payments, customers)
//! - [`money`] - Integer đồng amounts with half-up rounding
//! - [`debt`] - Debt level classification rules
//! - [`inventory`] - Per-product stock and weighted average cost
//! - [`orders`] - Per-order financial and debt view
//! - [`customers`] - Per-customer rollup
//! - [`engine`] - Snapshot in, all three views out
//! - [`cache`] - Memoised aggregation keyed by snapshot and time bucket
//! - [`reports`] - Dashboard, collections, monthly and cash-flow figures
//! - [`commands`] - Pure planning for write operations (due-date extension, settlement)
//! - [`codes`] - Business code generators
//! - [`config`] - Engine thresholds
//! - [`validation`] - Write-path input checks
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::{NaiveDate, TimeZone, Utc};
//! use simledger_core::engine::{aggregate, LedgerSnapshot};
//! use simledger_core::{EngineConfig, InventoryBatch, Money, ProductType};
//!
//! let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
//! let snapshot = LedgerSnapshot {
//!     product_types: vec![ProductType { id: "vina".into(), name: "Vina 4G".into() }],
//!     batches: vec![InventoryBatch {
//!         id: "b1".into(),
//!         code: "SIM-240301-001".into(),
//!         name: "Vina 4G".into(),
//!         product_type_id: "vina".into(),
//!         import_date: date,
//!         quantity: 100,
//!         total_import_cost: Money::from_dong(50_000_000),
//!     }],
//!     ..LedgerSnapshot::default()
//! };
//!
//! let now = Utc.with_ymd_and_hms(2024, 3, 2, 9, 0, 0).unwrap();
//! let views = aggregate(&snapshot, now, &EngineConfig::default());
//! assert_eq!(views.inventory[0].weighted_avg_cost.dong(), 500_000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cache;
pub mod codes;
pub mod commands;
pub mod config;
pub mod customers;
pub mod debt;
pub mod engine;
pub mod error;
pub mod inventory;
pub mod money;
pub mod orders;
pub mod reports;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use config::{DebtPolicy, EngineConfig};
pub use customers::CustomerStat;
pub use debt::DebtLevel;
pub use engine::{aggregate, Aggregation, LedgerSnapshot};
pub use error::{CoreError, CoreResult, ValidationError};
pub use inventory::{InventoryStat, StockStatus};
pub use money::Money;
pub use orders::{CostBasis, OrderStat, PaymentStatus};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Stock at or below this level is reported as `LOW_STOCK`.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 50;

/// Due-date extensions that put an unpaid order on the watch list.
pub const DEFAULT_WARNING_CHANGE_COUNT: u32 = 3;

/// Due-date extensions after which an unpaid order is handed to recovery.
pub const DEFAULT_RECOVERY_CHANGE_COUNT: u32 = 4;

/// Display label for anything a lookup could not resolve.
pub const UNKNOWN_LABEL: &str = "Unknown";
