//! # simledger-db: Database Layer for SimLedger
//!
//! Stores the raw ledger in SQLite and hands immutable snapshots of it to
//! the aggregation engine in `simledger-core`.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        SimLedger Data Flow                              │
//! │                                                                         │
//! │  ledger-report (dashboard, extend, ...)                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   simledger-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │ LedgerService │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │ (service.rs)  │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ CatalogRepo   │    │ 001_initial  │  │   │
//! │  │   │ cache +       │───►│ CustomerRepo  │    │              │  │   │
//! │  │   │ snapshots     │    │ OrderRepo     │    │              │  │   │
//! │  │   │               │    │ PaymentRepo   │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │          │                     │                               │   │
//! │  │          ▼                     ▼                               │   │
//! │  │   simledger-core       Database (pool.rs)                      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   <platform data dir>/simledger/ledger.db                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and snapshot loading
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (catalog, customer, order, payment)
//! - [`service`] - Cached derived views and write commands
//!
//! ## Usage
//!
//! ```rust,ignore
//! use simledger_db::{Database, DbConfig, LedgerService};
//!
//! let db = Database::new(DbConfig::new("ledger.db")).await?;
//! let service = LedgerService::new(db, EngineConfig::default())?;
//!
//! let overdue = service.upcoming_collections(Utc::now()).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod service;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use service::LedgerService;

// Repository re-exports for convenience
pub use repository::catalog::CatalogRepository;
pub use repository::customer::CustomerRepository;
pub use repository::generate_id;
pub use repository::order::OrderRepository;
pub use repository::payment::PaymentRepository;
