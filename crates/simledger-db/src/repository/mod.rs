//! # Repository Module
//!
//! Database repository implementations for SimLedger.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repositories                                         │
//! │                                                                         │
//! │  LedgerService / seed / ledger-report                                  │
//! │       │                                                                 │
//! │       │  db.orders().extend_due_date(&plan)                            │
//! │       ▼                                                                 │
//! │  CatalogRepository    product_types, inventory_batches                 │
//! │  CustomerRepository   customers                                        │
//! │  OrderRepository      sale_orders, due_date_logs (+ settlement payment)│
//! │  PaymentRepository    payments                                         │
//! │       │                                                                 │
//! │       │  runtime-checked SQL, rows decoded with FromRow                │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each repository also exposes `fetch_*` functions generic over the
//! executor so [`Database::load_snapshot`](crate::Database::load_snapshot)
//! can read every table inside one transaction.

pub mod catalog;
pub mod customer;
pub mod order;
pub mod payment;

use chrono::NaiveDate;
use simledger_core::codes::{code_stem_len, generate_code};
use sqlx::{Executor, Sqlite};
use uuid::Uuid;

use crate::error::{DbError, DbResult};

/// Generates a new row ID.
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Next free `PREFIX-YYMMDD-NNN` code in `table` for `date`: one past the
/// highest sequence in use that day, so deleted rows never free a number
/// that a live row still carries.
///
/// `table` is always one of this crate's table names, never user input.
pub(crate) async fn next_code<'e, E>(
    executor: E,
    table: &str,
    prefix: &str,
    date: NaiveDate,
) -> DbResult<String>
where
    E: Executor<'e, Database = Sqlite>,
{
    let pattern = format!("{}-{}-%", prefix, date.format("%y%m%d"));
    let sql = format!(
        "SELECT MAX(CAST(substr(code, ?2) AS INTEGER)) FROM {} WHERE code LIKE ?1",
        table
    );

    let highest: Option<i64> = sqlx::query_scalar(&sql)
        .bind(&pattern)
        .bind(code_stem_len(prefix) as i64 + 1)
        .fetch_one(executor)
        .await?;

    let next = highest
        .unwrap_or(0)
        .max(0)
        .checked_add(1)
        .and_then(|seq| u32::try_from(seq).ok())
        .ok_or_else(|| DbError::Internal(format!("Code sequence exhausted for {}", pattern)))?;

    Ok(generate_code(prefix, date, next))
}
