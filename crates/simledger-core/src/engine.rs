//! # Aggregation Engine
//!
//! Snapshot in, derived views out.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  LedgerSnapshot (immutable)                                             │
//! │       │                                                                 │
//! │       ├──► compute_inventory_stats ──► Vec<InventoryStat>               │
//! │       │                                       │ weighted_avg_cost        │
//! │       ├──► compute_order_stats  ◄─────────────┘                         │
//! │       │          │                                                      │
//! │       │          └──► Vec<OrderStat>                                    │
//! │       │                     │ total, remaining, debt_level              │
//! │       └──► compute_customer_stats ◄─┘                                   │
//! │                  │                                                      │
//! │                  └──► Vec<CustomerStat>                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each stage reads the output of the one before it. The whole thing is
//! rerun over the full snapshot; there is no incremental update.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;

use crate::config::EngineConfig;
use crate::customers::{compute_customer_stats, CustomerStat};
use crate::inventory::{compute_inventory_stats, InventoryStat};
use crate::orders::{compute_order_stats, OrderStat};
use crate::types::{Customer, DueDateChangeLog, InventoryBatch, Payment, ProductType, SaleOrder};

/// Every raw record the engine reads, as of one moment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub product_types: Vec<ProductType>,
    pub batches: Vec<InventoryBatch>,
    pub orders: Vec<SaleOrder>,
    pub payments: Vec<Payment>,
    pub customers: Vec<Customer>,
    pub due_date_logs: Vec<DueDateChangeLog>,
}

impl LedgerSnapshot {
    /// Content hash of every record, used as a cache key.
    ///
    /// Equal snapshots always produce equal fingerprints within one process.
    /// The value is not stable across builds and must not be persisted.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }

    pub fn order(&self, order_id: &str) -> Option<&SaleOrder> {
        self.orders.iter().find(|o| o.id == order_id)
    }
}

/// The three derived views of one snapshot at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Aggregation {
    pub inventory: Vec<InventoryStat>,
    pub orders: Vec<OrderStat>,
    pub customers: Vec<CustomerStat>,
    /// The `now` the views were computed for.
    #[ts(as = "String")]
    pub computed_at: DateTime<Utc>,
}

impl Aggregation {
    pub fn order(&self, order_id: &str) -> Option<&OrderStat> {
        self.orders.iter().find(|o| o.order_id == order_id)
    }

    pub fn customer(&self, customer_id: &str) -> Option<&CustomerStat> {
        self.customers.iter().find(|c| c.customer_id == customer_id)
    }

    pub fn product(&self, product_type_id: &str) -> Option<&InventoryStat> {
        self.inventory
            .iter()
            .find(|s| s.product_type_id == product_type_id)
    }
}

/// Runs the full pipeline.
///
/// Pure: the same snapshot, `now` and config always give the same result.
pub fn aggregate(snapshot: &LedgerSnapshot, now: DateTime<Utc>, config: &EngineConfig) -> Aggregation {
    let inventory = compute_inventory_stats(
        &snapshot.product_types,
        &snapshot.batches,
        &snapshot.orders,
        config.low_stock_threshold,
    );
    let orders = compute_order_stats(snapshot, &inventory, now, &config.debt);
    let customers = compute_customer_stats(&snapshot.customers, &orders);

    debug!(
        products = inventory.len(),
        orders = orders.len(),
        customers = customers.len(),
        overdue = orders.iter().filter(|o| o.is_overdue).count(),
        "Aggregated ledger snapshot"
    );

    Aggregation {
        inventory,
        orders,
        customers,
        computed_at: now,
    }
}

/// Due-date changes for one order, oldest first.
pub fn due_date_history<'a>(snapshot: &'a LedgerSnapshot, order_id: &str) -> Vec<&'a DueDateChangeLog> {
    let mut logs: Vec<&DueDateChangeLog> = snapshot
        .due_date_logs
        .iter()
        .filter(|log| log.order_id == order_id)
        .collect();
    logs.sort_by_key(|log| log.changed_at);
    logs
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    fn log(id: &str, order_id: &str, hour: u32) -> DueDateChangeLog {
        DueDateChangeLog {
            id: id.to_string(),
            order_id: order_id.to_string(),
            old_date: None,
            new_date: NaiveDate::from_ymd_opt(2024, 3, 20).unwrap(),
            reason: String::new(),
            changed_at: Utc.with_ymd_and_hms(2024, 3, 1, hour, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_empty_snapshot() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let views = aggregate(&LedgerSnapshot::default(), now, &EngineConfig::default());
        assert!(views.inventory.is_empty());
        assert!(views.orders.is_empty());
        assert!(views.customers.is_empty());
        assert_eq!(views.computed_at, now);
    }

    #[test]
    fn test_fingerprint_tracks_content() {
        let a = LedgerSnapshot::default();
        let mut b = LedgerSnapshot::default();
        assert_eq!(a.fingerprint(), b.fingerprint());

        b.due_date_logs.push(log("l1", "o1", 9));
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_due_date_history_sorted_and_filtered() {
        let snapshot = LedgerSnapshot {
            due_date_logs: vec![log("late", "o1", 15), log("other", "o2", 1), log("early", "o1", 8)],
            ..LedgerSnapshot::default()
        };
        let history = due_date_history(&snapshot, "o1");
        let ids: Vec<&str> = history.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["early", "late"]);
        assert!(due_date_history(&snapshot, "nope").is_empty());
    }
}
