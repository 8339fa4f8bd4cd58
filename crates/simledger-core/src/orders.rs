//! # Order Stats
//!
//! The financial and debt view of a single sale order.
//!
//! ## Derivation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  total_amount = quantity × unit_sale_price                              │
//! │  cost         = quantity × weighted_avg_cost   (ByType)                 │
//! │               = 0                              (ByBatch, UNIMPUTED)     │
//! │  profit       = total_amount − cost                                     │
//! │                                                                         │
//! │  paid_amount  = Σ IN payments linked to the order                       │
//! │  remaining    = max(0, total_amount − paid_amount)                      │
//! │                                                                         │
//! │  payment_status:  remaining ≤ 0 → PAID                                  │
//! │                   paid > 0      → PARTIAL                               │
//! │                   otherwise     → UNPAID                                │
//! │                                                                         │
//! │  is_overdue  = remaining > 0 ∧ due date set ∧ now > due date            │
//! │  debt_level  = debt::classify(...)                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use ts_rs::TS;

use crate::config::DebtPolicy;
use crate::debt::{classify, DebtFacts, DebtLevel};
use crate::engine::LedgerSnapshot;
use crate::inventory::InventoryStat;
use crate::money::Money;
use crate::types::{BuyerRef, Customer, InventoryBatch, ProductRef, SaleOrder, SalesChannel};
use crate::UNKNOWN_LABEL;

/// Settlement state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Paid,
    Partial,
    Unpaid,
}

/// Where an order's unit cost came from.
///
/// Legacy orders that point at a batch get no cost at all, so their whole
/// sale shows up as profit. The flag lets the UI mark those figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CostBasis {
    WeightedAverage,
    Unimputed,
}

/// Derived view of one sale order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderStat {
    pub order_id: String,
    pub code: String,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub channel: SalesChannel,
    pub customer_id: Option<String>,
    pub customer_name: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_sale_price: Money,
    pub total_amount: Money,
    pub cost_basis: CostBasis,
    pub cost: Money,
    pub profit: Money,
    pub paid_amount: Money,
    pub remaining: Money,
    pub payment_status: PaymentStatus,
    #[ts(as = "Option<String>")]
    pub due_date: Option<NaiveDate>,
    pub due_date_change_count: u32,
    /// Rows in the due-date change log for this order.
    pub extension_count_logged: usize,
    pub is_overdue: bool,
    pub debt_level: DebtLevel,
    pub is_bad_debt: bool,
}

impl OrderStat {
    #[inline]
    pub fn is_settled(&self) -> bool {
        !self.remaining.is_positive()
    }
}

/// Lookup tables built once per aggregation pass.
struct OrderLookup<'a> {
    inventory: HashMap<&'a str, &'a InventoryStat>,
    batches: HashMap<&'a str, &'a InventoryBatch>,
    customers: HashMap<&'a str, &'a Customer>,
    paid: HashMap<&'a str, Money>,
    logged: HashMap<&'a str, usize>,
}

impl<'a> OrderLookup<'a> {
    fn build(snapshot: &'a LedgerSnapshot, inventory: &'a [InventoryStat]) -> Self {
        let mut paid: HashMap<&str, Money> = HashMap::new();
        for payment in &snapshot.payments {
            if let Some(order_id) = payment.linked_order_id.as_deref() {
                if payment.settles(order_id) {
                    *paid.entry(order_id).or_default() += payment.amount;
                }
            }
        }

        let mut logged: HashMap<&str, usize> = HashMap::new();
        for log in &snapshot.due_date_logs {
            *logged.entry(log.order_id.as_str()).or_insert(0) += 1;
        }

        Self {
            inventory: inventory
                .iter()
                .map(|s| (s.product_type_id.as_str(), s))
                .collect(),
            batches: snapshot.batches.iter().map(|b| (b.id.as_str(), b)).collect(),
            customers: snapshot.customers.iter().map(|c| (c.id.as_str(), c)).collect(),
            paid,
            logged,
        }
    }

    fn customer_name(&self, buyer: &BuyerRef) -> String {
        let name = match buyer {
            BuyerRef::Customer {
                customer_id,
                name_snapshot,
            } => self
                .customers
                .get(customer_id.as_str())
                .map(|c| c.name.as_str())
                .unwrap_or(name_snapshot.as_str()),
            BuyerRef::Freeform { name } => name.as_str(),
        };

        if name.trim().is_empty() {
            UNKNOWN_LABEL.to_string()
        } else {
            name.to_string()
        }
    }

    /// Product name and unit cost for an order's product reference.
    fn product(&self, order: &SaleOrder) -> (String, Money, CostBasis) {
        match &order.product {
            ProductRef::ByType(type_id) => match self.inventory.get(type_id.as_str()) {
                Some(stat) => (
                    stat.product_name.clone(),
                    stat.weighted_avg_cost,
                    CostBasis::WeightedAverage,
                ),
                None => {
                    warn!(
                        order_id = %order.id,
                        product_type_id = %type_id,
                        "Order references an unknown product type"
                    );
                    (UNKNOWN_LABEL.to_string(), Money::zero(), CostBasis::WeightedAverage)
                }
            },
            ProductRef::ByBatch(batch_id) => {
                let name = self
                    .batches
                    .get(batch_id.as_str())
                    .map(|b| b.name.clone())
                    .unwrap_or_else(|| UNKNOWN_LABEL.to_string());
                (name, Money::zero(), CostBasis::Unimputed)
            }
        }
    }

    fn derive(&self, order: &SaleOrder, now: DateTime<Utc>, policy: &DebtPolicy) -> OrderStat {
        let total_amount = order.total_amount();
        let (product_name, unit_cost, cost_basis) = self.product(order);
        let cost = unit_cost.multiply_quantity(order.quantity);

        let paid_amount = self.paid.get(order.id.as_str()).copied().unwrap_or_default();
        let remaining = (total_amount - paid_amount).clamp_non_negative();

        let payment_status = if !remaining.is_positive() {
            PaymentStatus::Paid
        } else if paid_amount.is_positive() {
            PaymentStatus::Partial
        } else {
            PaymentStatus::Unpaid
        };

        let is_overdue = remaining.is_positive()
            && order.due_instant().map_or(false, |due| now > due);

        let debt_level = classify(
            &DebtFacts {
                remaining,
                due_date_change_count: order.due_date_change_count,
                is_overdue,
            },
            policy,
        );

        OrderStat {
            order_id: order.id.clone(),
            code: order.code.clone(),
            date: order.date,
            channel: order.channel,
            customer_id: order.customer_id().map(str::to_string),
            customer_name: self.customer_name(&order.buyer),
            product_name,
            quantity: order.quantity,
            unit_sale_price: order.unit_sale_price,
            total_amount,
            cost_basis,
            cost,
            profit: total_amount - cost,
            paid_amount,
            remaining,
            payment_status,
            due_date: order.due_date,
            due_date_change_count: order.due_date_change_count,
            extension_count_logged: self.logged.get(order.id.as_str()).copied().unwrap_or(0),
            is_overdue,
            debt_level,
            is_bad_debt: debt_level.is_bad_debt(),
        }
    }
}

/// Computes one [`OrderStat`] per order, in snapshot order.
pub fn compute_order_stats(
    snapshot: &LedgerSnapshot,
    inventory: &[InventoryStat],
    now: DateTime<Utc>,
    policy: &DebtPolicy,
) -> Vec<OrderStat> {
    let lookup = OrderLookup::build(snapshot, inventory);
    snapshot
        .orders
        .iter()
        .map(|order| lookup.derive(order, now, policy))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::compute_inventory_stats;
    use crate::types::{
        CustomerSegment, DueDateChangeLog, Payment, PaymentDirection, PaymentMethod, ProductType,
    };
    use chrono::TimeZone;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap()
    }

    fn order(id: &str, buyer: BuyerRef, product: ProductRef, qty: i64, price: i64) -> SaleOrder {
        SaleOrder {
            id: id.to_string(),
            code: format!("SO-{}", id),
            date: day(1),
            buyer,
            channel: SalesChannel::Wholesale,
            product,
            quantity: qty,
            unit_sale_price: Money::from_dong(price),
            due_date: Some(day(20)),
            due_date_change_count: 0,
            note: String::new(),
            is_settled_at_creation: false,
        }
    }

    fn payment(order_id: &str, direction: PaymentDirection, amount: i64) -> Payment {
        Payment {
            id: format!("p-{}-{}", order_id, amount),
            code: "TX".to_string(),
            direction,
            date: day(2),
            amount: Money::from_dong(amount),
            category: "Wholesale receipt".to_string(),
            method: PaymentMethod::Transfer,
            linked_order_id: Some(order_id.to_string()),
            linked_batch_id: None,
            note: String::new(),
        }
    }

    fn snapshot() -> LedgerSnapshot {
        LedgerSnapshot {
            product_types: vec![ProductType {
                id: "vina".to_string(),
                name: "Vina 4G".to_string(),
            }],
            batches: vec![InventoryBatch {
                id: "b1".to_string(),
                code: "SIM-240301-001".to_string(),
                name: "Vina 4G (Mar)".to_string(),
                product_type_id: "vina".to_string(),
                import_date: day(1),
                quantity: 100,
                total_import_cost: Money::from_dong(50_000_000),
            }],
            customers: vec![Customer {
                id: "c1".to_string(),
                customer_code: "KH-5678-NA".to_string(),
                name: "Nguyen An".to_string(),
                phone: "0901235678".to_string(),
                email: String::new(),
                address: String::new(),
                segment: CustomerSegment::Wholesale,
                note: String::new(),
            }],
            ..LedgerSnapshot::default()
        }
    }

    fn derive(snapshot: &LedgerSnapshot) -> Vec<OrderStat> {
        let inventory = compute_inventory_stats(
            &snapshot.product_types,
            &snapshot.batches,
            &snapshot.orders,
            50,
        );
        compute_order_stats(snapshot, &inventory, now(), &DebtPolicy::default())
    }

    fn customer(id: &str, snapshot_name: &str) -> BuyerRef {
        BuyerRef::Customer {
            customer_id: id.to_string(),
            name_snapshot: snapshot_name.to_string(),
        }
    }

    #[test]
    fn test_profit_uses_weighted_average_cost() {
        let mut snap = snapshot();
        snap.orders = vec![order("o1", customer("c1", ""), ProductRef::ByType("vina".into()), 30, 600_000)];
        let stats = derive(&snap);

        assert_eq!(stats[0].total_amount.dong(), 18_000_000);
        assert_eq!(stats[0].cost.dong(), 15_000_000);
        assert_eq!(stats[0].profit.dong(), 3_000_000);
        assert_eq!(stats[0].cost_basis, CostBasis::WeightedAverage);
        assert_eq!(stats[0].product_name, "Vina 4G");
        assert_eq!(stats[0].payment_status, PaymentStatus::Unpaid);
    }

    #[test]
    fn test_legacy_batch_order_has_unimputed_cost() {
        let mut snap = snapshot();
        snap.orders = vec![order("o1", customer("c1", ""), ProductRef::ByBatch("b1".into()), 10, 600_000)];
        let stats = derive(&snap);

        assert_eq!(stats[0].cost, Money::zero());
        assert_eq!(stats[0].profit.dong(), 6_000_000);
        assert_eq!(stats[0].cost_basis, CostBasis::Unimputed);
        assert_eq!(stats[0].product_name, "Vina 4G (Mar)");

        snap.orders[0].product = ProductRef::ByBatch("gone".into());
        assert_eq!(derive(&snap)[0].product_name, UNKNOWN_LABEL);
    }

    #[test]
    fn test_only_in_payments_count() {
        let mut snap = snapshot();
        snap.orders = vec![order("o1", customer("c1", ""), ProductRef::ByType("vina".into()), 1, 1_000_000)];
        snap.payments = vec![
            payment("o1", PaymentDirection::In, 400_000),
            payment("o1", PaymentDirection::Out, 300_000),
            payment("other", PaymentDirection::In, 999_000),
        ];
        let stats = derive(&snap);

        assert_eq!(stats[0].paid_amount.dong(), 400_000);
        assert_eq!(stats[0].remaining.dong(), 600_000);
        assert_eq!(stats[0].payment_status, PaymentStatus::Partial);
    }

    #[test]
    fn test_overpayment_clamps_remaining() {
        let mut snap = snapshot();
        let mut o = order("o1", customer("c1", ""), ProductRef::ByType("vina".into()), 1, 1_000_000);
        o.due_date = Some(day(1));
        o.due_date_change_count = 5;
        snap.orders = vec![o];
        snap.payments = vec![payment("o1", PaymentDirection::In, 1_200_000)];
        let stats = derive(&snap);

        assert_eq!(stats[0].remaining, Money::zero());
        assert_eq!(stats[0].payment_status, PaymentStatus::Paid);
        assert!(!stats[0].is_overdue);
        assert_eq!(stats[0].debt_level, DebtLevel::Normal);
        assert!(stats[0].is_settled());
    }

    #[test]
    fn test_overdue_is_strictly_after_due_day_start() {
        let mut snap = snapshot();
        let mut o = order("o1", customer("c1", ""), ProductRef::ByType("vina".into()), 1, 1_000);
        o.due_date = Some(day(15));
        snap.orders = vec![o];
        // 10:00 on the due day is already past its 00:00 start
        assert!(derive(&snap)[0].is_overdue);

        snap.orders[0].due_date = Some(day(16));
        assert!(!derive(&snap)[0].is_overdue);

        snap.orders[0].due_date = None;
        let stats = derive(&snap);
        assert!(!stats[0].is_overdue);
        assert_eq!(stats[0].debt_level, DebtLevel::Normal);
    }

    #[test]
    fn test_customer_name_fallbacks() {
        let mut snap = snapshot();
        snap.orders = vec![
            order("o1", customer("c1", "Old Name"), ProductRef::ByType("vina".into()), 1, 1),
            order("o2", customer("c-deleted", "Snapshot Name"), ProductRef::ByType("vina".into()), 1, 1),
            order("o3", customer("c-deleted", " "), ProductRef::ByType("vina".into()), 1, 1),
            order("o4", BuyerRef::Freeform { name: "Walk-in".into() }, ProductRef::ByType("vina".into()), 1, 1),
            order("o5", BuyerRef::Freeform { name: String::new() }, ProductRef::ByType("x".into()), 1, 1),
        ];
        let stats = derive(&snap);

        assert_eq!(stats[0].customer_name, "Nguyen An");
        assert_eq!(stats[1].customer_name, "Snapshot Name");
        assert_eq!(stats[2].customer_name, UNKNOWN_LABEL);
        assert_eq!(stats[3].customer_name, "Walk-in");
        assert_eq!(stats[3].customer_id, None);
        assert_eq!(stats[4].customer_name, UNKNOWN_LABEL);
        assert_eq!(stats[4].product_name, UNKNOWN_LABEL);
    }

    #[test]
    fn test_extension_count_logged() {
        let mut snap = snapshot();
        snap.orders = vec![order("o1", customer("c1", ""), ProductRef::ByType("vina".into()), 1, 1)];
        snap.due_date_logs = (0..2)
            .map(|i| DueDateChangeLog {
                id: format!("l{}", i),
                order_id: "o1".to_string(),
                old_date: Some(day(20)),
                new_date: day(25),
                reason: String::new(),
                changed_at: now(),
            })
            .collect();

        assert_eq!(derive(&snap)[0].extension_count_logged, 2);
    }
}
