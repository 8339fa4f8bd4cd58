//! # Customer Rollup
//!
//! Folds the order stats of each registered customer into one summary.
//! Freeform buyers have no customer record and are not rolled up.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::debt::DebtLevel;
use crate::money::Money;
use crate::orders::OrderStat;
use crate::types::{Customer, CustomerSegment};

/// Derived view of one customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerStat {
    pub customer_id: String,
    pub customer_code: String,
    pub name: String,
    pub segment: CustomerSegment,
    /// Sum of order totals.
    pub gmv: Money,
    /// Sum of what is still owed.
    pub current_debt: Money,
    /// Earliest due date among orders still owing money.
    #[ts(as = "Option<String>")]
    pub next_due_date: Option<NaiveDate>,
    pub worst_debt_level: DebtLevel,
    pub order_count: usize,
}

#[derive(Default)]
struct Rollup {
    gmv: Money,
    current_debt: Money,
    next_due_date: Option<NaiveDate>,
    worst_debt_level: DebtLevel,
    order_count: usize,
}

impl Rollup {
    fn add(&mut self, stat: &OrderStat) {
        self.gmv += stat.total_amount;
        self.current_debt += stat.remaining;
        self.order_count += 1;
        self.worst_debt_level = self.worst_debt_level.max(stat.debt_level);

        if stat.remaining.is_positive() {
            if let Some(due) = stat.due_date {
                self.next_due_date = Some(self.next_due_date.map_or(due, |d| d.min(due)));
            }
        }
    }
}

/// Computes one [`CustomerStat`] per customer, in registry order.
pub fn compute_customer_stats(customers: &[Customer], orders: &[OrderStat]) -> Vec<CustomerStat> {
    let mut rollups: HashMap<&str, Rollup> = HashMap::new();
    for stat in orders {
        if let Some(customer_id) = stat.customer_id.as_deref() {
            rollups.entry(customer_id).or_default().add(stat);
        }
    }

    customers
        .iter()
        .map(|customer| {
            let rollup = rollups.remove(customer.id.as_str()).unwrap_or_default();
            CustomerStat {
                customer_id: customer.id.clone(),
                customer_code: customer.customer_code.clone(),
                name: customer.name.clone(),
                segment: customer.segment,
                gmv: rollup.gmv,
                current_debt: rollup.current_debt,
                next_due_date: rollup.next_due_date,
                worst_debt_level: rollup.worst_debt_level,
                order_count: rollup.order_count,
            }
        })
        .collect()
}
