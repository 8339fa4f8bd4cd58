//! # Write-Path Planning
//!
//! Pure functions that work out what a write should store. The database
//! layer applies the result in one transaction.
//!
//! ## Due-Date Extension
//! ```text
//! SaleOrder { due_date: 03-10, due_date_change_count: 2 }
//!     │ plan_due_date_extension(new = 03-17, reason)
//!     ▼
//! SaleOrder { due_date: 03-17, due_date_change_count: 3 }   ──► now WARNING
//! DueDateChangeLog { old_date: 03-10, new_date: 03-17, reason }
//! ```
//!
//! ## Settled-at-Creation Orders
//! An order entered as already paid gets an automatic IN payment for its
//! full total and no due date.

use chrono::{DateTime, NaiveDate, Utc};
use tracing::debug;

use crate::error::CoreResult;
use crate::money::Money;
use crate::types::{DueDateChangeLog, Payment, PaymentDirection, PaymentMethod, SaleOrder};
use crate::validation::{validate_code, validate_order, validate_reason};

/// The rows a due-date extension writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueDateExtension {
    pub order: SaleOrder,
    pub log: DueDateChangeLog,
}

/// Moves an order's deadline and bumps its change count by one.
pub fn plan_due_date_extension(
    order: &SaleOrder,
    new_due_date: NaiveDate,
    reason: &str,
    changed_at: DateTime<Utc>,
    log_id: String,
) -> CoreResult<DueDateExtension> {
    validate_reason(reason)?;

    let mut updated = order.clone();
    updated.due_date = Some(new_due_date);
    updated.due_date_change_count = order.due_date_change_count.saturating_add(1);

    debug!(
        order_id = %order.id,
        change_count = updated.due_date_change_count,
        "Planned due-date extension"
    );

    Ok(DueDateExtension {
        log: DueDateChangeLog {
            id: log_id,
            order_id: order.id.clone(),
            old_date: order.due_date,
            new_date: new_due_date,
            reason: reason.trim().to_string(),
            changed_at,
        },
        order: updated,
    })
}

/// The automatic receipt for an order paid in full when it was entered.
pub fn settlement_payment(
    order: &SaleOrder,
    payment_id: String,
    code: String,
    method: PaymentMethod,
) -> Payment {
    let category = order.channel.receipt_category();
    Payment {
        id: payment_id,
        code,
        direction: PaymentDirection::In,
        date: order.date,
        amount: order.total_amount(),
        category: category.to_string(),
        method,
        linked_order_id: Some(order.id.clone()),
        linked_batch_id: None,
        note: format!("Auto: {} for order {}", category, order.code),
    }
}

/// The rows creating an order writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderPlan {
    pub order: SaleOrder,
    pub settlement: Option<Payment>,
}

/// Validates a new order and attaches its settlement payment when it is
/// settled at creation.
pub fn plan_new_order(
    order: &SaleOrder,
    payment_id: String,
    payment_code: String,
    method: PaymentMethod,
) -> CoreResult<NewOrderPlan> {
    validate_order(order)?;

    let mut order = order.clone();
    order.due_date_change_count = 0;

    let settlement = if order.is_settled_at_creation {
        validate_code("payment_code", &payment_code)?;
        order.due_date = None;
        Some(settlement_payment(&order, payment_id, payment_code, method))
            .filter(|p| p.amount > Money::zero())
    } else {
        None
    };

    Ok(NewOrderPlan { order, settlement })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CoreError, ValidationError};
    use crate::types::{BuyerRef, ProductRef, SalesChannel};
    use chrono::TimeZone;

    fn order(settled: bool) -> SaleOrder {
        SaleOrder {
            id: "o1".to_string(),
            code: "SO-240301-001".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            buyer: BuyerRef::Customer {
                customer_id: "c1".to_string(),
                name_snapshot: "Dealer A".to_string(),
            },
            channel: SalesChannel::Wholesale,
            product: ProductRef::ByType("vina".to_string()),
            quantity: 30,
            unit_sale_price: Money::from_dong(600_000),
            due_date: NaiveDate::from_ymd_opt(2024, 3, 10),
            due_date_change_count: 2,
            note: String::new(),
            is_settled_at_creation: settled,
        }
    }

    #[test]
    fn test_extension_bumps_count_and_logs_old_date() {
        let changed_at = Utc.with_ymd_and_hms(2024, 3, 9, 8, 0, 0).unwrap();
        let new_date = NaiveDate::from_ymd_opt(2024, 3, 17).unwrap();
        let plan = plan_due_date_extension(&order(false), new_date, "  cash flow tight ", changed_at, "l1".into())
            .unwrap();

        assert_eq!(plan.order.due_date, Some(new_date));
        assert_eq!(plan.order.due_date_change_count, 3);
        assert_eq!(plan.log.old_date, NaiveDate::from_ymd_opt(2024, 3, 10));
        assert_eq!(plan.log.new_date, new_date);
        assert_eq!(plan.log.reason, "cash flow tight");
        assert_eq!(plan.log.order_id, "o1");
        assert_eq!(plan.log.changed_at, changed_at);
    }

    #[test]
    fn test_extension_rejects_long_reason() {
        let changed_at = Utc.with_ymd_and_hms(2024, 3, 9, 8, 0, 0).unwrap();
        let new_date = NaiveDate::from_ymd_opt(2024, 3, 17).unwrap();
        let result = plan_due_date_extension(&order(false), new_date, &"x".repeat(501), changed_at, "l1".into());

        assert!(matches!(
            result,
            Err(CoreError::Validation(ValidationError::TooLong { max: 500, .. }))
        ));
    }

    #[test]
    fn test_settlement_payment() {
        let payment = settlement_payment(&order(true), "p1".into(), "TX-240301-001".into(), PaymentMethod::Transfer);

        assert_eq!(payment.direction, PaymentDirection::In);
        assert_eq!(payment.amount.dong(), 18_000_000);
        assert_eq!(payment.category, "Wholesale receipt");
        assert_eq!(payment.linked_order_id.as_deref(), Some("o1"));
        assert_eq!(payment.note, "Auto: Wholesale receipt for order SO-240301-001");
        assert!(payment.settles("o1"));
    }

    #[test]
    fn test_plan_new_order() {
        let plan = plan_new_order(&order(true), "p1".into(), "TX-240301-001".into(), PaymentMethod::Cash).unwrap();
        assert_eq!(plan.order.due_date, None);
        assert_eq!(plan.order.due_date_change_count, 0);
        assert!(plan.settlement.is_some());

        let plan = plan_new_order(&order(false), "p1".into(), "TX-240301-001".into(), PaymentMethod::Cash).unwrap();
        assert!(plan.order.due_date.is_some());
        assert!(plan.settlement.is_none());

        let mut bad = order(false);
        bad.quantity = 0;
        assert!(plan_new_order(&bad, "p1".into(), "TX".into(), PaymentMethod::Cash).is_err());
    }
}
