//! End-to-end aggregation scenarios: a small ledger run through the whole
//! pipeline, then extended and paid down step by step.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use simledger_core::commands::plan_due_date_extension;
use simledger_core::engine::{aggregate, due_date_history, LedgerSnapshot};
use simledger_core::{
    BuyerRef, Customer, CustomerSegment, DebtLevel, EngineConfig, InventoryBatch, Money, Payment,
    PaymentDirection, PaymentMethod, PaymentStatus, ProductRef, ProductType, SaleOrder,
    SalesChannel,
};

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 15, 9, 30, 0).unwrap()
}

fn dealer() -> Customer {
    Customer {
        id: "c1".to_string(),
        customer_code: "KH-5678-NA".to_string(),
        name: "Nguyen An".to_string(),
        phone: "0901235678".to_string(),
        email: "an@dealer.vn".to_string(),
        address: "Da Nang".to_string(),
        segment: CustomerSegment::Wholesale,
        note: String::new(),
    }
}

fn sale(id: &str, quantity: i64, price: i64, due: Option<NaiveDate>) -> SaleOrder {
    SaleOrder {
        id: id.to_string(),
        code: format!("SO-2403{}", id),
        date: day(1),
        buyer: BuyerRef::Customer {
            customer_id: "c1".to_string(),
            name_snapshot: "Nguyen An".to_string(),
        },
        channel: SalesChannel::Wholesale,
        product: ProductRef::ByType("vina".to_string()),
        quantity,
        unit_sale_price: Money::from_dong(price),
        due_date: due,
        due_date_change_count: 0,
        note: String::new(),
        is_settled_at_creation: false,
    }
}

fn receipt(order_id: &str, amount: i64) -> Payment {
    Payment {
        id: format!("p-{}", order_id),
        code: format!("TX-{}", order_id),
        direction: PaymentDirection::In,
        date: day(5),
        amount: Money::from_dong(amount),
        category: "Wholesale receipt".to_string(),
        method: PaymentMethod::Transfer,
        linked_order_id: Some(order_id.to_string()),
        linked_batch_id: None,
        note: String::new(),
    }
}

fn ledger() -> LedgerSnapshot {
    LedgerSnapshot {
        product_types: vec![
            ProductType {
                id: "vina".to_string(),
                name: "Vina 4G".to_string(),
            },
            ProductType {
                id: "mobi".to_string(),
                name: "Mobi data".to_string(),
            },
        ],
        batches: vec![InventoryBatch {
            id: "b1".to_string(),
            code: "SIM-240301-001".to_string(),
            name: "Vina 4G".to_string(),
            product_type_id: "vina".to_string(),
            import_date: day(1),
            quantity: 100,
            total_import_cost: Money::from_dong(50_000_000),
        }],
        customers: vec![dealer()],
        ..LedgerSnapshot::default()
    }
}

#[test]
fn batch_import_and_sale() {
    let mut snapshot = ledger();
    snapshot.orders = vec![sale("o1", 30, 600_000, Some(day(20)))];

    let views = aggregate(&snapshot, now(), &EngineConfig::default());
    let vina = views.product("vina").unwrap();
    let order = views.order("o1").unwrap();

    assert_eq!(vina.weighted_avg_cost.dong(), 500_000);
    assert_eq!(vina.current_stock, 70);
    assert_eq!(order.total_amount.dong(), 18_000_000);
    assert_eq!(order.cost.dong(), 15_000_000);
    assert_eq!(order.profit.dong(), 3_000_000);

    let mobi = views.product("mobi").unwrap();
    assert_eq!(mobi.weighted_avg_cost, Money::zero());
}

#[test]
fn partial_payment() {
    let mut snapshot = ledger();
    snapshot.orders = vec![sale("o1", 1, 1_000_000, Some(day(20)))];
    snapshot.payments = vec![receipt("o1", 400_000)];

    let views = aggregate(&snapshot, now(), &EngineConfig::default());
    let order = views.order("o1").unwrap();

    assert_eq!(order.paid_amount.dong(), 400_000);
    assert_eq!(order.remaining.dong(), 600_000);
    assert_eq!(order.payment_status, PaymentStatus::Partial);
}

#[test]
fn extensions_escalate_debt_level() {
    let config = EngineConfig::default();
    let mut snapshot = ledger();
    snapshot.orders = vec![sale("o1", 1, 1_000_000, Some(day(14)))];
    snapshot.payments = vec![receipt("o1", 400_000)];

    // due yesterday, never extended
    let views = aggregate(&snapshot, now(), &config);
    let order = views.order("o1").unwrap();
    assert!(order.is_overdue);
    assert_eq!(order.debt_level, DebtLevel::Overdue);

    // three extensions, the last one into the future
    for (i, new_day) in [16, 18, 25].into_iter().enumerate() {
        let plan = plan_due_date_extension(
            &snapshot.orders[0],
            day(new_day),
            "customer asked for more time",
            now(),
            format!("log-{}", i),
        )
        .unwrap();
        snapshot.orders[0] = plan.order;
        snapshot.due_date_logs.push(plan.log);
    }

    let views = aggregate(&snapshot, now(), &config);
    let order = views.order("o1").unwrap();
    assert_eq!(order.due_date_change_count, 3);
    assert_eq!(order.extension_count_logged, 3);
    assert!(!order.is_overdue);
    assert_eq!(order.debt_level, DebtLevel::Warning);
    assert!(!order.is_bad_debt);

    let history = due_date_history(&snapshot, "o1");
    assert_eq!(history[0].old_date, Some(day(14)));
    assert_eq!(history[2].new_date, day(25));

    let plan = plan_due_date_extension(&snapshot.orders[0], day(30), "", now(), "log-3".into()).unwrap();
    snapshot.orders[0] = plan.order;

    let views = aggregate(&snapshot, now(), &config);
    let order = views.order("o1").unwrap();
    assert_eq!(order.debt_level, DebtLevel::Recovery);
    assert!(order.is_bad_debt);
}

#[test]
fn customer_rollup() {
    let mut snapshot = ledger();
    snapshot.orders = vec![
        sale("o1", 1, 500_000, Some(day(10))),
        sale("o2", 1, 1_000_000, Some(day(10))),
    ];
    snapshot.payments = vec![receipt("o1", 500_000), receipt("o2", 400_000)];

    let views = aggregate(&snapshot, now(), &EngineConfig::default());
    let customer = views.customer("c1").unwrap();

    assert_eq!(customer.current_debt.dong(), 600_000);
    assert_eq!(customer.gmv.dong(), 1_500_000);
    assert_eq!(customer.next_due_date, Some(day(10)));
    // o1 is settled (NORMAL), o2 is past due (OVERDUE)
    assert_eq!(customer.worst_debt_level, DebtLevel::Overdue);
}

#[test]
fn settled_orders_are_paid_and_normal() {
    let mut snapshot = ledger();
    let mut order = sale("o1", 2, 300_000, Some(day(1)));
    order.due_date_change_count = 7;
    snapshot.orders = vec![order];
    snapshot.payments = vec![receipt("o1", 600_000)];

    let views = aggregate(&snapshot, now(), &EngineConfig::default());
    let stat = views.order("o1").unwrap();

    assert_eq!(stat.remaining, Money::zero());
    assert_eq!(stat.payment_status, PaymentStatus::Paid);
    assert_eq!(stat.debt_level, DebtLevel::Normal);
}

#[test]
fn aggregation_is_idempotent() {
    let mut snapshot = ledger();
    snapshot.orders = vec![sale("o1", 10, 550_000, Some(day(3))), sale("o2", 5, 520_000, None)];
    snapshot.payments = vec![receipt("o1", 1_000_000)];

    let config = EngineConfig::default();
    assert_eq!(aggregate(&snapshot, now(), &config), aggregate(&snapshot, now(), &config));
}

#[test]
fn change_count_beats_due_date() {
    let config = EngineConfig::default();
    let mut snapshot = ledger();
    snapshot.orders = vec![sale("o1", 1, 1_000_000, Some(day(1)))];

    for (count, expected) in [
        (2, DebtLevel::Overdue),
        (3, DebtLevel::Warning),
        (4, DebtLevel::Recovery),
    ] {
        snapshot.orders[0].due_date_change_count = count;
        let views = aggregate(&snapshot, now(), &config);
        assert_eq!(views.order("o1").unwrap().debt_level, expected, "count {}", count);
    }

    // a future due date changes nothing once the count rules apply
    snapshot.orders[0].due_date = Some(day(30));
    for (count, expected) in [
        (2, DebtLevel::Normal),
        (3, DebtLevel::Warning),
        (4, DebtLevel::Recovery),
    ] {
        snapshot.orders[0].due_date_change_count = count;
        let views = aggregate(&snapshot, now(), &config);
        assert_eq!(views.order("o1").unwrap().debt_level, expected, "count {}", count);
    }
}
