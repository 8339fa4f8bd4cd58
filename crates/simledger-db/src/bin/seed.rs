//! # Seed Data Generator
//!
//! Populates the database with a demo SIM-card ledger for development.
//!
//! ## Usage
//! ```bash
//! # 60 days of history (default)
//! cargo run -p simledger-db --bin seed
//!
//! # Longer history
//! cargo run -p simledger-db --bin seed -- --days 180
//!
//! # Specify database path
//! cargo run -p simledger-db --bin seed -- --db ./data/ledger.db
//! ```
//!
//! ## Generated Data
//! - One product type per carrier (Viettel, Vinaphone, Mobifone, Vietnamobile)
//! - A batch import for every carrier every 10 days, with its OUT payment
//! - Wholesale dealers and retail customers
//! - About two orders per day, a mix of wholesale on credit and retail paid
//!   at the counter, with partial payments and a few due-date extensions
//!
//! Everything is derived from the day index, so two runs produce the same
//! ledger shape (ids differ).

use chrono::{Days, NaiveDate, Utc};
use std::env;
use tracing_subscriber::EnvFilter;

use simledger_core::{
    BuyerRef, Customer, CustomerSegment, InventoryBatch, Money, Payment, PaymentDirection,
    PaymentMethod, ProductRef, ProductType, SaleOrder, SalesChannel,
};
use simledger_db::{generate_id, Database, DbConfig, LedgerService};

/// Carriers with (id, name, import cost per SIM, sale price per SIM).
const CARRIERS: &[(&str, &str, i64, i64)] = &[
    ("viettel", "Viettel 4G", 45_000, 60_000),
    ("vina", "Vinaphone 4G", 40_000, 55_000),
    ("mobi", "Mobifone 4G", 42_000, 58_000),
    ("vnmb", "Vietnamobile", 25_000, 35_000),
];

/// Customers with (name, phone, segment).
const CUSTOMERS: &[(&str, &str, CustomerSegment)] = &[
    ("Nguyen Van An", "0901235678", CustomerSegment::Wholesale),
    ("Tran Thi Binh", "0912345671", CustomerSegment::Wholesale),
    ("Le Hoang Cuong", "0987654322", CustomerSegment::Wholesale),
    ("Pham Minh Duc", "0933111444", CustomerSegment::Retail),
    ("Hoang Thu Ha", "0977222555", CustomerSegment::Retail),
];

const WALK_IN_NAMES: &[&str] = &["Walk-in", "", "Khach le"];

const BATCH_SIZE: i64 = 300;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // RUST_LOG=debug shows every insert
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut days: u64 = 60;
    let mut db_path = String::from("./simledger_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--days" | "-n" => {
                if i + 1 < args.len() {
                    days = args[i + 1].parse().unwrap_or(60);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("SimLedger Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -n, --days <N>     Days of history to generate (default: 60)");
                println!("  -d, --db <PATH>    Database file path (default: ./simledger_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 SimLedger Seed Data Generator");
    println!("===============================");
    println!("Database: {}", db_path);
    println!("Days:     {}", days);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.customers().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} customers", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let service = LedgerService::new(db.clone(), Default::default())?;
    let now = Utc::now();
    let first_day = now
        .date_naive()
        .checked_sub_days(Days::new(days))
        .unwrap_or(now.date_naive());

    // Catalog and customers
    for (id, name, _, _) in CARRIERS {
        db.catalog()
            .insert_product_type(&ProductType {
                id: id.to_string(),
                name: name.to_string(),
            })
            .await?;
    }

    let mut customer_ids = Vec::with_capacity(CUSTOMERS.len());
    for (name, phone, segment) in CUSTOMERS {
        let saved = db
            .customers()
            .insert(&Customer {
                id: generate_id(),
                customer_code: String::new(),
                name: name.to_string(),
                phone: phone.to_string(),
                email: String::new(),
                address: "Ho Chi Minh City".to_string(),
                segment: *segment,
                note: String::new(),
            })
            .await?;
        customer_ids.push((saved.id, saved.name, *segment));
    }

    println!("✓ {} product types, {} customers", CARRIERS.len(), customer_ids.len());
    println!();
    println!("Generating ledger...");

    let start = std::time::Instant::now();
    let mut batches = 0;
    let mut orders = Vec::new();

    for offset in 0..days {
        let Some(date) = first_day.checked_add_days(Days::new(offset)) else {
            break;
        };
        let seed = offset as usize;

        if offset % 10 == 0 {
            for (id, name, cost, _) in CARRIERS {
                import_batch(&service, id, name, *cost, date).await?;
                batches += 1;
            }
        }

        for slot in 0..2 {
            let n = seed * 2 + slot;
            let (carrier_id, _, _, price) = CARRIERS[n % CARRIERS.len()];

            let order = if n % 3 == 0 {
                let name = WALK_IN_NAMES[n % WALK_IN_NAMES.len()];
                retail_order(carrier_id, price, date, name, 1 + (n % 5) as i64)
            } else {
                let (customer_id, customer_name, segment) = &customer_ids[n % customer_ids.len()];
                let quantity = match segment {
                    CustomerSegment::Wholesale => 20 + (n % 4) as i64 * 10,
                    CustomerSegment::Retail => 2 + (n % 3) as i64,
                };
                credit_order(carrier_id, price, date, customer_id, customer_name, quantity, n)
            };

            let method = if n % 2 == 0 { PaymentMethod::Cash } else { PaymentMethod::Cod };
            let saved = service.create_order(&order, method).await?;
            orders.push((saved, n));
        }
    }

    // Partial payments and extensions on credit orders
    let mut payments = 0;
    let mut extensions = 0;
    for (order, n) in &orders {
        if order.is_settled_at_creation {
            continue;
        }

        let total = order.total_amount();
        let paid = match n % 4 {
            0 => total,
            1 => Money::from_dong(total.dong() / 2),
            _ => Money::zero(),
        };
        if paid.is_positive() {
            service.record_payment(&receipt(order, paid)).await?;
            payments += 1;
        }

        if let Some(due) = order.due_date {
            for round in 0..(n % 6).saturating_sub(1) {
                let Some(new_due) = due.checked_add_days(Days::new(7 * (round as u64 + 1))) else {
                    break;
                };
                service
                    .extend_due_date(&order.id, new_due, "Customer asked for more time", now)
                    .await?;
                extensions += 1;
            }
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!(
        "✓ Generated {} batches, {} orders, {} payments, {} extensions in {:?}",
        batches,
        orders.len(),
        payments,
        extensions,
        elapsed
    );

    // Verify aggregation
    println!();
    println!("Verifying aggregation...");
    let aggregation = service.aggregation(now).await?;
    let bad_debt = aggregation.orders.iter().filter(|o| o.is_bad_debt).count();
    let low_stock = aggregation
        .inventory
        .iter()
        .filter(|s| s.status == simledger_core::StockStatus::LowStock)
        .count();
    println!("  Orders with bad debt: {}", bad_debt);
    println!("  Low-stock product types: {}", low_stock);
    for stat in &aggregation.inventory {
        println!(
            "  {:<14} stock {:>5}  avg cost {}",
            stat.product_name, stat.current_stock, stat.weighted_avg_cost
        );
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Imports one batch and records what was paid for it.
async fn import_batch(
    service: &LedgerService,
    product_type_id: &str,
    name: &str,
    unit_cost: i64,
    date: NaiveDate,
) -> Result<(), Box<dyn std::error::Error>> {
    let batch = service
        .import_batch(&InventoryBatch {
            id: generate_id(),
            code: String::new(),
            name: name.to_string(),
            product_type_id: product_type_id.to_string(),
            import_date: date,
            quantity: BATCH_SIZE,
            total_import_cost: Money::from_dong(unit_cost * BATCH_SIZE),
        })
        .await?;

    service
        .record_payment(&Payment {
            id: generate_id(),
            code: String::new(),
            direction: PaymentDirection::Out,
            date,
            amount: batch.total_import_cost,
            category: "Import".to_string(),
            method: PaymentMethod::Transfer,
            linked_order_id: None,
            linked_batch_id: Some(batch.id.clone()),
            note: format!("Import {}", batch.code),
        })
        .await?;

    Ok(())
}

/// Counter sale, paid in full on the spot.
fn retail_order(product_type_id: &str, price: i64, date: NaiveDate, name: &str, quantity: i64) -> SaleOrder {
    SaleOrder {
        id: generate_id(),
        code: String::new(),
        date,
        buyer: BuyerRef::Freeform {
            name: name.to_string(),
        },
        channel: SalesChannel::Retail,
        product: ProductRef::ByType(product_type_id.to_string()),
        quantity,
        unit_sale_price: Money::from_dong(price),
        due_date: None,
        due_date_change_count: 0,
        note: String::new(),
        is_settled_at_creation: true,
    }
}

/// Sale on credit to a registered customer, due 7 to 14 days later.
fn credit_order(
    product_type_id: &str,
    price: i64,
    date: NaiveDate,
    customer_id: &str,
    customer_name: &str,
    quantity: i64,
    seed: usize,
) -> SaleOrder {
    SaleOrder {
        id: generate_id(),
        code: String::new(),
        date,
        buyer: BuyerRef::Customer {
            customer_id: customer_id.to_string(),
            name_snapshot: customer_name.to_string(),
        },
        channel: SalesChannel::Wholesale,
        product: ProductRef::ByType(product_type_id.to_string()),
        quantity,
        unit_sale_price: Money::from_dong(price - 5_000),
        due_date: date.checked_add_days(Days::new(7 + (seed % 8) as u64)),
        due_date_change_count: 0,
        note: String::new(),
        is_settled_at_creation: false,
    }
}

fn receipt(order: &SaleOrder, amount: Money) -> Payment {
    Payment {
        id: generate_id(),
        code: String::new(),
        direction: PaymentDirection::In,
        date: order.date,
        amount,
        category: order.channel.receipt_category().to_string(),
        method: PaymentMethod::Transfer,
        linked_order_id: Some(order.id.clone()),
        linked_batch_id: None,
        note: String::new(),
    }
}
