//! # Order Repository
//!
//! Sale orders and their due-date change logs.
//!
//! ## Write Paths
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create(plan)                    one transaction                       │
//! │  ├── INSERT sale_orders                                                 │
//! │  └── INSERT payments             only when settled at creation          │
//! │                                                                         │
//! │  extend_due_date(plan)           one transaction                       │
//! │  ├── UPDATE sale_orders          due_date, change count + 1             │
//! │  │     WHERE change count is still the one the plan started from       │
//! │  └── INSERT due_date_logs                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Storage of References
//! `BuyerRef` and `ProductRef` are flattened into nullable columns:
//!
//! | variant                         | customer_id | counterparty_name |
//! |---------------------------------|-------------|-------------------|
//! | `Customer{id, name_snapshot}`   | id          | name_snapshot     |
//! | `Freeform{name}`                | NULL        | name              |
//!
//! | variant       | product_type_id | batch_id |
//! |---------------|-----------------|----------|
//! | `ByType(id)`  | id              | NULL     |
//! | `ByBatch(id)` | NULL            | id       |

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Executor, FromRow, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::payment::insert_payment;
use simledger_core::commands::{DueDateExtension, NewOrderPlan};
use simledger_core::{BuyerRef, DueDateChangeLog, Money, ProductRef, SaleOrder, SalesChannel};

// =============================================================================
// Rows
// =============================================================================

#[derive(Debug, FromRow)]
struct OrderRow {
    id: String,
    code: String,
    date: NaiveDate,
    customer_id: Option<String>,
    counterparty_name: String,
    channel: SalesChannel,
    product_type_id: Option<String>,
    batch_id: Option<String>,
    quantity: i64,
    unit_sale_price: i64,
    due_date: Option<NaiveDate>,
    due_date_change_count: i64,
    note: String,
    is_settled_at_creation: bool,
}

impl TryFrom<OrderRow> for SaleOrder {
    type Error = DbError;

    fn try_from(row: OrderRow) -> DbResult<Self> {
        let product = match (row.product_type_id, row.batch_id) {
            (Some(type_id), None) => ProductRef::ByType(type_id),
            (None, Some(batch_id)) => ProductRef::ByBatch(batch_id),
            _ => {
                return Err(DbError::corrupt(
                    "sale order",
                    &row.id,
                    "exactly one of product_type_id and batch_id must be set",
                ))
            }
        };

        let buyer = match row.customer_id {
            Some(customer_id) => BuyerRef::Customer {
                customer_id,
                name_snapshot: row.counterparty_name,
            },
            None => BuyerRef::Freeform {
                name: row.counterparty_name,
            },
        };

        let due_date_change_count = u32::try_from(row.due_date_change_count)
            .map_err(|_| DbError::corrupt("sale order", &row.id, "negative due_date_change_count"))?;

        Ok(SaleOrder {
            id: row.id,
            code: row.code,
            date: row.date,
            buyer,
            channel: row.channel,
            product,
            quantity: row.quantity,
            unit_sale_price: Money::from_dong(row.unit_sale_price),
            due_date: row.due_date,
            due_date_change_count,
            note: row.note,
            is_settled_at_creation: row.is_settled_at_creation,
        })
    }
}

#[derive(Debug, FromRow)]
struct LogRow {
    id: String,
    order_id: String,
    old_date: Option<NaiveDate>,
    new_date: NaiveDate,
    reason: String,
    changed_at: DateTime<Utc>,
}

impl From<LogRow> for DueDateChangeLog {
    fn from(row: LogRow) -> Self {
        DueDateChangeLog {
            id: row.id,
            order_id: row.order_id,
            old_date: row.old_date,
            new_date: row.new_date,
            reason: row.reason,
            changed_at: row.changed_at,
        }
    }
}

const SELECT_ORDER: &str = r#"
    SELECT
        id, code, date, customer_id, counterparty_name, channel,
        product_type_id, batch_id, quantity, unit_sale_price,
        due_date, due_date_change_count, note, is_settled_at_creation
    FROM sale_orders
"#;

const SELECT_LOG: &str = r#"
    SELECT id, order_id, old_date, new_date, reason, changed_at
    FROM due_date_logs
"#;

// =============================================================================
// Repository
// =============================================================================

/// Repository for sale orders.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Next free `SO-YYMMDD-NNN` code for `date`.
    pub async fn next_code(&self, date: NaiveDate) -> DbResult<String> {
        super::next_code(&self.pool, "sale_orders", simledger_core::codes::ORDER_PREFIX, date).await
    }

    /// Stores a planned order, and its settlement payment if it has one.
    pub async fn create(&self, plan: &NewOrderPlan) -> DbResult<()> {
        let order = &plan.order;
        debug!(
            id = %order.id,
            code = %order.code,
            settled = plan.settlement.is_some(),
            "Creating sale order"
        );

        let mut tx = self.pool.begin().await?;

        insert_order(&mut tx, order).await?;
        if let Some(payment) = &plan.settlement {
            insert_payment(&mut *tx, payment).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<SaleOrder>> {
        let sql = format!("{} WHERE id = ?1", SELECT_ORDER);
        let row: Option<OrderRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(SaleOrder::try_from).transpose()
    }

    pub async fn list(&self) -> DbResult<Vec<SaleOrder>> {
        Self::fetch_orders(&self.pool).await
    }

    /// Deletes an order. Its logs go with it; linked payments stay, unlinked.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting sale order");

        let result = sqlx::query("DELETE FROM sale_orders WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sale order", id));
        }

        Ok(())
    }

    /// Applies a planned due-date extension.
    ///
    /// Fails with [`DbError::Conflict`] if the order was extended by someone
    /// else after the plan was made.
    pub async fn extend_due_date(&self, plan: &DueDateExtension) -> DbResult<()> {
        let order = &plan.order;
        let previous_count = order.due_date_change_count.saturating_sub(1);

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE sale_orders SET
                due_date = ?2,
                due_date_change_count = ?3
            WHERE id = ?1 AND due_date_change_count = ?4
            "#,
        )
        .bind(&order.id)
        .bind(order.due_date)
        .bind(i64::from(order.due_date_change_count))
        .bind(i64::from(previous_count))
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            let exists: Option<String> = sqlx::query_scalar("SELECT id FROM sale_orders WHERE id = ?1")
                .bind(&order.id)
                .fetch_optional(&mut *tx)
                .await?;

            return Err(match exists {
                Some(_) => DbError::Conflict {
                    entity: "Sale order".to_string(),
                    id: order.id.clone(),
                },
                None => DbError::not_found("Sale order", &order.id),
            });
        }

        let log = &plan.log;
        sqlx::query(
            r#"
            INSERT INTO due_date_logs (id, order_id, old_date, new_date, reason, changed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&log.id)
        .bind(&log.order_id)
        .bind(log.old_date)
        .bind(log.new_date)
        .bind(&log.reason)
        .bind(log.changed_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            order_id = %order.id,
            new_due_date = %log.new_date,
            change_count = order.due_date_change_count,
            "Due date extended"
        );

        Ok(())
    }

    /// Due-date changes for one order, oldest first.
    pub async fn due_date_logs(&self, order_id: &str) -> DbResult<Vec<DueDateChangeLog>> {
        let sql = format!("{} WHERE order_id = ?1 ORDER BY changed_at, id", SELECT_LOG);
        let rows: Vec<LogRow> = sqlx::query_as(&sql)
            .bind(order_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(DueDateChangeLog::from).collect())
    }

    pub(crate) async fn fetch_orders<'e, E>(executor: E) -> DbResult<Vec<SaleOrder>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = format!("{} ORDER BY date, code", SELECT_ORDER);
        let rows: Vec<OrderRow> = sqlx::query_as(&sql).fetch_all(executor).await?;

        rows.into_iter().map(SaleOrder::try_from).collect()
    }

    pub(crate) async fn fetch_due_date_logs<'e, E>(executor: E) -> DbResult<Vec<DueDateChangeLog>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = format!("{} ORDER BY changed_at, id", SELECT_LOG);
        let rows: Vec<LogRow> = sqlx::query_as(&sql).fetch_all(executor).await?;

        Ok(rows.into_iter().map(DueDateChangeLog::from).collect())
    }
}

async fn insert_order(conn: &mut SqliteConnection, order: &SaleOrder) -> DbResult<()> {
    let (customer_id, counterparty_name) = match &order.buyer {
        BuyerRef::Customer {
            customer_id,
            name_snapshot,
        } => (Some(customer_id.as_str()), name_snapshot.as_str()),
        BuyerRef::Freeform { name } => (None, name.as_str()),
    };

    let (product_type_id, batch_id) = match &order.product {
        ProductRef::ByType(id) => (Some(id.as_str()), None),
        ProductRef::ByBatch(id) => (None, Some(id.as_str())),
    };

    sqlx::query(
        r#"
        INSERT INTO sale_orders (
            id, code, date, customer_id, counterparty_name, channel,
            product_type_id, batch_id, quantity, unit_sale_price,
            due_date, due_date_change_count, note, is_settled_at_creation
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
        "#,
    )
    .bind(&order.id)
    .bind(&order.code)
    .bind(order.date)
    .bind(customer_id)
    .bind(counterparty_name)
    .bind(order.channel)
    .bind(product_type_id)
    .bind(batch_id)
    .bind(order.quantity)
    .bind(order.unit_sale_price.dong())
    .bind(order.due_date)
    .bind(i64::from(order.due_date_change_count))
    .bind(&order.note)
    .bind(order.is_settled_at_creation)
    .execute(conn)
    .await
    .map_err(|e| DbError::from(e).with_values(&[("id", &order.id), ("code", &order.code)]))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::repository::generate_id;
    use crate::{Database, DbConfig, DbError};
    use chrono::{NaiveDate, TimeZone, Utc};
    use simledger_core::commands::{plan_due_date_extension, plan_new_order};
    use simledger_core::{
        BuyerRef, Customer, CustomerSegment, Money, PaymentMethod, ProductRef, ProductType,
        SaleOrder, SalesChannel,
    };

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    async fn setup() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.catalog()
            .insert_product_type(&ProductType {
                id: "vina".to_string(),
                name: "Vina 4G".to_string(),
            })
            .await
            .unwrap();
        db.customers()
            .insert(&Customer {
                id: "c1".to_string(),
                customer_code: "KH-5678-NA".to_string(),
                name: "Nguyen An".to_string(),
                phone: String::new(),
                email: String::new(),
                address: String::new(),
                segment: CustomerSegment::Wholesale,
                note: String::new(),
            })
            .await
            .unwrap();
        db
    }

    fn order(code: &str, settled: bool) -> SaleOrder {
        SaleOrder {
            id: generate_id(),
            code: code.to_string(),
            date: day(1),
            buyer: BuyerRef::Customer {
                customer_id: "c1".to_string(),
                name_snapshot: "Nguyen An".to_string(),
            },
            channel: SalesChannel::Wholesale,
            product: ProductRef::ByType("vina".to_string()),
            quantity: 30,
            unit_sale_price: Money::from_dong(600_000),
            due_date: Some(day(10)),
            due_date_change_count: 0,
            note: String::new(),
            is_settled_at_creation: settled,
        }
    }

    #[tokio::test]
    async fn test_create_settled_order_inserts_payment() {
        let db = setup().await;
        let plan = plan_new_order(&order("SO-240301-001", true), generate_id(), "TX-240301-001".into(), PaymentMethod::Cash)
            .unwrap();
        db.orders().create(&plan).await.unwrap();

        let stored = db.orders().get(&plan.order.id).await.unwrap().unwrap();
        assert_eq!(stored, plan.order);
        assert_eq!(stored.due_date, None);

        let payments = db.payments().list_for_order(&plan.order.id).await.unwrap();
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].amount.dong(), 18_000_000);
    }

    #[tokio::test]
    async fn test_failed_payment_rolls_back_order() {
        let db = setup().await;
        let first = plan_new_order(&order("SO-240301-001", true), generate_id(), "TX-DUP".into(), PaymentMethod::Cash)
            .unwrap();
        db.orders().create(&first).await.unwrap();

        // same payment code: the payment insert fails, so the order must not stay
        let second = plan_new_order(&order("SO-240301-002", true), generate_id(), "TX-DUP".into(), PaymentMethod::Cash)
            .unwrap();
        let err = db.orders().create(&second).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::UniqueViolation { ref field, ref value }
                if field == "payments.code" && value == "TX-DUP"
        ));
        assert!(db.orders().get(&second.order.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_freeform_and_legacy_references_roundtrip() {
        let db = setup().await;
        let batch = db
            .catalog()
            .insert_batch(&simledger_core::InventoryBatch {
                id: generate_id(),
                code: String::new(),
                name: "Vina 4G".to_string(),
                product_type_id: "vina".to_string(),
                import_date: day(1),
                quantity: 10,
                total_import_cost: Money::from_dong(1_000_000),
            })
            .await
            .unwrap();

        let mut legacy = order("SO-240301-009", false);
        legacy.buyer = BuyerRef::Freeform {
            name: "Walk-in".to_string(),
        };
        legacy.channel = SalesChannel::Retail;
        legacy.product = ProductRef::ByBatch(batch.id.clone());
        let plan = plan_new_order(&legacy, generate_id(), "TX-1".into(), PaymentMethod::Cod).unwrap();
        db.orders().create(&plan).await.unwrap();

        let stored = db.orders().get(&legacy.id).await.unwrap().unwrap();
        assert_eq!(stored, legacy);

        // the batch is still referenced
        let err = db.catalog().delete_batch(&batch.id).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_extend_due_date_is_transactional_and_checks_count() {
        let db = setup().await;
        let plan = plan_new_order(&order("SO-240301-001", false), generate_id(), "TX-1".into(), PaymentMethod::Cash)
            .unwrap();
        db.orders().create(&plan).await.unwrap();

        let at = Utc.with_ymd_and_hms(2024, 3, 9, 8, 0, 0).unwrap();
        let extension = plan_due_date_extension(&plan.order, day(17), "asked for a week", at, generate_id()).unwrap();
        db.orders().extend_due_date(&extension).await.unwrap();

        let stored = db.orders().get(&plan.order.id).await.unwrap().unwrap();
        assert_eq!(stored.due_date, Some(day(17)));
        assert_eq!(stored.due_date_change_count, 1);

        let logs = db.orders().due_date_logs(&plan.order.id).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].old_date, Some(day(10)));
        assert_eq!(logs[0].changed_at, at);

        // replaying the same plan is a stale write
        let err = db.orders().extend_due_date(&extension).await.unwrap_err();
        assert!(matches!(err, DbError::Conflict { .. }));
        assert_eq!(db.orders().due_date_logs(&plan.order.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_keeps_payments_and_drops_logs() {
        let db = setup().await;
        let plan = plan_new_order(&order("SO-240301-001", true), generate_id(), "TX-1".into(), PaymentMethod::Cash)
            .unwrap();
        db.orders().create(&plan).await.unwrap();

        db.orders().delete(&plan.order.id).await.unwrap();

        let payments = db.payments().list().await.unwrap();
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].linked_order_id, None);
        assert!(db.orders().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_next_code() {
        let db = setup().await;
        assert_eq!(db.orders().next_code(day(1)).await.unwrap(), "SO-240301-001");

        let plan = plan_new_order(&order("SO-240301-001", false), generate_id(), "TX-1".into(), PaymentMethod::Cash)
            .unwrap();
        db.orders().create(&plan).await.unwrap();
        assert_eq!(db.orders().next_code(day(1)).await.unwrap(), "SO-240301-002");
        assert_eq!(db.orders().next_code(day(2)).await.unwrap(), "SO-240302-001");
    }
}
