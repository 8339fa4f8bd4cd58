//! # Payment Repository
//!
//! The cash ledger. Money is stored as whole đồng in INTEGER columns; the
//! direction column carries the sign, amounts are never negative.

use chrono::NaiveDate;
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use simledger_core::codes::PAYMENT_PREFIX;
use simledger_core::validation::validate_payment;
use simledger_core::{CoreError, Money, Payment, PaymentDirection, PaymentMethod};

#[derive(Debug, FromRow)]
struct PaymentRow {
    id: String,
    code: String,
    direction: PaymentDirection,
    date: NaiveDate,
    amount: i64,
    category: String,
    method: PaymentMethod,
    linked_order_id: Option<String>,
    linked_batch_id: Option<String>,
    note: String,
}

impl From<PaymentRow> for Payment {
    fn from(row: PaymentRow) -> Self {
        Payment {
            id: row.id,
            code: row.code,
            direction: row.direction,
            date: row.date,
            amount: Money::from_dong(row.amount),
            category: row.category,
            method: row.method,
            linked_order_id: row.linked_order_id,
            linked_batch_id: row.linked_batch_id,
            note: row.note,
        }
    }
}

const SELECT_PAYMENT: &str = r#"
    SELECT
        id, code, direction, date, amount, category, method,
        linked_order_id, linked_batch_id, note
    FROM payments
"#;

/// Repository for cash-ledger entries.
#[derive(Debug, Clone)]
pub struct PaymentRepository {
    pool: SqlitePool,
}

impl PaymentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PaymentRepository { pool }
    }

    /// Inserts a payment. An empty `code` gets the next `TX-YYMMDD-NNN`.
    pub async fn insert(&self, payment: &Payment) -> DbResult<Payment> {
        let mut payment = payment.clone();
        if payment.code.trim().is_empty() {
            payment.code =
                super::next_code(&self.pool, "payments", PAYMENT_PREFIX, payment.date).await?;
        }

        insert_payment(&self.pool, &payment).await?;
        Ok(payment)
    }

    /// Next free `TX-YYMMDD-NNN` code for `date`.
    pub async fn next_code(&self, date: NaiveDate) -> DbResult<String> {
        super::next_code(&self.pool, "payments", PAYMENT_PREFIX, date).await
    }

    pub async fn list(&self) -> DbResult<Vec<Payment>> {
        Self::fetch_payments(&self.pool).await
    }

    /// Every entry linked to `order_id`, in either direction.
    pub async fn list_for_order(&self, order_id: &str) -> DbResult<Vec<Payment>> {
        let sql = format!("{} WHERE linked_order_id = ?1 ORDER BY date, code", SELECT_PAYMENT);
        let rows: Vec<PaymentRow> = sqlx::query_as(&sql)
            .bind(order_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Payment::from).collect())
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting payment");

        let result = sqlx::query("DELETE FROM payments WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Payment", id));
        }

        Ok(())
    }

    pub(crate) async fn fetch_payments<'e, E>(executor: E) -> DbResult<Vec<Payment>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = format!("{} ORDER BY date, code", SELECT_PAYMENT);
        let rows: Vec<PaymentRow> = sqlx::query_as(&sql).fetch_all(executor).await?;

        Ok(rows.into_iter().map(Payment::from).collect())
    }
}

/// Validates and inserts one payment. Shared with the order transaction.
pub(crate) async fn insert_payment<'e, E>(executor: E, payment: &Payment) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    validate_payment(payment).map_err(CoreError::from)?;

    debug!(
        id = %payment.id,
        code = %payment.code,
        amount = payment.amount.dong(),
        "Inserting payment"
    );

    sqlx::query(
        r#"
        INSERT INTO payments (
            id, code, direction, date, amount, category, method,
            linked_order_id, linked_batch_id, note
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(&payment.id)
    .bind(&payment.code)
    .bind(payment.direction)
    .bind(payment.date)
    .bind(payment.amount.dong())
    .bind(&payment.category)
    .bind(payment.method)
    .bind(payment.linked_order_id.as_deref())
    .bind(payment.linked_batch_id.as_deref())
    .bind(&payment.note)
    .execute(executor)
    .await
    .map_err(|e| DbError::from(e).with_values(&[("id", &payment.id), ("code", &payment.code)]))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::repository::generate_id;
    use crate::{Database, DbConfig, DbError};
    use chrono::NaiveDate;
    use simledger_core::{Money, Payment, PaymentDirection, PaymentMethod};

    fn payment(direction: PaymentDirection, amount: i64) -> Payment {
        Payment {
            id: generate_id(),
            code: String::new(),
            direction,
            date: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
            amount: Money::from_dong(amount),
            category: "Rent".to_string(),
            method: PaymentMethod::Transfer,
            linked_order_id: None,
            linked_batch_id: None,
            note: String::new(),
        }
    }

    #[tokio::test]
    async fn test_insert_generates_codes_and_lists_in_order() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let first = db
            .payments()
            .insert(&payment(PaymentDirection::Out, 4_000_000))
            .await
            .unwrap();
        let second = db
            .payments()
            .insert(&payment(PaymentDirection::In, 1_500_000))
            .await
            .unwrap();

        assert_eq!(first.code, "TX-240305-001");
        assert_eq!(second.code, "TX-240305-002");

        let listed = db.payments().list().await.unwrap();
        assert_eq!(listed, vec![first, second]);
    }

    #[tokio::test]
    async fn test_next_code_skips_past_highest_sequence() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        for code in ["TX-240305-001", "TX-240305-007", "TX-240305-999"] {
            let mut entry = payment(PaymentDirection::Out, 10);
            entry.code = code.to_string();
            db.payments().insert(&entry).await.unwrap();
        }

        let first = db.payments().list().await.unwrap().remove(0);
        db.payments().delete(&first.id).await.unwrap();

        let next = db
            .payments()
            .insert(&payment(PaymentDirection::In, 10))
            .await
            .unwrap();
        assert_eq!(next.code, "TX-240305-1000");

        let date = NaiveDate::from_ymd_opt(2024, 3, 6).unwrap();
        assert_eq!(db.payments().next_code(date).await.unwrap(), "TX-240306-001");
    }

    #[tokio::test]
    async fn test_negative_amount_is_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let err = db
            .payments()
            .insert(&payment(PaymentDirection::In, -1))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(_)));
    }

    #[tokio::test]
    async fn test_link_to_unknown_order_is_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut linked = payment(PaymentDirection::In, 100);
        linked.linked_order_id = Some("missing".to_string());

        let err = db.payments().insert(&linked).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_delete() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let saved = db
            .payments()
            .insert(&payment(PaymentDirection::Out, 10))
            .await
            .unwrap();

        db.payments().delete(&saved.id).await.unwrap();
        assert!(db.payments().list().await.unwrap().is_empty());
        assert!(matches!(
            db.payments().delete(&saved.id).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
