//! # Customer Repository
//!
//! The customer registry. Orders keep a snapshot of the buyer's name, so
//! renaming a customer changes every derived view but not the stored orders.

use sqlx::{Executor, FromRow, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use simledger_core::codes::customer_code;
use simledger_core::validation::validate_customer;
use simledger_core::{CoreError, Customer, CustomerSegment};

#[derive(Debug, FromRow)]
struct CustomerRow {
    id: String,
    customer_code: String,
    name: String,
    phone: String,
    email: String,
    address: String,
    segment: CustomerSegment,
    note: String,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Customer {
            id: row.id,
            customer_code: row.customer_code,
            name: row.name,
            phone: row.phone,
            email: row.email,
            address: row.address,
            segment: row.segment,
            note: row.note,
        }
    }
}

const SELECT_CUSTOMER: &str = r#"
    SELECT id, customer_code, name, phone, email, address, segment, note
    FROM customers
"#;

/// Repository for customer records.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Inserts a customer. An empty `customer_code` is generated as
    /// `KH-<mid>-<initials>`, with a `-2`, `-3`, ... suffix when another
    /// customer already holds that code.
    pub async fn insert(&self, customer: &Customer) -> DbResult<Customer> {
        let mut customer = customer.clone();
        if customer.customer_code.trim().is_empty() {
            let existing = self.count().await?;
            let base = customer_code(
                &customer.name,
                &customer.phone,
                &customer.email,
                (existing + 1) as u32,
            );
            customer.customer_code = self.free_code(&base).await?;
        }
        validate_customer(&customer).map_err(CoreError::from)?;

        debug!(id = %customer.id, code = %customer.customer_code, "Inserting customer");

        sqlx::query(
            r#"
            INSERT INTO customers (
                id, customer_code, name, phone, email, address, segment, note
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.customer_code)
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(&customer.email)
        .bind(&customer.address)
        .bind(customer.segment)
        .bind(&customer.note)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DbError::from(e).with_values(&[
                ("id", &customer.id),
                ("customer_code", &customer.customer_code),
            ])
        })?;

        Ok(customer)
    }

    async fn free_code(&self, base: &str) -> DbResult<String> {
        let mut candidate = base.to_string();
        let mut suffix = 1u32;

        loop {
            let taken: i64 =
                sqlx::query_scalar("SELECT COUNT(*) FROM customers WHERE customer_code = ?1")
                    .bind(&candidate)
                    .fetch_one(&self.pool)
                    .await?;
            if taken == 0 {
                return Ok(candidate);
            }

            suffix += 1;
            candidate = format!("{}-{}", base, suffix);
        }
    }

    pub async fn update(&self, customer: &Customer) -> DbResult<()> {
        validate_customer(customer).map_err(CoreError::from)?;
        debug!(id = %customer.id, "Updating customer");

        let result = sqlx::query(
            r#"
            UPDATE customers SET
                customer_code = ?2,
                name = ?3,
                phone = ?4,
                email = ?5,
                address = ?6,
                segment = ?7,
                note = ?8
            WHERE id = ?1
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.customer_code)
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(&customer.email)
        .bind(&customer.address)
        .bind(customer.segment)
        .bind(&customer.note)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", &customer.id));
        }

        Ok(())
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<Customer>> {
        let sql = format!("{} WHERE id = ?1", SELECT_CUSTOMER);
        let row: Option<CustomerRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Customer::from))
    }

    pub async fn list(&self) -> DbResult<Vec<Customer>> {
        Self::fetch_customers(&self.pool).await
    }

    /// Fails with a foreign-key error while orders still reference the customer.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting customer");

        let result = sqlx::query("DELETE FROM customers WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    pub(crate) async fn fetch_customers<'e, E>(executor: E) -> DbResult<Vec<Customer>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = format!("{} ORDER BY name, customer_code", SELECT_CUSTOMER);
        let rows: Vec<CustomerRow> = sqlx::query_as(&sql).fetch_all(executor).await?;

        Ok(rows.into_iter().map(Customer::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use crate::repository::generate_id;
    use crate::{Database, DbConfig, DbError};
    use simledger_core::{Customer, CustomerSegment};

    fn customer(name: &str, phone: &str) -> Customer {
        Customer {
            id: generate_id(),
            customer_code: String::new(),
            name: name.to_string(),
            phone: phone.to_string(),
            email: String::new(),
            address: "Hue".to_string(),
            segment: CustomerSegment::Wholesale,
            note: String::new(),
        }
    }

    #[tokio::test]
    async fn test_insert_generates_code() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let saved = db
            .customers()
            .insert(&customer("Nguyen Van An", "0901235678"))
            .await
            .unwrap();

        assert_eq!(saved.customer_code, "KH-5678-NA");
        let loaded = db.customers().get(&saved.id).await.unwrap().unwrap();
        assert_eq!(loaded, saved);
    }

    #[tokio::test]
    async fn test_generated_code_collision_gets_suffix() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let first = db
            .customers()
            .insert(&customer("Nguyen An", "0901235678"))
            .await
            .unwrap();
        let second = db
            .customers()
            .insert(&customer("Nguyen Van An", "0911115678"))
            .await
            .unwrap();
        let third = db
            .customers()
            .insert(&customer("Ngo An", "0355555678"))
            .await
            .unwrap();

        assert_eq!(first.customer_code, "KH-5678-NA");
        assert_eq!(second.customer_code, "KH-5678-NA-2");
        assert_eq!(third.customer_code, "KH-5678-NA-3");

        // an explicit duplicate is still rejected
        let mut explicit = customer("Le Binh", "0900000000");
        explicit.customer_code = "KH-5678-NA".to_string();
        let err = db.customers().insert(&explicit).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::UniqueViolation { ref field, ref value }
                if field == "customers.customer_code" && value == "KH-5678-NA"
        ));
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut saved = db.customers().insert(&customer("Tran Binh", "")).await.unwrap();
        assert_eq!(saved.customer_code, "KH-1-TB");

        saved.segment = CustomerSegment::Retail;
        saved.name = "Tran Van Binh".to_string();
        db.customers().update(&saved).await.unwrap();

        let listed = db.customers().list().await.unwrap();
        assert_eq!(listed[0].segment, CustomerSegment::Retail);

        db.customers().delete(&saved.id).await.unwrap();
        assert_eq!(db.customers().count().await.unwrap(), 0);
        assert!(matches!(
            db.customers().delete(&saved.id).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_blank_name_is_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let err = db.customers().insert(&customer("  ", "0901")).await.unwrap_err();
        assert!(matches!(err, DbError::Core(_)));
    }
}
