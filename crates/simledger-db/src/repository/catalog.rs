//! # Catalog Repository
//!
//! Product types and the inventory batches bought for them.
//!
//! Batches are only ever inserted or deleted; stock and average cost are
//! derived by the engine, never written back.

use chrono::NaiveDate;
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use simledger_core::codes::BATCH_PREFIX;
use simledger_core::validation::{validate_batch, validate_name};
use simledger_core::{CoreError, InventoryBatch, Money, ProductType};

#[derive(Debug, FromRow)]
struct BatchRow {
    id: String,
    code: String,
    name: String,
    product_type_id: String,
    import_date: NaiveDate,
    quantity: i64,
    total_import_cost: i64,
}

impl From<BatchRow> for InventoryBatch {
    fn from(row: BatchRow) -> Self {
        InventoryBatch {
            id: row.id,
            code: row.code,
            name: row.name,
            product_type_id: row.product_type_id,
            import_date: row.import_date,
            quantity: row.quantity,
            total_import_cost: Money::from_dong(row.total_import_cost),
        }
    }
}

/// Repository for product types and inventory batches.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    // -------------------------------------------------------------------------
    // Product types
    // -------------------------------------------------------------------------

    pub async fn insert_product_type(&self, product_type: &ProductType) -> DbResult<()> {
        validate_name("name", &product_type.name).map_err(CoreError::from)?;
        debug!(id = %product_type.id, name = %product_type.name, "Inserting product type");

        sqlx::query("INSERT INTO product_types (id, name) VALUES (?1, ?2)")
            .bind(&product_type.id)
            .bind(product_type.name.trim())
            .execute(&self.pool)
            .await
            .map_err(|e| DbError::from(e).with_values(&[("id", &product_type.id)]))?;

        Ok(())
    }

    pub async fn list_product_types(&self) -> DbResult<Vec<ProductType>> {
        Self::fetch_product_types(&self.pool).await
    }

    /// Fails with a foreign-key error while batches or orders still use it.
    pub async fn delete_product_type(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product type");

        let result = sqlx::query("DELETE FROM product_types WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product type", id));
        }

        Ok(())
    }

    pub(crate) async fn fetch_product_types<'e, E>(executor: E) -> DbResult<Vec<ProductType>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT id, name FROM product_types ORDER BY name, id")
                .fetch_all(executor)
                .await?;

        Ok(rows
            .into_iter()
            .map(|(id, name)| ProductType { id, name })
            .collect())
    }

    // -------------------------------------------------------------------------
    // Inventory batches
    // -------------------------------------------------------------------------

    /// Inserts a batch. An empty `code` gets the next `SIM-YYMMDD-NNN`.
    pub async fn insert_batch(&self, batch: &InventoryBatch) -> DbResult<InventoryBatch> {
        let mut batch = batch.clone();
        if batch.code.trim().is_empty() {
            batch.code =
                super::next_code(&self.pool, "inventory_batches", BATCH_PREFIX, batch.import_date)
                    .await?;
        }
        validate_batch(&batch).map_err(CoreError::from)?;

        debug!(
            id = %batch.id,
            code = %batch.code,
            quantity = batch.quantity,
            "Inserting inventory batch"
        );

        sqlx::query(
            r#"
            INSERT INTO inventory_batches (
                id, code, name, product_type_id,
                import_date, quantity, total_import_cost
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&batch.id)
        .bind(&batch.code)
        .bind(&batch.name)
        .bind(&batch.product_type_id)
        .bind(batch.import_date)
        .bind(batch.quantity)
        .bind(batch.total_import_cost.dong())
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_values(&[("id", &batch.id), ("code", &batch.code)]))?;

        Ok(batch)
    }

    pub async fn get_batch(&self, id: &str) -> DbResult<Option<InventoryBatch>> {
        let row: Option<BatchRow> = sqlx::query_as(
            r#"
            SELECT id, code, name, product_type_id, import_date, quantity, total_import_cost
            FROM inventory_batches
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(InventoryBatch::from))
    }

    pub async fn list_batches(&self) -> DbResult<Vec<InventoryBatch>> {
        Self::fetch_batches(&self.pool).await
    }

    /// Fails with a foreign-key error while legacy orders still point at it.
    pub async fn delete_batch(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting inventory batch");

        let result = sqlx::query("DELETE FROM inventory_batches WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Inventory batch", id));
        }

        Ok(())
    }

    pub(crate) async fn fetch_batches<'e, E>(executor: E) -> DbResult<Vec<InventoryBatch>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let rows: Vec<BatchRow> = sqlx::query_as(
            r#"
            SELECT id, code, name, product_type_id, import_date, quantity, total_import_cost
            FROM inventory_batches
            ORDER BY import_date, code
            "#,
        )
        .fetch_all(executor)
        .await?;

        Ok(rows.into_iter().map(InventoryBatch::from).collect())
    }
}
