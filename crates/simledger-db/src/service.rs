//! # Ledger Service
//!
//! Glue between the database and the pure engine.
//!
//! ## Read Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  service.dashboard(range, now)                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::load_snapshot()          one read transaction                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  AggregationCache::get_or_compute   snapshot + config + time bucket     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  reports::dashboard(&aggregation, &snapshot.payments, ...)              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Write Path
//! Writes are planned by `simledger_core::commands`, stored by a repository
//! in one transaction, and then drop the cached aggregation.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::pool::Database;
use crate::repository::generate_id;
use simledger_core::cache::AggregationCache;
use simledger_core::commands::{plan_due_date_extension, plan_new_order};
use simledger_core::reports::{
    self, CollectionItem, DailyRevenue, DashboardSummary, DateRange, DebtBucket, MonthlyFigures,
};
use simledger_core::{
    Aggregation, CustomerStat, DueDateChangeLog, EngineConfig, InventoryBatch, InventoryStat,
    LedgerSnapshot, OrderStat, Payment, PaymentMethod, SaleOrder,
};

/// Derived views over the stored ledger, with a memoising cache.
#[derive(Debug)]
pub struct LedgerService {
    db: Database,
    config: EngineConfig,
    cache: Mutex<AggregationCache>,
}

impl LedgerService {
    /// Fails if `config` does not validate.
    pub fn new(db: Database, config: EngineConfig) -> DbResult<Self> {
        config.validate()?;

        Ok(LedgerService {
            db,
            config,
            cache: Mutex::new(AggregationCache::new()),
        })
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    async fn load(&self, now: DateTime<Utc>) -> DbResult<(LedgerSnapshot, Arc<Aggregation>)> {
        let snapshot = self.db.load_snapshot().await?;
        let aggregation = self
            .cache
            .lock()
            .await
            .get_or_compute(&snapshot, now, &self.config);

        Ok((snapshot, aggregation))
    }

    /// All three views for `now`.
    pub async fn aggregation(&self, now: DateTime<Utc>) -> DbResult<Arc<Aggregation>> {
        let (_, aggregation) = self.load(now).await?;
        Ok(aggregation)
    }

    pub async fn inventory_stats(&self, now: DateTime<Utc>) -> DbResult<Vec<InventoryStat>> {
        Ok(self.aggregation(now).await?.inventory.clone())
    }

    pub async fn order_stats(&self, now: DateTime<Utc>) -> DbResult<Vec<OrderStat>> {
        Ok(self.aggregation(now).await?.orders.clone())
    }

    pub async fn customer_stats(&self, now: DateTime<Utc>) -> DbResult<Vec<CustomerStat>> {
        Ok(self.aggregation(now).await?.customers.clone())
    }

    /// "Today" is the UTC calendar date of `now`.
    pub async fn dashboard(
        &self,
        range: &DateRange,
        now: DateTime<Utc>,
    ) -> DbResult<DashboardSummary> {
        let (snapshot, aggregation) = self.load(now).await?;
        Ok(reports::dashboard(
            &aggregation,
            &snapshot.payments,
            range,
            now.date_naive(),
        ))
    }

    /// Unpaid orders due within the configured horizon.
    pub async fn upcoming_collections(&self, now: DateTime<Utc>) -> DbResult<Vec<CollectionItem>> {
        let aggregation = self.aggregation(now).await?;
        Ok(reports::upcoming_collections(
            &aggregation.orders,
            now.date_naive(),
            self.config.collection_horizon_days,
        ))
    }

    pub async fn monthly_breakdown(
        &self,
        range: &DateRange,
        now: DateTime<Utc>,
    ) -> DbResult<Vec<MonthlyFigures>> {
        let (snapshot, aggregation) = self.load(now).await?;
        Ok(reports::monthly_breakdown(
            &aggregation.orders,
            &snapshot.payments,
            range,
        ))
    }

    pub async fn daily_revenue(
        &self,
        range: &DateRange,
        now: DateTime<Utc>,
    ) -> DbResult<Vec<DailyRevenue>> {
        let aggregation = self.aggregation(now).await?;
        Ok(reports::daily_revenue(&aggregation.orders, range))
    }

    pub async fn debt_breakdown(&self, now: DateTime<Utc>) -> DbResult<Vec<DebtBucket>> {
        let aggregation = self.aggregation(now).await?;
        Ok(reports::debt_breakdown(&aggregation.orders))
    }

    /// Due-date changes of one order, oldest first.
    pub async fn due_date_history(&self, order_id: &str) -> DbResult<Vec<DueDateChangeLog>> {
        self.db.orders().due_date_logs(order_id).await
    }

    /// `(hits, misses)` of the aggregation cache.
    pub async fn cache_stats(&self) -> (u64, u64) {
        let cache = self.cache.lock().await;
        (cache.hits(), cache.misses())
    }

    // -------------------------------------------------------------------------
    // Writes
    // -------------------------------------------------------------------------

    async fn invalidate(&self) {
        self.cache.lock().await.invalidate();
    }

    /// Stores a new batch; an empty code is generated.
    pub async fn import_batch(&self, batch: &InventoryBatch) -> DbResult<InventoryBatch> {
        let saved = self.db.catalog().insert_batch(batch).await?;
        self.invalidate().await;

        info!(code = %saved.code, quantity = saved.quantity, "Batch imported");
        Ok(saved)
    }

    /// Stores a cash-ledger entry; an empty code is generated.
    pub async fn record_payment(&self, payment: &Payment) -> DbResult<Payment> {
        let saved = self.db.payments().insert(payment).await?;
        self.invalidate().await;

        debug!(code = %saved.code, "Payment recorded");
        Ok(saved)
    }

    /// Stores a new order. An empty code is generated; an order settled at
    /// creation also gets its automatic receipt, paid with `method`.
    pub async fn create_order(&self, order: &SaleOrder, method: PaymentMethod) -> DbResult<SaleOrder> {
        let mut order = order.clone();
        if order.code.trim().is_empty() {
            order.code = self.db.orders().next_code(order.date).await?;
        }

        let payment_code = self.db.payments().next_code(order.date).await?;
        let plan = plan_new_order(&order, generate_id(), payment_code, method)?;

        self.db.orders().create(&plan).await?;
        self.invalidate().await;

        info!(
            code = %plan.order.code,
            settled = plan.settlement.is_some(),
            "Order created"
        );
        Ok(plan.order)
    }

    /// Moves an order's due date and logs the change.
    pub async fn extend_due_date(
        &self,
        order_id: &str,
        new_due_date: NaiveDate,
        reason: &str,
        now: DateTime<Utc>,
    ) -> DbResult<SaleOrder> {
        let order = self
            .db
            .orders()
            .get(order_id)
            .await?
            .ok_or_else(|| DbError::not_found("Sale order", order_id))?;

        let plan = plan_due_date_extension(&order, new_due_date, reason, now, generate_id())?;
        self.db.orders().extend_due_date(&plan).await?;
        self.invalidate().await;

        Ok(plan.order)
    }

    pub async fn delete_order(&self, order_id: &str) -> DbResult<()> {
        self.db.orders().delete(order_id).await?;
        self.invalidate().await;
        Ok(())
    }
}
