//! # Inventory Aggregation
//!
//! One stat per product type: how much was bought, at what average cost,
//! how much was sold and what is left.
//!
//! ## Matching Orders to Product Types
//! ```text
//! ProductRef::ByType(id)   ──────────────────────────►  product type `id`
//! ProductRef::ByBatch(bid) ──► batch `bid` ──► batch.product_type_id
//! ```
//!
//! Stock can go negative when more was sold than imported. That is reported,
//! not rejected.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;
use ts_rs::TS;

use crate::money::Money;
use crate::types::{InventoryBatch, ProductRef, ProductType, SaleOrder};

/// Stock level classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockStatus {
    Ok,
    LowStock,
}

/// Derived inventory figures for one product type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InventoryStat {
    pub product_type_id: String,
    pub product_name: String,
    pub total_imported: i64,
    pub total_import_cost: Money,
    /// `total_import_cost / total_imported`, half up; zero when nothing was imported.
    pub weighted_avg_cost: Money,
    pub total_sold: i64,
    pub current_stock: i64,
    pub status: StockStatus,
}

impl InventoryStat {
    /// Stock valued at the weighted average cost.
    pub fn stock_value(&self) -> Money {
        self.weighted_avg_cost.multiply_quantity(self.current_stock)
    }
}

/// Resolves the product type an order sold, following legacy batch references.
pub(crate) fn product_type_of<'a>(
    product: &'a ProductRef,
    batches_by_id: &HashMap<&str, &'a InventoryBatch>,
) -> Option<&'a str> {
    match product {
        ProductRef::ByType(id) => Some(id.as_str()),
        ProductRef::ByBatch(batch_id) => batches_by_id
            .get(batch_id.as_str())
            .map(|batch| batch.product_type_id.as_str()),
    }
}

/// Computes one [`InventoryStat`] per product type, in catalog order.
pub fn compute_inventory_stats(
    product_types: &[ProductType],
    batches: &[InventoryBatch],
    orders: &[SaleOrder],
    low_stock_threshold: i64,
) -> Vec<InventoryStat> {
    let batches_by_id: HashMap<&str, &InventoryBatch> =
        batches.iter().map(|b| (b.id.as_str(), b)).collect();

    let mut imported: HashMap<&str, (i64, Money)> = HashMap::new();
    for batch in batches {
        let entry = imported
            .entry(batch.product_type_id.as_str())
            .or_insert((0, Money::zero()));
        entry.0 = entry.0.saturating_add(batch.quantity);
        entry.1 += batch.total_import_cost;
    }

    let mut sold: HashMap<&str, i64> = HashMap::new();
    for order in orders {
        match product_type_of(&order.product, &batches_by_id) {
            Some(type_id) => {
                let total = sold.entry(type_id).or_insert(0);
                *total = total.saturating_add(order.quantity);
            }
            None => warn!(
                order_id = %order.id,
                code = %order.code,
                "Order references an unknown batch; not counted in stock"
            ),
        }
    }

    product_types
        .iter()
        .map(|product_type| {
            let id = product_type.id.as_str();
            let (total_imported, total_import_cost) =
                imported.get(id).copied().unwrap_or((0, Money::zero()));
            let total_sold = sold.get(id).copied().unwrap_or(0);
            let current_stock = total_imported.saturating_sub(total_sold);

            if current_stock < 0 {
                warn!(
                    product_type_id = %id,
                    current_stock,
                    "Product type is oversold"
                );
            }

            let status = if current_stock <= low_stock_threshold {
                StockStatus::LowStock
            } else {
                StockStatus::Ok
            };

            InventoryStat {
                product_type_id: product_type.id.clone(),
                product_name: product_type.name.clone(),
                total_imported,
                total_import_cost,
                weighted_avg_cost: total_import_cost.div_round(total_imported),
                total_sold,
                current_stock,
                status,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BuyerRef, SalesChannel};
    use chrono::NaiveDate;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    fn batch(id: &str, type_id: &str, qty: i64, cost: i64) -> InventoryBatch {
        InventoryBatch {
            id: id.to_string(),
            code: format!("SIM-{}", id),
            name: type_id.to_string(),
            product_type_id: type_id.to_string(),
            import_date: date(),
            quantity: qty,
            total_import_cost: Money::from_dong(cost),
        }
    }

    fn order(product: ProductRef, qty: i64) -> SaleOrder {
        SaleOrder {
            id: "o".to_string(),
            code: "SO-240301-001".to_string(),
            date: date(),
            buyer: BuyerRef::Freeform {
                name: String::new(),
            },
            channel: SalesChannel::Retail,
            product,
            quantity: qty,
            unit_sale_price: Money::from_dong(1),
            due_date: None,
            due_date_change_count: 0,
            note: String::new(),
            is_settled_at_creation: true,
        }
    }

    fn types() -> Vec<ProductType> {
        vec![
            ProductType {
                id: "vina".to_string(),
                name: "Vina 4G".to_string(),
            },
            ProductType {
                id: "mobi".to_string(),
                name: "Mobi data".to_string(),
            },
        ]
    }

    #[test]
    fn test_weighted_average_across_batches() {
        let batches = vec![batch("b1", "vina", 100, 50_000_000), batch("b2", "vina", 50, 27_500_000)];
        let stats = compute_inventory_stats(&types(), &batches, &[], 50);

        assert_eq!(stats[0].total_imported, 150);
        assert_eq!(stats[0].total_import_cost.dong(), 77_500_000);
        // 516,666.67 rounds to 516,667
        assert_eq!(stats[0].weighted_avg_cost.dong(), 516_667);
        assert_eq!(stats[0].status, StockStatus::Ok);
    }

    #[test]
    fn test_no_imports_is_zero_cost_and_low_stock() {
        let stats = compute_inventory_stats(&types(), &[], &[], 50);
        assert_eq!(stats[1].weighted_avg_cost, Money::zero());
        assert_eq!(stats[1].current_stock, 0);
        assert_eq!(stats[1].status, StockStatus::LowStock);
    }

    #[test]
    fn test_legacy_batch_orders_count_as_sold() {
        let batches = vec![batch("b1", "vina", 100, 50_000_000)];
        let orders = vec![
            order(ProductRef::ByType("vina".to_string()), 30),
            order(ProductRef::ByBatch("b1".to_string()), 10),
            order(ProductRef::ByBatch("missing".to_string()), 99),
        ];
        let stats = compute_inventory_stats(&types(), &batches, &orders, 50);

        assert_eq!(stats[0].total_sold, 40);
        assert_eq!(stats[0].current_stock, 60);
        assert_eq!(stats[0].stock_value().dong(), 30_000_000);
    }

    #[test]
    fn test_threshold_is_inclusive_and_negative_stock_allowed() {
        let batches = vec![batch("b1", "vina", 80, 0)];
        let orders = vec![order(ProductRef::ByType("vina".to_string()), 30)];
        let stats = compute_inventory_stats(&types(), &batches, &orders, 50);
        assert_eq!(stats[0].current_stock, 50);
        assert_eq!(stats[0].status, StockStatus::LowStock);

        let orders = vec![order(ProductRef::ByType("vina".to_string()), 95)];
        let stats = compute_inventory_stats(&types(), &batches, &orders, 50);
        assert_eq!(stats[0].current_stock, -15);
        assert_eq!(stats[0].status, StockStatus::LowStock);
    }
}
