//! # Domain Types
//!
//! Raw ledger records. The engine only ever reads these; the database
//! layer owns and persists them.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Ledger Records                                  │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  ProductType    │◄──│ InventoryBatch  │   │    Customer     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  product_type_id│   │  customer_code  │       │
//! │  │  name           │   │  quantity       │   │  segment        │       │
//! │  └────────▲────────┘   │  total cost     │   └────────▲────────┘       │
//! │           │            └────────▲────────┘            │                 │
//! │           │ ProductRef::ByType  │ ProductRef::ByBatch │ BuyerRef        │
//! │           │                     │ (legacy)            │                 │
//! │  ┌────────┴─────────────────────┴─────────────────────┴────────┐       │
//! │  │                        SaleOrder                             │       │
//! │  │  quantity × unit_sale_price, due_date, due_date_change_count │       │
//! │  └────────▲──────────────────────────────────▲──────────────────┘       │
//! │           │ linked_order_id (IN counts)      │ order_id                 │
//! │  ┌────────┴────────┐                ┌────────┴────────┐                 │
//! │  │    Payment      │                │ DueDateChangeLog│                 │
//! │  │  IN / OUT       │                │ append-only     │                 │
//! │  └─────────────────┘                └─────────────────┘                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every record has:
//! - `id`: immutable, used for relations
//! - Business code (`SO-240301-001`, `KH-1234-NA`, ...): human-readable

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Product Type
// =============================================================================

/// A sellable SIM category ("Viettel 4G", "Vina data 1 year", ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductType {
    pub id: String,
    pub name: String,
}

// =============================================================================
// Inventory Batch
// =============================================================================

/// One purchase of SIMs from a supplier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InventoryBatch {
    pub id: String,

    /// Business code, e.g. `SIM-240301-042`.
    pub code: String,

    /// Display name, copied from the product type at import time.
    pub name: String,

    pub product_type_id: String,

    #[ts(as = "String")]
    pub import_date: NaiveDate,

    /// Units received. Never negative.
    pub quantity: i64,

    /// What the whole batch cost. Never negative.
    pub total_import_cost: Money,
}

// =============================================================================
// Sales Channel
// =============================================================================

/// How an order was sold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SalesChannel {
    /// Sold to a registered dealer on credit terms.
    Wholesale,
    /// Sold over the counter, usually to a walk-in buyer.
    Retail,
}

impl SalesChannel {
    /// Cash-ledger category used for the automatic receipt of a settled order.
    pub fn receipt_category(&self) -> &'static str {
        match self {
            SalesChannel::Wholesale => "Wholesale receipt",
            SalesChannel::Retail => "Retail receipt",
        }
    }
}

// =============================================================================
// Buyer / Product References
// =============================================================================

/// Who bought an order.
///
/// ## Resolution
/// ```text
/// Customer { customer_id, name_snapshot }
///     ├── customer found  → customer.name
///     └── not found       → name_snapshot (or "Unknown" if blank)
///
/// Freeform { name }       → name (or "Unknown" if blank)
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BuyerRef {
    /// A buyer registered in the customer list.
    Customer {
        customer_id: String,
        /// Name recorded on the order when it was created.
        name_snapshot: String,
    },
    /// A one-off buyer typed in by hand.
    Freeform { name: String },
}

impl BuyerRef {
    /// Returns the linked customer id, if any.
    pub fn customer_id(&self) -> Option<&str> {
        match self {
            BuyerRef::Customer { customer_id, .. } => Some(customer_id),
            BuyerRef::Freeform { .. } => None,
        }
    }

    /// Returns the name written on the order itself.
    pub fn recorded_name(&self) -> &str {
        match self {
            BuyerRef::Customer { name_snapshot, .. } => name_snapshot,
            BuyerRef::Freeform { name } => name,
        }
    }
}

/// What an order sold.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ProductRef {
    /// The normal case: a product type id.
    ByType(String),
    /// Legacy orders that pointed at one specific batch.
    ByBatch(String),
}

// =============================================================================
// Sale Order
// =============================================================================

/// A wholesale or retail sale.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleOrder {
    pub id: String,

    /// Business code, e.g. `SO-240301-007`.
    pub code: String,

    #[ts(as = "String")]
    pub date: NaiveDate,

    pub buyer: BuyerRef,

    pub channel: SalesChannel,

    pub product: ProductRef,

    pub quantity: i64,

    pub unit_sale_price: Money,

    /// Payment deadline. `None` for orders settled on the spot.
    #[ts(as = "Option<String>")]
    pub due_date: Option<NaiveDate>,

    /// How many times the deadline was pushed back. Only ever grows.
    pub due_date_change_count: u32,

    pub note: String,

    /// The order was paid in full when it was entered.
    pub is_settled_at_creation: bool,
}

impl SaleOrder {
    /// `quantity × unit_sale_price`.
    #[inline]
    pub fn total_amount(&self) -> Money {
        self.unit_sale_price.multiply_quantity(self.quantity)
    }

    /// Returns the linked customer id, if any.
    #[inline]
    pub fn customer_id(&self) -> Option<&str> {
        self.buyer.customer_id()
    }

    /// The instant the order becomes overdue: start of the due day, UTC.
    pub fn due_instant(&self) -> Option<DateTime<Utc>> {
        self.due_date
            .map(|date| date.and_time(NaiveTime::MIN).and_utc())
    }
}

// =============================================================================
// Payment
// =============================================================================

/// Direction of a cash-ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentDirection {
    /// Money received.
    In,
    /// Money paid out (imports, expenses).
    Out,
}

/// How money moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    Transfer,
    /// Cash on delivery.
    Cod,
}

/// A cash-ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Payment {
    pub id: String,

    /// Business code, e.g. `TX-240301-003`.
    pub code: String,

    pub direction: PaymentDirection,

    #[ts(as = "String")]
    pub date: NaiveDate,

    /// Never negative; the direction carries the sign.
    pub amount: Money,

    pub category: String,

    pub method: PaymentMethod,

    /// Order this payment settles (IN entries).
    pub linked_order_id: Option<String>,

    /// Batch this payment bought (OUT entries).
    pub linked_batch_id: Option<String>,

    pub note: String,
}

impl Payment {
    /// True when this entry reduces the balance of `order_id`.
    ///
    /// Only money coming IN counts; an OUT entry linked to an order
    /// (a refund, say) never offsets its balance.
    #[inline]
    pub fn settles(&self, order_id: &str) -> bool {
        self.direction == PaymentDirection::In && self.linked_order_id.as_deref() == Some(order_id)
    }
}

// =============================================================================
// Customer
// =============================================================================

/// Customer segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CustomerSegment {
    Wholesale,
    Retail,
}

/// A registered buyer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Customer {
    pub id: String,

    /// Business code, e.g. `KH-5678-NA`.
    pub customer_code: String,

    pub name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub segment: CustomerSegment,
    pub note: String,
}

// =============================================================================
// Due-Date Change Log
// =============================================================================

/// One deadline extension. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DueDateChangeLog {
    pub id: String,
    pub order_id: String,

    /// Deadline before the change (`None` if the order had none).
    #[ts(as = "Option<String>")]
    pub old_date: Option<NaiveDate>,

    #[ts(as = "String")]
    pub new_date: NaiveDate,

    pub reason: String,

    #[ts(as = "String")]
    pub changed_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
