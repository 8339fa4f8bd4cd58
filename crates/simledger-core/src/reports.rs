//! # Reports
//!
//! Back-office figures built on top of an [`Aggregation`]. Everything here is
//! a fold over order stats and payments; nothing touches raw batches again.
//!
//! ## Date Filtering
//! `DateRange` bounds are inclusive calendar days. Either bound may be open.
//! Order figures filter on the order date, cash figures on the payment date.

use std::collections::BTreeMap;

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::debt::DebtLevel;
use crate::engine::Aggregation;
use crate::inventory::StockStatus;
use crate::money::Money;
use crate::orders::OrderStat;
use crate::types::{Payment, PaymentDirection};

// =============================================================================
// Date Range
// =============================================================================

/// Inclusive range of calendar days. `None` leaves that side open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DateRange {
    #[ts(as = "Option<String>")]
    pub start: Option<NaiveDate>,
    #[ts(as = "Option<String>")]
    pub end: Option<NaiveDate>,
}

impl DateRange {
    /// No bounds.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// First of `today`'s month through `today`.
    pub fn month_to_date(today: NaiveDate) -> Self {
        let start = today.with_day(1).unwrap_or(today);
        Self::between(start, today)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |s| date >= s) && self.end.map_or(true, |e| date <= e)
    }

    /// Number of days in a closed range, both ends counted. `None` when a
    /// bound is open; zero when `start > end`.
    pub fn span_days(&self) -> Option<i64> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Some((end - start).num_days().saturating_add(1).max(0)),
            _ => None,
        }
    }
}

// =============================================================================
// Cash Flow
// =============================================================================

/// Money in, money out, and the difference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CashFlowSummary {
    pub cash_in: Money,
    pub cash_out: Money,
    pub balance: Money,
}

pub fn cash_flow(payments: &[Payment], range: &DateRange) -> CashFlowSummary {
    let mut summary = CashFlowSummary::default();
    for payment in payments.iter().filter(|p| range.contains(p.date)) {
        match payment.direction {
            PaymentDirection::In => summary.cash_in += payment.amount,
            PaymentDirection::Out => summary.cash_out += payment.amount,
        }
    }
    summary.balance = summary.cash_in - summary.cash_out;
    summary
}

// =============================================================================
// Dashboard
// =============================================================================

/// Today's sales at a glance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TodaySummary {
    pub revenue: Money,
    pub profit: Money,
    pub order_count: usize,
}

/// Headline figures for the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DashboardSummary {
    pub range: DateRange,
    /// Units on hand across all product types (not filtered by range).
    pub total_stock: i64,
    /// Outstanding balance of orders dated in range.
    pub receivables: Money,
    pub cash: CashFlowSummary,
    /// Profit of orders dated in range.
    pub estimated_profit: Money,
    pub low_stock_count: usize,
    pub today: TodaySummary,
}

pub fn dashboard(
    aggregation: &Aggregation,
    payments: &[Payment],
    range: &DateRange,
    today: NaiveDate,
) -> DashboardSummary {
    let in_range = || aggregation.orders.iter().filter(|o| range.contains(o.date));

    let mut today_summary = TodaySummary::default();
    for order in aggregation.orders.iter().filter(|o| o.date == today) {
        today_summary.revenue += order.total_amount;
        today_summary.profit += order.profit;
        today_summary.order_count += 1;
    }

    DashboardSummary {
        range: *range,
        total_stock: aggregation
            .inventory
            .iter()
            .fold(0i64, |total, s| total.saturating_add(s.current_stock)),
        receivables: in_range().map(|o| o.remaining).sum(),
        cash: cash_flow(payments, range),
        estimated_profit: in_range().map(|o| o.profit).sum(),
        low_stock_count: aggregation
            .inventory
            .iter()
            .filter(|s| s.status == StockStatus::LowStock)
            .count(),
        today: today_summary,
    }
}

// =============================================================================
// Upcoming Collections
// =============================================================================

/// An unpaid order due soon (or already overdue).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CollectionItem {
    pub order_id: String,
    pub code: String,
    pub customer_id: Option<String>,
    pub customer_name: String,
    pub remaining: Money,
    #[ts(as = "String")]
    pub due_date: NaiveDate,
    pub is_overdue: bool,
    pub debt_level: DebtLevel,
}

/// Unpaid orders due on or before `today + horizon_days`, earliest first.
pub fn upcoming_collections(
    orders: &[OrderStat],
    today: NaiveDate,
    horizon_days: u32,
) -> Vec<CollectionItem> {
    let horizon = today
        .checked_add_days(Days::new(u64::from(horizon_days)))
        .unwrap_or(NaiveDate::MAX);

    let mut items: Vec<CollectionItem> = orders
        .iter()
        .filter(|o| o.remaining.is_positive())
        .filter_map(|o| {
            let due_date = o.due_date.filter(|due| *due <= horizon)?;
            Some(CollectionItem {
                order_id: o.order_id.clone(),
                code: o.code.clone(),
                customer_id: o.customer_id.clone(),
                customer_name: o.customer_name.clone(),
                remaining: o.remaining,
                due_date,
                is_overdue: o.is_overdue,
                debt_level: o.debt_level,
            })
        })
        .collect();

    items.sort_by(|a, b| a.due_date.cmp(&b.due_date).then_with(|| a.code.cmp(&b.code)));
    items
}

// =============================================================================
// Monthly Breakdown
// =============================================================================

/// Cash and profit for one calendar month.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MonthlyFigures {
    /// `YYYY-MM`
    pub month: String,
    pub cash_in: Money,
    pub cash_out: Money,
    pub profit: Money,
}

/// One entry per month that has an order or a payment in range, ascending.
pub fn monthly_breakdown(
    orders: &[OrderStat],
    payments: &[Payment],
    range: &DateRange,
) -> Vec<MonthlyFigures> {
    let month_of = |date: NaiveDate| date.format("%Y-%m").to_string();
    let mut months: BTreeMap<String, MonthlyFigures> = BTreeMap::new();

    for payment in payments.iter().filter(|p| range.contains(p.date)) {
        let month = month_of(payment.date);
        let figures = months.entry(month.clone()).or_insert_with(|| MonthlyFigures {
            month,
            ..MonthlyFigures::default()
        });
        match payment.direction {
            PaymentDirection::In => figures.cash_in += payment.amount,
            PaymentDirection::Out => figures.cash_out += payment.amount,
        }
    }

    for order in orders.iter().filter(|o| range.contains(o.date)) {
        let month = month_of(order.date);
        months
            .entry(month.clone())
            .or_insert_with(|| MonthlyFigures {
                month,
                ..MonthlyFigures::default()
            })
            .profit += order.profit;
    }

    months.into_values().collect()
}

// =============================================================================
// Daily Revenue
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DailyRevenue {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub revenue: Money,
}

/// Longest closed range `daily_revenue` pads with zero days.
pub const MAX_DAILY_SPAN_DAYS: i64 = 366;

/// Revenue per day.
///
/// With both bounds set and at most [`MAX_DAILY_SPAN_DAYS`] apart, every day
/// of the range is listed, zero or not. Otherwise only days that have orders
/// are listed.
pub fn daily_revenue(orders: &[OrderStat], range: &DateRange) -> Vec<DailyRevenue> {
    let mut by_day: BTreeMap<NaiveDate, Money> = BTreeMap::new();
    for order in orders.iter().filter(|o| range.contains(o.date)) {
        *by_day.entry(order.date).or_default() += order.total_amount;
    }

    let padded = range
        .span_days()
        .map_or(false, |span| span <= MAX_DAILY_SPAN_DAYS);
    if let (Some(start), Some(end), true) = (range.start, range.end, padded) {
        let mut days = Vec::new();
        let mut day = Some(start);
        while let Some(date) = day.filter(|d| *d <= end) {
            days.push(DailyRevenue {
                date,
                revenue: by_day.get(&date).copied().unwrap_or_default(),
            });
            day = date.succ_opt();
        }
        return days;
    }

    by_day
        .into_iter()
        .map(|(date, revenue)| DailyRevenue { date, revenue })
        .collect()
}

// =============================================================================
// Debt Breakdown
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DebtBucket {
    pub level: DebtLevel,
    pub order_count: usize,
    pub outstanding: Money,
}

/// Unsettled orders grouped by debt level. Always four buckets, least severe first.
pub fn debt_breakdown(orders: &[OrderStat]) -> Vec<DebtBucket> {
    DebtLevel::ALL
        .iter()
        .map(|level| {
            let owing = orders
                .iter()
                .filter(|o| o.remaining.is_positive() && o.debt_level == *level);
            DebtBucket {
                level: *level,
                order_count: owing.clone().count(),
                outstanding: owing.map(|o| o.remaining).sum(),
            }
        })
        .collect()
}
