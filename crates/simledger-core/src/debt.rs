//! # Debt Classification
//!
//! Decides how delinquent an unpaid order is. The level is never stored;
//! it is recomputed from the order's current figures every time.
//!
//! ## Rule Table
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  remaining ≤ 0  ──────────────────────────────────────►  NORMAL         │
//! │                                                                         │
//! │  otherwise, first match wins:                                           │
//! │                                                                         │
//! │   #  rule                        condition                    level     │
//! │   ─  ──────────────────────────  ───────────────────────────  ────────  │
//! │   1  recovery_change_count       changes ≥ recovery (4)       RECOVERY  │
//! │   2  warning_change_count        changes == warning (3)       WARNING   │
//! │   3  past_due                    now > due date               OVERDUE   │
//! │   -  (no match)                                               NORMAL    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Change-count rules sit above the date rule: an order extended three
//! times is `WARNING` even when its new due date is still in the future.

use serde::{Deserialize, Serialize};
use tracing::trace;
use ts_rs::TS;

use crate::config::DebtPolicy;
use crate::money::Money;

/// How delinquent an order's outstanding balance is.
///
/// Variant order is the severity ranking, so `Ord` gives
/// `NORMAL < WARNING < OVERDUE < RECOVERY`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DebtLevel {
    #[default]
    Normal,
    Warning,
    Overdue,
    Recovery,
}

impl DebtLevel {
    /// All levels, least severe first.
    pub const ALL: [DebtLevel; 4] = [
        DebtLevel::Normal,
        DebtLevel::Warning,
        DebtLevel::Overdue,
        DebtLevel::Recovery,
    ];

    /// Bad debt is anything handed to recovery.
    #[inline]
    pub fn is_bad_debt(&self) -> bool {
        matches!(self, DebtLevel::Recovery)
    }
}

/// The inputs a debt rule looks at.
#[derive(Debug, Clone, Copy)]
pub struct DebtFacts {
    pub remaining: Money,
    pub due_date_change_count: u32,
    /// `remaining > 0`, a due date is set, and now is past it.
    pub is_overdue: bool,
}

/// One row of the rule table.
pub struct DebtRule {
    pub name: &'static str,
    pub level: DebtLevel,
    pub applies: fn(&DebtFacts, &DebtPolicy) -> bool,
}

fn reached_recovery(facts: &DebtFacts, policy: &DebtPolicy) -> bool {
    facts.due_date_change_count >= policy.recovery_change_count
}

fn reached_warning(facts: &DebtFacts, policy: &DebtPolicy) -> bool {
    facts.due_date_change_count == policy.warning_change_count
}

fn past_due(facts: &DebtFacts, _policy: &DebtPolicy) -> bool {
    facts.is_overdue
}

/// Evaluated top to bottom. Reordering changes behaviour.
pub const DEBT_RULES: &[DebtRule] = &[
    DebtRule {
        name: "recovery_change_count",
        level: DebtLevel::Recovery,
        applies: reached_recovery,
    },
    DebtRule {
        name: "warning_change_count",
        level: DebtLevel::Warning,
        applies: reached_warning,
    },
    DebtRule {
        name: "past_due",
        level: DebtLevel::Overdue,
        applies: past_due,
    },
];

/// The first rule that fires, or `None` for a settled or current order.
pub fn matched_rule(facts: &DebtFacts, policy: &DebtPolicy) -> Option<&'static DebtRule> {
    if !facts.remaining.is_positive() {
        return None;
    }

    DEBT_RULES.iter().find(|rule| (rule.applies)(facts, policy))
}

/// Classifies an order's debt.
pub fn classify(facts: &DebtFacts, policy: &DebtPolicy) -> DebtLevel {
    match matched_rule(facts, policy) {
        Some(rule) => {
            trace!(
                rule = rule.name,
                changes = facts.due_date_change_count,
                level = ?rule.level,
                "Debt rule matched"
            );
            rule.level
        }
        None => DebtLevel::Normal,
    }
}
