//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Summing thousands of float amounts drifts:                             │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  OUR SOLUTION: Whole đồng in an i64                                     │
//! │    VND has no minor unit in practice, so every amount is an integer.   │
//! │    The only division in the ledger (weighted average cost) rounds      │
//! │    explicitly, half up, in one place: `Money::div_round`.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use simledger_core::money::Money;
//!
//! let unit_price = Money::from_dong(600_000);
//! let total = unit_price.multiply_quantity(30);
//! assert_eq!(total.dong(), 18_000_000);
//!
//! // 50,000,000 over 100 units
//! let avg = Money::from_dong(50_000_000).div_round(100);
//! assert_eq!(avg.dong(), 500_000);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in whole đồng.
///
/// ## Design Decisions
/// - **i64 (signed)**: profit and cash balance can be negative
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Serialized as a plain number** so JSON views stay readable
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  InventoryBatch.total_import_cost ──► weighted_avg_cost (div_round)     │
/// │                                              │                          │
/// │  SaleOrder.unit_sale_price × quantity ──► total_amount ──► profit      │
/// │                                              │                          │
/// │  Payment.amount (IN, linked) ──► paid_amount ──► remaining (clamped)   │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from whole đồng.
    #[inline]
    pub const fn from_dong(dong: i64) -> Self {
        Money(dong)
    }

    /// Returns the value in whole đồng.
    #[inline]
    pub const fn dong(&self) -> i64 {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.saturating_abs())
    }

    /// Clamps negative values to zero.
    ///
    /// ## Example
    /// ```rust
    /// use simledger_core::money::Money;
    ///
    /// // Overpaid order: 1,000,000 due, 1,200,000 received
    /// let remaining = (Money::from_dong(1_000_000) - Money::from_dong(1_200_000)).clamp_non_negative();
    /// assert!(remaining.is_zero());
    /// ```
    #[inline]
    pub const fn clamp_non_negative(&self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            Money(self.0)
        }
    }

    /// Multiplies money by a quantity, saturating at the `i64` bounds.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// Divides by a quantity, rounding half up to the nearest đồng.
    ///
    /// ## Rounding
    /// ```text
    /// ┌─────────────────────────────────────────────────────────────────────┐
    /// │  ROUND HALF UP                                                      │
    /// │                                                                     │
    /// │    floor(amount / qty + 0.5)  ==  floor((2·amount + qty) / (2·qty)) │
    /// │                                                                     │
    /// │    1000 / 3  = 333.33 → 333                                         │
    /// │    1001 / 2  = 500.5  → 501                                         │
    /// │    anything / 0       → 0      (no imports yet is not an error)     │
    /// └─────────────────────────────────────────────────────────────────────┘
    /// ```
    ///
    /// Negative quantities are divided by their magnitude with the sign
    /// moved onto the amount, so the divisor of the floor is always positive.
    ///
    /// ## Example
    /// ```rust
    /// use simledger_core::money::Money;
    ///
    /// assert_eq!(Money::from_dong(1001).div_round(2).dong(), 501);
    /// assert_eq!(Money::from_dong(1000).div_round(3).dong(), 333);
    /// assert_eq!(Money::from_dong(5_000).div_round(0).dong(), 0);
    /// ```
    pub fn div_round(&self, qty: i64) -> Money {
        if qty == 0 {
            return Money::zero();
        }

        // i128 so that 2·amount cannot overflow
        let (amount, qty) = if qty < 0 {
            (-(self.0 as i128), -(qty as i128))
        } else {
            (self.0 as i128, qty as i128)
        };

        let rounded = (2 * amount + qty).div_euclid(2 * qty);
        Money(rounded.clamp(i64::MIN as i128, i64::MAX as i128) as i64)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display groups thousands with dots, the way đồng amounts are written.
///
/// ## Note
/// This is for logs and the CLI. The UI does its own locale formatting.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.0.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }

        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{} ₫", sign, grouped)
    }
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_sub(other.0);
    }
}

/// Multiplication by i64 (for quantity calculations).
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        self.multiply_quantity(qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_dong() {
        let money = Money::from_dong(600_000);
        assert_eq!(money.dong(), 600_000);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_dong(18_000_000).to_string(), "18.000.000 ₫");
        assert_eq!(Money::from_dong(500).to_string(), "500 ₫");
        assert_eq!(Money::from_dong(-3_000_000).to_string(), "-3.000.000 ₫");
        assert_eq!(Money::zero().to_string(), "0 ₫");
        assert_eq!(Money::from_dong(100_000).to_string(), "100.000 ₫");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_dong(1_000);
        let b = Money::from_dong(500);

        assert_eq!((a + b).dong(), 1_500);
        assert_eq!((a - b).dong(), 500);
        assert_eq!((a * 3).dong(), 3_000);

        let total: Money = [a, b, b].iter().sum();
        assert_eq!(total.dong(), 2_000);
    }

    #[test]
    fn test_arithmetic_saturates() {
        let huge = Money::from_dong(i64::MAX / 2);

        assert_eq!(huge.multiply_quantity(3).dong(), i64::MAX);
        assert_eq!((huge + huge + huge).dong(), i64::MAX);
        assert_eq!((Money::from_dong(i64::MIN) - huge).dong(), i64::MIN);
        assert_eq!([huge, huge, huge].iter().sum::<Money>().dong(), i64::MAX);
        assert_eq!(Money::from_dong(i64::MIN).div_round(-1).dong(), i64::MAX);
    }

    #[test]
    fn test_div_round_half_up() {
        assert_eq!(Money::from_dong(50_000_000).div_round(100).dong(), 500_000);
        assert_eq!(Money::from_dong(1_000).div_round(3).dong(), 333);
        assert_eq!(Money::from_dong(2_000).div_round(3).dong(), 667);
        assert_eq!(Money::from_dong(1_001).div_round(2).dong(), 501);
        assert_eq!(Money::from_dong(5).div_round(10).dong(), 1);
        assert_eq!(Money::from_dong(4).div_round(10).dong(), 0);
    }

    #[test]
    fn test_div_round_by_zero_is_zero() {
        assert_eq!(Money::from_dong(12_345).div_round(0), Money::zero());
        assert_eq!(Money::zero().div_round(0), Money::zero());
    }

    #[test]
    fn test_div_round_negative_matches_floor_plus_half() {
        // floor(-2.5 + 0.5) = -2
        assert_eq!(Money::from_dong(-5).div_round(2).dong(), -2);
        // floor(-2.4 + 0.5) = -2
        assert_eq!(Money::from_dong(12).div_round(-5).dong(), -2);
    }

    #[test]
    fn test_clamp_non_negative() {
        assert_eq!(Money::from_dong(-1).clamp_non_negative(), Money::zero());
        assert_eq!(Money::from_dong(7).clamp_non_negative().dong(), 7);
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        let negative = Money::from_dong(-100);
        assert!(negative.is_negative());
        assert_eq!(negative.abs().dong(), 100);
    }
}
