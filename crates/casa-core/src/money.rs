//! # Money Module
//!
//! Provides the `Money` and `Quantity` types for handling monetary values
//! and sellable quantities safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │    2.005 * 100 = 200.49999999999997 → naive rounding gives 2.00         │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Bani                                             │
//! │    Every amount is an i64 count of bani (1 leu = 100 bani).             │
//! │    Floats exist only at the input boundary (keypad text, scales),       │
//! │    where `from_f64` rounds half-up with an epsilon nudge.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quantities
//! Weighed goods sell in fractional quantities (0.355 kg of bread), so
//! `Quantity` stores thousandths. Repeated scans accumulate exactly at
//! 3-decimal resolution with no drift.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use ts_rs::TS;

/// Rounds a float to an integer count of `factor`-ths, half-up.
///
/// The epsilon nudge counters binary representation error so that values
/// that are exactly representable in decimal round the way a cashier
/// expects: `2.005 lei` rounds to `2.01`, not `2.00`.
/// Non-finite input collapses to zero; the boundary never fails.
fn round_scaled(value: f64, factor: f64) -> i64 {
    if !value.is_finite() {
        return 0;
    }
    ((value + f64::EPSILON) * factor).round() as i64
}

/// Tolerant numeric parsing for operator input.
///
/// Keypads and scale displays in this market emit `,` as the decimal
/// separator. Empty or malformed input yields `0.0`; blocking the
/// operator on bad input is worse than correcting it.
pub fn parse_decimal(value: &str) -> f64 {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    let normalized = trimmed.replace(',', ".");
    match normalized.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

/// Defensive display formatting for raw float input.
///
/// Non-finite values are coerced to zero before formatting.
pub fn format_money(value: f64) -> String {
    Money::from_f64(value).to_string()
}

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in bani (the smallest RON unit).
///
/// ## Design Decisions
/// - **i64 (signed)**: storno lines and reversed discounts go negative
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Derives**: full serde support for snapshot persistence and IPC
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from bani.
    #[inline]
    pub const fn from_bani(bani: i64) -> Self {
        Money(bani)
    }

    /// Creates a Money value from a float, rounding half-up to bani.
    ///
    /// This is the only place float money enters the engine. Every currency
    /// amount computed from operator input passes through here before any
    /// comparison or aggregation.
    ///
    /// ## Example
    /// ```rust
    /// use casa_core::money::Money;
    ///
    /// assert_eq!(Money::from_f64(2.005).bani(), 201);
    /// assert_eq!(Money::from_f64(f64::NAN), Money::zero());
    /// ```
    #[inline]
    pub fn from_f64(value: f64) -> Self {
        Money(round_scaled(value, 100.0))
    }

    /// Tolerant parse of operator-entered text straight to bani.
    #[inline]
    pub fn parse_input(value: &str) -> Self {
        Money::from_f64(parse_decimal(value))
    }

    /// Returns the value in bani.
    #[inline]
    pub const fn bani(&self) -> i64 {
        self.0
    }

    /// Returns the value as a float (display/bridging only).
    #[inline]
    pub fn to_f64(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Returns the whole-lei portion.
    #[inline]
    pub const fn lei(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the bani portion (always 0-99).
    #[inline]
    pub const fn bani_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Multiplies a unit price by a quantity, rounding half-up to bani.
    ///
    /// Uses i128 internally: bani × thousandths cannot overflow even for
    /// pathological register entries.
    ///
    /// ## Example
    /// ```rust
    /// use casa_core::money::{Money, Quantity};
    ///
    /// let price = Money::from_bani(299);           // 2,99 lei
    /// let line = price.scale(Quantity::from_f64(3.0));
    /// assert_eq!(line.bani(), 897);                // 8,97 lei
    /// ```
    pub fn scale(&self, qty: Quantity) -> Money {
        let raw = self.0 as i128 * qty.millis() as i128;
        let rounded = if raw >= 0 {
            (raw + 500) / 1000
        } else {
            (raw - 500) / 1000
        };
        Money(rounded as i64)
    }

    /// Computes a percentage of this amount, rounded half-up to bani.
    ///
    /// `pct` is a human percentage (10.0 = 10%), as entered on the
    /// discount keypad.
    pub fn percent_of(&self, pct: f64) -> Money {
        Money::from_f64(self.to_f64() * pct / 100.0)
    }
}

/// Display shows the amount the way the receipt printer does: `12,34 lei`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{},{:02} lei", sign, self.lei().abs(), self.bani_part())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Negation flips the contribution of a reversed (storno) line.
impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

// =============================================================================
// Quantity Type
// =============================================================================

/// A sellable quantity in thousandths of a unit.
///
/// Always positive on a live line; reversal is expressed via the line's
/// storno flag, never via negative quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Quantity(i64);

impl Quantity {
    /// One unit (1.000).
    pub const ONE: Quantity = Quantity(1000);

    /// The smallest representable positive quantity (0.001).
    ///
    /// Created lines are floored here so a line never carries zero or
    /// negative quantity.
    pub const MIN_POSITIVE: Quantity = Quantity(1);

    #[inline]
    pub const fn from_millis(millis: i64) -> Self {
        Quantity(millis)
    }

    /// Creates a quantity from a float, rounding half-up to thousandths.
    #[inline]
    pub fn from_f64(value: f64) -> Self {
        Quantity(round_scaled(value, 1000.0))
    }

    /// Tolerant parse of operator-entered text.
    #[inline]
    pub fn parse_input(value: &str) -> Self {
        Quantity::from_f64(parse_decimal(value))
    }

    #[inline]
    pub const fn millis(&self) -> i64 {
        self.0
    }

    #[inline]
    pub fn to_f64(&self) -> f64 {
        self.0 as f64 / 1000.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Quantity(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Quantity::ONE
    }
}

impl Add for Quantity {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Quantity(self.0 + other.0)
    }
}

impl AddAssign for Quantity {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

/// Display trims trailing zeros: `2`, `1,5`, `0,355`.
impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / 1000;
        let frac = (self.0 % 1000).abs();
        if frac == 0 {
            write!(f, "{}", whole)
        } else {
            let s = format!("{:03}", frac);
            write!(f, "{},{}", whole, s.trim_end_matches('0'))
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bani() {
        let money = Money::from_bani(1099);
        assert_eq!(money.bani(), 1099);
        assert_eq!(money.lei(), 10);
        assert_eq!(money.bani_part(), 99);
    }

    #[test]
    fn test_from_f64_rounds_half_up() {
        // The classic binary-representation trap: 2.005 * 100 is 200.4999…
        assert_eq!(Money::from_f64(2.005).bani(), 201);
        assert_eq!(Money::from_f64(10.0).bani(), 1000);
        assert_eq!(Money::from_f64(0.125).bani(), 13);
    }

    #[test]
    fn test_from_f64_non_finite_is_zero() {
        assert_eq!(Money::from_f64(f64::NAN).bani(), 0);
        assert_eq!(Money::from_f64(f64::INFINITY).bani(), 0);
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal("12,50"), 12.5);
        assert_eq!(parse_decimal("12.50"), 12.5);
        assert_eq!(parse_decimal("  3 "), 3.0);
        assert_eq!(parse_decimal(""), 0.0);
        assert_eq!(parse_decimal("abc"), 0.0);
    }

    #[test]
    fn test_parse_input() {
        assert_eq!(Money::parse_input("19,99").bani(), 1999);
        assert_eq!(Money::parse_input("garbage").bani(), 0);
        assert_eq!(Quantity::parse_input("0,355").millis(), 355);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_bani(1099)), "10,99 lei");
        assert_eq!(format!("{}", Money::from_bani(500)), "5,00 lei");
        assert_eq!(format!("{}", Money::from_bani(-550)), "-5,50 lei");
        assert_eq!(format!("{}", Money::from_bani(0)), "0,00 lei");
    }

    #[test]
    fn test_format_money_defensive() {
        assert_eq!(format_money(f64::NAN), "0,00 lei");
        assert_eq!(format_money(12.345), "12,35 lei");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_bani(1000);
        let b = Money::from_bani(500);

        assert_eq!((a + b).bani(), 1500);
        assert_eq!((a - b).bani(), 500);
        assert_eq!((-a).bani(), -1000);
    }

    #[test]
    fn test_scale_rounds_half_up() {
        // 0.333 × 2,99 lei = 0.99567 lei → 1,00 lei
        let price = Money::from_bani(299);
        let qty = Quantity::from_millis(333);
        assert_eq!(price.scale(qty).bani(), 100);

        // 3 × 10,00 lei = 30,00 lei exactly
        assert_eq!(Money::from_bani(1000).scale(Quantity::from_millis(3000)).bani(), 3000);
    }

    #[test]
    fn test_percent_of() {
        let base = Money::from_bani(3000);
        assert_eq!(base.percent_of(10.0).bani(), 300);
        // 20,00 lei at 50% = 10,00 lei
        assert_eq!(Money::from_bani(2000).percent_of(50.0).bani(), 1000);
    }

    #[test]
    fn test_quantity_accumulates_exactly() {
        // Three scans of 0.1 units: floats drift, thousandths do not.
        let mut qty = Quantity::zero();
        for _ in 0..3 {
            qty += Quantity::from_f64(0.1);
        }
        assert_eq!(qty.millis(), 300);
    }

    #[test]
    fn test_quantity_display() {
        assert_eq!(format!("{}", Quantity::from_millis(2000)), "2");
        assert_eq!(format!("{}", Quantity::from_millis(1500)), "1,5");
        assert_eq!(format!("{}", Quantity::from_millis(355)), "0,355");
    }
}
