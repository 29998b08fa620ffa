//! # Line and Cart Arithmetic
//!
//! Pure totals computation. This layer is total over its domain: every
//! input produces a result, clamping instead of rejecting, so a register
//! can never be wedged by arithmetic.
//!
//! ## Sign Convention
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  A storno line contributes its full discounted value with flipped       │
//! │  sign. Per-line `discount` is reported magnitude-only; the aggregate    │
//! │  mirrors the storno sign so a reversed discount also reverses:          │
//! │                                                                         │
//! │    line total_i  = (base_i - discount_i) × (storno ? -1 : +1)           │
//! │    subtotal      = Σ total_i                                            │
//! │    totalDiscount = Σ discount_i × (storno ? -1 : +1)                    │
//! │    total         = subtotal        (fiscal tax is opaque metadata)      │
//! │    change        = max(cashGiven - total, 0)                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::CartItem;

/// Per-line amounts. `discount` is magnitude-only; `total` carries the
/// storno sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineTotals {
    pub base: Money,
    pub discount: Money,
    pub total: Money,
}

/// Computes a line's base, discount and signed total.
///
/// Pure and idempotent: calling it twice on an unchanged line yields
/// identical results. A value discount can never exceed the line's own
/// base (clamped, not rejected); percent applies only when no value
/// discount is set. The `Discount` union makes both structural.
pub fn calculate_line_totals(item: &CartItem) -> LineTotals {
    let base = item.unit_price.scale(item.qty);
    let discount = item.discount.amount(base);
    let net = base - discount;
    let total = if item.storno { -net } else { net };
    LineTotals { base, discount, total }
}

/// Aggregate cart amounts derived from the line list and the tendered
/// cash. Never written directly by anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub subtotal: Money,
    pub total_discount: Money,
    pub total: Money,
    pub change: Money,
}

/// Recomputes the aggregate totals.
///
/// Insufficient cash yields zero change, not a deficit: the engine does
/// not block checkout on insufficient cash, that policy belongs above
/// this layer.
pub fn compute_cart_totals(items: &[CartItem], cash_given: Money) -> CartTotals {
    let mut subtotal = Money::zero();
    let mut total_discount = Money::zero();
    for item in items {
        let line = calculate_line_totals(item);
        subtotal += line.total;
        total_discount += if item.storno { -line.discount } else { line.discount };
    }
    let total = subtotal;
    let change = (cash_given - total).max(Money::zero());
    CartTotals {
        subtotal,
        total_discount,
        total,
        change,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
