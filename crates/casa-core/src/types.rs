//! # Domain Types
//!
//! Core domain types used throughout Casa POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐        │
//! │  │    Product      │   │    CartItem     │   │    Receipt      │        │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │        │
//! │  │  id / upc       │   │  id (per line)  │   │  id (UUID)      │        │
//! │  │  name           │   │  product (snap) │   │  items (frozen) │        │
//! │  │  price          │   │  qty / discount │   │  total          │        │
//! │  │  sgr category   │   │  storno flag    │   │  paymentMethod  │        │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘        │
//! │                                                                         │
//! │  Discount and LineKind are tagged unions: the percent/value mutual      │
//! │  exclusion and the synthetic-deposit identity are type-level facts,     │
//! │  not conventions re-checked at call sites.                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! A `CartItem` embeds a frozen copy of its `Product`. Catalog price or
//! name changes must never retroactively alter a line already on the bon.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::{Money, Quantity};

// =============================================================================
// SGR Category
// =============================================================================

/// Packaging category under the deposit-return scheme (SGR).
///
/// The wire strings match what the article catalog serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum SgrCategory {
    /// Plastic bottle.
    #[serde(rename = "PET")]
    Pet,
    /// Glass bottle.
    #[serde(rename = "Sticla")]
    Sticla,
    /// Aluminium can.
    #[serde(rename = "Doza")]
    Doza,
}

impl SgrCategory {
    /// All categories, in the order deposit lines are appended to the bon.
    pub const ALL: [SgrCategory; 3] = [SgrCategory::Pet, SgrCategory::Sticla, SgrCategory::Doza];

    /// Human label as printed on the bon.
    pub const fn label(&self) -> &'static str {
        match self {
            SgrCategory::Pet => "PET",
            SgrCategory::Sticla => "Sticla",
            SgrCategory::Doza => "Doza",
        }
    }

    /// Reserved article id of the summary deposit line for this category.
    ///
    /// These ids are fixed in the fiscal article nomenclature and must not
    /// collide with real merchandise.
    pub const fn deposit_article_id(&self) -> &'static str {
        match self {
            SgrCategory::Pet => "1112",
            SgrCategory::Sticla => "1113",
            SgrCategory::Doza => "1114",
        }
    }
}

// =============================================================================
// Product
// =============================================================================

/// A catalog article, as resolved by the article lookup service.
///
/// The fiscal classification fields (`departament`, `clasa`, `grupa`,
/// `gest`, `tax1..tax3`) are opaque to the engine: they are carried onto
/// the bon for the fiscal device, never interpreted here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Stable catalog identity.
    pub id: String,

    /// Scan code (EAN-13, UPC-A, internal PLU).
    pub upc: String,

    /// Display name shown to the cashier and on the bon.
    pub name: String,

    /// Reference unit price.
    pub price: Money,

    /// Deposit-return category, when the packaging carries a deposit.
    pub sgr: Option<SgrCategory>,

    pub departament: Option<u32>,
    pub clasa: Option<u32>,
    pub grupa: Option<u32>,
    pub gest: Option<String>,
    pub tax1: Option<u32>,
    pub tax2: Option<u32>,
    pub tax3: Option<u32>,
}

// =============================================================================
// Line Kind
// =============================================================================

/// Discriminates operator-entered merchandise lines from engine-synthesized
/// deposit summary lines.
///
/// Deposit lines are a derived projection: they cannot be reordered,
/// edited, or persisted independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    /// A real merchandise line entered by the operator.
    #[default]
    Real,
    /// An automatically synthesized deposit (SGR) summary line.
    Deposit(SgrCategory),
}

impl LineKind {
    #[inline]
    pub const fn is_deposit(&self) -> bool {
        matches!(self, LineKind::Deposit(_))
    }
}

// =============================================================================
// Discount
// =============================================================================

/// Per-line discount. Percent and value discounts are mutually exclusive
/// by construction.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Discount {
    #[default]
    None,
    /// Percentage off the line base, 0-100.
    Percent(f64),
    /// Fixed amount off the line (clamped to the line base when applied).
    Value(Money),
}

impl Discount {
    /// Resolves the two optional keypad fields into a single discount.
    ///
    /// A value discount always wins over a percent discount. Percent is
    /// clamped to 0-100; non-positive inputs mean "no discount".
    pub fn resolve(percent: Option<f64>, value: Option<Money>) -> Discount {
        if let Some(v) = value {
            if v.is_positive() {
                return Discount::Value(v);
            }
        }
        match percent {
            Some(p) if p.is_finite() && p > 0.0 => Discount::Percent(p.min(100.0)),
            _ => Discount::None,
        }
    }

    #[inline]
    pub fn is_none(&self) -> bool {
        matches!(self, Discount::None)
    }

    /// The discount amount for a given line base, always in `0..=base`.
    pub fn amount(&self, base: Money) -> Money {
        match *self {
            Discount::None => Money::zero(),
            Discount::Percent(pct) => base.percent_of(pct).min(base),
            Discount::Value(value) => value.min(base),
        }
    }
}

// =============================================================================
// Cart Item
// =============================================================================

/// One line on the bon.
///
/// Multiple lines may reference the same product (a storno line stays
/// distinct from the sale it reverses), so every line has its own id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Unique per line, generated at creation.
    pub id: String,

    /// Real merchandise or synthesized deposit summary.
    pub kind: LineKind,

    /// Frozen product snapshot (never a live catalog reference).
    pub product: Product,

    /// Always positive; fractional for weighed goods.
    pub qty: Quantity,

    /// May override `product.price` (price-check corrections, promotions).
    pub unit_price: Money,

    pub discount: Discount,

    /// Reversal flag: the line stays on the printed bon but contributes
    /// with flipped sign.
    pub storno: bool,

    /// Register the line was entered under.
    pub casa: Option<u32>,
}

impl CartItem {
    #[inline]
    pub const fn is_deposit(&self) -> bool {
        self.kind.is_deposit()
    }
}

// =============================================================================
// Customer
// =============================================================================

/// Fiscal customer type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum CustomerKind {
    /// Private individual.
    #[serde(rename = "pf")]
    Pf,
    /// Legal entity.
    #[serde(rename = "pj")]
    Pj,
}

/// A resolved customer record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: CustomerKind,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub card_id: Option<String>,
    pub discount_percent: Option<f64>,
    /// Vehicle registration, required for fuel-type retail.
    pub nr_auto: Option<String>,
}

impl Customer {
    /// The default anonymous private individual, used as the reset
    /// baseline and as the fallback when a customer lookup misses.
    pub fn anonymous() -> Customer {
        Customer {
            id: "default".to_string(),
            kind: CustomerKind::Pf,
            first_name: Some("1".to_string()),
            last_name: Some("Persoană fizică".to_string()),
            card_id: None,
            discount_percent: None,
            nr_auto: None,
        }
    }
}

// =============================================================================
// Payment
// =============================================================================

/// Tender used to settle the bon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    /// Split cash/card tender.
    Mixed,
    /// Payment app / QR settlement.
    Modern,
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentMethod::Cash => "numerar",
            PaymentMethod::Card => "card",
            PaymentMethod::Mixed => "mixt",
            PaymentMethod::Modern => "modern",
        };
        write!(f, "{}", s)
    }
}

/// Handle for a payment submitted to the settlement side-channel and not
/// yet confirmed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PendingPayment {
    /// Bon number assigned by the settlement service.
    pub bon_no: i64,
    /// When the service accepted the intent.
    #[ts(as = "String")]
    pub processed_at: DateTime<Utc>,
    pub method: Option<PaymentMethod>,
}

// =============================================================================
// Receipt
// =============================================================================

/// A finalized bon: immutable snapshot created by payment completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub id: String,
    pub items: Vec<CartItem>,
    pub total: Money,
    pub payment_method: PaymentMethod,
    #[ts(as = "String")]
    pub timestamp: DateTime<Utc>,
}

// =============================================================================
// Cart State
// =============================================================================

/// The aggregate register state.
///
/// ## Invariant
/// `subtotal`, `total_discount`, `total` and `change` are always derived:
/// they are written only by the recompute path, never directly. Any
/// mutation of `items` or `cash_given` must be followed by recomputation
/// before the state is observable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartState {
    /// Ordered lines; the order is printed and user-reorderable.
    pub items: Vec<CartItem>,
    pub customer: Customer,
    pub cash_given: Money,
    /// Fiscal code entered for legal-entity bons.
    pub cod_fiscal: String,
    /// Voucher tender amount.
    pub bonuri_valorice: Money,
    /// Card share of a mixed tender.
    pub card_amount: Money,
    /// Cash share of a mixed tender.
    pub numerar_amount: Money,
    pub subtotal: Money,
    pub total_discount: Money,
    pub total: Money,
    pub change: Money,
    pub selected_item_id: Option<String>,
    /// Human-readable audit string for the last operation.
    pub last_action: Option<String>,
    pub payment_method: Option<PaymentMethod>,
    pub pending_payment: Option<PendingPayment>,
}

impl CartState {
    /// The reset baseline: empty bon, anonymous customer, zero tenders.
    pub fn initial() -> CartState {
        CartState {
            items: Vec::new(),
            customer: Customer::anonymous(),
            cash_given: Money::zero(),
            cod_fiscal: String::new(),
            bonuri_valorice: Money::zero(),
            card_amount: Money::zero(),
            numerar_amount: Money::zero(),
            subtotal: Money::zero(),
            total_discount: Money::zero(),
            total: Money::zero(),
            change: Money::zero(),
            selected_item_id: None,
            last_action: None,
            payment_method: None,
            pending_payment: None,
        }
    }
}

impl Default for CartState {
    fn default() -> Self {
        CartState::initial()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
