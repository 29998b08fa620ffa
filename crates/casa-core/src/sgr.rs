//! # Deposit-Line Synthesis (SGR)
//!
//! The deposit-return scheme adds a fixed guarantee per container (PET,
//! glass, can). Operators never enter these amounts: after every mutation
//! of the line list the engine re-derives one summary deposit line per
//! category from the active merchandise.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │   Apa minerală 0.5L (sgr: PET)  × 3   ┐                                 │
//! │   Bere sticlă     (sgr: Sticla) × 2   │  real, non-storno lines         │
//! │   Cola doză       (sgr: Doza)   × 6   ┘                                 │
//! │                    │                                                    │
//! │                    ▼  sync_deposit_lines                                │
//! │   Garanție SGR PET    (1112)  × 3  @ 0,50 lei                           │
//! │   Garanție SGR Sticla (1113)  × 2  @ 0,50 lei                           │
//! │   Garanție SGR Doza   (1114)  × 6  @ 0,50 lei                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Storno lines are excluded from the sums, so reversing a bottle of water
//! immediately shrinks the deposit line with it.

use uuid::Uuid;

use crate::money::{Money, Quantity};
use crate::types::{CartItem, Discount, LineKind, Product, SgrCategory};

/// Guarantee per container, fixed by the national scheme.
pub const DEPOSIT_UNIT_PRICE: Money = Money::from_bani(50);

/// The reserved catalog article backing a category's summary line.
pub fn deposit_product(category: SgrCategory) -> Product {
    Product {
        id: category.deposit_article_id().to_string(),
        upc: category.deposit_article_id().to_string(),
        name: format!("Garanție SGR {}", category.label()),
        price: DEPOSIT_UNIT_PRICE,
        sgr: None,
        departament: None,
        clasa: None,
        grupa: None,
        gest: None,
        tax1: None,
        tax2: None,
        tax3: None,
    }
}

/// Current per-category deposit quantities over the active (real,
/// non-storno) merchandise. Zero categories are included so the
/// reconciliation side-channel can observe removals.
pub fn deposit_quantities(items: &[CartItem]) -> Vec<(SgrCategory, Quantity)> {
    SgrCategory::ALL
        .iter()
        .map(|&category| {
            let mut sum = Quantity::zero();
            for item in items {
                if item.kind == LineKind::Real
                    && !item.storno
                    && item.product.sgr == Some(category)
                {
                    sum += item.qty;
                }
            }
            (category, sum)
        })
        .collect()
}

/// Reconciles the synthesized deposit lines with the merchandise lines.
///
/// Strips every existing deposit line, then appends exactly one fresh
/// line per category with a non-zero summed quantity. Must run after
/// every mutation of the line list, including storno toggles.
pub fn sync_deposit_lines(items: &[CartItem], casa: Option<u32>) -> Vec<CartItem> {
    let mut next: Vec<CartItem> = items
        .iter()
        .filter(|item| !item.is_deposit())
        .cloned()
        .collect();

    for (category, qty) in deposit_quantities(&next) {
        if !qty.is_positive() {
            continue;
        }
        next.push(CartItem {
            id: Uuid::new_v4().to_string(),
            kind: LineKind::Deposit(category),
            product: deposit_product(category),
            qty,
            unit_price: DEPOSIT_UNIT_PRICE,
            discount: Discount::None,
            storno: false,
            casa,
        });
    }
    next
}

// =============================================================================
// Unit Tests
// =============================================================================
