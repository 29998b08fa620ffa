//! # Line Lifecycle
//!
//! Pure operations over the ordered line list: create, merge, update,
//! remove, reorder. Every operation takes a slice and returns a fresh
//! vector; the store layer owns identity and sequencing.
//!
//! ## Merge Rule
//! Repeated scans of the same barcode consolidate into one printed line:
//! scanning a product already on the bon accumulates quantity onto the
//! existing non-storno line. Explicit reversals must stay distinct from
//! the forward sale they reverse, so a storno request always appends.

use uuid::Uuid;

use crate::money::{Money, Quantity};
use crate::types::{CartItem, Discount, LineKind, Product};

/// Input for a new merchandise line.
#[derive(Debug, Clone)]
pub struct LineInput {
    pub product: Product,
    /// Defaults to one unit; floored to the smallest positive quantity.
    pub qty: Option<Quantity>,
    /// Overrides the catalog price when set.
    pub unit_price: Option<Money>,
    pub discount: Discount,
    pub storno: bool,
    pub casa: Option<u32>,
}

impl LineInput {
    pub fn for_product(product: Product) -> LineInput {
        LineInput {
            product,
            qty: None,
            unit_price: None,
            discount: Discount::None,
            storno: false,
            casa: None,
        }
    }
}

/// Field replacements applied when a scan merges onto an existing line.
///
/// `None` means "keep the line's current value". A value discount
/// override clears any percent discount; an explicit percent override of
/// zero clears a percent discount.
#[derive(Debug, Clone, Default)]
pub struct LineOverrides {
    pub unit_price: Option<Money>,
    pub percent_discount: Option<f64>,
    pub value_discount: Option<Money>,
    pub storno: bool,
    pub casa: Option<u32>,
}

/// Direction for an adjacent-swap reorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Up,
    Down,
}

/// Creates a merchandise line with a fresh id.
///
/// Quantity is floored to the smallest positive value and a negative
/// price override is clamped to zero: operator input is corrected, never
/// rejected.
pub fn create_line(input: LineInput) -> CartItem {
    let qty = input.qty.unwrap_or(Quantity::ONE).max(Quantity::MIN_POSITIVE);
    let unit_price = input
        .unit_price
        .unwrap_or(input.product.price)
        .max(Money::zero());
    CartItem {
        id: Uuid::new_v4().to_string(),
        kind: LineKind::Real,
        product: input.product,
        qty,
        unit_price,
        discount: input.discount,
        storno: input.storno,
        casa: input.casa,
    }
}

/// Outcome of [`merge_line`]: the new list plus the affected line id.
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub items: Vec<CartItem>,
    pub line_id: String,
    /// True when the scan accumulated onto an existing line.
    pub merged: bool,
}

/// Adds a scanned product: accumulate onto the first non-storno line of
/// the same product, or append a new line.
///
/// Overrides replace the merged line's price and discount fields, they
/// never accumulate. A storno request bypasses merging entirely.
pub fn merge_line(
    items: &[CartItem],
    product: &Product,
    qty: Quantity,
    overrides: &LineOverrides,
) -> MergeOutcome {
    let existing = items.iter().position(|item| {
        item.kind == LineKind::Real && !item.storno && item.product.id == product.id
    });

    let index = match existing {
        Some(index) if !overrides.storno => index,
        _ => {
            let line = create_line(LineInput {
                product: product.clone(),
                qty: Some(qty),
                unit_price: overrides.unit_price,
                discount: Discount::resolve(overrides.percent_discount, overrides.value_discount),
                storno: overrides.storno,
                casa: overrides.casa,
            });
            let line_id = line.id.clone();
            let mut next = items.to_vec();
            next.push(line);
            return MergeOutcome {
                items: next,
                line_id,
                merged: false,
            };
        }
    };

    let mut next = items.to_vec();
    let line = &mut next[index];
    line.qty += qty;
    if let Some(price) = overrides.unit_price {
        line.unit_price = price.max(Money::zero());
    }
    line.discount = merged_discount(
        line.discount,
        overrides.percent_discount,
        overrides.value_discount,
    );
    let line_id = line.id.clone();
    MergeOutcome {
        items: next,
        line_id,
        merged: true,
    }
}

/// Discount replacement semantics for a merge.
///
/// An existing value discount keeps precedence over a percent override;
/// a positive value override wins outright.
fn merged_discount(existing: Discount, percent: Option<f64>, value: Option<Money>) -> Discount {
    if value.is_some_and(|v| v.is_positive()) {
        return Discount::resolve(None, value);
    }
    if matches!(existing, Discount::Value(_)) {
        return existing;
    }
    match percent {
        Some(p) => Discount::resolve(Some(p), None),
        None => existing,
    }
}

/// Replaces the line matching `id` via a pure transform; no-op when the
/// id is absent.
pub fn update_line(
    items: &[CartItem],
    id: &str,
    mut f: impl FnMut(CartItem) -> CartItem,
) -> Vec<CartItem> {
    items
        .iter()
        .map(|item| {
            if item.id == id {
                f(item.clone())
            } else {
                item.clone()
            }
        })
        .collect()
}

/// Removes the line matching `id`; no-op when the id is absent.
pub fn remove_line(items: &[CartItem], id: &str) -> Vec<CartItem> {
    items.iter().filter(|item| item.id != id).cloned().collect()
}

/// Swaps a line with its immediate neighbour. No-op at either boundary
/// and whenever a synthesized deposit line would be displaced.
pub fn move_line(items: &[CartItem], id: &str, direction: MoveDirection) -> Vec<CartItem> {
    let Some(index) = items.iter().position(|item| item.id == id) else {
        return items.to_vec();
    };
    let target = match direction {
        MoveDirection::Up => index.checked_sub(1),
        MoveDirection::Down => Some(index + 1),
    };
    let Some(target) = target.filter(|&t| t < items.len()) else {
        return items.to_vec();
    };
    if items[index].is_deposit() || items[target].is_deposit() {
        return items.to_vec();
    }
    let mut next = items.to_vec();
    next.swap(index, target);
    next
}

/// Id of the last line referencing `product_id`, scanning from the bottom
/// of the bon (the line the cashier just touched).
pub fn last_line_id_for_product(items: &[CartItem], product_id: &str) -> Option<String> {
    items
        .iter()
        .rev()
        .find(|item| item.product.id == product_id)
        .map(|item| item.id.clone())
}

// =============================================================================
// Unit Tests
// =============================================================================
