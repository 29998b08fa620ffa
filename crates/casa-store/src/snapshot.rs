//! # Persisted Snapshot
//!
//! A partial projection of the register state written to the blob store
//! after every mutation, so a crashed or reloaded terminal resumes the
//! open bon. Persistence is best-effort: a failed write is logged and the
//! mutation stands.
//!
//! Derived totals are persisted for display-on-restore, but the store
//! recomputes them from the line list when replaying, so a stale or
//! hand-edited blob can never smuggle inconsistent totals in.

use serde::{Deserialize, Serialize};
use tracing::warn;

use casa_core::{CartItem, CartState, Customer, Money, PaymentMethod, Receipt};

use crate::providers::SnapshotStore;

/// Fixed key under which the snapshot blob lives.
pub const STORAGE_KEY: &str = "pos-cart-state";

/// The persisted subset of the register state.
///
/// Transient fields (pending payment marker, last action, tender splits
/// being typed) deliberately stay out: they are meaningless after a
/// restart.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSnapshot {
    pub items: Vec<CartItem>,
    pub cash_given: Money,
    pub subtotal: Money,
    pub total_discount: Money,
    pub total: Money,
    pub change: Money,
    pub customer: Customer,
    pub selected_item_id: Option<String>,
    pub receipts: Vec<Receipt>,
    pub payment_method: Option<PaymentMethod>,
}

impl CartSnapshot {
    /// Captures the persisted projection of the live state.
    pub fn capture(state: &CartState, receipts: &[Receipt]) -> CartSnapshot {
        CartSnapshot {
            items: state.items.clone(),
            cash_given: state.cash_given,
            subtotal: state.subtotal,
            total_discount: state.total_discount,
            total: state.total,
            change: state.change,
            customer: state.customer.clone(),
            selected_item_id: state.selected_item_id.clone(),
            receipts: receipts.to_vec(),
            payment_method: state.payment_method,
        }
    }

    /// Rebuilds live state from the snapshot. Totals carried in the blob
    /// are applied as-is; the caller recomputes before the state becomes
    /// observable.
    pub fn restore(self) -> (CartState, Vec<Receipt>) {
        let mut state = CartState::initial();
        state.items = self.items;
        state.cash_given = self.cash_given;
        state.subtotal = self.subtotal;
        state.total_discount = self.total_discount;
        state.total = self.total;
        state.change = self.change;
        state.customer = self.customer;
        state.selected_item_id = self.selected_item_id;
        state.payment_method = self.payment_method;
        (state, self.receipts)
    }
}

/// Loads and parses the snapshot blob; a missing or malformed blob is a
/// clean start, never an error.
pub fn load(store: &dyn SnapshotStore, key: &str) -> Option<CartSnapshot> {
    let blob = store.get(key)?;
    match serde_json::from_str(&blob) {
        Ok(snapshot) => Some(snapshot),
        Err(error) => {
            warn!(%error, "discarding malformed cart snapshot");
            None
        }
    }
}

/// Serializes and writes the snapshot. Best-effort by contract.
pub fn save(store: &dyn SnapshotStore, key: &str, snapshot: &CartSnapshot) {
    match serde_json::to_string(snapshot) {
        Ok(blob) => store.set(key, &blob),
        Err(error) => warn!(%error, "failed to serialize cart snapshot"),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::MemoryStore;

    #[test]
    fn test_snapshot_roundtrip() {
        let mut state = CartState::initial();
        state.cash_given = Money::from_bani(5000);
        state.selected_item_id = Some("line-1".to_string());
        state.payment_method = Some(PaymentMethod::Card);

        let store = MemoryStore::default();
        save(&store, STORAGE_KEY, &CartSnapshot::capture(&state, &[]));

        let (restored, receipts) = load(&store, STORAGE_KEY).unwrap().restore();
        assert_eq!(restored.cash_given, state.cash_given);
        assert_eq!(restored.selected_item_id, state.selected_item_id);
        assert_eq!(restored.payment_method, state.payment_method);
        assert!(receipts.is_empty());
    }

    #[test]
    fn test_malformed_blob_is_clean_start() {
        let store = MemoryStore::default();
        store.set(STORAGE_KEY, "not json");
        assert!(load(&store, STORAGE_KEY).is_none());
    }

    #[test]
    fn test_missing_blob_is_clean_start() {
        let store = MemoryStore::default();
        assert!(load(&store, STORAGE_KEY).is_none());
    }
}
