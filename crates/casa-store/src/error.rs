//! # Store Error Types
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  LookupError / SettlementError (collaborator boundary)                  │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  StoreError (this file)  ──►  register UI                               │
//! │                                                                         │
//! │  Expected failures are Err values, never panics: a wedged register      │
//! │  is worse than any single failed operation.                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::providers::{LedgerError, LookupError, SettlementError};

/// Operation-level errors surfaced to the register UI.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Scan code did not resolve to a catalog article.
    #[error("Product not found for code {0}")]
    ProductNotFound(String),

    /// Customer identifier did not resolve.
    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    /// Operation referenced a line id not present on the bon.
    ///
    /// Reported, never fatal: the operation is a no-op and the session
    /// continues.
    #[error("Line not found: {0}")]
    LineNotFound(String),

    /// Synthesized deposit lines are a derived projection and cannot be
    /// edited or removed directly.
    #[error("Line {0} is a synthesized deposit line and cannot be edited")]
    DepositLineImmutable(String),

    /// Payment completion requires a non-empty bon.
    #[error("Cannot complete payment on an empty bon")]
    EmptyCart,

    /// Article or customer lookup failed (network, malformed response).
    #[error("Lookup failed: {0}")]
    Lookup(#[from] LookupError),

    /// Settlement submit or poll failed.
    #[error("Settlement failed: {0}")]
    Settlement(#[from] SettlementError),

    /// Confirmation polling exhausted its time budget.
    ///
    /// The true outcome is unknown: the bon is deliberately left intact
    /// for the operator to resolve.
    #[error("Payment confirmation timed out for bon {bon_no}")]
    ConfirmationTimeout { bon_no: i64 },

    /// Deposit reconciliation push failed. Best-effort: logged by the
    /// store, never blocks a mutation.
    #[error("Deposit ledger push failed: {0}")]
    Ledger(#[from] LedgerError),
}

/// Convenience alias for store operation results.
pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
