//! # casa-store: Cart Store / State Machine for Casa POS
//!
//! The orchestration layer above [`casa_core`]: owns the authoritative
//! register state, sequences mutations, talks to the external
//! collaborators (article catalog, customer directory, settlement
//! side-channel, deposit ledger) and persists a replay-safe snapshot
//! after every mutation.
//!
//! ## Control Flow
//! ```text
//! UI event ──► store operation ──► pure casa-core recompute ──► new state
//!                                                      │
//!                           persisted snapshot ◄───────┤
//!                           deposit reconciliation ◄───┘ (best-effort)
//! ```
//!
//! All business math lives in `casa-core`; this crate only owns identity,
//! sequencing and I/O.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod providers;
pub mod snapshot;
pub mod store;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{StoreError, StoreResult};
pub use providers::{
    CustomerDirectory, DepositLedger, LedgerError, LookupError, MemoryCatalog,
    MemoryCustomerDirectory, MemoryStore, MockGateway, NullDepositLedger, PaymentGateway,
    PaymentIntent, PaymentTicket, ProductCatalog, SettlementError, SettlementStatus,
    SnapshotStore,
};
pub use snapshot::{CartSnapshot, STORAGE_KEY};
pub use store::{CartStore, StoreConfig};
