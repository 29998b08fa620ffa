//! # External Collaborators
//!
//! The store consumes, never implements, these boundaries: article and
//! customer resolution, the key-value snapshot store, the settlement
//! side-channel and the deposit-reconciliation push. Each is an injected
//! trait object so terminals and tests can run isolated instances.
//!
//! In-memory implementations live alongside the traits: they back unit
//! tests and non-interactive environments where no middleware exists.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use casa_core::{CartItem, Customer, Money, PaymentMethod, Product, Quantity, SgrCategory};

// =============================================================================
// Errors
// =============================================================================

/// Article/customer resolution failures.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("Lookup service unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed lookup response: {0}")]
    Malformed(String),
}

/// Settlement side-channel failures.
#[derive(Debug, Error)]
pub enum SettlementError {
    /// The service refused the payment intent outright.
    #[error("Payment rejected: {0}")]
    Rejected(String),

    #[error("Settlement service unavailable: {0}")]
    Unavailable(String),
}

/// Deposit-reconciliation push failures.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Deposit ledger unavailable: {0}")]
    Unavailable(String),
}

// =============================================================================
// Settlement Types
// =============================================================================

/// A payment intent: the tender plus the full bon snapshot the settlement
/// service needs to cut the fiscal receipt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntent {
    pub method: PaymentMethod,
    pub items: Vec<CartItem>,
    pub total: Money,
    pub cash_given: Money,
    pub card_amount: Money,
    pub numerar_amount: Money,
    pub bonuri_valorice: Money,
    pub cod_fiscal: String,
    pub customer_id: String,
    pub casa: u32,
}

/// Pending-confirmation handle returned by a successful submit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentTicket {
    pub bon_no: i64,
    pub processed_at: DateTime<Utc>,
}

/// Terminal and non-terminal settlement states observed while polling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettlementStatus {
    Pending,
    Done,
    Rejected(String),
}

// =============================================================================
// Collaborator Traits
// =============================================================================

/// Resolves a scan code to a catalog article.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn find_by_upc(&self, upc: &str) -> Result<Option<Product>, LookupError>;
}

/// Resolves a customer identifier to a full record.
#[async_trait]
pub trait CustomerDirectory: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Customer>, LookupError>;
}

/// Opaque key-value blob store for the persisted cart snapshot.
///
/// Synchronous by design: the backing store is local (browser storage,
/// a file, memory), and persistence is best-effort on every mutation.
pub trait SnapshotStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, blob: &str);
}

/// Submits payment intents and reports their confirmation status.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Either an immediate rejection or a handle to poll.
    async fn submit(&self, intent: &PaymentIntent) -> Result<PaymentTicket, SettlementError>;

    async fn status(&self, bon_no: i64) -> Result<SettlementStatus, SettlementError>;
}

/// Receives the current per-category deposit quantities whenever the SGR
/// composition of the bon changes. Best-effort: the store logs failures
/// and moves on.
#[async_trait]
pub trait DepositLedger: Send + Sync {
    async fn report(&self, quantities: &[(SgrCategory, Quantity)]) -> Result<(), LedgerError>;
}

// =============================================================================
// In-Memory Implementations
// =============================================================================

/// Catalog backed by a fixed article map, keyed by scan code.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    products: HashMap<String, Product>,
}

impl MemoryCatalog {
    pub fn with_products(products: Vec<Product>) -> Self {
        MemoryCatalog {
            products: products.into_iter().map(|p| (p.upc.clone(), p)).collect(),
        }
    }
}

#[async_trait]
impl ProductCatalog for MemoryCatalog {
    async fn find_by_upc(&self, upc: &str) -> Result<Option<Product>, LookupError> {
        Ok(self.products.get(upc).cloned())
    }
}

/// Directory backed by a fixed customer map.
#[derive(Debug, Default)]
pub struct MemoryCustomerDirectory {
    customers: HashMap<String, Customer>,
}

impl MemoryCustomerDirectory {
    pub fn with_customers(customers: Vec<Customer>) -> Self {
        MemoryCustomerDirectory {
            customers: customers.into_iter().map(|c| (c.id.clone(), c)).collect(),
        }
    }
}

#[async_trait]
impl CustomerDirectory for MemoryCustomerDirectory {
    async fn find_by_id(&self, id: &str) -> Result<Option<Customer>, LookupError> {
        Ok(self.customers.get(id).cloned())
    }
}

/// In-memory snapshot store; also the fallback where no real storage
/// exists (tests, headless environments).
#[derive(Debug, Default)]
pub struct MemoryStore {
    blobs: Mutex<HashMap<String, String>>,
}

impl SnapshotStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.blobs.lock().expect("Snapshot mutex poisoned").get(key).cloned()
    }

    fn set(&self, key: &str, blob: &str) {
        self.blobs
            .lock()
            .expect("Snapshot mutex poisoned")
            .insert(key.to_string(), blob.to_string());
    }
}

/// Scripted gateway: optionally rejects at submit, then reports Pending
/// for a configured number of polls before going Done.
#[derive(Debug, Default)]
pub struct MockGateway {
    reject_submit: Option<String>,
    pending_polls: u64,
    polls: AtomicU64,
    next_bon: AtomicI64,
}

impl MockGateway {
    /// Confirms on the first poll.
    pub fn confirming() -> Self {
        MockGateway::default()
    }

    /// Reports Pending for `polls` status calls before confirming.
    pub fn confirming_after(polls: u64) -> Self {
        MockGateway {
            pending_polls: polls,
            ..MockGateway::default()
        }
    }

    /// Rejects every submit with the given reason.
    pub fn rejecting(reason: &str) -> Self {
        MockGateway {
            reject_submit: Some(reason.to_string()),
            ..MockGateway::default()
        }
    }

    /// Never confirms; every poll reports Pending.
    pub fn stalling() -> Self {
        MockGateway {
            pending_polls: u64::MAX,
            ..MockGateway::default()
        }
    }

    pub fn poll_count(&self) -> u64 {
        self.polls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn submit(&self, _intent: &PaymentIntent) -> Result<PaymentTicket, SettlementError> {
        if let Some(reason) = &self.reject_submit {
            return Err(SettlementError::Rejected(reason.clone()));
        }
        Ok(PaymentTicket {
            bon_no: self.next_bon.fetch_add(1, Ordering::SeqCst) + 1,
            processed_at: Utc::now(),
        })
    }

    async fn status(&self, _bon_no: i64) -> Result<SettlementStatus, SettlementError> {
        let seen = self.polls.fetch_add(1, Ordering::SeqCst);
        if seen < self.pending_polls {
            Ok(SettlementStatus::Pending)
        } else {
            Ok(SettlementStatus::Done)
        }
    }
}

/// Discards every report; the default where no reconciliation endpoint
/// is configured.
#[derive(Debug, Default)]
pub struct NullDepositLedger;

#[async_trait]
impl DepositLedger for NullDepositLedger {
    async fn report(&self, _quantities: &[(SgrCategory, Quantity)]) -> Result<(), LedgerError> {
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
