//! # Cart Store
//!
//! Owns the authoritative register state and sequences every mutation.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Register Transaction Flow                          │
//! │                                                                         │
//! │            scan / edit / storno / tender entry                          │
//! │                 ┌──────────┐                                            │
//! │                 ▼          │                                            │
//! │           ┌──────────┐     │      settle_payment                        │
//! │           │   Idle   │─────┘     ┌──────────────────────┐               │
//! │           │          │──────────►│ AwaitingConfirmation │               │
//! │           └──────────┘  submit   │ (pendingPayment set) │               │
//! │                ▲                 └──────────┬───────────┘               │
//! │                │ confirmed: Receipt appended, fresh state               │
//! │                │ rejected/timeout: marker cleared, bon KEPT             │
//! │                └────────────────────────────┘                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Recalculation Discipline
//! Every operation that touches `items` or `cash_given` leaves the derived
//! totals re-derived before returning; partial or stale totals are never an
//! observable state. Item mutations additionally re-synthesize the deposit
//! summary lines, persist a snapshot, and push deposit quantities to the
//! reconciliation side-channel when the composition changed.
//!
//! ## Concurrency
//! Single `Mutex` over the state: one mutation runs to completion before
//! the next is observed. Lookups resolve *before* the lock is taken, so a
//! slow network call never holds the register and local state is untouched
//! until the call settles.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

use casa_core::lines::{self, LineInput, LineOverrides, MoveDirection};
use casa_core::sgr;
use casa_core::totals::compute_cart_totals;
use casa_core::{
    CartItem, CartState, Customer, Money, PaymentMethod, PendingPayment, Quantity, Receipt,
};

use crate::error::{StoreError, StoreResult};
use crate::providers::{
    CustomerDirectory, DepositLedger, PaymentGateway, PaymentIntent, ProductCatalog,
    SettlementError, SettlementStatus, SnapshotStore,
};
use crate::snapshot::{self, CartSnapshot, STORAGE_KEY};

// =============================================================================
// Configuration
// =============================================================================

/// Per-terminal store configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Register id stamped onto every line entered on this terminal.
    pub casa: u32,

    /// Blob-store key for the persisted snapshot.
    pub storage_key: String,

    /// Fixed interval between confirmation polls.
    pub poll_interval: Duration,

    /// Total time budget for confirmation polling.
    pub poll_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            casa: 1,
            storage_key: STORAGE_KEY.to_string(),
            poll_interval: Duration::from_secs(1),
            poll_timeout: Duration::from_secs(30),
        }
    }
}

// =============================================================================
// Cart Store
// =============================================================================

/// The register's state holder.
///
/// Explicitly constructible with injected collaborators, so multiple
/// terminals (or tests) run isolated instances side by side.
pub struct CartStore {
    config: StoreConfig,
    state: Mutex<CartState>,
    receipts: Mutex<Vec<Receipt>>,
    catalog: Arc<dyn ProductCatalog>,
    customers: Arc<dyn CustomerDirectory>,
    snapshots: Arc<dyn SnapshotStore>,
    gateway: Arc<dyn PaymentGateway>,
    ledger: Arc<dyn DepositLedger>,
}

impl CartStore {
    /// Creates a store, replaying the persisted snapshot when one exists.
    ///
    /// Totals carried in the blob are discarded and recomputed from the
    /// line list, so restore can never surface inconsistent state.
    pub fn new(
        config: StoreConfig,
        catalog: Arc<dyn ProductCatalog>,
        customers: Arc<dyn CustomerDirectory>,
        snapshots: Arc<dyn SnapshotStore>,
        gateway: Arc<dyn PaymentGateway>,
        ledger: Arc<dyn DepositLedger>,
    ) -> CartStore {
        let (mut state, receipts) = match snapshot::load(&*snapshots, &config.storage_key) {
            Some(snap) => {
                info!(key = %config.storage_key, "restoring cart snapshot");
                snap.restore()
            }
            None => (CartState::initial(), Vec::new()),
        };
        let totals = compute_cart_totals(&state.items, state.cash_given);
        state.subtotal = totals.subtotal;
        state.total_discount = totals.total_discount;
        state.total = totals.total;
        state.change = totals.change;

        CartStore {
            config,
            state: Mutex::new(state),
            receipts: Mutex::new(receipts),
            catalog,
            customers,
            snapshots,
            gateway,
            ledger,
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Executes a function with read access to the state.
    pub fn with_state<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&CartState) -> R,
    {
        let state = self.lock_state();
        f(&state)
    }

    /// Clones the full state for the UI layer.
    pub fn state_snapshot(&self) -> CartState {
        self.lock_state().clone()
    }

    /// Clones the finalized-receipt log.
    pub fn receipts(&self) -> Vec<Receipt> {
        self.lock_receipts().clone()
    }

    // =========================================================================
    // Line Operations
    // =========================================================================

    /// Resolves a scan code and merges/appends the article.
    ///
    /// The lookup settles before any local mutation: a miss or network
    /// error leaves the state untouched. Returns the affected line id.
    pub async fn add_product_by_upc(
        &self,
        upc: &str,
        qty: Option<Quantity>,
        mut overrides: LineOverrides,
    ) -> StoreResult<String> {
        debug!(%upc, "add_product_by_upc");
        let product = self
            .catalog
            .find_by_upc(upc)
            .await?
            .ok_or_else(|| StoreError::ProductNotFound(upc.to_string()))?;

        let qty = qty.unwrap_or(Quantity::ONE).max(Quantity::MIN_POSITIVE);
        overrides.casa = overrides.casa.or(Some(self.config.casa));

        let (line_id, deposits_changed) = {
            let mut state = self.lock_state();
            let before = sgr::deposit_quantities(&state.items);
            let outcome = lines::merge_line(&state.items, &product, qty, &overrides);
            state.items = outcome.items;
            self.resync_and_recalculate(&mut state);
            state.selected_item_id = Some(outcome.line_id.clone());
            state.last_action = Some(format!("Adăugat {}", product.name));
            let after = sgr::deposit_quantities(&state.items);
            (outcome.line_id, before != after)
        };
        self.after_mutation(deposits_changed).await;
        info!(%upc, line = %line_id, "article added");
        Ok(line_id)
    }

    /// Appends a manually entered line. Manual lines never merge: each
    /// entry stays distinct on the printed bon.
    pub async fn add_custom_item(&self, mut input: LineInput) -> String {
        debug!(product = %input.product.name, "add_custom_item");
        input.casa = input.casa.or(Some(self.config.casa));
        let name = input.product.name.clone();

        let (line_id, deposits_changed) = {
            let mut state = self.lock_state();
            let before = sgr::deposit_quantities(&state.items);
            let line = lines::create_line(input);
            let line_id = line.id.clone();
            state.items.push(line);
            self.resync_and_recalculate(&mut state);
            state.selected_item_id = Some(line_id.clone());
            state.last_action = Some(format!("Adăugat {}", name));
            let after = sgr::deposit_quantities(&state.items);
            (line_id, before != after)
        };
        self.after_mutation(deposits_changed).await;
        line_id
    }

    /// Marks a line as selected for keypad edits; `None` clears.
    pub async fn select_item(&self, id: Option<String>) {
        {
            let mut state = self.lock_state();
            if id.is_some() {
                state.last_action = Some("Selectat produs".to_string());
            }
            state.selected_item_id = id;
        }
        self.after_mutation(false).await;
    }

    /// Applies a pure transform to the line matching `id`.
    ///
    /// The line invariants survive arbitrary transforms: quantity is
    /// floored positive and a negative price is clamped to zero.
    pub async fn update_item(
        &self,
        id: &str,
        f: impl FnMut(CartItem) -> CartItem,
    ) -> StoreResult<()> {
        debug!(%id, "update_item");
        let deposits_changed = {
            let mut state = self.lock_state();
            self.guard_editable(&state, id)?;
            let before = sgr::deposit_quantities(&state.items);
            state.items = lines::update_line(&state.items, id, f);
            for item in state.items.iter_mut().filter(|item| item.id == id) {
                item.qty = item.qty.max(Quantity::MIN_POSITIVE);
                item.unit_price = item.unit_price.max(Money::zero());
            }
            self.resync_and_recalculate(&mut state);
            state.last_action = Some("Actualizat linia".to_string());
            before != sgr::deposit_quantities(&state.items)
        };
        self.after_mutation(deposits_changed).await;
        Ok(())
    }

    /// Removes the line matching `id` and reselects the last remaining
    /// line, if any.
    pub async fn remove_item(&self, id: &str) -> StoreResult<()> {
        debug!(%id, "remove_item");
        let deposits_changed = {
            let mut state = self.lock_state();
            self.guard_editable(&state, id)?;
            let before = sgr::deposit_quantities(&state.items);
            state.items = lines::remove_line(&state.items, id);
            self.resync_and_recalculate(&mut state);
            state.selected_item_id = state.items.last().map(|item| item.id.clone());
            state.last_action = Some("Produs șters".to_string());
            before != sgr::deposit_quantities(&state.items)
        };
        self.after_mutation(deposits_changed).await;
        Ok(())
    }

    /// Swaps a line with its predecessor. Deposit lines and the top
    /// boundary are silent no-ops.
    pub async fn move_item_up(&self, id: &str) -> StoreResult<()> {
        self.move_item(id, MoveDirection::Up).await
    }

    /// Swaps a line with its successor. Deposit lines and the bottom
    /// boundary are silent no-ops.
    pub async fn move_item_down(&self, id: &str) -> StoreResult<()> {
        self.move_item(id, MoveDirection::Down).await
    }

    async fn move_item(&self, id: &str, direction: MoveDirection) -> StoreResult<()> {
        debug!(%id, ?direction, "move_item");
        {
            let mut state = self.lock_state();
            if !state.items.iter().any(|item| item.id == id) {
                return Err(StoreError::LineNotFound(id.to_string()));
            }
            // Order is the only thing that changes; totals and deposit
            // composition are untouched.
            state.items = lines::move_line(&state.items, id, direction);
            state.last_action = Some("Mutat produs".to_string());
        }
        self.after_mutation(false).await;
        Ok(())
    }

    /// Flips the reversal flag on a line. Deposit lines follow the
    /// merchandise automatically and cannot be stornoed directly.
    pub async fn toggle_storno(&self, id: &str) -> StoreResult<()> {
        debug!(%id, "toggle_storno");
        let deposits_changed = {
            let mut state = self.lock_state();
            self.guard_editable(&state, id)?;
            let before = sgr::deposit_quantities(&state.items);
            state.items = lines::update_line(&state.items, id, |mut line| {
                line.storno = !line.storno;
                line
            });
            self.resync_and_recalculate(&mut state);
            state.last_action = Some("Storno produs".to_string());
            before != sgr::deposit_quantities(&state.items)
        };
        self.after_mutation(deposits_changed).await;
        Ok(())
    }

    // =========================================================================
    // Tender and Customer
    // =========================================================================

    /// Records the cash handed over; clamped to zero and change re-derived.
    pub async fn set_cash_given(&self, value: Money) {
        {
            let mut state = self.lock_state();
            state.cash_given = value.max(Money::zero());
            self.recalculate_totals(&mut state);
            state.last_action = Some("Actualizat plată numerar".to_string());
        }
        self.after_mutation(false).await;
    }

    /// Replaces the customer with an already-resolved record.
    pub async fn set_customer(&self, customer: Customer) {
        {
            let mut state = self.lock_state();
            let label = customer
                .last_name
                .clone()
                .unwrap_or_else(|| customer.id.clone());
            state.last_action = Some(format!("Client {}", label));
            state.customer = customer;
        }
        self.after_mutation(false).await;
    }

    /// Resolves and sets a customer; a miss falls back to the anonymous
    /// private individual, a transport error leaves state unchanged.
    pub async fn set_customer_by_id(&self, id: &str) -> StoreResult<Customer> {
        debug!(%id, "set_customer_by_id");
        let customer = match self.customers.find_by_id(id).await? {
            Some(customer) => customer,
            None => {
                warn!(%id, "customer not found, using anonymous default");
                Customer::anonymous()
            }
        };
        self.set_customer(customer.clone()).await;
        Ok(customer)
    }

    pub async fn set_payment_method(&self, method: Option<PaymentMethod>) {
        {
            let mut state = self.lock_state();
            if let Some(method) = method {
                state.last_action = Some(format!("Metodă {}", method));
            }
            state.payment_method = method;
        }
        self.after_mutation(false).await;
    }

    pub async fn set_cod_fiscal(&self, cod_fiscal: String) {
        {
            let mut state = self.lock_state();
            state.cod_fiscal = cod_fiscal;
        }
        self.after_mutation(false).await;
    }

    /// Voucher tender amount, clamped to zero.
    pub async fn set_bonuri_valorice(&self, value: Money) {
        {
            let mut state = self.lock_state();
            state.bonuri_valorice = value.max(Money::zero());
        }
        self.after_mutation(false).await;
    }

    /// Card share of a mixed tender, clamped to zero.
    pub async fn set_card_amount(&self, value: Money) {
        {
            let mut state = self.lock_state();
            state.card_amount = value.max(Money::zero());
        }
        self.after_mutation(false).await;
    }

    /// Cash share of a mixed tender, clamped to zero.
    pub async fn set_numerar_amount(&self, value: Money) {
        {
            let mut state = self.lock_state();
            state.numerar_amount = value.max(Money::zero());
        }
        self.after_mutation(false).await;
    }

    // =========================================================================
    // Payment Completion
    // =========================================================================

    /// The terminal transition: snapshot a receipt, append it to the log
    /// and replace the live state with a fresh initial one.
    ///
    /// An empty bon returns `None` and changes nothing.
    pub async fn complete_payment(&self, method: PaymentMethod) -> Option<Receipt> {
        debug!(%method, "complete_payment");
        let (receipt, deposits_changed) = {
            let mut state = self.lock_state();
            if state.items.is_empty() {
                return None;
            }
            let before = sgr::deposit_quantities(&state.items);
            let receipt = Receipt {
                id: Uuid::new_v4().to_string(),
                items: state.items.clone(),
                total: state.total,
                payment_method: method,
                timestamp: Utc::now(),
            };
            self.lock_receipts().push(receipt.clone());

            let mut next = CartState::initial();
            next.last_action = Some(format!("Plată {} înregistrată", method));
            next.payment_method = Some(method);
            *state = next;
            let after = sgr::deposit_quantities(&state.items);
            (receipt, before != after)
        };
        self.after_mutation(deposits_changed).await;
        info!(receipt = %receipt.id, total = %receipt.total, "payment recorded");
        Some(receipt)
    }

    /// Replaces the entire state with the initial one. The receipt log
    /// survives a reset.
    pub async fn reset_cart(&self) {
        debug!("reset_cart");
        let deposits_changed = {
            let mut state = self.lock_state();
            let before = sgr::deposit_quantities(&state.items);
            *state = CartState::initial();
            !before.iter().all(|(_, qty)| qty.is_zero())
        };
        self.after_mutation(deposits_changed).await;
    }

    /// Submits the payment to the settlement side-channel and polls to a
    /// terminal state.
    ///
    /// - immediate rejection → no state change
    /// - confirmation → [`CartStore::complete_payment`] transition
    /// - rejection while pending → marker cleared, bon kept
    /// - timeout → marker cleared, bon kept: the true outcome is unknown
    ///   and silently clearing could lose a completed sale
    pub async fn settle_payment(&self, method: PaymentMethod) -> StoreResult<Receipt> {
        debug!(%method, "settle_payment");
        let intent = {
            let state = self.lock_state();
            if state.items.is_empty() {
                return Err(StoreError::EmptyCart);
            }
            PaymentIntent {
                method,
                items: state.items.clone(),
                total: state.total,
                cash_given: state.cash_given,
                card_amount: state.card_amount,
                numerar_amount: state.numerar_amount,
                bonuri_valorice: state.bonuri_valorice,
                cod_fiscal: state.cod_fiscal.clone(),
                customer_id: state.customer.id.clone(),
                casa: self.config.casa,
            }
        };

        let ticket = self.gateway.submit(&intent).await?;
        {
            let mut state = self.lock_state();
            state.pending_payment = Some(PendingPayment {
                bon_no: ticket.bon_no,
                processed_at: ticket.processed_at,
                method: Some(method),
            });
        }
        self.after_mutation(false).await;
        info!(bon_no = ticket.bon_no, "payment submitted, awaiting confirmation");

        let deadline = Instant::now() + self.config.poll_timeout;
        loop {
            match self.gateway.status(ticket.bon_no).await {
                Ok(SettlementStatus::Done) => {
                    let receipt = self.complete_payment(method).await;
                    return match receipt {
                        Some(receipt) => Ok(receipt),
                        // The bon emptied underneath the confirmation;
                        // nothing to finalize.
                        None => {
                            self.clear_pending_payment().await;
                            Err(StoreError::EmptyCart)
                        }
                    };
                }
                Ok(SettlementStatus::Rejected(reason)) => {
                    warn!(bon_no = ticket.bon_no, %reason, "payment rejected");
                    self.clear_pending_payment().await;
                    return Err(StoreError::Settlement(SettlementError::Rejected(reason)));
                }
                Ok(SettlementStatus::Pending) => {}
                // Transient poll failures are retried until the deadline.
                Err(error) => warn!(bon_no = ticket.bon_no, %error, "status poll failed"),
            }

            if Instant::now() >= deadline {
                warn!(bon_no = ticket.bon_no, "confirmation timed out, bon kept for operator");
                self.clear_pending_payment().await;
                return Err(StoreError::ConfirmationTimeout {
                    bon_no: ticket.bon_no,
                });
            }
            sleep(self.config.poll_interval).await;
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn lock_state(&self) -> MutexGuard<'_, CartState> {
        self.state.lock().expect("Cart mutex poisoned")
    }

    fn lock_receipts(&self) -> MutexGuard<'_, Vec<Receipt>> {
        self.receipts.lock().expect("Receipt mutex poisoned")
    }

    /// Rejects operations on absent ids and on synthesized deposit lines.
    fn guard_editable(&self, state: &CartState, id: &str) -> StoreResult<()> {
        let Some(line) = state.items.iter().find(|item| item.id == id) else {
            return Err(StoreError::LineNotFound(id.to_string()));
        };
        if line.is_deposit() {
            return Err(StoreError::DepositLineImmutable(id.to_string()));
        }
        Ok(())
    }

    /// Re-synthesizes deposit lines, then re-derives the totals. Runs
    /// after every item mutation.
    fn resync_and_recalculate(&self, state: &mut CartState) {
        state.items = sgr::sync_deposit_lines(&state.items, Some(self.config.casa));
        self.recalculate_totals(state);
    }

    /// Re-derives the aggregate totals; the only writer of the derived
    /// fields.
    fn recalculate_totals(&self, state: &mut CartState) {
        let totals = compute_cart_totals(&state.items, state.cash_given);
        state.subtotal = totals.subtotal;
        state.total_discount = totals.total_discount;
        state.total = totals.total;
        state.change = totals.change;
    }

    async fn clear_pending_payment(&self) {
        {
            let mut state = self.lock_state();
            state.pending_payment = None;
        }
        self.after_mutation(false).await;
    }

    /// Best-effort epilogue of every mutation: persist the snapshot and,
    /// when the deposit composition changed, push the quantities to the
    /// reconciliation ledger. Neither failure fails the mutation.
    async fn after_mutation(&self, deposits_changed: bool) {
        let (snap, quantities) = {
            let state = self.lock_state();
            let receipts = self.lock_receipts();
            (
                CartSnapshot::capture(&state, &receipts),
                sgr::deposit_quantities(&state.items),
            )
        };
        snapshot::save(&*self.snapshots, &self.config.storage_key, &snap);
        if deposits_changed {
            if let Err(error) = self.ledger.report(&quantities).await {
                warn!(%error, "deposit reconciliation push failed");
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
