//! # casa-core: Pure Business Logic for Casa POS
//!
//! This crate is the **heart** of Casa POS. It contains the cart/receipt
//! computation rules as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Casa POS Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                    Register UI (web frontend)                   │    │
//! │  │    Scan input ──► Bon table ──► Tender panel ──► Bon print      │    │
//! │  └─────────────────────────────┬───────────────────────────────────┘    │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐    │
//! │  │                    casa-store                                   │    │
//! │  │    sequencing, lookups, settlement, snapshot persistence        │    │
//! │  └─────────────────────────────┬───────────────────────────────────┘    │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐    │
//! │  │               ★ casa-core (THIS CRATE) ★                        │    │
//! │  │                                                                 │    │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐    │    │
//! │  │   │   money   │  │   lines   │  │  totals   │  │    sgr    │    │    │
//! │  │   │ Money/Qty │  │ lifecycle │  │ line/cart │  │  deposit  │    │    │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘    │    │
//! │  │                                                                 │    │
//! │  │   NO I/O • NO NETWORK • NO STORAGE • PURE FUNCTIONS             │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, CartItem, Customer, Receipt, ...)
//! - [`money`] - Money and Quantity types with integer arithmetic
//! - [`totals`] - Line and cart totals computation
//! - [`lines`] - Line lifecycle operations (create/merge/update/move)
//! - [`sgr`] - Deposit-return (SGR) summary-line synthesis
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same input, same output, no side effects
//! 2. **No I/O**: network, storage and hardware access are FORBIDDEN here
//! 3. **Integer Money**: amounts are bani (i64), quantities thousandths
//! 4. **Total Arithmetic**: operator input is clamped/corrected, never
//!    rejected - this layer cannot fail
//!
//! ## Example Usage
//!
//! ```rust
//! use casa_core::{Money, Quantity};
//!
//! // Create money from bani (never from raw floats!)
//! let price = Money::from_bani(1099); // 10,99 lei
//!
//! // 2 units of a 10,99 lei article
//! let base = price.scale(Quantity::from_f64(2.0));
//! assert_eq!(base.bani(), 2198);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod lines;
pub mod money;
pub mod sgr;
pub mod totals;
pub mod types;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use casa_core::Money` instead of
// `use casa_core::money::Money`

pub use lines::{LineInput, LineOverrides, MergeOutcome, MoveDirection};
pub use money::{format_money, parse_decimal, Money, Quantity};
pub use sgr::DEPOSIT_UNIT_PRICE;
pub use totals::{CartTotals, LineTotals};
pub use types::*;
