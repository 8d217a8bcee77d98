//! # OC-05 Settlement Ledger
//!
//! Escrowed balances per consumer, withdrawable balances per node, and the
//! order-weighted split that moves the first into the second when a request
//! is fulfilled.
//!
//! ## Module Structure
//!
//! ```text
//! oc-05-settlement-ledger/
//! ├── domain/          # AccountBalance, Distribution, errors
//! ├── algorithms/      # split_payment (512-bit intermediate)
//! └── ledger.rs        # SettlementLedger
//! ```
//!
//! The ledger is plain data with `&mut self` operations; the coordinator
//! owns it behind a lock.

pub mod algorithms;
pub mod domain;
pub mod ledger;

pub use algorithms::{rank_weight, split_payment, PaymentSplit};
pub use domain::{AccountBalance, BalanceKind, Distribution, Payout, SettlementError};
pub use ledger::SettlementLedger;
