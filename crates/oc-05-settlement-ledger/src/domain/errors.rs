//! Settlement error types.

use shared_types::{format_address, Address, Categorized, ErrorCategory, U256};
use thiserror::Error;

/// Which balance an operation drew on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceKind {
    /// Escrow not pledged to an open request.
    Releasable,
    /// Escrow pledged to open requests.
    Committed,
    /// Withdrawable balance.
    Withdrawable,
}

/// Ledger errors. All of them leave balances untouched.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SettlementError {
    /// Not enough funds in the balance the operation draws on.
    #[error(
        "insufficient {kind:?} balance for {}: requested {requested}, available {available}",
        format_address(.account)
    )]
    InsufficientBalance {
        /// Account debited.
        account: Address,
        /// Balance drawn on.
        kind: BalanceKind,
        /// Amount asked for.
        requested: U256,
        /// Amount present.
        available: U256,
    },

    /// Shares added up to more than the payment.
    #[error("payment split allocated {allocated} out of {total}")]
    SplitAnomaly {
        /// Payment being split.
        total: U256,
        /// Sum of computed shares.
        allocated: U256,
    },

    /// Distribution with no reporting nodes.
    #[error("no reporting nodes to pay")]
    NoReporters,

    /// Balance arithmetic overflow.
    #[error("ledger arithmetic overflow")]
    Overflow,

    /// Account balances no longer add up to the funds held.
    #[error("ledger accounts for {accounted} but holds {held}")]
    ConservationViolated {
        /// Σ(escrowed + withdrawable).
        accounted: U256,
        /// Funds the ledger believes it holds.
        held: U256,
    },
}

impl Categorized for SettlementError {
    fn category(&self) -> ErrorCategory {
        ErrorCategory::Accounting
    }
}
