//! # Ledger Entities

use serde::{Deserialize, Serialize};
use shared_types::{Address, RequestId, U256};

/// One account's two balances.
///
/// `committed` is the part of `escrowed` that backs open requests; it can
/// only leave escrow through a distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AccountBalance {
    /// Held on the account's behalf pending request fulfillment.
    pub escrowed: U256,
    /// Earned or deposited, free to withdraw.
    pub withdrawable: U256,
    /// Portion of `escrowed` pledged to open requests.
    pub committed: U256,
}

impl AccountBalance {
    /// Escrow not pledged to any open request.
    pub fn releasable(&self) -> U256 {
        self.escrowed.saturating_sub(self.committed)
    }

    /// `escrowed + withdrawable`.
    pub fn total(&self) -> U256 {
        self.escrowed.saturating_add(self.withdrawable)
    }

    pub(crate) fn is_zero(&self) -> bool {
        self.escrowed.is_zero() && self.withdrawable.is_zero() && self.committed.is_zero()
    }
}

/// A node's share of a request's payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    /// Reporting node credited.
    pub node: Address,
    /// 1-based report rank.
    pub rank: u32,
    /// Amount credited to the node's withdrawable balance.
    pub amount: U256,
}

/// Result of settling one fulfilled request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distribution {
    /// Settled request.
    pub request_id: RequestId,
    /// Account whose escrow paid.
    pub payer: Address,
    /// Per-node payouts in rank order.
    pub payouts: Vec<Payout>,
    /// Left in the payer's escrow.
    pub remainder: U256,
}

impl Distribution {
    /// Sum of all payouts.
    pub fn paid_out(&self) -> U256 {
        self.payouts
            .iter()
            .fold(U256::zero(), |acc, p| acc.saturating_add(p.amount))
    }
}
