//! # Order-Weighted Payment Split
//!
//! The node at 1-based rank `r` of `n` earns weight `w(r) = 2(n - r) + 1`.
//! Weights sum to `n²`:
//!
//! ```text
//! n = 3:  w = 5, 3, 1   (sum 9)
//! share(r) = floor(total · w(r) / n²)
//! ```
//!
//! The product is taken in 512 bits, so any `total` splits exactly. Whatever
//! integer division leaves over is returned as `remainder`.

use crate::domain::SettlementError;
use primitive_types::U512;
use shared_types::U256;

/// Shares by rank plus the undistributed remainder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentSplit {
    /// `shares[r - 1]` is the share for rank `r`.
    pub shares: Vec<U256>,
    /// `total - Σshares`.
    pub remainder: U256,
}

impl PaymentSplit {
    /// `Σshares`.
    pub fn allocated(&self) -> U256 {
        self.shares
            .iter()
            .fold(U256::zero(), |acc, share| acc.saturating_add(*share))
    }
}

/// Weight of rank `rank` (1-based) among `n` reporters.
pub fn rank_weight(rank: usize, n: usize) -> u64 {
    (2 * (n - rank) + 1) as u64
}

/// Split `total` among `n` ranked reporters.
pub fn split_payment(total: U256, n: usize) -> Result<PaymentSplit, SettlementError> {
    if n == 0 {
        return Err(SettlementError::NoReporters);
    }

    let parts = U512::from(n as u64) * U512::from(n as u64);
    let mut shares = Vec::with_capacity(n);
    let mut allocated = U256::zero();

    for rank in 1..=n {
        let weighted = total.full_mul(U256::from(rank_weight(rank, n)));
        let share =
            U256::try_from(weighted / parts).map_err(|_| SettlementError::Overflow)?;
        allocated = allocated
            .checked_add(share)
            .ok_or(SettlementError::Overflow)?;
        shares.push(share);
    }

    if allocated > total {
        return Err(SettlementError::SplitAnomaly { total, allocated });
    }

    Ok(PaymentSplit {
        shares,
        remainder: total - allocated,
    })
}
