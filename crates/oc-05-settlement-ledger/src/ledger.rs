//! # Settlement Ledger
//!
//! The single owned store of balances. Every operation computes the new
//! balances of all touched accounts first and writes them back only when
//! every step succeeded, so a failed operation changes nothing.
//!
//! ## Conservation
//!
//! `Σ(escrowed + withdrawable) == total_held` after every operation. Funds
//! enter through [`fund_request`](SettlementLedger::fund_request) and
//! [`deposit`](SettlementLedger::deposit), and leave only through
//! [`withdraw`](SettlementLedger::withdraw).

use crate::algorithms::split_payment;
use crate::domain::{AccountBalance, BalanceKind, Distribution, Payout, SettlementError};
use shared_types::{format_address, Address, RequestId, U256};
use std::collections::HashMap;
use tracing::{debug, info};

fn credit(balance: U256, amount: U256) -> Result<U256, SettlementError> {
    balance.checked_add(amount).ok_or(SettlementError::Overflow)
}

fn debit(
    account: &Address,
    kind: BalanceKind,
    available: U256,
    requested: U256,
) -> Result<U256, SettlementError> {
    available
        .checked_sub(requested)
        .ok_or(SettlementError::InsufficientBalance {
            account: *account,
            kind,
            requested,
            available,
        })
}

/// Escrowed and withdrawable balances per account.
#[derive(Debug, Default)]
pub struct SettlementLedger {
    accounts: HashMap<Address, AccountBalance>,
    total_held: U256,
}

impl SettlementLedger {
    /// Empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Balances of `account` (zero if unknown).
    pub fn balance(&self, account: &Address) -> AccountBalance {
        self.accounts.get(account).copied().unwrap_or_default()
    }

    /// Funds the ledger holds across all accounts.
    pub fn total_held(&self) -> U256 {
        self.total_held
    }

    /// Number of accounts with a non-zero balance.
    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    fn store(&mut self, account: Address, balance: AccountBalance) {
        if balance.is_zero() {
            self.accounts.remove(&account);
        } else {
            self.accounts.insert(account, balance);
        }
    }

    // =========================================================================
    // INBOUND FUNDS
    // =========================================================================

    /// Tokens received to pay for a request: escrowed and committed.
    pub fn fund_request(&mut self, account: &Address, amount: U256) -> Result<(), SettlementError> {
        let mut balance = self.balance(account);
        balance.escrowed = credit(balance.escrowed, amount)?;
        balance.committed = credit(balance.committed, amount)?;
        let total_held = credit(self.total_held, amount)?;

        self.store(*account, balance);
        self.total_held = total_held;
        debug!(account = %format_address(account), %amount, "request funded");
        Ok(())
    }

    /// Undo [`fund_request`](Self::fund_request) when opening the request failed.
    pub fn revert_funding(
        &mut self,
        account: &Address,
        amount: U256,
    ) -> Result<(), SettlementError> {
        let mut balance = self.balance(account);
        balance.committed = debit(account, BalanceKind::Committed, balance.committed, amount)?;
        balance.escrowed = debit(account, BalanceKind::Committed, balance.escrowed, amount)?;
        let total_held = debit(account, BalanceKind::Committed, self.total_held, amount)?;

        self.store(*account, balance);
        self.total_held = total_held;
        debug!(account = %format_address(account), %amount, "request funding reverted");
        Ok(())
    }

    /// Tokens received as a prepaid deposit: straight to withdrawable.
    pub fn deposit(&mut self, account: &Address, amount: U256) -> Result<(), SettlementError> {
        let mut balance = self.balance(account);
        balance.withdrawable = credit(balance.withdrawable, amount)?;
        let total_held = credit(self.total_held, amount)?;

        self.store(*account, balance);
        self.total_held = total_held;
        debug!(account = %format_address(account), %amount, "funds deposited");
        Ok(())
    }

    // =========================================================================
    // INTERNAL MOVES
    // =========================================================================

    /// Move withdrawable funds into (uncommitted) escrow.
    pub fn escrow(&mut self, account: &Address, amount: U256) -> Result<(), SettlementError> {
        let mut balance = self.balance(account);
        balance.withdrawable =
            debit(account, BalanceKind::Withdrawable, balance.withdrawable, amount)?;
        balance.escrowed = credit(balance.escrowed, amount)?;

        self.store(*account, balance);
        Ok(())
    }

    /// Move uncommitted escrow back to withdrawable.
    pub fn release(&mut self, account: &Address, amount: U256) -> Result<(), SettlementError> {
        let mut balance = self.balance(account);
        debit(account, BalanceKind::Releasable, balance.releasable(), amount)?;
        balance.escrowed = debit(account, BalanceKind::Releasable, balance.escrowed, amount)?;
        balance.withdrawable = credit(balance.withdrawable, amount)?;

        self.store(*account, balance);
        Ok(())
    }

    /// Pledge prepaid withdrawable funds to a new request.
    pub fn commit_from_balance(
        &mut self,
        account: &Address,
        amount: U256,
    ) -> Result<(), SettlementError> {
        let mut balance = self.balance(account);
        balance.withdrawable =
            debit(account, BalanceKind::Withdrawable, balance.withdrawable, amount)?;
        balance.escrowed = credit(balance.escrowed, amount)?;
        balance.committed = credit(balance.committed, amount)?;

        self.store(*account, balance);
        Ok(())
    }

    /// Undo [`commit_from_balance`](Self::commit_from_balance).
    pub fn revert_commitment(
        &mut self,
        account: &Address,
        amount: U256,
    ) -> Result<(), SettlementError> {
        let mut balance = self.balance(account);
        balance.committed = debit(account, BalanceKind::Committed, balance.committed, amount)?;
        balance.escrowed = debit(account, BalanceKind::Committed, balance.escrowed, amount)?;
        balance.withdrawable = credit(balance.withdrawable, amount)?;

        self.store(*account, balance);
        Ok(())
    }

    // =========================================================================
    // SETTLEMENT
    // =========================================================================

    /// Pay the nodes of a fulfilled request from the payer's committed escrow.
    ///
    /// `ranked_nodes[i]` holds rank `i + 1`. The payer's commitment for the
    /// request is cleared in full; the split's remainder stays in the payer's
    /// escrow as releasable funds.
    pub fn distribute(
        &mut self,
        request_id: RequestId,
        payer: &Address,
        total: U256,
        ranked_nodes: &[Address],
    ) -> Result<Distribution, SettlementError> {
        let split = split_payment(total, ranked_nodes.len())?;
        let allocated = total - split.remainder;

        let mut staged: HashMap<Address, AccountBalance> = HashMap::new();

        let mut payer_balance = self.balance(payer);
        payer_balance.committed =
            debit(payer, BalanceKind::Committed, payer_balance.committed, total)?;
        payer_balance.escrowed =
            debit(payer, BalanceKind::Committed, payer_balance.escrowed, allocated)?;
        staged.insert(*payer, payer_balance);

        let mut payouts = Vec::with_capacity(ranked_nodes.len());
        for (index, (node, share)) in ranked_nodes.iter().zip(&split.shares).enumerate() {
            let mut balance = match staged.get(node) {
                Some(b) => *b,
                None => self.balance(node),
            };
            balance.withdrawable = credit(balance.withdrawable, *share)?;
            staged.insert(*node, balance);

            payouts.push(Payout {
                node: *node,
                rank: index as u32 + 1,
                amount: *share,
            });
        }

        for (account, balance) in staged {
            self.store(account, balance);
        }

        info!(
            request_id = %request_id,
            nodes = ranked_nodes.len(),
            %allocated,
            remainder = %split.remainder,
            "payment distributed"
        );

        Ok(Distribution {
            request_id,
            payer: *payer,
            payouts,
            remainder: split.remainder,
        })
    }

    // =========================================================================
    // OUTBOUND FUNDS
    // =========================================================================

    /// Debit withdrawable funds that are about to leave the ledger.
    pub fn withdraw(&mut self, account: &Address, amount: U256) -> Result<(), SettlementError> {
        let mut balance = self.balance(account);
        balance.withdrawable =
            debit(account, BalanceKind::Withdrawable, balance.withdrawable, amount)?;
        let total_held = debit(account, BalanceKind::Withdrawable, self.total_held, amount)?;

        self.store(*account, balance);
        self.total_held = total_held;
        debug!(account = %format_address(account), %amount, "withdrawal debited");
        Ok(())
    }

    /// Undo [`withdraw`](Self::withdraw) when the outbound transfer failed.
    pub fn restore_withdrawal(
        &mut self,
        account: &Address,
        amount: U256,
    ) -> Result<(), SettlementError> {
        let mut balance = self.balance(account);
        balance.withdrawable = credit(balance.withdrawable, amount)?;
        let total_held = credit(self.total_held, amount)?;

        self.store(*account, balance);
        self.total_held = total_held;
        debug!(account = %format_address(account), %amount, "withdrawal restored");
        Ok(())
    }

    /// Check `Σ(escrowed + withdrawable) == total_held` and `committed <= escrowed`.
    pub fn check_conservation(&self) -> Result<(), SettlementError> {
        let mut accounted = U256::zero();
        for balance in self.accounts.values() {
            if balance.committed > balance.escrowed {
                return Err(SettlementError::ConservationViolated {
                    accounted: balance.committed,
                    held: balance.escrowed,
                });
            }
            accounted = accounted
                .checked_add(balance.escrowed)
                .and_then(|a| a.checked_add(balance.withdrawable))
                .ok_or(SettlementError::Overflow)?;
        }

        if accounted == self.total_held {
            Ok(())
        } else {
            Err(SettlementError::ConservationViolated {
                accounted,
                held: self.total_held,
            })
        }
    }
}
