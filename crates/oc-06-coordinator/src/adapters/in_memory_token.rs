//! # In-Memory Token Ledger
//!
//! Fungible-token balances with a transfer-and-notify call. Receivers are
//! held weakly so a receiver that owns the ledger does not keep itself
//! alive. No lock is held while a receiver's hook runs; the hook may call
//! back into the ledger.
//!
//! Every notification carries a one-time ticket with a random nonce. The
//! ticket lives only while the hook runs, so a party that calls a receiver
//! directly has nothing it can redeem.

use crate::ports::{ReceivedTransfer, TokenError, TokenLedger, TokenReceiver, TransferTicket};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use shared_types::{format_address, Address, U256};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, error, warn};

struct IssuedTicket {
    nonce: [u8; 32],
    transfer: ReceivedTransfer,
}

/// Token ledger kept in memory.
#[derive(Default)]
pub struct InMemoryTokenLedger {
    balances: RwLock<HashMap<Address, U256>>,
    receivers: RwLock<HashMap<Address, Weak<dyn TokenReceiver>>>,
    tickets: Mutex<HashMap<u64, IssuedTicket>>,
    next_ticket: AtomicU64,
}

impl InMemoryTokenLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create tokens out of thin air.
    pub fn mint(&self, account: Address, amount: U256) {
        let mut balances = self.balances.write();
        let balance = balances.entry(account).or_default();
        *balance = balance.saturating_add(amount);
    }

    /// Install the transfer hook for `account`.
    pub fn register_receiver(&self, account: Address, receiver: Weak<dyn TokenReceiver>) {
        self.receivers.write().insert(account, receiver);
    }

    /// Sum of all balances.
    pub fn total_supply(&self) -> U256 {
        self.balances
            .read()
            .values()
            .fold(U256::zero(), |acc, b| acc.saturating_add(*b))
    }

    /// Tickets issued to hooks that are still running and not yet redeemed.
    pub fn outstanding_tickets(&self) -> usize {
        self.tickets.lock().len()
    }

    fn move_funds(&self, from: Address, to: Address, amount: U256) -> Result<(), TokenError> {
        let mut balances = self.balances.write();
        let available = balances.get(&from).copied().unwrap_or_default();
        let remaining = available
            .checked_sub(amount)
            .ok_or(TokenError::InsufficientFunds {
                account: from,
                requested: amount,
                available,
            })?;
        let credited = balances
            .get(&to)
            .copied()
            .unwrap_or_default()
            .checked_add(amount)
            .ok_or_else(|| TokenError::Unavailable("balance overflow".into()))?;

        balances.insert(from, remaining);
        balances.insert(to, credited);
        Ok(())
    }

    fn receiver(&self, account: &Address) -> Option<Arc<dyn TokenReceiver>> {
        self.receivers.read().get(account).and_then(Weak::upgrade)
    }

    fn issue_ticket(&self, transfer: ReceivedTransfer) -> TransferTicket {
        let ticket = TransferTicket {
            id: self.next_ticket.fetch_add(1, Ordering::Relaxed),
            nonce: rand::random(),
        };
        self.tickets.lock().insert(
            ticket.id,
            IssuedTicket {
                nonce: ticket.nonce,
                transfer,
            },
        );
        ticket
    }
}

#[async_trait]
impl TokenLedger for InMemoryTokenLedger {
    async fn transfer(&self, from: Address, to: Address, amount: U256) -> Result<(), TokenError> {
        self.move_funds(from, to, amount)?;
        debug!(from = %format_address(&from), to = %format_address(&to), %amount, "transfer");
        Ok(())
    }

    async fn transfer_with_data(
        &self,
        from: Address,
        to: Address,
        amount: U256,
        data: Vec<u8>,
    ) -> Result<(), TokenError> {
        self.move_funds(from, to, amount)?;

        let Some(receiver) = self.receiver(&to) else {
            return Ok(());
        };

        let ticket = self.issue_ticket(ReceivedTransfer { from, to, amount });
        let ticket_id = ticket.id;
        let hooked = receiver.on_token_transfer(ticket, data).await;
        self.tickets.lock().remove(&ticket_id);

        if let Err(e) = hooked {
            warn!(to = %format_address(&to), error = %e, "transfer hook failed, reverting");
            if let Err(revert) = self.move_funds(to, from, amount) {
                error!(error = %revert, "could not revert rejected transfer");
            }
            return Err(TokenError::ReceiverRejected(e.to_string()));
        }
        Ok(())
    }

    async fn balance_of(&self, account: Address) -> Result<U256, TokenError> {
        Ok(self.balances.read().get(&account).copied().unwrap_or_default())
    }

    async fn redeem_ticket(
        &self,
        receiver: Address,
        ticket: &TransferTicket,
    ) -> Result<ReceivedTransfer, TokenError> {
        let mut tickets = self.tickets.lock();
        let genuine = tickets.get(&ticket.id).is_some_and(|issued| {
            issued.nonce == ticket.nonce && issued.transfer.to == receiver
        });
        if !genuine {
            warn!(
                ticket = ticket.id,
                receiver = %format_address(&receiver),
                "refused ticket redemption"
            );
            return Err(TokenError::UnknownTicket(ticket.id));
        }
        tickets
            .remove(&ticket.id)
            .map(|issued| issued.transfer)
            .ok_or(TokenError::UnknownTicket(ticket.id))
    }
}
