//! # Outbound Ports
//!
//! Collaborators outside the coordinator's trust boundary. Every call into
//! one of these is made with no lock held and is bounded by a timeout.

use crate::events::CoordinatorEvent;
use async_trait::async_trait;
use oc_04_request_lifecycle::CallbackTarget;
use shared_types::{format_address, Address, RequestId, U256};
use thiserror::Error;

/// Token-ledger failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenError {
    /// The sender's token balance is too small.
    #[error("{} holds {available} tokens, {requested} requested", format_address(.account))]
    InsufficientFunds {
        account: Address,
        requested: U256,
        available: U256,
    },

    /// The receiver's transfer hook refused the transfer; it was reverted.
    #[error("receiver rejected transfer: {0}")]
    ReceiverRejected(String),

    /// The ledger could not be reached.
    #[error("token ledger unavailable: {0}")]
    Unavailable(String),

    /// The ticket was never issued to this receiver, or was already redeemed.
    #[error("transfer ticket {0} not recognised")]
    UnknownTicket(u64),
}

/// Handed to a receiver's transfer hook by the token ledger that moved the
/// funds. Redeemable once, at that ledger, by that receiver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferTicket {
    pub id: u64,
    pub nonce: [u8; 32],
}

/// A transfer as the token ledger recorded it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceivedTransfer {
    pub from: Address,
    pub to: Address,
    pub amount: U256,
}

/// External fungible-token ledger.
#[async_trait]
pub trait TokenLedger: Send + Sync {
    /// Move `amount` from `from` to `to`.
    async fn transfer(&self, from: Address, to: Address, amount: U256) -> Result<(), TokenError>;

    /// Move `amount` and notify `to`'s transfer hook with `data` and a
    /// fresh [`TransferTicket`].
    ///
    /// If the hook fails, the transfer is reverted. An unredeemed ticket
    /// expires when the hook returns.
    async fn transfer_with_data(
        &self,
        from: Address,
        to: Address,
        amount: U256,
        data: Vec<u8>,
    ) -> Result<(), TokenError>;

    /// Current token balance of `account`.
    async fn balance_of(&self, account: Address) -> Result<U256, TokenError>;

    /// Exchange a ticket for the transfer it was issued for.
    ///
    /// Fails with `UnknownTicket` unless the ticket is live, was issued to
    /// `receiver`, and carries the issued nonce. Success consumes it.
    async fn redeem_ticket(
        &self,
        receiver: Address,
        ticket: &TransferTicket,
    ) -> Result<ReceivedTransfer, TokenError>;
}

/// Why a consumer refused a final value.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CallbackError {
    /// The consumer returned an error.
    #[error("callback reverted: {0}")]
    Reverted(String),

    /// Nothing to call at the target address.
    #[error("no contract at {}", format_address(.0))]
    MissingTarget(Address),
}

/// A final value on its way to a consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackInvocation {
    pub target: CallbackTarget,
    pub request_id: RequestId,
    pub value: U256,
}

/// Delivers final values to consumer contracts.
///
/// Implementations may fail, panic, hang or call back into the coordinator.
#[async_trait]
pub trait CallbackDispatcher: Send + Sync {
    async fn dispatch(&self, invocation: CallbackInvocation) -> Result<(), CallbackError>;
}

/// Wall-clock source, Unix seconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

/// Fan-out for coordinator events.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish an event. Returns the number of subscribers that received it.
    async fn publish(&self, event: CoordinatorEvent) -> usize;

    /// Total events published.
    fn events_published(&self) -> u64;
}
