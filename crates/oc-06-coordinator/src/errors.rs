//! Coordinator error types.

use crate::ports::outbound::TokenError;
use oc_02_agreement_registry::RegistryError;
use oc_04_request_lifecycle::LifecycleError;
use oc_05_settlement_ledger::SettlementError;
use shared_types::{format_address, Address, Categorized, ErrorCategory, U256};
use thiserror::Error;

/// Every way a coordinator operation can be refused.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CoordinatorError {
    /// Agreement registration failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Opening a request or accepting a report failed.
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    /// A balance operation failed.
    #[error(transparent)]
    Settlement(#[from] SettlementError),

    /// Transfer payload did not decode to a known instruction.
    #[error("malformed transfer instruction: {0}")]
    Instruction(String),

    /// A transfer notification whose ticket the token ledger does not vouch for.
    #[error("transfer ticket {ticket} not confirmed by the token ledger")]
    UnverifiedTransfer {
        /// Ticket id the notification presented.
        ticket: u64,
    },

    /// The token ledger refused or failed a call.
    #[error("token ledger failure: {0}")]
    ExternalTransferFailed(#[from] TokenError),

    /// Outbound transfer did not complete in time. The balance stays debited.
    #[error("transfer of {amount} to {} timed out", format_address(.recipient))]
    TransferTimedOut {
        /// Destination of the transfer.
        recipient: Address,
        /// Amount sent.
        amount: U256,
    },

    /// A token-ledger query did not complete in time.
    #[error("token ledger did not answer within the transfer timeout")]
    TokenLedgerTimedOut,

    /// The token ledger holds less than the coordinator owes.
    #[error("coordinator owes {held} but token balance is {balance}")]
    Insolvent {
        /// Funds accounted for by the ledger.
        held: U256,
        /// Coordinator's balance at the token ledger.
        balance: U256,
    },
}

impl Categorized for CoordinatorError {
    fn category(&self) -> ErrorCategory {
        match self {
            Self::Registry(e) => e.category(),
            Self::Lifecycle(e) => e.category(),
            Self::Settlement(e) => e.category(),
            Self::Instruction(_) => ErrorCategory::Validation,
            Self::UnverifiedTransfer { .. } => ErrorCategory::Authorization,
            Self::Insolvent { .. } => ErrorCategory::Accounting,
            Self::ExternalTransferFailed(_)
            | Self::TransferTimedOut { .. }
            | Self::TokenLedgerTimedOut => ErrorCategory::External,
        }
    }
}
