//! # Transfer Instructions
//!
//! The payload attached to a token transfer into the coordinator. It says
//! what the funds are for. Sender and amount fields inside it are claims
//! only; the coordinator acts on the figures the token ledger reports.

use crate::errors::CoordinatorError;
use bincode::Options;
use oc_04_request_lifecycle::CallbackTarget;
use serde::{Deserialize, Serialize};
use shared_types::{Address, AgreementId, U256};

/// Upper bound on an encoded instruction.
pub const MAX_INSTRUCTION_BYTES: u64 = 64 * 1024;

fn codec() -> impl Options {
    bincode::options().with_limit(MAX_INSTRUCTION_BYTES)
}

/// What an inbound transfer pays for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferInstruction {
    /// Open a request under an agreement, paid by this transfer.
    OracleRequest {
        claimed_sender: Address,
        claimed_payment: U256,
        agreement_id: AgreementId,
        callback: CallbackTarget,
        data_version: U256,
        data: Vec<u8>,
    },
    /// Credit the transfer to the sender's withdrawable balance.
    DepositFunds {
        claimed_account: Address,
        claimed_amount: U256,
    },
}

impl TransferInstruction {
    /// Encode for attachment to a transfer.
    pub fn encode(&self) -> Result<Vec<u8>, CoordinatorError> {
        codec()
            .serialize(self)
            .map_err(|e| CoordinatorError::Instruction(e.to_string()))
    }

    /// Decode an attached payload. Trailing bytes are rejected.
    pub fn decode(bytes: &[u8]) -> Result<Self, CoordinatorError> {
        codec()
            .reject_trailing_bytes()
            .deserialize(bytes)
            .map_err(|e| CoordinatorError::Instruction(e.to_string()))
    }

    /// Label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::OracleRequest { .. } => "request",
            Self::DepositFunds { .. } => "deposit",
        }
    }
}
