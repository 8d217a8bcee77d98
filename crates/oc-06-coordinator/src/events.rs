//! # Coordinator Events
//!
//! Emitted after the state change they describe has been applied. Nodes
//! watch `OracleRequest`; consumers and indexers watch the rest.

use oc_04_request_lifecycle::CallbackTarget;
use serde::{Deserialize, Serialize};
use shared_types::{Address, AgreementId, RequestId, U256};

/// How delivering a final value to the consumer went.
///
/// Only ever observed; the request is fulfilled and paid whatever this says.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallbackStatus {
    /// The consumer accepted the value.
    Delivered,
    /// The consumer returned an error.
    Reverted(String),
    /// The consumer panicked.
    Panicked,
    /// The consumer did not return within the callback timeout.
    TimedOut,
    /// No contract lives at the callback address.
    MissingTarget,
}

impl CallbackStatus {
    /// Whether the consumer accepted the value.
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered)
    }

    /// Stable label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Delivered => "delivered",
            Self::Reverted(_) => "reverted",
            Self::Panicked => "panicked",
            Self::TimedOut => "timed_out",
            Self::MissingTarget => "missing",
        }
    }
}

/// Everything the coordinator announces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoordinatorEvent {
    /// A new agreement was stored.
    NewServiceAgreement {
        agreement_id: AgreementId,
        oracles: Vec<Address>,
        payment: U256,
    },
    /// A request was opened and funded.
    OracleRequest {
        request_id: RequestId,
        agreement_id: AgreementId,
        requester: Address,
        payment: U256,
        callback: CallbackTarget,
        data_version: U256,
        data: Vec<u8>,
    },
    /// A node's report was accepted.
    ReportAccepted {
        request_id: RequestId,
        node: Address,
        rank: u32,
    },
    /// The final value was computed and the payment distributed.
    RequestFulfilled { request_id: RequestId, value: U256 },
    /// The consumer callback did not accept the final value.
    CallbackFailed {
        request_id: RequestId,
        status: CallbackStatus,
    },
    /// Prepaid funds were credited.
    FundsDeposited { account: Address, amount: U256 },
    /// Funds left the coordinator.
    FundsWithdrawn {
        account: Address,
        recipient: Address,
        amount: U256,
    },
}

impl CoordinatorEvent {
    /// Event name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::NewServiceAgreement { .. } => "NewServiceAgreement",
            Self::OracleRequest { .. } => "OracleRequest",
            Self::ReportAccepted { .. } => "ReportAccepted",
            Self::RequestFulfilled { .. } => "RequestFulfilled",
            Self::CallbackFailed { .. } => "CallbackFailed",
            Self::FundsDeposited { .. } => "FundsDeposited",
            Self::FundsWithdrawn { .. } => "FundsWithdrawn",
        }
    }

    /// Request the event concerns, if any.
    pub fn request_id(&self) -> Option<RequestId> {
        match self {
            Self::OracleRequest { request_id, .. }
            | Self::ReportAccepted { request_id, .. }
            | Self::RequestFulfilled { request_id, .. }
            | Self::CallbackFailed { request_id, .. } => Some(*request_id),
            _ => None,
        }
    }
}
