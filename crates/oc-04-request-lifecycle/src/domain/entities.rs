//! # Request Entities
//!
//! ## State Machine
//!
//! ```text
//! [Open] --final report--> [Fulfilled]
//!   |
//!   +-- report (not final) --> [Open]
//! ```
//!
//! `Fulfilled` is terminal. Cancellation is not part of this core;
//! `expires_at` is recorded for it but never enforced.

use oc_03_aggregation::Finalization;
use serde::{Deserialize, Serialize};
use shared_types::{Address, AgreementId, Report, RequestId, U256};

/// Consumer contract and function that receives the final value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallbackTarget {
    /// Consumer contract address.
    pub address: Address,
    /// 4-byte function selector invoked on fulfillment.
    pub function_selector: [u8; 4],
}

/// Lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestState {
    /// Accepting reports.
    Open,
    /// Final value computed and payment distributed.
    Fulfilled,
}

/// Parameters for opening a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRequest {
    /// Agreement the request runs under.
    pub agreement_id: AgreementId,
    /// Where the answer goes.
    pub callback: CallbackTarget,
    /// Account that paid.
    pub requester: Address,
    /// Amount actually moved into escrow.
    pub paid: U256,
    /// Caller-defined version of `data`'s encoding.
    pub data_version: U256,
    /// Opaque request parameters for the nodes.
    pub data: Vec<u8>,
}

/// A data request and the reports accepted for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleRequest {
    /// Request id.
    pub id: RequestId,
    /// Agreement the request runs under.
    pub agreement_id: AgreementId,
    /// Consumer callback.
    pub callback: CallbackTarget,
    /// Account that paid.
    pub requester: Address,
    /// Escrowed payment.
    pub payment: U256,
    /// Unix seconds at opening.
    pub created_at: u64,
    /// `created_at + agreement.expiration_secs`, saturating.
    pub expires_at: u64,
    /// Caller-defined version of `data`'s encoding.
    pub data_version: U256,
    /// Opaque request parameters.
    pub data: Vec<u8>,
    /// Current state.
    pub state: RequestState,
    /// Accepted reports in rank order.
    pub reports: Vec<Report>,
    /// Final value once fulfilled.
    pub answer: Option<U256>,
}

impl OracleRequest {
    /// Whether reports are still accepted.
    pub fn is_open(&self) -> bool {
        self.state == RequestState::Open
    }

    /// Whether `node` already has an accepted report.
    pub fn has_reported(&self, node: &Address) -> bool {
        self.reports.iter().any(|r| r.node == *node)
    }

    /// Reporting nodes in rank order.
    pub fn ranked_nodes(&self) -> Vec<Address> {
        self.reports.iter().map(|r| r.node).collect()
    }
}

/// A report that passed every check, with the aggregation outcome it would
/// produce. Nothing is mutated until it is committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedReport {
    /// The report, with its rank assigned.
    pub report: Report,
    /// Aggregation result including this report.
    pub finalization: Finalization,
    /// All reporting nodes in rank order, this one last.
    pub ranked: Vec<Address>,
}

impl StagedReport {
    /// Whether committing this report fulfills the request.
    pub fn completes(&self) -> bool {
        self.finalization.is_complete()
    }

    /// Reporting nodes in rank order, including this one.
    pub fn ranked_nodes(&self) -> &[Address] {
        &self.ranked
    }
}

/// Result of an accepted report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FulfillmentOutcome {
    /// Report stored; more are needed.
    Accepted {
        /// The stored report.
        report: Report,
        /// Reports accepted so far.
        reported: usize,
        /// Reports needed.
        required: usize,
    },
    /// Report stored and the request is now fulfilled.
    Fulfilled {
        /// The stored report.
        report: Report,
        /// Final aggregated value.
        value: U256,
    },
}

impl FulfillmentOutcome {
    /// The report this outcome is about.
    pub fn report(&self) -> &Report {
        match self {
            Self::Accepted { report, .. } | Self::Fulfilled { report, .. } => report,
        }
    }

    /// Final value, if this report fulfilled the request.
    pub fn value(&self) -> Option<U256> {
        match self {
            Self::Fulfilled { value, .. } => Some(*value),
            Self::Accepted { .. } => None,
        }
    }
}
