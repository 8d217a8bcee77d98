//! # Agreement Entities

use oc_03_aggregation::AggregatorKind;
use serde::{Deserialize, Serialize};
use shared_types::{Address, AgreementId, Hash, U256};

/// Default upper bound on oracles per agreement.
pub const DEFAULT_MAX_ORACLES: usize = 64;

/// A consumer's agreement with a fixed set of reporting nodes.
///
/// Immutable once registered; its id is derived from every field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceAgreement {
    /// Reporting nodes, in signing order.
    pub oracles: Vec<Address>,
    /// How the nodes' reports are combined.
    pub aggregator: AggregatorKind,
    /// Minimum payment per request.
    pub payment: U256,
    /// Seconds after opening at which a request may be cancelled.
    pub expiration_secs: U256,
    /// Unix time (seconds) after which the agreement can no longer be registered.
    pub end_at: u64,
    /// Digest of the off-chain job description the nodes execute.
    pub request_digest: Hash,
}

impl ServiceAgreement {
    /// Number of reporting nodes.
    pub fn oracle_count(&self) -> usize {
        self.oracles.len()
    }

    /// Whether `node` is one of the agreement's oracles.
    pub fn is_oracle(&self, node: &Address) -> bool {
        self.oracles.contains(node)
    }
}

/// Outcome of a successful registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registration {
    /// The agreement id.
    pub id: AgreementId,
    /// `false` when identical content was already stored.
    pub fresh: bool,
}

/// Registry limits.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Upper bound on `oracles.len()`.
    pub max_oracles: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_oracles: DEFAULT_MAX_ORACLES,
        }
    }
}
