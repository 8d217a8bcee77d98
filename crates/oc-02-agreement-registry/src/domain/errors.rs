//! Registry error types.

use oc_01_signature_verification::SignatureError;
use oc_03_aggregation::AggregationError;
use shared_types::{format_address, Address, AgreementId, Categorized, ErrorCategory, U256};
use thiserror::Error;

/// Reasons an agreement is rejected or cannot be found.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// No oracles listed.
    #[error("agreement lists no oracles")]
    EmptyOracleSet,

    /// The same oracle is listed twice.
    #[error("oracle {} listed more than once", format_address(.0))]
    DuplicateOracle(Address),

    /// The zero address was listed as an oracle.
    #[error("zero address is not a valid oracle")]
    ZeroAddressOracle,

    /// More oracles than the registry accepts.
    #[error("agreement lists {count} oracles, limit is {max}")]
    TooManyOracles {
        /// Listed oracles.
        count: usize,
        /// Configured limit.
        max: usize,
    },

    /// Signatures do not pair one-to-one with oracles.
    #[error("{signatures} signatures for {oracles} oracles")]
    SignatureCountMismatch {
        /// Listed oracles.
        oracles: usize,
        /// Supplied signatures.
        signatures: usize,
    },

    /// The aggregator cannot serve this oracle set.
    #[error("unsupported aggregator: {0}")]
    UnsupportedAggregator(#[from] AggregationError),

    /// Payment too small for every rank to earn a positive share.
    #[error("payment {payment} below minimum {minimum}")]
    PaymentTooSmall {
        /// Offered payment.
        payment: U256,
        /// `n²` for `n` oracles.
        minimum: U256,
    },

    /// `end_at` is not strictly in the future.
    #[error("agreement ended at {end_at}, now is {now}")]
    ExpiredAgreement {
        /// Agreement end time.
        end_at: u64,
        /// Registration time.
        now: u64,
    },

    /// An oracle's signature does not recover to that oracle.
    #[error("invalid signature for oracle {}: {reason}", format_address(.oracle))]
    InvalidSignature {
        /// First oracle whose signature failed.
        oracle: Address,
        /// Why recovery failed.
        reason: SignatureError,
    },

    /// The id is already bound to different content.
    #[error("agreement {0} already exists with different content")]
    AlreadyExists(AgreementId),

    /// No agreement under this id.
    #[error("agreement {0} not found")]
    NotFound(AgreementId),
}

impl Categorized for RegistryError {
    fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidSignature { reason, .. } => reason.category(),
            Self::PaymentTooSmall { .. } => ErrorCategory::Accounting,
            Self::AlreadyExists(_) => ErrorCategory::StateConflict,
            _ => ErrorCategory::Validation,
        }
    }
}
