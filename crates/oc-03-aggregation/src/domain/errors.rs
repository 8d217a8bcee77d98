//! Aggregation error types.

use super::entities::AggregatorKind;
use shared_types::{Categorized, ErrorCategory};
use thiserror::Error;

/// Errors raised while validating or running an aggregation strategy.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AggregationError {
    /// The strategy cannot serve an agreement with this many oracles.
    #[error("{kind:?} aggregation does not support {count} oracle(s)")]
    UnsupportedOracleCount {
        /// Strategy that rejected the count.
        kind: AggregatorKind,
        /// Offered oracle count.
        count: usize,
    },

    /// Finalization was asked for with no reports.
    #[error("no reports to aggregate")]
    NoReports,

    /// More values were folded into the mean than its divisor allows.
    #[error("mean accumulator holds {pushed} values for a divisor of {divisor}")]
    AccumulatorMismatch {
        /// Values pushed so far.
        pushed: usize,
        /// Configured divisor.
        divisor: usize,
    },

    /// Arithmetic overflow inside a strategy.
    #[error("aggregation arithmetic overflow")]
    Overflow,
}

impl Categorized for AggregationError {
    fn category(&self) -> ErrorCategory {
        match self {
            Self::UnsupportedOracleCount { .. } | Self::NoReports => ErrorCategory::Validation,
            Self::AccumulatorMismatch { .. } | Self::Overflow => ErrorCategory::Accounting,
        }
    }
}
