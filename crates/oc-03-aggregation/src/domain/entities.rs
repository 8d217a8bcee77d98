//! # Aggregation Entities
//!
//! `AggregatorKind` is the closed set of strategies an agreement may name.

use super::errors::AggregationError;
use serde::{Deserialize, Serialize};
use shared_types::U256;

/// Strategy an agreement uses to combine its oracles' reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggregatorKind {
    /// Single-oracle agreements; the one report is the answer.
    PassThrough,
    /// Every oracle reports; the answer is the floor of the mean.
    Mean,
}

impl AggregatorKind {
    /// Stable tag folded into the agreement id.
    pub const fn tag(&self) -> u8 {
        match self {
            Self::PassThrough => 1,
            Self::Mean => 2,
        }
    }

    /// Inverse of [`tag`](Self::tag).
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(Self::PassThrough),
            2 => Some(Self::Mean),
            _ => None,
        }
    }

    /// Whether this strategy can serve an agreement with `count` oracles.
    pub fn validate_oracle_count(&self, count: usize) -> Result<(), AggregationError> {
        let supported = match self {
            Self::PassThrough => count == 1,
            Self::Mean => count >= 1,
        };

        if supported {
            Ok(())
        } else {
            Err(AggregationError::UnsupportedOracleCount { kind: *self, count })
        }
    }
}

/// Whether a strategy takes a new report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    /// `true` if the report may be appended.
    pub accept: bool,
}

impl Admission {
    /// Report may be appended.
    pub const fn accept() -> Self {
        Self { accept: true }
    }

    /// Report must be turned away.
    pub const fn reject() -> Self {
        Self { accept: false }
    }
}

/// Result of asking a strategy to finalize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finalization {
    /// Completion condition not met yet.
    Pending {
        /// Reports accepted so far.
        reported: usize,
        /// Reports needed to complete.
        required: usize,
    },
    /// Final answer.
    Complete(U256),
}

impl Finalization {
    /// Final value, if complete.
    pub fn value(&self) -> Option<U256> {
        match self {
            Self::Complete(v) => Some(*v),
            Self::Pending { .. } => None,
        }
    }

    /// Whether the completion condition is met.
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete(_))
    }
}
