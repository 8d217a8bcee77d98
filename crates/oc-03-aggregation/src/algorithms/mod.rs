//! # Algorithms Module
//!
//! Strategy bodies, plus enum dispatch from [`AggregatorKind`].

pub mod mean;
pub mod pass_through;

pub use mean::{MeanAccumulator, MeanAggregator};
pub use pass_through::PassThroughAggregator;

use crate::domain::{Admission, AggregationError, AggregatorKind, Finalization};
use crate::ports::AggregationStrategy;
use shared_types::Report;

impl AggregationStrategy for AggregatorKind {
    fn admit(&self, prior: &[Report], candidate: &Report, oracle_count: usize) -> Admission {
        match self {
            Self::PassThrough => PassThroughAggregator.admit(prior, candidate, oracle_count),
            Self::Mean => MeanAggregator.admit(prior, candidate, oracle_count),
        }
    }

    fn finalize(
        &self,
        reports: &[Report],
        oracle_count: usize,
    ) -> Result<Finalization, AggregationError> {
        match self {
            Self::PassThrough => PassThroughAggregator.finalize(reports, oracle_count),
            Self::Mean => MeanAggregator.finalize(reports, oracle_count),
        }
    }
}
