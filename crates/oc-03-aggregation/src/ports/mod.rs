//! # Ports Layer
//!
//! The strategy trait the request lifecycle drives.

use crate::domain::{Admission, AggregationError, Finalization};
use shared_types::Report;

/// A rule that combines reports into one value and decides completion.
///
/// Implementations are pure: the same reports always give the same answer.
/// Duplicate and authorization checks happen before a strategy is consulted.
pub trait AggregationStrategy: Send + Sync {
    /// Whether `candidate` may join the already accepted `prior` reports.
    fn admit(&self, prior: &[Report], candidate: &Report, oracle_count: usize) -> Admission;

    /// Fold `reports` (ordered by rank) into a final value, or report what
    /// is still missing.
    fn finalize(
        &self,
        reports: &[Report],
        oracle_count: usize,
    ) -> Result<Finalization, AggregationError>;
}
