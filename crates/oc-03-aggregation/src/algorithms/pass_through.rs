//! # Pass-Through
//!
//! Single-oracle strategy: the first accepted report is the answer.

use crate::domain::{Admission, AggregationError, Finalization};
use crate::ports::AggregationStrategy;
use shared_types::Report;

/// Completes on the first report.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThroughAggregator;

impl AggregationStrategy for PassThroughAggregator {
    fn admit(&self, prior: &[Report], _candidate: &Report, _oracle_count: usize) -> Admission {
        if prior.is_empty() {
            Admission::accept()
        } else {
            Admission::reject()
        }
    }

    fn finalize(
        &self,
        reports: &[Report],
        _oracle_count: usize,
    ) -> Result<Finalization, AggregationError> {
        match reports.first() {
            Some(report) => Ok(Finalization::Complete(report.value)),
            None => Ok(Finalization::Pending {
                reported: 0,
                required: 1,
            }),
        }
    }
}
