//! # Overflow-Safe Mean
//!
//! Every oracle in the agreement must report before the mean completes.
//!
//! ## Algorithm
//!
//! With `n` the oracle count, each value is split as `v = q·n + r`. The
//! accumulator keeps `Σq` and `Σr` separately:
//!
//! ```text
//! mean = Σq + Σr / n  ==  floor(Σv / n)
//! ```
//!
//! `Σq ≤ n · (MAX / n) ≤ MAX` and `Σr < n²`, so neither sum can overflow even
//! when `Σv` itself would not fit in 256 bits.

use crate::domain::{Admission, AggregationError, Finalization};
use crate::ports::AggregationStrategy;
use shared_types::{Report, U256};
use tracing::debug;

/// Running state of the quotient/remainder mean.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeanAccumulator {
    divisor: U256,
    expected: usize,
    pushed: usize,
    quotient_sum: U256,
    remainder_sum: U256,
}

impl MeanAccumulator {
    /// Accumulator for the mean of exactly `count` values.
    pub fn new(count: usize) -> Result<Self, AggregationError> {
        if count == 0 {
            return Err(AggregationError::NoReports);
        }
        Ok(Self {
            divisor: U256::from(count),
            expected: count,
            pushed: 0,
            quotient_sum: U256::zero(),
            remainder_sum: U256::zero(),
        })
    }

    /// Fold one value in.
    pub fn push(&mut self, value: U256) -> Result<(), AggregationError> {
        if self.pushed == self.expected {
            return Err(AggregationError::AccumulatorMismatch {
                pushed: self.pushed + 1,
                divisor: self.expected,
            });
        }

        self.quotient_sum = self
            .quotient_sum
            .checked_add(value / self.divisor)
            .ok_or(AggregationError::Overflow)?;
        self.remainder_sum = self
            .remainder_sum
            .checked_add(value % self.divisor)
            .ok_or(AggregationError::Overflow)?;
        self.pushed += 1;
        Ok(())
    }

    /// Values folded in so far.
    pub fn len(&self) -> usize {
        self.pushed
    }

    /// Whether nothing has been folded in.
    pub fn is_empty(&self) -> bool {
        self.pushed == 0
    }

    /// `floor(Σv / n)`; only defined once all `n` values are in.
    pub fn mean(&self) -> Result<U256, AggregationError> {
        if self.pushed != self.expected {
            return Err(AggregationError::AccumulatorMismatch {
                pushed: self.pushed,
                divisor: self.expected,
            });
        }

        self.quotient_sum
            .checked_add(self.remainder_sum / self.divisor)
            .ok_or(AggregationError::Overflow)
    }
}

/// Completes once every oracle has reported.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeanAggregator;

impl AggregationStrategy for MeanAggregator {
    fn admit(&self, prior: &[Report], _candidate: &Report, oracle_count: usize) -> Admission {
        if prior.len() < oracle_count {
            Admission::accept()
        } else {
            Admission::reject()
        }
    }

    fn finalize(
        &self,
        reports: &[Report],
        oracle_count: usize,
    ) -> Result<Finalization, AggregationError> {
        if reports.len() < oracle_count {
            return Ok(Finalization::Pending {
                reported: reports.len(),
                required: oracle_count,
            });
        }

        let mut acc = MeanAccumulator::new(oracle_count)?;
        for report in reports {
            acc.push(report.value)?;
        }
        let mean = acc.mean()?;

        debug!(reports = reports.len(), %mean, "mean aggregation complete");
        Ok(Finalization::Complete(mean))
    }
}
