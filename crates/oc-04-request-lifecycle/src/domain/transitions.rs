//! # Transitions
//!
//! Reports enter a request in two phases. [`OracleRequest::stage_report`]
//! runs every check and computes the aggregation outcome on `&self`;
//! [`OracleRequest::commit`] applies it. The caller holds the request's lock
//! across both and may do other fallible work (ledger settlement) in between.

use super::entities::{FulfillmentOutcome, OracleRequest, RequestState, StagedReport};
use super::errors::LifecycleError;
use oc_01_signature_verification::keccak256;
use oc_02_agreement_registry::ServiceAgreement;
use oc_03_aggregation::{AggregationStrategy, Finalization};
use shared_types::{Address, AgreementId, Report, RequestId, U256};

/// `keccak256(agreement_id || counter)`, counter as a 32-byte big-endian word.
pub fn derive_request_id(agreement_id: &AgreementId, counter: u64) -> RequestId {
    let mut preimage = [0u8; 64];
    preimage[..32].copy_from_slice(agreement_id.as_bytes());
    U256::from(counter).to_big_endian(&mut preimage[32..]);
    RequestId(keccak256(&preimage))
}

impl OracleRequest {
    /// Check a report and compute what accepting it would do.
    ///
    /// `agreement` must be the agreement this request was opened under.
    pub fn stage_report(
        &self,
        agreement: &ServiceAgreement,
        node: Address,
        value: U256,
    ) -> Result<StagedReport, LifecycleError> {
        if !self.is_open() {
            return Err(LifecycleError::RequestClosed(self.id));
        }
        if !agreement.is_oracle(&node) {
            return Err(LifecycleError::UnauthorizedNode {
                request_id: self.id,
                node,
            });
        }
        if self.has_reported(&node) {
            return Err(LifecycleError::DuplicateReport {
                request_id: self.id,
                node,
            });
        }

        let oracle_count = agreement.oracle_count();
        let report = Report {
            request_id: self.id,
            node,
            value,
            received_order: self.reports.len() as u32 + 1,
        };

        if !agreement
            .aggregator
            .admit(&self.reports, &report, oracle_count)
            .accept
        {
            return Err(LifecycleError::ReportNotAdmitted(self.id));
        }

        let mut candidate = self.reports.clone();
        candidate.push(report.clone());
        let finalization = agreement.aggregator.finalize(&candidate, oracle_count)?;

        Ok(StagedReport {
            ranked: candidate.iter().map(|r| r.node).collect(),
            report,
            finalization,
        })
    }

    /// Apply a staged report; transitions to `Fulfilled` if it completes.
    pub fn commit(&mut self, staged: StagedReport) -> Result<FulfillmentOutcome, LifecycleError> {
        let expected_order = self.reports.len() as u32 + 1;
        if !self.is_open()
            || staged.report.request_id != self.id
            || staged.report.received_order != expected_order
        {
            return Err(LifecycleError::StaleStage(self.id));
        }

        let report = staged.report;
        self.reports.push(report.clone());

        Ok(match staged.finalization {
            Finalization::Complete(value) => {
                self.state = RequestState::Fulfilled;
                self.answer = Some(value);
                FulfillmentOutcome::Fulfilled { report, value }
            }
            Finalization::Pending { reported, required } => FulfillmentOutcome::Accepted {
                report,
                reported,
                required,
            },
        })
    }
}
