//! Lifecycle error types.

use oc_03_aggregation::AggregationError;
use shared_types::{
    format_address, Address, AgreementId, Categorized, ErrorCategory, RequestId, U256,
};
use thiserror::Error;

/// Why a request could not be opened or a report was refused.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LifecycleError {
    /// No agreement under this id.
    #[error("unknown agreement {0}")]
    UnknownAgreement(AgreementId),

    /// Paid less than the agreement's payment.
    #[error("insufficient payment: required {required}, paid {paid}")]
    InsufficientPayment {
        /// Agreement payment.
        required: U256,
        /// Amount actually transferred.
        paid: U256,
    },

    /// No request under this id.
    #[error("unknown request {0}")]
    UnknownRequest(RequestId),

    /// The request is already fulfilled.
    #[error("request {0} is closed")]
    RequestClosed(RequestId),

    /// The node is not one of the agreement's oracles.
    #[error("node {} is not an oracle for request {request_id}", format_address(.node))]
    UnauthorizedNode {
        /// Request reported on.
        request_id: RequestId,
        /// Reporting node.
        node: Address,
    },

    /// The node already has an accepted report for this request.
    #[error("node {} already reported on request {request_id}", format_address(.node))]
    DuplicateReport {
        /// Request reported on.
        request_id: RequestId,
        /// Reporting node.
        node: Address,
    },

    /// The aggregation strategy turned the report away.
    #[error("aggregator refused report for request {0}")]
    ReportNotAdmitted(RequestId),

    /// The request changed between staging and commit.
    #[error("staged report for request {0} is stale")]
    StaleStage(RequestId),

    /// Aggregation failed.
    #[error(transparent)]
    Aggregation(#[from] AggregationError),
}

impl Categorized for LifecycleError {
    fn category(&self) -> ErrorCategory {
        match self {
            Self::UnknownAgreement(_) | Self::UnknownRequest(_) => ErrorCategory::Validation,
            Self::InsufficientPayment { .. } => ErrorCategory::Accounting,
            Self::UnauthorizedNode { .. } => ErrorCategory::Authorization,
            Self::RequestClosed(_)
            | Self::DuplicateReport { .. }
            | Self::ReportNotAdmitted(_)
            | Self::StaleStage(_) => ErrorCategory::StateConflict,
            Self::Aggregation(e) => e.category(),
        }
    }
}
