//! # OC-04 Request Lifecycle
//!
//! Opens data requests against registered agreements and carries them from
//! `Open` to `Fulfilled` as reporting nodes answer.
//!
//! ## Guarantees
//!
//! - One accepted report per `(request, node)`; duplicates change nothing.
//! - Ranks are 1-based and consumed only by accepted reports.
//! - A request is fulfilled exactly once.
//! - Payment figures come from the funds actually moved.

pub mod domain;
pub mod service;

pub use domain::{
    derive_request_id, CallbackTarget, FulfillmentOutcome, LifecycleError, NewRequest,
    OracleRequest, RequestState, StagedReport,
};
pub use service::{RequestHandle, RequestTracker};
