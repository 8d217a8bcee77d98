//! # OC-02 Agreement Registry
//!
//! Stores service agreements between a consumer and a set of reporting
//! nodes. An agreement's id is the keccak256 of its content, so clients can
//! precompute it and nodes can sign it before submission.
//!
//! ## Acceptance Rules
//!
//! | Check | Error |
//! |-------|-------|
//! | oracle list non-empty, unique, no zero address, within limit | `RegistryError::*Oracle*` |
//! | one signature per oracle | `SignatureCountMismatch` |
//! | aggregator accepts the oracle count | `UnsupportedAggregator` |
//! | `payment >= n²` | `PaymentTooSmall` |
//! | `end_at > now` | `ExpiredAgreement` |
//! | signature `i` recovers `oracles[i]` | `InvalidSignature` |
//! | same id never maps to different content | `AlreadyExists` |
//!
//! Every check runs before the store is touched; a rejected agreement
//! leaves no trace.

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::{
    check_not_expired, compute_agreement_id, validate_structure, Registration, RegistryConfig,
    RegistryError, ServiceAgreement,
};
pub use ports::AgreementLookup;
pub use service::AgreementRegistry;
