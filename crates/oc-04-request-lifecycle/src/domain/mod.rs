//! # Domain Layer
//!
//! Request state, report staging, and the rules each transition enforces.

pub mod entities;
pub mod errors;
pub mod transitions;

pub use entities::{
    CallbackTarget, FulfillmentOutcome, NewRequest, OracleRequest, RequestState, StagedReport,
};
pub use errors::LifecycleError;
pub use transitions::derive_request_id;
