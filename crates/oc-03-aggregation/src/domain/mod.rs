//! # Domain Layer
//!
//! Strategy selection and the outcome types every strategy produces.

pub mod entities;
pub mod errors;

pub use entities::{Admission, AggregatorKind, Finalization};
pub use errors::AggregationError;
