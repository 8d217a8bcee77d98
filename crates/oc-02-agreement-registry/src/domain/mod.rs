//! # Domain Layer
//!
//! Agreement content, its content-addressed id, and structural validation.

pub mod entities;
pub mod errors;
pub mod identity;
pub mod validation;

pub use entities::{Registration, RegistryConfig, ServiceAgreement};
pub use errors::RegistryError;
pub use identity::compute_agreement_id;
pub use validation::{check_not_expired, validate_structure};
