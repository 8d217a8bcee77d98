//! # Ports Layer
//!
//! Read-only view of the registry for the request lifecycle.

use crate::domain::ServiceAgreement;
use shared_types::AgreementId;
use std::sync::Arc;

/// Lookup of registered agreements.
pub trait AgreementLookup: Send + Sync {
    /// The agreement stored under `id`, if any.
    fn agreement(&self, id: &AgreementId) -> Option<Arc<ServiceAgreement>>;
}
