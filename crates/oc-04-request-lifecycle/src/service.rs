//! # Request Tracker
//!
//! Owns every request, each behind its own mutex.
//!
//! ## Locking
//!
//! - The table lock guards only the id → request map and the id counter. It
//!   is held for map lookups and inserts, never while a report is processed.
//! - A request's mutex is the critical section for reports on that request:
//!   acceptance, duplicate detection, the completion check and settlement all
//!   run under it. Reports for different requests never contend.

use crate::domain::{
    derive_request_id, FulfillmentOutcome, LifecycleError, NewRequest, OracleRequest,
    RequestState,
};
use oc_02_agreement_registry::AgreementLookup;
use parking_lot::{Mutex, RwLock};
use shared_types::{format_address, Address, RequestId, U256};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Shared handle to one request's critical section.
pub type RequestHandle = Arc<Mutex<OracleRequest>>;

#[derive(Default)]
struct RequestTable {
    nonce: u64,
    entries: HashMap<RequestId, RequestHandle>,
}

/// Creates, tracks and finalizes requests.
#[derive(Default)]
pub struct RequestTracker {
    table: RwLock<RequestTable>,
}

impl RequestTracker {
    /// Empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a request against a registered agreement.
    ///
    /// `new.paid` must be the amount actually moved, never a claimed figure.
    pub fn open<L>(
        &self,
        lookup: &L,
        new: NewRequest,
        now: u64,
    ) -> Result<OracleRequest, LifecycleError>
    where
        L: AgreementLookup + ?Sized,
    {
        let agreement = lookup
            .agreement(&new.agreement_id)
            .ok_or(LifecycleError::UnknownAgreement(new.agreement_id))?;

        if new.paid < agreement.payment {
            return Err(LifecycleError::InsufficientPayment {
                required: agreement.payment,
                paid: new.paid,
            });
        }

        let expires_at = if agreement.expiration_secs > U256::from(u64::MAX) {
            u64::MAX
        } else {
            now.saturating_add(agreement.expiration_secs.low_u64())
        };

        let mut table = self.table.write();
        let id = derive_request_id(&new.agreement_id, table.nonce);
        let request = OracleRequest {
            id,
            agreement_id: new.agreement_id,
            callback: new.callback,
            requester: new.requester,
            payment: new.paid,
            created_at: now,
            expires_at,
            data_version: new.data_version,
            data: new.data,
            state: RequestState::Open,
            reports: Vec::new(),
            answer: None,
        };
        table
            .entries
            .insert(id, Arc::new(Mutex::new(request.clone())));
        table.nonce += 1;

        info!(
            request_id = %id,
            agreement_id = %request.agreement_id,
            requester = %format_address(&request.requester),
            payment = %request.payment,
            "oracle request opened"
        );
        Ok(request)
    }

    /// Lock handle for one request.
    pub fn handle(&self, id: &RequestId) -> Result<RequestHandle, LifecycleError> {
        self.table
            .read()
            .entries
            .get(id)
            .cloned()
            .ok_or(LifecycleError::UnknownRequest(*id))
    }

    /// Snapshot of one request.
    pub fn get(&self, id: &RequestId) -> Result<OracleRequest, LifecycleError> {
        Ok(self.handle(id)?.lock().clone())
    }

    /// Stage and commit a report in one step.
    ///
    /// For callers with no settlement to interleave; the coordinator drives
    /// the two phases itself.
    pub fn submit_report<L>(
        &self,
        lookup: &L,
        id: &RequestId,
        node: Address,
        value: U256,
    ) -> Result<FulfillmentOutcome, LifecycleError>
    where
        L: AgreementLookup + ?Sized,
    {
        let handle = self.handle(id)?;
        let mut request = handle.lock();
        let agreement = lookup
            .agreement(&request.agreement_id)
            .ok_or(LifecycleError::UnknownAgreement(request.agreement_id))?;

        let staged = request.stage_report(&agreement, node, value)?;
        let outcome = request.commit(staged)?;
        debug!(request_id = %id, rank = outcome.report().received_order, "report committed");
        Ok(outcome)
    }

    /// Requests opened so far; also the next counter value.
    pub fn nonce(&self) -> u64 {
        self.table.read().nonce
    }

    /// Number of tracked requests.
    pub fn len(&self) -> usize {
        self.table.read().entries.len()
    }

    /// Whether no request was ever opened.
    pub fn is_empty(&self) -> bool {
        self.table.read().entries.is_empty()
    }
}
