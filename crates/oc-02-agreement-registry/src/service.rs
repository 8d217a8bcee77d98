//! # Agreement Registry Service
//!
//! Validates and stores service agreements.
//!
//! ## Thread Safety
//!
//! All checks, including signature recovery, run without holding the store
//! lock. The write lock is taken only for the final existence check and
//! insert, so a rejected agreement never touches the store.

use crate::domain::{
    check_not_expired, compute_agreement_id, validate_structure, Registration, RegistryConfig,
    RegistryError, ServiceAgreement,
};
use crate::ports::AgreementLookup;
use oc_01_signature_verification::{
    eth_signed_message_hash, EcdsaSignature, EcdsaVerifier, SignatureError,
    SignatureVerificationApi, VerificationRequest,
};
use parking_lot::RwLock;
use shared_types::{format_address, AgreementId};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Immutable store of accepted agreements.
pub struct AgreementRegistry<V: SignatureVerificationApi = EcdsaVerifier> {
    config: RegistryConfig,
    verifier: Arc<V>,
    agreements: RwLock<HashMap<AgreementId, Arc<ServiceAgreement>>>,
}

impl<V: SignatureVerificationApi> AgreementRegistry<V> {
    /// Create an empty registry.
    pub fn new(config: RegistryConfig, verifier: Arc<V>) -> Self {
        Self {
            config,
            verifier,
            agreements: RwLock::new(HashMap::new()),
        }
    }

    /// Validate `agreement` against its node signatures and store it.
    ///
    /// `signatures[i]` must be `oracles[i]`'s signature over
    /// `eth_signed_message_hash(id)`. Retrying identical content succeeds
    /// with `fresh == false`.
    pub fn register(
        &self,
        agreement: ServiceAgreement,
        signatures: &[EcdsaSignature],
        now: u64,
    ) -> Result<Registration, RegistryError> {
        validate_structure(&agreement, signatures.len(), &self.config)?;
        check_not_expired(&agreement, now)?;

        let id = compute_agreement_id(&agreement);
        self.verify_signatures(&id, &agreement, signatures)?;

        let mut agreements = self.agreements.write();
        if let Some(existing) = agreements.get(&id) {
            if **existing == agreement {
                debug!(agreement_id = %id, "agreement already registered");
                return Ok(Registration { id, fresh: false });
            }
            warn!(agreement_id = %id, "agreement id collision with different content");
            return Err(RegistryError::AlreadyExists(id));
        }

        let oracles = agreement.oracle_count();
        agreements.insert(id, Arc::new(agreement));
        info!(agreement_id = %id, oracles, "service agreement registered");

        Ok(Registration { id, fresh: true })
    }

    fn verify_signatures(
        &self,
        id: &AgreementId,
        agreement: &ServiceAgreement,
        signatures: &[EcdsaSignature],
    ) -> Result<(), RegistryError> {
        let digest = eth_signed_message_hash(id.as_bytes());

        let requests: Vec<VerificationRequest> = agreement
            .oracles
            .iter()
            .zip(signatures)
            .map(|(oracle, signature)| VerificationRequest {
                message_hash: digest,
                signature: signature.clone(),
                expected_signer: Some(*oracle),
            })
            .collect();

        let batch = self.verifier.batch_verify_ecdsa(&requests);
        if let Some(index) = batch.first_failure() {
            let oracle = agreement.oracles[index];
            let reason = batch.results[index]
                .error
                .clone()
                .unwrap_or(SignatureError::RecoveryFailed);

            warn!(
                agreement_id = %id,
                oracle = %format_address(&oracle),
                %reason,
                "agreement signature rejected"
            );
            return Err(RegistryError::InvalidSignature { oracle, reason });
        }

        Ok(())
    }

    /// The agreement stored under `id`.
    pub fn get(&self, id: &AgreementId) -> Result<Arc<ServiceAgreement>, RegistryError> {
        self.agreements
            .read()
            .get(id)
            .cloned()
            .ok_or(RegistryError::NotFound(*id))
    }

    /// Whether an agreement is stored under `id`.
    pub fn contains(&self, id: &AgreementId) -> bool {
        self.agreements.read().contains_key(id)
    }

    /// Number of stored agreements.
    pub fn len(&self) -> usize {
        self.agreements.read().len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.agreements.read().is_empty()
    }

    /// Registry limits.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }
}

impl<V: SignatureVerificationApi> AgreementLookup for AgreementRegistry<V> {
    fn agreement(&self, id: &AgreementId) -> Option<Arc<ServiceAgreement>> {
        self.agreements.read().get(id).cloned()
    }
}
