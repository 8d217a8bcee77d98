//! # Inbound Ports (Driving Ports / API)
//!
//! Traits that define the public API of this subsystem.

use crate::domain::entities::{
    BatchVerificationResult, EcdsaSignature, VerificationRequest, VerificationResult,
};
use crate::domain::errors::SignatureError;
use shared_types::{Address, Hash};

/// Primary Signature Verification API.
///
/// Implementations must be thread-safe (`Send + Sync`); the agreement
/// registry holds one for its lifetime.
pub trait SignatureVerificationApi: Send + Sync {
    /// Recover the signer's address from a digest and signature.
    ///
    /// # Security
    /// - Rejects signatures with high S values (EIP-2 malleability protection)
    fn recover_address(
        &self,
        message_hash: &Hash,
        signature: &EcdsaSignature,
    ) -> Result<Address, SignatureError>;

    /// Verify a signature and check that the recovered signer matches `expected`.
    fn verify_ecdsa_signer(
        &self,
        message_hash: &Hash,
        signature: &EcdsaSignature,
        expected: Address,
    ) -> VerificationResult;

    /// Verify many signatures in parallel; results keep input order.
    fn batch_verify_ecdsa(&self, requests: &[VerificationRequest]) -> BatchVerificationResult;
}
