//! # Domain Entities
//!
//! Signature and verification result types.

use super::errors::SignatureError;
use serde::{Deserialize, Serialize};
use shared_types::{Address, Hash};

/// ECDSA signature on the secp256k1 curve.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EcdsaSignature {
    /// R component (32 bytes)
    pub r: [u8; 32],
    /// S component (32 bytes)
    pub s: [u8; 32],
    /// Recovery ID (0, 1, 27, or 28)
    pub v: u8,
}

impl EcdsaSignature {
    /// Decode the 65-byte `r || s || v` encoding produced by node tooling.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SignatureError> {
        if bytes.len() != 65 {
            return Err(SignatureError::InvalidFormat);
        }
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..64]);
        Ok(Self { r, s, v: bytes[64] })
    }

    /// Encode as `r || s || v`.
    pub fn to_bytes(&self) -> [u8; 65] {
        let mut out = [0u8; 65];
        out[..32].copy_from_slice(&self.r);
        out[32..64].copy_from_slice(&self.s);
        out[64] = self.v;
        out
    }
}

/// Request to verify one signature, optionally against an expected signer.
#[derive(Clone, Debug)]
pub struct VerificationRequest {
    /// The digest that was signed
    pub message_hash: Hash,
    /// The signature to verify
    pub signature: EcdsaSignature,
    /// If set, the recovered address must equal this signer
    pub expected_signer: Option<Address>,
}

/// Result of signature verification.
#[derive(Clone, Debug)]
pub struct VerificationResult {
    /// Whether the signature is valid
    pub valid: bool,
    /// The recovered address (if verification succeeded)
    pub recovered_address: Option<Address>,
    /// Error details (if verification failed)
    pub error: Option<SignatureError>,
}

impl VerificationResult {
    /// Create a successful verification result.
    pub fn valid(recovered_address: Address) -> Self {
        Self {
            valid: true,
            recovered_address: Some(recovered_address),
            error: None,
        }
    }

    /// Create a failed verification result.
    pub fn invalid(error: SignatureError) -> Self {
        Self {
            valid: false,
            recovered_address: None,
            error: Some(error),
        }
    }
}

/// Result of batch verification, one entry per request in input order.
#[derive(Clone, Debug)]
pub struct BatchVerificationResult {
    /// Individual results for each request
    pub results: Vec<VerificationResult>,
    /// Whether all verifications passed
    pub all_valid: bool,
    /// Count of valid signatures
    pub valid_count: usize,
}

impl BatchVerificationResult {
    /// Create a batch result from individual results.
    pub fn from_results(results: Vec<VerificationResult>) -> Self {
        let valid_count = results.iter().filter(|r| r.valid).count();
        Self {
            all_valid: valid_count == results.len(),
            valid_count,
            results,
        }
    }

    /// Index of the first failed verification, if any.
    pub fn first_failure(&self) -> Option<usize> {
        self.results.iter().position(|r| !r.valid)
    }
}
