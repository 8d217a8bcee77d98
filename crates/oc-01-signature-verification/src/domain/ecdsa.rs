//! # ECDSA Recovery (secp256k1)
//!
//! Pure domain logic for recovering a node's address from a signed digest.
//!
//! ## Security Notes
//!
//! - **Malleability Prevention (EIP-2)**: S must not exceed SECP256K1_HALF_ORDER (floor(n/2))
//! - **Scalar Range Validation**: R and S must be in [1, n-1]
//! - **R Point Validation**: R must be a valid x-coordinate on the secp256k1 curve
//! - **Constant-Time Operations**: Uses `subtle` crate for side-channel resistance

use super::entities::{
    BatchVerificationResult, EcdsaSignature, VerificationRequest, VerificationResult,
};
use super::errors::SignatureError;
use crate::ports::inbound::SignatureVerificationApi;
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use k256::elliptic_curve::sec1::FromEncodedPoint;
use k256::{AffinePoint, EncodedPoint};
use sha3::{Digest, Keccak256};
use shared_types::{Address, Hash};
use subtle::{Choice, ConstantTimeEq};

/// secp256k1 curve order n
/// n = 0xFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEBAAEDCE6AF48A03BBFD25E8CD0364141
const SECP256K1_ORDER: [u8; 32] = [
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE,
    0xBA, 0xAE, 0xDC, 0xE6, 0xAF, 0x48, 0xA0, 0x3B, 0xBF, 0xD2, 0x5E, 0x8C, 0xD0, 0x36, 0x41, 0x41,
];

/// n/2, the EIP-2 upper bound (exclusive) for S.
const SECP256K1_HALF_ORDER: [u8; 32] = [
    0x7F, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0x5D, 0x57, 0x6E, 0x73, 0x57, 0xA4, 0x50, 0x1D, 0xDF, 0xE9, 0x2F, 0x46, 0x68, 0x1B, 0x20, 0xA0,
];

/// Prefix of the Ethereum personal-sign envelope for a 32-byte payload.
const PERSONAL_SIGN_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n32";

// =============================================================================
// ECDSA VERIFIER
// =============================================================================

/// Stateless secp256k1 verifier; the production `SignatureVerificationApi`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EcdsaVerifier;

impl EcdsaVerifier {
    /// Create a new ECDSA verifier.
    pub fn new() -> Self {
        Self
    }
}

impl SignatureVerificationApi for EcdsaVerifier {
    fn recover_address(
        &self,
        message_hash: &Hash,
        signature: &EcdsaSignature,
    ) -> Result<Address, SignatureError> {
        let result = verify_ecdsa(message_hash, signature);
        match (result.recovered_address, result.error) {
            (Some(address), _) => Ok(address),
            (None, Some(err)) => Err(err),
            (None, None) => Err(SignatureError::RecoveryFailed),
        }
    }

    fn verify_ecdsa_signer(
        &self,
        message_hash: &Hash,
        signature: &EcdsaSignature,
        expected: Address,
    ) -> VerificationResult {
        verify_ecdsa_signer(message_hash, signature, expected)
    }

    fn batch_verify_ecdsa(&self, requests: &[VerificationRequest]) -> BatchVerificationResult {
        batch_verify_ecdsa(requests)
    }
}

// =============================================================================
// CORE VERIFICATION FUNCTIONS
// =============================================================================

/// Validate a signature and recover the signer address.
///
/// Checks, in order:
/// 1. R is in [1, n-1] and is an x-coordinate on the curve
/// 2. S is in [1, n-1]
/// 3. S is in the lower half of the order (EIP-2)
/// 4. v is a valid recovery id and recovery succeeds
pub fn verify_ecdsa(message_hash: &Hash, signature: &EcdsaSignature) -> VerificationResult {
    if !is_valid_scalar(&signature.r) || !is_valid_r_coordinate(&signature.r) {
        return VerificationResult::invalid(SignatureError::InvalidFormat);
    }
    if !is_valid_scalar(&signature.s) {
        return VerificationResult::invalid(SignatureError::InvalidFormat);
    }
    if !is_low_s(&signature.s) {
        return VerificationResult::invalid(SignatureError::MalleableSignature);
    }

    match recover_address(message_hash, signature) {
        Ok(address) => VerificationResult::valid(address),
        Err(e) => VerificationResult::invalid(e),
    }
}

/// Verify a signature and check that the recovered signer matches `expected`.
pub fn verify_ecdsa_signer(
    message_hash: &Hash,
    signature: &EcdsaSignature,
    expected: Address,
) -> VerificationResult {
    let result = verify_ecdsa(message_hash, signature);

    match result.recovered_address {
        Some(recovered) if recovered != expected => {
            VerificationResult::invalid(SignatureError::SignerMismatch {
                expected,
                actual: recovered,
            })
        }
        _ => result,
    }
}

/// Recover the signer's address without the range and malleability checks.
///
/// Callers that accept untrusted signatures go through [`verify_ecdsa`].
pub fn recover_address(
    message_hash: &Hash,
    signature: &EcdsaSignature,
) -> Result<Address, SignatureError> {
    use zeroize::Zeroize;

    let recovery_id = parse_recovery_id(signature.v)?;

    let mut sig_bytes = [0u8; 64];
    sig_bytes[..32].copy_from_slice(&signature.r);
    sig_bytes[32..].copy_from_slice(&signature.s);
    let parsed = Signature::from_slice(&sig_bytes);
    sig_bytes.zeroize();
    let sig = parsed.map_err(|_| SignatureError::InvalidFormat)?;

    let recovered_key = VerifyingKey::recover_from_prehash(message_hash, &sig, recovery_id)
        .map_err(|_| SignatureError::RecoveryFailed)?;

    Ok(address_from_pubkey(&recovered_key))
}

/// Verify many signatures in parallel. Results keep input order.
pub fn batch_verify_ecdsa(requests: &[VerificationRequest]) -> BatchVerificationResult {
    use rayon::prelude::*;

    let results: Vec<VerificationResult> = requests
        .par_iter()
        .map(|req| match req.expected_signer {
            Some(expected) => verify_ecdsa_signer(&req.message_hash, &req.signature, expected),
            None => verify_ecdsa(&req.message_hash, &req.signature),
        })
        .collect();

    let batch = BatchVerificationResult::from_results(results);
    tracing::debug!(
        total = requests.len(),
        valid = batch.valid_count,
        "batch signature verification"
    );
    batch
}

// =============================================================================
// HASHING
// =============================================================================

/// Keccak256 hash function.
pub fn keccak256(data: &[u8]) -> Hash {
    Keccak256::digest(data).into()
}

/// Digest a node signs to endorse a 32-byte payload (personal-sign envelope).
pub fn eth_signed_message_hash(payload: &Hash) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(PERSONAL_SIGN_PREFIX);
    hasher.update(payload);
    hasher.finalize().into()
}

/// Derive an Ethereum-style address from a public key.
pub fn address_from_pubkey(public_key: &VerifyingKey) -> Address {
    let encoded = public_key.to_encoded_point(false);
    // Skip the 0x04 uncompressed-point tag
    let hash = keccak256(&encoded.as_bytes()[1..]);

    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    address
}

// =============================================================================
// SCALAR CHECKS
// =============================================================================

/// Constant-time big-endian `a < b`.
fn ct_less_than(a: &[u8; 32], b: &[u8; 32]) -> Choice {
    let mut less = Choice::from(0u8);
    let mut greater = Choice::from(0u8);

    for (x, y) in a.iter().zip(b.iter()) {
        let undecided = !(less | greater);
        less |= undecided & Choice::from((x < y) as u8);
        greater |= undecided & Choice::from((x > y) as u8);
    }

    less
}

/// EIP-2: S must be at most n/2.
fn is_low_s(s: &[u8; 32]) -> bool {
    (!ct_less_than(&SECP256K1_HALF_ORDER, s)).into()
}

/// Scalar must be in [1, n-1].
fn is_valid_scalar(scalar: &[u8; 32]) -> bool {
    let mut is_zero = Choice::from(1u8);
    for byte in scalar {
        is_zero &= byte.ct_eq(&0u8);
    }

    (!is_zero & ct_less_than(scalar, &SECP256K1_ORDER)).into()
}

/// R must be the x-coordinate of a curve point; roughly half of all field
/// elements are not.
fn is_valid_r_coordinate(r: &[u8; 32]) -> bool {
    let mut compressed = [0u8; 33];
    compressed[0] = 0x02;
    compressed[1..].copy_from_slice(r);

    match EncodedPoint::from_bytes(compressed) {
        Ok(encoded) => AffinePoint::from_encoded_point(&encoded).is_some().into(),
        Err(_) => false,
    }
}

/// Valid v values: 0, 1, 27, 28
fn parse_recovery_id(v: u8) -> Result<RecoveryId, SignatureError> {
    let id = match v {
        0 | 27 => 0,
        1 | 28 => 1,
        _ => return Err(SignatureError::InvalidRecoveryId(v)),
    };

    RecoveryId::try_from(id).map_err(|_| SignatureError::InvalidRecoveryId(v))
}

/// s' = n - s, the malleable twin of a signature's S.
pub fn invert_s(s: &[u8; 32]) -> [u8; 32] {
    let mut result = [0u8; 32];
    let mut borrow: i32 = 0;

    for i in (0..32).rev() {
        let diff = (SECP256K1_ORDER[i] as i32) - (s[i] as i32) - borrow;
        borrow = (diff < 0) as i32;
        result[i] = (diff + 256 * borrow) as u8;
    }

    result
}

// =============================================================================
// TEST HELPERS
// =============================================================================

/// Keypair and signing helpers for tests across the workspace.
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use super::*;
    use k256::ecdsa::SigningKey;

    /// A reporting node's key material.
    pub struct TestNode {
        /// Signing key.
        pub key: SigningKey,
        /// Address derived from the key.
        pub address: Address,
    }

    impl TestNode {
        /// Deterministic node from a one-byte seed (`1..=254`).
        pub fn from_seed(seed: u8) -> Self {
            let key = SigningKey::from_slice(&[seed; 32]).expect("seed must be in 1..=254");
            let address = address_from_pubkey(key.verifying_key());
            Self { key, address }
        }

        /// Fresh random node.
        pub fn random() -> Self {
            let (key, verifying) = generate_keypair();
            Self {
                address: address_from_pubkey(&verifying),
                key,
            }
        }

        /// Sign a payload the way node tooling does (personal-sign envelope).
        pub fn sign_payload(&self, payload: &Hash) -> EcdsaSignature {
            sign(&eth_signed_message_hash(payload), &self.key)
        }
    }

    /// Generate a new ECDSA keypair.
    pub fn generate_keypair() -> (SigningKey, VerifyingKey) {
        let signing_key = SigningKey::random(&mut rand::thread_rng());
        let verifying_key = *signing_key.verifying_key();
        (signing_key, verifying_key)
    }

    /// Sign a digest, normalising S to the low half.
    pub fn sign(message_hash: &Hash, private_key: &SigningKey) -> EcdsaSignature {
        let (sig, recid) = private_key
            .sign_prehash_recoverable(message_hash)
            .expect("signing failed");

        let sig_bytes = sig.to_bytes();
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&sig_bytes[..32]);
        s.copy_from_slice(&sig_bytes[32..]);

        // Inverting S flips the parity of the recovered point
        let mut parity = recid.to_byte() & 1;
        if !is_low_s(&s) {
            s = invert_s(&s);
            parity ^= 1;
        }

        EcdsaSignature { r, s, v: 27 + parity }
    }
}
