//! # Signature Verification Subsystem (OC-01)
//!
//! Recovers the identity of a reporting node from a digest and a
//! secp256k1 signature. Pure functions, no state.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): Pure cryptographic logic, no I/O
//! - **Ports Layer** (`ports/`): `SignatureVerificationApi`, the seam the
//!   agreement registry depends on
//!
//! ## Security Notes
//!
//! - **Malleability Prevention (EIP-2)**: Signatures with high S values are rejected
//! - **Personal-sign digests**: nodes sign `eth_signed_message_hash(agreement_id)`,
//!   never the raw id, so an agreement signature cannot double as a transaction signature

pub mod domain;
pub mod ports;

// Re-export public API
pub use domain::ecdsa::{
    address_from_pubkey, batch_verify_ecdsa, eth_signed_message_hash, keccak256, recover_address,
    verify_ecdsa, verify_ecdsa_signer, EcdsaVerifier,
};
pub use domain::entities::{
    BatchVerificationResult, EcdsaSignature, VerificationRequest, VerificationResult,
};
pub use domain::errors::SignatureError;
pub use ports::inbound::SignatureVerificationApi;

#[cfg(any(test, feature = "test-helpers"))]
pub use domain::ecdsa::test_helpers;
