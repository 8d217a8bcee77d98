//! # Signature Errors
//!
//! Error types for signature recovery operations.

use shared_types::{Address, Categorized, ErrorCategory};
use thiserror::Error;

/// Errors that can occur during signature recovery.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignatureError {
    /// The signature format is invalid (wrong length, scalar out of range)
    #[error("Invalid signature format")]
    InvalidFormat,

    /// Signature has high S value (EIP-2 malleability protection)
    #[error("Malleable signature (high S value)")]
    MalleableSignature,

    /// Invalid recovery ID (v must be 0, 1, 27, or 28)
    #[error("Invalid recovery ID: {0}")]
    InvalidRecoveryId(u8),

    /// Failed to recover public key from signature
    #[error("Failed to recover public key")]
    RecoveryFailed,

    /// Recovered signer does not match expected signer
    #[error("Signer mismatch: expected {expected:?}, got {actual:?}")]
    SignerMismatch { expected: Address, actual: Address },
}

impl Categorized for SignatureError {
    fn category(&self) -> ErrorCategory {
        match self {
            Self::SignerMismatch { .. } => ErrorCategory::Authorization,
            _ => ErrorCategory::Validation,
        }
    }
}
