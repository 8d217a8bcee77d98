//! # Domain Layer
//!
//! Pure cryptographic logic for node signature recovery.

pub mod ecdsa;
pub mod entities;
pub mod errors;
