//! # Shared Types Crate
//!
//! Types shared by every coordinator subsystem.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: identifiers and primitive aliases used across
//!   subsystem boundaries are defined here and nowhere else.
//! - **Content-addressed identity**: `AgreementId` and `RequestId` are opaque
//!   32-byte digests; only the owning subsystem knows how to derive them.
//! - **One error taxonomy**: every subsystem error maps onto [`ErrorCategory`].

pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::*;
