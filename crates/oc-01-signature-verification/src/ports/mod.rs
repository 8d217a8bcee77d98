//! # Ports Layer
//!
//! Inbound API of the signature verification subsystem.

pub mod inbound;
