//! # Core Domain Entities
//!
//! Identifiers and value types that cross subsystem boundaries.
//!
//! ## Clusters
//!
//! - **Primitives**: `Hash`, `Address`, `U256`
//! - **Identifiers**: `AgreementId`, `RequestId`
//! - **Reporting**: `Report`

use serde::{Deserialize, Serialize};
use std::fmt;

// Re-export U256 from primitive-types for use across all subsystems
pub use primitive_types::U256;

/// A 32-byte keccak256 digest.
pub type Hash = [u8; 32];

/// A 20-byte Ethereum-style address.
pub type Address = [u8; 20];

/// The all-zero address. Never a valid node or account.
pub const ZERO_ADDRESS: Address = [0u8; 20];

/// Format an address as `0x`-prefixed lowercase hex.
pub fn format_address(address: &Address) -> String {
    format!("0x{}", hex::encode(address))
}

/// Parse a `0x`-prefixed (or bare) hex string into an address.
pub fn parse_address(input: &str) -> Option<Address> {
    let trimmed = input.strip_prefix("0x").unwrap_or(input);
    let bytes = hex::decode(trimmed).ok()?;
    bytes.try_into().ok()
}

macro_rules! digest_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
        pub struct $name(pub Hash);

        impl $name {
            /// Raw digest bytes.
            pub fn as_bytes(&self) -> &Hash {
                &self.0
            }

            /// `0x`-prefixed lowercase hex.
            pub fn to_hex(&self) -> String {
                format!("0x{}", hex::encode(self.0))
            }
        }

        impl From<Hash> for $name {
            fn from(hash: Hash) -> Self {
                Self(hash)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({}…)", stringify!($name), &self.to_hex()[..10])
            }
        }
    };
}

digest_id! {
    /// Content-addressed identifier of a service agreement.
    AgreementId
}

digest_id! {
    /// Identifier of a single data request opened against an agreement.
    RequestId
}

/// A node's accepted answer to a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Request this report answers.
    pub request_id: RequestId,
    /// Reporting node.
    pub node: Address,
    /// Reported value.
    pub value: U256,
    /// 1-based rank among accepted reports for the request.
    pub received_order: u32,
}
