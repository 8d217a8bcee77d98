//! # Error Types
//!
//! The error taxonomy every subsystem maps its errors onto.

use std::fmt;

/// Coarse classification of a rejected operation.
///
/// Every category rejects the operation before any state is mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Malformed, unsigned or expired input.
    Validation,
    /// Unknown reporting node or signature mismatch.
    Authorization,
    /// Duplicate report or already-fulfilled request.
    StateConflict,
    /// Insufficient payment or balance, payment-split anomaly.
    Accounting,
    /// Failure of an external collaborator (value-transfer ledger).
    External,
}

impl ErrorCategory {
    /// Stable lowercase label, used as a metrics label value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Authorization => "authorization",
            Self::StateConflict => "state_conflict",
            Self::Accounting => "accounting",
            Self::External => "external",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that know their place in the taxonomy.
pub trait Categorized {
    /// The category this error belongs to.
    fn category(&self) -> ErrorCategory;
}
