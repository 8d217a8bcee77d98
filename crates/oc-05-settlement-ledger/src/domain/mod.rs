//! # Domain Layer

pub mod entities;
pub mod errors;

pub use entities::{AccountBalance, Distribution, Payout};
pub use errors::{BalanceKind, SettlementError};
