//! # Algorithms Module

pub mod payment_split;

pub use payment_split::{rank_weight, split_payment, PaymentSplit};
