//! # Integration Tests
//!
//! Full request lifecycles driven through the public coordinator API and the
//! in-memory token ledger.

pub mod flows;
