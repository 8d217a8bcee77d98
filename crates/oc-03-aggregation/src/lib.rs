//! # OC-03 Aggregation
//!
//! Folds the reports accepted for a request into one final value and decides
//! when enough reports exist to finalize.
//!
//! **Architecture:** Hexagonal (domain + algorithms + ports)
//!
//! ## Strategies
//!
//! | Kind | Tag | Oracles | Completes when | Value |
//! |------|-----|---------|----------------|-------|
//! | `PassThrough` | 1 | exactly 1 | first report | that report |
//! | `Mean` | 2 | 1..=N | every oracle reported | floor of the arithmetic mean |
//!
//! The set is closed: an agreement names its strategy by [`AggregatorKind`],
//! and the kind's tag is part of the agreement id.
//!
//! ## Module Structure
//!
//! ```text
//! oc-03-aggregation/
//! ├── domain/          # AggregatorKind, Admission, Finalization, errors
//! ├── algorithms/      # pass-through, overflow-safe mean accumulator
//! └── ports/           # AggregationStrategy trait
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algorithms;
pub mod domain;
pub mod ports;

pub use algorithms::{MeanAccumulator, MeanAggregator, PassThroughAggregator};
pub use domain::{Admission, AggregationError, AggregatorKind, Finalization};
pub use ports::AggregationStrategy;
