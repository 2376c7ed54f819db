//! Analysis modules.
//!
//! Aggregation of fetched hit records into chartable series.

pub mod aggregator;

pub use aggregator::*;
