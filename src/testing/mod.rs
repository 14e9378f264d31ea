//! Testing utilities and mock implementations
//!
//! Provides a deterministic scripted completion service so the executor,
//! evaluator, and aggregator can be tested without live model calls.

pub mod mocks;

pub use mocks::*;
