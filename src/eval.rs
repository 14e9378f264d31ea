//! Per-run evaluation
//!
//! Scores routed-to identifiers against expected domains and folds a batch
//! of routing results into one set of run metrics.

use crate::executor::RoutingResult;
use serde::{Deserialize, Serialize};

/// Whether a routed-to identifier lands in the expected domain
///
/// Correct iff `routed_to` equals the domain exactly, or starts with the
/// domain immediately followed by `_`. The match is domain-level on purpose:
/// `finance_escrow` counts for `finance` even if no such leaf exists, while
/// `financehandler` does not (no underscore boundary).
pub fn is_correct(routed_to: &str, expected_domain: &str) -> bool {
    if routed_to == expected_domain {
        return true;
    }
    routed_to
        .strip_prefix(expected_domain)
        .is_some_and(|rest| rest.starts_with('_'))
}

/// Summary metrics for one (topology, run) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetrics {
    /// Percentage of correctly routed queries
    pub accuracy: f64,
    /// Mean wall-clock seconds per query
    pub avg_latency: f64,
    /// Mean distinct-node hop count per query
    pub avg_hops: f64,
    pub correct_count: usize,
    pub total_count: usize,
}

impl RunMetrics {
    pub fn zero() -> Self {
        Self {
            accuracy: 0.0,
            avg_latency: 0.0,
            avg_hops: 0.0,
            correct_count: 0,
            total_count: 0,
        }
    }
}

/// Aggregate a batch of results into run metrics
///
/// Failed queries stay in the denominator; an empty batch yields all-zero
/// metrics rather than a division error.
pub fn summarize(results: &[RoutingResult]) -> RunMetrics {
    let total = results.len();
    if total == 0 {
        return RunMetrics::zero();
    }

    let correct = results
        .iter()
        .filter(|r| is_correct(&r.routed_to, &r.expected_domain))
        .count();
    let latency_sum: f64 = results.iter().map(|r| r.latency.as_secs_f64()).sum();
    let hops_sum: usize = results.iter().map(|r| r.hop_count).sum();

    RunMetrics {
        accuracy: correct as f64 / total as f64 * 100.0,
        avg_latency: latency_sum / total as f64,
        avg_hops: hops_sum as f64 / total as f64,
        correct_count: correct,
        total_count: total,
    }
}
