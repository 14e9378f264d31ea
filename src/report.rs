//! Multi-run aggregation and comparison reporting
//!
//! Folds per-run metrics across topologies into mean/min/max summaries,
//! declares per-metric winners, renders the comparison table, and exports
//! the whole record set as CSV for offline analysis.

use crate::eval::RunMetrics;
use crate::registry::QueryCase;
use crate::topology::TopologyKind;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Accuracy spreads under this many percentage points are a tie
pub const ACCURACY_TIE_THRESHOLD: f64 = 5.0;
/// Mean-hop spreads under this are a tie
pub const HOPS_TIE_THRESHOLD: f64 = 0.25;

/// All runs of one topology, in run order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopologyRuns {
    pub topology: TopologyKind,
    pub runs: Vec<RunMetrics>,
}

/// Mean/min/max of one metric across runs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

impl MetricSummary {
    fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self {
                mean: 0.0,
                min: 0.0,
                max: 0.0,
            };
        }
        let sum: f64 = values.iter().sum();
        let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        Self {
            mean: sum / values.len() as f64,
            min,
            max,
        }
    }
}

/// Per-topology aggregate across runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopologySummary {
    pub topology: TopologyKind,
    pub accuracy: MetricSummary,
    pub latency: MetricSummary,
    pub hops: MetricSummary,
    pub runs: Vec<RunMetrics>,
}

/// Winner of one metric across topologies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Winner {
    Topology(TopologyKind),
    Tie,
}

impl std::fmt::Display for Winner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Winner::Topology(kind) => f.write_str(kind.label()),
            Winner::Tie => f.write_str("Tie"),
        }
    }
}

/// The full comparison artifact across N topologies and M runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub topologies: Vec<TopologySummary>,
    pub accuracy_winner: Winner,
    pub latency_winner: Winner,
    pub hops_winner: Winner,
}

/// Aggregate per-run metrics into a comparison report
pub fn aggregate(per_topology: Vec<TopologyRuns>) -> ComparisonReport {
    let topologies: Vec<TopologySummary> = per_topology
        .into_iter()
        .map(|t| {
            let accuracies: Vec<f64> = t.runs.iter().map(|r| r.accuracy).collect();
            let latencies: Vec<f64> = t.runs.iter().map(|r| r.avg_latency).collect();
            let hops: Vec<f64> = t.runs.iter().map(|r| r.avg_hops).collect();
            TopologySummary {
                topology: t.topology,
                accuracy: MetricSummary::from_values(&accuracies),
                latency: MetricSummary::from_values(&latencies),
                hops: MetricSummary::from_values(&hops),
                runs: t.runs,
            }
        })
        .collect();

    let accuracy_winner = pick_winner(
        &topologies,
        |s| s.accuracy.mean,
        Direction::HigherWins,
        Some(ACCURACY_TIE_THRESHOLD),
    );
    let latency_winner = pick_winner(&topologies, |s| s.latency.mean, Direction::LowerWins, None);
    let hops_winner = pick_winner(
        &topologies,
        |s| s.hops.mean,
        Direction::LowerWins,
        Some(HOPS_TIE_THRESHOLD),
    );

    ComparisonReport {
        topologies,
        accuracy_winner,
        latency_winner,
        hops_winner,
    }
}

enum Direction {
    HigherWins,
    LowerWins,
}

fn pick_winner<F>(
    topologies: &[TopologySummary],
    metric: F,
    direction: Direction,
    tie_threshold: Option<f64>,
) -> Winner
where
    F: Fn(&TopologySummary) -> f64,
{
    let Some(first) = topologies.first() else {
        return Winner::Tie;
    };
    if topologies.len() == 1 {
        return Winner::Topology(first.topology);
    }

    let better = |a: f64, b: f64| match direction {
        Direction::HigherWins => a > b,
        Direction::LowerWins => a < b,
    };

    let mut best = first;
    for candidate in &topologies[1..] {
        if better(metric(candidate), metric(best)) {
            best = candidate;
        }
    }

    if let Some(threshold) = tie_threshold {
        let runner_up = topologies
            .iter()
            .filter(|t| t.topology != best.topology)
            .map(|t| metric(t))
            .fold(None::<f64>, |acc, v| match acc {
                Some(current) if better(current, v) => Some(current),
                _ => Some(v),
            });
        if let Some(runner_up) = runner_up {
            if (metric(best) - runner_up).abs() < threshold {
                return Winner::Tie;
            }
        }
    }

    Winner::Topology(best.topology)
}

impl ComparisonReport {
    /// Render the multi-run comparison table
    pub fn render(&self) -> String {
        let mut out = String::new();
        let rule = "=".repeat(100);
        let thin = "-".repeat(100);

        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out, "  MULTI-RUN COMPARISON");
        let _ = writeln!(out, "{rule}");
        let _ = writeln!(
            out,
            "{:<14} {:<6} {:<20} {:<14} {:<8}",
            "Topology", "Run", "Accuracy", "Latency", "Hops"
        );
        let _ = writeln!(out, "{thin}");

        for summary in &self.topologies {
            for (i, run) in summary.runs.iter().enumerate() {
                let _ = writeln!(
                    out,
                    "{:<14} {:<6} {:<20} {:<14} {:<8}",
                    summary.topology.label(),
                    i + 1,
                    format!(
                        "{:.1}% ({}/{})",
                        run.accuracy, run.correct_count, run.total_count
                    ),
                    format!("{:.2}s", run.avg_latency),
                    format!("{:.1}", run.avg_hops),
                );
            }
        }

        let _ = writeln!(out, "{thin}");
        let _ = writeln!(out, "STATISTICS");
        for summary in &self.topologies {
            let _ = writeln!(
                out,
                "{:<14} accuracy avg:{:.1} min:{:.1} max:{:.1} | latency avg:{:.2} min:{:.2} max:{:.2} | hops avg:{:.1} min:{:.1} max:{:.1}",
                summary.topology.label(),
                summary.accuracy.mean,
                summary.accuracy.min,
                summary.accuracy.max,
                summary.latency.mean,
                summary.latency.min,
                summary.latency.max,
                summary.hops.mean,
                summary.hops.min,
                summary.hops.max,
            );
        }

        let _ = writeln!(out, "{thin}");
        let _ = writeln!(out, "WINNERS");
        let _ = writeln!(out, "  Accuracy: {}", self.accuracy_winner);
        let _ = writeln!(out, "  Latency: {}", self.latency_winner);
        let _ = writeln!(out, "  Hops: {}", self.hops_winner);
        let _ = writeln!(out, "{rule}");
        out
    }

    /// Serialize the report and fixtures as CSV
    pub fn to_csv(&self, queries: &[QueryCase]) -> String {
        let mut out = String::new();
        let total_runs = self
            .topologies
            .first()
            .map(|t| t.runs.len())
            .unwrap_or_default();

        let _ = writeln!(out, "Routing Experiment Results");
        let _ = writeln!(
            out,
            "Generated: {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        let _ = writeln!(out, "Total Queries: {}", queries.len());
        let _ = writeln!(out, "Total Runs: {total_runs}");
        let _ = writeln!(out);

        let _ = writeln!(out, "RUN SUMMARY");
        let _ = writeln!(out, "Run,Topology,Accuracy,Latency (s),Hops");
        for summary in &self.topologies {
            for (i, run) in summary.runs.iter().enumerate() {
                let _ = writeln!(
                    out,
                    "{},{},{},{:.2},{:.1}",
                    i + 1,
                    summary.topology.label(),
                    csv_field(&format!(
                        "{:.1}% ({}/{})",
                        run.accuracy, run.correct_count, run.total_count
                    )),
                    run.avg_latency,
                    run.avg_hops,
                );
            }
        }

        let _ = writeln!(out);
        let _ = writeln!(out, "STATISTICS");
        let _ = writeln!(out, "Topology,Metric,Avg,Min,Max");
        for summary in &self.topologies {
            let label = summary.topology.label();
            let _ = writeln!(
                out,
                "{label},Accuracy (%),{:.1},{:.1},{:.1}",
                summary.accuracy.mean, summary.accuracy.min, summary.accuracy.max
            );
            let _ = writeln!(
                out,
                "{label},Latency (s),{:.2},{:.2},{:.2}",
                summary.latency.mean, summary.latency.min, summary.latency.max
            );
            let _ = writeln!(
                out,
                "{label},Hops,{:.1},{:.1},{:.1}",
                summary.hops.mean, summary.hops.min, summary.hops.max
            );
        }

        let _ = writeln!(out);
        let _ = writeln!(out, "TEST QUERIES");
        let _ = writeln!(out, "Index,Query,Expected Domain");
        for (i, query) in queries.iter().enumerate() {
            let _ = writeln!(
                out,
                "{},{},{}",
                i + 1,
                csv_field(&query.text),
                csv_field(&query.expected_domain)
            );
        }

        out
    }

    /// Write the CSV artifact to disk
    pub fn export_csv(&self, queries: &[QueryCase], path: &Path) -> std::io::Result<()> {
        std::fs::write(path, self.to_csv(queries))
    }
}

/// Timestamped default path for the CSV artifact
pub fn default_output_path() -> PathBuf {
    PathBuf::from(format!(
        "experiment_results_{}.csv",
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    ))
}

fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(accuracy: f64, latency: f64, hops: f64) -> RunMetrics {
        RunMetrics {
            accuracy,
            avg_latency: latency,
            avg_hops: hops,
            correct_count: (accuracy / 10.0) as usize,
            total_count: 10,
        }
    }

    fn runs(kind: TopologyKind, values: &[(f64, f64, f64)]) -> TopologyRuns {
        TopologyRuns {
            topology: kind,
            runs: values
                .iter()
                .map(|(a, l, h)| metrics(*a, *l, *h))
                .collect(),
        }
    }

    #[test]
    fn test_metric_summary_mean_min_max() {
        let summary = MetricSummary::from_values(&[80.0, 85.0, 90.0]);
        assert!((summary.mean - 85.0).abs() < 1e-9);
        assert!((summary.min - 80.0).abs() < 1e-9);
        assert!((summary.max - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_metric_summary_empty_is_zero() {
        let summary = MetricSummary::from_values(&[]);
        assert_eq!(summary.mean, 0.0);
        assert_eq!(summary.min, 0.0);
        assert_eq!(summary.max, 0.0);
    }

    #[test]
    fn test_close_accuracy_means_declare_tie() {
        let report = aggregate(vec![
            runs(
                TopologyKind::FlatDomain,
                &[(80.0, 3.0, 1.8), (85.0, 3.1, 1.8), (90.0, 3.2, 1.8)],
            ),
            runs(
                TopologyKind::TwoLevel,
                &[(81.0, 4.0, 2.6), (84.0, 4.1, 2.6), (89.0, 4.2, 2.6)],
            ),
        ]);

        // Mean accuracy spread is well under the 5-point threshold.
        assert_eq!(report.accuracy_winner, Winner::Tie);
        assert_eq!(
            report.latency_winner,
            Winner::Topology(TopologyKind::FlatDomain)
        );
        assert_eq!(
            report.hops_winner,
            Winner::Topology(TopologyKind::FlatDomain)
        );
    }

    #[test]
    fn test_clear_accuracy_winner_declared() {
        let report = aggregate(vec![
            runs(TopologyKind::FlatDomain, &[(92.0, 3.0, 1.8)]),
            runs(TopologyKind::TwoLevel, &[(70.0, 2.0, 2.6)]),
        ]);

        assert_eq!(
            report.accuracy_winner,
            Winner::Topology(TopologyKind::FlatDomain)
        );
        assert_eq!(
            report.latency_winner,
            Winner::Topology(TopologyKind::TwoLevel)
        );
    }

    #[test]
    fn test_latency_has_no_tie_threshold() {
        let report = aggregate(vec![
            runs(TopologyKind::FlatDomain, &[(80.0, 3.001, 1.8)]),
            runs(TopologyKind::TwoLevel, &[(80.0, 3.0, 1.8)]),
        ]);

        assert_eq!(
            report.latency_winner,
            Winner::Topology(TopologyKind::TwoLevel)
        );
    }

    #[test]
    fn test_three_way_aggregation_generalizes() {
        let report = aggregate(vec![
            runs(TopologyKind::FlatDomain, &[(80.0, 3.0, 1.8)]),
            runs(TopologyKind::TwoLevel, &[(81.0, 4.0, 2.6)]),
            runs(TopologyKind::FlatLeaf, &[(95.0, 5.0, 1.9)]),
        ]);

        assert_eq!(report.topologies.len(), 3);
        assert_eq!(
            report.accuracy_winner,
            Winner::Topology(TopologyKind::FlatLeaf)
        );
        assert_eq!(
            report.latency_winner,
            Winner::Topology(TopologyKind::FlatDomain)
        );
    }

    #[test]
    fn test_single_topology_wins_every_metric() {
        let report = aggregate(vec![runs(TopologyKind::FlatDomain, &[(80.0, 3.0, 1.8)])]);
        assert_eq!(
            report.accuracy_winner,
            Winner::Topology(TopologyKind::FlatDomain)
        );
        assert_eq!(
            report.hops_winner,
            Winner::Topology(TopologyKind::FlatDomain)
        );
    }

    #[test]
    fn test_render_contains_rows_and_winners() {
        let report = aggregate(vec![
            runs(TopologyKind::FlatDomain, &[(80.0, 3.0, 1.8), (90.0, 3.2, 1.9)]),
            runs(TopologyKind::TwoLevel, &[(70.0, 4.0, 2.6), (72.0, 4.1, 2.7)]),
        ]);
        let table = report.render();

        assert!(table.contains("MULTI-RUN COMPARISON"));
        assert!(table.contains("flat-domain"));
        assert!(table.contains("two-level"));
        assert!(table.contains("STATISTICS"));
        assert!(table.contains("WINNERS"));
        assert!(table.contains("Accuracy: flat-domain"));
    }

    #[test]
    fn test_csv_sections_and_quoting() {
        let report = aggregate(vec![runs(TopologyKind::FlatDomain, &[(80.0, 3.0, 1.8)])]);
        let queries = vec![QueryCase {
            text: "Hello, I need a \"special\" refund".to_string(),
            expected_domain: "customer_service".to_string(),
        }];
        let csv = report.to_csv(&queries);

        assert!(csv.contains("RUN SUMMARY"));
        assert!(csv.contains("STATISTICS"));
        assert!(csv.contains("TEST QUERIES"));
        assert!(csv.contains("\"Hello, I need a \"\"special\"\" refund\""));
        assert!(csv.contains("Total Runs: 1"));
    }

    #[test]
    fn test_default_output_path_is_timestamped_csv() {
        let path = default_output_path();
        let name = path.to_string_lossy();
        assert!(name.starts_with("experiment_results_"));
        assert!(name.ends_with(".csv"));
    }
}
