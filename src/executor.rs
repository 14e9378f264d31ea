//! Dispatch execution
//!
//! Drives single requests through a delegation tree via the completion
//! service and collects ordered traces. Batches run sequentially or with
//! bounded concurrency; results always come back in submission order, and a
//! slow or failed query never blocks the rest of its batch.

use crate::completion::{SessionContext, SessionService};
use crate::marker;
use crate::registry::QueryCase;
use crate::topology::DispatchNode;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Ordered record of one request's walk through a topology
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchTrace {
    /// Node identifiers in visitation order, one entry per output event
    pub visited: Vec<String>,
    /// All text segments concatenated in event order
    pub response_text: String,
}

impl DispatchTrace {
    /// Number of distinct nodes that participated
    pub fn distinct_count(&self) -> usize {
        self.visited.iter().collect::<HashSet<_>>().len()
    }
}

/// Outcome of dispatching one query through one topology
#[derive(Debug, Clone)]
pub struct RoutingResult {
    pub query: String,
    pub expected_domain: String,
    /// Resolved identifier, or `"unknown"`
    pub routed_to: String,
    pub trace: DispatchTrace,
    /// Count of distinct node identifiers in the trace
    pub hop_count: usize,
    /// Wall-clock time for the full dispatch
    pub latency: Duration,
    /// Set when the query hard-failed (transport error or timeout)
    pub failure: Option<String>,
}

impl RoutingResult {
    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }

    fn failed(case: &QueryCase, latency: Duration, reason: String) -> Self {
        Self {
            query: case.text.clone(),
            expected_domain: case.expected_domain.clone(),
            routed_to: marker::UNKNOWN.to_string(),
            trace: DispatchTrace::default(),
            hop_count: 0,
            latency,
            failure: Some(reason),
        }
    }
}

/// Drives queries through a topology via the completion service
pub struct DispatchExecutor {
    service: Arc<dyn SessionService>,
    query_timeout: Duration,
    concurrency: usize,
}

impl DispatchExecutor {
    pub fn new(service: Arc<dyn SessionService>, query_timeout: Duration) -> Self {
        Self {
            service,
            query_timeout,
            concurrency: 1,
        }
    }

    /// Set the number of in-flight queries for batch execution
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Dispatch one query through the tree
    ///
    /// Never returns an error: transport failures and timeouts become failed
    /// results so a batch can always be scored in full.
    pub async fn execute(&self, root: &DispatchNode, case: &QueryCase) -> RoutingResult {
        // Fresh session per execution so concurrent queries cannot share
        // conversation state inside the service.
        let session = SessionContext::new();
        info!(
            session_id = %session.session_id,
            query = %case.text,
            "executing query"
        );

        let started = Instant::now();
        let outcome = tokio::time::timeout(
            self.query_timeout,
            self.service.submit(root, &session, &case.text),
        )
        .await;
        let latency = started.elapsed();

        let events = match outcome {
            Err(_) => {
                warn!(
                    query = %case.text,
                    timeout_secs = self.query_timeout.as_secs(),
                    "query timed out"
                );
                return RoutingResult::failed(
                    case,
                    latency,
                    format!("timed out after {}s", self.query_timeout.as_secs()),
                );
            }
            Ok(Err(e)) => {
                warn!(query = %case.text, error = %e, "query failed");
                return RoutingResult::failed(case, latency, e.to_string());
            }
            Ok(Ok(events)) => events,
        };

        let mut visited = Vec::with_capacity(events.len());
        let mut response_text = String::new();
        for event in events {
            visited.push(event.author);
            for segment in event.segments {
                response_text.push_str(&segment);
                response_text.push('\n');
            }
        }

        let trace = DispatchTrace {
            visited,
            response_text,
        };
        let routed_to = marker::parse(&trace.response_text, &trace.visited);
        let hop_count = trace.distinct_count();

        info!(
            query = %case.text,
            routed_to = %routed_to,
            hops = hop_count,
            latency_secs = latency.as_secs_f64(),
            "query completed"
        );

        RoutingResult {
            query: case.text.clone(),
            expected_domain: case.expected_domain.clone(),
            routed_to,
            trace,
            hop_count,
            latency,
            failure: None,
        }
    }

    /// Dispatch a batch of queries, preserving submission order in the output
    ///
    /// With concurrency above 1, up to that many queries are in flight at
    /// once; ordered buffering re-sequences completions so results line up
    /// with the input regardless of arrival order.
    pub async fn run_batch(&self, root: &DispatchNode, cases: &[QueryCase]) -> Vec<RoutingResult> {
        stream::iter(cases.iter())
            .map(|case| self.execute(root, case))
            .buffered(self.concurrency)
            .collect()
            .await
    }
}
