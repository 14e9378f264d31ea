//! Mock implementations for testing
//!
//! Provides a scripted [`SessionService`] with fixed responses per query,
//! optional injected failures and delays, and a record of every session
//! context it was called with.

use crate::completion::{OutputEvent, ServiceError, SessionContext, SessionService};
use crate::topology::DispatchNode;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Deterministic scripted completion service
#[derive(Debug, Default)]
pub struct ScriptedService {
    scripts: HashMap<String, Vec<OutputEvent>>,
    default_events: Vec<OutputEvent>,
    failing_queries: HashSet<String>,
    delay: Option<Duration>,
    query_delays: HashMap<String, Duration>,
    seen_sessions: Arc<Mutex<Vec<SessionContext>>>,
}

impl ScriptedService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script full output events for a query
    pub fn with_events(mut self, query: &str, events: Vec<OutputEvent>) -> Self {
        self.scripts.insert(query.to_string(), events);
        self
    }

    /// Script a two-event coordinator-then-leaf response for a query
    pub fn with_route(mut self, query: &str, coordinator: &str, leaf: &str) -> Self {
        self.scripts.insert(
            query.to_string(),
            vec![
                OutputEvent::silent(coordinator),
                OutputEvent::text(
                    leaf.to_string(),
                    format!("[ROUTED_TO: {leaf}] Handling the request."),
                ),
            ],
        );
        self
    }

    /// Events returned for queries with no script
    pub fn with_default_events(mut self, events: Vec<OutputEvent>) -> Self {
        self.default_events = events;
        self
    }

    /// Make a query fail with a transport error
    pub fn with_failure(mut self, query: &str) -> Self {
        self.failing_queries.insert(query.to_string());
        self
    }

    /// Delay every submission, for timeout and concurrency tests
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Delay one specific query, overriding the global delay
    pub fn with_query_delay(mut self, query: &str, delay: Duration) -> Self {
        self.query_delays.insert(query.to_string(), delay);
        self
    }

    /// Session contexts seen so far, in call order
    pub async fn seen_sessions(&self) -> Vec<SessionContext> {
        self.seen_sessions.lock().await.clone()
    }
}

#[async_trait]
impl SessionService for ScriptedService {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn submit(
        &self,
        _root: &DispatchNode,
        session: &SessionContext,
        query: &str,
    ) -> Result<Vec<OutputEvent>, ServiceError> {
        self.seen_sessions.lock().await.push(session.clone());

        let delay = self.query_delays.get(query).copied().or(self.delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing_queries.contains(query) {
            return Err(ServiceError::NetworkError(
                "scripted transport failure".to_string(),
            ));
        }

        Ok(self
            .scripts
            .get(query)
            .cloned()
            .unwrap_or_else(|| self.default_events.clone()))
    }
}
