//! Session service trait and boundary types

use crate::topology::DispatchNode;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// One author-tagged output event from the completion service
///
/// Each event is attributable to the node that produced it and carries zero
/// or more text segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputEvent {
    pub author: String,
    pub segments: Vec<String>,
}

impl OutputEvent {
    /// Create an event with a single text segment
    pub fn text<A: Into<String>, S: Into<String>>(author: A, segment: S) -> Self {
        Self {
            author: author.into(),
            segments: vec![segment.into()],
        }
    }

    /// Create an event with no text segments
    pub fn silent<S: Into<String>>(author: S) -> Self {
        Self {
            author: author.into(),
            segments: Vec::new(),
        }
    }
}

/// Session and user identifiers sent with every submission
///
/// Every concurrent execution gets a distinct session identifier so that
/// per-session state inside the service cannot leak between queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionContext {
    pub session_id: String,
    pub user_id: String,
}

impl SessionContext {
    /// Create a context with a fresh session identifier
    pub fn new() -> Self {
        Self::for_user("routebench_user")
    }

    pub fn for_user<S: Into<String>>(user_id: S) -> Self {
        Self {
            session_id: format!("session_{}", Uuid::new_v4()),
            user_id: user_id.into(),
        }
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Completion service errors
#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    #[error("Service not configured: {0}")]
    NotConfigured(String),
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("API error: {0}")]
    ApiError(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Request failed: {0}")]
    RequestFailed(String),
}

/// Capability boundary around the external completion service
///
/// One operation: drive `query` through the delegation tree rooted at `root`
/// under the given session, returning the ordered author-tagged output
/// events. The caller never sees how the service decides where to delegate.
#[async_trait]
pub trait SessionService: Send + Sync {
    /// Service name for logs (e.g. "gemini", "scripted")
    fn name(&self) -> &str;

    /// Submit one conversation turn and collect all resulting output events
    async fn submit(
        &self,
        root: &DispatchNode,
        session: &SessionContext,
        query: &str,
    ) -> Result<Vec<OutputEvent>, ServiceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_event_constructors() {
        let event = OutputEvent::text("finance_agent", "[ROUTED_TO: finance_agent] Done.");
        assert_eq!(event.author, "finance_agent");
        assert_eq!(event.segments.len(), 1);

        let silent = OutputEvent::silent("central_coordinator");
        assert!(silent.segments.is_empty());
    }

    #[test]
    fn test_session_contexts_are_distinct() {
        let a = SessionContext::new();
        let b = SessionContext::new();
        assert_ne!(a.session_id, b.session_id);
        assert_eq!(a.user_id, b.user_id);
    }

    #[test]
    fn test_service_error_display() {
        let errors = vec![
            ServiceError::NotConfigured("test".to_string()),
            ServiceError::NetworkError("test".to_string()),
            ServiceError::ApiError("test".to_string()),
            ServiceError::InvalidResponse("test".to_string()),
            ServiceError::RequestFailed("test".to_string()),
        ];

        for error in errors {
            assert!(!error.to_string().is_empty());
        }
    }
}
