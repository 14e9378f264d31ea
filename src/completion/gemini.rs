//! Gemini session service
//!
//! Production implementation of [`SessionService`] against the Gemini
//! `generateContent` API. The client walks the delegation tree: at each
//! dispatcher it submits the node's rendered instruction plus the
//! conversation so far, reads the model's reply, resolves the chosen child by
//! scanning the reply for a child identifier, and descends until a leaf
//! answers, a dispatcher answers in place, or the depth cap is reached.

use crate::completion::service::{OutputEvent, ServiceError, SessionContext, SessionService};
use crate::topology::DispatchNode;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Gemini service configuration
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
    /// Maximum delegation depth per submission
    pub max_depth: usize,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gemini-2.5-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            timeout: Duration::from_secs(60),
            max_depth: 4,
        }
    }
}

/// Gemini session service implementation
pub struct GeminiService {
    config: GeminiConfig,
    client: Client,
}

impl GeminiService {
    /// Create a new Gemini service
    pub fn new(config: GeminiConfig) -> Result<Self, ServiceError> {
        if config.api_key.is_empty() {
            return Err(ServiceError::NotConfigured(
                "Gemini API key is required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ServiceError::NetworkError(e.to_string()))?;

        Ok(Self { config, client })
    }

    /// One completion call for a single node
    async fn complete_node(
        &self,
        instruction: &str,
        turns: &[GeminiContent],
    ) -> Result<String, ServiceError> {
        let request = GeminiRequest {
            system_instruction: GeminiInstruction {
                parts: vec![GeminiPart {
                    text: instruction.to_string(),
                }],
            },
            contents: turns.to_vec(),
        };

        let response = self
            .client
            .post(format!(
                "{}/models/{}:generateContent",
                self.config.base_url, self.config.model
            ))
            .header("x-goog-api-key", &self.config.api_key)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| ServiceError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ServiceError::ApiError(format!(
                "Gemini API error: {status} - {error_text}"
            )));
        }

        let gemini_response: GeminiResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::RequestFailed(e.to_string()))?;

        let candidate = gemini_response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| {
                ServiceError::InvalidResponse("no candidates returned from Gemini".to_string())
            })?;

        let text = candidate
            .content
            .parts
            .into_iter()
            .map(|p| p.text)
            .collect::<Vec<_>>()
            .join("");

        Ok(text)
    }

    /// Resolve which child the dispatcher's reply delegated to
    ///
    /// The longest child identifier found in the reply wins, so
    /// `finance_banking` is not shadowed by a domain node named `finance`.
    /// No match means the dispatcher answered in place.
    fn resolve_child<'a>(node: &'a DispatchNode, reply: &str) -> Option<&'a DispatchNode> {
        node.children
            .iter()
            .filter(|child| reply.contains(&child.identifier))
            .max_by_key(|child| child.identifier.len())
    }
}

#[async_trait]
impl SessionService for GeminiService {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn submit(
        &self,
        root: &DispatchNode,
        session: &SessionContext,
        query: &str,
    ) -> Result<Vec<OutputEvent>, ServiceError> {
        let mut node = root;
        let mut turns = vec![GeminiContent::user(query)];
        let mut events = Vec::new();

        for depth in 0..self.config.max_depth {
            let reply = self
                .complete_node(&node.rendered_instruction, &turns)
                .await?;
            debug!(
                session_id = %session.session_id,
                author = %node.identifier,
                depth,
                "node produced output"
            );
            events.push(OutputEvent::text(
                node.identifier.clone(),
                reply.clone(),
            ));

            if node.is_leaf() {
                break;
            }

            match Self::resolve_child(node, &reply) {
                Some(child) => {
                    turns.push(GeminiContent::model(&reply));
                    node = child;
                }
                // Dispatcher answered in place; delegation stops here.
                None => break,
            }
        }

        Ok(events)
    }
}

// Gemini wire format

#[derive(Debug, Clone, Serialize)]
struct GeminiRequest {
    #[serde(rename = "systemInstruction")]
    system_instruction: GeminiInstruction,
    contents: Vec<GeminiContent>,
}

#[derive(Debug, Clone, Serialize)]
struct GeminiInstruction {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Clone, Serialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

impl GeminiContent {
    fn user(text: &str) -> Self {
        Self {
            role: "user".to_string(),
            parts: vec![GeminiPart {
                text: text.to_string(),
            }],
        }
    }

    fn model(text: &str) -> Self {
        Self {
            role: "model".to_string(),
            parts: vec![GeminiPart {
                text: text.to_string(),
            }],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiCandidateContent,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}
