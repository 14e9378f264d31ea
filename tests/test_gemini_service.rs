//! Integration tests for the Gemini session service
//!
//! Behavioral contracts over a mocked HTTP endpoint: delegation walking,
//! author tagging, answer-in-place handling, and error mapping.

use routebench::completion::{GeminiConfig, GeminiService, ServiceError, SessionContext, SessionService};
use routebench::topology::DispatchNode;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(base_url: &str) -> GeminiConfig {
    GeminiConfig {
        api_key: "test-api-key".to_string(),
        model: "gemini-2.5-flash".to_string(),
        base_url: base_url.to_string(),
        timeout: Duration::from_secs(5),
        max_depth: 4,
    }
}

fn tree() -> DispatchNode {
    DispatchNode::dispatcher(
        "central_coordinator",
        "root",
        "Route the query to one child.".to_string(),
        vec![
            DispatchNode::leaf(
                "finance_agent",
                "finance",
                "Answer finance queries.".to_string(),
            ),
            DispatchNode::leaf("hr_agent", "hr", "Answer HR queries.".to_string()),
        ],
    )
}

fn completion_body(text: &str) -> serde_json::Value {
    serde_json::json!({
        "candidates": [
            {
                "content": {
                    "parts": [{"text": text}],
                    "role": "model"
                },
                "finishReason": "STOP"
            }
        ]
    })
}

#[tokio::test]
async fn test_delegation_walk_produces_author_tagged_events() {
    let mock_server = MockServer::start().await;
    let endpoint = "/models/gemini-2.5-flash:generateContent";

    // First call: the dispatcher names a child. Second call: the leaf answers.
    Mock::given(method("POST"))
        .and(path(endpoint))
        .and(header("x-goog-api-key", "test-api-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(
            "This is a banking question. Delegating to finance_agent.",
        )))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path(endpoint))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(
            "[ROUTED_TO: finance_agent] Your balance is available online.",
        )))
        .mount(&mock_server)
        .await;

    let service = GeminiService::new(test_config(&mock_server.uri())).unwrap();
    let events = service
        .submit(&tree(), &SessionContext::new(), "Check my bank balance")
        .await
        .unwrap();

    assert_eq!(events.len(), 2);
    assert_eq!(events[0].author, "central_coordinator");
    assert_eq!(events[1].author, "finance_agent");
    assert!(events[1].segments[0].contains("[ROUTED_TO: finance_agent]"));
}

#[tokio::test]
async fn test_dispatcher_answering_in_place_stops_the_walk() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/gemini-2.5-flash:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(
            "I can answer this directly: your request is complete.",
        )))
        .mount(&mock_server)
        .await;

    let service = GeminiService::new(test_config(&mock_server.uri())).unwrap();
    let events = service
        .submit(&tree(), &SessionContext::new(), "Some query")
        .await
        .unwrap();

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].author, "central_coordinator");
}

#[tokio::test]
async fn test_api_error_status_maps_to_service_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/gemini-2.5-flash:generateContent"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .mount(&mock_server)
        .await;

    let service = GeminiService::new(test_config(&mock_server.uri())).unwrap();
    let result = service
        .submit(&tree(), &SessionContext::new(), "Some query")
        .await;

    match result {
        Err(ServiceError::ApiError(message)) => {
            assert!(message.contains("429"));
            assert!(message.contains("rate limited"));
        }
        other => panic!("expected ApiError, got {other:?}"),
    }
}

#[tokio::test]
async fn test_empty_candidates_rejected_as_invalid_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/gemini-2.5-flash:generateContent"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"candidates": []})),
        )
        .mount(&mock_server)
        .await;

    let service = GeminiService::new(test_config(&mock_server.uri())).unwrap();
    let result = service
        .submit(&tree(), &SessionContext::new(), "Some query")
        .await;

    assert!(matches!(result, Err(ServiceError::InvalidResponse(_))));
}

#[tokio::test]
async fn test_unreachable_endpoint_maps_to_network_error() {
    // Nothing is listening on this port.
    let service = GeminiService::new(test_config("http://127.0.0.1:1")).unwrap();
    let result = service
        .submit(&tree(), &SessionContext::new(), "Some query")
        .await;

    assert!(matches!(result, Err(ServiceError::NetworkError(_))));
}

#[tokio::test]
async fn test_multi_part_candidate_text_is_joined() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/gemini-2.5-flash:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "candidates": [
                {
                    "content": {
                        "parts": [
                            {"text": "I can answer this "},
                            {"text": "directly."}
                        ],
                        "role": "model"
                    },
                    "finishReason": "STOP"
                }
            ]
        })))
        .mount(&mock_server)
        .await;

    let service = GeminiService::new(test_config(&mock_server.uri())).unwrap();
    let events = service
        .submit(&tree(), &SessionContext::new(), "Some query")
        .await
        .unwrap();

    assert_eq!(events[0].segments[0], "I can answer this directly.");
}
