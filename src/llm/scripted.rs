// ABOUTME: ScriptedClient - a deterministic LlmClient that replays canned responses.
// ABOUTME: Records every request so callers can inspect what the model was shown.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{ContentBlock, LlmClient, Request, Response, StopReason, Usage};
use crate::error::LlmError;

/// A model stand-in that answers from a fixed script.
///
/// Responses are handed out in order. With [`ScriptedClient::repeat_last`]
/// the final response is replayed forever instead of running dry, which is
/// how a model that never signals completion is simulated.
pub struct ScriptedClient {
    responses: Mutex<VecDeque<Response>>,
    requests: Mutex<Vec<Request>>,
    repeat_last: bool,
}

impl ScriptedClient {
    /// Create a client that returns the given responses once each.
    pub fn new(responses: Vec<Response>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
            repeat_last: false,
        }
    }

    /// Keep returning the last response once the script is used up.
    pub fn repeat_last(mut self) -> Self {
        self.repeat_last = true;
        self
    }

    /// Append a response to the script.
    pub async fn push(&self, response: Response) {
        self.responses.lock().await.push_back(response);
    }

    /// All requests received so far, oldest first.
    pub async fn requests(&self) -> Vec<Request> {
        self.requests.lock().await.clone()
    }

    /// Number of model calls made against this client.
    pub async fn call_count(&self) -> usize {
        self.requests.lock().await.len()
    }
}

/// A response carrying only text.
pub fn text_response(text: impl Into<String>) -> Response {
    Response {
        id: "scripted".to_string(),
        content: vec![ContentBlock::text(text)],
        stop_reason: StopReason::EndTurn,
        model: "scripted".to_string(),
        usage: Usage::default(),
    }
}

/// A response making a single tool call.
pub fn tool_use_response(
    id: impl Into<String>,
    name: impl Into<String>,
    input: serde_json::Value,
) -> Response {
    Response {
        id: "scripted".to_string(),
        content: vec![ContentBlock::tool_use(id, name, input)],
        stop_reason: StopReason::ToolUse,
        model: "scripted".to_string(),
        usage: Usage::default(),
    }
}

#[async_trait]
impl LlmClient for ScriptedClient {
    async fn create_message(&self, req: &Request) -> Result<Response, LlmError> {
        self.requests.lock().await.push(req.clone());

        let mut responses = self.responses.lock().await;
        if self.repeat_last && responses.len() == 1 {
            return responses.front().cloned().ok_or(LlmError::ScriptExhausted);
        }
        responses.pop_front().ok_or(LlmError::ScriptExhausted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replays_in_order_then_runs_dry() {
        let client = ScriptedClient::new(vec![text_response("one"), text_response("two")]);
        let req = Request::new("m");

        assert_eq!(client.create_message(&req).await.unwrap().text(), "one");
        assert_eq!(client.create_message(&req).await.unwrap().text(), "two");
        assert!(matches!(
            client.create_message(&req).await,
            Err(LlmError::ScriptExhausted)
        ));
        assert_eq!(client.call_count().await, 3);
    }

    #[tokio::test]
    async fn test_repeat_last() {
        let client = ScriptedClient::new(vec![
            text_response("first"),
            tool_use_response("c", "lookup", serde_json::json!({})),
        ])
        .repeat_last();
        let req = Request::new("m");

        assert_eq!(client.create_message(&req).await.unwrap().text(), "first");
        for _ in 0..5 {
            assert!(client.create_message(&req).await.unwrap().has_tool_use());
        }
    }

    #[tokio::test]
    async fn test_records_requests() {
        let client = ScriptedClient::new(vec![text_response("hi")]);
        client
            .create_message(&Request::new("gpt-4o").system("sys"))
            .await
            .unwrap();

        let requests = client.requests().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model, "gpt-4o");
        assert_eq!(requests[0].system.as_deref(), Some("sys"));
    }
}
