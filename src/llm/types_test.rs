// ABOUTME: Tests for LLM types - wire format and history helpers.

use super::*;

#[test]
fn test_role_serialization() {
    assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
    assert_eq!(
        serde_json::to_string(&Role::Assistant).unwrap(),
        "\"assistant\""
    );
}

#[test]
fn test_tool_use_deserialization() {
    let json = r#"{
        "type": "tool_use",
        "id": "123",
        "name": "end_run",
        "input": {"stop_reason": "done"}
    }"#;
    let block: ContentBlock = serde_json::from_str(json).unwrap();
    assert_eq!(
        block,
        ContentBlock::tool_use("123", "end_run", serde_json::json!({"stop_reason": "done"}))
    );
}

#[test]
fn test_tool_result_defaults_is_error() {
    let json = r#"{"type": "tool_result", "tool_use_id": "1", "content": "ok"}"#;
    let block: ContentBlock = serde_json::from_str(json).unwrap();
    assert_eq!(block, ContentBlock::tool_result("1", "ok"));
}

#[test]
fn test_message_text_skips_non_text_blocks() {
    let msg = Message {
        role: Role::Assistant,
        content: vec![
            ContentBlock::text("Checking "),
            ContentBlock::tool_use("1", "lookup", serde_json::json!({})),
            ContentBlock::text("now."),
        ],
    };
    assert_eq!(msg.text(), "Checking now.");
    assert!(!msg.has_tool_results());
}

#[test]
fn test_tool_results_message() {
    let msg = Message::tool_results(vec![ContentBlock::tool_error("1", "boom")]);
    assert_eq!(msg.role, Role::User);
    assert!(msg.has_tool_results());
    assert_eq!(msg.text(), "");
}

#[test]
fn test_usage_add() {
    let mut total = Usage::default();
    total.add(&Usage {
        input_tokens: 10,
        output_tokens: 2,
    });
    total.add(&Usage {
        input_tokens: 5,
        output_tokens: 1,
    });
    assert_eq!(total.input_tokens, 15);
    assert_eq!(total.output_tokens, 3);
}

#[test]
fn test_response_into_message() {
    let response = Response {
        id: "r".into(),
        content: vec![ContentBlock::text("answer")],
        stop_reason: StopReason::EndTurn,
        model: "m".into(),
        usage: Usage::default(),
    };
    assert!(!response.has_tool_use());

    let msg = response.into_message();
    assert_eq!(msg.role, Role::Assistant);
    assert_eq!(msg.text(), "answer");
}

#[test]
fn test_request_builder() {
    let req = Request::new("gpt-4o")
        .system("You are a sub agent")
        .messages(vec![Message::user("a"), Message::assistant("b")])
        .max_tokens(512)
        .temperature(0.0);

    assert_eq!(req.model, "gpt-4o");
    assert_eq!(req.messages.len(), 2);
    assert!(req.tools.is_empty());
    assert_eq!(req.max_tokens, Some(512));
    assert_eq!(req.temperature, Some(0.0));
}
