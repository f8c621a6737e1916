// ABOUTME: Tests for DelegationToolset and its tool adapters - session lifecycle,
// ABOUTME: per-call errors, single-agent mode, and concurrent access.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Notify;

use super::*;
use crate::error::{DelegationError, LlmError};
use crate::llm::{ClientResolver, LlmClient, ScriptedClient, text_response, tool_use_response};
use crate::tool::{Tool, ToolResult, ToolSet};

struct EchoTool;

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Echo the input"
    }

    fn schema(&self) -> serde_json::Value {
        json!({"type": "object", "properties": {"text": {"type": "string"}}})
    }

    async fn execute(&self, params: serde_json::Value) -> Result<ToolResult, anyhow::Error> {
        Ok(ToolResult::text(params["text"].as_str().unwrap_or_default()))
    }
}

/// Blocks until released, so a run can be held mid-step.
struct GateTool {
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

#[async_trait]
impl Tool for GateTool {
    fn name(&self) -> &str {
        "gate"
    }

    fn description(&self) -> &str {
        "Wait for release"
    }

    fn schema(&self) -> serde_json::Value {
        json!({"type": "object"})
    }

    async fn execute(&self, _params: serde_json::Value) -> Result<ToolResult, anyhow::Error> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(ToolResult::text("released"))
    }
}

fn resolver(client: Arc<ScriptedClient>) -> impl ClientResolver {
    move |_: &str| -> Arc<dyn LlmClient> { client.clone() }
}

fn registry() -> SubAgentRegistry {
    SubAgentRegistry::builder()
        .default_model("scripted")
        .add(
            SubAgentConfig::new("Answers weather questions")
                .id("weather")
                .tools(ToolSet::new().with(EchoTool)),
        )
        .add(SubAgentConfig::new("Summarizes the news").id("news"))
        .build()
        .unwrap()
}

fn toolset(client: Arc<ScriptedClient>) -> DelegationToolset {
    DelegationToolset::new(Arc::new(registry()), resolver(client))
}

fn finish(reason: &str) -> crate::llm::Response {
    tool_use_response("end", END_RUN_TOOL, json!({"stop_reason": reason}))
}

#[tokio::test]
async fn test_chat_before_run_has_no_session() {
    let toolset = toolset(Arc::new(ScriptedClient::new(vec![])));

    let err = toolset.chat_with_sub_agent("weather", "hi?").await.unwrap_err();
    assert!(matches!(err, DelegationError::NoSession(ref id) if id == "weather"));
    assert!(toolset.session_snapshot("weather").await.is_none());
}

#[tokio::test]
async fn test_unknown_agent_lists_available_ids() {
    let toolset = toolset(Arc::new(ScriptedClient::new(vec![])));

    let err = toolset.run("ghost_agent", "do it").await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Sub agent 'ghost_agent' not found. Available sub agents: weather, news"
    );

    let err = toolset.chat_with_sub_agent("ghost_agent", "hi?").await.unwrap_err();
    assert!(matches!(err, DelegationError::NotFound { .. }));
}

#[tokio::test]
async fn test_empty_input_is_rejected_without_model_calls() {
    let client = Arc::new(ScriptedClient::new(vec![]));
    let toolset = toolset(client.clone());

    let err = toolset.run("weather", "   ").await.unwrap_err();
    assert!(matches!(err, DelegationError::EmptyInput("Instructions")));

    let err = toolset.chat_with_sub_agent("weather", "").await.unwrap_err();
    assert!(matches!(err, DelegationError::EmptyInput("Question")));

    assert_eq!(client.call_count().await, 0);
    assert!(toolset.session_snapshot("weather").await.is_none());
}

#[tokio::test]
async fn test_run_then_chat() {
    let client = Arc::new(ScriptedClient::new(vec![
        tool_use_response("c1", "echo", json!({"text": "sunny"})),
        finish("reported the weather"),
        text_response("I echoed 'sunny'."),
    ]));
    let toolset = toolset(client.clone());

    let summary = toolset.run_sub_agent("weather", "weather?").await.unwrap();
    assert!(summary.contains("reported the weather"));
    assert!(!summary.contains("sunny"));

    let answer = toolset
        .chat_with_sub_agent("weather", "What did you do?")
        .await
        .unwrap();
    assert_eq!(answer, "I echoed 'sunny'.");

    let snapshot = toolset.session_snapshot("weather").await.unwrap();
    assert_eq!(snapshot.status, SessionStatus::Completed);
    assert_eq!(snapshot.step_count, 2);
    assert_eq!(snapshot.max_steps, DEFAULT_MAX_STEPS);
    assert_eq!(snapshot.messages.len(), 7);
    assert!(toolset.session_snapshot("news").await.is_none());
}

#[tokio::test]
async fn test_rerun_replaces_session() {
    let client = Arc::new(ScriptedClient::new(vec![finish("first"), finish("second")]));
    let toolset = toolset(client);

    let first = toolset.run("weather", "task one").await.unwrap();
    let second = toolset.run("weather", "task two").await.unwrap();
    assert_ne!(first.session_id, second.session_id);

    let snapshot = toolset.session_snapshot("weather").await.unwrap();
    assert_eq!(snapshot.session_id, second.session_id);
    assert_eq!(snapshot.stop_reason.as_deref(), Some("second"));
    assert_eq!(snapshot.messages[0].text(), "task two");
    assert_eq!(snapshot.step_count, 1);
}

#[tokio::test]
async fn test_model_error_discards_session() {
    let client = Arc::new(ScriptedClient::new(vec![finish("first")]));
    let toolset = toolset(client);

    toolset.run("weather", "task one").await.unwrap();
    let err = toolset.run("weather", "task two").await.unwrap_err();
    assert!(matches!(
        err,
        DelegationError::Model(LlmError::ScriptExhausted)
    ));

    assert!(toolset.session_snapshot("weather").await.is_none());
    let err = toolset.chat_with_sub_agent("weather", "hi?").await.unwrap_err();
    assert!(matches!(err, DelegationError::NoSession(_)));
}

#[tokio::test]
async fn test_sessions_are_per_agent() {
    let client = Arc::new(ScriptedClient::new(vec![
        finish("weather done"),
        finish("news done"),
    ]));
    let toolset = toolset(client);

    toolset.run("weather", "w").await.unwrap();
    toolset.run("news", "n").await.unwrap();

    let weather = toolset.session_snapshot("weather").await.unwrap();
    let news = toolset.session_snapshot("news").await.unwrap();
    assert_eq!(weather.stop_reason.as_deref(), Some("weather done"));
    assert_eq!(news.stop_reason.as_deref(), Some("news done"));
}

#[tokio::test]
async fn test_concurrent_call_on_same_agent_is_busy() {
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let registry = SubAgentRegistry::builder()
        .default_model("scripted")
        .add(SubAgentConfig::new("Slow").id("slow").tools(ToolSet::new().with(GateTool {
            entered: entered.clone(),
            release: release.clone(),
        })))
        .add(SubAgentConfig::new("Other").id("other"))
        .build()
        .unwrap();
    let client = Arc::new(ScriptedClient::new(vec![
        tool_use_response("g", "gate", json!({})),
        finish("other done"),
        finish("slow done"),
    ]));
    let toolset = Arc::new(DelegationToolset::new(Arc::new(registry), resolver(client)));

    let background = {
        let toolset = toolset.clone();
        tokio::spawn(async move { toolset.run("slow", "wait").await })
    };
    entered.notified().await;

    let err = toolset.chat_with_sub_agent("slow", "done yet?").await.unwrap_err();
    assert!(matches!(err, DelegationError::SessionBusy(_)));
    let err = toolset.run("slow", "again").await.unwrap_err();
    assert!(matches!(err, DelegationError::SessionBusy(_)));
    assert!(toolset.session_snapshot("slow").await.is_none());

    // Other sub-agents are unaffected.
    toolset.run("other", "go").await.unwrap();

    release.notify_one();
    let report = background.await.unwrap().unwrap();
    assert_eq!(report.status, SessionStatus::Completed);
    assert_eq!(
        report.summary.lines().next(),
        Some("Sub agent 'slow' finished after 2 steps. Stop reason: slow done")
    );
}

#[tokio::test]
async fn test_cancelled_run_leaves_no_session() {
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let registry = SubAgentRegistry::builder()
        .default_model("scripted")
        .add(SubAgentConfig::new("Slow").id("slow").tools(ToolSet::new().with(GateTool {
            entered: entered.clone(),
            release: release.clone(),
        })))
        .build()
        .unwrap();
    let client = Arc::new(ScriptedClient::new(vec![
        tool_use_response("g", "gate", json!({})),
        text_response("partial answer"),
        finish("second run done"),
    ]));
    let toolset = Arc::new(DelegationToolset::new(Arc::new(registry), resolver(client.clone())));

    let background = {
        let toolset = toolset.clone();
        tokio::spawn(async move { toolset.run("slow", "wait").await })
    };
    entered.notified().await;
    background.abort();
    assert!(background.await.unwrap_err().is_cancelled());

    let err = toolset.chat_with_sub_agent("slow", "done yet?").await.unwrap_err();
    assert!(matches!(err, DelegationError::NoSession(_)));
    assert!(toolset.session_snapshot("slow").await.is_none());
    assert_eq!(client.call_count().await, 1);

    // A fresh run replaces the abandoned session.
    let report = toolset.run("slow", "again").await.unwrap();
    assert_eq!(report.status, SessionStatus::Completed);
    assert!(toolset.session_snapshot("slow").await.is_some());
}

#[tokio::test]
async fn test_sub_agent_specs_listing() {
    let toolset = toolset(Arc::new(ScriptedClient::new(vec![])));

    let text = toolset.sub_agent_specs();
    assert!(text.starts_with(
        "ID: weather\nModel: scripted\nDescription: Answers weather questions\n"
    ));
    assert!(text.contains("Tools: echo\n"));
    assert!(text.contains("ID: news\n"));
    assert_eq!(text, toolset.sub_agent_specs());
    assert_eq!(toolset.specs().len(), 2);
}

#[tokio::test]
async fn test_max_tokens_is_forwarded() {
    let client = Arc::new(ScriptedClient::new(vec![finish("done")]));
    let toolset =
        DelegationToolset::new(Arc::new(registry()), resolver(client.clone())).max_tokens(512);

    toolset.run("news", "n").await.unwrap();
    assert_eq!(client.requests().await[0].max_tokens, Some(512));
}

#[test]
fn test_init_with_empty_registry_yields_no_tools() {
    let registry = SubAgentRegistry::new(Vec::new()).unwrap();
    let tools = init_sub_agents(registry, resolver(Arc::new(ScriptedClient::new(vec![]))));
    assert!(tools.is_empty());
}

#[test]
fn test_init_multi_agent_tools_take_agent_id() {
    let tools = init_sub_agents(registry(), resolver(Arc::new(ScriptedClient::new(vec![]))));
    let names: Vec<_> = tools.iter().map(|t| t.name().to_string()).collect();
    assert_eq!(names, vec!["sub_agent_specs", "run_sub_agent", "chat_with_sub_agent"]);

    let run_schema = tools[1].schema();
    assert_eq!(run_schema["required"], json!(["sub_agent_id", "instructions"]));
    let chat_schema = tools[2].schema();
    assert_eq!(chat_schema["required"], json!(["sub_agent_id", "question"]));
}

#[test]
fn test_init_single_agent_tools_omit_agent_id() {
    let registry = SubAgentRegistry::builder()
        .default_model("scripted")
        .add(SubAgentConfig::new("Only one"))
        .build()
        .unwrap();
    let tools = init_sub_agents(registry, resolver(Arc::new(ScriptedClient::new(vec![]))));

    let run_schema = tools[1].schema();
    assert!(run_schema["properties"].get("sub_agent_id").is_none());
    assert_eq!(run_schema["required"], json!(["instructions"]));
    assert!(tools[0].description().contains("the sub agent"));
}

#[tokio::test]
async fn test_single_agent_tools_target_the_only_agent() {
    let registry = SubAgentRegistry::builder()
        .default_model("scripted")
        .add(SubAgentConfig::new("Only one"))
        .build()
        .unwrap();
    let client = Arc::new(ScriptedClient::new(vec![
        finish("all done"),
        text_response("Nothing else to add."),
    ]));
    let tools = init_sub_agents(registry, resolver(client));

    let result = tools[1]
        .execute(json!({"instructions": "go"}))
        .await
        .unwrap();
    assert!(!result.is_error);
    assert!(result.content.starts_with("Sub agent '001' finished"));

    let result = tools[2]
        .execute(json!({"question": "anything else?"}))
        .await
        .unwrap();
    assert_eq!(result.content, "Nothing else to add.");
}

#[tokio::test]
async fn test_tool_adapters_render_errors_as_text() {
    let tools = init_sub_agents(registry(), resolver(Arc::new(ScriptedClient::new(vec![]))));

    let result = tools[1]
        .execute(json!({"sub_agent_id": "ghost_agent", "instructions": "go"}))
        .await
        .unwrap();
    assert!(result.is_error);
    assert!(result.content.contains("Available sub agents: weather, news"));

    let result = tools[2]
        .execute(json!({"sub_agent_id": "news", "question": "what?"}))
        .await
        .unwrap();
    assert!(result.is_error);
    assert!(result.content.contains("has not been run yet"));

    let result = tools[1]
        .execute(json!({"sub_agent_id": "news"}))
        .await
        .unwrap();
    assert!(result.is_error);
    assert!(result.content.contains("Missing required parameter: instructions"));

    let result = tools[2]
        .execute(json!({"question": "who?"}))
        .await
        .unwrap();
    assert!(result.is_error);
    assert!(result.content.contains("sub_agent_id"));
}

#[tokio::test]
async fn test_run_tool_reports_metadata() {
    let client = Arc::new(ScriptedClient::new(vec![finish("done")]));
    let tools = init_sub_agents(registry(), resolver(client));

    let result = tools[1]
        .execute(json!({"sub_agent_id": "news", "instructions": "headlines"}))
        .await
        .unwrap();

    assert_eq!(result.metadata["status"], json!("completed"));
    assert_eq!(result.metadata["steps"], json!(1));
    assert_eq!(result.metadata["tool_use_count"], json!(1));
    assert!(result.metadata["session_id"].is_string());
}
