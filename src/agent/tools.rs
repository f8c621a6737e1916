// ABOUTME: Tool adapters exposing the delegation operations to a primary agent,
// ABOUTME: plus init_sub_agents, the one-call setup entry point.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};

use super::definition::SubAgentRegistry;
use super::delegation::DelegationToolset;
use crate::error::{DelegationError, ToolError};
use crate::llm::ClientResolver;
use crate::tool::{Tool, ToolResult};

/// Build the delegation tools for a primary agent.
///
/// Returns no tools for an empty registry. With exactly one sub-agent the
/// tools drop their `sub_agent_id` parameter and always target it.
pub fn init_sub_agents(
    registry: SubAgentRegistry,
    clients: impl ClientResolver + 'static,
) -> Vec<Arc<dyn Tool>> {
    if registry.is_empty() {
        return Vec::new();
    }
    let toolset = Arc::new(DelegationToolset::new(Arc::new(registry), clients));
    delegation_tools(toolset)
}

/// Wrap an existing toolset in its three tool adapters.
pub fn delegation_tools(toolset: Arc<DelegationToolset>) -> Vec<Arc<dyn Tool>> {
    let single = toolset.registry().len() == 1;
    let specs: Arc<dyn Tool> = Arc::new(SubAgentSpecsTool {
        toolset: toolset.clone(),
        single,
    });
    let run: Arc<dyn Tool> = Arc::new(RunSubAgentTool {
        toolset: toolset.clone(),
        single,
    });
    let chat: Arc<dyn Tool> = Arc::new(ChatWithSubAgentTool { toolset, single });
    vec![specs, run, chat]
}

fn required_str<'a>(params: &'a Value, key: &str) -> Result<&'a str, ToolError> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| ToolError::InvalidParams(format!("Missing required parameter: {}", key)))
}

/// The sub-agent a call targets: the only one in single mode, else the
/// `sub_agent_id` parameter.
fn target(toolset: &DelegationToolset, single: bool, params: &Value) -> Result<String, ToolError> {
    if single {
        if let Some(config) = toolset.registry().first() {
            return Ok(config.agent_id().to_string());
        }
    }
    required_str(params, "sub_agent_id").map(str::to_string)
}

/// The target sub-agent and the text parameter `key` of a run or chat call.
fn arguments<'a>(
    toolset: &DelegationToolset,
    single: bool,
    params: &'a Value,
    key: &str,
) -> Result<(String, &'a str), ToolError> {
    let agent_id = target(toolset, single, params)?;
    Ok((agent_id, required_str(params, key)?))
}

fn schema(single: bool, key: &str, description: &str) -> Value {
    let mut properties = serde_json::Map::new();
    let mut required = Vec::new();
    if !single {
        properties.insert(
            "sub_agent_id".to_string(),
            json!({"type": "string", "description": "ID of the sub agent"}),
        );
        required.push("sub_agent_id");
    }
    properties.insert(
        key.to_string(),
        json!({"type": "string", "description": description}),
    );
    required.push(key);

    json!({
        "type": "object",
        "properties": properties,
        "required": required
    })
}

fn render(result: Result<String, DelegationError>) -> ToolResult {
    match result {
        Ok(text) => ToolResult::text(text),
        Err(e) => ToolResult::error(e.to_string()),
    }
}

/// Lists the sub-agents and what they can do.
pub struct SubAgentSpecsTool {
    toolset: Arc<DelegationToolset>,
    single: bool,
}

#[async_trait]
impl Tool for SubAgentSpecsTool {
    fn name(&self) -> &str {
        "sub_agent_specs"
    }

    fn description(&self) -> &str {
        if self.single {
            "Show the specification of the sub agent. Use this to learn what the sub agent can be \
             used for."
        } else {
            "List all available sub agents with their specifications. Use this to find the right \
             sub agent for the task at hand."
        }
    }

    fn schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, _params: Value) -> Result<ToolResult, anyhow::Error> {
        Ok(ToolResult::text(self.toolset.sub_agent_specs()))
    }
}

/// Runs a sub-agent on a set of instructions.
pub struct RunSubAgentTool {
    toolset: Arc<DelegationToolset>,
    single: bool,
}

#[async_trait]
impl Tool for RunSubAgentTool {
    fn name(&self) -> &str {
        "run_sub_agent"
    }

    fn description(&self) -> &str {
        "Run a sub agent with instructions. You will only get a short summary back, not what the \
         sub agent did. To learn more, chat with it afterwards."
    }

    fn schema(&self) -> Value {
        schema(self.single, "instructions", "Instructions for the sub agent")
    }

    async fn execute(&self, params: Value) -> Result<ToolResult, anyhow::Error> {
        let args = arguments(&self.toolset, self.single, &params, "instructions");
        let (agent_id, instructions) = match args {
            Ok(args) => args,
            Err(e) => return Ok(ToolResult::error(e.to_string())),
        };

        Ok(match self.toolset.run(&agent_id, instructions).await {
            Ok(report) => ToolResult::text(report.summary)
                .with_metadata("session_id", report.session_id)
                .with_metadata("status", report.status)
                .with_metadata("steps", report.steps)
                .with_metadata("tool_use_count", report.tool_use_count),
            Err(e) => ToolResult::error(e.to_string()),
        })
    }
}

/// Asks a follow-up question of a sub-agent that has already been run.
pub struct ChatWithSubAgentTool {
    toolset: Arc<DelegationToolset>,
    single: bool,
}

#[async_trait]
impl Tool for ChatWithSubAgentTool {
    fn name(&self) -> &str {
        "chat_with_sub_agent"
    }

    fn description(&self) -> &str {
        "Chat with a sub agent that was previously run with some instructions. Returns its answer."
    }

    fn schema(&self) -> Value {
        schema(self.single, "question", "Question to ask the sub agent")
    }

    async fn execute(&self, params: Value) -> Result<ToolResult, anyhow::Error> {
        let args = arguments(&self.toolset, self.single, &params, "question");
        let (agent_id, question) = match args {
            Ok(args) => args,
            Err(e) => return Ok(ToolResult::error(e.to_string())),
        };

        Ok(render(
            self.toolset.chat_with_sub_agent(&agent_id, question).await,
        ))
    }
}
