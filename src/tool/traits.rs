// ABOUTME: Defines the Tool trait - a named capability with a JSON Schema
// ABOUTME: parameter spec and an async execute method returning text.

use async_trait::async_trait;

use super::ToolResult;
use crate::llm::ToolDefinition;

/// A tool that can be executed by an agent.
///
/// This is the calling convention on both sides of delegation: sub-agents
/// run their own tools through it, and the delegation operations are
/// handed to the primary agent as implementations of it.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Returns the unique name of this tool.
    fn name(&self) -> &str;

    /// Returns a human-readable description for the LLM.
    fn description(&self) -> &str;

    /// Returns the JSON Schema for the tool's input parameters.
    fn schema(&self) -> serde_json::Value;

    /// Execute the tool with the given parameters.
    async fn execute(&self, params: serde_json::Value) -> Result<ToolResult, anyhow::Error>;

    /// Describe this tool for an LLM request.
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.schema(),
        }
    }
}
