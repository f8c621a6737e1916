// ABOUTME: The end_run tool - the completion signal a sub-agent calls to finish its run.
// ABOUTME: Always offered to sub-agents alongside their own tools.

use async_trait::async_trait;

use crate::error::ToolError;
use crate::tool::{Tool, ToolResult};

/// Name of the completion tool. Sub-agent tool sets may not reuse it.
pub const END_RUN_TOOL: &str = "end_run";

/// Completion signal for the delegation loop.
///
/// Executing it has no side effect; the loop watches for a successful call
/// and stops after the current step.
pub struct EndRunTool;

impl EndRunTool {
    /// The stop reason carried by a call's input, if well formed.
    pub fn stop_reason(params: &serde_json::Value) -> Option<&str> {
        params
            .get("stop_reason")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

#[async_trait]
impl Tool for EndRunTool {
    fn name(&self) -> &str {
        END_RUN_TOOL
    }

    fn description(&self) -> &str {
        "End the run. Call this once you have fulfilled your instructions, or when you are stuck \
         and cannot make further progress."
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "stop_reason": {
                    "type": "string",
                    "description": "Why you are stopping, including the result if you have one"
                }
            },
            "required": ["stop_reason"]
        })
    }

    async fn execute(&self, params: serde_json::Value) -> Result<ToolResult, anyhow::Error> {
        let reason = Self::stop_reason(&params)
            .ok_or_else(|| ToolError::InvalidParams("stop_reason is required".to_string()))?;
        Ok(ToolResult::text(format!("Run ended with reason: {}", reason)))
    }
}
