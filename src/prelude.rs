// ABOUTME: Prelude module - convenient imports for common use cases.
// ABOUTME: Use `use multiagent::prelude::*;` to get started quickly.

pub use crate::agent::{
    DelegationToolset, RunReport, SessionSnapshot, SessionStatus, SubAgentConfig,
    SubAgentRegistry, SubAgentSpec, init_sub_agents,
};
pub use crate::config::{RegistryFile, load_registry};
pub use crate::error::{ConfigError, DelegationError, LlmError, MultiAgentError, ToolError};
pub use crate::llm::{
    AnthropicClient, ClientResolver, ContentBlock, LlmClient, Message, ModelRouter, OpenAIClient,
    Request, Response, Role, ScriptedClient, StopReason, ToolDefinition, Usage,
};
pub use crate::tool::{Tool, ToolResult, ToolSet};
