// ABOUTME: Defines all error types for the multiagent library using thiserror.
// ABOUTME: Each concern has its own error enum, unified under MultiAgentError.

use std::path::PathBuf;

/// Top-level error type for the multiagent library.
#[derive(Debug, thiserror::Error)]
pub enum MultiAgentError {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Delegation error: {0}")]
    Delegation(#[from] DelegationError),
}

/// Errors from LLM client operations.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Deserialization error: {0}")]
    Deserialize(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Scripted client has no responses left")]
    ScriptExhausted,
}

/// Errors from tool operations.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    #[error("Execution failed: {0}")]
    Execution(#[source] anyhow::Error),
}

/// Errors raised while building a sub-agent registry.
///
/// These surface at setup time and are fatal: a host should refuse to
/// start an evaluation with a broken registry.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Duplicate sub agent id '{0}'")]
    DuplicateId(String),

    #[error("Sub agent id must not be empty")]
    EmptyId,

    #[error("Sub agent '{0}' has no model and the registry has no default model")]
    MissingModel(String),

    #[error("Sub agent '{agent_id}': {reason}")]
    Invalid { agent_id: String, reason: String },

    #[error("Sub agent '{agent_id}' uses reserved tool name '{tool}'")]
    ReservedToolName { agent_id: String, tool: String },

    #[error("Sub agent '{agent_id}' references unknown tool '{tool}'")]
    UnknownTool { agent_id: String, tool: String },

    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Per-call delegation failures.
///
/// None of these are fatal to the primary agent: the delegation tools
/// render them as text so the caller can correct itself and retry.
#[derive(Debug, thiserror::Error)]
pub enum DelegationError {
    #[error("Sub agent '{id}' not found. Available sub agents: {}", .available.join(", "))]
    NotFound { id: String, available: Vec<String> },

    #[error(
        "Sub agent '{0}' has not been run yet. Run it with instructions before chatting with it."
    )]
    NoSession(String),

    #[error("{0} must not be empty")]
    EmptyInput(&'static str),

    #[error("Sub agent '{0}' is busy with another request")]
    SessionBusy(String),

    #[error("Sub agent model call failed: {0}")]
    Model(#[from] LlmError),
}
