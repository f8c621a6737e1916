// ABOUTME: Serde types mirroring the sub-agent TOML file layout.
// ABOUTME: A [defaults] table plus one [[sub_agents]] table per sub-agent.

use serde::Deserialize;

/// The TOML file structure for a sub-agent registry.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistryFile {
    #[serde(default)]
    pub defaults: Defaults,
    #[serde(default)]
    pub sub_agents: Vec<SubAgentEntry>,
}

/// Values applied to every sub-agent that does not set its own.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Defaults {
    pub model: Option<String>,
    pub max_steps: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubAgentEntry {
    /// Auto-assigned when omitted.
    pub id: Option<String>,
    pub description: String,
    #[serde(default)]
    pub internal_description: String,
    /// Names looked up in the tool catalog.
    #[serde(default)]
    pub tools: Vec<String>,
    pub model: Option<String>,
    pub max_steps: Option<usize>,
    pub context_window: Option<usize>,
}
