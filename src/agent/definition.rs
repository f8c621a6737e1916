// ABOUTME: Sub-agent configuration types and the read-only registry built from them.
// ABOUTME: The registry validates ids, models, and step limits once, at setup.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use super::end_run::END_RUN_TOOL;
use crate::error::{ConfigError, DelegationError};
use crate::tool::ToolSet;

/// Step limit used when a sub-agent does not set one.
pub const DEFAULT_MAX_STEPS: usize = 10;

/// Declarative configuration of one sub-agent.
#[derive(Debug, Clone)]
pub struct SubAgentConfig {
    /// Unique identifier. Assigned by the registry ("001", "002", ...) when None.
    pub agent_id: Option<String>,

    /// Description shown to the primary agent when it lists sub-agents.
    pub public_description: String,

    /// Extra instructions appended to the sub-agent's own system prompt.
    /// Never shown to the primary agent.
    pub internal_description: String,

    /// Tools the sub-agent may call.
    pub tools: ToolSet,

    /// Model identifier, e.g. "openai/gpt-4o". Falls back to the registry default.
    pub model: Option<String>,

    /// Maximum number of model calls per run.
    pub max_steps: usize,

    /// Maximum number of history messages sent per model call.
    /// The task message is always kept. None sends the full history.
    pub context_window: Option<usize>,
}

impl SubAgentConfig {
    /// Create a configuration with the given public description.
    pub fn new(public_description: impl Into<String>) -> Self {
        Self {
            agent_id: None,
            public_description: public_description.into(),
            internal_description: String::new(),
            tools: ToolSet::new(),
            model: None,
            max_steps: DEFAULT_MAX_STEPS,
            context_window: None,
        }
    }

    /// Set an explicit identifier.
    pub fn id(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }

    /// Set the private instructions for the sub-agent.
    pub fn internal_description(mut self, text: impl Into<String>) -> Self {
        self.internal_description = text.into();
        self
    }

    /// Set the sub-agent's tools.
    pub fn tools(mut self, tools: ToolSet) -> Self {
        self.tools = tools;
        self
    }

    /// Set the model.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the step limit.
    pub fn max_steps(mut self, max: usize) -> Self {
        self.max_steps = max;
        self
    }

    /// Cap the number of history messages sent per model call.
    pub fn context_window(mut self, messages: usize) -> Self {
        self.context_window = Some(messages);
        self
    }

    /// The identifier. Empty only before registration assigns one.
    pub fn agent_id(&self) -> &str {
        self.agent_id.as_deref().unwrap_or_default()
    }

    /// The resolved model. Always set once registered.
    pub fn model_name(&self) -> &str {
        self.model.as_deref().unwrap_or_default()
    }

    /// The listing entry for this sub-agent.
    pub fn spec(&self) -> SubAgentSpec {
        SubAgentSpec {
            agent_id: self.agent_id().to_string(),
            description: self.public_description.clone(),
            tool_names: self.tools.names(),
            model: self.model_name().to_string(),
            max_steps: self.max_steps,
        }
    }
}

/// What the primary agent sees about a sub-agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubAgentSpec {
    pub agent_id: String,
    pub description: String,
    pub tool_names: Vec<String>,
    pub model: String,
    pub max_steps: usize,
}

impl fmt::Display for SubAgentSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ID: {}", self.agent_id)?;
        writeln!(f, "Model: {}", self.model)?;
        writeln!(f, "Description: {}", self.description)?;
        writeln!(f, "Max Steps: {}", self.max_steps)?;
        if !self.tool_names.is_empty() {
            writeln!(f, "Tools: {}", self.tool_names.join(", "))?;
        }
        Ok(())
    }
}

/// Read-only registry of sub-agent configurations.
///
/// Built once at setup with [`SubAgentRegistry::builder`] and shared by
/// reference afterwards. Iteration follows registration order.
#[derive(Debug, Clone)]
pub struct SubAgentRegistry {
    agents: Vec<Arc<SubAgentConfig>>,
    index: HashMap<String, usize>,
}

impl SubAgentRegistry {
    /// Start building a registry.
    pub fn builder() -> SubAgentRegistryBuilder {
        SubAgentRegistryBuilder::default()
    }

    /// Build a registry from configs with no default model.
    pub fn new(configs: impl IntoIterator<Item = SubAgentConfig>) -> Result<Self, ConfigError> {
        configs
            .into_iter()
            .fold(Self::builder(), SubAgentRegistryBuilder::add)
            .build()
    }

    /// Get a sub-agent configuration by identifier.
    pub fn get(&self, agent_id: &str) -> Result<Arc<SubAgentConfig>, DelegationError> {
        self.index
            .get(agent_id)
            .map(|&i| self.agents[i].clone())
            .ok_or_else(|| DelegationError::NotFound {
                id: agent_id.to_string(),
                available: self.ids(),
            })
    }

    /// The first registered sub-agent.
    pub fn first(&self) -> Option<Arc<SubAgentConfig>> {
        self.agents.first().cloned()
    }

    /// Listing entries for every sub-agent, in registration order.
    pub fn describe_all(&self) -> Vec<SubAgentSpec> {
        self.agents.iter().map(|a| a.spec()).collect()
    }

    /// All identifiers, in registration order.
    pub fn ids(&self) -> Vec<String> {
        self.agents.iter().map(|a| a.agent_id().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

/// Collects configurations and validates them into a [`SubAgentRegistry`].
#[derive(Debug, Default)]
pub struct SubAgentRegistryBuilder {
    configs: Vec<SubAgentConfig>,
    default_model: Option<String>,
}

impl SubAgentRegistryBuilder {
    /// Add a sub-agent.
    pub fn add(mut self, config: SubAgentConfig) -> Self {
        self.configs.push(config);
        self
    }

    /// Model used by sub-agents that do not name one.
    pub fn default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = Some(model.into());
        self
    }

    /// Validate and freeze the registry.
    pub fn build(self) -> Result<SubAgentRegistry, ConfigError> {
        let explicit: HashSet<String> = self
            .configs
            .iter()
            .filter_map(|c| c.agent_id.as_deref().map(|id| id.trim().to_string()))
            .collect();
        let mut next_auto = 1usize;

        let mut agents = Vec::with_capacity(self.configs.len());
        let mut index = HashMap::with_capacity(self.configs.len());

        for mut config in self.configs {
            let agent_id = match config.agent_id.take() {
                Some(id) => id.trim().to_string(),
                None => loop {
                    let candidate = format!("{:03}", next_auto);
                    next_auto += 1;
                    if !explicit.contains(&candidate) {
                        break candidate;
                    }
                },
            };

            if agent_id.is_empty() {
                return Err(ConfigError::EmptyId);
            }
            if index.contains_key(&agent_id) {
                return Err(ConfigError::DuplicateId(agent_id));
            }
            if config.max_steps == 0 {
                return Err(ConfigError::Invalid {
                    agent_id,
                    reason: "max_steps must be at least 1".to_string(),
                });
            }
            if matches!(config.context_window, Some(window) if window < 3) {
                return Err(ConfigError::Invalid {
                    agent_id,
                    reason: "context_window must keep at least 3 messages".to_string(),
                });
            }
            if config.tools.contains(END_RUN_TOOL) {
                return Err(ConfigError::ReservedToolName {
                    agent_id,
                    tool: END_RUN_TOOL.to_string(),
                });
            }

            let model = config
                .model
                .take()
                .filter(|m| !m.trim().is_empty())
                .or_else(|| self.default_model.clone())
                .ok_or_else(|| ConfigError::MissingModel(agent_id.clone()))?;

            config.model = Some(model);
            config.agent_id = Some(agent_id.clone());
            index.insert(agent_id, agents.len());
            agents.push(Arc::new(config));
        }

        Ok(SubAgentRegistry { agents, index })
    }
}
