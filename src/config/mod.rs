// ABOUTME: Loads sub-agent registries from TOML files.
// ABOUTME: Tool names are resolved against a catalog ToolSet supplied by the host.

mod schema;

pub use schema::*;

use std::path::Path;

use crate::agent::{DEFAULT_MAX_STEPS, SubAgentConfig, SubAgentRegistry};
use crate::error::ConfigError;
use crate::tool::ToolSet;

impl RegistryFile {
    /// Parse a registry file from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Read and parse a registry file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file = Self::from_toml_str(&contents)?;
        tracing::info!(
            sub_agents = file.sub_agents.len(),
            "Loaded sub agent config from {}",
            path.display()
        );
        Ok(file)
    }

    /// Build a validated registry, taking each sub-agent's tools from `catalog`.
    pub fn into_registry(self, catalog: &ToolSet) -> Result<SubAgentRegistry, ConfigError> {
        let mut builder = SubAgentRegistry::builder();
        if let Some(model) = self.defaults.model {
            builder = builder.default_model(model);
        }
        let default_steps = self.defaults.max_steps.unwrap_or(DEFAULT_MAX_STEPS);

        for (i, entry) in self.sub_agents.into_iter().enumerate() {
            let label = entry
                .id
                .clone()
                .unwrap_or_else(|| format!("entry {}", i + 1));
            let tools = catalog
                .select(entry.tools.as_slice())
                .map_err(|tool| ConfigError::UnknownTool {
                    agent_id: label,
                    tool,
                })?;

            let mut config = SubAgentConfig::new(entry.description)
                .internal_description(entry.internal_description)
                .tools(tools)
                .max_steps(entry.max_steps.unwrap_or(default_steps));
            config.agent_id = entry.id;
            config.model = entry.model;
            config.context_window = entry.context_window;
            builder = builder.add(config);
        }

        builder.build()
    }
}

/// Load a registry file and build it against a tool catalog.
pub fn load_registry(
    path: impl AsRef<Path>,
    catalog: &ToolSet,
) -> Result<SubAgentRegistry, ConfigError> {
    RegistryFile::load(path)?.into_registry(catalog)
}
