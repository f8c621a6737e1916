// ABOUTME: Implements ToolSet - an ordered, cheaply clonable collection of tools
// ABOUTME: that a sub-agent is allowed to call.

use std::sync::Arc;

use super::Tool;
use crate::llm::ToolDefinition;

/// An ordered set of tools, keyed by name.
///
/// Registration order is preserved so listings and LLM tool definitions
/// come out in the order the host declared them. Adding a tool whose name
/// is already present replaces the earlier one in place.
#[derive(Clone, Default)]
pub struct ToolSet {
    tools: Arc<Vec<Arc<dyn Tool>>>,
}

impl ToolSet {
    /// Create an empty tool set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool.
    pub fn with<T: Tool + 'static>(self, tool: T) -> Self {
        self.with_arc(Arc::new(tool))
    }

    /// Add a tool from an Arc.
    pub fn with_arc(mut self, tool: Arc<dyn Tool>) -> Self {
        let tools = Arc::make_mut(&mut self.tools);
        match tools.iter().position(|t| t.name() == tool.name()) {
            Some(index) => tools[index] = tool,
            None => tools.push(tool),
        }
        self
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name).cloned()
    }

    /// Check whether a tool with this name is present.
    pub fn contains(&self, name: &str) -> bool {
        self.tools.iter().any(|t| t.name() == name)
    }

    /// Tool names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.name().to_string()).collect()
    }

    /// Iterate over the tools in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Tool>> {
        self.tools.iter()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Build a new set holding only the named tools, in the order given.
    ///
    /// Returns the first name with no matching tool as the error.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<ToolSet, String> {
        names.iter().try_fold(ToolSet::new(), |set, name| {
            let name = name.as_ref();
            self.get(name)
                .map(|tool| set.with_arc(tool))
                .ok_or_else(|| name.to_string())
        })
    }

    /// Convert all tools to LLM tool definitions.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }
}

impl FromIterator<Arc<dyn Tool>> for ToolSet {
    fn from_iter<I: IntoIterator<Item = Arc<dyn Tool>>>(iter: I) -> Self {
        iter.into_iter().fold(ToolSet::new(), ToolSet::with_arc)
    }
}

impl std::fmt::Debug for ToolSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.tools.iter().map(|t| t.name())).finish()
    }
}
