// ABOUTME: ModelRouter - resolves "provider/model" identifiers to LLM clients.
// ABOUTME: Strips the provider prefix before the model name reaches the API.

use std::collections::HashMap;
use std::sync::Arc;

use super::{AnthropicClient, ClientResolver, LlmClient, OpenAIClient, ResolvedModel};
use crate::error::LlmError;

/// Routes model identifiers to clients by provider prefix.
///
/// `openai/gpt-4o` is sent to the client registered as `openai` with the
/// model name `gpt-4o`. Identifiers with no registered prefix go to the
/// fallback client unchanged, if one is set.
#[derive(Clone, Default)]
pub struct ModelRouter {
    providers: HashMap<String, Arc<dyn LlmClient>>,
    fallback: Option<Arc<dyn LlmClient>>,
}

impl ModelRouter {
    /// Create an empty router.
    pub fn new() -> Self {
        Self::default()
    }

    /// Route every model to a single client.
    pub fn with_fallback(client: Arc<dyn LlmClient>) -> Self {
        Self::new().fallback(client)
    }

    /// Register a client for a provider prefix.
    pub fn provider(mut self, name: impl Into<String>, client: Arc<dyn LlmClient>) -> Self {
        self.providers.insert(name.into(), client);
        self
    }

    /// Set the client used when no provider prefix matches.
    pub fn fallback(mut self, client: Arc<dyn LlmClient>) -> Self {
        self.fallback = Some(client);
        self
    }

    /// Register the providers whose API keys are present in the environment.
    pub fn from_env() -> Self {
        let mut router = Self::new();
        if let Ok(client) = OpenAIClient::from_env() {
            router = router.provider("openai", Arc::new(client));
        }
        if let Ok(client) = AnthropicClient::from_env() {
            router = router.provider("anthropic", Arc::new(client));
        }
        router
    }

    /// Registered provider prefixes, sorted.
    pub fn providers(&self) -> Vec<String> {
        let mut names: Vec<_> = self.providers.keys().cloned().collect();
        names.sort();
        names
    }
}

impl ClientResolver for ModelRouter {
    fn resolve(&self, model: &str) -> Result<ResolvedModel, LlmError> {
        if let Some((prefix, name)) = model.split_once('/') {
            if let Some(client) = self.providers.get(prefix) {
                return Ok(ResolvedModel {
                    client: client.clone(),
                    model: name.to_string(),
                });
            }
        }

        match &self.fallback {
            Some(client) => Ok(ResolvedModel {
                client: client.clone(),
                model: model.to_string(),
            }),
            None => Err(LlmError::Configuration(format!(
                "No client configured for model '{}' (providers: {})",
                model,
                self.providers().join(", ")
            ))),
        }
    }
}
