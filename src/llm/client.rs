// ABOUTME: Defines the LlmClient trait - the model-execution collaborator -
// ABOUTME: and ClientResolver, which maps a model identifier to a client.

use std::sync::Arc;

use async_trait::async_trait;

use super::{Request, Response};
use crate::error::LlmError;

/// Trait for LLM client implementations.
///
/// Given a conversation and a tool list, a client returns the model's next
/// action: text, tool calls, or both.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Create a message (non-streaming).
    async fn create_message(&self, req: &Request) -> Result<Response, LlmError>;
}

/// A client paired with the model name it should be called with.
#[derive(Clone)]
pub struct ResolvedModel {
    pub client: Arc<dyn LlmClient>,
    pub model: String,
}

/// Looks up the client responsible for a sub-agent's model identifier.
pub trait ClientResolver: Send + Sync {
    fn resolve(&self, model: &str) -> Result<ResolvedModel, LlmError>;
}

impl<F> ClientResolver for F
where
    F: Fn(&str) -> Arc<dyn LlmClient> + Send + Sync,
{
    fn resolve(&self, model: &str) -> Result<ResolvedModel, LlmError> {
        Ok(ResolvedModel {
            client: self(model),
            model: model.to_string(),
        })
    }
}
