// ABOUTME: DelegationToolset - the list/run/chat operations offered to a primary agent.
// ABOUTME: Owns one session slot per sub-agent and turns per-call failures into text.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{info, warn};

use super::definition::{SubAgentRegistry, SubAgentSpec};
use super::runner::{RunReport, SubAgentRunner};
use super::session::{SessionSnapshot, SubAgentSession};
use crate::error::DelegationError;
use crate::llm::ClientResolver;

type SessionSlot = Arc<Mutex<SubAgentSession>>;

/// The delegation operations over a fixed set of sub-agents.
///
/// Each sub-agent has at most one session, replaced by every `run`. A call
/// that finds the sub-agent's session in use by another call fails with
/// [`DelegationError::SessionBusy`] rather than queueing behind it.
pub struct DelegationToolset {
    registry: Arc<SubAgentRegistry>,
    clients: Arc<dyn ClientResolver>,
    sessions: Mutex<HashMap<String, SessionSlot>>,
    max_tokens: Option<u32>,
}

impl DelegationToolset {
    /// Create a toolset over a registry, resolving models through `clients`.
    pub fn new(registry: Arc<SubAgentRegistry>, clients: impl ClientResolver + 'static) -> Self {
        Self {
            registry,
            clients: Arc::new(clients),
            sessions: Mutex::new(HashMap::new()),
            max_tokens: None,
        }
    }

    /// Cap output tokens per sub-agent model call.
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn registry(&self) -> &SubAgentRegistry {
        &self.registry
    }

    /// Listing entries for every sub-agent.
    pub fn specs(&self) -> Vec<SubAgentSpec> {
        self.registry.describe_all()
    }

    /// The listing text shown to the primary agent.
    pub fn sub_agent_specs(&self) -> String {
        self.specs()
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Run a sub-agent on a task and return its summary.
    pub async fn run_sub_agent(
        &self,
        agent_id: &str,
        task: &str,
    ) -> Result<String, DelegationError> {
        self.run(agent_id, task).await.map(|report| report.summary)
    }

    /// Run a sub-agent on a task, replacing its previous session.
    ///
    /// If the model fails mid-run the new session is discarded, leaving the
    /// sub-agent uninitialized.
    pub async fn run(&self, agent_id: &str, task: &str) -> Result<RunReport, DelegationError> {
        let config = self.registry.get(agent_id)?;
        let task = task.trim();
        if task.is_empty() {
            return Err(DelegationError::EmptyInput("Instructions"));
        }
        let runner = self.runner_for(config.model_name())?;

        let (slot, mut session) = {
            let mut sessions = self.sessions.lock().await;
            if let Some(existing) = sessions.get(agent_id) {
                if existing.try_lock().is_err() {
                    return Err(DelegationError::SessionBusy(agent_id.to_string()));
                }
            }
            let slot: SessionSlot = Arc::new(Mutex::new(SubAgentSession::new(config)));
            let guard = slot
                .clone()
                .try_lock_owned()
                .map_err(|_| DelegationError::SessionBusy(agent_id.to_string()))?;
            sessions.insert(agent_id.to_string(), slot.clone());
            (slot, guard)
        };

        info!(agent_id, "delegating task to sub agent");
        match runner.run(&mut session, task).await {
            Ok(report) => Ok(report),
            Err(e) => {
                drop(session);
                let mut sessions = self.sessions.lock().await;
                if sessions.get(agent_id).is_some_and(|s| Arc::ptr_eq(s, &slot)) {
                    sessions.remove(agent_id);
                }
                warn!(agent_id, error = %e, "sub agent run aborted");
                Err(e.into())
            }
        }
    }

    /// Ask a follow-up question of a sub-agent that has been run.
    pub async fn chat_with_sub_agent(
        &self,
        agent_id: &str,
        question: &str,
    ) -> Result<String, DelegationError> {
        let config = self.registry.get(agent_id)?;
        let question = question.trim();
        if question.is_empty() {
            return Err(DelegationError::EmptyInput("Question"));
        }
        let runner = self.runner_for(config.model_name())?;

        let mut session = self.checkout(agent_id).await?;
        Ok(runner.chat(&mut session, question).await?)
    }

    /// Copy of a sub-agent's finished session, if it has one and it is idle.
    pub async fn session_snapshot(&self, agent_id: &str) -> Option<SessionSnapshot> {
        self.checkout(agent_id).await.ok().map(|s| s.snapshot())
    }

    /// Lock the existing session for a sub-agent without waiting.
    ///
    /// A session left `Running` by a cancelled run never finished, so it
    /// counts as no session at all.
    async fn checkout(
        &self,
        agent_id: &str,
    ) -> Result<OwnedMutexGuard<SubAgentSession>, DelegationError> {
        let slot = self
            .sessions
            .lock()
            .await
            .get(agent_id)
            .cloned()
            .ok_or_else(|| DelegationError::NoSession(agent_id.to_string()))?;
        let session = slot
            .try_lock_owned()
            .map_err(|_| DelegationError::SessionBusy(agent_id.to_string()))?;
        if !session.status().is_terminal() {
            warn!(agent_id, "sub agent session was left unfinished");
            return Err(DelegationError::NoSession(agent_id.to_string()));
        }
        Ok(session)
    }

    fn runner_for(&self, model: &str) -> Result<SubAgentRunner, DelegationError> {
        let resolved = self.clients.resolve(model)?;
        let runner = SubAgentRunner::new(resolved.client, resolved.model);
        Ok(match self.max_tokens {
            Some(max) => runner.max_tokens(max),
            None => runner,
        })
    }
}
