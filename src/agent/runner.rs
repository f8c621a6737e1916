// ABOUTME: SubAgentRunner - drives a session through the step-bounded think-act loop.
// ABOUTME: Also handles single-turn follow-up chat against a finished session.

use std::sync::Arc;

use tracing::{Instrument, debug, info, info_span, warn};

use super::end_run::{END_RUN_TOOL, EndRunTool};
use super::session::{SessionStatus, SubAgentSession};
use crate::error::{LlmError, ToolError};
use crate::llm::{ContentBlock, LlmClient, Message, Request, Usage};
use crate::tool::ToolSet;

/// Sent after a step that produced text but no tool calls.
pub const CONTINUE_PROMPT: &str = "Please proceed to the next step using your best judgement. \
If you have finished the task or cannot make progress, call the end_run tool.";

/// Stored and returned when a follow-up reply carries no text.
pub const NO_ANSWER: &str = "(The sub agent gave no text answer.)";

const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Outcome of a finished run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub agent_id: String,
    pub session_id: String,
    pub status: SessionStatus,
    pub steps: usize,
    pub tool_use_count: usize,
    pub usage: Usage,
    /// Text handed back to the primary agent.
    pub summary: String,
}

/// Result of a single step of the loop.
#[derive(Debug)]
enum StepOutcome {
    /// Keep going if the step budget allows.
    Continue,
    /// The completion tool was called with this reason.
    Finished(String),
}

/// Executes sub-agent sessions against one model client.
pub struct SubAgentRunner {
    client: Arc<dyn LlmClient>,
    model: String,
    max_tokens: u32,
}

impl SubAgentRunner {
    /// Create a runner calling `model` through `client`.
    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    /// Set the per-call output token cap.
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Run a fresh session on a task until it completes or hits its step limit.
    ///
    /// Tool failures never abort the run; they are fed back to the model as
    /// error results. A model failure aborts it and is returned.
    pub async fn run(
        &self,
        session: &mut SubAgentSession,
        task: &str,
    ) -> Result<RunReport, LlmError> {
        let span = info_span!(
            "sub_agent_run",
            agent_id = %session.config().agent_id(),
            session_id = %session.session_id(),
        );
        self.run_loop(session, task).instrument(span).await
    }

    async fn run_loop(
        &self,
        session: &mut SubAgentSession,
        task: &str,
    ) -> Result<RunReport, LlmError> {
        let max_steps = session.config().max_steps;
        info!(max_steps, "sub agent run started");

        let tools = session_tools(session);
        session.push(Message::user(task));

        let stop_reason = loop {
            if !session.has_steps_left() {
                break None;
            }
            session.begin_step();
            debug!(step = session.step_count(), "sub agent step");

            match self.step(session, &tools).await? {
                StepOutcome::Continue => {}
                StepOutcome::Finished(reason) => break Some(reason),
            }
        };

        let status = match stop_reason {
            Some(_) => SessionStatus::Completed,
            None => SessionStatus::StepLimited,
        };
        session.finish(status, stop_reason);

        let summary = summarize(session);
        session.set_summary(summary.clone());

        info!(
            status = ?session.status(),
            steps = session.step_count(),
            tool_uses = session.tool_use_count(),
            "sub agent run finished"
        );

        Ok(RunReport {
            agent_id: session.config().agent_id().to_string(),
            session_id: session.session_id().to_string(),
            status: session.status(),
            steps: session.step_count(),
            tool_use_count: session.tool_use_count(),
            usage: session.usage().clone(),
            summary,
        })
    }

    /// One model call plus every tool call it requested.
    ///
    /// All calls in the response run to completion, in order, even when one
    /// of them is the completion signal.
    async fn step(
        &self,
        session: &mut SubAgentSession,
        tools: &ToolSet,
    ) -> Result<StepOutcome, LlmError> {
        let request = Request::new(&self.model)
            .system(session.system_prompt())
            .messages(session.windowed_messages())
            .tools(tools.definitions())
            .max_tokens(self.max_tokens);

        let response = self.client.create_message(&request).await.inspect_err(|e| {
            warn!(error = %e, "sub agent model call failed");
        })?;
        session.record_usage(&response.usage);

        if !response.has_tool_use() {
            if !response.content.is_empty() {
                session.push(response.into_message());
            }
            session.push(Message::user(CONTINUE_PROMPT));
            return Ok(StepOutcome::Continue);
        }

        let calls: Vec<(String, String, serde_json::Value)> = response
            .content
            .iter()
            .filter_map(|b| match b {
                ContentBlock::ToolUse { id, name, input } => {
                    Some((id.clone(), name.clone(), input.clone()))
                }
                _ => None,
            })
            .collect();
        session.push(response.into_message());

        let mut results = Vec::with_capacity(calls.len());
        let mut finished = None;

        for (id, name, input) in calls {
            session.record_tool_use();
            debug!(tool = %name, "sub agent tool call");

            let block = match tools.get(&name) {
                Some(tool) => match tool.execute(input.clone()).await {
                    Ok(result) if result.is_error => ContentBlock::tool_error(&id, result.content),
                    Ok(result) => {
                        if name == END_RUN_TOOL {
                            finished = EndRunTool::stop_reason(&input).map(str::to_string);
                        }
                        ContentBlock::tool_result(&id, result.content)
                    }
                    Err(e) => {
                        let error = ToolError::Execution(e);
                        warn!(tool = %name, error = %error, "sub agent tool failed");
                        ContentBlock::tool_error(&id, error.to_string())
                    }
                },
                None => {
                    warn!(tool = %name, "sub agent called an unknown tool");
                    ContentBlock::tool_error(&id, ToolError::NotFound(name).to_string())
                }
            };
            results.push(block);
        }

        session.push(Message::tool_results(results));

        Ok(match finished {
            Some(reason) => StepOutcome::Finished(reason),
            None => StepOutcome::Continue,
        })
    }

    /// Ask a follow-up question of a finished session.
    ///
    /// One model call. The session's tools are declared so the history's
    /// tool blocks stay valid, but any tool call in the reply is dropped.
    /// The step count and status are untouched.
    pub async fn chat(
        &self,
        session: &mut SubAgentSession,
        question: &str,
    ) -> Result<String, LlmError> {
        session.push(Message::user(question));

        let request = Request::new(&self.model)
            .system(session.system_prompt())
            .messages(session.windowed_messages())
            .tools(session_tools(session).definitions())
            .max_tokens(self.max_tokens);

        let response = self.client.create_message(&request).await.inspect_err(|e| {
            warn!(agent_id = %session.config().agent_id(), error = %e, "sub agent chat failed");
        })?;
        session.record_usage(&response.usage);

        let mut answer = response.text();
        if answer.trim().is_empty() {
            debug!(
                agent_id = %session.config().agent_id(),
                tool_calls = response.has_tool_use(),
                "sub agent follow-up had no text"
            );
            answer = NO_ANSWER.to_string();
        }
        session.push(Message::assistant(answer.clone()));
        debug!(agent_id = %session.config().agent_id(), "sub agent answered follow-up");

        Ok(answer)
    }
}

/// The sub-agent's own tools plus the completion tool.
fn session_tools(session: &SubAgentSession) -> ToolSet {
    session.config().tools.clone().with(EndRunTool)
}

/// The text returned to the primary agent. Raw history is never included.
fn summarize(session: &SubAgentSession) -> String {
    let agent_id = session.config().agent_id();
    let steps = session.step_count();
    let plural = if steps == 1 { "" } else { "s" };

    let mut summary = match (session.status(), session.stop_reason()) {
        (SessionStatus::Completed, Some(reason)) => format!(
            "Sub agent '{}' finished after {} step{}. Stop reason: {}",
            agent_id, steps, plural, reason
        ),
        _ => format!(
            "Sub agent '{}' reached its step limit ({} step{}) without finishing. \
             Latest output: {}",
            agent_id,
            steps,
            plural,
            session.latest_output().unwrap_or("(none)")
        ),
    };
    summary.push_str("\nYou can now ask it questions about the run.");
    summary
}
