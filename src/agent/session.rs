// ABOUTME: SubAgentSession - the runtime state of one sub-agent's current task.
// ABOUTME: Owns the conversation history, step count, status, and context windowing.

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use super::definition::SubAgentConfig;
use super::end_run::END_RUN_TOOL;
use crate::llm::{ContentBlock, Message, Role, Usage};

const SYSTEM_PREAMBLE: &str = "You are a sub agent working on a task delegated to you by \
another agent. You have a set of tools available. Each message may call one or more tools, \
and you will see their results right after. Reason briefly about your plan before acting.";

/// Where a session is in its lifecycle.
///
/// A sub-agent with no session yet is uninitialized; `run` moves it to
/// `Running`, and the loop ends in `Completed` or `StepLimited`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Running,
    /// The sub-agent called the completion tool.
    Completed,
    /// The step limit was reached without a completion signal.
    StepLimited,
}

impl SessionStatus {
    /// Whether the run is over and follow-up questions are allowed.
    pub fn is_terminal(self) -> bool {
        !matches!(self, SessionStatus::Running)
    }
}

/// Runtime state of one sub-agent run.
pub struct SubAgentSession {
    session_id: String,
    config: Arc<SubAgentConfig>,
    system_prompt: String,
    messages: Vec<Message>,
    step_count: usize,
    status: SessionStatus,
    stop_reason: Option<String>,
    tool_use_count: usize,
    usage: Usage,
    summary: Option<String>,
}

impl SubAgentSession {
    /// Start a new session for a sub-agent.
    pub fn new(config: Arc<SubAgentConfig>) -> Self {
        let system_prompt = system_prompt(&config);
        Self {
            session_id: Uuid::new_v4().to_string(),
            config,
            system_prompt,
            messages: Vec::new(),
            step_count: 0,
            status: SessionStatus::Running,
            stop_reason: None,
            tool_use_count: 0,
            usage: Usage::default(),
            summary: None,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn config(&self) -> &Arc<SubAgentConfig> {
        &self.config
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn step_count(&self) -> usize {
        self.step_count
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn stop_reason(&self) -> Option<&str> {
        self.stop_reason.as_deref()
    }

    pub fn tool_use_count(&self) -> usize {
        self.tool_use_count
    }

    pub fn usage(&self) -> &Usage {
        &self.usage
    }

    /// The summary returned to the primary agent when the run ended.
    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    /// True while another step may still be taken.
    pub fn has_steps_left(&self) -> bool {
        self.step_count < self.config.max_steps
    }

    pub(super) fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub(super) fn begin_step(&mut self) {
        debug_assert!(self.has_steps_left());
        self.step_count += 1;
    }

    pub(super) fn record_usage(&mut self, usage: &Usage) {
        self.usage.add(usage);
    }

    pub(super) fn record_tool_use(&mut self) {
        self.tool_use_count += 1;
    }

    pub(super) fn finish(&mut self, status: SessionStatus, stop_reason: Option<String>) {
        self.status = status;
        self.stop_reason = stop_reason;
    }

    pub(super) fn set_summary(&mut self, summary: String) {
        self.summary = Some(summary);
    }

    /// The history to send to the model, cut down to the context window.
    ///
    /// The first message (the task) is always kept. The kept tail never
    /// starts with tool results, since the calls they answer were cut.
    pub fn windowed_messages(&self) -> Vec<Message> {
        let window = match self.config.context_window {
            Some(window) if self.messages.len() > window => window,
            _ => return self.messages.clone(),
        };

        let mut start = self.messages.len() - (window - 1);
        while start < self.messages.len() && self.messages[start].has_tool_results() {
            start += 1;
        }

        let mut kept = Vec::with_capacity(window);
        kept.push(self.messages[0].clone());
        kept.extend_from_slice(&self.messages[start..]);
        kept
    }

    /// The most recent non-empty output: assistant text or a tool result.
    /// Completion-tool echoes and user text are skipped.
    pub fn latest_output(&self) -> Option<&str> {
        let end_run_ids: Vec<&str> = self
            .messages
            .iter()
            .flat_map(|m| m.content.iter())
            .filter_map(|b| match b {
                ContentBlock::ToolUse { id, name, .. } if name == END_RUN_TOOL => Some(id.as_str()),
                _ => None,
            })
            .collect();

        self.messages
            .iter()
            .skip(1)
            .rev()
            .flat_map(|m| m.content.iter().rev().map(move |b| (m.role, b)))
            .find_map(|(role, b)| match b {
                ContentBlock::Text { text }
                    if role == Role::Assistant && !text.trim().is_empty() =>
                {
                    Some(text.as_str())
                }
                ContentBlock::ToolResult {
                    tool_use_id,
                    content,
                    ..
                } if !content.trim().is_empty() && !end_run_ids.contains(&tool_use_id.as_str()) => {
                    Some(content.as_str())
                }
                _ => None,
            })
    }

    /// A point-in-time copy of the session for inspection.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.session_id.clone(),
            agent_id: self.config.agent_id().to_string(),
            status: self.status,
            step_count: self.step_count,
            max_steps: self.config.max_steps,
            stop_reason: self.stop_reason.clone(),
            tool_use_count: self.tool_use_count,
            usage: self.usage.clone(),
            summary: self.summary.clone(),
            messages: self.messages.clone(),
        }
    }
}

/// Serializable copy of a session's state, for host-side logs and tests.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub agent_id: String,
    pub status: SessionStatus,
    pub step_count: usize,
    pub max_steps: usize,
    pub stop_reason: Option<String>,
    pub tool_use_count: usize,
    pub usage: Usage,
    pub summary: Option<String>,
    pub messages: Vec<Message>,
}

fn system_prompt(config: &SubAgentConfig) -> String {
    let mut prompt = format!(
        "{}\n\nWhen you have completed the task, or you are stuck, call the {}() tool with \
         the reason for stopping and your result.\n\nOnly attempt tasks you think you can do \
         with your limited set of tools. After the run you may be asked questions about it. \
         Only answer with things you know you have done.",
        SYSTEM_PREAMBLE, END_RUN_TOOL
    );
    if !config.internal_description.trim().is_empty() {
        prompt.push_str("\n\n");
        prompt.push_str(config.internal_description.trim());
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_with_window(window: Option<usize>) -> SubAgentSession {
        let mut config = SubAgentConfig::new("test").id("t").model("m");
        config.context_window = window;
        SubAgentSession::new(Arc::new(config))
    }

    fn tool_turn(session: &mut SubAgentSession, id: &str, output: &str) {
        session.push(Message {
            role: Role::Assistant,
            content: vec![ContentBlock::tool_use(id, "lookup", serde_json::json!({}))],
        });
        session.push(Message::tool_results(vec![ContentBlock::tool_result(
            id, output,
        )]));
    }

    #[test]
    fn test_new_session_is_running_and_empty() {
        let session = session_with_window(None);
        assert_eq!(session.status(), SessionStatus::Running);
        assert!(!session.status().is_terminal());
        assert_eq!(session.step_count(), 0);
        assert!(session.messages().is_empty());
        assert!(Uuid::parse_str(session.session_id()).is_ok());
    }

    #[test]
    fn test_system_prompt_includes_internal_description() {
        let config = SubAgentConfig::new("public")
            .id("t")
            .model("m")
            .internal_description("Prefer metric units.");
        let session = SubAgentSession::new(Arc::new(config));

        assert!(session.system_prompt().contains(END_RUN_TOOL));
        assert!(session.system_prompt().ends_with("Prefer metric units."));
        assert!(!session.system_prompt().contains("public"));
    }

    #[test]
    fn test_no_window_sends_everything() {
        let mut session = session_with_window(None);
        session.push(Message::user("task"));
        for i in 0..5 {
            tool_turn(&mut session, &format!("c{}", i), "out");
        }
        assert_eq!(session.windowed_messages().len(), 11);
    }

    #[test]
    fn test_window_keeps_task_and_skips_orphan_results() {
        let mut session = session_with_window(Some(4));
        session.push(Message::user("task"));
        tool_turn(&mut session, "c1", "one");
        tool_turn(&mut session, "c2", "two");
        tool_turn(&mut session, "c3", "three");

        // A tail of 3 would open on c2's results, so it starts at the c3 call.
        let window = session.windowed_messages();
        assert_eq!(window[0].text(), "task");
        assert!(!window[1].has_tool_results());
        assert_eq!(window.len(), 3);
        assert!(window.len() <= 4);
    }

    #[test]
    fn test_window_not_applied_when_history_fits() {
        let mut session = session_with_window(Some(10));
        session.push(Message::user("task"));
        tool_turn(&mut session, "c1", "one");
        assert_eq!(session.windowed_messages(), session.messages().to_vec());
    }

    #[test]
    fn test_latest_output_prefers_newest_and_skips_end_run() {
        let mut session = session_with_window(None);
        session.push(Message::user("task"));
        tool_turn(&mut session, "c1", "sunny");
        session.push(Message {
            role: Role::Assistant,
            content: vec![ContentBlock::tool_use(
                "c2",
                END_RUN_TOOL,
                serde_json::json!({"stop_reason": "done"}),
            )],
        });
        session.push(Message::tool_results(vec![ContentBlock::tool_result(
            "c2",
            "Run ended with reason: done",
        )]));

        assert_eq!(session.latest_output(), Some("sunny"));
    }

    #[test]
    fn test_latest_output_ignores_task_message() {
        let mut session = session_with_window(None);
        session.push(Message::user("task"));
        assert_eq!(session.latest_output(), None);
    }

    #[test]
    fn test_step_accounting() {
        let mut config = SubAgentConfig::new("x").id("t").model("m");
        config.max_steps = 2;
        let mut session = SubAgentSession::new(Arc::new(config));

        assert!(session.has_steps_left());
        session.begin_step();
        session.begin_step();
        assert!(!session.has_steps_left());
        assert_eq!(session.step_count(), 2);

        session.finish(SessionStatus::StepLimited, None);
        assert!(session.status().is_terminal());
        assert_eq!(session.snapshot().status, SessionStatus::StepLimited);
    }
}
