// ABOUTME: Sub-agent delegation module - registry, sessions, the step-bounded loop,
// ABOUTME: and the list/run/chat tools handed to a primary agent.

mod definition;
mod delegation;
mod end_run;
mod runner;
mod session;
mod tools;

pub use definition::{
    DEFAULT_MAX_STEPS, SubAgentConfig, SubAgentRegistry, SubAgentRegistryBuilder, SubAgentSpec,
};
pub use delegation::DelegationToolset;
pub use end_run::{END_RUN_TOOL, EndRunTool};
pub use runner::{CONTINUE_PROMPT, NO_ANSWER, RunReport, SubAgentRunner};
pub use session::{SessionSnapshot, SessionStatus, SubAgentSession};
pub use tools::{
    ChatWithSubAgentTool, RunSubAgentTool, SubAgentSpecsTool, delegation_tools, init_sub_agents,
};

#[cfg(test)]
mod delegation_test;
