// ABOUTME: Root module for multiagent - sub-agent delegation for host agents.
// ABOUTME: Re-exports the setup entry point and the unified error type.

pub mod agent;
pub mod config;
pub mod error;
pub mod llm;
pub mod prelude;
pub mod tool;

pub use agent::init_sub_agents;
pub use error::MultiAgentError;
