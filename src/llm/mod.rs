// ABOUTME: LLM module - the model-execution collaborator behind every sub-agent.
// ABOUTME: Defines types, the client trait, provider clients, and routing.

mod anthropic;
mod client;
mod openai;
mod router;
mod scripted;
mod types;

pub use anthropic::*;
pub use client::*;
pub use openai::*;
pub use router::*;
pub use scripted::*;
pub use types::*;

#[cfg(test)]
mod types_test;
