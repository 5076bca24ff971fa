//! Core logic including the run loop, agent handoff, tool execution,
//! and the completion gateway.

#![deny(missing_docs)]
#![deny(clippy::missing_safety_doc)]

#[macro_use]
extern crate tracing;

mod agent;
pub mod context;
mod gateway;
mod runner;
pub mod tool;

pub use agent::{Agent, AgentBuilder, Instructions};
pub use gateway::CompletionClient;
pub use runner::{DEFAULT_MAX_TURNS, RunResponse, Runner, Turn};
