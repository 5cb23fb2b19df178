//! Resumable task confirmation agent.
//!
//! Takes a raw user request, extracts a clear task with an LLM, judges it,
//! asks the user clarifying questions when needed, optionally decomposes it
//! into subtasks, and persists the confirmed result. Runs suspend for human
//! input as plain return values and resume from serialized state.

pub mod agent;
pub mod config;
pub mod database;
pub mod error;
pub mod reasoning;
