//! Error types for the task agent.
//!
//! Only two failure classes ever reach the caller: malformed initial input
//! and persistence failures. Reasoning-service failures are absorbed inside
//! the workflow steps and turned into degraded records.

use thiserror::Error;

/// Errors surfaced by the workflow orchestrator.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The incoming request was empty or whitespace-only. Rejected before a
    /// workflow state is created.
    #[error("cannot start a workflow from an empty request")]
    EmptyInput,

    /// A step was entered without the state its entry condition requires.
    /// Indicates a driver bug, not a user error.
    #[error("workflow state is missing {missing} at step {step}")]
    MissingState {
        step: &'static str,
        missing: &'static str,
    },

    /// Persisting the confirmed task failed. Fatal; the core does not retry.
    #[error("failed to persist task: {0}")]
    Store(#[from] StoreError),
}

/// Errors from the task store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error("failed to prepare database location: {0}")]
    Io(#[from] std::io::Error),

    /// A previous panic left the connection lock unusable.
    #[error("task store connection is no longer usable")]
    Poisoned,
}

/// Errors from the reasoning service.
///
/// These never escape a workflow step; every call site has a designated
/// degraded fallback.
#[derive(Debug, Error)]
pub enum ReasoningError {
    #[error("reasoning request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("reasoning service returned status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("reasoning service returned no content")]
    Empty,
}
