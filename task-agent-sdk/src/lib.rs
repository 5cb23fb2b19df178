//! Structured observability events for the task agent workflow.
//!
//! The orchestrator reports its progress as typed [`AgentLog`] events instead
//! of ad-hoc log lines. Events are serialized as single-line JSON and emitted
//! on stderr with a fixed prefix so that supervising processes (a TUI, a test
//! harness, a log shipper) can pick them out of mixed output.
//!
//! The sink is an explicit dependency: construct a [`StderrSink`] (or your
//! own [`EventSink`] implementation) and hand it to the orchestrator rather
//! than relying on process-global state.

use serde::{Deserialize, Serialize};

/// Prefix for machine-readable event lines on stderr.
pub const EVENT_PREFIX: &str = "__AGENT_EVENT__";

/// Structured events emitted while a workflow run progresses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentLog {
    /// A workflow step began executing.
    StepStarted { step: String },
    /// The run suspended and is waiting for human input.
    Suspended { step: String, prompt: String },
    /// A suspended run was resumed with a human reply.
    Resumed { step: String },
    /// A judgment verdict was recorded, with the retry count that produced it.
    JudgmentRecorded {
        subject: String,
        verdict: String,
        reason: String,
        retries: u32,
    },
    /// A reasoning response could not be parsed and a degraded record was
    /// substituted.
    ParseFallback { step: String, detail: String },
    /// The confirmed task was persisted.
    TaskCommitted { task: String, subtask_count: usize },
    /// The run ended with an unrecoverable error.
    WorkflowFailed { step: String, error: String },
}

impl AgentLog {
    /// Emit this event to stderr as a prefixed JSON line.
    pub fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            use std::io::Write;
            eprintln!("{}:{}", EVENT_PREFIX, json);
            // Interleaved task output must not hold back event lines.
            let _ = std::io::stderr().flush();
        }
    }
}

/// Destination for [`AgentLog`] events.
///
/// Implementations must be cheap to call; the orchestrator emits an event per
/// step transition.
pub trait EventSink: Send + Sync {
    fn emit(&self, log: &AgentLog);
}

/// Sink that writes prefixed JSON lines to stderr.
#[derive(Debug, Default)]
pub struct StderrSink;

impl EventSink for StderrSink {
    fn emit(&self, log: &AgentLog) {
        log.emit();
    }
}

/// Sink that discards all events.
#[derive(Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _log: &AgentLog) {}
}
