//! The task confirmation workflow: types, retry accounting, prompts, and the
//! orchestrator that ties them together.

pub mod clarify;
pub mod decision;
pub mod prompts;
pub mod retry;
pub mod types;
pub mod workflow;

pub use retry::{RetryCounter, RetryVerdict, MAX_RETRIES_REASON};
pub use types::{
    ConfirmedTask, Decision, Judgment, SubtaskMetadata, TaskMetadata, Verdict, WorkflowState,
    WorkflowStep,
};
pub use workflow::{RunOutcome, TaskAgent};
