//! Data types for the task agent workflow.
//!
//! This module defines the records that flow through the state machine:
//!
//! 1. **TaskMetadata** - the extracted task with confidence and open points
//! 2. **Judgment** - a pass/fail verdict over a task or its decomposition
//! 3. **SubtaskMetadata** - the proposed decomposition of a task
//! 4. **WorkflowState** - the aggregate a single run threads through every step
//!
//! Metadata records are replaced wholesale on each re-extraction; only the
//! judgment step appends to an existing record (its extra questions are
//! merged into the metadata's question list).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::agent::retry::RetryCounter;
use crate::error::AgentError;

/// Pass/fail verdict of a judgment call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Pass,
    Fail,
}

/// The extracted task, replaced wholesale on every (re-)extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskMetadata {
    /// Canonical restatement of the user's request.
    pub task: String,

    /// Extraction confidence in `[0, 1]`.
    pub confidence: f64,

    /// Concerns about the task's clarity or feasibility.
    #[serde(default)]
    pub concerns: Vec<String>,

    /// Clarifying questions, including any appended by a later judgment.
    #[serde(default)]
    pub questions: Vec<String>,

    /// Whether decomposition into subtasks is offered at all.
    #[serde(default = "default_subtaskable")]
    pub is_subtaskable: bool,
}

fn default_subtaskable() -> bool {
    true
}

impl TaskMetadata {
    /// Degraded record used when the extraction response cannot be parsed.
    ///
    /// Keeps the raw input as the task text so the run can still progress
    /// through the clarification loop instead of crashing.
    pub fn degraded(task: &str, detail: &str) -> Self {
        Self {
            task: task.to_string(),
            confidence: 0.0,
            concerns: vec![format!(
                "Unable to parse task extraction response: {}",
                detail
            )],
            questions: Vec::new(),
            is_subtaskable: true,
        }
    }
}

/// A judgment verdict with its reason.
///
/// Used for both the task and its decomposition; the two are tracked in
/// separate [`WorkflowState`] fields and never share retry budgets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Judgment {
    #[serde(rename = "judgment")]
    pub verdict: Verdict,

    pub reason: String,

    /// Additional clarifying questions raised by the judge. Merged into the
    /// metadata's question list when the judgment is recorded.
    #[serde(default)]
    pub questions: Vec<String>,
}

impl Judgment {
    /// Synthetic pass produced when a retry budget is exhausted.
    ///
    /// Routes identically to a genuine pass but carries a reason that lets
    /// downstream consumers tell the two apart.
    pub fn forced_pass() -> Self {
        Self {
            verdict: Verdict::Pass,
            reason: crate::agent::retry::MAX_RETRIES_REASON.to_string(),
            questions: Vec::new(),
        }
    }

    /// Pass recorded when the user explicitly accepted the subtask breakdown
    /// while the run was suspended for clarification.
    pub fn user_accepted() -> Self {
        Self {
            verdict: Verdict::Pass,
            reason: "User accepted the subtask breakdown".to_string(),
            questions: Vec::new(),
        }
    }

    /// Degraded failing judgment used when a judgment response cannot be
    /// parsed.
    pub fn degraded(subject: &str, detail: &str) -> Self {
        Self {
            verdict: Verdict::Fail,
            reason: format!("Unable to parse {} judgment response: {}", subject, detail),
            questions: Vec::new(),
        }
    }
}

/// The proposed decomposition, replaced wholesale on every (re-)generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubtaskMetadata {
    /// Ordered decomposition of the main task.
    #[serde(default)]
    pub subtasks: Vec<String>,

    /// Decomposition confidence in `[0, 1]`.
    pub confidence: f64,

    #[serde(default)]
    pub concerns: Vec<String>,

    #[serde(default)]
    pub questions: Vec<String>,

    /// Whether a human explicitly approved this breakdown, independent of the
    /// automated judgment.
    #[serde(default)]
    pub user_accepted_subtasks: bool,
}

impl SubtaskMetadata {
    /// Degraded record used when the generation response cannot be parsed.
    /// The empty decomposition fails the next judgment and routes the run
    /// into the clarification loop.
    pub fn degraded(detail: &str) -> Self {
        Self {
            subtasks: Vec::new(),
            confidence: 0.0,
            concerns: vec![format!(
                "Unable to parse subtask generation response: {}",
                detail
            )],
            questions: Vec::new(),
            user_accepted_subtasks: false,
        }
    }
}

/// Human yes/no decision on whether to decompose the task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Yes,
    No,
}

/// Named steps of the workflow state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStep {
    Extract,
    JudgeTask,
    AskAboutTask,
    RetryTask,
    AskSubtask,
    GenerateSubtasks,
    JudgeSubtasks,
    AskAboutSubtasks,
    RetrySubtasks,
    CreateTask,
}

impl WorkflowStep {
    pub fn name(&self) -> &'static str {
        match self {
            WorkflowStep::Extract => "extract",
            WorkflowStep::JudgeTask => "judge_task",
            WorkflowStep::AskAboutTask => "ask_about_task",
            WorkflowStep::RetryTask => "retry_task",
            WorkflowStep::AskSubtask => "ask_subtask",
            WorkflowStep::GenerateSubtasks => "generate_subtasks",
            WorkflowStep::JudgeSubtasks => "judge_subtasks",
            WorkflowStep::AskAboutSubtasks => "ask_about_subtasks",
            WorkflowStep::RetrySubtasks => "retry_subtasks",
            WorkflowStep::CreateTask => "create_task",
        }
    }
}

/// The aggregate state of one workflow run.
///
/// Serializable so a suspended run can be stored and resumed later; the
/// orchestrating call owns it exclusively for the duration of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowState {
    /// The original user request, never mutated after creation.
    pub input: String,

    /// The step the run is currently at (or suspended in).
    pub step: WorkflowStep,

    pub task_metadata: Option<TaskMetadata>,
    pub task_judgment: Option<Judgment>,
    pub task_retry: RetryCounter,

    pub subtask_metadata: Option<SubtaskMetadata>,
    pub subtask_judgment: Option<Judgment>,
    pub subtask_retry: RetryCounter,

    /// Pending human decision on decomposition; `None` until resolved.
    pub subtask_decision: Option<Decision>,
    pub decision_retry: RetryCounter,

    /// The last clarification or decision prompt shown to the user.
    pub last_prompt: Option<String>,

    /// The most recent human free-text reply, consumed by the step that
    /// needed it.
    pub user_reply: Option<String>,

    /// Set exactly once, when the task has been persisted.
    pub committed: bool,

    /// Identifier assigned by the store at commit time.
    pub task_id: Option<Uuid>,
}

impl WorkflowState {
    /// Create a fresh state for an incoming request with default retry
    /// limits. Rejects empty or whitespace-only input.
    pub fn new(input: impl Into<String>) -> Result<Self, AgentError> {
        Self::with_retry_limit(input, RetryCounter::DEFAULT_LIMIT)
    }

    /// Create a fresh state with a custom limit shared by all three retry
    /// counters (the counters themselves stay independent).
    pub fn with_retry_limit(input: impl Into<String>, limit: u32) -> Result<Self, AgentError> {
        let input = input.into();
        if input.trim().is_empty() {
            return Err(AgentError::EmptyInput);
        }
        Ok(Self {
            input,
            step: WorkflowStep::Extract,
            task_metadata: None,
            task_judgment: None,
            task_retry: RetryCounter::new(limit),
            subtask_metadata: None,
            subtask_judgment: None,
            subtask_retry: RetryCounter::new(limit),
            subtask_decision: None,
            decision_retry: RetryCounter::new(limit),
            last_prompt: None,
            user_reply: None,
            committed: false,
            task_id: None,
        })
    }
}

/// The durably recorded result of a successful run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmedTask {
    pub id: Uuid,
    pub task: String,
    pub subtasks: Vec<String>,
}
