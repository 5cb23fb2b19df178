//! The workflow orchestrator.
//!
//! A run is a loop over [`WorkflowStep`]s. Each step either continues to the
//! next step, suspends with a prompt for the human, or finishes with a
//! [`ConfirmedTask`]. Suspension is an ordinary return value: the caller keeps
//! the serialized [`WorkflowState`], collects a reply, and calls
//! [`TaskAgent::resume`].
//!
//! Reasoning failures never abort a run; every call site substitutes a
//! degraded record and lets the retry machinery route around it. The only
//! fatal errors are malformed initial input and persistence failures.

use std::sync::Arc;

use task_agent_sdk::{AgentLog, EventSink, StderrSink};

use crate::agent::clarify::{build_clarification_prompt, ClarifyScope};
use crate::agent::decision::parse_decision;
use crate::agent::prompts;
use crate::agent::retry::RetryVerdict;
use crate::agent::types::{
    ConfirmedTask, Decision, Judgment, SubtaskMetadata, TaskMetadata, Verdict, WorkflowState,
    WorkflowStep,
};
use crate::database::TaskStore;
use crate::error::AgentError;
use crate::reasoning::{parse_response, ReasoningRequest, ReasoningService};

/// What a single step decided.
enum StepOutcome {
    Continue(WorkflowStep),
    Suspended { prompt: String },
    Done(ConfirmedTask),
}

/// What a full run (up to the next suspension) produced.
#[derive(Debug)]
pub enum RunOutcome {
    /// The run is suspended; show the prompt and resume with the reply.
    NeedsInput { prompt: String },
    /// The task was confirmed and persisted.
    Complete(ConfirmedTask),
}

/// Drives workflow states through the state machine.
///
/// Stateless between calls; all run state lives in the [`WorkflowState`]
/// passed in, so one agent can drive any number of interleaved runs.
pub struct TaskAgent {
    reasoning: Arc<dyn ReasoningService>,
    store: Arc<dyn TaskStore>,
    events: Arc<dyn EventSink>,
}

impl TaskAgent {
    pub fn new(reasoning: Arc<dyn ReasoningService>, store: Arc<dyn TaskStore>) -> Self {
        Self {
            reasoning,
            store,
            events: Arc::new(StderrSink),
        }
    }

    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Advance the state until it suspends or completes.
    pub async fn run(&self, state: &mut WorkflowState) -> Result<RunOutcome, AgentError> {
        loop {
            self.events.emit(&AgentLog::StepStarted {
                step: state.step.name().to_string(),
            });
            tracing::debug!(step = state.step.name(), "executing workflow step");

            let outcome = match self.execute_step(state).await {
                Ok(outcome) => outcome,
                Err(err) => {
                    self.events.emit(&AgentLog::WorkflowFailed {
                        step: state.step.name().to_string(),
                        error: err.to_string(),
                    });
                    return Err(err);
                }
            };

            match outcome {
                StepOutcome::Continue(next) => state.step = next,
                StepOutcome::Suspended { prompt } => {
                    state.last_prompt = Some(prompt.clone());
                    self.events.emit(&AgentLog::Suspended {
                        step: state.step.name().to_string(),
                        prompt: prompt.clone(),
                    });
                    return Ok(RunOutcome::NeedsInput { prompt });
                }
                StepOutcome::Done(task) => return Ok(RunOutcome::Complete(task)),
            }
        }
    }

    /// Resume a suspended state with the human's reply.
    pub async fn resume(
        &self,
        state: &mut WorkflowState,
        reply: impl Into<String>,
    ) -> Result<RunOutcome, AgentError> {
        self.events.emit(&AgentLog::Resumed {
            step: state.step.name().to_string(),
        });
        state.user_reply = Some(reply.into());
        self.run(state).await
    }

    async fn execute_step(&self, state: &mut WorkflowState) -> Result<StepOutcome, AgentError> {
        match state.step {
            WorkflowStep::Extract => self.extract(state).await,
            WorkflowStep::JudgeTask => self.judge_task(state).await,
            WorkflowStep::AskAboutTask => self.ask_about_task(state).await,
            WorkflowStep::RetryTask => self.retry_task(state).await,
            WorkflowStep::AskSubtask => self.ask_subtask(state),
            WorkflowStep::GenerateSubtasks => self.generate_subtasks(state).await,
            WorkflowStep::JudgeSubtasks => self.judge_subtasks(state).await,
            WorkflowStep::AskAboutSubtasks => self.ask_about_subtasks(state).await,
            WorkflowStep::RetrySubtasks => self.retry_subtasks(state).await,
            WorkflowStep::CreateTask => self.create_task(state).await,
        }
    }

    /// Run one reasoning call and parse its JSON payload. Failures come back
    /// as a human-readable detail string for the caller's degraded record.
    async fn complete_parsed<T: serde::de::DeserializeOwned>(
        &self,
        system: &str,
        user: String,
        step: WorkflowStep,
    ) -> Result<T, String> {
        let request = ReasoningRequest {
            system: system.to_string(),
            user,
        };
        let text = match self.reasoning.complete(&request).await {
            Ok(text) => text,
            Err(err) => {
                let detail = err.to_string();
                self.events.emit(&AgentLog::ParseFallback {
                    step: step.name().to_string(),
                    detail: detail.clone(),
                });
                return Err(detail);
            }
        };
        match parse_response(&text) {
            Ok(value) => Ok(value),
            Err(err) => {
                let detail = err.to_string();
                self.events.emit(&AgentLog::ParseFallback {
                    step: step.name().to_string(),
                    detail: detail.clone(),
                });
                Err(detail)
            }
        }
    }

    async fn extract(&self, state: &mut WorkflowState) -> Result<StepOutcome, AgentError> {
        state.last_prompt = None;
        state.user_reply = None;
        state.task_judgment = None;

        let metadata = match self
            .complete_parsed::<TaskMetadata>(
                prompts::TASK_EXTRACTION_SYSTEM_PROMPT,
                prompts::format_extraction_prompt(&state.input),
                WorkflowStep::Extract,
            )
            .await
        {
            Ok(metadata) => metadata,
            Err(detail) => TaskMetadata::degraded(&state.input, &detail),
        };
        state.task_metadata = Some(metadata);
        Ok(StepOutcome::Continue(WorkflowStep::JudgeTask))
    }

    async fn judge_task(&self, state: &mut WorkflowState) -> Result<StepOutcome, AgentError> {
        let metadata = state
            .task_metadata
            .as_ref()
            .ok_or(AgentError::MissingState {
                step: "judge_task",
                missing: "task metadata",
            })?;

        let mut judgment = match self
            .complete_parsed::<Judgment>(
                prompts::TASK_JUDGMENT_SYSTEM_PROMPT,
                prompts::format_judgment_prompt(
                    &metadata.task,
                    metadata.confidence,
                    &metadata.concerns,
                    &metadata.questions,
                ),
                WorkflowStep::JudgeTask,
            )
            .await
        {
            Ok(judgment) => judgment,
            Err(detail) => Judgment::degraded("task", &detail),
        };

        if let Some(metadata) = state.task_metadata.as_mut() {
            metadata.questions.extend(judgment.questions.drain(..));
        }

        let verdict = state
            .task_retry
            .record_outcome(judgment.verdict == Verdict::Pass);
        if verdict == RetryVerdict::ForcedPass {
            judgment = Judgment::forced_pass();
        }
        self.events.emit(&AgentLog::JudgmentRecorded {
            subject: "task".to_string(),
            verdict: match judgment.verdict {
                Verdict::Pass => "pass".to_string(),
                Verdict::Fail => "fail".to_string(),
            },
            reason: judgment.reason.clone(),
            retries: state.task_retry.count(),
        });
        state.task_judgment = Some(judgment);

        match verdict {
            RetryVerdict::Pass | RetryVerdict::ForcedPass => {
                Ok(StepOutcome::Continue(WorkflowStep::AskSubtask))
            }
            RetryVerdict::Fail => Ok(StepOutcome::Continue(WorkflowStep::AskAboutTask)),
        }
    }

    async fn ask_about_task(&self, state: &mut WorkflowState) -> Result<StepOutcome, AgentError> {
        if state.user_reply.is_none() {
            let metadata = state
                .task_metadata
                .as_ref()
                .ok_or(AgentError::MissingState {
                    step: "ask_about_task",
                    missing: "task metadata",
                })?;
            let judgment = state
                .task_judgment
                .as_ref()
                .ok_or(AgentError::MissingState {
                    step: "ask_about_task",
                    missing: "task judgment",
                })?;
            let prompt = build_clarification_prompt(
                self.reasoning.as_ref(),
                ClarifyScope::Task(metadata),
                judgment,
            )
            .await;
            return Ok(StepOutcome::Suspended { prompt });
        }
        // Reply in hand; the failed judgment has served its purpose.
        state.task_judgment = None;
        Ok(StepOutcome::Continue(WorkflowStep::RetryTask))
    }

    async fn retry_task(&self, state: &mut WorkflowState) -> Result<StepOutcome, AgentError> {
        let feedback = state.user_reply.take().ok_or(AgentError::MissingState {
            step: "retry_task",
            missing: "user reply",
        })?;
        let current_task = state
            .task_metadata
            .as_ref()
            .map(|m| m.task.clone())
            .unwrap_or_else(|| state.input.clone());

        let metadata = match self
            .complete_parsed::<TaskMetadata>(
                prompts::TASK_EXTRACTION_SYSTEM_PROMPT,
                prompts::format_retry_extraction_prompt(&state.input, &current_task, &feedback),
                WorkflowStep::RetryTask,
            )
            .await
        {
            Ok(metadata) => metadata,
            Err(detail) => TaskMetadata::degraded(&current_task, &detail),
        };
        state.task_metadata = Some(metadata);
        Ok(StepOutcome::Continue(WorkflowStep::JudgeTask))
    }

    fn ask_subtask(&self, state: &mut WorkflowState) -> Result<StepOutcome, AgentError> {
        let metadata = state
            .task_metadata
            .as_ref()
            .ok_or(AgentError::MissingState {
                step: "ask_subtask",
                missing: "task metadata",
            })?;

        // Atomic tasks skip the question entirely.
        if !metadata.is_subtaskable {
            state.subtask_decision = Some(Decision::No);
            return Ok(StepOutcome::Continue(WorkflowStep::CreateTask));
        }

        let Some(reply) = state.user_reply.take() else {
            return Ok(StepOutcome::Suspended {
                prompt: prompts::SUBTASK_DECISION_PROMPT.to_string(),
            });
        };

        match parse_decision(&reply) {
            Some(decision) => {
                state.decision_retry.record_outcome(true);
                state.subtask_decision = Some(decision);
                match decision {
                    Decision::Yes => Ok(StepOutcome::Continue(WorkflowStep::GenerateSubtasks)),
                    Decision::No => Ok(StepOutcome::Continue(WorkflowStep::CreateTask)),
                }
            }
            None => match state.decision_retry.record_outcome(false) {
                RetryVerdict::ForcedPass => {
                    tracing::info!("decision retries exhausted, defaulting to no decomposition");
                    state.subtask_decision = Some(Decision::No);
                    Ok(StepOutcome::Continue(WorkflowStep::CreateTask))
                }
                _ => Ok(StepOutcome::Suspended {
                    prompt: prompts::SUBTASK_DECISION_RETRY_PROMPT.to_string(),
                }),
            },
        }
    }

    async fn generate_subtasks(&self, state: &mut WorkflowState) -> Result<StepOutcome, AgentError> {
        let task = state
            .task_metadata
            .as_ref()
            .map(|m| m.task.clone())
            .ok_or(AgentError::MissingState {
                step: "generate_subtasks",
                missing: "task metadata",
            })?;

        let metadata = match self
            .complete_parsed::<SubtaskMetadata>(
                prompts::SUBTASK_GENERATION_SYSTEM_PROMPT,
                prompts::format_subtask_generation_prompt(&task),
                WorkflowStep::GenerateSubtasks,
            )
            .await
        {
            Ok(metadata) => metadata,
            Err(detail) => SubtaskMetadata::degraded(&detail),
        };
        state.subtask_metadata = Some(metadata);
        Ok(StepOutcome::Continue(WorkflowStep::JudgeSubtasks))
    }

    async fn judge_subtasks(&self, state: &mut WorkflowState) -> Result<StepOutcome, AgentError> {
        let task = state
            .task_metadata
            .as_ref()
            .map(|m| m.task.clone())
            .ok_or(AgentError::MissingState {
                step: "judge_subtasks",
                missing: "task metadata",
            })?;
        let metadata = state
            .subtask_metadata
            .as_ref()
            .ok_or(AgentError::MissingState {
                step: "judge_subtasks",
                missing: "subtask metadata",
            })?;

        let mut judgment = match self
            .complete_parsed::<Judgment>(
                prompts::SUBTASK_JUDGMENT_SYSTEM_PROMPT,
                prompts::format_subtask_judgment_prompt(
                    &task,
                    &metadata.subtasks,
                    metadata.confidence,
                    &metadata.concerns,
                    &metadata.questions,
                ),
                WorkflowStep::JudgeSubtasks,
            )
            .await
        {
            Ok(judgment) => judgment,
            Err(detail) => Judgment::degraded("subtask", &detail),
        };

        if let Some(metadata) = state.subtask_metadata.as_mut() {
            metadata.questions.extend(judgment.questions.drain(..));
        }

        let verdict = state
            .subtask_retry
            .record_outcome(judgment.verdict == Verdict::Pass);
        if verdict == RetryVerdict::ForcedPass {
            judgment = Judgment::forced_pass();
        }
        self.events.emit(&AgentLog::JudgmentRecorded {
            subject: "subtasks".to_string(),
            verdict: match judgment.verdict {
                Verdict::Pass => "pass".to_string(),
                Verdict::Fail => "fail".to_string(),
            },
            reason: judgment.reason.clone(),
            retries: state.subtask_retry.count(),
        });
        state.subtask_judgment = Some(judgment);

        match verdict {
            RetryVerdict::Pass | RetryVerdict::ForcedPass => {
                Ok(StepOutcome::Continue(WorkflowStep::CreateTask))
            }
            RetryVerdict::Fail => Ok(StepOutcome::Continue(WorkflowStep::AskAboutSubtasks)),
        }
    }

    async fn ask_about_subtasks(
        &self,
        state: &mut WorkflowState,
    ) -> Result<StepOutcome, AgentError> {
        let Some(reply) = state.user_reply.clone() else {
            let task = state
                .task_metadata
                .as_ref()
                .ok_or(AgentError::MissingState {
                    step: "ask_about_subtasks",
                    missing: "task metadata",
                })?;
            let subtasks = state
                .subtask_metadata
                .as_ref()
                .ok_or(AgentError::MissingState {
                    step: "ask_about_subtasks",
                    missing: "subtask metadata",
                })?;
            let judgment = state
                .subtask_judgment
                .as_ref()
                .ok_or(AgentError::MissingState {
                    step: "ask_about_subtasks",
                    missing: "subtask judgment",
                })?;
            let prompt = build_clarification_prompt(
                self.reasoning.as_ref(),
                ClarifyScope::Subtasks(task, subtasks),
                judgment,
            )
            .await;
            return Ok(StepOutcome::Suspended { prompt });
        };

        // An affirmative reply to a clarification request means the user is
        // happy with the breakdown as it stands.
        if parse_decision(&reply) == Some(Decision::Yes) {
            state.user_reply = None;
            if let Some(metadata) = state.subtask_metadata.as_mut() {
                metadata.user_accepted_subtasks = true;
            }
            state.subtask_retry.record_outcome(true);
            state.subtask_judgment = Some(Judgment::user_accepted());
            return Ok(StepOutcome::Continue(WorkflowStep::CreateTask));
        }

        // Reply is feedback; regenerate with it.
        state.subtask_judgment = None;
        Ok(StepOutcome::Continue(WorkflowStep::RetrySubtasks))
    }

    async fn retry_subtasks(&self, state: &mut WorkflowState) -> Result<StepOutcome, AgentError> {
        let feedback = state.user_reply.take().ok_or(AgentError::MissingState {
            step: "retry_subtasks",
            missing: "user reply",
        })?;
        let task = state
            .task_metadata
            .as_ref()
            .map(|m| m.task.clone())
            .ok_or(AgentError::MissingState {
                step: "retry_subtasks",
                missing: "task metadata",
            })?;
        let previous = state
            .subtask_metadata
            .as_ref()
            .map(|m| m.subtasks.clone())
            .unwrap_or_default();

        let metadata = match self
            .complete_parsed::<SubtaskMetadata>(
                prompts::SUBTASK_GENERATION_SYSTEM_PROMPT,
                prompts::format_retry_subtasks_prompt(&task, &previous, &feedback),
                WorkflowStep::RetrySubtasks,
            )
            .await
        {
            Ok(metadata) => metadata,
            Err(detail) => SubtaskMetadata::degraded(&detail),
        };
        state.subtask_metadata = Some(metadata);
        Ok(StepOutcome::Continue(WorkflowStep::JudgeSubtasks))
    }

    async fn create_task(&self, state: &mut WorkflowState) -> Result<StepOutcome, AgentError> {
        let task = state
            .task_metadata
            .as_ref()
            .map(|m| m.task.clone())
            .ok_or(AgentError::MissingState {
                step: "create_task",
                missing: "task metadata",
            })?;

        let subtasks = if state.subtask_decision == Some(Decision::Yes) {
            state
                .subtask_metadata
                .as_ref()
                .map(|m| m.subtasks.clone())
                .unwrap_or_default()
        } else {
            Vec::new()
        };

        // A replayed terminal step must not commit twice.
        if state.committed {
            if let Some(id) = state.task_id {
                return Ok(StepOutcome::Done(ConfirmedTask {
                    id,
                    task,
                    subtasks,
                }));
            }
        }

        let id = self.store.commit(&task, &subtasks).await?;
        state.committed = true;
        state.task_id = Some(id);
        self.events.emit(&AgentLog::TaskCommitted {
            task: task.clone(),
            subtask_count: subtasks.len(),
        });
        tracing::info!(task_id = %id, "workflow complete");

        Ok(StepOutcome::Done(ConfirmedTask { id, task, subtasks }))
    }
}
