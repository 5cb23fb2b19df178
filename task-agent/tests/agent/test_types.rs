//! Wire-format and state-construction tests.

use task_agent::agent::{
    Judgment, RetryCounter, SubtaskMetadata, TaskMetadata, Verdict, WorkflowState, WorkflowStep,
};

#[test]
fn judgment_parses_the_wire_format() {
    let judgment: Judgment = serde_json::from_str(
        r#"{"judgment": "fail", "reason": "Too vague", "questions": ["What exactly?"]}"#,
    )
    .unwrap();
    assert_eq!(judgment.verdict, Verdict::Fail);
    assert_eq!(judgment.reason, "Too vague");
    assert_eq!(judgment.questions, vec!["What exactly?"]);
}

#[test]
fn judgment_questions_default_to_empty() {
    let judgment: Judgment =
        serde_json::from_str(r#"{"judgment": "pass", "reason": "Fine"}"#).unwrap();
    assert!(judgment.questions.is_empty());
}

#[test]
fn task_metadata_defaults_to_subtaskable() {
    let metadata: TaskMetadata = serde_json::from_str(
        r#"{"task": "Clean the garage", "confidence": 0.8, "concerns": [], "questions": []}"#,
    )
    .unwrap();
    assert!(metadata.is_subtaskable);
}

#[test]
fn subtask_metadata_defaults_acceptance_to_false() {
    let metadata: SubtaskMetadata =
        serde_json::from_str(r#"{"subtasks": ["a"], "confidence": 0.9}"#).unwrap();
    assert!(!metadata.user_accepted_subtasks);
    assert!(metadata.concerns.is_empty());
}

#[test]
fn degraded_extraction_keeps_the_raw_input() {
    let metadata = TaskMetadata::degraded("fix the widget", "expected value at line 1");
    assert_eq!(metadata.task, "fix the widget");
    assert_eq!(metadata.confidence, 0.0);
    assert!(metadata.concerns[0].starts_with("Unable to parse"));
}

#[test]
fn forced_pass_carries_the_marker_reason() {
    let judgment = Judgment::forced_pass();
    assert_eq!(judgment.verdict, Verdict::Pass);
    assert!(judgment.reason.contains("Max retries reached"));
}

#[test]
fn new_state_starts_at_extraction_with_independent_counters() {
    let state = WorkflowState::with_retry_limit("do something", 5).unwrap();
    assert_eq!(state.step, WorkflowStep::Extract);
    assert_eq!(state.task_retry.limit(), 5);
    assert_eq!(state.subtask_retry.limit(), 5);
    assert_eq!(state.decision_retry.limit(), 5);
    assert!(!state.committed);
}

#[test]
fn default_retry_limit_is_three() {
    let state = WorkflowState::new("do something").unwrap();
    assert_eq!(state.task_retry.limit(), RetryCounter::DEFAULT_LIMIT);
    assert_eq!(RetryCounter::DEFAULT_LIMIT, 3);
}

#[test]
fn workflow_step_serializes_as_snake_case() {
    let json = serde_json::to_string(&WorkflowStep::AskAboutSubtasks).unwrap();
    assert_eq!(json, "\"ask_about_subtasks\"");
}
