//! End-to-end workflow tests over scripted reasoning responses.

use std::sync::Arc;

use task_agent::agent::{RunOutcome, TaskAgent, Verdict, WorkflowState, WorkflowStep};
use task_agent_sdk::AgentLog;

use super::common::{
    extraction_json, extraction_json_with, judgment_json, subtasks_json, CountingStore, MemorySink,
    ScriptedReasoning, ScriptedResponse,
};

const DECISION_PROMPT: &str = "Would you like help breaking this task into subtasks? (yes/no)";

fn agent_with(
    script: Vec<ScriptedResponse>,
    store: Arc<CountingStore>,
) -> (TaskAgent, Arc<ScriptedReasoning>, Arc<MemorySink>) {
    let reasoning = Arc::new(ScriptedReasoning::new(script));
    let sink = Arc::new(MemorySink::default());
    let agent = TaskAgent::new(reasoning.clone(), store).with_events(sink.clone());
    (agent, reasoning, sink)
}

#[tokio::test]
async fn atomic_task_completes_without_suspending() {
    let store = Arc::new(CountingStore::new());
    let (agent, reasoning, _) = agent_with(
        vec![
            extraction_json("Write a haiku about autumn", 0.95, false),
            judgment_json("pass", "Clear and self-contained", &[]),
        ],
        store.clone(),
    );

    let mut state = WorkflowState::new("write me a haiku about autumn").unwrap();
    let outcome = agent.run(&mut state).await.unwrap();

    let task = match outcome {
        RunOutcome::Complete(task) => task,
        other => panic!("expected completion, got {:?}", other),
    };
    assert_eq!(task.task, "Write a haiku about autumn");
    assert!(task.subtasks.is_empty());
    assert_eq!(store.commit_count(), 1);
    assert_eq!(reasoning.call_count(), 2);
    assert!(state.committed);
    assert_eq!(state.task_id, Some(task.id));
}

#[tokio::test]
async fn exhausted_task_judgment_budget_forces_a_pass() {
    let store = Arc::new(CountingStore::new());
    let (agent, _, _) = agent_with(
        vec![
            extraction_json("Do the thing", 0.3, true),
            judgment_json("fail", "Too vague", &["What thing?"]),
            ScriptedResponse::Failure, // clarification falls back to the template
            extraction_json("Do the thing", 0.3, true),
            judgment_json("fail", "Still too vague", &[]),
            ScriptedResponse::Failure,
            extraction_json("Do the thing", 0.3, true),
            judgment_json("fail", "No better", &[]),
        ],
        store.clone(),
    );

    let mut state = WorkflowState::with_retry_limit("do the thing", 3).unwrap();
    let outcome = agent.run(&mut state).await.unwrap();
    let RunOutcome::NeedsInput { prompt } = outcome else {
        panic!("expected first clarification suspension");
    };
    assert!(prompt.contains("I need some clarification about your task:"));

    let outcome = agent.resume(&mut state, "it is still the thing").await.unwrap();
    assert!(matches!(outcome, RunOutcome::NeedsInput { .. }));

    // The third consecutive failure exhausts the budget; the run moves on to
    // the decomposition question instead of asking for clarification again.
    let outcome = agent.resume(&mut state, "just do it").await.unwrap();
    let RunOutcome::NeedsInput { prompt } = outcome else {
        panic!("expected decomposition question after forced pass");
    };
    assert_eq!(prompt, DECISION_PROMPT);

    let judgment = state.task_judgment.as_ref().unwrap();
    assert_eq!(judgment.verdict, Verdict::Pass);
    assert!(judgment.reason.contains("Max retries reached"));

    let outcome = agent.resume(&mut state, "no").await.unwrap();
    assert!(matches!(outcome, RunOutcome::Complete(_)));
    assert_eq!(store.commit_count(), 1);
}

#[tokio::test]
async fn clarification_lists_concerns_and_judge_questions_verbatim() {
    let store = Arc::new(CountingStore::new());
    let (agent, _, _) = agent_with(
        vec![
            extraction_json_with(
                "Deploy the service",
                0.4,
                &["No target environment given"],
                &["Which environment should this deploy to?"],
            ),
            judgment_json("fail", "Underspecified", &["Is a rollback plan needed?"]),
            ScriptedResponse::Failure, // clarification falls back to the template
        ],
        store,
    );

    let mut state = WorkflowState::new("deploy the service").unwrap();
    let outcome = agent.run(&mut state).await.unwrap();
    let RunOutcome::NeedsInput { prompt } = outcome else {
        panic!("expected clarification suspension");
    };
    assert!(prompt.contains("- No target environment given"));
    assert!(prompt.contains("- Which environment should this deploy to?"));
    // The judge's extra question was merged into the metadata before asking.
    assert!(prompt.contains("- Is a rollback plan needed?"));
}

#[tokio::test]
async fn unreadable_decision_replies_default_to_no_decomposition() {
    let store = Arc::new(CountingStore::new());
    let (agent, reasoning, _) = agent_with(
        vec![
            extraction_json("Plan the offsite", 0.9, true),
            judgment_json("pass", "Clear", &[]),
        ],
        store.clone(),
    );

    let mut state = WorkflowState::with_retry_limit("plan the offsite", 3).unwrap();
    let outcome = agent.run(&mut state).await.unwrap();
    let RunOutcome::NeedsInput { prompt } = outcome else {
        panic!("expected decomposition question");
    };
    assert_eq!(prompt, DECISION_PROMPT);

    let outcome = agent.resume(&mut state, "maybe").await.unwrap();
    let RunOutcome::NeedsInput { prompt } = outcome else {
        panic!("expected re-prompt after unreadable reply");
    };
    assert!(prompt.starts_with("Sorry, I was unable to determine"));
    assert!(prompt.ends_with(DECISION_PROMPT));

    let outcome = agent.resume(&mut state, "hmm").await.unwrap();
    assert!(matches!(outcome, RunOutcome::NeedsInput { .. }));

    // Third unreadable reply exhausts the budget: the run completes with no
    // subtasks instead of asking a fourth time.
    let outcome = agent.resume(&mut state, "whatever").await.unwrap();
    let RunOutcome::Complete(task) = outcome else {
        panic!("expected completion after forced decision");
    };
    assert!(task.subtasks.is_empty());
    assert_eq!(store.commit_count(), 1);
    // No reasoning call interprets the replies.
    assert_eq!(reasoning.call_count(), 2);
}

#[tokio::test]
async fn unparseable_generation_degrades_and_still_gets_judged() {
    let store = Arc::new(CountingStore::new());
    let (agent, _, sink) = agent_with(
        vec![
            extraction_json("Ship the release", 0.9, true),
            judgment_json("pass", "Clear", &[]),
            ScriptedResponse::Failure, // subtask generation
            judgment_json("fail", "Empty breakdown", &[]),
            ScriptedResponse::Failure, // clarification falls back
        ],
        store.clone(),
    );

    let mut state = WorkflowState::new("ship the release").unwrap();
    agent.run(&mut state).await.unwrap();
    let outcome = agent.resume(&mut state, "yes").await.unwrap();

    let RunOutcome::NeedsInput { prompt } = outcome else {
        panic!("expected clarification about the subtasks");
    };
    assert!(prompt.contains("I need some clarification about your subtasks:"));
    assert!(prompt.contains("Unable to parse subtask generation response"));

    let metadata = state.subtask_metadata.as_ref().unwrap();
    assert!(metadata.subtasks.is_empty());
    assert_eq!(metadata.confidence, 0.0);

    let fallbacks = sink
        .events
        .lock()
        .unwrap()
        .iter()
        .filter(|event| matches!(event, AgentLog::ParseFallback { .. }))
        .count();
    assert!(fallbacks >= 1);
    assert_eq!(store.commit_count(), 0);
}

#[tokio::test]
async fn affirmative_clarification_reply_accepts_the_breakdown() {
    let store = Arc::new(CountingStore::new());
    let (agent, _, _) = agent_with(
        vec![
            extraction_json("Ship the release", 0.9, true),
            judgment_json("pass", "Clear", &[]),
            subtasks_json(&["Tag the build", "Publish the artifacts"], 0.8),
            judgment_json("fail", "Missing a verification step", &[]),
            ScriptedResponse::Failure, // clarification falls back
        ],
        store.clone(),
    );

    let mut state = WorkflowState::new("ship the release").unwrap();
    agent.run(&mut state).await.unwrap();
    agent.resume(&mut state, "yes").await.unwrap();

    // The user answers the clarification with plain approval.
    let outcome = agent.resume(&mut state, "yes").await.unwrap();
    let RunOutcome::Complete(task) = outcome else {
        panic!("expected completion after user acceptance");
    };
    assert_eq!(task.subtasks, vec!["Tag the build", "Publish the artifacts"]);

    let judgment = state.subtask_judgment.as_ref().unwrap();
    assert_eq!(judgment.verdict, Verdict::Pass);
    assert!(judgment.reason.contains("User accepted"));
    assert!(state.subtask_metadata.as_ref().unwrap().user_accepted_subtasks);
    assert_eq!(state.subtask_retry.count(), 0);
    assert_eq!(store.commit_count(), 1);
}

#[tokio::test]
async fn clarification_feedback_regenerates_the_breakdown() {
    let store = Arc::new(CountingStore::new());
    let (agent, _, _) = agent_with(
        vec![
            extraction_json("Ship the release", 0.9, true),
            judgment_json("pass", "Clear", &[]),
            subtasks_json(&["Tag the build"], 0.5),
            judgment_json("fail", "Incomplete", &[]),
            ScriptedResponse::Failure, // clarification falls back
            subtasks_json(&["Tag the build", "Run the smoke tests", "Publish"], 0.9),
            judgment_json("pass", "Covers the task", &[]),
        ],
        store.clone(),
    );

    let mut state = WorkflowState::new("ship the release").unwrap();
    agent.run(&mut state).await.unwrap();
    agent.resume(&mut state, "yes").await.unwrap();

    let outcome = agent
        .resume(&mut state, "please include smoke tests")
        .await
        .unwrap();
    let RunOutcome::Complete(task) = outcome else {
        panic!("expected completion after regeneration");
    };
    assert_eq!(task.subtasks.len(), 3);
    assert!(task.subtasks.contains(&"Run the smoke tests".to_string()));
    assert_eq!(store.commit_count(), 1);
}

#[tokio::test]
async fn replayed_terminal_step_does_not_commit_twice() {
    let store = Arc::new(CountingStore::new());
    let (agent, _, _) = agent_with(
        vec![
            extraction_json("Write a haiku", 0.95, false),
            judgment_json("pass", "Clear", &[]),
        ],
        store.clone(),
    );

    let mut state = WorkflowState::new("write a haiku").unwrap();
    let first = agent.run(&mut state).await.unwrap();
    let RunOutcome::Complete(first_task) = first else {
        panic!("expected completion");
    };

    // Driving the same state again must replay the result, not re-commit.
    let second = agent.run(&mut state).await.unwrap();
    let RunOutcome::Complete(second_task) = second else {
        panic!("expected replayed completion");
    };
    assert_eq!(second_task.id, first_task.id);
    assert_eq!(store.commit_count(), 1);
}

#[tokio::test]
async fn store_failure_is_fatal() {
    let store = Arc::new(CountingStore::failing());
    let (agent, _, sink) = agent_with(
        vec![
            extraction_json("Write a haiku", 0.95, false),
            judgment_json("pass", "Clear", &[]),
        ],
        store,
    );

    let mut state = WorkflowState::new("write a haiku").unwrap();
    let result = agent.run(&mut state).await;
    assert!(result.is_err());
    assert!(!state.committed);

    let failed = sink
        .events
        .lock()
        .unwrap()
        .iter()
        .any(|event| matches!(event, AgentLog::WorkflowFailed { .. }));
    assert!(failed);
}

#[tokio::test]
async fn empty_input_is_rejected_before_any_state_exists() {
    assert!(WorkflowState::new("").is_err());
    assert!(WorkflowState::new("   \n\t ").is_err());
}

#[tokio::test]
async fn suspended_state_survives_a_serde_round_trip() {
    let store = Arc::new(CountingStore::new());
    let (agent, _, _) = agent_with(
        vec![
            extraction_json("Plan the offsite", 0.9, true),
            judgment_json("pass", "Clear", &[]),
        ],
        store.clone(),
    );

    let mut state = WorkflowState::new("plan the offsite").unwrap();
    let outcome = agent.run(&mut state).await.unwrap();
    assert!(matches!(outcome, RunOutcome::NeedsInput { .. }));
    assert_eq!(state.step, WorkflowStep::AskSubtask);

    let json = serde_json::to_string(&state).unwrap();
    let mut restored: WorkflowState = serde_json::from_str(&json).unwrap();
    assert_eq!(restored.last_prompt.as_deref(), Some(DECISION_PROMPT));

    let outcome = agent.resume(&mut restored, "no").await.unwrap();
    assert!(matches!(outcome, RunOutcome::Complete(_)));
    assert_eq!(store.commit_count(), 1);
}
