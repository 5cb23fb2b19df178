//! Clarification prompt construction tests.

use task_agent::agent::clarify::{build_clarification_prompt, fallback_prompt, ClarifyScope};
use task_agent::agent::{Judgment, SubtaskMetadata, TaskMetadata, Verdict};

use super::common::{ScriptedReasoning, ScriptedResponse};

fn vague_task() -> TaskMetadata {
    TaskMetadata {
        task: "Organize the files".to_string(),
        confidence: 0.4,
        concerns: vec!["No directory was specified".to_string()],
        questions: vec!["Which directory should be organized?".to_string()],
        is_subtaskable: true,
    }
}

fn weak_breakdown() -> SubtaskMetadata {
    SubtaskMetadata {
        subtasks: vec!["Sort by extension".to_string()],
        confidence: 0.3,
        concerns: vec!["Breakdown may be incomplete".to_string()],
        questions: vec!["Should hidden files be included?".to_string()],
        user_accepted_subtasks: false,
    }
}

fn failed_judgment() -> Judgment {
    Judgment {
        verdict: Verdict::Fail,
        reason: "Not enough detail".to_string(),
        questions: Vec::new(),
    }
}

#[test]
fn task_fallback_lists_concerns_and_questions_verbatim() {
    let task = vague_task();
    let prompt = fallback_prompt(&ClarifyScope::Task(&task));

    assert!(prompt.starts_with("I need some clarification about your task:"));
    assert!(prompt.contains("Task: Organize the files"));
    assert!(prompt.contains("- No directory was specified"));
    assert!(prompt.contains("- Which directory should be organized?"));
    assert!(prompt.ends_with("better understand your requirements?"));
}

#[test]
fn subtask_fallback_lists_the_breakdown_and_its_open_points() {
    let task = vague_task();
    let subtasks = weak_breakdown();
    let prompt = fallback_prompt(&ClarifyScope::Subtasks(&task, &subtasks));

    assert!(prompt.starts_with("I need some clarification about your subtasks:"));
    assert!(prompt.contains("Main Task: Organize the files"));
    assert!(prompt.contains("Subtasks: Sort by extension"));
    assert!(prompt.contains("- Breakdown may be incomplete"));
    assert!(prompt.contains("- Should hidden files be included?"));
    assert!(prompt.ends_with("better organize the subtasks?"));
}

#[test]
fn fallback_omits_empty_sections() {
    let task = TaskMetadata {
        task: "Do the thing".to_string(),
        confidence: 0.0,
        concerns: Vec::new(),
        questions: Vec::new(),
        is_subtaskable: true,
    };
    let prompt = fallback_prompt(&ClarifyScope::Task(&task));
    assert!(!prompt.contains("Concerns:"));
    assert!(!prompt.contains("Questions:"));
}

#[tokio::test]
async fn reasoning_failure_falls_back_to_the_template() {
    let reasoning = ScriptedReasoning::new(vec![ScriptedResponse::Failure]);
    let task = vague_task();
    let prompt =
        build_clarification_prompt(&reasoning, ClarifyScope::Task(&task), &failed_judgment()).await;
    assert!(prompt.starts_with("I need some clarification about your task:"));
    assert!(prompt.contains("- No directory was specified"));
}

#[tokio::test]
async fn empty_reasoning_response_falls_back_to_the_template() {
    let reasoning = ScriptedReasoning::new(vec![ScriptedResponse::Text("  \n".to_string())]);
    let task = vague_task();
    let prompt =
        build_clarification_prompt(&reasoning, ClarifyScope::Task(&task), &failed_judgment()).await;
    assert!(prompt.starts_with("I need some clarification about your task:"));
}

#[tokio::test]
async fn composed_clarification_is_used_when_the_call_succeeds() {
    let reasoning = ScriptedReasoning::new(vec![ScriptedResponse::Text(
        "Could you tell me which directory to organize? You mentioned sorting but not where."
            .to_string(),
    )]);
    let task = vague_task();
    let prompt =
        build_clarification_prompt(&reasoning, ClarifyScope::Task(&task), &failed_judgment()).await;
    assert!(prompt.starts_with("Could you tell me which directory"));

    // The judgment and open points were handed to the composer.
    let calls = reasoning.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].user.contains("<reason>Not enough detail</reason>"));
    assert!(calls[0].user.contains("No directory was specified"));
}
