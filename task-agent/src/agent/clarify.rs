//! Clarification prompt construction.
//!
//! A failed judgment needs a human-facing message. A reasoning call composes
//! it; when that call fails or returns nothing, a deterministic template takes
//! over so the run can always suspend with a usable prompt. Either way every
//! recorded concern and question appears verbatim.

use crate::agent::prompts::CLARIFICATION_SYSTEM_PROMPT;
use crate::agent::types::{Judgment, SubtaskMetadata, TaskMetadata};
use crate::reasoning::{ReasoningRequest, ReasoningService};

/// What the clarification is about: the task itself or its decomposition.
pub enum ClarifyScope<'a> {
    Task(&'a TaskMetadata),
    Subtasks(&'a TaskMetadata, &'a SubtaskMetadata),
}

impl ClarifyScope<'_> {
    pub fn subject(&self) -> &'static str {
        match self {
            ClarifyScope::Task(_) => "task",
            ClarifyScope::Subtasks(..) => "subtasks",
        }
    }

    fn concerns(&self) -> &[String] {
        match self {
            ClarifyScope::Task(task) => &task.concerns,
            ClarifyScope::Subtasks(_, subtasks) => &subtasks.concerns,
        }
    }

    fn questions(&self) -> &[String] {
        match self {
            ClarifyScope::Task(task) => &task.questions,
            ClarifyScope::Subtasks(_, subtasks) => &subtasks.questions,
        }
    }
}

/// Build the clarification prompt for a failed judgment.
///
/// Never fails: a reasoning error or empty response falls back to the
/// deterministic template.
pub async fn build_clarification_prompt(
    reasoning: &dyn ReasoningService,
    scope: ClarifyScope<'_>,
    judgment: &Judgment,
) -> String {
    let request = ReasoningRequest {
        system: CLARIFICATION_SYSTEM_PROMPT.to_string(),
        user: clarification_context(&scope, judgment),
    };
    match reasoning.complete(&request).await {
        Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
        Ok(_) => {
            tracing::warn!(subject = scope.subject(), "empty clarification response, using fallback prompt");
            fallback_prompt(&scope)
        }
        Err(err) => {
            tracing::warn!(subject = scope.subject(), error = %err, "clarification call failed, using fallback prompt");
            fallback_prompt(&scope)
        }
    }
}

fn clarification_context(scope: &ClarifyScope<'_>, judgment: &Judgment) -> String {
    let mut context = String::new();
    match scope {
        ClarifyScope::Task(task) => {
            context.push_str(&format!("<task>{}</task>\n", task.task));
        }
        ClarifyScope::Subtasks(task, subtasks) => {
            context.push_str(&format!("<task>{}</task>\n", task.task));
            context.push_str(&format!(
                "<subtasks>{}</subtasks>\n",
                subtasks.subtasks.join("; ")
            ));
        }
    }
    context.push_str(&format!("<reason>{}</reason>\n", judgment.reason));
    for concern in scope.concerns() {
        context.push_str(&format!("<concern>{}</concern>\n", concern));
    }
    for question in scope.questions() {
        context.push_str(&format!("<question>{}</question>\n", question));
    }
    context
}

/// Deterministic clarification message listing every concern and question.
pub fn fallback_prompt(scope: &ClarifyScope<'_>) -> String {
    let mut prompt = String::new();
    match scope {
        ClarifyScope::Task(task) => {
            prompt.push_str("I need some clarification about your task:\n\n");
            prompt.push_str(&format!("Task: {}\n", task.task));
        }
        ClarifyScope::Subtasks(task, subtasks) => {
            prompt.push_str("I need some clarification about your subtasks:\n\n");
            prompt.push_str(&format!("Main Task: {}\n", task.task));
            prompt.push_str(&format!("Subtasks: {}\n", subtasks.subtasks.join("; ")));
        }
    }
    let concerns = scope.concerns();
    if !concerns.is_empty() {
        prompt.push_str("\nConcerns:\n");
        for concern in concerns {
            prompt.push_str(&format!("- {}\n", concern));
        }
    }
    let questions = scope.questions();
    if !questions.is_empty() {
        prompt.push_str("\nQuestions:\n");
        for question in questions {
            prompt.push_str(&format!("- {}\n", question));
        }
    }
    match scope {
        ClarifyScope::Task(_) => prompt.push_str(
            "\nCould you please provide more details to help me better understand your requirements?",
        ),
        ClarifyScope::Subtasks(..) => prompt.push_str(
            "\nCould you please provide more details to help me better organize the subtasks?",
        ),
    }
    prompt
}
