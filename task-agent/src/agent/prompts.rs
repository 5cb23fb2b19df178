//! Prompt templates for every reasoning call the workflow makes.
//!
//! System prompts pin the wire format the steps parse; the format functions
//! assemble the matching user messages from workflow state.

pub const TASK_EXTRACTION_SYSTEM_PROMPT: &str = r#"You are a task extraction assistant. Given a user's raw request, restate it as a single, clear, actionable task.

Respond with ONLY a JSON object in this exact format:
{
    "task": "a clear restatement of what the user wants done",
    "confidence": 0.0,
    "concerns": ["anything ambiguous or underspecified about the request"],
    "questions": ["questions that would resolve the concerns"],
    "is_subtaskable": true
}

Rules:
- "confidence" is a number between 0.0 and 1.0 reflecting how sure you are the restatement captures the user's intent.
- "concerns" and "questions" are empty arrays when the request is clear.
- "is_subtaskable" is false only when the task is so small or atomic that breaking it down would add nothing.
- Do not include any text outside the JSON object."#;

pub const TASK_JUDGMENT_SYSTEM_PROMPT: &str = r#"You are a task quality judge. You are given an extracted task with its confidence, concerns, and open questions. Decide whether the task is clear and actionable enough to proceed.

Respond with ONLY a JSON object in this exact format:
{
    "judgment": "pass",
    "reason": "one or two sentences explaining the verdict",
    "questions": ["clarifying questions to ask the user, only when the judgment is fail"]
}

Rules:
- "judgment" must be exactly "pass" or "fail".
- Fail when the task is vague, ambiguous, or the listed concerns are substantial.
- "questions" is an empty array when the judgment is pass.
- Do not include any text outside the JSON object."#;

pub const SUBTASK_GENERATION_SYSTEM_PROMPT: &str = r#"You are a task decomposition assistant. Given a confirmed main task, break it into a small ordered list of concrete subtasks.

Respond with ONLY a JSON object in this exact format:
{
    "subtasks": ["first subtask", "second subtask"],
    "confidence": 0.0,
    "concerns": ["anything that made the breakdown uncertain"],
    "questions": ["questions that would improve the breakdown"]
}

Rules:
- Subtasks are ordered and each is independently actionable.
- "confidence" is a number between 0.0 and 1.0.
- "concerns" and "questions" are empty arrays when the breakdown is straightforward.
- Do not include any text outside the JSON object."#;

pub const SUBTASK_JUDGMENT_SYSTEM_PROMPT: &str = r#"You are a decomposition quality judge. You are given a main task and a proposed list of subtasks with confidence, concerns, and open questions. Decide whether the subtasks fully and sensibly cover the main task.

Respond with ONLY a JSON object in this exact format:
{
    "judgment": "pass",
    "reason": "one or two sentences explaining the verdict",
    "questions": ["clarifying questions to ask the user, only when the judgment is fail"]
}

Rules:
- "judgment" must be exactly "pass" or "fail".
- Fail when subtasks are missing, overlapping, out of order, or not actionable.
- "questions" is an empty array when the judgment is pass.
- Do not include any text outside the JSON object."#;

pub const CLARIFICATION_SYSTEM_PROMPT: &str = r#"You are a helpful assistant writing a short message to a user whose request needs clarification. You are given the current task context, a failed quality judgment, and the open concerns and questions.

Write a brief, friendly message that:
- explains in one sentence what is unclear
- lists every concern and question you were given, verbatim
- asks the user to provide the missing details

Respond with the message text only. Do not use JSON."#;

/// Fixed prompt shown when the run first asks whether to decompose the task.
pub const SUBTASK_DECISION_PROMPT: &str =
    "Would you like help breaking this task into subtasks? (yes/no)";

/// Re-prompt shown after a reply that could not be read as yes or no.
pub const SUBTASK_DECISION_RETRY_PROMPT: &str = "Sorry, I was unable to determine if that was a yes or a no.\n\nWould you like help breaking this task into subtasks? (yes/no)";

pub fn format_extraction_prompt(input: &str) -> String {
    format!("User input: {}", input)
}

pub fn format_retry_extraction_prompt(input: &str, current_task: &str, feedback: &str) -> String {
    format!(
        "Original input: {}\nCurrent task: {}\nUser feedback: {}\n\nRe-extract the task taking the user's feedback into account.",
        input, current_task, feedback
    )
}

pub fn format_judgment_prompt(
    task: &str,
    confidence: f64,
    concerns: &[String],
    questions: &[String],
) -> String {
    format!(
        "Task: {}\nConfidence: {}\nConcerns: {}\nQuestions: {}",
        task,
        confidence,
        concerns.join(", "),
        questions.join(", ")
    )
}

pub fn format_subtask_generation_prompt(task: &str) -> String {
    format!("Main task: {}", task)
}

pub fn format_subtask_judgment_prompt(
    task: &str,
    subtasks: &[String],
    confidence: f64,
    concerns: &[String],
    questions: &[String],
) -> String {
    format!(
        "Main Task: {}\nSubtasks: {}\nConfidence: {}\nConcerns: {}\nQuestions: {}",
        task,
        subtasks.join("; "),
        confidence,
        concerns.join(", "),
        questions.join(", ")
    )
}

pub fn format_retry_subtasks_prompt(task: &str, subtasks: &[String], feedback: &str) -> String {
    format!(
        "Main task: {}\nPrevious subtasks: {}\nUser feedback: {}\n\nRegenerate the subtasks taking the user's feedback into account.",
        task,
        subtasks.join("; "),
        feedback
    )
}
