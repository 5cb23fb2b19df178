//! Deterministic parsing of yes/no replies.

use crate::agent::types::Decision;

const AFFIRMATIVE: &[&str] = &["y", "yes", "t", "true", "on", "1"];
const NEGATIVE: &[&str] = &["n", "no", "f", "false", "off", "0"];

/// Interpret a free-text reply as a yes/no decision.
///
/// Matching is exact after trimming and lowercasing; anything outside the two
/// token sets is `None` and the caller re-prompts. No reasoning call is made
/// here, so the interpretation of a given reply never varies between runs.
pub fn parse_decision(text: &str) -> Option<Decision> {
    let normalized = text.trim().to_lowercase();
    if AFFIRMATIVE.contains(&normalized.as_str()) {
        Some(Decision::Yes)
    } else if NEGATIVE.contains(&normalized.as_str()) {
        Some(Decision::No)
    } else {
        None
    }
}
