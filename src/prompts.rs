//! Prompt builders. The literal wording is deliberately kept out of the
//! orchestration code; the core only depends on the JSON shapes these
//! prompts ask for.

use crate::verdict::{Assertion, TimelineEntry};

pub const SYSTEM_PROMPT: &str = "You are a meticulous UX reviewer. You are shown frames sampled \
from a screen recording of a user interface and asked to judge assertions about what happens on \
screen. Base every judgment only on what is visible in the frames. Always answer with JSON only, \
no surrounding prose.";

pub const AGENT_SYSTEM_PROMPT: &str = "You are a meticulous UX reviewer with access to tools. \
First call describe_timeline to see what happens in the recording, then call evaluate_assertions \
with that timeline to judge the assertions. When you are satisfied with the evaluations, reply \
with a short summary and stop calling tools.";

/// Pass 1 of two-pass, and the backend of the `describe_timeline` tool.
pub fn timeline_instruction() -> String {
    "Each image is a frame sampled from a screen recording; its timestamp in seconds is given \
above it. Describe what happens over time. Respond with JSON of the form \
{\"timeline\": [{\"timestampSeconds\": number, \"description\": string}]}."
        .to_string()
}

/// Pass 2 of two-pass, and the backend of the `evaluate_assertions` tool.
/// Text-only: the timeline stands in for the frames.
pub fn evaluation_instruction(timeline: &[TimelineEntry], assertions: &[Assertion]) -> String {
    format!(
        "Here is a timeline of events observed in a screen recording:\n{}\n\nEvaluate each of \
the following assertions against that timeline:\n{}\n\nRespond with JSON of the form \
{{\"evaluations\": [{{\"assertionId\": string, \"verdict\": \"pass\"|\"fail\"|\"uncertain\", \
\"confidence\": number between 0 and 1, \"explanation\": string, \"evidence\": \
[{{\"timestampSeconds\": number, \"description\": string}}]}}]}}. Include one entry per \
assertion, keyed by its id.",
        serde_json::to_string_pretty(timeline).unwrap_or_else(|_| "[]".to_string()),
        assertion_listing(assertions),
    )
}

/// The batch strategy: frames and every assertion in one request.
pub fn batch_instruction(assertions: &[Assertion]) -> String {
    format!(
        "Each image is a frame sampled from a screen recording; its timestamp in seconds is \
given above it. Evaluate each of the following assertions against the recording:\n{}\n\nRespond \
with JSON of the form {{\"timeline\": [{{\"timestampSeconds\": number, \"description\": \
string}}], \"evaluations\": [{{\"assertionId\": string, \"verdict\": \
\"pass\"|\"fail\"|\"uncertain\", \"confidence\": number between 0 and 1, \"explanation\": \
string, \"evidence\": [{{\"timestampSeconds\": number, \"description\": string}}]}}]}}.",
        assertion_listing(assertions),
    )
}

/// The single strategy: frames plus exactly one assertion.
pub fn single_instruction(assertion: &Assertion) -> String {
    format!(
        "Each image is a frame sampled from a screen recording; its timestamp in seconds is \
given above it. Evaluate this one assertion against the recording:\n  [{}] {}\n\nRespond with \
JSON of the form {{\"evaluations\": [{{\"assertionId\": \"{}\", \"verdict\": \
\"pass\"|\"fail\"|\"uncertain\", \"confidence\": number between 0 and 1, \"explanation\": \
string, \"evidence\": [{{\"timestampSeconds\": number, \"description\": string}}]}}]}} with \
exactly one evaluation.",
        assertion.id, assertion.text, assertion.id,
    )
}

/// Opening user message for the agentic loop. The frames themselves stay
/// server-side: the tools read them when invoked.
pub fn agent_opening(assertions: &[Assertion]) -> String {
    format!(
        "A screen recording is loaded and available to your tools. Judge the following \
assertions about it:\n{}\n\nUse describe_timeline first, then evaluate_assertions.",
        assertion_listing(assertions),
    )
}

fn assertion_listing(assertions: &[Assertion]) -> String {
    assertions
        .iter()
        .map(|a| format!("  [{}] {}", a.id, a.text))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AssertionId;

    fn assertion(id: &str, text: &str) -> Assertion {
        Assertion {
            id: AssertionId::new(id),
            text: text.to_string(),
            kind: None,
            test_step_id: None,
            test_step_description: None,
        }
    }

    #[test]
    fn listing_includes_ids_and_text() {
        let prompt = batch_instruction(&[
            assertion("a1", "Login button is visible"),
            assertion("a2", "Spinner disappears"),
        ]);
        assert!(prompt.contains("[a1] Login button is visible"));
        assert!(prompt.contains("[a2] Spinner disappears"));
    }

    #[test]
    fn single_pins_the_assertion_id() {
        let prompt = single_instruction(&assertion("a7", "Toast appears"));
        assert!(prompt.contains("\"assertionId\": \"a7\""));
        assert!(prompt.contains("exactly one evaluation"));
    }

    #[test]
    fn evaluation_prompt_embeds_timeline() {
        let timeline = vec![TimelineEntry {
            timestamp_seconds: 0.0,
            description: "Login screen shown".to_string(),
        }];
        let prompt = evaluation_instruction(&timeline, &[assertion("a1", "x")]);
        assert!(prompt.contains("Login screen shown"));
    }
}
