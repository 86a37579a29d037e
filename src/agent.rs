use std::collections::{BTreeMap, BTreeSet};

use anyhow::Result;
use colored::*;

use crate::api::{ContentBlock, Message};
use crate::config::RunConfig;
use crate::frames::Frame;
use crate::parse::parse_json;
use crate::prompts;
use crate::providers::{InferenceRequest, LLMProvider};
use crate::strategies::{extract_evaluations, extract_timeline};
use crate::tools::{
    execute_tool, tool_definitions, ToolContext, ToolResultEnvelope, DESCRIBE_TIMELINE,
    EVALUATE_ASSERTIONS,
};
use crate::types::AssertionId;
use crate::verdict::{Assertion, Evaluation, PipelineResult, TimelineEntry};

/// Running accumulator for results harvested out of tool traffic. Kept as
/// an explicit struct so the overwrite and merge rules are testable on
/// their own, away from the conversation loop.
#[derive(Debug)]
pub struct Harvest {
    timeline: Vec<TimelineEntry>,
    evaluations: BTreeMap<AssertionId, Evaluation>,
    known_ids: BTreeSet<AssertionId>,
}

impl Harvest {
    pub fn new(assertions: &[Assertion]) -> Self {
        Self {
            timeline: Vec::new(),
            evaluations: BTreeMap::new(),
            known_ids: assertions.iter().map(|a| a.id.clone()).collect(),
        }
    }

    /// Inspect one tool result. A successful `describe_timeline` replaces
    /// the timeline outright (only the latest is kept); a successful
    /// `evaluate_assertions` merges by id, last write wins. Error envelopes
    /// and unknown ids are ignored.
    pub fn absorb(&mut self, tool_name: &str, envelope: &ToolResultEnvelope) {
        if envelope.is_error {
            return;
        }
        let Ok(payload) = parse_json(&envelope.content) else {
            return;
        };

        match tool_name {
            DESCRIBE_TIMELINE => {
                self.timeline = extract_timeline(&payload);
            }
            EVALUATE_ASSERTIONS => {
                for eval in extract_evaluations(&payload) {
                    if !self.known_ids.contains(&eval.assertion_id) {
                        log::warn!(
                            "ignoring harvested evaluation for unknown assertion id {}",
                            eval.assertion_id
                        );
                        continue;
                    }
                    self.evaluations.insert(eval.assertion_id.clone(), eval);
                }
            }
            _ => {}
        }
    }

    pub fn into_result(self) -> PipelineResult {
        PipelineResult {
            timeline: self.timeline,
            evaluations: self.evaluations,
        }
    }
}

/// The agentic alternative to the fixed pipelines: a bounded tool-use
/// conversation in which the model decides when to look at the recording
/// and when to judge the assertions.
pub struct Orchestrator<'a> {
    provider: &'a dyn LLMProvider,
    cfg: &'a RunConfig,
    frames: &'a [Frame],
    assertions: &'a [Assertion],
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        provider: &'a dyn LLMProvider,
        cfg: &'a RunConfig,
        frames: &'a [Frame],
        assertions: &'a [Assertion],
    ) -> Self {
        Self {
            provider,
            cfg,
            frames,
            assertions,
        }
    }

    /// Run the conversation to completion or to the turn ceiling. Exhausting
    /// the budget is not an error: whatever was harvested so far comes back.
    pub async fn run(&self) -> Result<PipelineResult> {
        let ctx = ToolContext {
            provider: self.provider,
            cfg: self.cfg,
            frames: self.frames,
            assertions: self.assertions,
        };

        let mut messages = vec![Message::user(prompts::agent_opening(self.assertions))];
        let mut harvest = Harvest::new(self.assertions);

        for turn in 0..self.cfg.max_turns {
            let request = InferenceRequest {
                model: self.cfg.model.clone(),
                messages: messages.clone(),
                tools: tool_definitions(),
                tool_choice: Some(serde_json::json!({ "type": "auto" })),
                max_tokens: self.cfg.max_tokens,
                system: prompts::AGENT_SYSTEM_PROMPT.to_string(),
            };

            let response = self.provider.infer(&request).await?;
            log::debug!(
                "turn {turn}: stop_reason={} blocks={}",
                response.stop_reason,
                response.content.len()
            );

            let mut assistant_blocks = Vec::new();
            let mut tools_to_execute = Vec::new();

            for block in response.content {
                match block {
                    ContentBlock::Text { ref text } => {
                        println!("\n{} {}", "●".blue().bold(), text.blue());
                        assistant_blocks.push(block);
                    }
                    ContentBlock::ToolUse {
                        ref id,
                        ref name,
                        ref input,
                    } => {
                        println!("\n{} {}", "⚙".yellow().bold(), name.as_str().yellow().bold());
                        assistant_blocks.push(block.clone());
                        tools_to_execute.push((id.clone(), name.clone(), input.clone()));
                    }
                    _ => {}
                }
            }

            messages.push(Message::assistant(assistant_blocks));

            if tools_to_execute.is_empty() {
                break;
            }

            // One result per invocation, in response order, keyed back to
            // the invocation id so the model can correlate multi-tool turns.
            let mut tool_results = Vec::new();

            for (id, name, input) in tools_to_execute {
                let envelope = execute_tool(name.as_str(), &input, &ctx).await;

                if envelope.is_error {
                    println!("  {} {}", "└─".red(), envelope.content.red());
                } else {
                    println!("  {} {}", "└─".green(), "OK".green());
                }

                harvest.absorb(name.as_str(), &envelope);

                tool_results.push(ContentBlock::ToolResult {
                    tool_use_id: id,
                    content: envelope.content,
                    is_error: envelope.is_error,
                });
            }

            messages.push(Message::tool_results(tool_results));
        }

        Ok(harvest.into_result())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verdict::Verdict;
    use serde_json::json;

    fn assertion(id: &str) -> Assertion {
        Assertion {
            id: AssertionId::new(id),
            text: format!("assertion {id}"),
            kind: None,
            test_step_id: None,
            test_step_description: None,
        }
    }

    fn ok_envelope(payload: serde_json::Value) -> ToolResultEnvelope {
        ToolResultEnvelope {
            content: payload.to_string(),
            is_error: false,
        }
    }

    #[test]
    fn harvest_replaces_timeline() {
        let mut harvest = Harvest::new(&[assertion("a1")]);

        harvest.absorb(
            DESCRIBE_TIMELINE,
            &ok_envelope(json!({"timeline": [{"timestampSeconds": 0.0, "description": "one"}]})),
        );
        harvest.absorb(
            DESCRIBE_TIMELINE,
            &ok_envelope(json!({"timeline": [{"timestampSeconds": 1.0, "description": "two"}]})),
        );

        let result = harvest.into_result();
        assert_eq!(result.timeline.len(), 1);
        assert_eq!(result.timeline[0].description, "two");
    }

    #[test]
    fn harvest_merges_evaluations_by_id() {
        let mut harvest = Harvest::new(&[assertion("a1"), assertion("a2")]);

        harvest.absorb(
            EVALUATE_ASSERTIONS,
            &ok_envelope(json!({"evaluations": [
                {"assertionId": "a1", "verdict": "fail", "confidence": 0.4, "explanation": "x"},
            ]})),
        );
        harvest.absorb(
            EVALUATE_ASSERTIONS,
            &ok_envelope(json!({"evaluations": [
                {"assertionId": "a1", "verdict": "pass", "confidence": 0.9, "explanation": "y"},
                {"assertionId": "a2", "verdict": "uncertain", "confidence": 0.1, "explanation": "z"},
            ]})),
        );

        let result = harvest.into_result();
        assert_eq!(result.evaluations.len(), 2);
        assert_eq!(
            result.evaluations[&AssertionId::new("a1")].verdict,
            Verdict::Pass
        );
    }

    #[test]
    fn harvest_drops_unknown_ids() {
        let mut harvest = Harvest::new(&[assertion("a1")]);

        harvest.absorb(
            EVALUATE_ASSERTIONS,
            &ok_envelope(json!({"evaluations": [
                {"assertionId": "ghost", "verdict": "pass", "confidence": 1.0, "explanation": "x"},
            ]})),
        );

        assert!(harvest.into_result().evaluations.is_empty());
    }

    #[test]
    fn harvest_ignores_error_envelopes() {
        let mut harvest = Harvest::new(&[assertion("a1")]);

        harvest.absorb(
            DESCRIBE_TIMELINE,
            &ToolResultEnvelope {
                content: json!({"error": "boom"}).to_string(),
                is_error: true,
            },
        );

        assert!(harvest.into_result().timeline.is_empty());
    }

    #[test]
    fn harvest_ignores_unparseable_content() {
        let mut harvest = Harvest::new(&[assertion("a1")]);

        harvest.absorb(
            DESCRIBE_TIMELINE,
            &ToolResultEnvelope {
                content: "not json".to_string(),
                is_error: false,
            },
        );

        assert!(harvest.into_result().timeline.is_empty());
    }
}
