use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::str::FromStr;

use anyhow::Result;
use serde_json::Value;

use crate::api::{ContentBlock, Message};
use crate::config::RunConfig;
use crate::errors::ParseError;
use crate::frames::{frame_to_block, sample_frames, Frame};
use crate::parse::parse_json;
use crate::prompts;
use crate::providers::{InferenceRequest, InferenceResponse, LLMProvider};
use crate::types::AssertionId;
use crate::verdict::{Assertion, Evaluation, PipelineResult, TimelineEntry};

/// The three fixed, loop-free evaluation pipelines. Selecting one of these
/// and running the agentic loop are mutually exclusive entry points; both
/// return the same `PipelineResult`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Single,
    Batch,
    TwoPass,
}

impl FromStr for Strategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "single" => Ok(Self::Single),
            "batch" => Ok(Self::Batch),
            "two-pass" | "two_pass" => Ok(Self::TwoPass),
            other => Err(anyhow::anyhow!("Unknown strategy: {other}")),
        }
    }
}

pub async fn run_strategy(
    strategy: Strategy,
    provider: &dyn LLMProvider,
    cfg: &RunConfig,
    frames: &[Frame],
    assertions: &[Assertion],
) -> Result<PipelineResult> {
    match strategy {
        Strategy::Single => run_single(provider, cfg, frames, assertions).await,
        Strategy::Batch => run_batch(provider, cfg, frames, assertions).await,
        Strategy::TwoPass => run_two_pass(provider, cfg, frames, assertions).await,
    }
}

/// One vision call over the sampled frames asking for a timeline. Shared by
/// the two-pass strategy and the `describe_timeline` tool backend.
pub async fn produce_timeline(
    provider: &dyn LLMProvider,
    cfg: &RunConfig,
    frames: &[Frame],
) -> Result<Vec<TimelineEntry>> {
    let request = frames_request(cfg, frames, prompts::timeline_instruction())?;
    let response = provider.infer(&request).await?;
    let payload = parse_json(&response_text(&response))?;
    Ok(extract_timeline(&payload))
}

/// One text-only call evaluating every assertion against a serialized
/// timeline. Shared by the two-pass strategy and the `evaluate_assertions`
/// tool backend.
pub async fn produce_evaluations(
    provider: &dyn LLMProvider,
    cfg: &RunConfig,
    timeline: &[TimelineEntry],
    assertions: &[Assertion],
) -> Result<Vec<Evaluation>> {
    let request = InferenceRequest {
        model: cfg.model.clone(),
        messages: vec![Message::user(prompts::evaluation_instruction(
            timeline, assertions,
        ))],
        tools: Vec::new(),
        tool_choice: None,
        max_tokens: cfg.max_tokens,
        system: prompts::SYSTEM_PROMPT.to_string(),
    };
    let response = provider.infer(&request).await?;
    let payload = parse_json(&response_text(&response))?;
    Ok(extract_evaluations(&payload))
}

async fn run_two_pass(
    provider: &dyn LLMProvider,
    cfg: &RunConfig,
    frames: &[Frame],
    assertions: &[Assertion],
) -> Result<PipelineResult> {
    let timeline = match produce_timeline(provider, cfg, frames).await {
        Ok(timeline) => timeline,
        Err(e) if is_malformed(&e) => {
            log::warn!("timeline pass returned malformed output: {e}");
            Vec::new()
        }
        Err(e) => return Err(e),
    };

    let evaluations = match produce_evaluations(provider, cfg, &timeline, assertions).await {
        Ok(evals) => evals,
        Err(e) if is_malformed(&e) => {
            log::warn!("evaluation pass returned malformed output: {e}");
            Vec::new()
        }
        Err(e) => return Err(e),
    };

    Ok(PipelineResult {
        timeline,
        evaluations: collect_evaluations(evaluations, assertions),
    })
}

async fn run_batch(
    provider: &dyn LLMProvider,
    cfg: &RunConfig,
    frames: &[Frame],
    assertions: &[Assertion],
) -> Result<PipelineResult> {
    let request = frames_request(cfg, frames, prompts::batch_instruction(assertions))?;
    let response = provider.infer(&request).await?;

    match parse_json(&response_text(&response)) {
        Ok(payload) => Ok(PipelineResult {
            timeline: extract_timeline(&payload),
            evaluations: collect_evaluations(extract_evaluations(&payload), assertions),
        }),
        Err(e) => {
            log::warn!("batch response was malformed: {e}");
            Ok(PipelineResult::default())
        }
    }
}

/// One call per assertion, strictly in input order. Every input assertion
/// ends up in the map: when the model fails to answer one, it gets the
/// fallback evaluation instead of being dropped.
async fn run_single(
    provider: &dyn LLMProvider,
    cfg: &RunConfig,
    frames: &[Frame],
    assertions: &[Assertion],
) -> Result<PipelineResult> {
    let mut evaluations = BTreeMap::new();

    for assertion in assertions {
        let request = frames_request(cfg, frames, prompts::single_instruction(assertion))?;
        let response = provider.infer(&request).await?;

        let evaluation = parse_json(&response_text(&response))
            .ok()
            .map(|payload| extract_evaluations(&payload))
            .and_then(|mut evals| {
                if evals.is_empty() {
                    None
                } else {
                    Some(evals.remove(0))
                }
            })
            .map(|mut eval| {
                // The map key and the evaluation must carry the input id,
                // whatever the model echoed back.
                eval.assertion_id = assertion.id.clone();
                eval
            })
            .unwrap_or_else(|| Evaluation::fallback(assertion.id.clone()));

        evaluations.insert(assertion.id.clone(), evaluation);
    }

    Ok(PipelineResult {
        timeline: Vec::new(),
        evaluations,
    })
}

/// Build the vision request: per frame a timestamp caption followed by the
/// image, then the instruction. Frame bytes are read here, at build time.
fn frames_request(
    cfg: &RunConfig,
    frames: &[Frame],
    instruction: String,
) -> Result<InferenceRequest> {
    let sampled = sample_frames(frames, cfg.max_frames);
    let mut blocks = Vec::with_capacity(sampled.len() * 2 + 1);
    for frame in &sampled {
        blocks.push(ContentBlock::Text {
            text: format!(
                "t={:.2}s (frame {})",
                frame.timestamp_seconds, frame.frame_index
            ),
        });
        blocks.push(frame_to_block(frame)?);
    }
    blocks.push(ContentBlock::Text { text: instruction });

    Ok(InferenceRequest {
        model: cfg.model.clone(),
        messages: vec![Message::user_blocks(blocks)],
        tools: Vec::new(),
        tool_choice: None,
        max_tokens: cfg.max_tokens,
        system: prompts::SYSTEM_PROMPT.to_string(),
    })
}

fn response_text(response: &InferenceResponse) -> String {
    response
        .content
        .iter()
        .filter_map(|block| match block {
            ContentBlock::Text { text } => Some(text.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub(crate) fn extract_timeline(payload: &Value) -> Vec<TimelineEntry> {
    payload
        .get("timeline")
        .and_then(|v| v.as_array())
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| serde_json::from_value(entry.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}

pub(crate) fn extract_evaluations(payload: &Value) -> Vec<Evaluation> {
    payload
        .get("evaluations")
        .and_then(|v| v.as_array())
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| match serde_json::from_value(entry.clone()) {
                    Ok(eval) => Some(eval),
                    Err(e) => {
                        log::warn!("dropping malformed evaluation entry: {e}");
                        None
                    }
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Fold a list of evaluations into the result map: last write wins per id,
/// and ids that were never part of the input assertion set are dropped.
pub(crate) fn collect_evaluations(
    evaluations: Vec<Evaluation>,
    assertions: &[Assertion],
) -> BTreeMap<AssertionId, Evaluation> {
    let known: BTreeSet<&AssertionId> = assertions.iter().map(|a| &a.id).collect();
    let mut map = BTreeMap::new();
    for eval in evaluations {
        if !known.contains(&eval.assertion_id) {
            log::warn!("dropping evaluation for unknown assertion id {}", eval.assertion_id);
            continue;
        }
        map.insert(eval.assertion_id.clone(), eval);
    }
    map
}

fn is_malformed(e: &anyhow::Error) -> bool {
    e.downcast_ref::<ParseError>().is_some()
}
