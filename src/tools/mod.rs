use serde_json::{json, Value};

use crate::api::ToolDefinition;
use crate::config::RunConfig;
use crate::frames::Frame;
use crate::providers::LLMProvider;
use crate::strategies::{produce_evaluations, produce_timeline};
use crate::verdict::{Assertion, TimelineEntry};

pub const DESCRIBE_TIMELINE: &str = "describe_timeline";
pub const EVALUATE_ASSERTIONS: &str = "evaluate_assertions";

/// Everything a tool backend needs to run: the loaded frames, the input
/// assertions, and the gateway the backends call through.
pub struct ToolContext<'a> {
    pub provider: &'a dyn LLMProvider,
    pub cfg: &'a RunConfig,
    pub frames: &'a [Frame],
    pub assertions: &'a [Assertion],
}

/// The contract between the executor and the orchestrator loop: a JSON
/// payload plus an error flag. Every code path through `execute_tool`
/// produces one of these; nothing is raised past this boundary.
#[derive(Debug, Clone)]
pub struct ToolResultEnvelope {
    pub content: String,
    pub is_error: bool,
}

impl ToolResultEnvelope {
    fn ok(payload: Value) -> Self {
        Self {
            content: payload.to_string(),
            is_error: false,
        }
    }

    fn error(message: impl std::fmt::Display) -> Self {
        Self {
            content: json!({ "error": message.to_string() }).to_string(),
            is_error: true,
        }
    }
}

pub async fn execute_tool(name: &str, input: &Value, ctx: &ToolContext<'_>) -> ToolResultEnvelope {
    match name {
        DESCRIBE_TIMELINE => match produce_timeline(ctx.provider, ctx.cfg, ctx.frames).await {
            Ok(timeline) => ToolResultEnvelope::ok(json!({ "timeline": timeline })),
            Err(e) => ToolResultEnvelope::error(e),
        },
        EVALUATE_ASSERTIONS => {
            // The schema requires a timeline, but a missing or misshapen one
            // is coerced to empty rather than rejected.
            let timeline = coerce_timeline(input);
            match produce_evaluations(ctx.provider, ctx.cfg, &timeline, ctx.assertions).await {
                Ok(evaluations) => ToolResultEnvelope::ok(json!({ "evaluations": evaluations })),
                Err(e) => ToolResultEnvelope::error(e),
            }
        }
        other => ToolResultEnvelope::error(format!("Unknown tool: {other}")),
    }
}

fn coerce_timeline(input: &Value) -> Vec<TimelineEntry> {
    input
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

pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: DESCRIBE_TIMELINE.into(),
            description:
                "Watch the loaded screen recording and return a timeline of what happens on screen."
                    .into(),
            input_schema: json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        },
        ToolDefinition {
            name: EVALUATE_ASSERTIONS.into(),
            description:
                "Evaluate the loaded assertions against a timeline of observed events."
                    .into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "timeline": {
                        "type": "array",
                        "description": "Timeline entries from describe_timeline",
                        "items": {
                            "type": "object",
                            "properties": {
                                "timestampSeconds": { "type": "number" },
                                "description": { "type": "string" }
                            },
                            "required": ["timestampSeconds", "description"]
                        }
                    }
                },
                "required": ["timeline"]
            }),
        },
    ]
}
