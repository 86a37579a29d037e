use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::AssertionId;

/// A natural-language claim about the recording, supplied by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assertion {
    pub id: AssertionId,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<AssertionKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_step_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_step_description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssertionKind {
    Concrete,
    Subjective,
    Behavioral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Pass,
    Fail,
    Uncertain,
}

/// One narrated moment of the recording. Ordering is whatever the model
/// produced; treat it as best-effort narrative, not a verified log.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    pub timestamp_seconds: f64,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evidence {
    pub timestamp_seconds: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_index: Option<u32>,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub assertion_id: AssertionId,
    pub verdict: Verdict,
    pub confidence: f64,
    pub explanation: String,
    #[serde(default)]
    pub evidence: Vec<Evidence>,
}

impl Evaluation {
    /// The stand-in used when the model never addressed an assertion it was
    /// asked about. Only the `single` strategy emits it; the other paths
    /// leave unanswered assertions out of the map.
    pub fn fallback(id: AssertionId) -> Self {
        Self {
            assertion_id: id,
            verdict: Verdict::Uncertain,
            confidence: 0.0,
            explanation: "No evaluation returned.".to_string(),
            evidence: Vec::new(),
        }
    }
}

/// The single return contract shared by every strategy and the agentic loop.
/// A BTreeMap keeps report and CSV output deterministically ordered.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineResult {
    pub timeline: Vec<TimelineEntry>,
    pub evaluations: BTreeMap<AssertionId, Evaluation>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdict_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Verdict::Pass).unwrap(), "\"pass\"");
        assert_eq!(serde_json::to_string(&Verdict::Fail).unwrap(), "\"fail\"");
        assert_eq!(
            serde_json::to_string(&Verdict::Uncertain).unwrap(),
            "\"uncertain\""
        );
    }

    #[test]
    fn evaluation_camel_case_fields() {
        let eval = Evaluation {
            assertion_id: AssertionId::new("a1"),
            verdict: Verdict::Pass,
            confidence: 0.9,
            explanation: "Seen on screen".to_string(),
            evidence: vec![Evidence {
                timestamp_seconds: 1.5,
                frame_index: Some(3),
                description: "Button visible".to_string(),
            }],
        };

        let json = serde_json::to_value(&eval).unwrap();
        assert_eq!(json["assertionId"], "a1");
        assert_eq!(json["evidence"][0]["timestampSeconds"], 1.5);
        assert_eq!(json["evidence"][0]["frameIndex"], 3);
    }

    #[test]
    fn evaluation_deserializes_without_evidence() {
        let json = r#"{"assertionId":"a1","verdict":"fail","confidence":0.3,"explanation":"x"}"#;
        let eval: Evaluation = serde_json::from_str(json).unwrap();
        assert!(eval.evidence.is_empty());
        assert_eq!(eval.verdict, Verdict::Fail);
    }

    #[test]
    fn fallback_shape() {
        let eval = Evaluation::fallback(AssertionId::new("a9"));
        assert_eq!(eval.verdict, Verdict::Uncertain);
        assert_eq!(eval.confidence, 0.0);
        assert_eq!(eval.explanation, "No evaluation returned.");
        assert!(eval.evidence.is_empty());
    }

    #[test]
    fn assertion_accepts_minimal_json() {
        let json = r#"{"id":"a1","text":"Login button is visible"}"#;
        let assertion: Assertion = serde_json::from_str(json).unwrap();
        assert!(assertion.kind.is_none());
        assert!(assertion.test_step_id.is_none());
    }
}
