use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

use crate::errors::ParseError;

fn fence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // One optional fenced block, optionally tagged `json`.
        Regex::new(r"(?s)^```(?:json)?\s*\n?(.*?)\n?```$").expect("fence regex")
    })
}

/// Extract a JSON payload from free-form model text. Tolerates a single
/// surrounding markdown fence; anything else must already be valid JSON.
/// Never falls back to a default value.
pub fn parse_json(text: &str) -> Result<Value, ParseError> {
    let trimmed = text.trim();
    let body = match fence_re().captures(trimmed) {
        Some(caps) => caps.get(1).map(|m| m.as_str()).unwrap_or(""),
        None => trimmed,
    };

    serde_json::from_str(body.trim()).map_err(|e| ParseError::MalformedOutput(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_bare_json() {
        let value = parse_json(r#"{"timeline": []}"#).unwrap();
        assert_eq!(value, json!({"timeline": []}));
    }

    #[test]
    fn parses_fenced_json() {
        let text = "```json\n{\"a\": 1}\n```";
        assert_eq!(parse_json(text).unwrap(), json!({"a": 1}));
    }

    #[test]
    fn parses_untagged_fence() {
        let text = "```\n[1, 2, 3]\n```";
        assert_eq!(parse_json(text).unwrap(), json!([1, 2, 3]));
    }

    #[test]
    fn fence_roundtrip_matches_bare() {
        let original = json!({"evaluations": [{"assertionId": "a1"}]});
        let bare = serde_json::to_string(&original).unwrap();
        let fenced = format!("```json\n{bare}\n```");
        assert_eq!(parse_json(&bare).unwrap(), original);
        assert_eq!(parse_json(&fenced).unwrap(), original);
    }

    #[test]
    fn tolerates_surrounding_whitespace() {
        let text = "  \n```json\n{\"ok\": true}\n```\n  ";
        assert_eq!(parse_json(text).unwrap(), json!({"ok": true}));
    }

    #[test]
    fn rejects_prose() {
        let err = parse_json("I could not find a login button.").unwrap_err();
        assert!(matches!(err, ParseError::MalformedOutput(_)));
    }

    #[test]
    fn rejects_empty() {
        assert!(parse_json("").is_err());
        assert!(parse_json("``````").is_err());
    }
}
