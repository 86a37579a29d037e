use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{ToolId, ToolName};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Message {
    pub role: String,
    pub content: Vec<ContentBlock>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: vec![ContentBlock::Text { text: text.into() }],
        }
    }

    pub fn user_blocks(content: Vec<ContentBlock>) -> Self {
        Self {
            role: "user".to_string(),
            content,
        }
    }

    pub fn assistant(content: Vec<ContentBlock>) -> Self {
        Self {
            role: "assistant".to_string(),
            content,
        }
    }

    /// Tool results go back to the model as a user turn, all results for a
    /// turn batched into one message.
    pub fn tool_results(results: Vec<ContentBlock>) -> Self {
        Self {
            role: "user".to_string(),
            content: results,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    Image {
        source: ImageSource,
    },
    ToolUse {
        id: ToolId,
        name: ToolName,
        input: Value,
    },
    ToolResult {
        tool_use_id: ToolId,
        content: String,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        is_error: bool,
    },
}

/// Base64 image payload in the Messages API shape.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ImageSource {
    #[serde(rename = "type")]
    pub source_type: String,
    pub media_type: String,
    pub data: String,
}

impl ImageSource {
    pub fn base64(media_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            source_type: "base64".to_string(),
            media_type: media_type.into(),
            data: data.into(),
        }
    }
}

#[derive(Serialize, Clone, Debug)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_user() {
        let msg = Message::user("Hello world");
        assert_eq!(msg.role, "user");
        assert_eq!(msg.content.len(), 1);

        match &msg.content[0] {
            ContentBlock::Text { text } => assert_eq!(text, "Hello world"),
            other => panic!("Expected Text content block, got: {other:?}"),
        }
    }

    #[test]
    fn test_message_tool_results() {
        let results = vec![ContentBlock::ToolResult {
            tool_use_id: ToolId::new("tool_1"),
            content: "{\"timeline\":[]}".to_string(),
            is_error: false,
        }];

        let msg = Message::tool_results(results);
        assert_eq!(msg.role, "user");
        assert_eq!(msg.content.len(), 1);

        match &msg.content[0] {
            ContentBlock::ToolResult {
                tool_use_id,
                content,
                is_error,
            } => {
                assert_eq!(tool_use_id.as_str(), "tool_1");
                assert_eq!(content, "{\"timeline\":[]}");
                assert!(!is_error);
            }
            other => panic!("Expected ToolResult content block, got: {other:?}"),
        }
    }

    #[test]
    fn test_content_block_tool_use_serialization() {
        let block = ContentBlock::ToolUse {
            id: ToolId::new("123"),
            name: ToolName::new("describe_timeline"),
            input: json!({}),
        };

        let json = serde_json::to_value(&block).expect("serialize ContentBlock");
        assert_eq!(json["type"], "tool_use");
        assert_eq!(json["id"], "123");
        assert_eq!(json["name"], "describe_timeline");
    }

    #[test]
    fn test_content_block_image_serialization() {
        let block = ContentBlock::Image {
            source: ImageSource::base64("image/jpeg", "QUJD"),
        };

        let json = serde_json::to_value(&block).expect("serialize ContentBlock");
        assert_eq!(json["type"], "image");
        assert_eq!(json["source"]["type"], "base64");
        assert_eq!(json["source"]["media_type"], "image/jpeg");
        assert_eq!(json["source"]["data"], "QUJD");
    }

    #[test]
    fn test_tool_result_error_flag_serialization() {
        let ok = ContentBlock::ToolResult {
            tool_use_id: ToolId::new("1"),
            content: "fine".to_string(),
            is_error: false,
        };
        let err = ContentBlock::ToolResult {
            tool_use_id: ToolId::new("2"),
            content: "{\"error\":\"boom\"}".to_string(),
            is_error: true,
        };

        let ok_json = serde_json::to_value(&ok).unwrap();
        let err_json = serde_json::to_value(&err).unwrap();
        assert!(ok_json.get("is_error").is_none());
        assert_eq!(err_json["is_error"], true);
    }

    #[test]
    fn test_message_serialization_roundtrip() {
        let original = Message::user("Test message");
        let json = serde_json::to_string(&original).expect("serialize Message");
        let deserialized: Message = serde_json::from_str(&json).expect("deserialize Message");

        assert_eq!(deserialized.role, "user");
        assert_eq!(deserialized.content.len(), 1);
    }

    #[test]
    fn test_tool_definition_serialization() {
        let tool = ToolDefinition {
            name: "describe_timeline".to_string(),
            description: "Describe the recording".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {}
            }),
        };

        let json = serde_json::to_value(&tool).expect("serialize ToolDefinition");
        assert_eq!(json["name"], "describe_timeline");
        assert_eq!(json["input_schema"]["type"], "object");
    }
}
