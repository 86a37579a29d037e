use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Optional `.screeneval/config.json`. Every field is overridable by
/// environment variables; env always wins.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_frames: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_turns: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fps: Option<f64>,
}

impl FileConfig {
    pub const PATH: &'static str = ".screeneval/config.json";

    /// Load from the conventional location under the current directory.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(Self::PATH))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"model": "claude-3-5-sonnet-20241022", "max_frames": 8, "fps": 2.0}"#,
        )
        .unwrap();

        let cfg = FileConfig::load_from(&path).unwrap();
        assert_eq!(cfg.model.as_deref(), Some("claude-3-5-sonnet-20241022"));
        assert_eq!(cfg.max_frames, Some(8));
        assert_eq!(cfg.fps, Some(2.0));
        assert!(cfg.max_turns.is_none());
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"future_knob": true}"#).unwrap();
        assert!(FileConfig::load_from(&path).is_ok());
    }

    #[test]
    fn missing_file_errors() {
        assert!(FileConfig::load_from(Path::new("/nonexistent/config.json")).is_err());
    }
}
