use crate::types::ModelId;

/// Knobs that bound a run. All previously-implicit constants (frame cap,
/// turn ceiling) live here so tests can shrink them.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub model: ModelId,
    pub max_tokens: u32,
    /// Cap on frames included in any single model request.
    pub max_frames: usize,
    /// Ceiling on agentic conversation turns.
    pub max_turns: usize,
    /// Frames per second asked of the extractor.
    pub fps: f64,
    pub timeout_secs: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        let model = ModelId::claude_sonnet();
        let max_tokens = model.max_tokens();
        Self {
            model,
            max_tokens,
            max_frames: 20,
            max_turns: 10,
            fps: 1.0,
            timeout_secs: 120,
        }
    }
}

impl RunConfig {
    pub fn with_model(mut self, model: ModelId) -> Self {
        self.max_tokens = model.max_tokens();
        self.model = model;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_bounded() {
        let cfg = RunConfig::default();
        assert_eq!(cfg.max_frames, 20);
        assert_eq!(cfg.max_turns, 10);
        assert!(cfg.max_tokens > 0);
    }

    #[test]
    fn with_model_refreshes_max_tokens() {
        let cfg = RunConfig::default().with_model(ModelId::new("claude-3-haiku-20240307"));
        assert_eq!(cfg.max_tokens, 4096);
    }
}
