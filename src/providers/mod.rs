use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub mod anthropic;

use crate::api::{ContentBlock, Message, ToolDefinition};
use crate::config_file::FileConfig;
use crate::errors::ProviderError;
use crate::types::ModelId;
use reqwest::Client;

pub(crate) struct ProviderHttpClient {
    client: Client,
}

impl ProviderHttpClient {
    pub fn new(timeout_secs: u64) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self { client })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

/// One request/response exchange with the model backend.
#[derive(Debug, Clone)]
pub struct InferenceRequest {
    pub model: ModelId,
    pub messages: Vec<Message>,
    pub tools: Vec<ToolDefinition>,
    /// Messages-API tool_choice object, e.g. `{"type": "auto"}`. None lets
    /// the backend default apply.
    pub tool_choice: Option<serde_json::Value>,
    pub max_tokens: u32,
    pub system: String,
}

#[derive(Debug, Clone)]
pub struct InferenceResponse {
    pub content: Vec<ContentBlock>,
    pub stop_reason: String,
    pub usage: Usage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// The model gateway. Stateless: no retries, no session state; callers own
/// the conversation history and transport failures surface unmodified.
#[async_trait::async_trait]
pub trait LLMProvider: Send + Sync {
    async fn infer(&self, req: &InferenceRequest) -> Result<InferenceResponse, ProviderError>;

    fn name(&self) -> &str;

    fn model(&self) -> &ModelId;

    fn validate_config(&self) -> Result<(), ProviderError>;
}

#[derive(Debug, Clone, Default)]
pub struct ProviderOverrides {
    /// Model override (e.g. from CLI -m/--model)
    pub model: Option<ModelId>,
    pub timeout_secs: Option<u64>,
}

/// Resolve a provider from configuration, in priority order:
/// 1. CLI overrides
/// 2. Environment variables (MODEL, ANTHROPIC_API_KEY)
/// 3. .screeneval/config.json
/// 4. Error if no API key is available
pub fn create_provider() -> Result<Box<dyn LLMProvider>, ProviderError> {
    create_provider_with_overrides(ProviderOverrides::default())
}

pub fn create_provider_with_overrides(
    overrides: ProviderOverrides,
) -> Result<Box<dyn LLMProvider>, ProviderError> {
    // Load .env file if available
    let _ = dotenvy::dotenv();

    let config_file = FileConfig::load().ok();

    let key = env::var("ANTHROPIC_API_KEY")
        .map_err(|_| ProviderError::MissingApiKey("anthropic".to_string()))?;

    let cfg_model = config_file
        .as_ref()
        .and_then(|c| c.model.clone())
        .map(ModelId::new);
    let model = overrides
        .model
        .or(env::var("MODEL").ok().map(ModelId::new))
        .or(cfg_model);

    let timeout_secs = overrides
        .timeout_secs
        .or(config_file.as_ref().and_then(|c| c.timeout_secs))
        .unwrap_or(120);

    let provider = anthropic::AnthropicProvider::new_with_model(key, model, timeout_secs)?;
    provider.validate_config()?;
    Ok(Box::new(provider))
}
