use thiserror::Error;

/// Failures crossing the model-backend boundary. These are not recoverable
/// inside the core: they propagate to the top of the run and abort it.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Missing API key for provider: {0}")]
    MissingApiKey(String),

    #[error("No provider configured (set ANTHROPIC_API_KEY)")]
    NoProviderConfigured,

    #[error("Provider configuration error: {0}")]
    Config(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// The model returned text we could not turn into the expected JSON payload.
/// Callers catch this locally and degrade; it never aborts a run by itself.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Malformed model output: {0}")]
    MalformedOutput(String),
}

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Unsupported frame format: {0}")]
    UnsupportedFormat(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
