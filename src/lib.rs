pub mod agent;
pub mod api;
pub mod config;
pub mod config_file;
pub mod errors;
pub mod frames;
pub mod media;
pub mod parse;
pub mod prompts;
pub mod providers;
pub mod report;
pub mod strategies;
pub mod tools;
pub mod types;
pub mod ui;
pub mod verdict;

pub use crate::agent::{Harvest, Orchestrator};
pub use crate::config::RunConfig;
pub use crate::config_file::FileConfig;
pub use crate::providers::{create_provider, create_provider_with_overrides, ProviderOverrides};
pub use crate::strategies::{run_strategy, Strategy};
pub use crate::types::{AssertionId, ModelId};
pub use crate::verdict::{Assertion, Evaluation, PipelineResult, Verdict};
