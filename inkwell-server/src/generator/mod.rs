//! Generation collaborators.
//!
//! Every backend answers a prompt (and, for a reprompt, the previous UI and
//! an exported sketch) with a [`GeneratedOutput`] or a typed
//! [`GenerationError`]. None of them fabricate output on failure.

pub mod anthropic;
pub mod chain;
pub mod describer;
pub mod gemini;
pub mod openai;
pub mod prompts;
pub mod rules;

use crate::config::{GeneratorMode, ServerConfig};
use crate::error::GenerationResult;
use async_trait::async_trait;
use inkwell_sketch::ImageBlob;
use inkwell_ui::{GeneratedOutput, GeneratedUiSchema};
use std::sync::Arc;

pub use anthropic::AnthropicGenerator;
pub use chain::ProviderChain;
pub use describer::SketchDescriber;
pub use gemini::GeminiGenerator;
pub use openai::OpenAiGenerator;
pub use rules::RuleGenerator;

#[async_trait]
pub trait Generator: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    async fn generate(&self, prompt: &str) -> GenerationResult<GeneratedOutput>;

    async fn reprompt(
        &self,
        prompt: &str,
        previous: Option<&GeneratedUiSchema>,
        overlay: Option<&ImageBlob>,
    ) -> GenerationResult<GeneratedOutput>;
}

/// Picks the generator for the configured mode.
pub fn from_config(config: &ServerConfig) -> Arc<dyn Generator> {
    match config.mode {
        GeneratorMode::Rules => Arc::new(RuleGenerator),
        GeneratorMode::Live => Arc::new(ProviderChain::from_config(config)),
    }
}

pub(crate) fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(120))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}
