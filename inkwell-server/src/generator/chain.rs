use super::{AnthropicGenerator, GeminiGenerator, Generator, OpenAiGenerator};
use crate::config::ServerConfig;
use crate::error::{GenerationError, GenerationResult};
use async_trait::async_trait;
use inkwell_sketch::ImageBlob;
use inkwell_ui::{GeneratedOutput, GeneratedUiSchema};
use std::sync::Arc;

/// Hosted providers in preference order. The first one wins; a failure is
/// reported as is, not retried on the next provider.
#[derive(Default)]
pub struct ProviderChain {
    providers: Vec<Arc<dyn Generator>>,
}

impl ProviderChain {
    pub fn new(providers: Vec<Arc<dyn Generator>>) -> Self {
        Self { providers }
    }

    /// OpenAI, then Anthropic, then Gemini, skipping those without a key.
    pub fn from_config(config: &ServerConfig) -> Self {
        let mut providers: Vec<Arc<dyn Generator>> = Vec::new();
        if let Some(openai) = OpenAiGenerator::from_config(&config.openai) {
            providers.push(Arc::new(openai));
        }
        if let Some(anthropic) = AnthropicGenerator::from_config(&config.anthropic) {
            providers.push(Arc::new(anthropic));
        }
        if let Some(gemini) = GeminiGenerator::from_config(&config.gemini) {
            providers.push(Arc::new(gemini));
        }
        Self { providers }
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    fn primary(&self) -> GenerationResult<&Arc<dyn Generator>> {
        self.providers.first().ok_or(GenerationError::NotConfigured)
    }
}

#[async_trait]
impl Generator for ProviderChain {
    fn name(&self) -> &'static str {
        self.providers.first().map_or("none", |p| p.name())
    }

    async fn generate(&self, prompt: &str) -> GenerationResult<GeneratedOutput> {
        self.primary()?.generate(prompt).await
    }

    async fn reprompt(
        &self,
        prompt: &str,
        previous: Option<&GeneratedUiSchema>,
        overlay: Option<&ImageBlob>,
    ) -> GenerationResult<GeneratedOutput> {
        self.primary()?.reprompt(prompt, previous, overlay).await
    }
}
