use super::prompts::{
    overlay_base64, parse_schema_output, refine_instruction, schema_system_prompt,
    GENERATE_INSTRUCTION, REPROMPT_INSTRUCTION,
};
use super::{http_client, Generator};
use crate::config::ProviderConfig;
use crate::error::{GenerationError, GenerationResult};
use async_trait::async_trait;
use inkwell_sketch::ImageBlob;
use inkwell_ui::{GeneratedOutput, GeneratedUiSchema};
use serde::Deserialize;
use serde_json::json;

const PROVIDER: &str = "anthropic";
const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 2048;

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// Messages API. The overlay travels inline as a base64 data URL in the text.
pub struct AnthropicGenerator {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl AnthropicGenerator {
    pub fn from_config(config: &ProviderConfig) -> Option<Self> {
        Some(Self {
            client: http_client(),
            api_key: config.api_key.clone()?,
            model: config.model.clone(),
            base_url: config.base_url.clone(),
        })
    }

    async fn complete(&self, text: String) -> GenerationResult<GeneratedOutput> {
        let body = json!({
            "model": self.model,
            "max_tokens": MAX_TOKENS,
            "system": schema_system_prompt(),
            "messages": [{ "role": "user", "content": text }],
        });
        let res = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::from_transport(PROVIDER, e))?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(GenerationError::from_status(PROVIDER, status, &text));
        }
        let message: MessagesResponse = res
            .json()
            .await
            .map_err(|e| GenerationError::from_transport(PROVIDER, e))?;
        let text = message
            .content
            .into_iter()
            .next()
            .filter(|block| block.kind == "text")
            .and_then(|block| block.text)
            .unwrap_or_default();
        parse_schema_output(PROVIDER, &text)
    }
}

#[async_trait]
impl Generator for AnthropicGenerator {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn generate(&self, prompt: &str) -> GenerationResult<GeneratedOutput> {
        self.complete(format!("{}\n{}", prompt, GENERATE_INSTRUCTION))
            .await
    }

    async fn reprompt(
        &self,
        prompt: &str,
        previous: Option<&GeneratedUiSchema>,
        overlay: Option<&ImageBlob>,
    ) -> GenerationResult<GeneratedOutput> {
        let mut text = format!("{}\n{}", prompt, refine_instruction(previous));
        if let Some(image) = overlay {
            text.push_str(&format!(
                "\nOverlay image (base64 PNG): data:image/png;base64,{}",
                overlay_base64(image)
            ));
        }
        text.push('\n');
        text.push_str(REPROMPT_INSTRUCTION);
        self.complete(text).await
    }
}
