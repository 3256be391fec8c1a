use super::prompts::{
    overlay_data_url, parse_schema_output, refine_instruction, schema_system_prompt,
    GENERATE_INSTRUCTION, REPROMPT_INSTRUCTION,
};
use super::{http_client, Generator};
use crate::config::ProviderConfig;
use crate::error::{GenerationError, GenerationResult};
use async_trait::async_trait;
use inkwell_sketch::ImageBlob;
use inkwell_ui::{GeneratedOutput, GeneratedUiSchema};
use serde::Deserialize;
use serde_json::{json, Value};

const PROVIDER: &str = "openai";

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Chat completions in JSON mode.
pub struct OpenAiGenerator {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiGenerator {
    /// `None` when no API key is configured.
    pub fn from_config(config: &ProviderConfig) -> Option<Self> {
        Some(Self {
            client: http_client(),
            api_key: config.api_key.clone()?,
            model: config.model.clone(),
            base_url: config.base_url.clone(),
        })
    }

    async fn complete(&self, messages: Value) -> GenerationResult<GeneratedOutput> {
        let body = json!({
            "model": self.model,
            "response_format": { "type": "json_object" },
            "messages": messages,
        });
        let res = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::from_transport(PROVIDER, e))?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(GenerationError::from_status(PROVIDER, status, &text));
        }
        let chat: ChatResponse = res
            .json()
            .await
            .map_err(|e| GenerationError::from_transport(PROVIDER, e))?;
        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        parse_schema_output(PROVIDER, &content)
    }
}

#[async_trait]
impl Generator for OpenAiGenerator {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn generate(&self, prompt: &str) -> GenerationResult<GeneratedOutput> {
        self.complete(json!([
            { "role": "system", "content": schema_system_prompt() },
            { "role": "user", "content": prompt },
            { "role": "user", "content": GENERATE_INSTRUCTION },
        ]))
        .await
    }

    async fn reprompt(
        &self,
        prompt: &str,
        previous: Option<&GeneratedUiSchema>,
        overlay: Option<&ImageBlob>,
    ) -> GenerationResult<GeneratedOutput> {
        let mut content = vec![json!({
            "type": "text",
            "text": format!("{}\n{}", prompt, refine_instruction(previous)),
        })];
        if let Some(image) = overlay {
            content.push(json!({
                "type": "image_url",
                "image_url": { "url": overlay_data_url(image) },
            }));
        }
        self.complete(json!([
            { "role": "system", "content": schema_system_prompt() },
            { "role": "user", "content": content },
            { "role": "user", "content": REPROMPT_INSTRUCTION },
        ]))
        .await
    }
}
