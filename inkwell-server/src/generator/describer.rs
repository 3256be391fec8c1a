use super::http_client;
use super::prompts::overlay_base64;
use crate::config::DescriberConfig;
use crate::error::{GenerationError, GenerationResult};
use inkwell_sketch::ImageBlob;
use serde::Deserialize;
use serde_json::json;

const PROVIDER: &str = "ollama";
const SYSTEM_PROMPT: &str = "You are Magnus Frontend. Analyze the sketch and produce a detailed UI prompt for Gemini. Output only the prompt text, no code.";
const DEFAULT_REQUEST: &str = "Analyze and describe the UI in this sketch to generate a high-quality prompt.";

#[derive(Deserialize)]
struct ChatResponse {
    message: Option<ChatMessage>,
}

#[derive(Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: String,
}

/// Turns an exported sketch into a textual UI description using a local
/// vision model.
pub struct SketchDescriber {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl SketchDescriber {
    pub fn new(config: &DescriberConfig) -> Self {
        Self {
            client: http_client(),
            base_url: config.base_url.clone(),
            model: config.model.clone(),
        }
    }

    pub async fn describe(&self, sketch: &ImageBlob, request: &str) -> GenerationResult<String> {
        let request = if request.trim().is_empty() {
            DEFAULT_REQUEST
        } else {
            request
        };
        let body = json!({
            "model": self.model,
            "stream": false,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": request, "images": [overlay_base64(sketch)] },
            ],
        });
        let res = self
            .client
            .post(format!("{}/api/chat", self.base_url))
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
        Ok(chat
            .message
            .map(|m| m.content.trim().to_string())
            .unwrap_or_default())
    }
}
