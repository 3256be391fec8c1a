use super::prompts::{markup_system_prompt, overlay_base64, refine_instruction};
use super::{http_client, Generator};
use crate::config::ProviderConfig;
use crate::error::{GenerationError, GenerationResult};
use async_trait::async_trait;
use inkwell_sketch::ImageBlob;
use inkwell_ui::{GeneratedOutput, GeneratedUiSchema};
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::OnceLock;

const PROVIDER: &str = "gemini";

static FENCE_RE: OnceLock<Regex> = OnceLock::new();

/// Unwraps a single fenced block (`` ```html ... ``` ``) if the answer has one.
pub fn strip_code_fences(text: &str) -> &str {
    let re = FENCE_RE.get_or_init(|| {
        Regex::new(r"(?m)^```[a-zA-Z]*\n([\s\S]*?)\n```$").expect("valid regex")
    });
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map_or(text, |m| m.as_str())
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
}

/// generateContent API. Answers with HTML code rather than a UI tree.
pub struct GeminiGenerator {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiGenerator {
    pub fn from_config(config: &ProviderConfig) -> Option<Self> {
        Some(Self {
            client: http_client(),
            api_key: config.api_key.clone()?,
            model: config.model.clone(),
            base_url: config.base_url.clone(),
        })
    }

    async fn complete(&self, parts: Vec<Value>) -> GenerationResult<GeneratedOutput> {
        let res = self
            .client
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.base_url, self.model
            ))
            .query(&[("key", &self.api_key)])
            .json(&json!({ "contents": [{ "role": "user", "parts": parts }] }))
            .send()
            .await
            .map_err(|e| GenerationError::from_transport(PROVIDER, e))?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(GenerationError::from_status(PROVIDER, status, &text));
        }
        let answer: GenerateContentResponse = res
            .json()
            .await
            .map_err(|e| GenerationError::from_transport(PROVIDER, e))?;
        let text: String = answer
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        let code = strip_code_fences(&text).trim();
        if code.is_empty() {
            return Err(GenerationError::malformed(PROVIDER, "empty answer"));
        }
        Ok(GeneratedOutput::code(code))
    }
}

fn requirements(prompt: &str) -> String {
    format!("{}\nUser Requirements:\n{}", markup_system_prompt(), prompt)
}

#[async_trait]
impl Generator for GeminiGenerator {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn generate(&self, prompt: &str) -> GenerationResult<GeneratedOutput> {
        self.complete(vec![json!({ "text": requirements(prompt) })])
            .await
    }

    async fn reprompt(
        &self,
        prompt: &str,
        previous: Option<&GeneratedUiSchema>,
        overlay: Option<&ImageBlob>,
    ) -> GenerationResult<GeneratedOutput> {
        let text = format!("{}\n{}", prompt, refine_instruction(previous));
        let mut parts = vec![json!({ "text": requirements(&text) })];
        if let Some(image) = overlay {
            parts.push(json!({
                "inline_data": { "mime_type": image.mime, "data": overlay_base64(image) }
            }));
        }
        self.complete(parts).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_one_fenced_block() {
        assert_eq!(strip_code_fences("```html\n<div>x</div>\n```"), "<div>x</div>");
        assert_eq!(strip_code_fences("```\n<p>a</p>\n<p>b</p>\n```"), "<p>a</p>\n<p>b</p>");
        assert_eq!(strip_code_fences("<main></main>"), "<main></main>");
    }

    #[test]
    fn requirements_follow_rules() {
        let text = requirements("a pricing page");
        assert!(text.starts_with("You generate production-ready UI as HTML with Tailwind CSS."));
        assert!(text.ends_with("/images/* assets.\nUser Requirements:\na pricing page"));
    }
}
