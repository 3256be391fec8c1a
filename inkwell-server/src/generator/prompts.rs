use crate::error::{GenerationError, GenerationResult};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use inkwell_preview::sanitize::sanitize;
use inkwell_sketch::ImageBlob;
use inkwell_ui::{GeneratedOutput, GeneratedUiSchema};

pub const GENERATE_INSTRUCTION: &str = "Return only JSON for GeneratedUISchema with a useful UI.";
pub const REPROMPT_INSTRUCTION: &str = "Return only JSON for GeneratedUISchema reflecting the edits.";

/// System prompt for the JSON schema providers.
pub fn schema_system_prompt() -> String {
    [
        "You are a UI generator that outputs a strict JSON object.",
        "Always return only valid minified JSON matching this TypeScript type:",
        "type UIElement = { id?: string; type: 'container'|'text'|'button'|'image'|'input'|'card'; className?: string; style?: Record<string,string|number>; text?: string; placeholder?: string; src?: string; children?: UIElement[] };",
        "type GeneratedUISchema = { root: UIElement };",
        "- Use tailwind utility classes in className for layout and styling.",
        "- Prefer semantic structure and concise content strings.",
    ]
    .join("\n")
}

/// System prompt for providers that answer with HTML.
pub fn markup_system_prompt() -> String {
    [
        "You generate production-ready UI as HTML with Tailwind CSS.",
        "Rules:",
        "- Output only HTML (no markdown, no code fences, no explanations).",
        "- Use semantic HTML and responsive Tailwind classes.",
        "- Do not reference external URLs; prefer provided /images/* assets.",
    ]
    .join("\n")
}

pub fn refine_instruction(previous: Option<&GeneratedUiSchema>) -> String {
    let previous_json = previous
        .and_then(|ui| serde_json::to_string(ui).ok())
        .map(|json| format!("Previous UI JSON: {}", json))
        .unwrap_or_default();
    [
        "Refine the previous UI based on the user's sketch and prompt.",
        "Preserve overall structure but apply the indicated changes (layout, emphasis, components).",
        previous_json.as_str(),
    ]
    .join("\n")
}

pub fn overlay_base64(overlay: &ImageBlob) -> String {
    STANDARD.encode(&overlay.bytes)
}

pub fn overlay_data_url(overlay: &ImageBlob) -> String {
    format!("data:{};base64,{}", overlay.mime, overlay_base64(overlay))
}

/// Reads a provider's JSON answer. Fences around the JSON are tolerated.
pub fn parse_schema_output(provider: &'static str, text: &str) -> GenerationResult<GeneratedOutput> {
    let cleaned = sanitize(text);
    let body = if cleaned.is_empty() { "{}" } else { cleaned.as_str() };
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| GenerationError::malformed(provider, e))?;
    GeneratedOutput::from_value(&value).map_err(|e| GenerationError::malformed(provider, e))
}
