//! Placeholder images for any `/images/{name}` a generated UI references.
//! The same name always yields the same SVG, so responses are cached forever.

use inkwell_ui::render::escape_html;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::sync::OnceLock;

pub const SVG_CONTENT_TYPE: &str = "image/svg+xml";
pub const CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

static EXTENSION_RE: OnceLock<Regex> = OnceLock::new();

/// Label drawn on the placeholder: the name without its extension.
pub fn label_for(name: &str) -> String {
    EXTENSION_RE
        .get_or_init(|| Regex::new(r"\.[a-zA-Z0-9]+$").expect("valid regex"))
        .replace(name, "")
        .into_owned()
}

/// Strong ETag derived from the label alone.
pub fn etag_for(label: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(label.as_bytes());
    format!("\"{:x}\"", hasher.finalize())
}

pub fn placeholder_svg(label: &str) -> String {
    format!(
        r##"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="1200" height="800" viewBox="0 0 1200 800">
  <defs><pattern id="grid" width="24" height="24" patternUnits="userSpaceOnUse"><rect width="24" height="24" fill="#fafafa"/><path d="M24 0H0V24" fill="none" stroke="#e5e7eb" stroke-width="1"/></pattern></defs>
  <rect width="1200" height="800" fill="url(#grid)"/>
  <g fill="#9ca3af" font-family="system-ui, -apple-system, Segoe UI, Roboto" font-size="36"><text x="50%" y="50%" text-anchor="middle">{}</text></g>
</svg>
"##,
        escape_html(label)
    )
}
