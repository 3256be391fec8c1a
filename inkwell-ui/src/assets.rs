//! Image source normalization.
//!
//! Generated trees reference images by speculative filenames that never exist.
//! Every non-URL source is collapsed onto `/images/<name>`, which the image
//! route answers with a deterministic placeholder.

use regex::Regex;
use std::sync::OnceLock;

pub const IMAGE_ROUTE_PREFIX: &str = "/images/";
pub const PLACEHOLDER_PATH: &str = "/images/placeholder";

fn absolute_url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^https?://").expect("valid regex"))
}

fn extension_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\.[a-zA-Z0-9]+$").expect("valid regex"))
}

/// Strips a trailing file extension (`hero.png` -> `hero`).
pub fn strip_extension(name: &str) -> &str {
    match extension_re().find(name) {
        Some(m) => &name[..m.start()],
        None => name,
    }
}

/// Resolves an image `src` to the path the renderer emits.
pub fn resolve_asset_path(src: Option<&str>) -> String {
    let src = src.map(str::trim).unwrap_or("");
    if src.is_empty() {
        return PLACEHOLDER_PATH.to_string();
    }
    if absolute_url_re().is_match(src) {
        return src.to_string();
    }

    let path = src.split(['?', '#']).next().unwrap_or("");
    let segment = path
        .rsplit(['/', '\\'])
        .find(|s| !s.is_empty())
        .unwrap_or("");
    let name = strip_extension(segment);
    if name.is_empty() {
        return PLACEHOLDER_PATH.to_string();
    }
    format!("{}{}", IMAGE_ROUTE_PREFIX, name)
}
