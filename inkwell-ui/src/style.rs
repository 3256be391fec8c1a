//! Inline style maps.
//!
//! Generated styles arrive keyed either way (`background-color` or
//! `backgroundColor`). Everything is normalized to camelCase on read and
//! converted back to kebab-case CSS only when a document is written.

use serde::Serialize;
use serde_json::{Number, Value};
use std::collections::BTreeMap;

/// Properties whose numeric values are emitted without a `px` unit.
const UNITLESS_PROPERTIES: &[&str] = &[
    "opacity",
    "zIndex",
    "fontWeight",
    "lineHeight",
    "flex",
    "flexGrow",
    "flexShrink",
    "order",
    "zoom",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum StyleValue {
    Text(String),
    Number(Number),
}

impl StyleValue {
    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(StyleValue::Text(s.clone())),
            Value::Number(n) => Some(StyleValue::Number(n.clone())),
            _ => None,
        }
    }
}

/// A normalized style mapping. Keys are always camelCase.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct StyleMap(BTreeMap<String, StyleValue>);

impl StyleMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a property, normalizing the key.
    pub fn insert(&mut self, key: &str, value: StyleValue) {
        self.0.insert(camel_case_key(key), value);
    }

    pub fn get(&self, key: &str) -> Option<&StyleValue> {
        self.0.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StyleValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Renders the map as an inline CSS declaration list (`a: b; c: d`).
    pub fn to_css(&self) -> String {
        let mut out = String::new();
        for (key, value) in &self.0 {
            let css_value = match value {
                StyleValue::Text(s) => s.clone(),
                StyleValue::Number(n) => number_to_css(key, n),
            };
            if !out.is_empty() {
                out.push_str("; ");
            }
            out.push_str(&kebab_case_key(key));
            out.push_str(": ");
            out.push_str(&css_value);
        }
        out
    }
}

/// Normalizes a raw `style` value.
///
/// Returns `None` when the value is not a mapping; non-scalar entries inside a
/// mapping are dropped. Running this over its own serialized output is a no-op.
pub fn normalize_style(value: &Value) -> Option<StyleMap> {
    let obj = value.as_object()?;
    let mut map = StyleMap::new();
    for (key, raw) in obj {
        if let Some(v) = StyleValue::from_json(raw) {
            map.insert(key, v);
        }
    }
    Some(map)
}

/// `background-color` -> `backgroundColor`, `-webkit-transition` -> `WebkitTransition`.
///
/// Custom properties (`--brand`) are left untouched.
pub fn camel_case_key(key: &str) -> String {
    if key.starts_with("--") || !key.contains('-') {
        return key.to_string();
    }
    let mut out = String::with_capacity(key.len());
    let mut upper_next = false;
    for (i, ch) in key.chars().enumerate() {
        if ch == '-' {
            upper_next = true;
            continue;
        }
        if upper_next && i > 0 {
            out.extend(ch.to_uppercase());
        } else {
            out.push(ch);
        }
        upper_next = false;
    }
    out
}

/// `backgroundColor` -> `background-color`, `WebkitTransition` -> `-webkit-transition`.
pub fn kebab_case_key(key: &str) -> String {
    if key.starts_with("--") {
        return key.to_string();
    }
    let mut out = String::with_capacity(key.len() + 4);
    if key.starts_with("ms") && key[2..].starts_with(|c: char| c.is_ascii_uppercase()) {
        out.push('-');
    }
    for ch in key.chars() {
        if ch.is_ascii_uppercase() {
            out.push('-');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

fn number_to_css(key: &str, n: &Number) -> String {
    let is_zero = n.as_f64().map(|f| f == 0.0).unwrap_or(false);
    if is_zero || UNITLESS_PROPERTIES.contains(&key) {
        n.to_string()
    } else {
        format!("{}px", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hyphenated_keys_become_camel_case() {
        let map = normalize_style(&json!({"background-color": "red", "margin-top": 4})).unwrap();
        let keys: Vec<&str> = map.keys().collect();
        assert_eq!(keys, vec!["backgroundColor", "marginTop"]);
    }

    #[test]
    fn vendor_prefix() {
        assert_eq!(camel_case_key("-webkit-transition"), "WebkitTransition");
        assert_eq!(kebab_case_key("WebkitTransition"), "-webkit-transition");
        assert_eq!(kebab_case_key("msTransform"), "-ms-transform");
    }

    #[test]
    fn custom_properties_untouched() {
        assert_eq!(camel_case_key("--brand-color"), "--brand-color");
    }

    #[test]
    fn non_mapping_is_ignored() {
        assert!(normalize_style(&json!("color: red")).is_none());
        assert!(normalize_style(&json!([1, 2])).is_none());
        assert!(normalize_style(&Value::Null).is_none());
    }

    #[test]
    fn non_scalar_values_dropped() {
        let map = normalize_style(&json!({"color": "red", "nested": {"a": 1}, "flag": true})).unwrap();
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn normalization_is_idempotent() {
        let once = normalize_style(&json!({"font-size": 14, "line-height": 1.5})).unwrap();
        let again = normalize_style(&serde_json::to_value(&once).unwrap()).unwrap();
        assert_eq!(once, again);
    }

    #[test]
    fn css_units() {
        let map = normalize_style(&json!({"padding": 16, "opacity": 0.5, "margin": 0, "color": "red"}))
            .unwrap();
        assert_eq!(map.to_css(), "color: red; margin: 0; opacity: 0.5; padding: 16px");
    }
}
