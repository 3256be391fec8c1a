//! Classification of generated code into the three renderable shapes.
//!
//! The rules run in a fixed order and the first match wins:
//!
//! 1. the raw text contains `<html` followed by whitespace or `>`: a full
//!    [`SourceShape::Document`], kept as-is apart from viewport/reset injection;
//! 2. after sanitizing, nothing looks like JSX: [`SourceShape::Markup`];
//! 3. a plain HTML fragment (block tags and no `import`/`export`):
//!    [`SourceShape::Markup`];
//! 4. anything else is a [`SourceShape::Component`].

use crate::sanitize::sanitize;
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceShape {
    Document,
    Markup,
    Component,
}

impl SourceShape {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceShape::Document => "document",
            SourceShape::Markup => "markup",
            SourceShape::Component => "component",
        }
    }
}

/// Which ordered rule produced a classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeRule {
    HtmlRoot,
    NotJsx,
    HtmlFragment,
    Fallthrough,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub shape: SourceShape,
    pub rule: ShapeRule,
    /// Sanitized text, or the raw text untouched for documents.
    pub source: String,
}

fn html_root_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)<html[\s>]").expect("valid regex"))
}

fn jsx_signal_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\bReact\b|\buse[A-Z]\w*\s*\(|export\s+default|<\w+").expect("valid regex")
    })
}

fn block_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)<(div|main|section|header|footer|body|html)[\s>]").expect("valid regex")
    })
}

fn module_keyword_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\bexport\b|\bimport\b").expect("valid regex"))
}

pub fn has_html_root(raw: &str) -> bool {
    html_root_re().is_match(raw)
}

pub fn looks_like_component(code: &str) -> bool {
    jsx_signal_re().is_match(code)
}

pub fn looks_like_markup_only(code: &str) -> bool {
    block_tag_re().is_match(code) && !module_keyword_re().is_match(code)
}

/// Runs the ordered shape rules against raw generated text.
pub fn classify(raw: &str) -> Classification {
    if has_html_root(raw) {
        return Classification {
            shape: SourceShape::Document,
            rule: ShapeRule::HtmlRoot,
            source: raw.to_string(),
        };
    }

    let source = sanitize(raw);
    let (shape, rule) = if !looks_like_component(&source) {
        (SourceShape::Markup, ShapeRule::NotJsx)
    } else if looks_like_markup_only(&source) {
        (SourceShape::Markup, ShapeRule::HtmlFragment)
    } else {
        (SourceShape::Component, ShapeRule::Fallthrough)
    };
    Classification { shape, rule, source }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_root_wins_over_everything() {
        let c = classify("import x from 'y';\n<HTML lang=\"en\"><body></body></HTML>");
        assert_eq!(c.shape, SourceShape::Document);
        assert_eq!(c.rule, ShapeRule::HtmlRoot);
    }

    #[test]
    fn html_prefix_without_boundary_is_not_a_document() {
        let c = classify("<htmlish>text</htmlish>");
        assert_ne!(c.rule, ShapeRule::HtmlRoot);
    }

    #[test]
    fn plain_text_is_markup() {
        let c = classify("Just a sentence.");
        assert_eq!(c.shape, SourceShape::Markup);
        assert_eq!(c.rule, ShapeRule::NotJsx);
    }

    #[test]
    fn block_fragment_is_markup() {
        let c = classify("```html\n<section class=\"p-4\"><h1>Hi</h1></section>\n```");
        assert_eq!(c.shape, SourceShape::Markup);
        assert_eq!(c.rule, ShapeRule::HtmlFragment);
        assert!(c.source.starts_with("<section"));
    }

    #[test]
    fn fragment_with_export_is_component() {
        let c = classify("export default function App() { return <div>Hi</div>; }");
        assert_eq!(c.shape, SourceShape::Component);
    }

    #[test]
    fn hook_call_signals_component() {
        assert!(looks_like_component("const [a, b] = useCounter(0);"));
        assert!(!looks_like_component("const user = 1;"));
    }

    #[test]
    fn capitalized_tag_without_block_tags_is_component() {
        let c = classify("<Card title=\"x\" />");
        assert_eq!(c.shape, SourceShape::Component);
    }
}
