//! Utility-class CSS for rendered UI documents.
//!
//! Generated trees style themselves with Tailwind class names. Documents
//! rendered from a tree carry no external stylesheet, so the classes that
//! actually appear are resolved here and emitted as a `<style>` block.
//!
//! Covers display and position, flex and grid, alignment and gap, spacing,
//! sizing, typography, borders and radius, shadows, opacity and colors from
//! a reduced palette, with `sm/md/lg/xl/2xl`, `dark` and state variants.

pub mod parser;
pub mod registry;
pub mod variants;

pub use registry::CssRule;

use std::collections::HashSet;

/// Resolves every recognised class found in `html` and returns the CSS.
pub fn generate_css(html: &str) -> String {
    let classes = parser::extract_classes(html);
    let refs: Vec<&str> = classes.iter().map(String::as_str).collect();
    generate_css_for_classes(&refs)
}

/// Resolves an explicit list of classes. Duplicates and unknown classes are skipped.
pub fn generate_css_for_classes(classes: &[&str]) -> String {
    let mut seen = HashSet::new();
    let rules: Vec<CssRule> = classes
        .iter()
        .filter(|c| seen.insert(**c))
        .filter_map(|c| variants::resolve_with_variants(c, registry::resolve_class))
        .collect();
    render_css(&rules)
}

fn render_css(rules: &[CssRule]) -> String {
    let mut css = String::new();
    // Plain rules first so media-wrapped overrides win on equal specificity.
    for rule in rules.iter().filter(|r| r.media_query.is_none()) {
        push_rule(&mut css, rule);
    }
    for rule in rules.iter().filter(|r| r.media_query.is_some()) {
        push_rule(&mut css, rule);
    }
    css
}

fn push_rule(css: &mut String, rule: &CssRule) {
    let body: Vec<String> = rule
        .declarations
        .iter()
        .map(|(prop, val)| format!("{}: {};", prop, val))
        .collect();
    match &rule.media_query {
        None => {
            css.push_str(&format!("{} {{ {} }}\n", rule.selector, body.join(" ")));
        }
        Some(mq) => {
            css.push_str(&format!(
                "{} {{ {} {{ {} }} }}\n",
                mq,
                rule.selector,
                body.join(" ")
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_used_classes() {
        let css = generate_css(r#"<div class="flex flex-col gap-4 p-6"><p class="text-2xl font-semibold"></p></div>"#);
        assert!(css.contains(".flex { display: flex; }"));
        assert!(css.contains(".gap-4 { gap: 1rem; }"));
        assert!(css.contains(".font-semibold { font-weight: 600; }"));
    }

    #[test]
    fn media_rules_come_last() {
        let css = generate_css_for_classes(&["dark:bg-white", "bg-black"]);
        let plain = css.find(".bg-black").unwrap();
        let dark = css.find("@media").unwrap();
        assert!(plain < dark);
    }

    #[test]
    fn nothing_known_is_empty() {
        assert_eq!(generate_css(r#"<div class="not-a-utility"></div>"#), "");
    }
}
