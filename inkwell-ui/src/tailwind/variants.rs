//! Variant prefixes: breakpoints, `dark:`, and interaction states.

use super::registry::{escape_selector, CssRule};

const BREAKPOINTS: &[(&str, &str)] = &[
    ("sm", "(min-width: 40rem)"),
    ("md", "(min-width: 48rem)"),
    ("lg", "(min-width: 64rem)"),
    ("xl", "(min-width: 80rem)"),
    ("2xl", "(min-width: 96rem)"),
];

const PSEUDO_CLASSES: &[(&str, &str)] = &[
    ("hover", ":hover"),
    ("focus", ":focus"),
    ("focus-visible", ":focus-visible"),
    ("active", ":active"),
    ("disabled", ":disabled"),
    ("first", ":first-child"),
    ("last", ":last-child"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Variant {
    Media(&'static str),
    Pseudo(&'static str),
}

fn lookup(name: &str) -> Option<Variant> {
    if name == "dark" {
        return Some(Variant::Media("(prefers-color-scheme: dark)"));
    }
    if let Some((_, query)) = BREAKPOINTS.iter().find(|(bp, _)| *bp == name) {
        return Some(Variant::Media(*query));
    }
    PSEUDO_CLASSES
        .iter()
        .find(|(p, _)| *p == name)
        .map(|(_, sel)| Variant::Pseudo(*sel))
}

/// Resolves a possibly variant-prefixed class such as `dark:hover:bg-black`.
///
/// Unknown variants make the whole class unresolvable.
pub fn resolve_with_variants(class: &str, resolve: impl Fn(&str) -> Option<CssRule>) -> Option<CssRule> {
    let mut parts: Vec<&str> = class.split(':').collect();
    let base = parts.pop()?;
    if base.is_empty() {
        return None;
    }
    let variants = parts
        .iter()
        .map(|name| lookup(name))
        .collect::<Option<Vec<Variant>>>()?;

    let mut rule = resolve(base)?;
    if variants.is_empty() {
        return Some(rule);
    }

    // Base selector is `.base` optionally followed by a compound suffix.
    let suffix = rule
        .selector
        .find(' ')
        .map(|i| rule.selector[i..].to_string())
        .unwrap_or_default();
    let mut selector = format!(".{}", escape_selector(class));
    let mut media: Vec<&str> = Vec::new();
    for variant in variants {
        match variant {
            Variant::Pseudo(p) => selector.push_str(p),
            Variant::Media(m) => media.push(m),
        }
    }
    selector.push_str(&suffix);
    rule.selector = selector;
    if !media.is_empty() {
        rule.media_query = Some(format!("@media {}", media.join(" and ")));
    }
    Some(rule)
}
