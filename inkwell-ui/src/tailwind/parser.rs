use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

fn class_attr_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?:^|\s)class\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("valid regex")
    })
}

/// Collects class tokens from every `class` attribute in `html`, first
/// appearance order, no duplicates.
pub fn extract_classes(html: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for caps in class_attr_re().captures_iter(html) {
        let value = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
        for token in value.split_whitespace() {
            if seen.insert(token) {
                out.push(token.to_string());
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_quote_styles() {
        let html = r#"<div class="flex p-4"><span class='flex text-sm'></span></div>"#;
        assert_eq!(extract_classes(html), vec!["flex", "p-4", "text-sm"]);
    }

    #[test]
    fn ignores_data_attributes() {
        let html = r#"<button data-class="x" class="rounded">Hi — there</button>"#;
        assert_eq!(extract_classes(html), vec!["rounded"]);
    }
}
