//! Cleanup of raw generated text before it is classified or executed.

use regex::Regex;
use std::sync::OnceLock;

fn fence_open_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"```[\w-]*\n?").expect("valid regex"))
}

fn invisible_space_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\u{200B}-\u{200D}\u{2060}\u{00A0}]").expect("valid regex"))
}

/// Strips markdown fences, the byte-order mark and invisible spacing, then trims.
///
/// Applying it twice gives the same result as applying it once.
pub fn sanitize(code: &str) -> String {
    let no_bom = code.replace('\u{FEFF}', "");
    let spaced = invisible_space_re().replace_all(&no_bom, " ");
    let mut unfenced = fence_open_re().replace_all(&spaced, "").into_owned();
    // Removing one fence can join stray backticks into another.
    while unfenced.contains("```") {
        unfenced = unfenced.replace("```", "");
    }
    unfenced.trim().to_string()
}

/// Replaces typographic punctuation that models like to emit inside code.
///
/// Curly quotes become straight quotes, the ellipsis becomes three dots and
/// en/em dashes become a hyphen. Only used on the component path, where such
/// characters break string literals and operators.
pub fn harden(code: &str) -> String {
    let mut out = String::with_capacity(code.len());
    for c in code.chars() {
        match c {
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{2032}' => out.push('\''),
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{2033}' => out.push('"'),
            '\u{2026}' => out.push_str("..."),
            '\u{2013}' | '\u{2014}' => out.push('-'),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_fences_with_language() {
        let raw = "```tsx\nexport default function App() {}\n```";
        assert_eq!(sanitize(raw), "export default function App() {}");
    }

    #[test]
    fn strips_bare_fences() {
        assert_eq!(sanitize("```\n<div>hi</div>\n```\n"), "<div>hi</div>");
    }

    #[test]
    fn replaces_invisible_spaces() {
        let raw = "\u{FEFF}const\u{00A0}a\u{200B}=\u{2060}1;";
        assert_eq!(sanitize(raw), "const a = 1;");
    }

    #[test]
    fn sanitize_is_idempotent() {
        for raw in [
            "```js\nconst a = `x`;\n```",
            "  \u{200B}<p>hi</p>\u{00A0} ",
            "`````js\n`",
            "plain",
        ] {
            let once = sanitize(raw);
            assert_eq!(sanitize(&once), once, "input: {raw:?}");
        }
    }

    #[test]
    fn hardens_typographic_punctuation() {
        assert_eq!(
            harden("const s = \u{201C}Hi\u{201D} + \u{2018}x\u{2019}; // wait\u{2026} a \u{2014} b"),
            "const s = \"Hi\" + 'x'; // wait... a - b"
        );
    }
}
