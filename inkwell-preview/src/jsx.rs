//! JSX lowering for the headless realm.
//!
//! The browser boundary transpiles with Babel; the in-process realm has no
//! such luxury, so element syntax is rewritten here into
//! `React.createElement(type, props, ...children)` calls. Top-level
//! TypeScript `interface`/`type` declarations are removed as well. Type
//! annotations elsewhere are left alone and surface as compile errors.

use crate::error::{PreviewError, PreviewResult};
use crate::lexer::{tokenize, Token, TokenKind};

const EXPRESSION_KEYWORDS: &[&str] = &[
    "return", "case", "default", "do", "else", "in", "of", "new", "typeof", "void", "yield",
    "await", "throw", "delete",
];

pub fn lower_jsx(src: &str) -> PreviewResult<String> {
    let mut lowering = Lowering {
        src,
        bytes: src.as_bytes(),
        pos: 0,
    };
    lowering.code(false)
}

struct Lowering<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$' || b >= 0x80
}

fn is_name_byte(b: u8) -> bool {
    is_word_byte(b) || b == b'.' || b == b'-' || b == b':'
}

fn js_string(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

impl<'a> Lowering<'a> {
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn starts_with(&self, s: &str) -> bool {
        self.src[self.pos..].starts_with(s)
    }

    fn error(&self, message: impl Into<String>) -> PreviewError {
        PreviewError::Jsx {
            offset: self.pos,
            message: message.into(),
        }
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.pos += 1;
        }
        &self.src[start..self.pos]
    }

    /// Copies JavaScript, lowering any element found in expression position.
    /// With `in_braces`, stops after the `}` that closes the current `{`.
    fn code(&mut self, in_braces: bool) -> PreviewResult<String> {
        let mut out = String::new();
        let mut depth = 0usize;
        let mut expr_allowed = true;

        while let Some(b) = self.peek() {
            match b {
                b if b.is_ascii_whitespace() => {
                    out.push(b as char);
                    self.pos += 1;
                }
                b'/' if self.starts_with("//") => {
                    self.take_while(|b| b != b'\n');
                }
                b'/' if self.starts_with("/*") => {
                    match self.src[self.pos + 2..].find("*/") {
                        Some(offset) => self.pos += offset + 4,
                        None => self.pos = self.bytes.len(),
                    }
                    out.push(' ');
                }
                b'/' if expr_allowed => {
                    out.push_str(&self.regex_or_slash());
                    expr_allowed = false;
                }
                b'\'' | b'"' => {
                    out.push_str(&self.string(b));
                    expr_allowed = false;
                }
                b'`' => {
                    out.push_str(&self.template());
                    expr_allowed = false;
                }
                b'<' if expr_allowed
                    && self
                        .bytes
                        .get(self.pos + 1)
                        .is_some_and(|n| n.is_ascii_alphabetic() || *n == b'>') =>
                {
                    out.push_str(&self.element()?);
                    expr_allowed = false;
                }
                b if is_word_byte(b) => {
                    let word = self.take_while(is_word_byte);
                    expr_allowed = EXPRESSION_KEYWORDS.contains(&word);
                    out.push_str(word);
                }
                b'{' => {
                    depth += 1;
                    out.push('{');
                    self.pos += 1;
                    expr_allowed = true;
                }
                b'}' => {
                    self.pos += 1;
                    if depth == 0 && in_braces {
                        return Ok(out);
                    }
                    depth = depth.saturating_sub(1);
                    out.push('}');
                    expr_allowed = false;
                }
                b')' | b']' => {
                    out.push(b as char);
                    self.pos += 1;
                    expr_allowed = false;
                }
                _ => {
                    out.push(b as char);
                    self.pos += 1;
                    expr_allowed = true;
                }
            }
        }

        if in_braces {
            return Err(self.error("unclosed `{` in JSX expression"));
        }
        Ok(out)
    }

    fn string(&mut self, quote: u8) -> String {
        let start = self.pos;
        self.pos += 1;
        while let Some(b) = self.peek() {
            self.pos += 1;
            match b {
                b'\\' => self.pos = (self.pos + 1).min(self.bytes.len()),
                b'\n' => break,
                b if b == quote => break,
                _ => {}
            }
        }
        self.src[start..self.pos].to_string()
    }

    fn template(&mut self) -> String {
        let start = self.pos;
        self.pos += 1;
        let mut interpolation = 0usize;
        while let Some(b) = self.peek() {
            self.pos += 1;
            match b {
                b'\\' => self.pos = (self.pos + 1).min(self.bytes.len()),
                b'{' if interpolation > 0 => interpolation += 1,
                b'}' if interpolation > 0 => interpolation -= 1,
                b'$' if interpolation == 0 && self.peek() == Some(b'{') => {
                    self.pos += 1;
                    interpolation = 1;
                }
                b'`' if interpolation == 0 => break,
                _ => {}
            }
        }
        self.src[start..self.pos].to_string()
    }

    fn regex_or_slash(&mut self) -> String {
        let start = self.pos;
        let mut i = start + 1;
        let mut in_class = false;
        while let Some(&b) = self.bytes.get(i) {
            match b {
                b'\\' => i += 1,
                b'\n' => break,
                b'[' => in_class = true,
                b']' => in_class = false,
                b'/' if !in_class => {
                    self.pos = i + 1;
                    self.take_while(is_word_byte);
                    return self.src[start..self.pos].to_string();
                }
                _ => {}
            }
            i += 1;
        }
        self.pos = start + 1;
        "/".to_string()
    }

    /// Lowers `<Tag …>…</Tag>`, `<Tag />` or `<>…</>` starting at `<`.
    fn element(&mut self) -> PreviewResult<String> {
        self.pos += 1;
        self.skip_ws();
        let name = self.take_while(is_name_byte).to_string();

        let mut props = Vec::new();
        let mut children = Vec::new();
        if name.is_empty() {
            if self.peek() != Some(b'>') {
                return Err(self.error("expected a tag name"));
            }
            self.pos += 1;
            children = self.children(&name)?;
        } else {
            loop {
                self.skip_ws();
                match self.peek() {
                    None => return Err(self.error(format!("unclosed <{name}>"))),
                    Some(b'/') if self.starts_with("/>") => {
                        self.pos += 2;
                        break;
                    }
                    Some(b'>') => {
                        self.pos += 1;
                        children = self.children(&name)?;
                        break;
                    }
                    Some(b'{') => {
                        self.pos += 1;
                        self.skip_ws();
                        if !self.starts_with("...") {
                            return Err(self.error("expected a spread attribute"));
                        }
                        self.pos += 3;
                        let expr = self.code(true)?;
                        props.push(format!("...({})", expr.trim()));
                    }
                    Some(_) => {
                        let attr = self.attribute()?;
                        props.push(attr);
                    }
                }
            }
        }

        let tag = if name.is_empty() {
            "React.Fragment".to_string()
        } else if name.starts_with(|c: char| c.is_ascii_lowercase()) && !name.contains('.') {
            js_string(&name)
        } else {
            name
        };
        let props = if props.is_empty() {
            "null".to_string()
        } else {
            format!("{{{}}}", props.join(", "))
        };

        let mut call = format!("React.createElement({tag}, {props}");
        for child in children {
            call.push_str(", ");
            call.push_str(&child);
        }
        call.push(')');
        Ok(call)
    }

    fn attribute(&mut self) -> PreviewResult<String> {
        let name = self.take_while(is_name_byte).to_string();
        if name.is_empty() {
            return Err(self.error("unexpected character in tag"));
        }
        self.skip_ws();
        if self.peek() != Some(b'=') {
            return Ok(format!("{}: true", js_string(&name)));
        }
        self.pos += 1;
        self.skip_ws();
        let value = match self.peek() {
            Some(q @ (b'"' | b'\'')) => {
                self.pos += 1;
                let raw = self.take_while(|b| b != q).to_string();
                if self.peek() != Some(q) {
                    return Err(self.error(format!("unterminated value for `{name}`")));
                }
                self.pos += 1;
                js_string(&raw)
            }
            Some(b'{') => {
                self.pos += 1;
                let expr = self.code(true)?;
                let expr = expr.trim();
                if expr.is_empty() {
                    "undefined".to_string()
                } else {
                    format!("({expr})")
                }
            }
            Some(b'<') => self.element()?,
            _ => return Err(self.error(format!("missing value for `{name}`"))),
        };
        Ok(format!("{}: {}", js_string(&name), value))
    }

    /// Reads children up to and including the closing tag for `name`.
    fn children(&mut self, name: &str) -> PreviewResult<Vec<String>> {
        let mut children = Vec::new();
        loop {
            match self.peek() {
                None => {
                    let shown = if name.is_empty() { "<>" } else { name };
                    return Err(self.error(format!("missing closing tag for {shown}")));
                }
                Some(b'<') if self.starts_with("</") => {
                    self.pos += 2;
                    self.skip_ws();
                    let closing = self.take_while(is_name_byte).to_string();
                    self.skip_ws();
                    if self.peek() != Some(b'>') || closing != name {
                        return Err(self.error(format!(
                            "expected </{name}>, found </{closing}"
                        )));
                    }
                    self.pos += 1;
                    return Ok(children);
                }
                Some(b'<') => children.push(self.element()?),
                Some(b'{') => {
                    self.pos += 1;
                    let expr = self.code(true)?;
                    let expr = expr.trim();
                    if !expr.is_empty() {
                        children.push(format!("({expr})"));
                    }
                }
                Some(_) => {
                    let raw = self.take_while(|b| b != b'<' && b != b'{');
                    if let Some(text) = jsx_text(raw) {
                        children.push(js_string(&text));
                    }
                }
            }
        }
    }
}

/// Applies JSX whitespace rules to a run of text between tags.
fn jsx_text(raw: &str) -> Option<String> {
    if !raw.contains('\n') {
        return (!raw.is_empty()).then(|| decode_entities(raw));
    }
    let lines: Vec<&str> = raw.lines().collect();
    let last = lines.len().saturating_sub(1);
    let kept: Vec<&str> = lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let line = if i == 0 { *line } else { line.trim_start() };
            if i == last {
                line
            } else {
                line.trim_end()
            }
        })
        .filter(|line| !line.is_empty())
        .collect();
    if kept.is_empty() {
        None
    } else {
        Some(decode_entities(&kept.join(" ")))
    }
}

fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    text.replace("&nbsp;", "\u{00A0}")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&#39;", "'")
        .replace("&copy;", "\u{00A9}")
        .replace("&amp;", "&")
}

/// Removes top-level `interface` and `type` declarations.
pub fn strip_type_declarations(code: &str) -> String {
    let sig: Vec<Token> = tokenize(code)
        .into_iter()
        .filter(|t| !t.is_trivia())
        .collect();

    let mut out = String::with_capacity(code.len());
    let mut cursor = 0;
    let mut i = 0;
    while i < sig.len() {
        let tok = sig[i];
        let starts_line = i == 0
            || sig[i - 1].is_punct(code, ";")
            || sig[i - 1].is_punct(code, "}")
            || code[sig[i - 1].end..tok.start].contains('\n');
        let declares = (tok.is_word(code, "interface") || tok.is_word(code, "type"))
            && sig.get(i + 1).is_some_and(|n| n.kind == TokenKind::Word);
        if tok.depth == 0 && starts_line && declares {
            let end = declaration_end(code, &sig, i);
            out.push_str(&code[cursor..tok.start]);
            cursor = sig[end].end;
            i = end + 1;
            continue;
        }
        i += 1;
    }
    out.push_str(&code[cursor..]);
    out
}

fn declaration_end(code: &str, sig: &[Token], start: usize) -> usize {
    let interface = sig[start].is_word(code, "interface");
    let mut j = start + 1;
    while j < sig.len() {
        let t = sig[j];
        if t.depth == 0 {
            if t.is_punct(code, ";") {
                return j;
            }
            if interface && t.is_punct(code, "}") {
                return match sig.get(j + 1) {
                    Some(n) if n.is_punct(code, ";") => j + 1,
                    _ => j,
                };
            }
            let continues = matches!(t.text(code), "=" | "|" | "&" | "," | "{" | "(" | "<" | "extends")
                || sig
                    .get(j + 1)
                    .is_some_and(|n| matches!(n.text(code), "|" | "&" | "=" | "{" | "extends"));
            let line_break = sig
                .get(j + 1)
                .is_some_and(|n| code[t.end..n.start].contains('\n'));
            if line_break && !continues {
                return j;
            }
        }
        j += 1;
    }
    sig.len() - 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowers_nested_elements() {
        let out = lower_jsx(r#"const a = <div className="p-4"><Card title={t} /></div>;"#).unwrap();
        assert_eq!(
            out,
            r#"const a = React.createElement("div", {"className": "p-4"}, React.createElement(Card, {"title": (t)}));"#
        );
    }

    #[test]
    fn lowers_fragments_and_text() {
        let out = lower_jsx("return (\n  <>\n    Hello   world\n    <b>!</b>\n  </>\n);").unwrap();
        assert_eq!(
            out,
            "return (\n  React.createElement(React.Fragment, null, \"Hello   world\", React.createElement(\"b\", null, \"!\"))\n);"
        );
    }

    #[test]
    fn expression_children_may_contain_elements() {
        let out = lower_jsx("<ul>{items.map(i => <li key={i}>{i}</li>)}</ul>").unwrap();
        assert_eq!(
            out,
            r#"React.createElement("ul", null, (items.map(i => React.createElement("li", {"key": (i)}, (i)))))"#
        );
    }

    #[test]
    fn comparison_is_not_an_element() {
        let src = "if (a < b && c<d) { x = 1; }";
        assert_eq!(lower_jsx(src).unwrap(), src);
    }

    #[test]
    fn spread_and_boolean_attributes() {
        let out = lower_jsx("<input {...rest} disabled />").unwrap();
        assert_eq!(out, r#"React.createElement("input", {...(rest), "disabled": true})"#);
    }

    #[test]
    fn comment_children_are_dropped() {
        let out = lower_jsx("<p>{/* note */}hi</p>").unwrap();
        assert_eq!(out, r#"React.createElement("p", null, "hi")"#);
    }

    #[test]
    fn mismatched_closing_tag_is_an_error() {
        let err = lower_jsx("<div><span></div>").unwrap_err();
        assert!(matches!(err, PreviewError::Jsx { .. }));
    }

    #[test]
    fn strips_interfaces_and_types() {
        let src = "interface Props {\n  a: { b: string };\n}\ntype Mode = 'a' | 'b';\ntype Alt =\n  | 'x'\n  | 'y'\nconst typeLabel = 1;";
        assert_eq!(strip_type_declarations(src).trim(), "const typeLabel = 1;");
    }
}
