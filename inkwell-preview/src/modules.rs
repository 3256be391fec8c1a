//! Import/export neutralization for component code.
//!
//! Code runs as a plain script inside the boundary, so module syntax has to
//! go. Imports are dropped, except that names pulled from `react` and
//! `react-dom` are re-bound from the globals the boundary provides. The
//! default export is bound to the well-known entry slot `window.App`.
//!
//! The rewrite works on [`crate::lexer`] tokens so that multi-line import
//! clauses and `export` inside strings are handled. A final line-based pass
//! removes anything module-shaped that survived; it is lossy on purpose.

use crate::lexer::{tokenize, Token, TokenKind};
use regex::Regex;
use std::sync::OnceLock;

pub const ENTRY_NAME: &str = "App";
pub const ENTRY_BINDING: &str = "window.App";

/// How the entry slot gets filled once the code runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryBinding {
    /// Nothing is assigned; the runner falls back to the candidates.
    Unbound,
    /// A declaration or identifier is assigned by name.
    Named(String),
    /// An anonymous expression is assigned in place.
    Expression,
}

impl EntryBinding {
    pub fn is_bound(&self) -> bool {
        !matches!(self, EntryBinding::Unbound)
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            EntryBinding::Named(name) => Some(name),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Neutralized {
    pub code: String,
    pub entry: EntryBinding,
    /// Top-level capitalized declarations, in source order.
    pub candidates: Vec<String>,
    /// Lines removed by the last-resort pass.
    pub stripped_lines: usize,
}

struct Edit {
    start: usize,
    end: usize,
    replacement: String,
}

struct Rewrite {
    edit: Option<Edit>,
    /// Index of the next significant token to examine.
    next: usize,
    entry: Option<EntryBinding>,
}

fn leftover_module_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*(import|export)\b").expect("valid regex"))
}

pub fn neutralize(code: &str) -> Neutralized {
    let sig: Vec<Token> = tokenize(code)
        .into_iter()
        .filter(|t| !t.is_trivia())
        .collect();

    let mut edits = Vec::new();
    let mut entry = EntryBinding::Unbound;
    let mut bound_in_place = false;
    let mut candidates = Vec::new();
    let mut i = 0;

    while i < sig.len() {
        let tok = sig[i];
        if tok.depth == 0 && at_statement_start(code, &sig, i) {
            let rewrite = if tok.is_word(code, "import") && !is_import_expression(code, &sig, i) {
                Some(rewrite_import(code, &sig, i))
            } else if tok.is_word(code, "export") {
                Some(rewrite_export(code, &sig, i))
            } else {
                None
            };
            if let Some(rewrite) = rewrite {
                if let Some(binding) = rewrite.entry {
                    bound_in_place = rewrite
                        .edit
                        .as_ref()
                        .is_some_and(|e| e.replacement.starts_with(ENTRY_BINDING));
                    entry = binding;
                }
                edits.extend(rewrite.edit);
                i = rewrite.next;
                continue;
            }
        }
        if let Some(name) = candidate_at(code, &sig, i) {
            if !candidates.contains(&name) {
                candidates.push(name);
            }
        }
        i += 1;
    }

    let mut rewritten = apply_edits(code, edits);
    if entry == EntryBinding::Unbound && candidates.iter().any(|c| c == ENTRY_NAME) {
        entry = EntryBinding::Named(ENTRY_NAME.to_string());
    }
    if let (EntryBinding::Named(name), false) = (&entry, bound_in_place) {
        rewritten.push_str(&format!("\n{ENTRY_BINDING} = {name};"));
    }

    let (code, stripped_lines) = strip_leftover_module_lines(&rewritten);
    Neutralized {
        code,
        entry,
        candidates,
        stripped_lines,
    }
}

/// Removes any line that still starts with `import` or `export`.
pub fn strip_leftover_module_lines(code: &str) -> (String, usize) {
    let mut stripped = 0;
    let kept: Vec<&str> = code
        .lines()
        .filter(|line| {
            let module_line = leftover_module_line_re().is_match(line);
            if module_line {
                stripped += 1;
            }
            !module_line
        })
        .collect();
    (kept.join("\n"), stripped)
}

fn apply_edits(code: &str, mut edits: Vec<Edit>) -> String {
    edits.sort_by_key(|e| e.start);
    let mut out = String::with_capacity(code.len());
    let mut cursor = 0;
    for edit in edits {
        if edit.start < cursor {
            continue;
        }
        out.push_str(&code[cursor..edit.start]);
        out.push_str(&edit.replacement);
        cursor = edit.end;
    }
    out.push_str(&code[cursor..]);
    out
}

fn at_statement_start(code: &str, sig: &[Token], i: usize) -> bool {
    let Some(prev) = i.checked_sub(1).map(|p| sig[p]) else {
        return true;
    };
    if prev.is_punct(code, ".") {
        return false;
    }
    prev.is_punct(code, ";") || prev.is_punct(code, "}") || code[prev.end..sig[i].start].contains('\n')
}

/// `import(...)` and `import.meta` are expressions, not declarations.
fn is_import_expression(code: &str, sig: &[Token], i: usize) -> bool {
    sig.get(i + 1)
        .is_some_and(|t| t.is_punct(code, "(") || t.is_punct(code, "."))
}

fn unquote<'a>(code: &'a str, tok: &Token) -> &'a str {
    let text = tok.text(code);
    text.trim_matches(|c| c == '\'' || c == '"')
}

/// Extends `end` over a trailing semicolon.
fn with_semicolon(code: &str, sig: &[Token], end: usize) -> usize {
    match sig.get(end + 1) {
        Some(t) if t.is_punct(code, ";") => end + 1,
        _ => end,
    }
}

/// Finds `from '<module>'` at top level, stopping at the end of the statement.
fn find_from_clause(code: &str, sig: &[Token], after: usize) -> Option<usize> {
    let mut j = after;
    while j + 1 < sig.len() {
        let t = sig[j];
        if t.depth == 0 && t.is_punct(code, ";") {
            return None;
        }
        if t.depth == 0 && t.is_word(code, "from") && sig[j + 1].kind == TokenKind::Str {
            return Some(j);
        }
        j += 1;
    }
    None
}

/// Last significant token on the same line as `sig[i]`.
fn end_of_line(code: &str, sig: &[Token], i: usize) -> usize {
    let mut j = i;
    while j + 1 < sig.len() && !code[sig[j].end..sig[j + 1].start].contains('\n') {
        j += 1;
    }
    j
}

fn rewrite_import(code: &str, sig: &[Token], i: usize) -> Rewrite {
    let (end, replacement) = match sig.get(i + 1) {
        Some(t) if t.kind == TokenKind::Str => (i + 1, String::new()),
        _ => match find_from_clause(code, sig, i + 1) {
            Some(from) => {
                let module = unquote(code, &sig[from + 1]);
                (from + 1, rebind_from_global(code, &sig[i + 1..from], module))
            }
            None => (end_of_line(code, sig, i), String::new()),
        },
    };
    let end = with_semicolon(code, sig, end);
    Rewrite {
        edit: Some(Edit {
            start: sig[i].start,
            end: sig[end].end,
            replacement,
        }),
        next: end + 1,
        entry: None,
    }
}

fn global_for_module(module: &str) -> Option<&'static str> {
    match module {
        "react" => Some("React"),
        "react-dom" | "react-dom/client" => Some("ReactDOM"),
        _ => None,
    }
}

/// Turns an import clause from a React module into bindings from its global.
fn rebind_from_global(code: &str, clause: &[Token], module: &str) -> String {
    let Some(global) = global_for_module(module) else {
        return String::new();
    };
    if clause.first().is_some_and(|t| t.is_word(code, "type"))
        && clause.get(1).is_some_and(|t| !t.is_punct(code, ","))
    {
        return String::new();
    }

    let mut aliases = Vec::new();
    let mut specifiers = Vec::new();
    let mut k = 0;
    while k < clause.len() {
        let t = clause[k];
        if t.is_punct(code, "*") {
            if let Some(name) = clause.get(k + 2).filter(|n| n.kind == TokenKind::Word) {
                aliases.push(name.text(code));
            }
            k += 3;
        } else if t.is_punct(code, "{") {
            let close = clause[k..]
                .iter()
                .position(|c| c.is_punct(code, "}"))
                .map_or(clause.len(), |p| k + p);
            specifiers.extend(named_specifiers(code, &clause[k + 1..close]));
            k = close + 1;
        } else if t.kind == TokenKind::Word {
            aliases.push(t.text(code));
            k += 1;
        } else {
            k += 1;
        }
    }

    let mut out: Vec<String> = aliases
        .into_iter()
        .filter(|alias| *alias != global)
        .map(|alias| format!("const {alias} = {global};"))
        .collect();
    if !specifiers.is_empty() {
        out.push(format!("const {{ {} }} = {global};", specifiers.join(", ")));
    }
    out.join(" ")
}

/// `a, b as c, type D` → `["a", "b: c"]`.
fn named_specifiers(code: &str, inner: &[Token]) -> Vec<String> {
    inner
        .split(|t| t.is_punct(code, ","))
        .filter_map(|spec| {
            let words: Vec<&str> = spec.iter().map(|t| t.text(code)).collect();
            match words.as_slice() {
                ["type", ..] => None,
                [name] => Some(name.to_string()),
                [name, "as", alias] => Some(format!("{name}: {alias}")),
                _ => None,
            }
        })
        .collect()
}

fn rewrite_export(code: &str, sig: &[Token], i: usize) -> Rewrite {
    let export = sig[i];
    let Some(next) = sig.get(i + 1).copied() else {
        return Rewrite {
            edit: Some(Edit {
                start: export.start,
                end: export.end,
                replacement: String::new(),
            }),
            next: i + 1,
            entry: None,
        };
    };

    if next.is_word(code, "default") {
        return rewrite_default_export(code, sig, i);
    }
    if next.is_punct(code, "{") {
        return rewrite_export_list(code, sig, i, i + 1, true);
    }
    if next.is_word(code, "type") && sig.get(i + 2).is_some_and(|t| t.is_punct(code, "{")) {
        return rewrite_export_list(code, sig, i, i + 2, false);
    }
    if next.is_punct(code, "*") {
        let end = match find_from_clause(code, sig, i + 1) {
            Some(from) => from + 1,
            None => end_of_line(code, sig, i),
        };
        let end = with_semicolon(code, sig, end);
        return Rewrite {
            edit: Some(Edit {
                start: export.start,
                end: sig[end].end,
                replacement: String::new(),
            }),
            next: end + 1,
            entry: None,
        };
    }

    // `export const|function|class|interface …` keeps the declaration.
    Rewrite {
        edit: Some(Edit {
            start: export.start,
            end: next.start,
            replacement: String::new(),
        }),
        next: i + 1,
        entry: None,
    }
}

fn rewrite_default_export(code: &str, sig: &[Token], i: usize) -> Rewrite {
    let export = sig[i];
    let Some(body) = sig.get(i + 2).copied() else {
        return Rewrite {
            edit: Some(Edit {
                start: export.start,
                end: sig[i + 1].end,
                replacement: String::new(),
            }),
            next: i + 2,
            entry: None,
        };
    };

    let keyword = if body.is_word(code, "async")
        && sig.get(i + 3).is_some_and(|t| t.is_word(code, "function"))
    {
        Some(i + 3)
    } else if body.is_word(code, "function") || body.is_word(code, "class") {
        Some(i + 2)
    } else {
        None
    };

    let declared_name = keyword.and_then(|k| {
        let mut n = k + 1;
        if sig.get(n).is_some_and(|t| t.is_punct(code, "*")) {
            n += 1;
        }
        sig.get(n)
            .filter(|t| t.kind == TokenKind::Word && !t.is_word(code, "extends"))
            .map(|t| t.text(code).to_string())
    });

    let (replacement, entry) = match declared_name {
        Some(name) => (String::new(), EntryBinding::Named(name)),
        None => {
            let entry = match sig.get(i + 3) {
                Some(after) if body.kind == TokenKind::Word
                    && keyword.is_none()
                    && (after.is_punct(code, ";") || code[body.end..after.start].contains('\n')) =>
                {
                    EntryBinding::Named(body.text(code).to_string())
                }
                None if body.kind == TokenKind::Word && keyword.is_none() => {
                    EntryBinding::Named(body.text(code).to_string())
                }
                _ => EntryBinding::Expression,
            };
            (format!("{ENTRY_BINDING} = "), entry)
        }
    };

    Rewrite {
        edit: Some(Edit {
            start: export.start,
            end: body.start,
            replacement,
        }),
        next: i + 2,
        entry: Some(entry),
    }
}

/// `export { A, B as default } [from '…'];`
fn rewrite_export_list(code: &str, sig: &[Token], i: usize, open: usize, may_bind: bool) -> Rewrite {
    let depth = sig[open].depth;
    let close = (open + 1..sig.len())
        .find(|&j| sig[j].depth == depth && sig[j].is_punct(code, "}"))
        .unwrap_or(sig.len() - 1);

    let reexport = sig.get(close + 1).is_some_and(|t| t.is_word(code, "from"))
        && sig.get(close + 2).is_some_and(|t| t.kind == TokenKind::Str);
    let end = if reexport { close + 2 } else { close };
    let end = with_semicolon(code, sig, end);

    let default_name = if may_bind && !reexport {
        sig[open + 1..close]
            .split(|t| t.is_punct(code, ","))
            .find_map(|spec| match spec {
                [name, as_kw, alias]
                    if as_kw.is_word(code, "as") && alias.is_word(code, "default") =>
                {
                    Some(name.text(code).to_string())
                }
                _ => None,
            })
    } else {
        None
    };

    let (replacement, entry) = match default_name {
        Some(name) => (
            format!("{ENTRY_BINDING} = {name};"),
            Some(EntryBinding::Named(name)),
        ),
        None => (String::new(), None),
    };

    Rewrite {
        edit: Some(Edit {
            start: sig[i].start,
            end: sig[end].end,
            replacement,
        }),
        next: end + 1,
        entry,
    }
}

fn is_component_name(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_ascii_uppercase())
        && name != "React"
        && name != "ReactDOM"
}

fn candidate_at(code: &str, sig: &[Token], i: usize) -> Option<String> {
    let tok = sig[i];
    if tok.depth != 0 || tok.kind != TokenKind::Word {
        return None;
    }
    let name = sig.get(i + 1).filter(|t| t.kind == TokenKind::Word)?;
    let text = name.text(code);
    if !is_component_name(text) {
        return None;
    }
    match tok.text(code) {
        "function" | "class" => Some(text.to_string()),
        "const" | "let" | "var" if sig.get(i + 2).is_some_and(|t| t.is_punct(code, "=")) => {
            Some(text.to_string())
        }
        _ => None,
    }
}
