//! A forgiving JavaScript token scanner.
//!
//! It never fails: generated code is frequently broken, so unterminated
//! strings stop at the end of their line and unclosed regexes fall back to a
//! plain `/`. Each token carries its bracket depth, which is what the module
//! neutralizer needs to tell top-level statements from nested code.
//!
//! JSX is not parsed, but two heuristics keep JSX text from derailing the
//! depth count: a quote glued to a preceding letter (`Don't`) is treated as
//! punctuation, and `//` right after `word:` (a URL) is not a comment.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Word,
    Number,
    Str,
    Template,
    Regex,
    Punct,
    Comment,
    Space,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
    /// Bracket depth; an opening bracket and its closing match share a depth.
    pub depth: usize,
}

impl Token {
    pub fn text<'a>(&self, src: &'a str) -> &'a str {
        &src[self.start..self.end]
    }

    pub fn is_trivia(&self) -> bool {
        matches!(self.kind, TokenKind::Comment | TokenKind::Space)
    }

    pub fn is_word(&self, src: &str, word: &str) -> bool {
        self.kind == TokenKind::Word && self.text(src) == word
    }

    pub fn is_punct(&self, src: &str, punct: &str) -> bool {
        self.kind == TokenKind::Punct && self.text(src) == punct
    }
}

const REGEX_KEYWORDS: &[&str] = &[
    "return", "typeof", "case", "do", "else", "in", "of", "new", "delete", "void", "throw",
    "instanceof", "yield", "await",
];

pub fn tokenize(src: &str) -> Vec<Token> {
    let mut scanner = Scanner {
        src,
        bytes: src.as_bytes(),
        pos: 0,
        depth: 0,
        tokens: Vec::new(),
    };
    scanner.run();
    scanner.tokens
}

fn is_word_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'$' || b >= 0x80
}

fn is_word_byte(b: u8) -> bool {
    is_word_start(b) || b.is_ascii_digit()
}

struct Scanner<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    depth: usize,
    tokens: Vec<Token>,
}

impl Scanner<'_> {
    fn run(&mut self) {
        while self.pos < self.bytes.len() {
            let start = self.pos;
            let b = self.bytes[start];
            let kind = match b {
                b if b.is_ascii_whitespace() => {
                    self.skip_while(|b| b.is_ascii_whitespace());
                    TokenKind::Space
                }
                b if is_word_start(b) => {
                    self.skip_while(is_word_byte);
                    TokenKind::Word
                }
                b if b.is_ascii_digit() => {
                    self.skip_while(|b| is_word_byte(b) || b == b'.');
                    TokenKind::Number
                }
                b'\'' | b'"' if start > 0 && self.bytes[start - 1].is_ascii_alphanumeric() => {
                    self.pos += 1;
                    TokenKind::Punct
                }
                b'\'' | b'"' => {
                    self.scan_string(b);
                    TokenKind::Str
                }
                b'`' => {
                    self.scan_template();
                    TokenKind::Template
                }
                b'/' => self.scan_slash(),
                _ => {
                    self.pos += 1;
                    TokenKind::Punct
                }
            };
            self.push(kind, start);
        }
    }

    fn push(&mut self, kind: TokenKind, start: usize) {
        let mut depth = self.depth;
        if kind == TokenKind::Punct {
            match self.bytes[start] {
                b'{' | b'(' | b'[' => self.depth += 1,
                b'}' | b')' | b']' => {
                    self.depth = self.depth.saturating_sub(1);
                    depth = self.depth;
                }
                _ => {}
            }
        }
        self.tokens.push(Token {
            kind,
            start,
            end: self.pos,
            depth,
        });
    }

    fn skip_while(&mut self, pred: impl Fn(u8) -> bool) {
        while self.pos < self.bytes.len() && pred(self.bytes[self.pos]) {
            self.pos += 1;
        }
    }

    fn scan_string(&mut self, quote: u8) {
        self.pos += 1;
        while self.pos < self.bytes.len() {
            match self.bytes[self.pos] {
                b'\\' => self.pos = (self.pos + 2).min(self.bytes.len()),
                b'\n' => return,
                b if b == quote => {
                    self.pos += 1;
                    return;
                }
                _ => self.pos += 1,
            }
        }
    }

    fn scan_template(&mut self) {
        self.pos += 1;
        let mut interpolation = 0usize;
        while self.pos < self.bytes.len() {
            let b = self.bytes[self.pos];
            if b == b'\\' {
                self.pos = (self.pos + 2).min(self.bytes.len());
                continue;
            }
            self.pos += 1;
            if interpolation > 0 {
                match b {
                    b'{' => interpolation += 1,
                    b'}' => interpolation -= 1,
                    _ => {}
                }
            } else if b == b'$' && self.bytes.get(self.pos) == Some(&b'{') {
                self.pos += 1;
                interpolation = 1;
            } else if b == b'`' {
                return;
            }
        }
    }

    fn scan_slash(&mut self) -> TokenKind {
        let start = self.pos;
        match self.bytes.get(start + 1) {
            Some(b'/') if !self.follows_url_scheme(start) => {
                self.skip_while(|b| b != b'\n');
                TokenKind::Comment
            }
            Some(b'*') => {
                match self.src[start + 2..].find("*/") {
                    Some(offset) => self.pos = start + 2 + offset + 2,
                    None => self.pos = self.bytes.len(),
                }
                TokenKind::Comment
            }
            _ if self.regex_allowed() => {
                if self.scan_regex() {
                    TokenKind::Regex
                } else {
                    self.pos = start + 1;
                    TokenKind::Punct
                }
            }
            _ => {
                self.pos += 1;
                TokenKind::Punct
            }
        }
    }

    /// `https://` and friends inside JSX text.
    fn follows_url_scheme(&self, slash: usize) -> bool {
        slash >= 2 && self.bytes[slash - 1] == b':' && is_word_byte(self.bytes[slash - 2])
    }

    fn regex_allowed(&self) -> bool {
        let Some(prev) = self.tokens.iter().rev().find(|t| !t.is_trivia()) else {
            return true;
        };
        let text = prev.text(self.src);
        match prev.kind {
            TokenKind::Punct => !matches!(text, ")" | "]" | "}" | "<"),
            TokenKind::Word => REGEX_KEYWORDS.contains(&text),
            _ => false,
        }
    }

    /// Scans `/body/flags`; returns false when the line ends first.
    fn scan_regex(&mut self) -> bool {
        let mut i = self.pos + 1;
        let mut in_class = false;
        while i < self.bytes.len() {
            match self.bytes[i] {
                b'\\' => i += 2,
                b'\n' => return false,
                b'[' => {
                    in_class = true;
                    i += 1;
                }
                b']' => {
                    in_class = false;
                    i += 1;
                }
                b'/' if !in_class => {
                    self.pos = i + 1;
                    self.skip_while(is_word_byte);
                    return true;
                }
                _ => i += 1,
            }
        }
        false
    }
}
