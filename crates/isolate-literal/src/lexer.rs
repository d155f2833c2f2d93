//! Tokenizer for the literal expression grammar.
//!
//! The lexer knows nothing about names beyond their spelling: an identifier
//! is handed to the caller as [`TokenKind::Name`] and it is up to the caller
//! to decide whether that spelling is acceptable. The evaluator accepts only
//! `True`, `False` and `None`; the condition parser in `isolate-format`
//! additionally accepts variable names and `and`/`or`/`not`.

use crate::error::{Error, Result};

/// The kind of a lexed token, with its decoded payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// A string literal with escapes already decoded.
    Str(String),
    /// An unsigned integer literal. Signs are separate tokens.
    Int(u64),
    /// An identifier or keyword.
    Name(String),
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Colon,
    Comma,
    Plus,
    Minus,
    /// `==`
    EqEq,
    /// `!=`
    NotEq,
    /// End of input.
    Eof,
}

impl TokenKind {
    /// Short human readable description used in diagnostics.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Str(s) => format!("string {:?}", s),
            TokenKind::Int(i) => format!("integer {}", i),
            TokenKind::Name(n) => format!("name '{}'", n),
            TokenKind::LBrace => "'{'".to_string(),
            TokenKind::RBrace => "'}'".to_string(),
            TokenKind::LBracket => "'['".to_string(),
            TokenKind::RBracket => "']'".to_string(),
            TokenKind::LParen => "'('".to_string(),
            TokenKind::RParen => "')'".to_string(),
            TokenKind::Colon => "':'".to_string(),
            TokenKind::Comma => "','".to_string(),
            TokenKind::Plus => "'+'".to_string(),
            TokenKind::Minus => "'-'".to_string(),
            TokenKind::EqEq => "'=='".to_string(),
            TokenKind::NotEq => "'!='".to_string(),
            TokenKind::Eof => "end of input".to_string(),
        }
    }
}

/// A token and the byte offset where it starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub offset: usize,
}

/// Streaming tokenizer over a borrowed source buffer.
pub struct Lexer<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    /// The full source buffer.
    pub fn source(&self) -> &'a str {
        self.src
    }

    /// Byte offset of the next unread character.
    pub fn offset(&self) -> usize {
        self.pos
    }

    /// Tokenize the whole buffer. The last token is always [`TokenKind::Eof`].
    pub fn tokenize(src: &'a str) -> Result<Vec<Token>> {
        let mut lexer = Self::new(src);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    /// Read the next token.
    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_trivia()?;
        let start = self.pos;
        let Some(c) = self.peek() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                offset: start,
            });
        };

        let kind = match c {
            '{' => self.single(TokenKind::LBrace),
            '}' => self.single(TokenKind::RBrace),
            '[' => self.single(TokenKind::LBracket),
            ']' => self.single(TokenKind::RBracket),
            '(' => self.single(TokenKind::LParen),
            ')' => self.single(TokenKind::RParen),
            ':' => self.single(TokenKind::Colon),
            ',' => self.single(TokenKind::Comma),
            '+' => self.single(TokenKind::Plus),
            '-' => self.single(TokenKind::Minus),
            '=' => {
                if self.peek_nth(1) == Some('=') {
                    self.pos += 2;
                    TokenKind::EqEq
                } else {
                    return Err(self.error(start, "assignment is not allowed"));
                }
            }
            '!' => {
                if self.peek_nth(1) == Some('=') {
                    self.pos += 2;
                    TokenKind::NotEq
                } else {
                    return Err(self.error(start, "unexpected character '!'"));
                }
            }
            '\'' | '"' => TokenKind::Str(self.lex_string(c, false)?),
            '0'..='9' => TokenKind::Int(self.lex_number()?),
            '.' if self.peek_nth(1).is_some_and(|d| d.is_ascii_digit()) => {
                return Err(self.error(start, "floating point literals are not supported"));
            }
            c if is_ident_start(c) => {
                let ident = self.lex_ident();
                match self.peek() {
                    Some(q @ ('\'' | '"')) if is_string_prefix(&ident) => {
                        let raw = ident.eq_ignore_ascii_case("r");
                        TokenKind::Str(self.lex_string(q, raw)?)
                    }
                    _ => TokenKind::Name(ident),
                }
            }
            other => {
                return Err(self.error(start, format!("unexpected character {:?}", other)));
            }
        };

        Ok(Token {
            kind,
            offset: start,
        })
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.src[self.pos..].chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.pos += 1;
        kind
    }

    fn error(&self, offset: usize, message: impl Into<String>) -> Error {
        Error::parse(self.src, offset, message)
    }

    /// Skip whitespace, `#` comments and backslash line continuations.
    fn skip_trivia(&mut self) -> Result<()> {
        while let Some(c) = self.peek() {
            match c {
                ' ' | '\t' | '\n' | '\r' | '\x0c' => {
                    self.pos += 1;
                }
                '#' => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                '\\' => match self.peek_nth(1) {
                    Some('\n') => self.pos += 2,
                    Some('\r') if self.peek_nth(2) == Some('\n') => self.pos += 3,
                    _ => return Err(self.error(self.pos, "unexpected character '\\\\'")),
                },
                _ => break,
            }
        }
        Ok(())
    }

    fn lex_ident(&mut self) -> String {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if is_ident_continue(c) {
                self.bump();
            } else {
                break;
            }
        }
        self.src[start..self.pos].to_string()
    }

    fn lex_number(&mut self) -> Result<u64> {
        let start = self.pos;
        let radix = match (self.peek(), self.peek_nth(1)) {
            (Some('0'), Some('x' | 'X')) => 16,
            (Some('0'), Some('o' | 'O')) => 8,
            (Some('0'), Some('b' | 'B')) => 2,
            _ => 10,
        };
        if radix != 10 {
            self.pos += 2;
        }

        let digits_start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                self.bump();
            } else {
                break;
            }
        }
        let digits = &self.src[digits_start..self.pos];

        if radix == 10
            && (matches!(self.peek(), Some('.')) || digits.contains(['e', 'E', 'j', 'J']))
        {
            return Err(self.error(start, "floating point literals are not supported"));
        }

        if digits.is_empty() {
            return Err(self.error(start, "integer literal has no digits"));
        }
        if digits.starts_with('_') || digits.ends_with('_') || digits.contains("__") {
            return Err(self.error(start, "invalid digit separator in integer literal"));
        }
        let cleaned: String = digits.chars().filter(|&c| c != '_').collect();
        if !cleaned.chars().all(|c| c.is_digit(radix)) {
            return Err(self.error(start, format!("invalid base-{} integer literal", radix)));
        }
        if radix == 10 && cleaned.len() > 1 && cleaned.starts_with('0') && cleaned.chars().any(|c| c != '0') {
            return Err(self.error(
                start,
                "leading zeros in decimal integer literals are not permitted",
            ));
        }

        u64::from_str_radix(&cleaned, radix)
            .map_err(|_| self.error(start, "integer literal is too large"))
    }

    /// Lex a string literal. The cursor sits on the opening quote.
    fn lex_string(&mut self, quote: char, raw: bool) -> Result<String> {
        let start = self.pos;
        self.pos += quote.len_utf8();

        let triple = self.peek() == Some(quote) && self.peek_nth(1) == Some(quote);
        if triple {
            self.pos += 2 * quote.len_utf8();
        }

        let mut out = String::new();
        loop {
            let Some(c) = self.bump() else {
                return Err(self.error(start, "unterminated string literal"));
            };
            match c {
                c if c == quote => {
                    if !triple {
                        return Ok(out);
                    }
                    if self.peek() == Some(quote) && self.peek_nth(1) == Some(quote) {
                        self.pos += 2 * quote.len_utf8();
                        return Ok(out);
                    }
                    out.push(c);
                }
                '\n' if !triple => {
                    return Err(self.error(start, "unterminated string literal"));
                }
                '\\' => {
                    let escape_at = self.pos - 1;
                    let Some(next) = self.bump() else {
                        return Err(self.error(start, "unterminated string literal"));
                    };
                    if raw {
                        out.push('\\');
                        out.push(next);
                    } else {
                        self.decode_escape(next, escape_at, &mut out)?;
                    }
                }
                c => out.push(c),
            }
        }
    }

    fn decode_escape(&mut self, c: char, escape_at: usize, out: &mut String) -> Result<()> {
        match c {
            '\n' => {}
            '\\' | '\'' | '"' => out.push(c),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'a' => out.push('\x07'),
            'b' => out.push('\x08'),
            'f' => out.push('\x0c'),
            'v' => out.push('\x0b'),
            '0'..='7' => {
                let mut code = c.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match self.peek().and_then(|d| d.to_digit(8)) {
                        Some(d) => {
                            code = code * 8 + d;
                            self.pos += 1;
                        }
                        None => break,
                    }
                }
                out.push(self.code_point(code, escape_at)?);
            }
            'x' => out.push(self.hex_escape(2, escape_at)?),
            'u' => out.push(self.hex_escape(4, escape_at)?),
            'U' => out.push(self.hex_escape(8, escape_at)?),
            other => {
                out.push('\\');
                out.push(other);
            }
        }
        Ok(())
    }

    fn hex_escape(&mut self, len: usize, escape_at: usize) -> Result<char> {
        let mut code = 0u32;
        for _ in 0..len {
            let digit = self
                .peek()
                .and_then(|d| d.to_digit(16))
                .ok_or_else(|| self.error(escape_at, "truncated escape sequence"))?;
            code = code * 16 + digit;
            self.pos += 1;
        }
        self.code_point(code, escape_at)
    }

    fn code_point(&self, code: u32, escape_at: usize) -> Result<char> {
        char::from_u32(code)
            .ok_or_else(|| self.error(escape_at, format!("invalid code point U+{:X} in escape", code)))
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_string_prefix(ident: &str) -> bool {
    ident.eq_ignore_ascii_case("r") || ident.eq_ignore_ascii_case("u")
}
