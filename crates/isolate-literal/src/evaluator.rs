//! Recursive-descent evaluator for literal expressions.
//!
//! The evaluator walks the token stream produced by [`Lexer`] and builds a
//! [`Value`] directly. There is no symbol table: the only identifiers it
//! understands are `True`, `False` and `None`, and every other name is a
//! parse error. Nothing is ever executed.

use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::lexer::{Lexer, Token, TokenKind};
use crate::value::Value;

/// Default maximum nesting of sequences and mappings.
pub const DEFAULT_MAX_DEPTH: usize = 100;

/// Default maximum input size in bytes (16 MiB).
pub const DEFAULT_MAX_INPUT_LEN: usize = 16 * 1024 * 1024;

/// Limits applied while evaluating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalOptions {
    /// Maximum nesting of sequences and mappings.
    pub max_depth: usize,
    /// Maximum input size in bytes.
    pub max_input_len: usize,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_input_len: DEFAULT_MAX_INPUT_LEN,
        }
    }
}

impl EvalOptions {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_input_len(mut self, max_input_len: usize) -> Self {
        self.max_input_len = max_input_len;
        self
    }
}

/// Evaluates literal expressions under a fixed set of limits.
#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    options: EvalOptions,
}

impl Evaluator {
    pub fn new(options: EvalOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &EvalOptions {
        &self.options
    }

    /// Evaluate `content` as a single literal expression.
    ///
    /// # Errors
    ///
    /// * [`Error::Parse`] when the text is empty, too large, too deeply
    ///   nested or anything other than a literal.
    /// * [`Error::TypeMismatch`] when a mapping key is not a string.
    /// * [`Error::Integrity`] when the walk finishes without consuming the
    ///   input exactly or with unbalanced nesting.
    pub fn eval(&self, content: &str) -> Result<Value> {
        if content.len() > self.options.max_input_len {
            return Err(Error::parse(
                content,
                self.options.max_input_len,
                format!(
                    "input of {} bytes exceeds the limit of {} bytes",
                    content.len(),
                    self.options.max_input_len
                ),
            ));
        }

        let mut parser = Parser::new(content, self.options.max_depth)?;
        let value = parser.parse_value()?;
        parser.expect_end()?;
        parser.verify_finished()?;

        tracing::trace!(bytes = content.len(), depth = value.depth(), "Evaluated literal");
        Ok(value)
    }
}

/// Evaluate `content` with default limits.
pub fn eval_content(content: &str) -> Result<Value> {
    Evaluator::default().eval(content)
}

struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    depth: usize,
    max_depth: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str, max_depth: usize) -> Result<Self> {
        let mut lexer = Lexer::new(src);
        let current = lexer.next_token()?;
        Ok(Self {
            lexer,
            current,
            depth: 0,
            max_depth,
        })
    }

    fn src(&self) -> &'a str {
        self.lexer.source()
    }

    fn advance(&mut self) -> Result<Token> {
        let next = self.lexer.next_token()?;
        Ok(std::mem::replace(&mut self.current, next))
    }

    fn error_here(&self, message: impl Into<String>) -> Error {
        Error::parse(self.src(), self.current.offset, message)
    }

    fn unexpected(&self, expected: &str) -> Error {
        self.error_here(format!(
            "expected {}, found {}",
            expected,
            self.current.kind.describe()
        ))
    }

    fn enter(&mut self) -> Result<()> {
        if self.depth >= self.max_depth {
            return Err(self.error_here(format!(
                "nesting exceeds the maximum depth of {}",
                self.max_depth
            )));
        }
        self.depth += 1;
        Ok(())
    }

    fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn expect_end(&self) -> Result<()> {
        match self.current.kind {
            TokenKind::Eof => Ok(()),
            _ => Err(self.error_here(format!(
                "unexpected {} after the end of the expression",
                self.current.kind.describe()
            ))),
        }
    }

    /// Verify the walk left no residual state behind.
    fn verify_finished(&self) -> Result<()> {
        if self.depth != 0 {
            return Err(Error::integrity(format!(
                "evaluation finished at nesting depth {}",
                self.depth
            )));
        }
        if self.lexer.offset() != self.src().len() {
            return Err(Error::integrity(format!(
                "evaluation stopped at byte {} of {}",
                self.lexer.offset(),
                self.src().len()
            )));
        }
        if self.current.kind != TokenKind::Eof {
            return Err(Error::integrity("evaluation left an unconsumed token"));
        }
        Ok(())
    }

    fn parse_value(&mut self) -> Result<Value> {
        match &self.current.kind {
            TokenKind::LBrace => self.parse_mapping(),
            TokenKind::LBracket => self.parse_sequence(),
            TokenKind::LParen => self.parse_parenthesized(),
            TokenKind::Str(_) => self.parse_strings(),
            TokenKind::Int(_) | TokenKind::Plus | TokenKind::Minus => self.parse_integer(),
            TokenKind::Name(name) => {
                let value = match name.as_str() {
                    "True" => Value::Bool(true),
                    "False" => Value::Bool(false),
                    "None" => Value::Null,
                    other => {
                        return Err(self.error_here(format!(
                            "name '{}' is not allowed: only literal values are permitted",
                            other
                        )));
                    }
                };
                self.advance()?;
                Ok(value)
            }
            TokenKind::Eof => Err(self.error_here("expected a literal value, found end of input")),
            _ => Err(self.unexpected("a literal value")),
        }
    }

    fn parse_mapping(&mut self) -> Result<Value> {
        self.enter()?;
        self.advance()?;
        let mut map = BTreeMap::new();
        loop {
            if self.current.kind == TokenKind::RBrace {
                break;
            }
            let key_offset = self.current.offset;
            let key = match self.parse_value()? {
                Value::String(key) => key,
                other => {
                    return Err(Error::type_mismatch(
                        self.src(),
                        key_offset,
                        format!("mapping keys must be strings, found {}", other.type_name()),
                    ));
                }
            };
            if self.current.kind != TokenKind::Colon {
                return Err(self.unexpected("':'"));
            }
            self.advance()?;
            let value = self.parse_value()?;
            if map.insert(key.clone(), value).is_some() {
                tracing::debug!(%key, "Duplicate mapping key, keeping the last value");
            }
            match self.current.kind {
                TokenKind::Comma => {
                    self.advance()?;
                }
                TokenKind::RBrace => break,
                _ => return Err(self.unexpected("',' or '}'")),
            }
        }
        self.advance()?;
        self.leave();
        Ok(Value::Mapping(map))
    }

    fn parse_sequence(&mut self) -> Result<Value> {
        self.enter()?;
        self.advance()?;
        let items = self.parse_items(TokenKind::RBracket, "',' or ']'")?;
        self.leave();
        Ok(Value::Sequence(items))
    }

    /// `()` is an empty tuple, `(x)` is `x` and `(x,)` / `(x, y)` are tuples.
    fn parse_parenthesized(&mut self) -> Result<Value> {
        self.enter()?;
        self.advance()?;
        if self.current.kind == TokenKind::RParen {
            self.advance()?;
            self.leave();
            return Ok(Value::Sequence(Vec::new()));
        }

        let first = self.parse_value()?;
        let value = match self.current.kind {
            TokenKind::RParen => {
                self.advance()?;
                first
            }
            TokenKind::Comma => {
                self.advance()?;
                let mut items = vec![first];
                items.extend(self.parse_items(TokenKind::RParen, "',' or ')'")?);
                Value::Sequence(items)
            }
            _ => return Err(self.unexpected("',' or ')'")),
        };
        self.leave();
        Ok(value)
    }

    /// Parse comma separated values up to and including `close`.
    fn parse_items(&mut self, close: TokenKind, expected: &str) -> Result<Vec<Value>> {
        let mut items = Vec::new();
        loop {
            if self.current.kind == close {
                break;
            }
            items.push(self.parse_value()?);
            if self.current.kind == TokenKind::Comma {
                self.advance()?;
            } else if self.current.kind != close {
                return Err(self.unexpected(expected));
            }
        }
        self.advance()?;
        Ok(items)
    }

    /// Adjacent string literals concatenate.
    fn parse_strings(&mut self) -> Result<Value> {
        let mut out = String::new();
        while let TokenKind::Str(s) = &self.current.kind {
            out.push_str(s);
            self.advance()?;
        }
        Ok(Value::String(out))
    }

    fn parse_integer(&mut self) -> Result<Value> {
        let start = self.current.offset;
        let mut negative = false;
        loop {
            match self.current.kind {
                TokenKind::Plus => {}
                TokenKind::Minus => negative = !negative,
                _ => break,
            }
            self.advance()?;
        }

        let TokenKind::Int(magnitude) = self.current.kind else {
            return Err(self.unexpected("an integer after unary sign"));
        };
        self.advance()?;

        let value = if negative {
            0i64.checked_sub_unsigned(magnitude)
        } else {
            i64::try_from(magnitude).ok()
        };
        value
            .map(Value::Integer)
            .ok_or_else(|| Error::parse(self.src(), start, "integer literal does not fit in 64 bits"))
    }
}
