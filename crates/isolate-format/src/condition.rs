//! GYP-style condition expressions.
//!
//! Conditions select which configurations a block of variables applies to,
//! e.g. `OS=="linux" and (CPU=="x64" or CPU=="arm")`. The grammar is:
//!
//! ```text
//! expr       := and_expr ("or" and_expr)*
//! and_expr   := not_expr ("and" not_expr)*
//! not_expr   := "not" not_expr | primary
//! primary    := "(" expr ")" | comparison
//! comparison := operand ("==" | "!=") operand
//! operand    := NAME | STRING | INTEGER
//! ```
//!
//! `and`/`or` chains are stored flat. Nesting through `not` and parentheses
//! is limited to [`MAX_NESTING`] levels.
//!
//! Exactly one side of a comparison must be a variable name. Integer
//! operands compare against the variable's value rendered in decimal.
//! Tokens come from the same lexer as the manifest evaluator, so quoting
//! and escaping rules are identical.

use std::collections::{BTreeMap, BTreeSet};

use isolate_literal::evaluator::DEFAULT_MAX_DEPTH;
use isolate_literal::{Lexer, Token, TokenKind};

use crate::error::{Error, Result};

/// Comparison operator of a condition leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
}

/// Maximum nesting of `not` and parentheses in one condition.
pub const MAX_NESTING: usize = DEFAULT_MAX_DEPTH;

/// Parsed condition expression tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// Two or more alternatives.
    Or(Vec<Expr>),
    /// Two or more conjuncts.
    And(Vec<Expr>),
    Not(Box<Expr>),
    Compare {
        variable: String,
        op: CompareOp,
        value: String,
    },
}

impl Expr {
    fn visit_comparisons<'a>(&'a self, f: &mut impl FnMut(&'a str, &'a str)) {
        match self {
            Expr::Or(items) | Expr::And(items) => {
                for item in items {
                    item.visit_comparisons(f);
                }
            }
            Expr::Not(inner) => inner.visit_comparisons(f),
            Expr::Compare {
                variable, value, ..
            } => f(variable, value),
        }
    }

    fn evaluate(&self, bindings: &BTreeMap<&str, &str>) -> Option<bool> {
        Some(match self {
            Expr::Or(items) => {
                for item in items {
                    if item.evaluate(bindings)? {
                        return Some(true);
                    }
                }
                false
            }
            Expr::And(items) => {
                for item in items {
                    if !item.evaluate(bindings)? {
                        return Some(false);
                    }
                }
                true
            }
            Expr::Not(inner) => !inner.evaluate(bindings)?,
            Expr::Compare {
                variable,
                op,
                value,
            } => {
                let bound = *bindings.get(variable.as_str())?;
                match op {
                    CompareOp::Eq => bound == value.as_str(),
                    CompareOp::Ne => bound != value.as_str(),
                }
            }
        })
    }
}

/// A parsed condition together with its source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    source: String,
    expr: Expr,
}

impl Condition {
    /// Parse a condition expression.
    pub fn parse(source: &str) -> Result<Self> {
        let tokens = Lexer::tokenize(source)
            .map_err(|e| Error::invalid_condition(source, literal_message(&e)))?;
        let mut parser = ConditionParser {
            source,
            tokens,
            pos: 0,
            depth: 0,
        };
        let expr = parser.parse_or()?;
        if parser.peek() != &TokenKind::Eof {
            return Err(parser.unexpected("'and', 'or' or end of condition"));
        }
        Ok(Self {
            source: source.to_string(),
            expr,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Names of all variables referenced by the condition.
    pub fn variables(&self) -> BTreeSet<&str> {
        let mut out = BTreeSet::new();
        self.expr.visit_comparisons(&mut |variable, _| {
            out.insert(variable);
        });
        out
    }

    /// Every `(variable, value)` pair the condition compares against.
    pub fn comparisons(&self) -> Vec<(&str, &str)> {
        let mut out = Vec::new();
        self.expr.visit_comparisons(&mut |variable, value| out.push((variable, value)));
        out
    }

    /// Evaluate under `bindings`. Returns `None` when a referenced variable
    /// has no binding.
    pub fn evaluate(&self, bindings: &BTreeMap<&str, &str>) -> Option<bool> {
        self.expr.evaluate(bindings)
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

fn literal_message(err: &isolate_literal::Error) -> String {
    match err {
        isolate_literal::Error::Parse { message, .. }
        | isolate_literal::Error::TypeMismatch { message, .. } => message.clone(),
        other => other.to_string(),
    }
}

static EOF: TokenKind = TokenKind::Eof;

enum Operand {
    Name(String),
    Literal(String),
}

struct ConditionParser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl ConditionParser<'_> {
    fn peek(&self) -> &TokenKind {
        self.tokens
            .get(self.pos)
            .map(|t| &t.kind)
            .unwrap_or(&EOF)
    }

    fn bump(&mut self) -> TokenKind {
        let kind = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        kind
    }

    fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), TokenKind::Name(name) if name == keyword)
    }

    fn unexpected(&self, expected: &str) -> Error {
        Error::invalid_condition(
            self.source,
            format!("expected {}, found {}", expected, self.peek().describe()),
        )
    }

    fn enter(&mut self) -> Result<()> {
        if self.depth >= MAX_NESTING {
            return Err(Error::invalid_condition(
                self.source,
                format!("nesting exceeds the maximum depth of {}", MAX_NESTING),
            ));
        }
        self.depth += 1;
        Ok(())
    }

    fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn parse_or(&mut self) -> Result<Expr> {
        let mut items = vec![self.parse_and()?];
        while self.is_keyword("or") {
            self.bump();
            items.push(self.parse_and()?);
        }
        Ok(if items.len() == 1 {
            items.remove(0)
        } else {
            Expr::Or(items)
        })
    }

    fn parse_and(&mut self) -> Result<Expr> {
        let mut items = vec![self.parse_not()?];
        while self.is_keyword("and") {
            self.bump();
            items.push(self.parse_not()?);
        }
        Ok(if items.len() == 1 {
            items.remove(0)
        } else {
            Expr::And(items)
        })
    }

    fn parse_not(&mut self) -> Result<Expr> {
        if self.is_keyword("not") {
            self.bump();
            self.enter()?;
            let inner = self.parse_not()?;
            self.leave();
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        if self.peek() == &TokenKind::LParen {
            self.bump();
            self.enter()?;
            let inner = self.parse_or()?;
            if self.peek() != &TokenKind::RParen {
                return Err(self.unexpected("')'"));
            }
            self.bump();
            self.leave();
            return Ok(inner);
        }

        let lhs = self.parse_operand()?;
        let op = match self.peek() {
            TokenKind::EqEq => CompareOp::Eq,
            TokenKind::NotEq => CompareOp::Ne,
            _ => return Err(self.unexpected("'==' or '!='")),
        };
        self.bump();
        let rhs = self.parse_operand()?;

        let (variable, value) = match (lhs, rhs) {
            (Operand::Name(variable), Operand::Literal(value))
            | (Operand::Literal(value), Operand::Name(variable)) => (variable, value),
            (Operand::Name(_), Operand::Name(_)) => {
                return Err(Error::invalid_condition(
                    self.source,
                    "comparing two variables is not supported",
                ));
            }
            (Operand::Literal(_), Operand::Literal(_)) => {
                return Err(Error::invalid_condition(
                    self.source,
                    "a comparison must reference a variable",
                ));
            }
        };
        Ok(Expr::Compare {
            variable,
            op,
            value,
        })
    }

    fn parse_operand(&mut self) -> Result<Operand> {
        let operand = match self.peek() {
            TokenKind::Name(name) if !is_reserved(name) => Operand::Name(name.clone()),
            TokenKind::Str(value) => Operand::Literal(value.clone()),
            TokenKind::Int(value) => Operand::Literal(value.to_string()),
            _ => return Err(self.unexpected("a variable name or a literal")),
        };
        self.bump();
        Ok(operand)
    }
}

fn is_reserved(name: &str) -> bool {
    matches!(name, "and" | "or" | "not" | "True" | "False" | "None")
}
