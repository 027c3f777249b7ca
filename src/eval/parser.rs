//! Pratt parser for the embedded expression sub-language.
//!
//! Operators are assigned binding powers that determine precedence and
//! associativity; all binary operators are left-associative (`l < r`).
//!
//! From loosest to tightest:
//!
//! 1. Logical or (10, 11)
//! 2. Logical and (20, 21)
//! 3. Equality `==`, `!=` (30, 31)
//! 4. Comparison `<`, `<=`, `>`, `>=` (40, 41)
//! 5. Additive `+`, `-` (50, 51)
//! 6. Multiplicative `*`, `/`, `%` (60, 61)
//! 7. Prefix `-`, `!`, `not` (70)
//! 8. Member access, call, index (80)

use super::lexer::{tokenize, Token, TokenKind};
use super::value::EvalError;

/// A literal in an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Boolean literal
    Bool(bool),
    /// Integer literal
    Int(i64),
    /// Floating-point literal
    Float(f64),
    /// String literal
    Str(String),
}

/// A unary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Arithmetic negation
    Neg,
    /// Logical negation
    Not,
}

/// A binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Mod,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `&&` / `and`
    And,
    /// `||` / `or`
    Or,
}

/// An embedded expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal value
    Literal(Literal),
    /// A bound name
    Identifier(String),
    /// Member access: `object.member`
    Member {
        /// The accessed value
        object: Box<Expr>,
        /// The member name
        member: String,
    },
    /// Indexing: `object[index]`
    Index {
        /// The indexed value
        object: Box<Expr>,
        /// The index expression
        index: Box<Expr>,
    },
    /// A builtin call: `name(args…)`
    Call {
        /// The builtin name
        callee: String,
        /// Argument expressions
        args: Vec<Expr>,
    },
    /// A unary operation
    Unary {
        /// The operator
        op: UnaryOp,
        /// The operand
        operand: Box<Expr>,
    },
    /// A binary operation
    Binary {
        /// Left operand
        left: Box<Expr>,
        /// The operator
        op: BinaryOp,
        /// Right operand
        right: Box<Expr>,
    },
}

/// Returns the binding power (left, right) for infix operators.
fn infix_binding_power(kind: TokenKind) -> Option<(u8, BinaryOp, u8)> {
    Some(match kind {
        TokenKind::Or => (10, BinaryOp::Or, 11),
        TokenKind::And => (20, BinaryOp::And, 21),
        TokenKind::Eq => (30, BinaryOp::Eq, 31),
        TokenKind::Ne => (30, BinaryOp::Ne, 31),
        TokenKind::Lt => (40, BinaryOp::Lt, 41),
        TokenKind::Le => (40, BinaryOp::Le, 41),
        TokenKind::Gt => (40, BinaryOp::Gt, 41),
        TokenKind::Ge => (40, BinaryOp::Ge, 41),
        TokenKind::Plus => (50, BinaryOp::Add, 51),
        TokenKind::Minus => (50, BinaryOp::Sub, 51),
        TokenKind::Star => (60, BinaryOp::Mul, 61),
        TokenKind::Slash => (60, BinaryOp::Div, 61),
        TokenKind::Percent => (60, BinaryOp::Mod, 61),
        _ => return None,
    })
}

/// Binding power for prefix operators.
const PREFIX_BP: u8 = 70;
/// Binding power for postfix forms: member access, call, index.
const POSTFIX_BP: u8 = 80;

/// Parses an expression source string.
///
/// # Arguments
///
/// * `source` - The expression text, e.g. a rule predicate after
///   interpolation
///
/// # Returns
///
/// The parsed [`Expr`] on success, or an `EvalError` describing the first
/// lexical or syntactic problem.
pub fn parse_expr(source: &str) -> Result<Expr, EvalError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.expr_bp(0)?;
    if let Some(token) = parser.peek() {
        return Err(EvalError::parse(format!(
            "unexpected `{}` after expression",
            token.text
        )));
    }
    Ok(expr)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token, EvalError> {
        match self.advance() {
            Some(token) if token.kind == kind => Ok(token),
            Some(token) => Err(EvalError::parse(format!(
                "expected {}, found `{}`",
                what, token.text
            ))),
            None => Err(EvalError::parse(format!(
                "expected {}, found end of input",
                what
            ))),
        }
    }

    fn expr_bp(&mut self, min_bp: u8) -> Result<Expr, EvalError> {
        let mut lhs = self.prefix()?;

        while let Some(kind) = self.peek().map(|t| t.kind) {
            match kind {
                TokenKind::Dot if POSTFIX_BP >= min_bp => {
                    self.advance();
                    let member = self.expect(TokenKind::Identifier, "a member name")?;
                    lhs = Expr::Member {
                        object: Box::new(lhs),
                        member: member.text,
                    };
                }
                TokenKind::LeftBracket if POSTFIX_BP >= min_bp => {
                    self.advance();
                    let index = self.expr_bp(0)?;
                    self.expect(TokenKind::RightBracket, "`]`")?;
                    lhs = Expr::Index {
                        object: Box::new(lhs),
                        index: Box::new(index),
                    };
                }
                TokenKind::LeftParen if POSTFIX_BP >= min_bp => {
                    let callee = match lhs {
                        Expr::Identifier(name) => name,
                        other => {
                            return Err(EvalError::parse(format!(
                                "cannot call {:?}; only named builtins are callable",
                                other
                            )))
                        }
                    };
                    self.advance();
                    let mut args = Vec::new();
                    if !matches!(self.peek().map(|t| t.kind), Some(TokenKind::RightParen)) {
                        loop {
                            args.push(self.expr_bp(0)?);
                            match self.peek().map(|t| t.kind) {
                                Some(TokenKind::Comma) => {
                                    self.advance();
                                }
                                _ => break,
                            }
                        }
                    }
                    self.expect(TokenKind::RightParen, "`)`")?;
                    lhs = Expr::Call { callee, args };
                }
                kind => match infix_binding_power(kind) {
                    Some((l_bp, op, r_bp)) if l_bp >= min_bp => {
                        self.advance();
                        let rhs = self.expr_bp(r_bp)?;
                        lhs = Expr::Binary {
                            left: Box::new(lhs),
                            op,
                            right: Box::new(rhs),
                        };
                    }
                    _ => break,
                },
            }
        }

        Ok(lhs)
    }

    fn prefix(&mut self) -> Result<Expr, EvalError> {
        let token = self
            .advance()
            .ok_or_else(|| EvalError::parse("empty expression"))?;
        Ok(match token.kind {
            TokenKind::True => Expr::Literal(Literal::Bool(true)),
            TokenKind::False => Expr::Literal(Literal::Bool(false)),
            TokenKind::Int => {
                let n = token
                    .text
                    .parse::<i64>()
                    .map_err(|_| EvalError::parse(format!("integer `{}` overflows", token.text)))?;
                Expr::Literal(Literal::Int(n))
            }
            TokenKind::Float => {
                let x = token
                    .text
                    .parse::<f64>()
                    .map_err(|_| EvalError::parse(format!("bad float `{}`", token.text)))?;
                Expr::Literal(Literal::Float(x))
            }
            TokenKind::Str => {
                let inner = &token.text[1..token.text.len() - 1];
                Expr::Literal(Literal::Str(unescape(inner)))
            }
            TokenKind::Identifier => Expr::Identifier(token.text),
            TokenKind::Minus => Expr::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(self.expr_bp(PREFIX_BP)?),
            },
            TokenKind::Bang | TokenKind::Not => Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(self.expr_bp(PREFIX_BP)?),
            },
            TokenKind::LeftParen => {
                let expr = self.expr_bp(0)?;
                self.expect(TokenKind::RightParen, "`)`")?;
                expr
            }
            _ => {
                return Err(EvalError::parse(format!(
                    "unexpected `{}` at start of expression",
                    token.text
                )))
            }
        })
    }
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some(other) => out.push(other),
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}
