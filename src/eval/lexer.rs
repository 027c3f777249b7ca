//! Lexical analysis for the embedded expression sub-language.
//!
//! Predicates and `at(…)` targets are short, single-expression programs;
//! the token set covers exactly what the interpreter evaluates. Boolean
//! literals are accepted in both spellings (`true`/`True`) because
//! specification authors write them in the surface language's style.

use logos::Logos;

use super::value::EvalError;

/// The category of an expression token.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n]+")]
pub enum TokenKind {
    /// `(`
    #[token("(")]
    LeftParen,
    /// `)`
    #[token(")")]
    RightParen,
    /// `[`
    #[token("[")]
    LeftBracket,
    /// `]`
    #[token("]")]
    RightBracket,
    /// `,`
    #[token(",")]
    Comma,
    /// `.`
    #[token(".")]
    Dot,

    /// `==`
    #[token("==")]
    Eq,
    /// `!=`
    #[token("!=")]
    Ne,
    /// `<=`
    #[token("<=")]
    Le,
    /// `>=`
    #[token(">=")]
    Ge,
    /// `<`
    #[token("<")]
    Lt,
    /// `>`
    #[token(">")]
    Gt,

    /// `+`
    #[token("+")]
    Plus,
    /// `-`
    #[token("-")]
    Minus,
    /// `*`
    #[token("*")]
    Star,
    /// `/`
    #[token("/")]
    Slash,
    /// `%`
    #[token("%")]
    Percent,

    /// `!`
    #[token("!")]
    Bang,
    /// `&&` or the word form `and`
    #[token("&&")]
    #[token("and")]
    And,
    /// `||` or the word form `or`
    #[token("||")]
    #[token("or")]
    Or,
    /// The word form `not`
    #[token("not")]
    Not,

    /// `true` / `True`
    #[token("true")]
    #[token("True")]
    True,
    /// `false` / `False`
    #[token("false")]
    #[token("False")]
    False,

    /// An identifier
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Identifier,
    /// A floating-point literal
    #[regex(r"[0-9]+\.[0-9]+")]
    Float,
    /// An integer literal
    #[regex(r"[0-9]+")]
    Int,
    /// A double-quoted string literal
    #[regex(r#""([^"\\]|\\.)*""#)]
    Str,
}

/// An expression token: its kind and source text.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The token category
    pub kind: TokenKind,
    /// The source text of the token
    pub text: String,
}

/// Tokenizes an expression source string.
pub fn tokenize(source: &str) -> Result<Vec<Token>, EvalError> {
    let mut tokens = Vec::new();
    let mut lexer = TokenKind::lexer(source);
    while let Some(result) = lexer.next() {
        match result {
            Ok(kind) => tokens.push(Token {
                kind,
                text: lexer.slice().to_string(),
            }),
            Err(()) => {
                return Err(EvalError::parse(format!(
                    "unexpected character `{}` in `{}`",
                    lexer.slice(),
                    source
                )))
            }
        }
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn tokenizes_a_predicate() {
        assert_eq!(
            kinds("len(f.arguments) == 0"),
            vec![
                TokenKind::Identifier,
                TokenKind::LeftParen,
                TokenKind::Identifier,
                TokenKind::Dot,
                TokenKind::Identifier,
                TokenKind::RightParen,
                TokenKind::Eq,
                TokenKind::Int,
            ]
        );
    }

    #[test]
    fn word_operators_and_keywords() {
        assert_eq!(
            kinds("not a and b or True"),
            vec![
                TokenKind::Not,
                TokenKind::Identifier,
                TokenKind::And,
                TokenKind::Identifier,
                TokenKind::Or,
                TokenKind::True,
            ]
        );
    }

    #[test]
    fn numbers_and_strings() {
        assert_eq!(
            kinds(r#"3.25 42 "API""#),
            vec![TokenKind::Float, TokenKind::Int, TokenKind::Str]
        );
    }

    #[test]
    fn keyword_prefixed_identifiers_stay_identifiers() {
        assert_eq!(kinds("android"), vec![TokenKind::Identifier]);
        assert_eq!(kinds("truename"), vec![TokenKind::Identifier]);
    }

    #[test]
    fn rejects_stray_characters() {
        assert!(tokenize("a ? b").is_err());
    }
}
