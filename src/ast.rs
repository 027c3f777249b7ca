//! Abstract Syntax Tree definitions for the Lapis specification language.
//!
//! This module defines the AST produced by the external Lapis parser:
//! descriptors that navigate to a model position and set annotations there,
//! and rules that pattern-match model positions and apply descriptor blocks
//! to every match.
//!
//! # Structure
//!
//! A specification is an ordered sequence of declarations:
//!
//! ```text
//! function(cuMalloc) {
//!   argument(size) { in; }
//! }
//!
//! rule { function(/^cu.*/) } => { synchrony(sync); }
//! ```
//!
//! The first declaration is a [`Descriptor`]; the second is a [`Rule`] whose
//! match side is a [`Matcher`]. Every node carries the surface syntax it was
//! parsed from via its [`Display`](std::fmt::Display) implementation, which
//! diagnostics use to point at the offending construct.

use std::fmt;

use once_cell::sync::OnceCell;
use regex::Regex;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::eval::{Environment, EvalError, Value as Runtime};
use crate::model::Model;

/// Source location information for error reporting and tooling.
///
/// Spans track the byte offsets and line/column positions of AST nodes in
/// the original source. They are supplied by the external parser; nodes
/// synthesized by the engine use [`Span::default`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Span {
    /// Starting byte offset (inclusive)
    pub start: usize,
    /// Ending byte offset (exclusive)
    pub end: usize,
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub column: usize,
}

impl Span {
    /// Creates a new span with the given positions.
    pub fn new(start: usize, end: usize, line: usize, column: usize) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }

    /// Merges two spans, creating a span that covers both.
    pub fn merge(&self, other: &Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
            line: self.line.min(other.line),
            column: if self.line <= other.line {
                self.column
            } else {
                other.column
            },
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

// === Values ===

/// An identifier value.
///
/// Identifiers evaluate through the binding context: a bound name yields the
/// bound value, an unbound name yields itself as a string. Non-simple
/// identifiers print backtick-quoted.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Id {
    /// The identifier text
    pub name: String,
}

impl Id {
    /// Creates an identifier.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Returns true if this identifier spells the given name.
    pub fn matches(&self, name: &str) -> bool {
        self.name == name
    }

    fn is_simple(&self) -> bool {
        let mut chars = self.name.chars();
        match chars.next() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
            _ => return false,
        }
        chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_simple() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "`{}`", self.name)
        }
    }
}

/// A numeric literal, integer or floating point.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Number {
    /// Integer literal
    Int(i64),
    /// Floating-point literal
    Float(f64),
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(n) => write!(f, "{}", n),
            Number::Float(x) => write!(f, "{}", x),
        }
    }
}

/// One segment of an embedded code literal.
///
/// Code is a sequence of verbatim text runs and `${name}` interpolations.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CodeSegment {
    /// Verbatim code text
    Literal(String),
    /// `${name}` interpolation, replaced by the bound value's printed form
    Interpolate(Id),
}

/// An embedded code expression, possibly interpolated.
///
/// Code literals carry user-language source text (C expressions, in
/// practice). Evaluation concatenates the segments, rendering each
/// interpolation through the binding context.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Code {
    /// The literal and interpolated segments, in order
    pub segments: Vec<CodeSegment>,
}

impl Code {
    /// Creates a code expression from segments.
    pub fn new(segments: Vec<CodeSegment>) -> Self {
        Self { segments }
    }

    /// Creates a code expression holding a single verbatim text run.
    pub fn literal(text: impl Into<String>) -> Self {
        Self {
            segments: vec![CodeSegment::Literal(text.into())],
        }
    }

    /// Concatenates the segments, substituting `${name}` interpolations
    /// with the printed form of the bound value.
    ///
    /// An interpolation of an unbound name is an evaluation error.
    pub fn interpolate(&self, env: &Environment, model: &Model) -> Result<String, EvalError> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                CodeSegment::Literal(text) => out.push_str(text),
                CodeSegment::Interpolate(id) => {
                    let value = env
                        .lookup(&id.name)
                        .ok_or_else(|| EvalError::undefined_variable(&id.name))?;
                    out.push_str(&model.render(value));
                }
            }
        }
        Ok(out)
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "```")?;
        for segment in &self.segments {
            match segment {
                CodeSegment::Literal(text) => write!(f, "{}", text)?,
                CodeSegment::Interpolate(id) => write!(f, "${{{}}}", id)?,
            }
        }
        write!(f, "```")
    }
}

/// A literal value appearing in descriptor arguments and matchers.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Value {
    /// An identifier
    Id(Id),
    /// A double-quoted string literal
    String(String),
    /// A numeric literal
    Number(Number),
    /// A boolean literal
    Bool(bool),
    /// An embedded code expression
    Code(Code),
}

impl Value {
    /// Creates an identifier value.
    pub fn id(name: impl Into<String>) -> Self {
        Value::Id(Id::new(name))
    }

    /// Creates a string value.
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    /// Creates an integer value.
    pub fn int(n: i64) -> Self {
        Value::Number(Number::Int(n))
    }

    /// Creates a code value holding verbatim text.
    pub fn code(text: impl Into<String>) -> Self {
        Value::Code(Code::literal(text))
    }

    /// Evaluates this value in a binding context.
    ///
    /// Identifiers resolve through the context, falling back to their own
    /// name; code expressions interpolate and yield a [`Runtime::Code`]
    /// value so downstream passes can recognize embedded user code.
    pub fn eval(&self, env: &Environment, model: &Model) -> Result<Runtime, EvalError> {
        Ok(match self {
            Value::Id(id) => match env.lookup(&id.name) {
                Some(bound) => bound.clone(),
                None => Runtime::Str(id.name.clone()),
            },
            Value::String(s) => Runtime::Str(s.clone()),
            Value::Number(Number::Int(n)) => Runtime::Int(*n),
            Value::Number(Number::Float(x)) => Runtime::Float(*x),
            Value::Bool(b) => Runtime::Bool(*b),
            Value::Code(code) => Runtime::Code(code.interpolate(env, model)?),
        })
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Id(id) => write!(f, "{}", id),
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::Number(n) => write!(f, "{}", n),
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::Code(code) => write!(f, "{}", code),
        }
    }
}

// === Descriptors ===

/// A descriptor: navigates to a model position or writes an annotation.
///
/// Reserved names (`at`, `function`, `argument`, `field`, `element`)
/// navigate; every other name writes the annotation of that name, with zero
/// arguments meaning `true` and one argument supplying the value.
///
/// # Example
///
/// ```rust
/// use lapis::ast::{Descriptor, Value};
///
/// let d = Descriptor::new("argument")
///     .with_arg(Value::id("size"))
///     .with_sub(Descriptor::new("in"));
/// assert_eq!(d.to_string(), "argument(size) { in; }");
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Descriptor {
    /// The descriptor name
    pub name: Id,
    /// Ordered argument values
    pub arguments: Vec<Value>,
    /// Ordered subdescriptors applied inside this descriptor's scope
    pub subdescriptors: Vec<Descriptor>,
    /// Source location
    pub span: Span,
}

impl Descriptor {
    /// Creates a descriptor with no arguments or subdescriptors.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Id::new(name),
            arguments: Vec::new(),
            subdescriptors: Vec::new(),
            span: Span::default(),
        }
    }

    /// Appends an argument value.
    pub fn with_arg(mut self, value: Value) -> Self {
        self.arguments.push(value);
        self
    }

    /// Appends a subdescriptor.
    pub fn with_sub(mut self, sub: Descriptor) -> Self {
        self.subdescriptors.push(sub);
        self
    }

    /// Attaches a source span.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.arguments.is_empty() {
            write!(f, "(")?;
            for (i, arg) in self.arguments.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", arg)?;
            }
            write!(f, ")")?;
        }
        if self.subdescriptors.is_empty() {
            write!(f, ";")
        } else {
            write!(f, " {{")?;
            for sub in &self.subdescriptors {
                write!(f, " {}", sub)?;
            }
            write!(f, " }}")
        }
    }
}

// === Matchers ===

/// A matcher: tests a model entity and produces bindings.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Matcher {
    /// A conjunctive block of match descriptors, optionally binding the
    /// matched entity
    Block(MatchBlock),
    /// A match descriptor; only valid inside a block's children
    Descriptor(MatchDescriptor),
    /// Binds the matched entity to a name and delegates to a child matcher
    Bind(MatcherBind),
    /// A regular-expression matcher over the entity's printed form
    String(MatcherString),
    /// A literal-value matcher
    Value(MatcherValue),
    /// A named structural predicate over the entity
    Predicate(MatcherPredicate),
    /// Matches anything, binding nothing (`_`)
    Any,
}

impl Matcher {
    /// Creates a value matcher.
    pub fn value(value: Value) -> Self {
        Matcher::Value(MatcherValue { value })
    }

    /// Creates a regex matcher; the pattern must be a valid regex.
    pub fn string(pattern: impl Into<String>) -> Result<Self, Error> {
        Ok(Matcher::String(MatcherString::new(pattern)?))
    }

    /// Creates a binding matcher.
    pub fn bind(name: impl Into<String>, child: Matcher) -> Self {
        Matcher::Bind(MatcherBind {
            bind: name.into(),
            child: Box::new(child),
        })
    }

    /// Creates a predicate matcher.
    pub fn predicate(name: impl Into<String>, arguments: Vec<Matcher>) -> Self {
        Matcher::Predicate(MatcherPredicate {
            name: name.into(),
            arguments,
        })
    }
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Block(b) => write!(f, "{}", b),
            Matcher::Descriptor(d) => write!(f, "{}", d),
            Matcher::Bind(b) => write!(f, "{}", b),
            Matcher::String(s) => write!(f, "{}", s),
            Matcher::Value(v) => write!(f, "{}", v.value),
            Matcher::Predicate(p) => write!(f, "{}", p),
            Matcher::Any => write!(f, "_"),
        }
    }
}

/// A conjunctive block of match descriptors.
///
/// All children must match; their bindings combine by cross-product. The
/// matched entity itself is always bound: under `bind` when given, under a
/// private key otherwise.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MatchBlock {
    /// Optional user-visible name for the matched entity (`name @ { … }`)
    pub bind: Option<String>,
    /// The match descriptors, all of which must match
    pub children: Vec<MatchDescriptor>,
}

impl MatchBlock {
    /// Creates an empty block.
    pub fn new() -> Self {
        Self::default()
    }

    /// Names the matched entity.
    pub fn with_bind(mut self, name: impl Into<String>) -> Self {
        self.bind = Some(name.into());
        self
    }

    /// Appends a match descriptor.
    pub fn with_child(mut self, child: MatchDescriptor) -> Self {
        self.children.push(child);
        self
    }
}

impl fmt::Display for MatchBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        if let Some(bind) = &self.bind {
            write!(f, " {} @", bind)?;
        }
        for child in &self.children {
            write!(f, " {}", child)?;
        }
        write!(f, " }}")
    }
}

/// A match descriptor inside a block: selects sub-objects or attributes of
/// the entity the enclosing block is matched against.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MatchDescriptor {
    /// The descriptor name (`function`, `argument`, an attribute name, …)
    pub name: Id,
    /// Argument matchers (for example the name pattern of `function(…)`)
    pub arguments: Vec<Matcher>,
    /// The block matched against each selected sub-object
    pub block: MatchBlock,
}

impl MatchDescriptor {
    /// Creates a match descriptor with no arguments and an empty block.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Id::new(name),
            arguments: Vec::new(),
            block: MatchBlock::new(),
        }
    }

    /// Appends an argument matcher.
    pub fn with_arg(mut self, matcher: Matcher) -> Self {
        self.arguments.push(matcher);
        self
    }

    /// Sets the block matched against selected sub-objects.
    pub fn with_block(mut self, block: MatchBlock) -> Self {
        self.block = block;
        self
    }
}

impl fmt::Display for MatchDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.arguments.is_empty() {
            write!(f, "(")?;
            for (i, arg) in self.arguments.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", arg)?;
            }
            write!(f, ")")?;
        }
        if self.block.bind.is_none() && self.block.children.is_empty() {
            write!(f, ";")
        } else {
            write!(f, " {}", self.block)
        }
    }
}

/// Binds the matched entity to a name: `name @ matcher`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MatcherBind {
    /// The binding name
    pub bind: String,
    /// The matcher the entity must also satisfy
    pub child: Box<Matcher>,
}

impl fmt::Display for MatcherBind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {}", self.bind, self.child)
    }
}

/// A regular-expression matcher: `/pattern/`.
///
/// The pattern matches against the full printed form of the subject. The
/// compiled regex is cached on first use; [`MatcherString::new`] validates
/// the pattern eagerly.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MatcherString {
    /// The regex pattern as written, without anchors
    pub pattern: String,
    #[cfg_attr(feature = "serde", serde(skip))]
    compiled: OnceCell<Regex>,
}

impl MatcherString {
    /// Creates a regex matcher, validating the pattern.
    pub fn new(pattern: impl Into<String>) -> Result<Self, Error> {
        let matcher = Self {
            pattern: pattern.into(),
            compiled: OnceCell::new(),
        };
        matcher.regex()?;
        Ok(matcher)
    }

    /// Returns the compiled, full-string anchored regex.
    pub fn regex(&self) -> Result<&Regex, Error> {
        if let Some(re) = self.compiled.get() {
            return Ok(re);
        }
        let re = Regex::new(&format!("^(?:{})$", self.pattern)).map_err(|source| {
            Error::InvalidPattern {
                pattern: self.pattern.clone(),
                source,
            }
        })?;
        Ok(self.compiled.get_or_init(|| re))
    }
}

impl PartialEq for MatcherString {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
    }
}

impl fmt::Display for MatcherString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/", self.pattern)
    }
}

/// A literal-value matcher: succeeds when the subject's printed form equals
/// the value's.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MatcherValue {
    /// The literal compared against the subject
    pub value: Value,
}

/// A named structural predicate: `pointer(…)`, `const(…)`, `nonconst(…)`,
/// `transferrable`, `not(…)`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MatcherPredicate {
    /// The predicate name
    pub name: String,
    /// The predicate's matcher arguments
    pub arguments: Vec<Matcher>,
}

impl fmt::Display for MatcherPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, arg) in self.arguments.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", arg)?;
        }
        write!(f, ")")
    }
}

// === Rules ===

/// A rule: a matcher, an optional predicate, and result descriptors applied
/// to every match at every model position.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Rule {
    /// The match side
    pub matcher: Matcher,
    /// Execution priority; higher priorities run first (default 0)
    pub priority: i32,
    /// Optional side-condition, evaluated per binding
    pub predicate: Option<Code>,
    /// Descriptors applied for each surviving binding
    pub result_descriptors: Vec<Descriptor>,
    /// Source location
    pub span: Span,
}

impl Rule {
    /// Creates a rule with the given matcher, priority 0, no predicate,
    /// and no result descriptors.
    pub fn new(matcher: Matcher) -> Self {
        Self {
            matcher,
            priority: 0,
            predicate: None,
            result_descriptors: Vec::new(),
            span: Span::default(),
        }
    }

    /// Sets the priority.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the predicate.
    pub fn with_predicate(mut self, predicate: Code) -> Self {
        self.predicate = Some(predicate);
        self
    }

    /// Appends a result descriptor.
    pub fn with_result(mut self, descriptor: Descriptor) -> Self {
        self.result_descriptors.push(descriptor);
        self
    }

    /// Attaches a source span.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rule")?;
        if self.priority != 0 {
            write!(f, " priority {}", self.priority)?;
        }
        write!(f, " {} =>", self.matcher)?;
        if let Some(pred) = &self.predicate {
            write!(f, " if({})", pred)?;
        }
        write!(f, " {{")?;
        for d in &self.result_descriptors {
            write!(f, " {}", d)?;
        }
        write!(f, " }}")
    }
}

// === Top-level specification ===

/// A top-level declaration: a free descriptor or a rule.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Declaration {
    /// A free descriptor, applied once to the API root
    Descriptor(Descriptor),
    /// A pattern-matching rule
    Rule(Rule),
}

impl fmt::Display for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Declaration::Descriptor(d) => write!(f, "{}", d),
            Declaration::Rule(r) => write!(f, "{}", r),
        }
    }
}

/// A complete Lapis specification: an ordered sequence of declarations.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Specification {
    /// All declarations, in source order
    pub declarations: Vec<Declaration>,
}

impl Specification {
    /// Creates a specification from declarations.
    pub fn new(declarations: Vec<Declaration>) -> Self {
        Self { declarations }
    }
}

impl fmt::Display for Specification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, d) in self.declarations.iter().enumerate() {
            if i > 0 {
                write!(f, "\n\n")?;
            }
            write!(f, "{}", d)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_id_prints_bare() {
        assert_eq!(Id::new("cuMalloc").to_string(), "cuMalloc");
        assert_eq!(Id::new("_x9").to_string(), "_x9");
    }

    #[test]
    fn exotic_id_prints_quoted() {
        assert_eq!(Id::new("9lives").to_string(), "`9lives`");
        assert_eq!(Id::new("a-b").to_string(), "`a-b`");
    }

    #[test]
    fn descriptor_display_leaf_and_block() {
        let leaf = Descriptor::new("sync");
        assert_eq!(leaf.to_string(), "sync;");

        let nav = Descriptor::new("function")
            .with_arg(Value::id("foo"))
            .with_sub(Descriptor::new("synchrony").with_arg(Value::id("async")));
        assert_eq!(nav.to_string(), "function(foo) { synchrony(async); }");
    }

    #[test]
    fn rule_display_with_priority_and_predicate() {
        let rule = Rule::new(Matcher::Block(
            MatchBlock::new().with_child(MatchDescriptor::new("function").with_arg(Matcher::Any)),
        ))
        .with_priority(10)
        .with_predicate(Code::literal("len(f.arguments) == 0"))
        .with_result(Descriptor::new("noop"));
        assert_eq!(
            rule.to_string(),
            "rule priority 10 { function(_); } => if(```len(f.arguments) == 0```) { noop; }"
        );
    }

    #[test]
    fn matcher_string_requires_valid_pattern() {
        assert!(MatcherString::new("^cu.*").is_ok());
        assert!(MatcherString::new("(unclosed").is_err());
    }

    #[test]
    fn matcher_string_equality_is_by_pattern() {
        let a = MatcherString::new("x+").unwrap();
        let b = MatcherString::new("x+").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn code_display_shows_interpolations() {
        let code = Code::new(vec![
            CodeSegment::Literal("sizeof(".to_string()),
            CodeSegment::Interpolate(Id::new("t")),
            CodeSegment::Literal(")".to_string()),
        ]);
        assert_eq!(code.to_string(), "```sizeof(${t})```");
    }

    #[test]
    fn id_matches_by_name() {
        assert!(Id::new("at").matches("at"));
        assert!(!Id::new("att").matches("at"));
    }
}
