//! Error types for the annotation engine.
//!
//! Every failure the engine can produce is fatal: the offending construct is
//! reported with its printed form and source location, and `run` returns
//! immediately. Matching never errors on absent attributes (those are plain
//! match failures); errors come from malformed descriptors, failed
//! navigation, rejected annotation values, and predicate evaluation.

use thiserror::Error;

use crate::ast::Span;
use crate::eval::EvalError;
use crate::model::EntityKind;

/// A fatal engine error.
#[derive(Debug, Error)]
pub enum Error {
    /// A descriptor was shaped in a way the engine cannot interpret, for
    /// example an annotation write with more than one argument.
    #[error("schema violation in `{descriptor}` ({span}): {message}")]
    SchemaViolation {
        /// Printed form of the offending descriptor
        descriptor: String,
        /// Source location of the descriptor
        span: Span,
        /// What was wrong
        message: String,
    },

    /// Navigation named a function, argument, or field the model does not
    /// contain.
    #[error("`{descriptor}` ({span}): no {kind} named `{name}`")]
    Lookup {
        /// Printed form of the navigating descriptor
        descriptor: String,
        /// Source location of the descriptor
        span: Span,
        /// What was being looked up (`function`, `argument`, `field`)
        kind: &'static str,
        /// The name that failed to resolve
        name: String,
    },

    /// A reserved navigator was applied at an entity kind it cannot
    /// navigate, for example `argument(…)` outside a function.
    #[error("`{descriptor}` ({span}) cannot apply to a {kind} entity")]
    DescriptorMismatch {
        /// Printed form of the offending descriptor
        descriptor: String,
        /// Source location of the descriptor
        span: Span,
        /// The entity kind the descriptor was applied to
        kind: EntityKind,
    },

    /// The annotation's registered normalizer rejected the value.
    #[error("annotation `{name}` rejected value `{value}`: {reason}")]
    AnnotationRejected {
        /// The annotation name
        name: String,
        /// Printed form of the rejected value
        value: String,
        /// The normalizer's reason
        reason: String,
    },

    /// A matcher or descriptor construct the engine does not implement.
    /// These are programmer errors in the specification toolchain, not
    /// match failures.
    #[error("unknown construct `{construct}`: {message}")]
    UnknownConstruct {
        /// Printed form of the construct
        construct: String,
        /// What the engine expected instead
        message: String,
    },

    /// A `/regex/` matcher carried an invalid pattern.
    #[error("invalid match pattern /{pattern}/")]
    InvalidPattern {
        /// The pattern as written
        pattern: String,
        /// The regex compiler's complaint
        #[source]
        source: regex::Error,
    },

    /// The model has no API root to annotate.
    #[error("model has no API entity")]
    MissingApi,

    /// Evaluation of an embedded expression or interpolation failed.
    #[error(transparent)]
    Eval(#[from] EvalError),
}
