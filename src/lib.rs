//! # Lapis - a declarative annotation engine for C API models
//!
//! Lapis populates a C API model (functions, arguments, types, pointees)
//! with named annotations - synchrony, transfer direction, lifetime,
//! buffer sizes - driven by a declarative specification.
//!
//! A specification mixes two forms:
//!
//! - **Descriptors** navigate to a named position and set annotations
//!   there: `function(cuMalloc) { argument(size) { in; } }`.
//! - **Rules** pattern-match positions anywhere in the model, bind names
//!   to the matched sub-entities, optionally check a predicate, and apply
//!   a descriptor block to every match:
//!   `rule { function(/^cu.*/) } => { synchrony(sync); }`.
//!
//! The Lapis parser, the C header parser, and the annotation vocabulary
//! are external collaborators: this crate defines the AST they produce
//! ([`ast`]), the model graph they build ([`model`]), the schema contract
//! ([`schema`]), and the engine that brings them together ([`engine`]).
//!
//! # Quick Start
//!
//! ```rust
//! use lapis::ast::{Declaration, Descriptor, Specification, Value};
//! use lapis::model::{Entity, Model, Type};
//! use lapis::schema::AnnotationSchema;
//!
//! // A one-function model: cuInit(int flags).
//! let mut model = Model::new();
//! let api = model.add_api();
//! let int = model.add_type(Type::new("int"));
//! let cu_init = model.add_function(api, "cuInit", int);
//! model.add_argument(cu_init, "flags", int);
//!
//! // function(cuInit) { synchrony(sync); }
//! let spec = Specification::new(vec![Declaration::Descriptor(
//!     Descriptor::new("function")
//!         .with_arg(Value::id("cuInit"))
//!         .with_sub(Descriptor::new("synchrony").with_arg(Value::id("sync"))),
//! )]);
//!
//! let schema = AnnotationSchema::new().with_function_annotation("synchrony");
//! lapis::run(&spec, &mut model, &schema, false).unwrap();
//!
//! match model.entity(cu_init) {
//!     Entity::Function(f) => {
//!         assert_eq!(
//!             f.annotations.get("synchrony"),
//!             Some(&lapis::eval::Value::Str("sync".to_string()))
//!         );
//!     }
//!     _ => unreachable!(),
//! }
//! ```
//!
//! # Modules
//!
//! - [`ast`]: the specification AST (descriptors, rules, matchers, values)
//! - [`model`]: the mutable C API model graph
//! - [`engine`]: the matcher, applicator, rule driver, and dependency pass
//! - [`eval`]: the embedded expression sub-language for predicates
//! - [`schema`]: the externally supplied annotation vocabulary
//! - [`error`]: fatal engine errors

#![doc(html_root_url = "https://docs.rs/lapis/0.3.0")]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod ast;
pub mod engine;
pub mod error;
pub mod eval;
pub mod model;
pub mod schema;

// Re-exports for convenience
pub use engine::binding::MatchResult;
pub use engine::Engine;
pub use error::Error;
pub use eval::{Environment, Value};
pub use model::{Model, NodeId};
pub use schema::AnnotationSchema;

/// Annotates a model in place from a specification.
///
/// This is the primary entry point: it extracts rules (lifting free
/// descriptors into implicit API-level rules), applies every rule at every
/// model position in priority order, and finishes with the dependency
/// inference pass. With `trace` enabled the engine emits `tracing` debug
/// events for rule scheduling, firings, annotation writes, and inferred
/// dependencies.
///
/// On failure the model may be partially annotated; the error identifies
/// the offending construct.
pub fn run(
    spec: &ast::Specification,
    model: &mut Model,
    schema: &AnnotationSchema,
    trace: bool,
) -> Result<(), Error> {
    Engine::new(schema).with_trace(trace).run(spec, model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Declaration, Descriptor, Specification, Value as AstValue};
    use crate::model::{Entity, Type};

    #[test]
    fn run_requires_an_api_root() {
        let mut model = Model::new();
        model.add_type(Type::new("int"));
        let spec = Specification::new(vec![]);
        let schema = AnnotationSchema::new();
        assert!(matches!(
            run(&spec, &mut model, &schema, false),
            Err(Error::MissingApi)
        ));
    }

    #[test]
    fn free_descriptors_reach_the_api_root_only() {
        let mut model = Model::new();
        let api = model.add_api();
        let int = model.add_type(Type::new("int"));
        model.add_function(api, "f", int);

        let spec = Specification::new(vec![Declaration::Descriptor(
            Descriptor::new("vendor").with_arg(AstValue::string("nvidia")),
        )]);
        let schema = AnnotationSchema::new();
        run(&spec, &mut model, &schema, false).unwrap();

        match model.entity(api) {
            Entity::Api(a) => assert_eq!(
                a.annotations.get("vendor"),
                Some(&Value::Str("nvidia".to_string()))
            ),
            _ => unreachable!(),
        }
    }
}
