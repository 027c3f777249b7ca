//! The rule engine: rule extraction, priority ordering, model traversal,
//! and per-node rule application.
//!
//! Free top-level descriptors are lifted into implicit rules that fire only
//! at the API root; explicit rules run verbatim. Rules execute in
//! descending priority (declaration order breaking ties), and each rule
//! visits every model position in a fixed depth-first pre-order. At a
//! position, every surviving binding is applied: the predicate filters
//! bindings, and the result descriptors run at the position and at every
//! entity the binding names, with the annotation schema keeping writes on
//! the kinds they belong to.

pub mod binding;

mod apply;
mod depends;
mod matcher;

use tracing::debug;

use crate::ast::{Code, Declaration, MatchBlock, Matcher, Rule, Specification};
use crate::error::Error;
use crate::eval::{interpreter, Value};
use crate::model::{Model, NodeId};
use crate::schema::AnnotationSchema;

use apply::Applicator;
use binding::MatchResult;
use matcher::Matching;

/// The binding name implicit rules use for the specification root.
const SPEC_BIND: &str = "spec";

/// The annotation engine.
///
/// An engine borrows the externally supplied annotation schema; `run`
/// mutates the model in place and reports the first fatal error.
///
/// # Example
///
/// ```rust
/// use lapis::ast::{Declaration, Descriptor, Specification, Value};
/// use lapis::model::{Model, Type};
/// use lapis::schema::AnnotationSchema;
/// use lapis::Engine;
///
/// let mut model = Model::new();
/// let api = model.add_api();
/// let int = model.add_type(Type::new("int"));
/// let f = model.add_function(api, "foo", int);
/// model.add_argument(f, "x", int);
///
/// let spec = Specification::new(vec![Declaration::Descriptor(
///     Descriptor::new("function")
///         .with_arg(Value::id("foo"))
///         .with_sub(Descriptor::new("synchrony").with_arg(Value::id("sync"))),
/// )]);
///
/// let schema = AnnotationSchema::new().with_function_annotation("synchrony");
/// Engine::new(&schema).run(&spec, &mut model).unwrap();
/// ```
#[derive(Debug)]
pub struct Engine<'s> {
    schema: &'s AnnotationSchema,
    trace: bool,
}

impl<'s> Engine<'s> {
    /// Creates an engine over the given annotation schema.
    pub fn new(schema: &'s AnnotationSchema) -> Self {
        Self {
            schema,
            trace: false,
        }
    }

    /// Enables or disables debug tracing of rule firings and writes.
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    /// Annotates the model: extracts and orders rules, applies each rule
    /// at every model position, then runs dependency inference.
    ///
    /// # Arguments
    ///
    /// * `spec` - The parsed specification to interpret
    /// * `model` - The model to annotate in place
    ///
    /// # Returns
    ///
    /// `Ok(())` once every rule and the dependency post-pass have run, or
    /// the first fatal error. On error the model may be partially
    /// annotated.
    pub fn run(&self, spec: &Specification, model: &mut Model) -> Result<(), Error> {
        let root = model.root().ok_or(Error::MissingApi)?;

        let rules = extract_rules(spec);
        if self.trace {
            for rule in &rules {
                debug!(priority = rule.priority, rule = %rule, "rule scheduled");
            }
        }

        for rule in &rules {
            self.apply_rule(rule, model, root)?;
        }

        depends::infer(model, root, self.trace);
        Ok(())
    }

    /// Applies one rule at one position, then at every descendant.
    ///
    /// # Arguments
    ///
    /// * `rule` - The rule to apply
    /// * `model` - The model being annotated
    /// * `node` - The position to match at; descendants are visited in
    ///   depth-first pre-order afterwards
    fn apply_rule(&self, rule: &Rule, model: &mut Model, node: NodeId) -> Result<(), Error> {
        let subject = Value::Node(node);
        let result: MatchResult = Matching::new(model).matches(&rule.matcher, &subject)?;

        if self.trace && result.is_match() {
            debug!(
                node = %model.display(node),
                bindings = result.matches().len(),
                rule = %rule,
                "rule matched"
            );
        }

        for env in result.matches() {
            let passed = match &rule.predicate {
                Some(code) => {
                    let text = code.interpolate(env, model)?;
                    interpreter::eval_predicate(&text, env, model)?
                }
                None => true,
            };
            if !passed {
                continue;
            }

            // The result descriptors run at the matched position and at
            // every entity the binding names; the schema's write gate
            // keeps annotations on the kinds they belong to.
            let mut targets = vec![node];
            for (_, value) in env.entries() {
                if let Value::Node(id) = value {
                    if !targets.contains(id) {
                        targets.push(*id);
                    }
                }
            }

            let applicator = Applicator::new(self.schema, self.trace);
            for target in targets {
                for descriptor in &rule.result_descriptors {
                    applicator.apply(model, descriptor, target, env)?;
                }
            }
        }

        for child in model.children(node) {
            self.apply_rule(rule, model, child)?;
        }
        Ok(())
    }
}

/// Lifts the specification into an ordered rule list: explicit rules
/// verbatim, free descriptors wrapped as implicit rules firing at the API
/// root only. The list is stably sorted by descending priority.
fn extract_rules(spec: &Specification) -> Vec<Rule> {
    let mut rules: Vec<Rule> = spec
        .declarations
        .iter()
        .map(|declaration| match declaration {
            Declaration::Rule(rule) => rule.clone(),
            Declaration::Descriptor(descriptor) => {
                Rule::new(Matcher::Block(MatchBlock::new().with_bind(SPEC_BIND)))
                    .with_predicate(Code::literal(format!(
                        "type_name({}) == \"API\"",
                        SPEC_BIND
                    )))
                    .with_result(descriptor.clone())
                    .with_span(descriptor.span)
            }
        })
        .collect();
    rules.sort_by_key(|rule| std::cmp::Reverse(rule.priority));
    rules
}
