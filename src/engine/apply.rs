//! The descriptor applicator: writes annotations into the model.
//!
//! Reserved descriptor names (`at`, `function`, `argument`, `field`,
//! `element`) navigate to a sub-position and never write; applying one at
//! an entity kind it cannot navigate is fatal, as is naming a function,
//! argument, or field the model does not contain.
//!
//! Every other name is an annotation write, gated by the schema: the write
//! happens when the name is expected on the target's kind or unknown to the
//! schema entirely, so a rule firing at entities of several kinds annotates
//! only where the name belongs. Writes on an argument re-apply to the
//! argument's type, letting type-level annotations be written at the
//! argument position.

use tracing::debug;

use crate::ast::{Descriptor, Value as AstValue};
use crate::error::Error;
use crate::eval::{Environment, Value};
use crate::model::{Entity, Model, NodeId};
use crate::schema::AnnotationSchema;

/// Applies descriptors in a binding context.
pub(crate) struct Applicator<'s> {
    schema: &'s AnnotationSchema,
    trace: bool,
}

impl<'s> Applicator<'s> {
    pub(crate) fn new(schema: &'s AnnotationSchema, trace: bool) -> Self {
        Self { schema, trace }
    }

    /// Applies one descriptor at a target entity.
    pub(crate) fn apply(
        &self,
        model: &mut Model,
        descriptor: &Descriptor,
        target: NodeId,
        env: &Environment,
    ) -> Result<(), Error> {
        if descriptor.name.matches("at") {
            let argument = self.one_argument(descriptor)?;
            let value = argument.eval(env, model)?;
            let node = value.as_node().ok_or_else(|| Error::SchemaViolation {
                descriptor: descriptor.to_string(),
                span: descriptor.span,
                message: format!("`at` target must be a model entity, found {}", value),
            })?;
            return self.apply_subdescriptors(model, descriptor, node, env);
        }

        if descriptor.name.matches("function") {
            let functions = match model.entity(target) {
                Entity::Api(api) => api.functions.clone(),
                other => return Err(self.mismatch(descriptor, other)),
            };
            let name = self.literal_name(descriptor)?;
            let function = functions
                .iter()
                .copied()
                .find(|&f| model.display(f) == name)
                .ok_or_else(|| self.lookup(descriptor, "function", &name))?;
            return self.apply_subdescriptors(model, descriptor, function, env);
        }

        if descriptor.name.matches("argument") {
            let arguments = match model.entity(target) {
                Entity::Function(f) => f.arguments.clone(),
                other => return Err(self.mismatch(descriptor, other)),
            };
            let name = self.evaluated_name(descriptor, env, model)?;
            let argument = arguments
                .iter()
                .copied()
                .find(|&a| model.display(a) == name)
                .ok_or_else(|| self.lookup(descriptor, "argument", &name))?;
            return self.apply_subdescriptors(model, descriptor, argument, env);
        }

        if descriptor.name.matches("field") {
            let fields = match model.entity(target) {
                Entity::Type(t) => t.fields.clone(),
                other => return Err(self.mismatch(descriptor, other)),
            };
            let name = self.evaluated_name(descriptor, env, model)?;
            let field = fields
                .get(&name)
                .copied()
                .ok_or_else(|| self.lookup(descriptor, "field", &name))?;
            return self.apply_subdescriptors(model, descriptor, field, env);
        }

        if descriptor.name.matches("element") {
            let pointee = match model.entity(target) {
                Entity::Type(t) => t.pointee,
                other => return Err(self.mismatch(descriptor, other)),
            };
            let element = pointee
                .ok_or_else(|| self.lookup(descriptor, "element", &model.display(target)))?;
            return self.apply_subdescriptors(model, descriptor, element, env);
        }

        self.write_annotation(model, descriptor, target, env)
    }

    /// A named annotation write, schema-gated.
    fn write_annotation(
        &self,
        model: &mut Model,
        descriptor: &Descriptor,
        target: NodeId,
        env: &Environment,
    ) -> Result<(), Error> {
        let name = descriptor.name.name.as_str();
        let value = match descriptor.arguments.as_slice() {
            [] => Value::Bool(true),
            [argument] => argument.eval(env, model)?,
            _ => {
                return Err(Error::SchemaViolation {
                    descriptor: descriptor.to_string(),
                    span: descriptor.span,
                    message: "an annotation write takes at most one argument".to_string(),
                })
            }
        };

        let kind = model.kind(target);
        if self.schema.should_set(kind, name) {
            let value = self.schema.normalize(name, value)?;
            if self.trace {
                debug!(
                    annotation = name,
                    target = %model.display(target),
                    value = %model.render(&value),
                    "annotation write"
                );
            }
            model.set_annotation(target, name, value);
        }

        // Annotations written at an argument also target its type.
        if let Entity::Argument(a) = model.entity(target) {
            let ty = a.ty;
            self.apply(model, descriptor, ty, env)?;
        }

        Ok(())
    }

    fn apply_subdescriptors(
        &self,
        model: &mut Model,
        descriptor: &Descriptor,
        target: NodeId,
        env: &Environment,
    ) -> Result<(), Error> {
        for sub in &descriptor.subdescriptors {
            self.apply(model, sub, target, env)?;
        }
        Ok(())
    }

    /// The single argument of a navigating descriptor.
    fn one_argument<'d>(&self, descriptor: &'d Descriptor) -> Result<&'d AstValue, Error> {
        match descriptor.arguments.as_slice() {
            [argument] => Ok(argument),
            _ => Err(Error::SchemaViolation {
                descriptor: descriptor.to_string(),
                span: descriptor.span,
                message: "exactly one argument expected".to_string(),
            }),
        }
    }

    /// A name given literally (identifier or string), not evaluated.
    fn literal_name(&self, descriptor: &Descriptor) -> Result<String, Error> {
        match self.one_argument(descriptor)? {
            AstValue::Id(id) => Ok(id.name.clone()),
            AstValue::String(s) => Ok(s.clone()),
            other => Err(Error::SchemaViolation {
                descriptor: descriptor.to_string(),
                span: descriptor.span,
                message: format!("expected a name, found `{}`", other),
            }),
        }
    }

    /// A name computed in the binding context.
    fn evaluated_name(
        &self,
        descriptor: &Descriptor,
        env: &Environment,
        model: &Model,
    ) -> Result<String, Error> {
        let value = self.one_argument(descriptor)?.eval(env, model)?;
        Ok(model.render(&value))
    }

    fn mismatch(&self, descriptor: &Descriptor, entity: &Entity) -> Error {
        Error::DescriptorMismatch {
            descriptor: descriptor.to_string(),
            span: descriptor.span,
            kind: entity.kind(),
        }
    }

    fn lookup(&self, descriptor: &Descriptor, kind: &'static str, name: &str) -> Error {
        Error::Lookup {
            descriptor: descriptor.to_string(),
            span: descriptor.span,
            kind,
            name: name.to_string(),
        }
    }
}
