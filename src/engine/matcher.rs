//! The recursive matcher: a matcher AST node against a model subject.
//!
//! Subjects are runtime values: model entities travel as [`Value::Node`],
//! and attribute values (names, flags, annotation payloads) are matched
//! with the same machinery. Matching never fails on absent attributes or
//! wrong entity kinds (those produce [`MatchResult::failure`]), but
//! malformed constructs (an unknown predicate, a match descriptor outside a
//! block) are fatal.
//!
//! Every block evaluation binds its subject: under the user's `bind` name
//! when given, otherwise under a fresh private key (`#1`, `#2`, …) so the
//! duplicate-entity check can reject a match that binds two block patterns
//! to one entity.

use crate::ast::{MatchBlock, MatchDescriptor, Matcher, Value as AstValue};
use crate::error::Error;
use crate::eval::{Environment, Value};
use crate::model::{Entity, Model, NodeId};

use super::binding::MatchResult;

/// One matching pass: carries the model and the private-key counter.
pub(crate) struct Matching<'m> {
    model: &'m Model,
    anon: usize,
}

impl<'m> Matching<'m> {
    pub(crate) fn new(model: &'m Model) -> Self {
        Self { model, anon: 0 }
    }

    fn fresh_key(&mut self) -> String {
        self.anon += 1;
        format!("#{}", self.anon)
    }

    /// Matches a matcher against a subject.
    pub(crate) fn matches(
        &mut self,
        matcher: &Matcher,
        subject: &Value,
    ) -> Result<MatchResult, Error> {
        match matcher {
            Matcher::Block(block) => self.match_block(block, subject),

            // Match descriptors are the children of a block; reaching one
            // here is a specification-toolchain bug, not a match failure.
            Matcher::Descriptor(md) => Err(Error::UnknownConstruct {
                construct: md.to_string(),
                message: "match descriptor outside a block".to_string(),
            }),

            Matcher::Bind(bind) => {
                let result = self.matches(&bind.child, subject)?;
                Ok(result.extend(&MatchResult::bind(bind.bind.clone(), subject.clone())))
            }

            Matcher::Any => Ok(MatchResult::success()),

            Matcher::String(pattern) => {
                let re = pattern.regex()?;
                Ok(MatchResult::from_bool(
                    re.is_match(&self.model.render(subject)),
                ))
            }

            Matcher::Value(value) => {
                let literal = value.value.eval(&Environment::new(), self.model)?;
                let wanted = self.model.render(&literal);
                let actual = self.model.render(subject);
                if wanted == actual {
                    return Ok(MatchResult::success());
                }
                // One-level courtesy: a type also matches by its
                // const-stripped spelling.
                if let Some(Entity::Type(t)) = self.subject_entity(subject) {
                    if let Some(nonconst) = t.nonconst {
                        if wanted == self.model.display(nonconst) {
                            return Ok(MatchResult::success());
                        }
                    }
                }
                Ok(MatchResult::failure())
            }

            Matcher::Predicate(predicate) => match predicate.name.as_str() {
                "pointer" => {
                    let inner = one_argument(matcher, &predicate.arguments)?;
                    match self.subject_entity(subject) {
                        Some(Entity::Type(t)) => match t.pointee {
                            Some(pointee) => self.matches(inner, &Value::Node(pointee)),
                            None => Ok(MatchResult::failure()),
                        },
                        _ => Ok(MatchResult::failure()),
                    }
                }
                "const" => {
                    let inner = one_argument(matcher, &predicate.arguments)?;
                    match self.subject_entity(subject) {
                        Some(Entity::Type(t)) if t.is_const => self.matches(inner, subject),
                        _ => Ok(MatchResult::failure()),
                    }
                }
                "nonconst" => {
                    let inner = one_argument(matcher, &predicate.arguments)?;
                    match self.subject_entity(subject) {
                        Some(Entity::Type(t)) if !t.is_const => self.matches(inner, subject),
                        _ => Ok(MatchResult::failure()),
                    }
                }
                "transferrable" => Ok(MatchResult::from_bool(matches!(
                    self.subject_entity(subject),
                    Some(Entity::Type(t)) if !t.nontransferrable
                ))),
                "not" => {
                    let inner = one_argument(matcher, &predicate.arguments)?;
                    let result = self.matches(inner, subject)?;
                    Ok(MatchResult::from_bool(!result.is_match()))
                }
                _ => Err(Error::UnknownConstruct {
                    construct: matcher.to_string(),
                    message: "unimplemented matcher predicate".to_string(),
                }),
            },
        }
    }

    /// Matches a block: fold the cross-product over its children, then
    /// bind the subject.
    ///
    /// Every child is matched even once the fold has collapsed to failure:
    /// a malformed later child must still surface its fatal error.
    fn match_block(&mut self, block: &MatchBlock, subject: &Value) -> Result<MatchResult, Error> {
        let mut result = MatchResult::success();
        for child in &block.children {
            result = result.extend(&self.match_subdescriptor(child, subject)?);
        }
        let key = match &block.bind {
            Some(name) => name.clone(),
            None => self.fresh_key(),
        };
        Ok(result.extend(&MatchResult::bind(key, subject.clone())))
    }

    /// Matches one block child in the scope of the subject: sub-object
    /// selection (`function`, `argument`, `element`, `field`), negation,
    /// or the named-attribute fallback.
    fn match_subdescriptor(
        &mut self,
        md: &MatchDescriptor,
        subject: &Value,
    ) -> Result<MatchResult, Error> {
        if md.name.matches("NOT") {
            let negated = self.match_block(&md.block, subject)?;
            return Ok(MatchResult::from_bool(!negated.is_match()));
        }

        if md.name.matches("function") {
            let functions = match self.subject_entity(subject) {
                Some(Entity::Api(api)) => api.functions.clone(),
                _ => return Ok(MatchResult::failure()),
            };
            return self.match_subobjects(md, &functions);
        }

        if md.name.matches("argument") {
            let arguments = match self.subject_entity(subject) {
                Some(Entity::Function(f)) => f.arguments.clone(),
                _ => return Ok(MatchResult::failure()),
            };
            return self.match_subobjects(md, &arguments);
        }

        if md.name.matches("element") {
            return match self.subject_entity(subject) {
                // At an argument, the element is the argument type's.
                Some(Entity::Argument(a)) => {
                    let ty = a.ty;
                    self.match_subdescriptor(md, &Value::Node(ty))
                }
                Some(Entity::Type(t)) => match t.pointee {
                    Some(pointee) => self.match_block(&md.block, &Value::Node(pointee)),
                    None => Ok(MatchResult::failure()),
                },
                _ => Ok(MatchResult::failure()),
            };
        }

        if md.name.matches("field") {
            let field_name = field_name_argument(md)?;
            return match self.subject_entity(subject) {
                Some(Entity::Type(t)) => match t.fields.get(&field_name) {
                    Some(&field_ty) => self.match_block(&md.block, &Value::Node(field_ty)),
                    None => Ok(MatchResult::failure()),
                },
                _ => Ok(MatchResult::failure()),
            };
        }

        self.match_attribute(md, subject)
    }

    /// The named-attribute fallback: match the descriptor's argument (or
    /// `true`, with no argument) against the subject's attribute of that
    /// name. At an argument, the same match is also tried against the
    /// argument's type and the results are unioned.
    fn match_attribute(
        &mut self,
        md: &MatchDescriptor,
        subject: &Value,
    ) -> Result<MatchResult, Error> {
        let name = md.name.name.as_str();

        let mut result = match subject.as_node() {
            // `type(…)` at a type matches the type itself.
            Some(id)
                if name == "type"
                    && md.arguments.len() == 1
                    && matches!(self.model.entity(id), Entity::Type(_)) =>
            {
                self.matches(&md.arguments[0], subject)?
            }
            Some(id) => match (self.model.attr(id, name), md.arguments.len()) {
                (Some(attr), 1) => self.matches(&md.arguments[0], &attr)?,
                (Some(attr), 0) => self.matches(&Matcher::value(AstValue::Bool(true)), &attr)?,
                _ => MatchResult::failure(),
            },
            // Scalar subjects have no attributes.
            None => MatchResult::failure(),
        };

        if let Some(Entity::Argument(a)) = self.subject_entity(subject) {
            let ty = a.ty;
            result = result.union(&self.match_subdescriptor(md, &Value::Node(ty))?);
        }

        Ok(result)
    }

    /// Folds the union over candidate sub-objects: for each, the name
    /// matcher against the candidate's name, crossed with the block
    /// against the candidate.
    fn match_subobjects(
        &mut self,
        md: &MatchDescriptor,
        objects: &[NodeId],
    ) -> Result<MatchResult, Error> {
        const ANY: Matcher = Matcher::Any;
        let name_matcher = match md.arguments.len() {
            0 => &ANY,
            1 => &md.arguments[0],
            _ => {
                return Err(Error::UnknownConstruct {
                    construct: md.to_string(),
                    message: "at most one name matcher expected".to_string(),
                })
            }
        };
        let mut result = MatchResult::failure();
        for &object in objects {
            let name = Value::Str(self.model.display(object));
            let name_match = self.matches(name_matcher, &name)?;
            let overall = name_match.extend(&self.match_block(&md.block, &Value::Node(object))?);
            result = result.union(&overall);
        }
        Ok(result)
    }

    fn subject_entity(&self, subject: &Value) -> Option<&'m Entity> {
        subject.as_node().map(|id| self.model.entity(id))
    }
}

fn one_argument<'a>(matcher: &Matcher, arguments: &'a [Matcher]) -> Result<&'a Matcher, Error> {
    match arguments {
        [inner] => Ok(inner),
        _ => Err(Error::UnknownConstruct {
            construct: matcher.to_string(),
            message: "exactly one matcher argument expected".to_string(),
        }),
    }
}

fn field_name_argument(md: &MatchDescriptor) -> Result<String, Error> {
    match md.arguments.first() {
        Some(Matcher::Value(v)) => match &v.value {
            AstValue::Id(id) => Ok(id.name.clone()),
            AstValue::String(s) => Ok(s.clone()),
            other => Err(Error::UnknownConstruct {
                construct: md.to_string(),
                message: format!("field name must be an identifier, found `{}`", other),
            }),
        },
        _ => Err(Error::UnknownConstruct {
            construct: md.to_string(),
            message: "field requires a name argument".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::MatchBlock;
    use crate::model::Type;

    /// API { cuMalloc(ptr: int *, size: int), cuFree(p: int *), mallocX() }
    fn sample() -> (Model, NodeId) {
        let mut model = Model::new();
        let api = model.add_api();
        let int = model.add_type(Type::new("int"));
        let int_ptr = model.add_type(Type::new("int *").with_pointee(int));
        let void = model.add_type(Type::new("void"));

        let cu_malloc = model.add_function(api, "cuMalloc", void);
        model.add_argument(cu_malloc, "ptr", int_ptr);
        model.add_argument(cu_malloc, "size", int);

        let cu_free = model.add_function(api, "cuFree", void);
        model.add_argument(cu_free, "p", int_ptr);

        model.add_function(api, "mallocX", void);
        (model, api)
    }

    fn match_at(model: &Model, matcher: &Matcher, subject: Value) -> MatchResult {
        Matching::new(model).matches(matcher, &subject).unwrap()
    }

    #[test]
    fn any_always_succeeds() {
        let (model, api) = sample();
        assert!(match_at(&model, &Matcher::Any, Value::Node(api)).is_match());
        assert!(match_at(&model, &Matcher::Any, Value::Int(3)).is_match());
    }

    #[test]
    fn string_matcher_is_full_string() {
        let (model, api) = sample();
        let matcher = Matcher::string("cu.*").unwrap();
        let f = model.entity(api);
        let first = match f {
            Entity::Api(api) => api.functions[0],
            _ => unreachable!(),
        };
        assert!(match_at(&model, &matcher, Value::Node(first)).is_match());
        // Substring hits do not count.
        let matcher = Matcher::string("Malloc").unwrap();
        assert!(!match_at(&model, &matcher, Value::Node(first)).is_match());
    }

    #[test]
    fn function_descriptor_folds_over_all_candidates() {
        let (model, api) = sample();
        let matcher = Matcher::Block(MatchBlock::new().with_child(
            MatchDescriptor::new("function").with_arg(Matcher::string("cu.*").unwrap()),
        ));
        let result = match_at(&model, &matcher, Value::Node(api));
        // One binding per cu* function.
        assert_eq!(result.matches().len(), 2);
    }

    #[test]
    fn function_descriptor_fails_off_api() {
        let (model, _) = sample();
        let matcher = Matcher::Block(MatchBlock::new().with_child(
            MatchDescriptor::new("function").with_arg(Matcher::Any),
        ));
        assert!(!match_at(&model, &matcher, Value::Int(0)).is_match());
    }

    #[test]
    fn block_bind_names_the_subject() {
        let (model, api) = sample();
        let matcher = Matcher::Block(
            MatchBlock::new().with_bind("root").with_child(
                MatchDescriptor::new("function")
                    .with_arg(Matcher::value(AstValue::id("mallocX"))),
            ),
        );
        let result = match_at(&model, &matcher, Value::Node(api));
        assert_eq!(result.matches().len(), 1);
        assert_eq!(
            result.matches()[0].lookup("root"),
            Some(&Value::Node(api))
        );
    }

    #[test]
    fn inner_block_bind_names_the_matched_function() {
        let (model, api) = sample();
        let matcher = Matcher::Block(MatchBlock::new().with_child(
            MatchDescriptor::new("function")
                .with_arg(Matcher::string("cuFree").unwrap())
                .with_block(MatchBlock::new().with_bind("f")),
        ));
        let result = match_at(&model, &matcher, Value::Node(api));
        assert_eq!(result.matches().len(), 1);
        let bound = result.matches()[0].lookup("f").unwrap();
        assert_eq!(model.render(bound), "cuFree");
    }

    #[test]
    fn duplicate_entity_bindings_collapse() {
        let (model, api) = sample();
        // Two block patterns that can both select cuMalloc: the merged
        // binding naming it twice is rejected, the disjoint one survives.
        let matcher = Matcher::Block(
            MatchBlock::new()
                .with_child(
                    MatchDescriptor::new("function")
                        .with_arg(Matcher::value(AstValue::id("cuMalloc")))
                        .with_block(MatchBlock::new().with_bind("x")),
                )
                .with_child(
                    MatchDescriptor::new("function")
                        .with_arg(Matcher::string("cu.*").unwrap())
                        .with_block(MatchBlock::new().with_bind("y")),
                ),
        );
        let result = match_at(&model, &matcher, Value::Node(api));
        assert_eq!(result.matches().len(), 1);
        let env = &result.matches()[0];
        assert_eq!(model.render(env.lookup("x").unwrap()), "cuMalloc");
        assert_eq!(model.render(env.lookup("y").unwrap()), "cuFree");
    }

    #[test]
    fn pointer_and_const_predicates() {
        let mut model = Model::new();
        let int = model.add_type(Type::new("int"));
        let const_int = model.add_type(Type::new("const int").constant().with_nonconst(int));
        let const_int_ptr = model.add_type(Type::new("const int *").with_pointee(const_int));

        let matcher = Matcher::predicate(
            "pointer",
            vec![Matcher::predicate("const", vec![Matcher::Any])],
        );
        assert!(match_at(&model, &matcher, Value::Node(const_int_ptr)).is_match());
        assert!(!match_at(&model, &matcher, Value::Node(int)).is_match());
        assert!(!match_at(&model, &matcher, Value::Node(const_int)).is_match());

        let matcher = Matcher::predicate("nonconst", vec![Matcher::Any]);
        assert!(match_at(&model, &matcher, Value::Node(int)).is_match());
        assert!(!match_at(&model, &matcher, Value::Node(const_int)).is_match());
    }

    #[test]
    fn transferrable_predicate_reads_the_type_flag() {
        let mut model = Model::new();
        let plain = model.add_type(Type::new("int"));
        let pinned = model.add_type(Type::new("handle_t").nontransferrable());
        let matcher = Matcher::predicate("transferrable", vec![]);
        assert!(match_at(&model, &matcher, Value::Node(plain)).is_match());
        assert!(!match_at(&model, &matcher, Value::Node(pinned)).is_match());
    }

    #[test]
    fn not_predicate_negates_and_discards_bindings() {
        let (model, api) = sample();
        let matcher = Matcher::predicate(
            "not",
            vec![Matcher::Bind(crate::ast::MatcherBind {
                bind: "x".to_string(),
                child: Box::new(Matcher::string("API").unwrap()),
            })],
        );
        let result = match_at(&model, &matcher, Value::Node(api));
        assert!(!result.is_match());

        let matcher = Matcher::predicate("not", vec![Matcher::string("nope").unwrap()]);
        let result = match_at(&model, &matcher, Value::Node(api));
        assert!(result.is_match());
        assert!(result.matches()[0].is_empty());
    }

    #[test]
    fn value_matcher_accepts_nonconst_spelling_of_types() {
        let mut model = Model::new();
        let int = model.add_type(Type::new("int"));
        let const_int = model.add_type(Type::new("const int").constant().with_nonconst(int));
        let matcher = Matcher::value(AstValue::id("int"));
        assert!(match_at(&model, &matcher, Value::Node(const_int)).is_match());
        assert!(match_at(&model, &matcher, Value::Node(int)).is_match());
        let matcher = Matcher::value(AstValue::id("float"));
        assert!(!match_at(&model, &matcher, Value::Node(const_int)).is_match());
    }

    #[test]
    fn attribute_fallback_matches_through_arguments() {
        let (model, api) = sample();
        let functions = match model.entity(api) {
            Entity::Api(a) => a.functions.clone(),
            _ => unreachable!(),
        };
        let cu_malloc_args = match model.entity(functions[0]) {
            Entity::Function(f) => f.arguments.clone(),
            _ => unreachable!(),
        };
        let ptr_arg = cu_malloc_args[0];

        // type(pointer(_)) at an argument reaches the argument's type.
        let md = MatchDescriptor::new("type")
            .with_arg(Matcher::predicate("pointer", vec![Matcher::Any]));
        let matcher = Matcher::Block(MatchBlock::new().with_child(md));
        assert!(match_at(&model, &matcher, Value::Node(ptr_arg)).is_match());

        // name(size) fails on ptr, matches on size.
        let md = MatchDescriptor::new("name").with_arg(Matcher::value(AstValue::id("size")));
        let matcher = Matcher::Block(MatchBlock::new().with_child(md));
        assert!(!match_at(&model, &matcher, Value::Node(ptr_arg)).is_match());
        assert!(match_at(&model, &matcher, Value::Node(cu_malloc_args[1])).is_match());
    }

    #[test]
    fn missing_attributes_fail_quietly() {
        let (model, api) = sample();
        let md = MatchDescriptor::new("no_such_attr").with_arg(Matcher::Any);
        let matcher = Matcher::Block(MatchBlock::new().with_child(md));
        assert!(!match_at(&model, &matcher, Value::Node(api)).is_match());
    }

    #[test]
    fn zero_argument_attribute_tests_truthiness() {
        let mut model = Model::new();
        let ty = model.add_type(Type::new("const int").constant());
        let md = MatchDescriptor::new("is_const");
        let matcher = Matcher::Block(MatchBlock::new().with_child(md));
        assert!(match_at(&model, &matcher, Value::Node(ty)).is_match());

        let plain = model.add_type(Type::new("int"));
        let md = MatchDescriptor::new("is_const");
        let matcher = Matcher::Block(MatchBlock::new().with_child(md));
        assert!(!match_at(&model, &matcher, Value::Node(plain)).is_match());
    }

    #[test]
    fn element_reaches_pointees_from_types_and_arguments() {
        let (model, api) = sample();
        let functions = match model.entity(api) {
            Entity::Api(a) => a.functions.clone(),
            _ => unreachable!(),
        };
        let args = match model.entity(functions[1]) {
            Entity::Function(f) => f.arguments.clone(),
            _ => unreachable!(),
        };
        let p = args[0]; // p: int *

        let md = MatchDescriptor::new("element").with_block(
            MatchBlock::new().with_child(
                MatchDescriptor::new("spelling").with_arg(Matcher::value(AstValue::id("int"))),
            ),
        );
        let matcher = Matcher::Block(MatchBlock::new().with_child(md.clone()));
        assert!(match_at(&model, &matcher, Value::Node(p)).is_match());

        // Directly at a non-pointer type it fails.
        let int_args = match model.entity(functions[0]) {
            Entity::Function(f) => f.arguments.clone(),
            _ => unreachable!(),
        };
        let matcher = Matcher::Block(MatchBlock::new().with_child(md));
        let size = int_args[1];
        assert!(!match_at(&model, &matcher, Value::Node(size)).is_match());
    }

    #[test]
    fn not_descriptor_inverts_a_block() {
        let (model, api) = sample();
        let matcher = Matcher::Block(MatchBlock::new().with_child(
            MatchDescriptor::new("NOT").with_block(MatchBlock::new().with_child(
                MatchDescriptor::new("function").with_arg(Matcher::string("cu.*").unwrap()),
            )),
        ));
        // The API does have cu* functions, so NOT fails.
        assert!(!match_at(&model, &matcher, Value::Node(api)).is_match());
    }

    #[test]
    fn field_selects_struct_fields_and_misses_quietly() {
        let mut model = Model::new();
        let int = model.add_type(Type::new("int"));
        let s = model.add_type(Type::new("struct buf").with_field("len", int));

        let md = MatchDescriptor::new("field")
            .with_arg(Matcher::value(AstValue::id("len")))
            .with_block(MatchBlock::new().with_child(
                MatchDescriptor::new("spelling").with_arg(Matcher::value(AstValue::id("int"))),
            ));
        let matcher = Matcher::Block(MatchBlock::new().with_child(md));
        assert!(match_at(&model, &matcher, Value::Node(s)).is_match());

        let md = MatchDescriptor::new("field")
            .with_arg(Matcher::value(AstValue::id("cap")))
            .with_block(MatchBlock::new());
        let matcher = Matcher::Block(MatchBlock::new().with_child(md));
        assert!(!match_at(&model, &matcher, Value::Node(s)).is_match());
    }

    #[test]
    fn malformed_later_children_error_even_after_a_failed_child() {
        let (model, api) = sample();
        // The first child fails to match; the second is malformed (`field`
        // without a name argument) and must still be fatal.
        let matcher = Matcher::Block(
            MatchBlock::new()
                .with_child(
                    MatchDescriptor::new("function")
                        .with_arg(Matcher::string("nomatch").unwrap()),
                )
                .with_child(MatchDescriptor::new("field")),
        );
        let err = Matching::new(&model)
            .matches(&matcher, &Value::Node(api))
            .unwrap_err();
        assert!(matches!(err, Error::UnknownConstruct { .. }));
    }

    #[test]
    fn top_level_match_descriptor_is_fatal() {
        let (model, api) = sample();
        let matcher = Matcher::Descriptor(MatchDescriptor::new("function"));
        let err = Matching::new(&model)
            .matches(&matcher, &Value::Node(api))
            .unwrap_err();
        assert!(matches!(err, Error::UnknownConstruct { .. }));
    }

    #[test]
    fn unknown_predicate_is_fatal() {
        let (model, api) = sample();
        let matcher = Matcher::predicate("opaque", vec![]);
        let err = Matching::new(&model)
            .matches(&matcher, &Value::Node(api))
            .unwrap_err();
        assert!(matches!(err, Error::UnknownConstruct { .. }));
    }
}
