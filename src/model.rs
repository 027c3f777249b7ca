//! The C API model graph.
//!
//! The model is produced by an external C header parser and mutated in
//! place by the annotation engine. Entities live in a [`Model`] arena and
//! reference each other by [`NodeId`]; identity is id equality, which is
//! what the duplicate-binding check and the dependency pass's visited set
//! rely on.
//!
//! The graph is a tree with one back-edge convention: a type may reference
//! its const-stripped twin via `nonconst`, which is not owned and never
//! traversed.
//!
//! Every entity carries an open annotation bag alongside its typed fields.
//! The uniform [`Model::attr`] accessor resolves typed fields first, then
//! the bag; [`Model::set_annotation`] writes the bag, with two structural
//! special cases (`nontransferrable` on types, `depends_on` on arguments).

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::eval::Value;

/// Identity of a model entity: an index into the model arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NodeId(usize);

impl NodeId {
    /// Wraps a raw arena index.
    pub fn from_raw(index: usize) -> Self {
        Self(index)
    }

    /// Returns the raw arena index.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The kind of a model entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum EntityKind {
    /// The API root
    Api,
    /// A function
    Function,
    /// A function parameter
    Argument,
    /// A C type
    Type,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Api => write!(f, "API"),
            EntityKind::Function => write!(f, "Function"),
            EntityKind::Argument => write!(f, "Argument"),
            EntityKind::Type => write!(f, "Type"),
        }
    }
}

/// The API root: the set of functions exported by a header.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Api {
    /// All functions, in declaration order
    pub functions: Vec<NodeId>,
    /// Open annotation bag
    pub annotations: BTreeMap<String, Value>,
}

/// A function of the API.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Function {
    /// The function name
    pub name: String,
    /// Parameters, in declaration order (reordered by the dependency pass)
    pub arguments: Vec<NodeId>,
    /// The return type
    pub return_value: NodeId,
    /// Open annotation bag
    pub annotations: BTreeMap<String, Value>,
}

/// A function parameter.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Argument {
    /// The parameter name
    pub name: String,
    /// The parameter type
    pub ty: NodeId,
    /// Names of sibling parameters this one depends on
    pub depends_on: BTreeSet<String>,
    /// Open annotation bag
    pub annotations: BTreeMap<String, Value>,
}

/// A C type.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Type {
    /// The C spelling of the type, its stable printed form
    pub spelling: String,
    /// Whether the outermost type is const-qualified
    pub is_const: bool,
    /// Whether values of this type may not cross the API boundary
    pub nontransferrable: bool,
    /// The pointed-to type, for pointer types
    pub pointee: Option<NodeId>,
    /// Back-edge to the const-stripped twin; never traversed
    pub nonconst: Option<NodeId>,
    /// Struct fields, name to field type
    pub fields: BTreeMap<String, NodeId>,
    /// Open annotation bag
    pub annotations: BTreeMap<String, Value>,
}

impl Type {
    /// Creates a type with the given C spelling and no structure.
    pub fn new(spelling: impl Into<String>) -> Self {
        Self {
            spelling: spelling.into(),
            is_const: false,
            nontransferrable: false,
            pointee: None,
            nonconst: None,
            fields: BTreeMap::new(),
            annotations: BTreeMap::new(),
        }
    }

    /// Marks the type const-qualified.
    pub fn constant(mut self) -> Self {
        self.is_const = true;
        self
    }

    /// Marks the type nontransferrable.
    pub fn nontransferrable(mut self) -> Self {
        self.nontransferrable = true;
        self
    }

    /// Sets the pointee type.
    pub fn with_pointee(mut self, pointee: NodeId) -> Self {
        self.pointee = Some(pointee);
        self
    }

    /// Sets the const-stripped twin.
    pub fn with_nonconst(mut self, nonconst: NodeId) -> Self {
        self.nonconst = Some(nonconst);
        self
    }

    /// Adds a struct field.
    pub fn with_field(mut self, name: impl Into<String>, ty: NodeId) -> Self {
        self.fields.insert(name.into(), ty);
        self
    }
}

/// A model entity: one node of the API graph.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Entity {
    /// The API root
    Api(Api),
    /// A function
    Function(Function),
    /// A function parameter
    Argument(Argument),
    /// A C type
    Type(Type),
}

impl Entity {
    /// Returns the entity's kind.
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Api(_) => EntityKind::Api,
            Entity::Function(_) => EntityKind::Function,
            Entity::Argument(_) => EntityKind::Argument,
            Entity::Type(_) => EntityKind::Type,
        }
    }

    /// The entity's annotation bag.
    pub fn annotations(&self) -> &BTreeMap<String, Value> {
        match self {
            Entity::Api(api) => &api.annotations,
            Entity::Function(f) => &f.annotations,
            Entity::Argument(a) => &a.annotations,
            Entity::Type(t) => &t.annotations,
        }
    }

    fn annotations_mut(&mut self) -> &mut BTreeMap<String, Value> {
        match self {
            Entity::Api(api) => &mut api.annotations,
            Entity::Function(f) => &mut f.annotations,
            Entity::Argument(a) => &mut a.annotations,
            Entity::Type(t) => &mut t.annotations,
        }
    }
}

/// The model arena: all entities of one parsed API.
///
/// The external header parser constructs the model bottom-up (types first,
/// then arguments and functions, then the API root); the engine only
/// mutates annotation bags, dependency sets, and argument order.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Model {
    nodes: Vec<Entity>,
    api: Option<NodeId>,
}

impl Model {
    /// Creates an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entity and returns its id. An [`Entity::Api`] becomes the
    /// model root (the first one wins).
    pub fn add(&mut self, entity: Entity) -> NodeId {
        let id = NodeId(self.nodes.len());
        if matches!(entity, Entity::Api(_)) && self.api.is_none() {
            self.api = Some(id);
        }
        self.nodes.push(entity);
        id
    }

    /// Adds the API root.
    pub fn add_api(&mut self) -> NodeId {
        self.add(Entity::Api(Api::default()))
    }

    /// Adds a type.
    pub fn add_type(&mut self, ty: Type) -> NodeId {
        self.add(Entity::Type(ty))
    }

    /// Adds a function to the API root and returns its id.
    pub fn add_function(
        &mut self,
        api: NodeId,
        name: impl Into<String>,
        return_value: NodeId,
    ) -> NodeId {
        let id = self.add(Entity::Function(Function {
            name: name.into(),
            arguments: Vec::new(),
            return_value,
            annotations: BTreeMap::new(),
        }));
        if let Entity::Api(api) = &mut self.nodes[api.0] {
            api.functions.push(id);
        }
        id
    }

    /// Adds an argument to a function and returns its id.
    pub fn add_argument(
        &mut self,
        function: NodeId,
        name: impl Into<String>,
        ty: NodeId,
    ) -> NodeId {
        let id = self.add(Entity::Argument(Argument {
            name: name.into(),
            ty,
            depends_on: BTreeSet::new(),
            annotations: BTreeMap::new(),
        }));
        if let Entity::Function(f) = &mut self.nodes[function.0] {
            f.arguments.push(id);
        }
        id
    }

    /// The API root, if the model has one.
    pub fn root(&self) -> Option<NodeId> {
        self.api
    }

    /// Number of entities in the model.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if the model has no entities.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Borrows an entity.
    pub fn entity(&self, id: NodeId) -> &Entity {
        &self.nodes[id.0]
    }

    /// Mutably borrows an entity.
    pub fn entity_mut(&mut self, id: NodeId) -> &mut Entity {
        &mut self.nodes[id.0]
    }

    /// Returns an entity's kind.
    pub fn kind(&self, id: NodeId) -> EntityKind {
        self.entity(id).kind()
    }

    /// The stable printed form of an entity: `API` for the root, names for
    /// functions and arguments, the C spelling for types.
    pub fn display(&self, id: NodeId) -> String {
        match self.entity(id) {
            Entity::Api(_) => "API".to_string(),
            Entity::Function(f) => f.name.clone(),
            Entity::Argument(a) => a.name.clone(),
            Entity::Type(t) => t.spelling.clone(),
        }
    }

    /// Renders a runtime value, printing entity references by their
    /// printed form.
    pub fn render(&self, value: &Value) -> String {
        match value {
            Value::Node(id) => self.display(*id),
            Value::List(items) => {
                let rendered: Vec<String> = items.iter().map(|v| self.render(v)).collect();
                format!("[{}]", rendered.join(", "))
            }
            other => other.to_string(),
        }
    }

    /// Uniform attribute access: typed fields first, then the annotation
    /// bag.
    ///
    /// # Arguments
    ///
    /// * `id` - The entity to read
    /// * `name` - The attribute name (a typed field such as `pointee`, or
    ///   any annotation name)
    ///
    /// # Returns
    ///
    /// The attribute value, or `None` when the entity carries no such
    /// attribute. Absence is never an error; the matcher turns it into a
    /// plain match failure.
    pub fn attr(&self, id: NodeId, name: &str) -> Option<Value> {
        let typed = match self.entity(id) {
            Entity::Api(api) => match name {
                "functions" => Some(Value::List(
                    api.functions.iter().copied().map(Value::Node).collect(),
                )),
                _ => None,
            },
            Entity::Function(f) => match name {
                "name" => Some(Value::Str(f.name.clone())),
                "arguments" => Some(Value::List(
                    f.arguments.iter().copied().map(Value::Node).collect(),
                )),
                "return_value" => Some(Value::Node(f.return_value)),
                _ => None,
            },
            Entity::Argument(a) => match name {
                "name" => Some(Value::Str(a.name.clone())),
                "type" => Some(Value::Node(a.ty)),
                "depends_on" => Some(Value::List(
                    a.depends_on.iter().cloned().map(Value::Str).collect(),
                )),
                _ => None,
            },
            Entity::Type(t) => match name {
                "spelling" => Some(Value::Str(t.spelling.clone())),
                "is_const" => Some(Value::Bool(t.is_const)),
                "nontransferrable" => Some(Value::Bool(t.nontransferrable)),
                "pointee" => t.pointee.map(Value::Node),
                "nonconst" => Some(Value::Node(t.nonconst.unwrap_or(id))),
                "fields" => Some(Value::List(
                    t.fields.values().copied().map(Value::Node).collect(),
                )),
                _ => None,
            },
        };
        typed.or_else(|| self.entity(id).annotations().get(name).cloned())
    }

    /// Writes an annotation.
    ///
    /// `nontransferrable` on a type updates the typed flag (the
    /// `transferrable` matcher predicate reads it); `depends_on` on an
    /// argument replaces the dependency set. Everything else lands in the
    /// entity's annotation bag.
    pub fn set_annotation(&mut self, id: NodeId, name: &str, value: Value) {
        match self.entity_mut(id) {
            Entity::Type(t) if name == "nontransferrable" => {
                t.nontransferrable = value.is_truthy();
            }
            Entity::Argument(a) if name == "depends_on" => {
                a.depends_on = match value {
                    Value::List(items) => items.iter().map(|v| v.to_string()).collect(),
                    other => std::iter::once(other.to_string()).collect(),
                };
            }
            entity => {
                entity.annotations_mut().insert(name.to_string(), value);
            }
        }
    }

    /// Adds a name to an argument's dependency set. No-op on other kinds.
    pub fn add_depends_on(&mut self, id: NodeId, name: impl Into<String>) {
        if let Entity::Argument(a) = self.entity_mut(id) {
            a.depends_on.insert(name.into());
        }
    }

    /// Child entities in traversal order: functions of the API; arguments
    /// then return value of a function; the type of an argument; pointee
    /// then fields (in name order) of a type. The `nonconst` back-edge is
    /// not a child.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        match self.entity(id) {
            Entity::Api(api) => api.functions.clone(),
            Entity::Function(f) => {
                let mut out = f.arguments.clone();
                out.push(f.return_value);
                out
            }
            Entity::Argument(a) => vec![a.ty],
            Entity::Type(t) => {
                let mut out = Vec::new();
                if let Some(pointee) = t.pointee {
                    out.push(pointee);
                }
                out.extend(t.fields.values().copied());
                out
            }
        }
    }

    /// Reorders a function's arguments so dependencies precede dependents.
    ///
    /// The sort is a stable topological one: each round takes, in current
    /// order, every argument whose in-function dependencies are already
    /// placed. A dependency cycle leaves the remaining arguments in their
    /// current order (cycles are the header parser's concern).
    ///
    /// # Arguments
    ///
    /// * `function` - The function whose argument list to reorder; no-op
    ///   for ids of other entity kinds
    pub fn sort_arguments(&mut self, function: NodeId) {
        let arg_ids = match self.entity(function) {
            Entity::Function(f) => f.arguments.clone(),
            _ => return,
        };
        let names: Vec<String> = arg_ids
            .iter()
            .map(|&id| match self.entity(id) {
                Entity::Argument(a) => a.name.clone(),
                _ => String::new(),
            })
            .collect();
        let sibling_names: BTreeSet<&str> = names.iter().map(|n| n.as_str()).collect();
        let deps: Vec<BTreeSet<String>> = arg_ids
            .iter()
            .map(|&id| match self.entity(id) {
                Entity::Argument(a) => a
                    .depends_on
                    .iter()
                    .filter(|n| sibling_names.contains(n.as_str()))
                    .cloned()
                    .collect(),
                _ => BTreeSet::new(),
            })
            .collect();

        let mut placed: BTreeSet<String> = BTreeSet::new();
        let mut remaining: Vec<usize> = (0..arg_ids.len()).collect();
        let mut order: Vec<usize> = Vec::with_capacity(arg_ids.len());
        while !remaining.is_empty() {
            let (ready, blocked): (Vec<usize>, Vec<usize>) = remaining
                .iter()
                .copied()
                .partition(|&i| deps[i].iter().all(|d| placed.contains(d)));
            if ready.is_empty() {
                // Cycle: keep the rest as-is.
                order.extend(blocked);
                break;
            }
            for &i in &ready {
                placed.insert(names[i].clone());
            }
            order.extend(ready);
            remaining = blocked;
        }

        let sorted: Vec<NodeId> = order.into_iter().map(|i| arg_ids[i]).collect();
        if let Entity::Function(f) = self.entity_mut(function) {
            f.arguments = sorted;
        }
    }
}
