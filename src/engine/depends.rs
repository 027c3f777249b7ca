//! The dependency inference post-pass.
//!
//! After every rule has run, each argument's reachable embedded code is
//! scanned for textual occurrences of its sibling arguments' names; hits
//! become `depends_on` entries, and each function's arguments are then
//! reordered so dependencies precede dependents.
//!
//! The walk from an argument covers its annotation bag and its type
//! subtree (annotations, pointee, fields, recursively), with a visited set
//! keyed by entity identity. The `nonconst` back-edge is never followed.

use std::collections::HashSet;

use tracing::debug;

use crate::eval::Value;
use crate::model::{Entity, Model, NodeId};

/// Runs dependency inference over every function of the API, then sorts
/// each function's arguments.
pub(crate) fn infer(model: &mut Model, api: NodeId, trace: bool) {
    let functions = match model.entity(api) {
        Entity::Api(api) => api.functions.clone(),
        _ => return,
    };

    for function in functions {
        let arguments = match model.entity(function) {
            Entity::Function(f) => f.arguments.clone(),
            _ => continue,
        };
        let names: Vec<String> = arguments
            .iter()
            .map(|&a| model.display(a))
            .collect();

        for (i, &argument) in arguments.iter().enumerate() {
            let code = collect_code(model, argument);
            if code.is_empty() {
                continue;
            }
            for (j, sibling) in names.iter().enumerate() {
                if i == j || sibling.is_empty() {
                    continue;
                }
                if code.iter().any(|fragment| fragment.contains(sibling)) {
                    if trace {
                        debug!(
                            function = %model.display(function),
                            argument = %names[i],
                            depends_on = %sibling,
                            "inferred dependency"
                        );
                    }
                    model.add_depends_on(argument, sibling.clone());
                }
            }
        }

        model.sort_arguments(function);
    }
}

/// All embedded code strings reachable from an argument.
fn collect_code(model: &Model, argument: NodeId) -> Vec<String> {
    let mut visited = HashSet::new();
    let mut code = Vec::new();
    walk(model, argument, &mut visited, &mut code);
    code
}

fn walk(model: &Model, id: NodeId, visited: &mut HashSet<NodeId>, code: &mut Vec<String>) {
    if !visited.insert(id) {
        return;
    }
    for value in model.entity(id).annotations().values() {
        collect_value(value, code);
    }
    match model.entity(id) {
        Entity::Argument(a) => walk(model, a.ty, visited, code),
        Entity::Type(t) => {
            if let Some(pointee) = t.pointee {
                walk(model, pointee, visited, code);
            }
            for &field in t.fields.values() {
                walk(model, field, visited, code);
            }
            // The nonconst back-edge stays unexplored.
        }
        _ => {}
    }
}

fn collect_value(value: &Value, code: &mut Vec<String>) {
    match value {
        Value::Code(text) => code.push(text.clone()),
        Value::List(items) => {
            for item in items {
                collect_value(item, code);
            }
        }
        _ => {}
    }
}
