//! The binding algebra of match results.
//!
//! A [`MatchResult`] is a set of bindings (environments). The algebra has
//! two operators: `*` extends every binding on the left with every binding
//! on the right (a cross-product, with the right side winning key
//! conflicts), and `|` unions two result sets. [`MatchResult::failure`] is
//! the zero of `*` and the unit of `|`, so matching a conjunctive block is
//! a left-fold of `*` over its children and matching across candidate
//! sub-objects is a fold of `|`.
//!
//! The cross-product drops merged bindings in which one model entity is
//! bound under two distinct keys: a single match may not bind two block
//! patterns to the same entity.

use std::collections::HashMap;
use std::ops::{BitOr, Mul};

use crate::eval::{Environment, Value};
use crate::model::NodeId;

/// A set of bindings produced by matching.
///
/// Truthiness is non-emptiness: a matcher failed exactly when its result
/// holds no bindings.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MatchResult {
    matches: Vec<Environment>,
}

impl MatchResult {
    /// The match that succeeded with nothing bound: a singleton set
    /// holding the empty binding.
    pub fn success() -> Self {
        Self {
            matches: vec![Environment::new()],
        }
    }

    /// The failed match: the empty set.
    pub fn failure() -> Self {
        Self::default()
    }

    /// `success` or `failure` from a boolean test.
    pub fn from_bool(matched: bool) -> Self {
        if matched {
            Self::success()
        } else {
            Self::failure()
        }
    }

    /// A single-binding result.
    pub fn singleton(binding: Environment) -> Self {
        Self {
            matches: vec![binding],
        }
    }

    /// A single-binding result with one name bound.
    pub fn bind(name: impl Into<String>, value: Value) -> Self {
        let mut env = Environment::new();
        env.bind(name, value);
        Self::singleton(env)
    }

    /// True if at least one binding survived.
    pub fn is_match(&self) -> bool {
        !self.matches.is_empty()
    }

    /// The surviving bindings, in production order.
    pub fn matches(&self) -> &[Environment] {
        &self.matches
    }

    /// Consumes the result, yielding its bindings.
    pub fn into_matches(self) -> Vec<Environment> {
        self.matches
    }

    /// Cross-product extension: every binding of `self` merged with every
    /// binding of `other` (right wins key conflicts), keeping only merges
    /// that do not bind one entity under two keys.
    pub fn extend(&self, other: &MatchResult) -> MatchResult {
        let mut out = MatchResult::failure();
        for left in &self.matches {
            for right in &other.matches {
                let merged = left.merged(right);
                if binding_is_valid(&merged) {
                    out.push_unique(merged);
                }
            }
        }
        out
    }

    /// Set union of two results.
    pub fn union(&self, other: &MatchResult) -> MatchResult {
        let mut out = self.clone();
        for binding in &other.matches {
            out.push_unique(binding.clone());
        }
        out
    }

    fn push_unique(&mut self, binding: Environment) {
        if !self.matches.contains(&binding) {
            self.matches.push(binding);
        }
    }
}

/// No model entity may be the value of two distinct keys.
fn binding_is_valid(binding: &Environment) -> bool {
    let mut seen: HashMap<NodeId, &str> = HashMap::new();
    for (name, value) in binding.entries() {
        if let Value::Node(id) = value {
            if let Some(prior) = seen.insert(*id, name) {
                if prior != name {
                    return false;
                }
            }
        }
    }
    true
}

impl Mul for MatchResult {
    type Output = MatchResult;

    fn mul(self, rhs: MatchResult) -> MatchResult {
        self.extend(&rhs)
    }
}

impl BitOr for MatchResult {
    type Output = MatchResult;

    fn bitor(self, rhs: MatchResult) -> MatchResult {
        self.union(&rhs)
    }
}
