//! The annotation schema: which annotation names belong to which entity
//! kinds, and how their values are normalized.
//!
//! The schema is supplied externally (it describes the annotation
//! vocabulary of the consuming toolchain, not of this engine). The engine
//! consults it for the write-gating rule: an annotation write happens when
//! the name is expected on the target's kind, or when the name is unknown
//! to the schema entirely. Names known only on *other* kinds are skipped
//! silently, so one rule can fire at entities of several kinds without
//! polluting their attribute bags.
//!
//! API-level annotations are deliberately not schematized: the expected
//! set for the API root is empty.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::error::Error;
use crate::eval::Value;
use crate::model::EntityKind;

/// A registered annotation value normalizer.
///
/// Normalizers validate and canonicalize the value of one annotation; a
/// returned error message is fatal to the engine run.
pub type Normalizer = Box<dyn Fn(&Value) -> Result<Value, String> + Send + Sync>;

/// The externally supplied annotation vocabulary.
///
/// # Example
///
/// ```rust
/// use lapis::schema::AnnotationSchema;
/// use lapis::model::EntityKind;
///
/// let schema = AnnotationSchema::new()
///     .with_function_annotation("synchrony")
///     .with_argument_annotation("in")
///     .with_argument_annotation("buffer_size");
///
/// assert!(schema.is_known("synchrony"));
/// assert!(schema.should_set(EntityKind::Function, "synchrony"));
/// // Known elsewhere, skipped here:
/// assert!(!schema.should_set(EntityKind::Function, "in"));
/// // Unknown names always write through:
/// assert!(schema.should_set(EntityKind::Function, "color"));
/// ```
#[derive(Default)]
pub struct AnnotationSchema {
    function: BTreeSet<String>,
    argument: BTreeSet<String>,
    ty: BTreeSet<String>,
    api: BTreeSet<String>,
    normalizers: BTreeMap<String, Normalizer>,
}

impl AnnotationSchema {
    /// Creates an empty schema: every annotation name is unknown and
    /// writes through everywhere.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares an annotation expected on functions.
    pub fn with_function_annotation(mut self, name: impl Into<String>) -> Self {
        self.function.insert(name.into());
        self
    }

    /// Declares an annotation expected on arguments.
    pub fn with_argument_annotation(mut self, name: impl Into<String>) -> Self {
        self.argument.insert(name.into());
        self
    }

    /// Declares an annotation expected on types.
    pub fn with_type_annotation(mut self, name: impl Into<String>) -> Self {
        self.ty.insert(name.into());
        self
    }

    /// Registers a value normalizer for an annotation name.
    pub fn with_normalizer(
        mut self,
        name: impl Into<String>,
        normalizer: impl Fn(&Value) -> Result<Value, String> + Send + Sync + 'static,
    ) -> Self {
        self.normalizers.insert(name.into(), Box::new(normalizer));
        self
    }

    /// The annotation names expected on the given entity kind. Empty for
    /// the API root.
    pub fn expected(&self, kind: EntityKind) -> &BTreeSet<String> {
        match kind {
            EntityKind::Function => &self.function,
            EntityKind::Argument => &self.argument,
            EntityKind::Type => &self.ty,
            EntityKind::Api => &self.api,
        }
    }

    /// True if the name is expected on any entity kind.
    pub fn is_known(&self, name: &str) -> bool {
        self.function.contains(name) || self.argument.contains(name) || self.ty.contains(name)
    }

    /// The write-gating rule: write when the name is expected on this
    /// kind, or not known to the schema at all.
    pub fn should_set(&self, kind: EntityKind, name: &str) -> bool {
        self.expected(kind).contains(name) || !self.is_known(name)
    }

    /// Passes a value through the annotation's registered normalizer.
    ///
    /// # Arguments
    ///
    /// * `name` - The annotation name being written
    /// * `value` - The evaluated descriptor argument
    ///
    /// # Returns
    ///
    /// The normalized value (unchanged when no normalizer is registered),
    /// or [`Error::AnnotationRejected`] when the normalizer refuses it.
    pub fn normalize(&self, name: &str, value: Value) -> Result<Value, Error> {
        match self.normalizers.get(name) {
            Some(normalizer) => normalizer(&value).map_err(|reason| Error::AnnotationRejected {
                name: name.to_string(),
                value: value.to_string(),
                reason,
            }),
            None => Ok(value),
        }
    }
}

impl fmt::Debug for AnnotationSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnnotationSchema")
            .field("function", &self.function)
            .field("argument", &self.argument)
            .field("type", &self.ty)
            .field("normalizers", &self.normalizers.keys().collect::<Vec<_>>())
            .finish()
    }
}
