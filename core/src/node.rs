//! `SchemaNode`: The canonical, compiled form of a schema
//!
//! A [`Schema`] is a cheap, cloneable handle to an immutable tree of
//! [`SchemaNode`]s. Trees are produced once by [`normalize`](crate::normalize)
//! and then shared freely: every node is `Send + Sync` and no match call ever
//! writes to the tree.

use crate::callback::guarded;
use crate::{CallbackError, Predicate, Transform, TypeTag, Value};
use std::fmt::{self, Debug};
use std::sync::Arc;

/// A compiled schema.
///
/// Cloning is an `Arc` clone; sub-schemas embedded in several parents are
/// shared, not copied.
#[derive(Clone)]
pub struct Schema {
    root: Arc<SchemaNode>,
}

impl Schema {
    pub(crate) fn from_node(node: SchemaNode) -> Self {
        Self {
            root: Arc::new(node),
        }
    }

    /// The root node of this schema.
    #[must_use]
    pub fn node(&self) -> &SchemaNode {
        &self.root
    }

    /// Nesting depth of this schema tree (a leaf has depth 1).
    #[must_use]
    pub fn depth(&self) -> usize {
        self.root.depth()
    }

    /// Returns `true` if both handles point at the same tree.
    #[must_use]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.root, &b.root)
    }
}

impl Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Debug::fmt(&*self.root, f)
    }
}

/// One node of a compiled schema tree.
///
/// Base matchers (`Literal`, `TypeMatch`, `PredicateMatch`, `Pattern`),
/// containers (`Mapping`, `Sequence`) and descriptors (`Optional`, `Check`,
/// `Coerce`, `And`, `Or`).
pub enum SchemaNode {
    /// Matches only values equal to the expected value.
    Literal(Value),

    /// Matches values whose runtime type is the tag or a declared subtype.
    TypeMatch(TypeTag),

    /// Matches values the predicate accepts. Produced from a raw predicate spec.
    PredicateMatch(Arc<dyn Predicate>),

    /// Matches maps field by field.
    Mapping(Mapping),

    /// Matches lists whose every element matches the element schema.
    Sequence(Schema),

    /// Marks a mapping field as non-required.
    Optional(OptionalNode),

    /// Pass-through gate built with [`Spec::check`](crate::Spec::check).
    Check(Arc<dyn Predicate>),

    /// Replaces the value with the transform's output.
    Coerce(Arc<dyn Transform>),

    /// All children must match; each child sees the previous child's output.
    /// Short-circuits on the first failure.
    And(Vec<Schema>),

    /// At least one child must match, tried in order against the original value.
    /// Never empty.
    Or(Vec<Schema>),

    /// String values containing a match of the regular expression.
    Pattern(regex::Regex),
}

impl SchemaNode {
    /// Short variant name used in logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Literal(_) => "literal",
            Self::TypeMatch(_) => "type",
            Self::PredicateMatch(_) => "predicate",
            Self::Mapping(_) => "mapping",
            Self::Sequence(_) => "sequence",
            Self::Optional(_) => "optional",
            Self::Check(_) => "check",
            Self::Coerce(_) => "coerce",
            Self::And(_) => "and",
            Self::Or(_) => "or",
            Self::Pattern(_) => "pattern",
        }
    }

    /// Returns `true` for `Optional` nodes.
    #[must_use]
    pub fn is_optional(&self) -> bool {
        matches!(self, Self::Optional(_))
    }

    /// Calculate the depth of this node (a leaf has depth 1).
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            Self::Literal(_)
            | Self::TypeMatch(_)
            | Self::PredicateMatch(_)
            | Self::Check(_)
            | Self::Coerce(_)
            | Self::Pattern(_) => 1,
            Self::Mapping(m) => 1 + m.fields.iter().map(|f| f.schema.depth()).max().unwrap_or(0),
            Self::Sequence(element) => 1 + element.depth(),
            Self::Optional(o) => 1 + o.inner.depth(),
            Self::And(children) | Self::Or(children) => {
                1 + children.iter().map(Schema::depth).max().unwrap_or(0)
            }
        }
    }
}

impl Debug for SchemaNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(v) => f.debug_tuple("Literal").field(v).finish(),
            Self::TypeMatch(t) => f.debug_tuple("TypeMatch").field(t).finish(),
            Self::PredicateMatch(p) => f.debug_tuple("PredicateMatch").field(&p.name()).finish(),
            Self::Mapping(m) => Debug::fmt(m, f),
            Self::Sequence(e) => f.debug_tuple("Sequence").field(e).finish(),
            Self::Optional(o) => Debug::fmt(o, f),
            Self::Check(p) => f.debug_tuple("Check").field(&p.name()).finish(),
            Self::Coerce(t) => f.debug_tuple("Coerce").field(&t.name()).finish(),
            Self::And(cs) => f.debug_tuple("And").field(cs).finish(),
            Self::Or(cs) => f.debug_tuple("Or").field(cs).finish(),
            Self::Pattern(re) => f.debug_tuple("Pattern").field(&re.as_str()).finish(),
        }
    }
}

/// Field list of a `Mapping` node.
pub struct Mapping {
    pub(crate) fields: Vec<Field>,
    pub(crate) closed: bool,
}

impl Mapping {
    /// Declared fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Look up a declared field by key.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.key == key)
    }

    /// Returns `true` if undeclared keys are rejected.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Debug for Mapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for field in &self.fields {
            map.entry(&field.key, &field.schema);
        }
        map.finish()?;
        if self.closed {
            f.write_str(" (closed)")?;
        }
        Ok(())
    }
}

/// A declared mapping field.
#[derive(Debug, Clone)]
pub struct Field {
    /// The key looked up in the input map.
    pub key: String,
    /// Schema for the value under `key`.
    pub schema: Schema,
}

impl Field {
    /// A field is required unless its schema is directly an `Optional` node.
    #[must_use]
    pub fn is_required(&self) -> bool {
        !self.schema.node().is_optional()
    }
}

/// Payload of an `Optional` node.
#[derive(Debug)]
pub struct OptionalNode {
    /// Schema applied when the field is present.
    pub inner: Schema,
    /// Value supplied when the field is absent.
    pub default: DefaultValue,
    /// Treat a present empty string as absent.
    pub empty_as_absent: bool,
}

/// What an absent optional field turns into.
#[derive(Clone, Default)]
pub enum DefaultValue {
    /// Absent fields appear as `Null` in the output.
    #[default]
    Null,
    /// Absent fields stay absent in the output.
    Omit,
    /// A fixed value, cloned into each output.
    Value(Value),
    /// A factory invoked fresh for every absence.
    Factory(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl DefaultValue {
    /// Produce the default for one absence, if any.
    ///
    /// A panicking factory is reported as an error, never propagated.
    pub fn produce(&self) -> Result<Option<Value>, CallbackError> {
        match self {
            Self::Null => Ok(Some(Value::Null)),
            Self::Omit => Ok(None),
            Self::Value(v) => Ok(Some(v.clone())),
            Self::Factory(make) => guarded("default", || Ok(Some(make()))),
        }
    }
}

impl Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::Omit => f.write_str("Omit"),
            Self::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Self::Factory(_) => f.write_str("Factory"),
        }
    }
}
