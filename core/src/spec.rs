//! `Spec`: Raw, loosely-typed schema specifications and descriptor constructors
//!
//! A `Spec` is what callers write; a [`Schema`] is what the engine runs.
//! [`normalize`](crate::normalize) turns the former into the latter once, at
//! schema definition time.
//!
//! Everything that can appear in a schema converts into `Spec`:
//!
//! | Rust value | Becomes |
//! |------------|---------|
//! | [`Schema`] | itself, shared |
//! | [`Spec::map`] | `Mapping` |
//! | `Vec<Spec>` / [`Spec::list`] with one element | `Sequence` |
//! | [`TypeTag`] | `TypeMatch` |
//! | [`Spec::predicate`] / `Arc<dyn Predicate>` | `PredicateMatch` |
//! | [`Value`], `&str`, `i64`, `bool`, ... | `Literal` |
//!
//! Descriptors (`optional`, `check`, `coerce`, `and`, `or`, `pattern`,
//! `closed`) accept raw or already-normalized inner specs.

use crate::{
    CallbackError, DefaultValue, FnPredicate, FnTransform, Predicate, Schema, Transform, TypeTag,
    Value,
};
use std::sync::Arc;

/// Regular expression behind [`Spec::email`].
pub const EMAIL_PATTERN: &str = r"^[-0-9a-zA-Z.+_]+@[-0-9a-zA-Z.+_]+\.[a-zA-Z]+$";

/// A raw schema specification.
///
/// # Example
///
/// ```
/// use conform::{normalize, Spec, TypeTag, Value};
///
/// let schema = normalize(Spec::map([
///     ("name", Spec::from(TypeTag::String)),
///     ("tags", Spec::list([TypeTag::String])),
///     ("nickname", Spec::optional(TypeTag::String).into()),
/// ]))
/// .unwrap();
///
/// let person = Value::object([
///     ("name", Value::from("Chen")),
///     ("tags", Value::list(["admin"])),
/// ]);
/// assert!(schema.validate(&person));
/// ```
#[derive(Debug)]
pub enum Spec {
    /// An already-normalized schema; returned unchanged.
    Schema(Schema),
    /// A descriptor with raw inner specs.
    Descriptor(Box<Descriptor>),
    /// A mapping literal: key to field spec, in declaration order.
    Map(Vec<(String, Spec)>),
    /// A sequence literal; must hold exactly one element spec.
    List(Vec<Spec>),
    /// A type reference.
    Type(TypeTag),
    /// A predicate function.
    Predicate(Arc<dyn Predicate>),
    /// Anything else: matched by equality.
    Literal(Value),
}

/// Descriptor payloads, see the constructors on [`Spec`].
#[derive(Debug)]
pub enum Descriptor {
    Optional(OptionalSpec),
    Check(Arc<dyn Predicate>),
    Coerce(Arc<dyn Transform>),
    And(Vec<Spec>),
    Or(Vec<Spec>),
    Pattern(String),
    Closed(Spec),
}

/// Builder returned by [`Spec::optional`].
#[derive(Debug)]
pub struct OptionalSpec {
    pub(crate) inner: Spec,
    pub(crate) default: DefaultValue,
    pub(crate) empty_as_absent: bool,
}

impl OptionalSpec {
    /// Supply `value` when the field is absent.
    ///
    /// The value must itself match the inner schema; this is checked by
    /// [`normalize`](crate::normalize).
    #[must_use]
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = DefaultValue::Value(value.into());
        self
    }

    /// Supply a freshly built value for every absence.
    ///
    /// Use this for container defaults so outputs never share state.
    #[must_use]
    pub fn default_with<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.default = DefaultValue::Factory(Arc::new(factory));
        self
    }

    /// Leave the key out of the output when the field is absent, instead of
    /// filling it with `Null`.
    #[must_use]
    pub fn omit_when_absent(mut self) -> Self {
        self.default = DefaultValue::Omit;
        self
    }

    /// Treat a present empty string like an absent field.
    #[must_use]
    pub fn empty_as_absent(mut self) -> Self {
        self.empty_as_absent = true;
        self
    }
}

impl Spec {
    /// A mapping literal. Field order is kept for diagnostics.
    pub fn map<K, V, I>(fields: I) -> Self
    where
        K: Into<String>,
        V: Into<Spec>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self::Map(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// A sequence literal. Only single-element sequences normalize.
    pub fn list<V, I>(items: I) -> Self
    where
        V: Into<Spec>,
        I: IntoIterator<Item = V>,
    {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    /// A literal value, even when it is a map or a list.
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal(value.into())
    }

    /// A raw predicate spec, normalized to `PredicateMatch`.
    pub fn predicate<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self::Predicate(Arc::new(FnPredicate::new(name, f)))
    }

    /// Mark a mapping field as non-required.
    ///
    /// An absent field comes out as `Null` unless a default is given or
    /// [`OptionalSpec::omit_when_absent`] is set.
    pub fn optional(inner: impl Into<Spec>) -> OptionalSpec {
        OptionalSpec {
            inner: inner.into(),
            default: DefaultValue::Null,
            empty_as_absent: false,
        }
    }

    /// A pass-through gate: the value must satisfy `f`.
    pub fn check<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self::check_with(FnPredicate::new(name, f))
    }

    /// A gate whose function may report why it could not decide.
    pub fn try_check<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Value) -> Result<bool, CallbackError> + Send + Sync + 'static,
    {
        Self::check_with(FnPredicate::fallible(name, f))
    }

    /// A gate backed by any [`Predicate`] implementation.
    pub fn check_with(predicate: impl Predicate + 'static) -> Self {
        Self::descriptor(Descriptor::Check(Arc::new(predicate)))
    }

    /// Replace the value with `f(value)`; an `Err` rejects the value.
    pub fn coerce<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, CallbackError> + Send + Sync + 'static,
    {
        Self::coerce_with(FnTransform::new(name, f))
    }

    /// A coercion backed by any [`Transform`] implementation.
    pub fn coerce_with(transform: impl Transform + 'static) -> Self {
        Self::descriptor(Descriptor::Coerce(Arc::new(transform)))
    }

    /// Every child must match, in order, each seeing the previous output.
    pub fn and<V, I>(children: I) -> Self
    where
        V: Into<Spec>,
        I: IntoIterator<Item = V>,
    {
        Self::descriptor(Descriptor::And(children.into_iter().map(Into::into).collect()))
    }

    /// The first child that matches the original value wins.
    pub fn or<V, I>(children: I) -> Self
    where
        V: Into<Spec>,
        I: IntoIterator<Item = V>,
    {
        Self::descriptor(Descriptor::Or(children.into_iter().map(Into::into).collect()))
    }

    /// Strings containing a match of the regular expression.
    pub fn pattern(regex: impl Into<String>) -> Self {
        Self::descriptor(Descriptor::Pattern(regex.into()))
    }

    /// Strings that look like an email address, see [`EMAIL_PATTERN`].
    #[must_use]
    pub fn email() -> Self {
        Self::pattern(EMAIL_PATTERN)
    }

    /// A mapping that rejects undeclared keys.
    pub fn closed(mapping: impl Into<Spec>) -> Self {
        Self::descriptor(Descriptor::Closed(mapping.into()))
    }

    fn descriptor(descriptor: Descriptor) -> Self {
        Self::Descriptor(Box::new(descriptor))
    }
}

impl From<Schema> for Spec {
    fn from(schema: Schema) -> Self {
        Self::Schema(schema)
    }
}

impl From<&Schema> for Spec {
    fn from(schema: &Schema) -> Self {
        Self::Schema(schema.clone())
    }
}

impl From<OptionalSpec> for Spec {
    fn from(optional: OptionalSpec) -> Self {
        Self::descriptor(Descriptor::Optional(optional))
    }
}

impl From<Vec<Spec>> for Spec {
    fn from(items: Vec<Spec>) -> Self {
        Self::List(items)
    }
}

impl From<TypeTag> for Spec {
    fn from(tag: TypeTag) -> Self {
        Self::Type(tag)
    }
}

impl From<Arc<dyn Predicate>> for Spec {
    fn from(predicate: Arc<dyn Predicate>) -> Self {
        Self::Predicate(predicate)
    }
}

impl From<Value> for Spec {
    fn from(value: Value) -> Self {
        Self::Literal(value)
    }
}

macro_rules! literal_spec {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Spec {
                fn from(v: $t) -> Self {
                    Self::Literal(Value::from(v))
                }
            }
        )*
    };
}

literal_spec!(bool, i64, i32, f64, &str, String);
