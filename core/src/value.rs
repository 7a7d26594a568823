//! `Value`: The dynamic runtime value that schemas are matched against
//!
//! Schemas describe shapes; `Value` is what actually arrives at runtime. It
//! covers the usual document primitives plus two containers (`List`, `Map`)
//! and an extensible `Custom` variant for domain types.
//!
//! # Extensibility via `Custom`
//!
//! For domain-specific types not covered by the primitives, implement
//! [`CustomValue`] and wrap in `Value::Custom(Arc::new(your_type))`. Custom
//! values take part in [`TypeTag::Custom`] matching, including declared
//! supertypes.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Associative container used by [`Value::Map`].
///
/// Keys are ordered, so two maps with the same entries compare and render
/// identically regardless of how they were built.
pub type Map = BTreeMap<String, Value>;

/// Extension trait for custom runtime values.
///
/// Implementations must be `Send + Sync` so values can cross threads with the
/// schemas that inspect them.
///
/// # Example
///
/// ```
/// use std::any::Any;
/// use std::sync::Arc;
/// use conform::{CustomValue, TypeTag, Value};
///
/// #[derive(Debug)]
/// struct Celsius(f64);
///
/// impl CustomValue for Celsius {
///     fn type_name(&self) -> &'static str { "celsius" }
///     fn supertypes(&self) -> &[&'static str] { &["temperature"] }
///     fn as_any(&self) -> &dyn Any { self }
/// }
///
/// let v = Value::Custom(Arc::new(Celsius(21.5)));
/// assert_eq!(v.type_name(), "celsius");
/// assert!(TypeTag::Custom("temperature").admits(&v));
/// ```
pub trait CustomValue: Send + Sync + fmt::Debug {
    /// Human-readable type identifier, e.g. `"geo_location"`.
    fn type_name(&self) -> &'static str;

    /// Names this type declares itself a subtype of.
    ///
    /// A value matches `TypeTag::Custom(name)` when `name` is its own
    /// [`type_name`](Self::type_name) or appears here.
    fn supertypes(&self) -> &[&'static str] {
        &[]
    }

    /// Returns `self` as `&dyn Any` for downcasting inside predicates.
    fn as_any(&self) -> &dyn Any;
}

/// A dynamic runtime value.
///
/// Equality is structural, except for `Custom` which compares `Arc` identity
/// (same allocation = equal). `Int(1)` and `Float(1.0)` are different values.
///
/// # Example
///
/// ```
/// use conform::Value;
///
/// let person = Value::object([("name", Value::from("Chen")), ("age", Value::from(26))]);
/// assert_eq!(person.get("name").and_then(Value::as_str), Some("Chen"));
/// assert_eq!(person.type_name(), "map");
/// ```
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// Absence of a value.
    #[default]
    Null,

    /// Boolean.
    Bool(bool),

    /// Signed integer.
    Int(i64),

    /// Floating point number.
    Float(f64),

    /// UTF-8 string.
    String(String),

    /// Raw bytes.
    Bytes(Vec<u8>),

    /// Ordered container.
    List(Vec<Value>),

    /// Associative container.
    Map(Map),

    /// Domain-specific value, see [`CustomValue`].
    Custom(Arc<dyn CustomValue>),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Bytes(a), Self::Bytes(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            (Self::Custom(a), Self::Custom(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Value {
    /// Build a `Map` value from key/value pairs.
    pub fn object<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self::Map(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Build a `List` value from items.
    pub fn list<V, I>(items: I) -> Self
    where
        V: Into<Value>,
        I: IntoIterator<Item = V>,
    {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    /// Returns a string describing the runtime type of this value.
    ///
    /// For `Custom` values this delegates to [`CustomValue::type_name`].
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Custom(c) => c.type_name(),
        }
    }

    /// Returns `true` if this is `Null`.
    #[inline]
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Try to get the value as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Try to get the value as an integer.
    #[inline]
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get the value as a float. Integers widen.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Try to get the value as a boolean.
    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get the value as a list.
    #[inline]
    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    /// Try to get the value as a map.
    #[inline]
    #[must_use]
    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Try to get the value as a custom value reference.
    ///
    /// Use [`CustomValue::as_any`] to downcast to the concrete type.
    #[inline]
    #[must_use]
    pub fn as_custom(&self) -> Option<&dyn CustomValue> {
        match self {
            Self::Custom(c) => Some(c.as_ref()),
            _ => None,
        }
    }

    /// Look up a key when this is a map.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map().and_then(|m| m.get(key))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x:?}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Map(map) => {
                f.write_str("{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k:?}: {v}")?;
                }
                f.write_str("}")
            }
            Self::Custom(c) => write!(f, "<{}>", c.type_name()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Self::Bytes(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::List(items)
    }
}

impl From<Map> for Value {
    fn from(m: Map) -> Self {
        Self::Map(m)
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Self::Null, Into::into)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TypeTag
// ═══════════════════════════════════════════════════════════════════════════════

/// Names a runtime type for [`TypeMatch`](crate::SchemaNode::TypeMatch) nodes.
///
/// Declared subtyping:
/// - `Int` and `Float` are subtypes of `Number`
/// - everything is a subtype of `Any`
/// - a custom value is a subtype of `Custom(name)` when `name` is its type name
///   or one of its declared [`supertypes`](CustomValue::supertypes)
///
/// `Bool` is not an `Int`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Null,
    Bool,
    Int,
    Float,
    Number,
    String,
    Bytes,
    List,
    Map,
    Any,
    Custom(&'static str),
}

impl TypeTag {
    /// Returns `true` if `value`'s runtime type is this type or a subtype of it.
    #[must_use]
    pub fn admits(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::Any, _)
            | (Self::Null, Value::Null)
            | (Self::Bool, Value::Bool(_))
            | (Self::Int, Value::Int(_))
            | (Self::Float, Value::Float(_))
            | (Self::Number, Value::Int(_) | Value::Float(_))
            | (Self::String, Value::String(_))
            | (Self::Bytes, Value::Bytes(_))
            | (Self::List, Value::List(_))
            | (Self::Map, Value::Map(_)) => true,
            (Self::Custom(name), Value::Custom(c)) => {
                c.type_name() == *name || c.supertypes().contains(name)
            }
            _ => false,
        }
    }

    /// The name used in diagnostics.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Number => "number",
            Self::String => "string",
            Self::Bytes => "bytes",
            Self::List => "list",
            Self::Map => "map",
            Self::Any => "any",
            Self::Custom(name) => *name,
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// serde_json interop (feature = "serde")
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(feature = "serde")]
mod json {
    use super::{Map, Value};

    /// Integers outside the `i64` range become `Float`, which may round them.
    impl From<serde_json::Value> for Value {
        fn from(json: serde_json::Value) -> Self {
            match json {
                serde_json::Value::Null => Self::Null,
                serde_json::Value::Bool(b) => Self::Bool(b),
                serde_json::Value::Number(n) => n
                    .as_i64()
                    .map(Self::Int)
                    .or_else(|| n.as_f64().map(Self::Float))
                    .unwrap_or(Self::Null),
                serde_json::Value::String(s) => Self::String(s),
                serde_json::Value::Array(items) => {
                    Self::List(items.into_iter().map(Self::from).collect())
                }
                serde_json::Value::Object(obj) => Self::Map(
                    obj.into_iter()
                        .map(|(k, v)| (k, Self::from(v)))
                        .collect::<Map>(),
                ),
            }
        }
    }

    /// Bytes become an array of numbers; custom values render as their type name.
    impl From<Value> for serde_json::Value {
        fn from(value: Value) -> Self {
            match value {
                Value::Null => Self::Null,
                Value::Bool(b) => Self::Bool(b),
                Value::Int(i) => Self::from(i),
                Value::Float(x) => serde_json::Number::from_f64(x).map_or(Self::Null, Self::Number),
                Value::String(s) => Self::String(s),
                Value::Bytes(b) => Self::Array(b.into_iter().map(Self::from).collect()),
                Value::List(items) => Self::Array(items.into_iter().map(Self::from).collect()),
                Value::Map(map) => {
                    Self::Object(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
                }
                Value::Custom(c) => Self::String(format!("<{}>", c.type_name())),
            }
        }
    }
}
