//! conform - declarative schemas for validating and coercing dynamic values
//!
//! A schema describes the shape a [`Value`] must have. The same schema can
//! answer "does this conform?" ([`Schema::validate`]) and produce a
//! transformed, conformant copy ([`Schema::coerce`]).
//!
//! # Architecture
//!
//! - [`Spec`]: loosely-typed raw specification, what callers write
//! - [`normalize`]: resolves a `Spec` into a [`Schema`] once, enforcing every
//!   structural limit up front
//! - [`Schema`] / [`SchemaNode`]: immutable, `Send + Sync` compiled tree
//! - [`Schema::evaluate`]: the single engine behind validation and coercion
//! - [`Diagnostics`]: path-tagged [`Failure`]s explaining a rejection
//!
//! # Key Design Insights
//!
//! 1. **Normalize once**: dispatch on the kind of spec happens at definition
//!    time; matching never inspects raw specs.
//!
//! 2. **One engine, two entry points**: `validate` is `coerce` with fail-fast
//!    collection and the output discarded, so the two always agree.
//!
//! 3. **Callbacks never crash a match**: a predicate or transform that errors
//!    or panics becomes a [`Failure`] at the path being matched.
//!
//! # Example
//!
//! ```
//! use conform::prelude::*;
//!
//! let schema = normalize(Spec::map([
//!     ("name", Spec::from(TypeTag::String)),
//!     (
//!         "age",
//!         Spec::coerce("parse_int", |v| {
//!             v.as_str()
//!                 .and_then(|s| s.parse::<i64>().ok())
//!                 .map(Value::Int)
//!                 .ok_or_else(|| "not a number".into())
//!         }),
//!     ),
//!     ("role", Spec::optional(TypeTag::String).default("member").into()),
//! ]))
//! .unwrap();
//!
//! let input = Value::object([("name", "Chen"), ("age", "26")]);
//! let output = schema.coerce(&input).unwrap();
//!
//! assert_eq!(output.get("age"), Some(&Value::Int(26)));
//! assert_eq!(output.get("role").and_then(Value::as_str), Some("member"));
//!
//! let err = schema.coerce(&Value::object([("age", "x")])).unwrap_err();
//! assert_eq!(err.diagnostics().len(), 2);
//! ```
//!
//! # Extensions
//!
//! - [`conform-test`](https://docs.rs/conform-test): YAML conformance fixtures (internal)

// ═══════════════════════════════════════════════════════════════════════════════
// Modules
// ═══════════════════════════════════════════════════════════════════════════════

mod callback;
mod diagnostics;
mod engine;
mod node;
mod normalize;
mod options;
mod spec;
mod value;

// ═══════════════════════════════════════════════════════════════════════════════
// Public API
// ═══════════════════════════════════════════════════════════════════════════════

// Core types
pub use node::{DefaultValue, Field, Mapping, OptionalNode, Schema, SchemaNode};
pub use spec::{Descriptor, OptionalSpec, Spec, EMAIL_PATTERN};
pub use value::{CustomValue, Map, TypeTag, Value};

// Callbacks
pub use callback::{CallbackError, FnPredicate, FnTransform, Predicate, Transform};

// Engine
pub use engine::{coerce, validate, MatchResult};
pub use normalize::normalize;
pub use options::MatchOptions;

// Diagnostics
pub use diagnostics::{Diagnostics, Failure, FailureKind, Path, PathSegment};

// ═══════════════════════════════════════════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════════════════════════════════════════

/// Prelude module for convenient imports.
///
/// ```
/// use conform::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        coerce,
        normalize,
        validate,
        // Callbacks
        CallbackError,
        // Errors
        CoercionError,
        CustomValue,
        // Diagnostics
        Diagnostics,
        Failure,
        FailureKind,
        FnPredicate,
        FnTransform,
        MatchOptions,
        MatchResult,
        Predicate,
        // Core types
        Schema,
        SchemaDefinitionError,
        Spec,
        Transform,
        TypeTag,
        Value,
    };
}

// ═══════════════════════════════════════════════════════════════════════════════
// Constants
// ═══════════════════════════════════════════════════════════════════════════════

/// Maximum nesting depth of a schema tree.
///
/// Matching recurses once per level, so this also bounds stack use per call.
/// Checked by [`normalize`], including for already-compiled schemas embedded
/// in a larger spec.
pub const MAX_DEPTH: usize = 32;

/// Maximum number of children of a single `and` or `or`.
pub const MAX_COMBINATOR_CHILDREN: usize = 256;

/// Maximum number of declared fields in a single mapping.
///
/// Width-based counterpart of [`MAX_DEPTH`]: a flat mapping with millions of
/// fields stays within the depth limit but not within reason.
pub const MAX_MAPPING_FIELDS: usize = 1024;

/// Maximum length of a regular expression given to [`Spec::pattern`].
pub const MAX_PATTERN_LENGTH: usize = 4096;

// ═══════════════════════════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════════════════════════

/// Errors from schema definition.
///
/// These are raised by [`normalize`] only, never while matching. Fix the
/// spec and normalize again.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaDefinitionError {
    /// A sequence spec did not hold exactly one element spec.
    #[error("sequence spec must hold exactly one element spec, found {len}")]
    AmbiguousSequence {
        /// Number of element specs given.
        len: usize,
    },

    /// A mapping spec declared the same key twice.
    #[error("mapping spec declares key \"{key}\" more than once")]
    DuplicateKey {
        /// The repeated key.
        key: String,
    },

    /// An `or` with no alternatives can never match.
    #[error("`or` needs at least one alternative")]
    EmptyAlternatives,

    /// A combinator or mapping exceeds its width limit.
    #[error("{kind} has {count} children, but maximum allowed is {max}")]
    TooManyChildren {
        /// `"and"`, `"or"` or `"mapping"`.
        kind: &'static str,
        /// Actual count.
        count: usize,
        /// Maximum allowed.
        max: usize,
    },

    /// Schema nesting exceeds [`MAX_DEPTH`].
    #[error("schema nesting depth is {depth}, but maximum allowed is {max}")]
    DepthExceeded {
        /// Depth reached.
        depth: usize,
        /// Maximum allowed depth.
        max: usize,
    },

    /// A regular expression failed to compile.
    #[error("invalid pattern \"{pattern}\": {reason}")]
    InvalidPattern {
        /// The pattern that failed to compile.
        pattern: String,
        /// The underlying error message.
        reason: String,
    },

    /// A regular expression exceeds [`MAX_PATTERN_LENGTH`].
    #[error("pattern length is {len}, but maximum allowed is {max}")]
    PatternTooLong {
        /// Actual length of the pattern.
        len: usize,
        /// Maximum allowed length.
        max: usize,
    },

    /// An optional field's fixed default does not match its own schema.
    #[error("default value does not match the optional schema: {detail}")]
    InvalidDefault {
        /// Rendered failures of the default.
        detail: String,
    },

    /// `closed` was applied to something other than a mapping.
    #[error("only mappings can be closed, found {found}")]
    NotAMapping {
        /// Kind of the resolved spec.
        found: &'static str,
    },
}

/// A value did not conform to the schema it was coerced with.
///
/// Carries every failure, collected in traversal order.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("value does not conform to schema ({count} failure(s)):\n{diagnostics}", count = .diagnostics.len())]
pub struct CoercionError {
    pub(crate) diagnostics: Diagnostics,
}

impl CoercionError {
    /// The failures that caused the rejection.
    #[must_use]
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Consume the error, returning its diagnostics.
    #[must_use]
    pub fn into_diagnostics(self) -> Diagnostics {
        self.diagnostics
    }
}

impl From<CoercionError> for Diagnostics {
    fn from(err: CoercionError) -> Self {
        err.diagnostics
    }
}
