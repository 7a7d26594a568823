//! Diagnostics: Path-tagged failure records produced by a match.
//!
//! Every failure is anchored at the [`Path`] where it occurred, counted from
//! the root of the input value. Failures accumulate depth-first in traversal
//! order. `NoAlternativeMatched` is the only kind that nests: it carries the
//! rejected alternatives' failures as [`Failure::causes`].
//!
//! Details never contain the offending input unless the call opted into
//! verbose mode ([`MatchOptions::verbose`](crate::MatchOptions)).

use std::fmt;

/// One step into a value: a map key or a list index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(untagged))]
pub enum PathSegment {
    /// Key of a map entry.
    Key(String),
    /// Index of a list element.
    Index(usize),
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// Location of a sub-value, from the root of the input.
///
/// Renders as `(root)`, `name`, `items[1]`, `a.b[0].c`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(transparent))]
pub struct Path(Vec<PathSegment>);

impl Path {
    /// The empty path.
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// Returns `true` for the empty path.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// The path segments, outermost first.
    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// Number of segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` for the empty path.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn push(&mut self, segment: PathSegment) {
        self.0.push(segment);
    }

    pub(crate) fn pop(&mut self) {
        self.0.pop();
    }
}

impl<S: Into<PathSegment>> FromIterator<S> for Path {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("(root)");
        }
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Key(key) if i == 0 => f.write_str(key)?,
                PathSegment::Key(key) => write!(f, ".{key}")?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

/// Why a sub-value was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize),
    serde(rename_all = "snake_case")
)]
pub enum FailureKind {
    /// A required mapping field is absent.
    MissingKey,
    /// The runtime type is incompatible with the expected type.
    TypeMismatch,
    /// The value differs from the expected literal.
    LiteralMismatch,
    /// A check, predicate or pattern rejected the value (or failed to decide).
    PredicateRejected,
    /// A transform failed.
    TransformFailed,
    /// Every alternative of an `Or` failed; see [`Failure::causes`].
    NoAlternativeMatched,
    /// A closed mapping received an undeclared key.
    UnexpectedKey,
}

impl FailureKind {
    /// Stable `snake_case` identifier.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingKey => "missing_key",
            Self::TypeMismatch => "type_mismatch",
            Self::LiteralMismatch => "literal_mismatch",
            Self::PredicateRejected => "predicate_rejected",
            Self::TransformFailed => "transform_failed",
            Self::NoAlternativeMatched => "no_alternative_matched",
            Self::UnexpectedKey => "unexpected_key",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single rejected sub-value.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Failure {
    /// Where the failure occurred.
    pub path: Path,
    /// What went wrong.
    pub kind: FailureKind,
    /// Human-readable explanation.
    pub detail: String,
    /// For `NoAlternativeMatched`: the failures of each rejected alternative,
    /// in declaration order. Empty for every other kind.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Vec::is_empty"))]
    pub causes: Vec<Failure>,
}

impl Failure {
    /// Create a failure without causes.
    pub fn new(path: Path, kind: FailureKind, detail: impl Into<String>) -> Self {
        Self {
            path,
            kind,
            detail: detail.into(),
            causes: Vec::new(),
        }
    }

    /// Attach nested causes.
    #[must_use]
    pub fn with_causes(mut self, causes: Vec<Failure>) -> Self {
        self.causes = causes;
        self
    }

    fn write_indented(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        write!(f, "{:indent$}{self}", "")?;
        for cause in &self.causes {
            writeln!(f)?;
            cause.write_indented(f, indent + 2)?;
        }
        Ok(())
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: [{}] {}", self.path, self.kind, self.detail)
    }
}

/// The failures collected by one match call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(transparent))]
pub struct Diagnostics {
    failures: Vec<Failure>,
}

impl Diagnostics {
    /// Returns the number of top-level failures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    /// Returns `true` if nothing failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// Returns a slice of all top-level failures.
    #[must_use]
    pub fn failures(&self) -> &[Failure] {
        &self.failures
    }

    /// Iterate over top-level failures.
    pub fn iter(&self) -> std::slice::Iter<'_, Failure> {
        self.failures.iter()
    }

    /// The first failure in traversal order.
    #[must_use]
    pub fn first(&self) -> Option<&Failure> {
        self.failures.first()
    }

    /// Returns `true` if any top-level failure has the given kind.
    #[must_use]
    pub fn contains_kind(&self, kind: FailureKind) -> bool {
        self.failures.iter().any(|f| f.kind == kind)
    }

    /// Consumes self and returns the inner Vec.
    #[must_use]
    pub fn into_inner(self) -> Vec<Failure> {
        self.failures
    }
}

impl From<Vec<Failure>> for Diagnostics {
    fn from(failures: Vec<Failure>) -> Self {
        Self { failures }
    }
}

impl IntoIterator for Diagnostics {
    type Item = Failure;
    type IntoIter = std::vec::IntoIter<Failure>;

    fn into_iter(self) -> Self::IntoIter {
        self.failures.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Failure;
    type IntoIter = std::slice::Iter<'a, Failure>;

    fn into_iter(self) -> Self::IntoIter {
        self.failures.iter()
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.failures.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            failure.write_indented(f, 2)?;
        }
        Ok(())
    }
}
