//! Engine: One recursive match/coerce pass over a value.
//!
//! Validation and coercion share this code path; they differ only in the
//! [`MatchOptions`] they run with. The engine never mutates the input: it
//! returns `Cow::Borrowed` for every sub-value that came through unchanged
//! and only clones the containers along the path of an actual change.

use crate::callback::guarded;
use crate::node::{Mapping, OptionalNode};
use crate::{
    CoercionError, Diagnostics, Failure, FailureKind, MatchOptions, Path, PathSegment, Schema,
    SchemaNode, Value,
};
use std::borrow::Cow;

/// Longest rendering of an offending value in verbose details.
const VERBOSE_VALUE_CHARS: usize = 64;

/// Outcome of [`Schema::evaluate`].
///
/// Holds the (possibly transformed) output when the value matched, and the
/// collected failures otherwise. The two are exclusive.
#[derive(Debug, Clone)]
pub struct MatchResult<'v> {
    value: Option<Cow<'v, Value>>,
    diagnostics: Diagnostics,
}

impl<'v> MatchResult<'v> {
    /// Returns `true` if the value matched.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.value.is_some()
    }

    /// The output value, if the value matched.
    #[must_use]
    pub fn value(&self) -> Option<&Value> {
        self.value.as_deref()
    }

    /// Consume the result, returning an owned output.
    #[must_use]
    pub fn into_value(self) -> Option<Value> {
        self.value.map(Cow::into_owned)
    }

    /// The failures recorded during the match. Empty on success.
    #[must_use]
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Convert into a `Result`, keeping borrowed output borrowed.
    ///
    /// # Errors
    ///
    /// Returns the diagnostics when the value did not match.
    pub fn into_result(self) -> Result<Cow<'v, Value>, Diagnostics> {
        self.value.ok_or(self.diagnostics)
    }
}

impl Schema {
    /// Match `value` against this schema with explicit options.
    ///
    /// # Example
    ///
    /// ```
    /// use conform::{normalize, MatchOptions, Spec, TypeTag, Value};
    ///
    /// let schema = normalize(Spec::map([("a", TypeTag::Int), ("b", TypeTag::Int)])).unwrap();
    /// let input = Value::object([("a", "x"), ("b", "y")]);
    ///
    /// let fast = schema.evaluate(&input, &MatchOptions::validation());
    /// let all = schema.evaluate(&input, &MatchOptions::coercion());
    /// assert_eq!(fast.diagnostics().len(), 1);
    /// assert_eq!(all.diagnostics().len(), 2);
    /// ```
    #[must_use]
    pub fn evaluate<'v>(&self, value: &'v Value, opts: &MatchOptions) -> MatchResult<'v> {
        let mut engine = Engine::new(*opts);
        let value = engine.eval(self, value);
        MatchResult {
            value,
            diagnostics: Diagnostics::from(engine.failures),
        }
    }

    /// Returns `true` if `value` conforms. Stops at the first failure.
    #[must_use]
    pub fn validate(&self, value: &Value) -> bool {
        self.evaluate(value, &MatchOptions::validation()).is_ok()
    }

    /// Produce the conformant, transformed copy of `value`.
    ///
    /// # Errors
    ///
    /// Returns [`CoercionError`] carrying every failure when `value` does not
    /// conform.
    #[tracing::instrument(level = "trace", skip_all)]
    pub fn coerce(&self, value: &Value) -> Result<Value, CoercionError> {
        match self.evaluate(value, &MatchOptions::coercion()).into_result() {
            Ok(output) => Ok(output.into_owned()),
            Err(diagnostics) => Err(CoercionError { diagnostics }),
        }
    }

    /// Collect every failure for `value`, discarding any output.
    #[tracing::instrument(level = "trace", skip_all)]
    #[must_use]
    pub fn diagnose(&self, value: &Value) -> Diagnostics {
        self.evaluate(value, &MatchOptions::coercion()).diagnostics
    }
}

/// Returns `true` if `value` conforms to `schema`.
#[must_use]
pub fn validate(schema: &Schema, value: &Value) -> bool {
    schema.validate(value)
}

/// Coerce `value` with `schema`, see [`Schema::coerce`].
///
/// # Errors
///
/// Returns [`CoercionError`] when `value` does not conform.
pub fn coerce(schema: &Schema, value: &Value) -> Result<Value, CoercionError> {
    schema.coerce(value)
}

// ═══════════════════════════════════════════════════════════════════════════════
// Engine
// ═══════════════════════════════════════════════════════════════════════════════

/// Per-call state: the path being matched and the failures so far.
struct Engine {
    opts: MatchOptions,
    path: Path,
    failures: Vec<Failure>,
}

/// A pending edit to a map being coerced. `None` removes the key.
type MapEdit<'s> = (&'s str, Option<Value>);

impl Engine {
    fn new(opts: MatchOptions) -> Self {
        Self {
            opts,
            path: Path::root(),
            failures: Vec::new(),
        }
    }

    /// Match one node. `None` means a failure was recorded.
    fn eval<'v>(&mut self, schema: &Schema, value: &'v Value) -> Option<Cow<'v, Value>> {
        match schema.node() {
            SchemaNode::Literal(expected) => {
                if value == expected {
                    Some(Cow::Borrowed(value))
                } else {
                    self.reject(
                        FailureKind::LiteralMismatch,
                        format!("expected literal {expected}"),
                        Some(value),
                    )
                }
            }
            SchemaNode::TypeMatch(tag) => {
                if tag.admits(value) {
                    Some(Cow::Borrowed(value))
                } else {
                    self.type_mismatch(tag.name(), value)
                }
            }
            SchemaNode::PredicateMatch(predicate) | SchemaNode::Check(predicate) => {
                match guarded(predicate.name(), || predicate.test(value)) {
                    Ok(true) => Some(Cow::Borrowed(value)),
                    Ok(false) => self.reject(
                        FailureKind::PredicateRejected,
                        format!("rejected by {}", predicate.name()),
                        Some(value),
                    ),
                    Err(err) => self.reject(
                        FailureKind::PredicateRejected,
                        format!("{} could not decide: {err}", predicate.name()),
                        Some(value),
                    ),
                }
            }
            SchemaNode::Coerce(transform) => {
                match guarded(transform.name(), || transform.apply(value)) {
                    Ok(output) => Some(Cow::Owned(output)),
                    Err(err) => self.reject(
                        FailureKind::TransformFailed,
                        format!("{} failed: {err}", transform.name()),
                        Some(value),
                    ),
                }
            }
            SchemaNode::Pattern(regex) => match value {
                Value::String(s) if regex.is_match(s) => Some(Cow::Borrowed(value)),
                Value::String(_) => self.reject(
                    FailureKind::PredicateRejected,
                    format!("does not match pattern {}", regex.as_str()),
                    Some(value),
                ),
                _ => self.type_mismatch("string", value),
            },
            SchemaNode::Mapping(mapping) => self.eval_mapping(mapping, value),
            SchemaNode::Sequence(element) => self.eval_sequence(element, value),
            // Outside a mapping there is no absence to handle.
            SchemaNode::Optional(optional) => self.eval(&optional.inner, value),
            SchemaNode::And(children) => {
                let mut current = Cow::Borrowed(value);
                for child in children {
                    current = match current {
                        Cow::Borrowed(v) => self.eval(child, v)?,
                        Cow::Owned(v) => {
                            let replaced = match self.eval(child, &v)? {
                                Cow::Owned(next) => Some(next),
                                Cow::Borrowed(_) => None,
                            };
                            Cow::Owned(replaced.unwrap_or(v))
                        }
                    };
                }
                Some(current)
            }
            SchemaNode::Or(children) => {
                let mark = self.failures.len();
                for child in children {
                    if let Some(output) = self.eval(child, value) {
                        self.failures.truncate(mark);
                        return Some(output);
                    }
                }
                let causes = self.failures.split_off(mark);
                self.record(
                    Failure::new(
                        self.path.clone(),
                        FailureKind::NoAlternativeMatched,
                        format!("none of {} alternatives matched", children.len()),
                    )
                    .with_causes(causes),
                );
                None
            }
        }
    }

    fn eval_mapping<'v>(&mut self, mapping: &Mapping, value: &'v Value) -> Option<Cow<'v, Value>> {
        let Value::Map(map) = value else {
            return self.type_mismatch("map", value);
        };

        let mut ok = true;
        let mut edits: Vec<MapEdit<'_>> = Vec::new();

        for field in mapping.fields() {
            let key = field.key.as_str();
            let optional = match field.schema.node() {
                SchemaNode::Optional(optional) => Some(optional),
                _ => None,
            };
            let present = map
                .get(key)
                .filter(|v| !optional.is_some_and(|o| treated_as_absent(o, v)));

            match (present, optional) {
                (Some(v), _) => {
                    self.path.push(PathSegment::from(key));
                    let output = self.eval(&field.schema, v);
                    self.path.pop();
                    match output {
                        Some(Cow::Owned(next)) => edits.push((key, Some(next))),
                        Some(Cow::Borrowed(_)) => {}
                        None => ok = false,
                    }
                }
                (None, Some(optional)) => match optional.default.produce() {
                    Ok(Some(default)) => edits.push((key, Some(default))),
                    Ok(None) if map.contains_key(key) => edits.push((key, None)),
                    Ok(None) => {}
                    Err(err) => {
                        self.path.push(PathSegment::from(key));
                        self.fail(
                            FailureKind::TransformFailed,
                            format!("default failed: {err}"),
                            None,
                        );
                        self.path.pop();
                        ok = false;
                    }
                },
                (None, None) => {
                    self.path.push(PathSegment::from(key));
                    self.fail(FailureKind::MissingKey, "required key is missing", None);
                    self.path.pop();
                    ok = false;
                }
            }

            if !ok && self.opts.fail_fast {
                return None;
            }
        }

        if mapping.is_closed() {
            for key in map.keys().filter(|k| mapping.field(k).is_none()) {
                self.path.push(PathSegment::from(key.as_str()));
                self.fail(
                    FailureKind::UnexpectedKey,
                    "key is not declared by the closed mapping",
                    None,
                );
                self.path.pop();
                ok = false;
                if self.opts.fail_fast {
                    return None;
                }
            }
        }

        if !ok {
            return None;
        }
        if edits.is_empty() {
            return Some(Cow::Borrowed(value));
        }

        let mut output = map.clone();
        for (key, edit) in edits {
            match edit {
                Some(v) => {
                    output.insert(key.to_string(), v);
                }
                None => {
                    output.remove(key);
                }
            }
        }
        Some(Cow::Owned(Value::Map(output)))
    }

    fn eval_sequence<'v>(&mut self, element: &Schema, value: &'v Value) -> Option<Cow<'v, Value>> {
        let Value::List(items) = value else {
            return self.type_mismatch("list", value);
        };

        let mut ok = true;
        let mut edits: Vec<(usize, Value)> = Vec::new();

        for (index, item) in items.iter().enumerate() {
            self.path.push(PathSegment::Index(index));
            let output = self.eval(element, item);
            self.path.pop();
            match output {
                Some(Cow::Owned(next)) => edits.push((index, next)),
                Some(Cow::Borrowed(_)) => {}
                None => {
                    ok = false;
                    if self.opts.fail_fast {
                        return None;
                    }
                }
            }
        }

        if !ok {
            return None;
        }
        if edits.is_empty() {
            return Some(Cow::Borrowed(value));
        }

        let mut output = items.clone();
        for (index, next) in edits {
            output[index] = next;
        }
        Some(Cow::Owned(Value::List(output)))
    }

    fn type_mismatch<T>(&mut self, expected: &str, value: &Value) -> Option<T> {
        self.reject(
            FailureKind::TypeMismatch,
            format!("expected {expected}, found {}", value.type_name()),
            Some(value),
        )
    }

    /// Record a failure at the current path and yield no output.
    fn reject<T>(&mut self, kind: FailureKind, detail: String, value: Option<&Value>) -> Option<T> {
        self.fail(kind, detail, value);
        None
    }

    /// Record a failure at the current path.
    fn fail(&mut self, kind: FailureKind, detail: impl Into<String>, value: Option<&Value>) {
        let mut detail = detail.into();
        if self.opts.verbose {
            if let Some(value) = value {
                detail.push_str(" (value: ");
                detail.push_str(&render_truncated(value));
                detail.push(')');
            }
        }
        self.record(Failure::new(self.path.clone(), kind, detail));
    }

    fn record(&mut self, failure: Failure) {
        tracing::trace!(
            path = %failure.path,
            kind = %failure.kind,
            causes = failure.causes.len(),
            "match failure"
        );
        self.failures.push(failure);
    }
}

fn treated_as_absent(optional: &OptionalNode, value: &Value) -> bool {
    optional.empty_as_absent && value.as_str() == Some("")
}

fn render_truncated(value: &Value) -> String {
    let rendered = value.to_string();
    match rendered.char_indices().nth(VERBOSE_VALUE_CHARS) {
        Some((cut, _)) => format!("{}...", &rendered[..cut]),
        None => rendered,
    }
}
