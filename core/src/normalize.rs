//! Normalizer: Resolves a raw [`Spec`] into a compiled [`Schema`].
//!
//! Dispatch is by fixed priority, decided once at definition time:
//!
//! 1. an existing `Schema` is returned unchanged (descriptors have their raw
//!    inner specs resolved first)
//! 2. a mapping literal becomes `Mapping`
//! 3. a one-element sequence literal becomes `Sequence`
//! 4. a type reference becomes `TypeMatch`
//! 5. a predicate becomes `PredicateMatch`
//! 6. anything else becomes `Literal`
//!
//! All structural limits are enforced here so that matching never has to
//! fail for reasons unrelated to the data.

use crate::node::{Field, Mapping, OptionalNode};
use crate::spec::{Descriptor, OptionalSpec};
use crate::{
    DefaultValue, Schema, SchemaDefinitionError, SchemaNode, Spec, MAX_COMBINATOR_CHILDREN,
    MAX_DEPTH, MAX_MAPPING_FIELDS, MAX_PATTERN_LENGTH,
};
use std::collections::HashSet;

/// Compile a raw spec into a [`Schema`].
///
/// # Errors
///
/// Returns [`SchemaDefinitionError`] when the spec cannot be resolved: a
/// sequence literal without exactly one element, duplicate mapping keys, an
/// empty `or`, an invalid pattern, a default that does not match its own
/// schema, `closed` around a non-mapping, or a tree exceeding the limits in
/// [`MAX_DEPTH`], [`MAX_COMBINATOR_CHILDREN`] and [`MAX_MAPPING_FIELDS`].
///
/// # Example
///
/// ```
/// use conform::{normalize, SchemaDefinitionError, Spec, TypeTag};
///
/// let ints = normalize(Spec::list([TypeTag::Int])).unwrap();
/// assert_eq!(ints.depth(), 2);
///
/// let err = normalize(Spec::list([TypeTag::Int, TypeTag::String])).unwrap_err();
/// assert_eq!(err, SchemaDefinitionError::AmbiguousSequence { len: 2 });
/// ```
pub fn normalize(spec: impl Into<Spec>) -> Result<Schema, SchemaDefinitionError> {
    match resolve(spec.into(), 1) {
        Ok(schema) => {
            tracing::debug!(
                kind = schema.node().kind(),
                depth = schema.depth(),
                "schema normalized"
            );
            Ok(schema)
        }
        Err(err) => {
            tracing::debug!(%err, "schema definition rejected");
            Err(err)
        }
    }
}

/// Resolve `spec` sitting at nesting level `level` (the root is level 1).
fn resolve(spec: Spec, level: usize) -> Result<Schema, SchemaDefinitionError> {
    if level > MAX_DEPTH {
        return Err(SchemaDefinitionError::DepthExceeded {
            depth: level,
            max: MAX_DEPTH,
        });
    }

    match spec {
        Spec::Schema(schema) => {
            let depth = level - 1 + schema.depth();
            if depth > MAX_DEPTH {
                return Err(SchemaDefinitionError::DepthExceeded {
                    depth,
                    max: MAX_DEPTH,
                });
            }
            Ok(schema)
        }
        Spec::Descriptor(descriptor) => resolve_descriptor(*descriptor, level),
        Spec::Map(fields) => Ok(Schema::from_node(SchemaNode::Mapping(resolve_mapping(
            fields, level,
        )?))),
        Spec::List(mut items) => {
            if items.len() != 1 {
                return Err(SchemaDefinitionError::AmbiguousSequence { len: items.len() });
            }
            let element = items.remove(0);
            Ok(Schema::from_node(SchemaNode::Sequence(resolve(
                element,
                level + 1,
            )?)))
        }
        Spec::Type(tag) => Ok(Schema::from_node(SchemaNode::TypeMatch(tag))),
        Spec::Predicate(predicate) => Ok(Schema::from_node(SchemaNode::PredicateMatch(predicate))),
        Spec::Literal(value) => Ok(Schema::from_node(SchemaNode::Literal(value))),
    }
}

fn resolve_mapping(
    fields: Vec<(String, Spec)>,
    level: usize,
) -> Result<Mapping, SchemaDefinitionError> {
    if fields.len() > MAX_MAPPING_FIELDS {
        return Err(SchemaDefinitionError::TooManyChildren {
            kind: "mapping",
            count: fields.len(),
            max: MAX_MAPPING_FIELDS,
        });
    }

    let mut seen = HashSet::with_capacity(fields.len());
    let mut resolved = Vec::with_capacity(fields.len());
    for (key, spec) in fields {
        if !seen.insert(key.clone()) {
            return Err(SchemaDefinitionError::DuplicateKey { key });
        }
        let schema = resolve(spec, level + 1)?;
        resolved.push(Field { key, schema });
    }

    Ok(Mapping {
        fields: resolved,
        closed: false,
    })
}

fn resolve_children(
    kind: &'static str,
    children: Vec<Spec>,
    level: usize,
) -> Result<Vec<Schema>, SchemaDefinitionError> {
    if children.len() > MAX_COMBINATOR_CHILDREN {
        return Err(SchemaDefinitionError::TooManyChildren {
            kind,
            count: children.len(),
            max: MAX_COMBINATOR_CHILDREN,
        });
    }
    children
        .into_iter()
        .map(|child| resolve(child, level + 1))
        .collect()
}

fn resolve_descriptor(
    descriptor: Descriptor,
    level: usize,
) -> Result<Schema, SchemaDefinitionError> {
    let node = match descriptor {
        Descriptor::Optional(optional) => SchemaNode::Optional(resolve_optional(optional, level)?),
        Descriptor::Check(predicate) => SchemaNode::Check(predicate),
        Descriptor::Coerce(transform) => SchemaNode::Coerce(transform),
        Descriptor::And(children) => SchemaNode::And(resolve_children("and", children, level)?),
        Descriptor::Or(children) => {
            if children.is_empty() {
                return Err(SchemaDefinitionError::EmptyAlternatives);
            }
            SchemaNode::Or(resolve_children("or", children, level)?)
        }
        Descriptor::Pattern(pattern) => {
            if pattern.len() > MAX_PATTERN_LENGTH {
                return Err(SchemaDefinitionError::PatternTooLong {
                    len: pattern.len(),
                    max: MAX_PATTERN_LENGTH,
                });
            }
            let regex = regex::Regex::new(&pattern).map_err(|e| {
                SchemaDefinitionError::InvalidPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                }
            })?;
            SchemaNode::Pattern(regex)
        }
        Descriptor::Closed(inner) => {
            let schema = resolve(inner, level)?;
            let SchemaNode::Mapping(mapping) = schema.node() else {
                return Err(SchemaDefinitionError::NotAMapping {
                    found: schema.node().kind(),
                });
            };
            SchemaNode::Mapping(Mapping {
                fields: mapping.fields.clone(),
                closed: true,
            })
        }
    };
    Ok(Schema::from_node(node))
}

fn resolve_optional(
    optional: OptionalSpec,
    level: usize,
) -> Result<OptionalNode, SchemaDefinitionError> {
    let inner = resolve(optional.inner, level + 1)?;

    // Fixed defaults are checked once here; factories run per absence.
    if let DefaultValue::Value(default) = &optional.default {
        let diagnostics = inner.diagnose(default);
        if !diagnostics.is_empty() {
            return Err(SchemaDefinitionError::InvalidDefault {
                detail: diagnostics
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; "),
            });
        }
    }

    Ok(OptionalNode {
        inner,
        default: optional.default,
        empty_as_absent: optional.empty_as_absent,
    })
}
