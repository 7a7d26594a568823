//! Conformance test fixture runner
//!
//! Loads YAML fixtures describing a schema and a list of cases, builds the
//! schema through [`normalize`], and checks every case against the engine.

use conform::prelude::*;
use serde::Deserialize;

use crate::{check, coercion};

/// A complete test fixture
#[derive(Debug, Deserialize)]
pub struct Fixture {
    pub name: String,
    pub description: String,
    pub schema: SchemaConfig,
    /// When set, `normalize` must fail with an error whose message contains this text.
    #[serde(default)]
    pub definition_error: Option<String>,
    #[serde(default)]
    pub cases: Vec<TestCase>,
}

/// Schema description from YAML.
/// Uses untagged deserialization: each form is identified by its key.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SchemaConfig {
    Type(TypeSchema),
    Literal(LiteralSchema),
    Map(MapSchema),
    List(ListSchema),
    Optional(OptionalSchema),
    Check(CheckSchema),
    Coerce(CoerceSchema),
    And(AndSchema),
    Or(OrSchema),
    Pattern(PatternSchema),
}

#[derive(Debug, Clone, Deserialize)]
pub struct TypeSchema {
    #[serde(rename = "type")]
    pub type_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LiteralSchema {
    pub literal: serde_json::Value,
}

/// Field order in `map` is kept, so diagnostics come out in declaration order.
#[derive(Debug, Clone, Deserialize)]
pub struct MapSchema {
    pub map: serde_yaml::Mapping,
    #[serde(default)]
    pub closed: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListSchema {
    pub list: Vec<SchemaConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OptionalSchema {
    pub optional: Box<SchemaConfig>,
    #[serde(default)]
    pub default: Option<serde_json::Value>,
    #[serde(default)]
    pub empty_as_absent: bool,
    #[serde(default)]
    pub omit_when_absent: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckSchema {
    pub check: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoerceSchema {
    pub coerce: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AndSchema {
    pub and: Vec<SchemaConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrSchema {
    pub or: Vec<SchemaConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PatternSchema {
    pub pattern: String,
}

/// Test case
#[derive(Debug, Deserialize)]
pub struct TestCase {
    pub name: String,
    pub input: serde_json::Value,
    pub expect: Expectation,
}

/// Expected verdict, and optionally the coerced output and failures.
#[derive(Debug, Deserialize)]
pub struct Expectation {
    pub ok: bool,
    #[serde(default)]
    pub output: Option<serde_json::Value>,
    #[serde(default)]
    pub failures: Option<Vec<ExpectedFailure>>,
}

/// A failure as written in a fixture: rendered path plus `snake_case` kind.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExpectedFailure {
    pub path: String,
    pub kind: String,
    #[serde(default)]
    pub causes: Vec<ExpectedFailure>,
}

impl ExpectedFailure {
    fn from_failure(failure: &Failure, with_causes: bool) -> Self {
        Self {
            path: failure.path.to_string(),
            kind: failure.kind.as_str().to_string(),
            causes: if with_causes {
                failure.causes.iter().map(|c| Self::from_failure(c, true)).collect()
            } else {
                Vec::new()
            },
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Builder: Convert config to a raw spec
// ═══════════════════════════════════════════════════════════════════════════════

impl SchemaConfig {
    /// Build the raw spec described by this config.
    ///
    /// # Errors
    ///
    /// Returns a message for unknown type, predicate or transform names and
    /// malformed `map` entries.
    pub fn build(&self) -> Result<Spec, String> {
        match self {
            Self::Type(t) => type_tag(&t.type_name).map(Spec::from),
            Self::Literal(l) => Ok(Spec::literal(Value::from(l.literal.clone()))),
            Self::Map(m) => {
                let mut fields = Vec::with_capacity(m.map.len());
                for (key, value) in &m.map {
                    let key = key
                        .as_str()
                        .ok_or_else(|| format!("map key must be a string: {key:?}"))?;
                    let config: SchemaConfig = serde_yaml::from_value(value.clone())
                        .map_err(|e| format!("field {key}: {e}"))?;
                    fields.push((key.to_string(), config.build()?));
                }
                let spec = Spec::Map(fields);
                Ok(if m.closed { Spec::closed(spec) } else { spec })
            }
            Self::List(l) => l
                .list
                .iter()
                .map(SchemaConfig::build)
                .collect::<Result<Vec<_>, _>>()
                .map(Spec::List),
            Self::Optional(o) => {
                let mut optional = Spec::optional(o.optional.build()?);
                if let Some(default) = &o.default {
                    optional = optional.default(Value::from(default.clone()));
                }
                if o.omit_when_absent {
                    optional = optional.omit_when_absent();
                }
                if o.empty_as_absent {
                    optional = optional.empty_as_absent();
                }
                Ok(optional.into())
            }
            Self::Check(c) => check(&c.check).ok_or_else(|| format!("unknown predicate {:?}", c.check)),
            Self::Coerce(c) => {
                coercion(&c.coerce).ok_or_else(|| format!("unknown transform {:?}", c.coerce))
            }
            Self::And(a) => Ok(Spec::and(build_all(&a.and)?)),
            Self::Or(o) => Ok(Spec::or(build_all(&o.or)?)),
            Self::Pattern(p) if p.pattern == "email" => Ok(Spec::email()),
            Self::Pattern(p) => Ok(Spec::pattern(p.pattern.as_str())),
        }
    }
}

fn build_all(configs: &[SchemaConfig]) -> Result<Vec<Spec>, String> {
    configs.iter().map(SchemaConfig::build).collect()
}

fn type_tag(name: &str) -> Result<TypeTag, String> {
    Ok(match name {
        "null" => TypeTag::Null,
        "bool" => TypeTag::Bool,
        "int" => TypeTag::Int,
        "float" => TypeTag::Float,
        "number" => TypeTag::Number,
        "string" => TypeTag::String,
        "bytes" => TypeTag::Bytes,
        "list" => TypeTag::List,
        "map" => TypeTag::Map,
        "any" => TypeTag::Any,
        other => return Err(format!("unknown type {other:?}")),
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// Runner
// ═══════════════════════════════════════════════════════════════════════════════

/// Result of running a single test case
#[derive(Debug)]
pub struct CaseResult {
    pub case_name: String,
    pub passed: bool,
    pub message: String,
}

impl CaseResult {
    fn pass(case_name: &str) -> Self {
        Self {
            case_name: case_name.to_string(),
            passed: true,
            message: String::new(),
        }
    }

    fn fail(case_name: &str, message: String) -> Self {
        Self {
            case_name: case_name.to_string(),
            passed: false,
            message,
        }
    }
}

impl Fixture {
    /// Parse a fixture from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Parse multiple fixtures from a YAML file with `---` separators
    pub fn from_yaml_multi(yaml: &str) -> Result<Vec<Self>, serde_yaml::Error> {
        let mut fixtures = Vec::new();
        for doc in serde_yaml::Deserializer::from_str(yaml) {
            fixtures.push(Self::deserialize(doc)?);
        }
        Ok(fixtures)
    }

    /// Normalize the fixture's schema.
    ///
    /// # Errors
    ///
    /// Returns a message when the config is malformed or the schema is
    /// rejected by `normalize`.
    pub fn build_schema(&self) -> Result<Schema, String> {
        let spec = self.schema.build()?;
        normalize(spec).map_err(|e| e.to_string())
    }

    /// Run all test cases and return results
    pub fn run(&self) -> Vec<CaseResult> {
        let built = self.build_schema();

        if let Some(expected) = &self.definition_error {
            let result = match built {
                Err(message) if message.contains(expected.as_str()) => {
                    CaseResult::pass("definition_error")
                }
                Err(message) => CaseResult::fail(
                    "definition_error",
                    format!("expected error containing {expected:?}, got {message:?}"),
                ),
                Ok(schema) => CaseResult::fail(
                    "definition_error",
                    format!("expected error containing {expected:?}, got schema {schema:?}"),
                ),
            };
            return vec![result];
        }

        let schema = match built {
            Ok(schema) => schema,
            Err(message) => {
                return vec![CaseResult::fail("build", message)];
            }
        };
        self.cases.iter().map(|case| run_case(&schema, case)).collect()
    }

    /// Run all test cases and panic on first failure
    pub fn run_and_assert(&self) {
        let results = self.run();
        for result in results {
            assert!(
                result.passed,
                "Fixture '{}' case '{}' failed: {}",
                self.name, result.case_name, result.message
            );
        }
    }
}

fn run_case(schema: &Schema, case: &TestCase) -> CaseResult {
    let input = Value::from(case.input.clone());
    let valid = schema.validate(&input);
    let coerced = schema.coerce(&input);

    if valid != coerced.is_ok() {
        return CaseResult::fail(
            &case.name,
            format!("validate returned {valid} but coerce returned {coerced:?}"),
        );
    }
    if valid != case.expect.ok {
        return CaseResult::fail(
            &case.name,
            format!("expected ok={}, got {coerced:?}", case.expect.ok),
        );
    }

    if let (Some(expected), Ok(output)) = (&case.expect.output, &coerced) {
        let expected = Value::from(expected.clone());
        if *output != expected {
            return CaseResult::fail(
                &case.name,
                format!("expected output {expected}, got {output}"),
            );
        }
    }

    if let Some(expected) = &case.expect.failures {
        let diagnostics = schema.diagnose(&input);
        let with_causes = expected.iter().any(|f| !f.causes.is_empty());
        let actual: Vec<ExpectedFailure> = diagnostics
            .iter()
            .map(|f| ExpectedFailure::from_failure(f, with_causes))
            .collect();
        if actual != *expected {
            return CaseResult::fail(
                &case.name,
                format!("expected failures {expected:?}, got:\n{diagnostics}"),
            );
        }
    }

    CaseResult::pass(&case.name)
}
