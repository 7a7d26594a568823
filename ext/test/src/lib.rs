//! conform-test: Test domain for conformance testing
//!
//! Provides a small catalog of named predicates and transforms so that
//! schemas can be described as data (see [`fixture`], feature `fixtures`).
//! This is also the reference for how to package reusable callbacks.
//!
//! # Example
//!
//! ```
//! use conform_test::prelude::*;
//!
//! let schema = normalize(Spec::map([
//!     ("card", check("luhn").unwrap()),
//!     ("qty", coercion("parse_int").unwrap()),
//! ]))
//! .unwrap();
//!
//! let input = Value::object([("card", "4111111111111111"), ("qty", "3")]);
//! assert_eq!(schema.coerce(&input).unwrap().get("qty"), Some(&Value::Int(3)));
//! ```

use conform::prelude::*;

#[cfg(feature = "fixtures")]
pub mod fixture;

// ═══════════════════════════════════════════════════════════════════════════════
// Predicates
// ═══════════════════════════════════════════════════════════════════════════════

/// Accepts digit strings and non-negative integers passing the Luhn checksum.
#[derive(Debug, Clone, Copy)]
pub struct Luhn;

impl Predicate for Luhn {
    fn test(&self, value: &Value) -> Result<bool, CallbackError> {
        let digits = match value {
            Value::Int(i) if *i >= 0 => i.to_string(),
            Value::String(s) => s.clone(),
            _ => return Ok(false),
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Ok(false);
        }
        let sum: u32 = digits
            .bytes()
            .rev()
            .map(|b| u32::from(b - b'0'))
            .enumerate()
            .map(|(i, d)| {
                if i % 2 == 1 {
                    let doubled = d * 2;
                    if doubled > 9 {
                        doubled - 9
                    } else {
                        doubled
                    }
                } else {
                    d
                }
            })
            .sum();
        Ok(sum % 10 == 0)
    }

    fn name(&self) -> &str {
        "luhn"
    }
}

/// Loose email shape: `user@domain.tld`.
#[derive(Debug, Clone, Copy)]
pub struct IsEmail;

impl Predicate for IsEmail {
    fn test(&self, value: &Value) -> Result<bool, CallbackError> {
        Ok(value
            .as_str()
            .and_then(|s| s.split_once('@'))
            .is_some_and(|(user, domain)| {
                !user.is_empty() && domain.split_once('.').is_some_and(|(d, tld)| !d.is_empty() && !tld.is_empty())
            }))
    }

    fn name(&self) -> &str {
        "is_email"
    }
}

/// Numbers greater than zero. Errors on non-numbers.
#[derive(Debug, Clone, Copy)]
pub struct Positive;

impl Predicate for Positive {
    fn test(&self, value: &Value) -> Result<bool, CallbackError> {
        value
            .as_float()
            .map(|x| x > 0.0)
            .ok_or_else(|| CallbackError::new(format!("expected a number, found {}", value.type_name())))
    }

    fn name(&self) -> &str {
        "positive"
    }
}

/// Non-empty strings, lists and maps.
#[derive(Debug, Clone, Copy)]
pub struct NonEmpty;

impl Predicate for NonEmpty {
    fn test(&self, value: &Value) -> Result<bool, CallbackError> {
        Ok(match value {
            Value::String(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Map(map) => !map.is_empty(),
            _ => false,
        })
    }

    fn name(&self) -> &str {
        "non_empty"
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Transforms
// ═══════════════════════════════════════════════════════════════════════════════

/// Parses a decimal string into an integer; integers pass through.
#[derive(Debug, Clone, Copy)]
pub struct ParseInt;

impl Transform for ParseInt {
    fn apply(&self, value: &Value) -> Result<Value, CallbackError> {
        match value {
            Value::Int(i) => Ok(Value::Int(*i)),
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(CallbackError::from_error),
            other => Err(CallbackError::new(format!(
                "cannot parse {} as int",
                other.type_name()
            ))),
        }
    }

    fn name(&self) -> &str {
        "parse_int"
    }
}

/// Strips surrounding whitespace from strings.
#[derive(Debug, Clone, Copy)]
pub struct Trim;

impl Transform for Trim {
    fn apply(&self, value: &Value) -> Result<Value, CallbackError> {
        value
            .as_str()
            .map(|s| Value::from(s.trim()))
            .ok_or_else(|| CallbackError::new("expected a string"))
    }

    fn name(&self) -> &str {
        "trim"
    }
}

/// Upper-cases strings.
#[derive(Debug, Clone, Copy)]
pub struct ToUpper;

impl Transform for ToUpper {
    fn apply(&self, value: &Value) -> Result<Value, CallbackError> {
        value
            .as_str()
            .map(|s| Value::from(s.to_uppercase()))
            .ok_or_else(|| CallbackError::new("expected a string"))
    }

    fn name(&self) -> &str {
        "to_upper"
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Catalog
// ═══════════════════════════════════════════════════════════════════════════════

/// Names accepted by [`check`].
pub const PREDICATES: &[&str] = &["luhn", "is_email", "positive", "non_empty"];

/// Names accepted by [`coercion`].
pub const TRANSFORMS: &[&str] = &["parse_int", "trim", "to_upper"];

/// A `check` spec for a catalog predicate, or `None` for an unknown name.
#[must_use]
pub fn check(name: &str) -> Option<Spec> {
    Some(match name {
        "luhn" => Spec::check_with(Luhn),
        "is_email" => Spec::check_with(IsEmail),
        "positive" => Spec::check_with(Positive),
        "non_empty" => Spec::check_with(NonEmpty),
        _ => return None,
    })
}

/// A `coerce` spec for a catalog transform, or `None` for an unknown name.
#[must_use]
pub fn coercion(name: &str) -> Option<Spec> {
    Some(match name {
        "parse_int" => Spec::coerce_with(ParseInt),
        "trim" => Spec::coerce_with(Trim),
        "to_upper" => Spec::coerce_with(ToUpper),
        _ => return None,
    })
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{check, coercion, IsEmail, Luhn, NonEmpty, ParseInt, Positive, ToUpper, Trim};
    pub use conform::prelude::*;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_luhn() {
        assert_eq!(Luhn.test(&Value::from(4_111_111_111_111_111i64)), Ok(true));
        assert_eq!(Luhn.test(&Value::from("4111111111111111")), Ok(true));
        assert_eq!(Luhn.test(&Value::from("4111111111111112")), Ok(false));
        assert_eq!(Luhn.test(&Value::from("41x1")), Ok(false));
        assert_eq!(Luhn.test(&Value::Null), Ok(false));
    }

    #[test]
    fn test_is_email() {
        assert_eq!(IsEmail.test(&Value::from("a@b.com")), Ok(true));
        assert_eq!(IsEmail.test(&Value::from("bad")), Ok(false));
        assert_eq!(IsEmail.test(&Value::from("@b.com")), Ok(false));
        assert_eq!(IsEmail.test(&Value::from("a@b.")), Ok(false));
    }

    #[test]
    fn test_positive_errors_on_non_numbers() {
        assert_eq!(Positive.test(&Value::from(2)), Ok(true));
        assert_eq!(Positive.test(&Value::from(-0.5)), Ok(false));
        assert!(Positive.test(&Value::from("2")).is_err());
    }

    #[test]
    fn test_transforms() {
        assert_eq!(ParseInt.apply(&Value::from(" 42 ")), Ok(Value::Int(42)));
        assert_eq!(ParseInt.apply(&Value::Int(7)), Ok(Value::Int(7)));
        assert!(ParseInt.apply(&Value::from("x")).is_err());
        assert_eq!(Trim.apply(&Value::from("  hi ")), Ok(Value::from("hi")));
        assert_eq!(ToUpper.apply(&Value::from("hi")), Ok(Value::from("HI")));
    }

    #[test]
    fn test_catalog_covers_every_name() {
        assert!(PREDICATES.iter().all(|name| check(name).is_some()));
        assert!(TRANSFORMS.iter().all(|name| coercion(name).is_some()));
        assert!(check("nope").is_none());
        assert!(coercion("nope").is_none());
    }

    #[test]
    fn test_catalog_in_a_schema() {
        let schema = normalize(Spec::map([
            ("card", check("luhn").unwrap()),
            ("name", Spec::and([coercion("trim").unwrap(), check("non_empty").unwrap()])),
        ]))
        .unwrap();

        assert!(schema.validate(&Value::object([("card", "4111111111111111"), ("name", " x ")])));
        assert!(!schema.validate(&Value::object([("card", "4111111111111111"), ("name", "   ")])));
    }
}
