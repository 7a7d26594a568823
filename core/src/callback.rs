//! `Predicate` and `Transform`: User-supplied functions inside a schema
//!
//! Both traits are intentionally **non-generic** and object-safe: a schema
//! stores them as `Arc<dyn Predicate>` / `Arc<dyn Transform>` and shares them
//! across threads together with the rest of the tree.
//!
//! The engine never lets a callback crash a match. An `Err` return and a
//! panic are both turned into a [`Failure`](crate::Failure) at the path being
//! matched (see [`guarded`]).

use crate::Value;
use std::fmt::{self, Debug};
use std::panic::{self, AssertUnwindSafe};

/// Error returned by a [`Predicate`] or [`Transform`] that could not decide.
///
/// Carried into the failure detail verbatim, so keep it free of payload data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct CallbackError {
    message: String,
}

impl CallbackError {
    /// Create an error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Wrap any standard error, keeping its `Display` text.
    pub fn from_error<E: std::error::Error>(err: E) -> Self {
        Self::new(err.to_string())
    }

    /// The error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<&str> for CallbackError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for CallbackError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

/// A one-argument boolean test over a [`Value`].
///
/// # Example
///
/// ```
/// use conform::{CallbackError, Predicate, Value};
///
/// #[derive(Debug)]
/// struct Positive;
///
/// impl Predicate for Positive {
///     fn test(&self, value: &Value) -> Result<bool, CallbackError> {
///         value.as_int().map(|i| i > 0).ok_or_else(|| "not an int".into())
///     }
/// }
///
/// assert_eq!(Positive.test(&Value::from(3)), Ok(true));
/// assert!(Positive.test(&Value::from("3")).is_err());
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` does not implement `Predicate`",
    label = "this type cannot be used as a schema predicate",
    note = "wrap a closure with `FnPredicate::new(name, |v| ...)` or `Spec::check(name, |v| ...)`"
)]
pub trait Predicate: Send + Sync + Debug {
    /// Decide whether `value` passes.
    ///
    /// `Ok(false)` and `Err(_)` both reject the value; an `Err` carries a reason.
    fn test(&self, value: &Value) -> Result<bool, CallbackError>;

    /// Name used in diagnostics.
    fn name(&self) -> &str {
        "predicate"
    }
}

/// A one-argument value transform that may fail.
#[diagnostic::on_unimplemented(
    message = "`{Self}` does not implement `Transform`",
    label = "this type cannot be used as a schema transform",
    note = "wrap a closure with `FnTransform::new(name, |v| ...)` or `Spec::coerce(name, |v| ...)`"
)]
pub trait Transform: Send + Sync + Debug {
    /// Produce the replacement value, or fail.
    fn apply(&self, value: &Value) -> Result<Value, CallbackError>;

    /// Name used in diagnostics.
    fn name(&self) -> &str {
        "transform"
    }
}

type PredicateFn = dyn Fn(&Value) -> Result<bool, CallbackError> + Send + Sync;
type TransformFn = dyn Fn(&Value) -> Result<Value, CallbackError> + Send + Sync;

/// Closure-backed [`Predicate`] with a diagnostic name.
pub struct FnPredicate {
    name: String,
    f: Box<PredicateFn>,
}

impl FnPredicate {
    /// Wrap an infallible boolean closure.
    pub fn new<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            f: Box::new(move |v| Ok(f(v))),
        }
    }

    /// Wrap a closure that may report why it could not decide.
    pub fn fallible<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Value) -> Result<bool, CallbackError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            f: Box::new(f),
        }
    }
}

impl Predicate for FnPredicate {
    fn test(&self, value: &Value) -> Result<bool, CallbackError> {
        (self.f)(value)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Debug for FnPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FnPredicate").field(&self.name).finish()
    }
}

/// Closure-backed [`Transform`] with a diagnostic name.
pub struct FnTransform {
    name: String,
    f: Box<TransformFn>,
}

impl FnTransform {
    /// Wrap a fallible transform closure.
    pub fn new<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, CallbackError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            f: Box::new(f),
        }
    }
}

impl Transform for FnTransform {
    fn apply(&self, value: &Value) -> Result<Value, CallbackError> {
        (self.f)(value)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Debug for FnTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FnTransform").field(&self.name).finish()
    }
}

/// Run a user callback, converting a panic into a [`CallbackError`].
///
/// Panics are logged at `warn` level because they usually indicate a bug in
/// the callback rather than bad input. The panic message may be built from
/// the input, so it goes to the log only and the returned error names the
/// callback alone.
pub(crate) fn guarded<T>(
    name: &str,
    call: impl FnOnce() -> Result<T, CallbackError>,
) -> Result<T, CallbackError> {
    match panic::catch_unwind(AssertUnwindSafe(call)) {
        Ok(result) => result,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".to_string());
            tracing::warn!(callback = name, %message, "schema callback panicked");
            Err(CallbackError::new(format!("{name} panicked")))
        }
    }
}
