//! Per-call match configuration.

/// How a single match call collects and renders failures.
///
/// The options never change the verdict: fail-fast and collect-all agree on
/// whether a value matches, they only differ in how many failures are
/// reported. Verbose mode only changes failure details.
///
/// # Example
///
/// ```
/// use conform::MatchOptions;
///
/// let opts = MatchOptions::validation().with_verbose(true);
/// assert!(opts.fail_fast);
/// assert!(opts.verbose);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct MatchOptions {
    /// Stop at the first failing mapping field or sequence element.
    pub fail_fast: bool,

    /// Include a rendering of the offending value in failure details.
    ///
    /// Off by default so diagnostics can be logged without leaking payloads.
    pub verbose: bool,
}

impl MatchOptions {
    /// Options used by [`Schema::validate`](crate::Schema::validate): fail fast, terse.
    #[must_use]
    pub const fn validation() -> Self {
        Self {
            fail_fast: true,
            verbose: false,
        }
    }

    /// Options used by [`Schema::coerce`](crate::Schema::coerce): collect everything, terse.
    #[must_use]
    pub const fn coercion() -> Self {
        Self {
            fail_fast: false,
            verbose: false,
        }
    }

    /// Set fail-fast collection.
    #[must_use]
    pub const fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Set verbose failure details.
    #[must_use]
    pub const fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self::coercion()
    }
}
