//! Condition waits built on the polling engine.
//!
//! Three retrieval modes share one loop: call a function, judge its result,
//! sleep `frequency`, repeat. The whole loop runs inside a single
//! [`TimedRun`], so the budget is enforced even if one call hangs.
//!
//! - [`wait_for_condition`] (alias [`wait_until`]): done when the result is
//!   [`Truthy`]
//! - [`wait_for_value`]: done when the result equals a target
//! - [`wait_for_result`]: done when a [`ResultFilter`] accepts the result

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::thread;
use std::time::Duration;

use crate::driver::ElementHandle;
use crate::poll::{CancelToken, TimedRun, DEFAULT_FREQUENCY_MS, DEFAULT_TIMEOUT_MS};
use crate::result::{EchoError, EchoResult, ErrorKind};

// =============================================================================
// WAIT OPTIONS
// =============================================================================

/// Options for a wait
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitOptions {
    /// Budget in milliseconds
    pub timeout_ms: u64,
    /// Pause between attempts in milliseconds
    pub frequency_ms: u64,
    /// Error kinds swallowed between attempts
    pub ignore: Vec<ErrorKind>,
    /// Context for the timeout message
    pub message: Option<String>,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            frequency_ms: DEFAULT_FREQUENCY_MS,
            ignore: Vec::new(),
            message: None,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set pause between attempts in milliseconds
    #[must_use]
    pub const fn with_frequency(mut self, frequency_ms: u64) -> Self {
        self.frequency_ms = frequency_ms;
        self
    }

    /// Swallow errors of these kinds and keep polling
    #[must_use]
    pub fn ignoring(mut self, kinds: impl IntoIterator<Item = ErrorKind>) -> Self {
        self.ignore.extend(kinds);
        self
    }

    /// Context appended to the timeout message
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get frequency as Duration
    #[must_use]
    pub const fn frequency(&self) -> Duration {
        Duration::from_millis(self.frequency_ms)
    }

    /// Reject options that cannot describe a wait
    pub fn validate(&self) -> EchoResult<()> {
        if self.timeout_ms == 0 {
            return Err(EchoError::configuration("wait timeout must be greater than zero"));
        }
        Ok(())
    }
}

// =============================================================================
// ATTEMPTS
// =============================================================================

/// Attempt sequence: yields at once, then after each `frequency` pause,
/// until the token is cancelled.
#[derive(Debug)]
pub struct Attempts {
    frequency: Duration,
    cancel: CancelToken,
    count: u32,
}

impl Attempts {
    /// Attempts paced by `frequency`, stopped by `cancel`
    #[must_use]
    pub const fn new(frequency: Duration, cancel: CancelToken) -> Self {
        Self {
            frequency,
            cancel,
            count: 0,
        }
    }
}

impl Iterator for Attempts {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        if self.cancel.is_cancelled() {
            return None;
        }
        if self.count > 0 {
            thread::sleep(self.frequency);
            if self.cancel.is_cancelled() {
                return None;
            }
        }
        self.count = self.count.saturating_add(1);
        Some(self.count)
    }
}

// =============================================================================
// TRUTHINESS
// =============================================================================

/// "Does this result count as a yes?"
///
/// Zero, empty, absent and false values are falsy; everything else is truthy.
pub trait Truthy {
    /// Whether the value counts as success for a condition wait
    fn is_truthy(&self) -> bool;
}

impl Truthy for bool {
    fn is_truthy(&self) -> bool {
        *self
    }
}

macro_rules! truthy_numbers {
    ($($t:ty),*) => {
        $(impl Truthy for $t {
            fn is_truthy(&self) -> bool {
                *self != 0
            }
        })*
    };
}

truthy_numbers!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

impl Truthy for f32 {
    fn is_truthy(&self) -> bool {
        *self != 0.0
    }
}

impl Truthy for f64 {
    fn is_truthy(&self) -> bool {
        *self != 0.0
    }
}

impl Truthy for () {
    fn is_truthy(&self) -> bool {
        false
    }
}

impl Truthy for String {
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }
}

impl Truthy for &str {
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }
}

impl<T> Truthy for Vec<T> {
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }
}

impl<K, V, S> Truthy for HashMap<K, V, S> {
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }
}

impl<T, S> Truthy for HashSet<T, S> {
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }
}

impl<K, V> Truthy for BTreeMap<K, V> {
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }
}

impl<T: Truthy> Truthy for Option<T> {
    fn is_truthy(&self) -> bool {
        self.as_ref().is_some_and(Truthy::is_truthy)
    }
}

impl Truthy for serde_json::Value {
    fn is_truthy(&self) -> bool {
        use serde_json::Value;
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
            Value::String(s) => !s.is_empty(),
            Value::Array(a) => !a.is_empty(),
            Value::Object(o) => !o.is_empty(),
        }
    }
}

impl Truthy for ElementHandle {
    fn is_truthy(&self) -> bool {
        true
    }
}

// =============================================================================
// RESULT FILTER
// =============================================================================

/// Results that keep a [`wait_for_result`] polling
#[derive(Debug, Clone, Default, PartialEq)]
pub enum IgnoreResults<T> {
    /// Every falsy result
    #[default]
    Falsy,
    /// Exactly these results
    Values(Vec<T>),
}

type RejectFn<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;

/// Acceptance rule for [`wait_for_result`].
///
/// A result is accepted when it is not ignored and the reject predicate
/// returns false. The default ignores falsy results and rejects nothing.
pub struct ResultFilter<T> {
    ignore: IgnoreResults<T>,
    reject: Option<RejectFn<T>>,
}

impl<T> Default for ResultFilter<T> {
    fn default() -> Self {
        Self {
            ignore: IgnoreResults::Falsy,
            reject: None,
        }
    }
}

impl<T> fmt::Debug for ResultFilter<T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultFilter")
            .field("ignore", &self.ignore)
            .field("reject", &self.reject.is_some())
            .finish()
    }
}

impl<T: Truthy + PartialEq> ResultFilter<T> {
    /// Default filter
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep polling while the result is one of `values`
    #[must_use]
    pub fn ignore_values(mut self, values: Vec<T>) -> Self {
        self.ignore = IgnoreResults::Values(values);
        self
    }

    /// Keep polling while `reject` returns true for the result
    #[must_use]
    pub fn reject_with(mut self, reject: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        self.reject = Some(Box::new(reject));
        self
    }

    /// Whether `value` ends the wait
    #[must_use]
    pub fn accepts(&self, value: &T) -> bool {
        let ignored = match &self.ignore {
            IgnoreResults::Falsy => !value.is_truthy(),
            IgnoreResults::Values(values) => values.contains(value),
        };
        !ignored && !self.reject.as_ref().is_some_and(|reject| reject(value))
    }
}

// =============================================================================
// WAITS
// =============================================================================

fn poll_until<T, F, A>(operation: &str, options: &WaitOptions, mut func: F, accept: A) -> EchoResult<T>
where
    T: Send + 'static,
    F: FnMut() -> EchoResult<T> + Send + 'static,
    A: Fn(&T) -> bool + Send + 'static,
{
    options.validate()?;

    let token = CancelToken::new();
    let attempts = Attempts::new(options.frequency(), token.clone());
    let ignore = options.ignore.clone();
    let name = operation.to_string();

    let mut run = TimedRun::new(operation, options.timeout()).with_cancel(token);
    if let Some(message) = &options.message {
        run = run.with_message(message.clone());
    }

    let polled = run.run(move || {
        for attempt in attempts {
            match func() {
                Ok(value) if accept(&value) => return Ok(value),
                Ok(_) => tracing::trace!(operation = %name, attempt, "result not accepted yet"),
                Err(err) if ignore.contains(&err.kind()) || err.kind() == ErrorKind::Timeout => {
                    tracing::debug!(
                        operation = %name,
                        attempt,
                        kind = %err.kind(),
                        error = %err,
                        "ignored error while polling"
                    );
                }
                Err(err) => return Err(err),
            }
        }
        Err(EchoError::Cancelled { operation: name })
    })?;

    polled.into_result()
}

/// Poll `func` until its result is truthy, returning that result.
///
/// ```
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use std::sync::Arc;
/// use echo::wait::{wait_for_condition, WaitOptions};
///
/// let calls = Arc::new(AtomicU32::new(0));
/// let seen = Arc::clone(&calls);
/// let third = wait_for_condition(
///     move || Ok(seen.fetch_add(1, Ordering::SeqCst) >= 2),
///     &WaitOptions::new().with_timeout(2_000).with_frequency(5),
/// )
/// .unwrap();
/// assert!(third);
/// ```
pub fn wait_for_condition<T, F>(func: F, options: &WaitOptions) -> EchoResult<T>
where
    T: Truthy + Send + 'static,
    F: FnMut() -> EchoResult<T> + Send + 'static,
{
    poll_until("wait_for_condition", options, func, |value: &T| value.is_truthy())
}

/// Alias of [`wait_for_condition`]
pub fn wait_until<T, F>(func: F, options: &WaitOptions) -> EchoResult<T>
where
    T: Truthy + Send + 'static,
    F: FnMut() -> EchoResult<T> + Send + 'static,
{
    poll_until("wait_until", options, func, |value: &T| value.is_truthy())
}

/// Poll `func` until it returns a value equal to `target`
pub fn wait_for_value<T, F>(target: T, func: F, options: &WaitOptions) -> EchoResult<T>
where
    T: PartialEq + Send + 'static,
    F: FnMut() -> EchoResult<T> + Send + 'static,
{
    poll_until("wait_for_value", options, func, move |value: &T| *value == target)
}

/// Poll `func` until `filter` accepts its result
pub fn wait_for_result<T, F>(func: F, options: &WaitOptions, filter: ResultFilter<T>) -> EchoResult<T>
where
    T: Truthy + PartialEq + Send + 'static,
    F: FnMut() -> EchoResult<T> + Send + 'static,
{
    poll_until("wait_for_result", options, func, move |value: &T| filter.accepts(value))
}
