//! Polling engine: run an operation under a hard time budget.
//!
//! Every wait in the crate funnels through [`TimedRun`]. The operation runs
//! on its own named OS thread so that a hang inside it (a driver call that
//! never returns) cannot stall timeout detection. The caller waits on a
//! bounded channel with `recv_timeout`.
//!
//! ```text
//!  caller                         echo-poll-<op> thread
//!    │  spawn ──────────────────────▶ catch_unwind(op)
//!    │  recv_timeout(budget)               │
//!    │◀──────────────────── send(outcome) ──┘
//!    ▼
//!  Ready / Suppressed / Err / resume_unwind / Timeout (+ cancel token)
//! ```
//!
//! Rust threads cannot be killed. On timeout the engine raises the
//! [`CancelToken`] handed to the operation and detaches the thread; loops
//! that check the token stop at their next attempt.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::result::{EchoError, EchoResult, ErrorKind, PollTimeout};

/// Default budget for a timed operation (60 seconds)
pub const DEFAULT_TIMEOUT_MS: u64 = 60_000;

/// Default pause between attempts (500ms)
pub const DEFAULT_FREQUENCY_MS: u64 = 500;

/// Cooperative stop signal shared between the engine and a worker.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Fresh token, not cancelled
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the signal
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether the signal has been raised
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Outcome of a timed run that finished inside its budget.
#[derive(Debug)]
pub enum Polled<T> {
    /// The operation produced a value
    Ready(T),
    /// The operation failed with an error the caller asked to ignore, or
    /// with a timeout that did not come from this run
    Suppressed(EchoError),
}

impl<T> Polled<T> {
    /// Whether a value was produced
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// The value, dropping a suppressed error
    #[must_use]
    pub fn ready(self) -> Option<T> {
        match self {
            Self::Ready(value) => Some(value),
            Self::Suppressed(_) => None,
        }
    }

    /// The value, or the suppressed error surfaced again
    pub fn into_result(self) -> EchoResult<T> {
        match self {
            Self::Ready(value) => Ok(value),
            Self::Suppressed(err) => Err(err),
        }
    }
}

/// Builder for a single timed call.
///
/// ```
/// use std::time::Duration;
/// use echo::poll::{Polled, TimedRun};
///
/// let out = TimedRun::new("answer", Duration::from_secs(1))
///     .run(|| Ok(42))
///     .unwrap();
/// assert!(matches!(out, Polled::Ready(42)));
/// ```
#[derive(Debug, Clone)]
pub struct TimedRun {
    operation: String,
    timeout: Duration,
    ignore: Vec<ErrorKind>,
    message: Option<String>,
    cancel: CancelToken,
}

impl TimedRun {
    /// Time `operation` against `timeout`
    #[must_use]
    pub fn new(operation: impl Into<String>, timeout: Duration) -> Self {
        Self {
            operation: operation.into(),
            timeout,
            ignore: Vec::new(),
            message: None,
            cancel: CancelToken::new(),
        }
    }

    /// Error kinds reported as [`Polled::Suppressed`] instead of `Err`
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

    /// Token raised when the budget runs out
    #[must_use]
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Operation name
    #[must_use]
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Budget
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `op` on a fresh thread and wait at most the budget for it.
    ///
    /// A result that arrives at or after the budget still counts as a
    /// timeout. A panic inside `op` is resumed on the calling thread.
    pub fn run<T, F>(self, op: F) -> EchoResult<Polled<T>>
    where
        T: Send + 'static,
        F: FnOnce() -> EchoResult<T> + Send + 'static,
    {
        let (tx, rx) = mpsc::sync_channel(1);
        let started = Instant::now();

        thread::Builder::new()
            .name(worker_name(&self.operation))
            .spawn(move || {
                let outcome = panic::catch_unwind(AssertUnwindSafe(op));
                // The caller may have given up already.
                let _ = tx.send(outcome);
            })?;

        let received = rx.recv_timeout(self.timeout);
        let elapsed = started.elapsed();

        let outcome = match received {
            Ok(_) | Err(RecvTimeoutError::Timeout) if elapsed >= self.timeout => {
                return Err(self.expire(elapsed));
            }
            Err(RecvTimeoutError::Timeout) => return Err(self.expire(elapsed)),
            Err(RecvTimeoutError::Disconnected) => {
                return Err(EchoError::Io(std::io::Error::other(format!(
                    "worker for '{}' exited without reporting",
                    self.operation
                ))));
            }
            Ok(outcome) => outcome,
        };

        match outcome {
            Err(payload) => panic::resume_unwind(payload),
            Ok(Ok(value)) => Ok(Polled::Ready(value)),
            Ok(Err(err)) if self.ignore.contains(&err.kind()) => {
                tracing::debug!(
                    operation = %self.operation,
                    kind = %err.kind(),
                    error = %err,
                    "ignored error from timed operation"
                );
                Ok(Polled::Suppressed(err))
            }
            Ok(Err(err)) if err.kind() == ErrorKind::Timeout => {
                tracing::debug!(
                    operation = %self.operation,
                    elapsed_ms = elapsed.as_millis() as u64,
                    error = %err,
                    "operation reported a timeout before its budget ran out"
                );
                Ok(Polled::Suppressed(err))
            }
            Ok(Err(err)) => Err(err),
        }
    }

    fn expire(self, elapsed: Duration) -> EchoError {
        self.cancel.cancel();
        tracing::warn!(
            operation = %self.operation,
            timeout_ms = self.timeout.as_millis() as u64,
            elapsed_ms = elapsed.as_millis() as u64,
            "budget exceeded, abandoning worker thread"
        );
        EchoError::Timeout(PollTimeout {
            operation: self.operation,
            timeout: self.timeout,
            message: self.message,
        })
    }
}

/// Shorthand for `TimedRun::new(operation, timeout).run(op)`
pub fn run_with_timeout<T, F>(
    operation: impl Into<String>,
    timeout: Duration,
    op: F,
) -> EchoResult<Polled<T>>
where
    T: Send + 'static,
    F: FnOnce() -> EchoResult<T> + Send + 'static,
{
    TimedRun::new(operation, timeout).run(op)
}

/// Thread name for a worker; interior NULs are not allowed in names
fn worker_name(operation: &str) -> String {
    format!("echo-poll-{}", operation.replace('\0', "\u{FFFD}"))
}
