//! Result and error types for echo.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::driver::HandleId;

/// Result type for echo operations
pub type EchoResult<T> = Result<T, EchoError>;

/// Coarse error classification used by poll ignore sets.
///
/// A polled operation's error is matched against an ignore set by kind, never
/// by message or type name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Engine timeout or a driver-side timeout
    Timeout,
    /// The handle went stale or cannot be re-resolved
    StaleHandle,
    /// Nothing matched a locator
    NotFound,
    /// Invalid caller input
    Configuration,
    /// Element exists but refuses the interaction
    NotInteractable,
    /// Table markup does not have the expected shape
    TableFormat,
    /// Any other driver failure
    Driver,
    /// A poll loop observed its cancel token
    Cancelled,
    /// I/O failure (thread spawn, file access)
    Io,
    /// Serialization failure
    Serialization,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Timeout => "timeout",
            Self::StaleHandle => "stale handle",
            Self::NotFound => "not found",
            Self::Configuration => "configuration",
            Self::NotInteractable => "not interactable",
            Self::TableFormat => "table format",
            Self::Driver => "driver",
            Self::Cancelled => "cancelled",
            Self::Io => "io",
            Self::Serialization => "serialization",
        };
        f.write_str(name)
    }
}

/// Why a handle could not be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaleKind {
    /// Built from a raw handle with no locator: it can never be re-resolved
    Detached,
    /// Was valid, the driver now reports it gone
    Stale,
    /// Re-resolved to a different native node than the one previously seen
    Replaced {
        /// Identity seen before re-resolution
        previous: HandleId,
        /// Identity now bound to the locator
        current: HandleId,
    },
    /// The parent node this node resolves through has been dropped
    ParentReleased,
}

impl fmt::Display for StaleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Detached => f.write_str("detached"),
            Self::Stale => f.write_str("stale"),
            Self::Replaced { previous, current } => {
                write!(f, "replaced ({previous} -> {current})")
            }
            Self::ParentReleased => f.write_str("parent released"),
        }
    }
}

/// The polling engine's own timeout.
///
/// Only [`crate::poll::TimedRun`] constructs this type, so an
/// [`EchoError::Timeout`] always means "this engine ran out of budget".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollTimeout {
    /// Name of the operation that was polled
    pub operation: String,
    /// Configured budget
    pub timeout: Duration,
    /// Caller supplied context
    pub message: Option<String>,
}

impl fmt::Display for PollTimeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Condition for operation '{}' is not met after {} seconds. Error message is '{}'",
            self.operation,
            self.timeout.as_secs_f64(),
            self.message.as_deref().unwrap_or("None")
        )
    }
}

/// Errors that can occur in echo
#[derive(Debug, Error)]
pub enum EchoError {
    /// The polling engine exceeded its budget
    #[error("{0}")]
    Timeout(PollTimeout),

    /// The driver gave up on a command (script or page-load timeout)
    #[error("Driver timed out: {message}")]
    DriverTimeout {
        /// Error message
        message: String,
    },

    /// Handle is stale, replaced or not resolvable
    #[error("Stale handle ({kind}): {message}")]
    StaleHandle {
        /// Which flavour of staleness
        kind: StaleKind,
        /// Error message
        message: String,
    },

    /// Locator produced no match
    #[error("No element found for {locator}")]
    NotFound {
        /// Rendered locator
        locator: String,
    },

    /// Invalid caller input
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message
        message: String,
    },

    /// Element refused the interaction
    #[error("Element not interactable: {message}")]
    NotInteractable {
        /// Error message
        message: String,
    },

    /// Table markup has an unexpected shape
    #[error("Table format error: {message}")]
    TableFormat {
        /// Error message
        message: String,
    },

    /// Generic driver failure
    #[error("Driver error: {message}")]
    Driver {
        /// Error message
        message: String,
    },

    /// Poll loop stopped by its cancel token
    #[error("Operation '{operation}' was cancelled")]
    Cancelled {
        /// Name of the cancelled operation
        operation: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl EchoError {
    /// Classify this error for ignore-set matching
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Timeout(_) | Self::DriverTimeout { .. } => ErrorKind::Timeout,
            Self::StaleHandle { .. } => ErrorKind::StaleHandle,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Configuration { .. } => ErrorKind::Configuration,
            Self::NotInteractable { .. } => ErrorKind::NotInteractable,
            Self::TableFormat { .. } => ErrorKind::TableFormat,
            Self::Driver { .. } => ErrorKind::Driver,
            Self::Cancelled { .. } => ErrorKind::Cancelled,
            Self::Io(_) => ErrorKind::Io,
            Self::Json(_) | Self::Yaml(_) => ErrorKind::Serialization,
        }
    }

    /// True for the two driver answers that mean "this handle is gone"
    #[must_use]
    pub const fn is_stale_or_missing(&self) -> bool {
        matches!(self.kind(), ErrorKind::StaleHandle | ErrorKind::NotFound)
    }

    /// True when re-resolving can never succeed: the node was built from a
    /// raw handle, or the parent it resolves through was dropped
    #[must_use]
    pub const fn is_unrecoverable(&self) -> bool {
        matches!(
            self,
            Self::StaleHandle {
                kind: StaleKind::Detached | StaleKind::ParentReleased,
                ..
            }
        )
    }

    /// True only for the polling engine's own timeout
    #[must_use]
    pub const fn is_poll_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Shorthand for a [`EchoError::StaleHandle`]
    pub fn stale(kind: StaleKind, message: impl Into<String>) -> Self {
        Self::StaleHandle {
            kind,
            message: message.into(),
        }
    }

    /// Shorthand for a [`EchoError::Configuration`]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Shorthand for a [`EchoError::Driver`]
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_timeout_message_combines_context() {
        let err = EchoError::Timeout(PollTimeout {
            operation: "check_condition".into(),
            timeout: Duration::from_secs(3),
            message: Some("button never showed".into()),
        });
        let text = err.to_string();
        assert!(text.contains("check_condition"));
        assert!(text.contains("3 seconds"));
        assert!(text.contains("button never showed"));
    }

    #[test]
    fn test_timeout_without_message_renders_none() {
        let timeout = PollTimeout {
            operation: "op".into(),
            timeout: Duration::from_millis(500),
            message: None,
        };
        assert!(timeout.to_string().ends_with("'None'"));
        assert!(timeout.to_string().contains("0.5 seconds"));
    }

    #[test]
    fn test_driver_timeout_shares_kind_but_is_not_poll_timeout() {
        let foreign = EchoError::DriverTimeout {
            message: "script".into(),
        };
        assert_eq!(foreign.kind(), ErrorKind::Timeout);
        assert!(!foreign.is_poll_timeout());
    }

    #[test]
    fn test_stale_or_missing() {
        assert!(EchoError::stale(StaleKind::Stale, "gone").is_stale_or_missing());
        assert!(EchoError::NotFound {
            locator: "css selector=#x".into()
        }
        .is_stale_or_missing());
        assert!(!EchoError::driver("boom").is_stale_or_missing());
    }

    #[test]
    fn test_replaced_display_names_both_ids() {
        let kind = StaleKind::Replaced {
            previous: HandleId::new("a"),
            current: HandleId::new("b"),
        };
        assert_eq!(kind.to_string(), "replaced (a -> b)");
    }
}
