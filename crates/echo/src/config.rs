//! Browser-wide configuration.
//!
//! Every node copies its timeout, poll frequency and slow-mode flag from the
//! [`BrowserConfig`] of the browser that created it.

use std::env;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::poll::{DEFAULT_FREQUENCY_MS, DEFAULT_TIMEOUT_MS};
use crate::result::{EchoError, EchoResult};

/// Environment variable that turns on slow typing
pub const SLOW_MODE_ENV: &str = "SLOW_WEBDRIVER_ENV";

/// Default implicit wait handed to drivers that support one (1 second)
pub const DEFAULT_IMPLICIT_TIMEOUT_MS: u64 = 1_000;

/// Browser configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Default wait budget in milliseconds
    pub timeout_ms: u64,
    /// Default pause between poll attempts in milliseconds
    pub poll_frequency_ms: u64,
    /// Implicit element wait in milliseconds
    pub implicit_timeout_ms: u64,
    /// Type keys one at a time and confirm each lands
    pub slow_mode: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            poll_frequency_ms: DEFAULT_FREQUENCY_MS,
            implicit_timeout_ms: DEFAULT_IMPLICIT_TIMEOUT_MS,
            slow_mode: false,
        }
    }
}

impl BrowserConfig {
    /// Defaults with slow mode taken from [`SLOW_MODE_ENV`]
    #[must_use]
    pub fn from_env() -> Self {
        let raw = env::var(SLOW_MODE_ENV).ok();
        Self::default().with_slow_mode(slow_mode_from(raw.as_deref()))
    }

    /// Parse a YAML document; missing keys keep their defaults
    pub fn from_yaml(yaml: &str) -> EchoResult<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> EchoResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    /// Set the default timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set the default poll frequency in milliseconds
    #[must_use]
    pub const fn with_poll_frequency(mut self, frequency_ms: u64) -> Self {
        self.poll_frequency_ms = frequency_ms;
        self
    }

    /// Set the implicit wait in milliseconds
    #[must_use]
    pub const fn with_implicit_timeout(mut self, implicit_ms: u64) -> Self {
        self.implicit_timeout_ms = implicit_ms;
        self
    }

    /// Enable or disable slow mode
    #[must_use]
    pub const fn with_slow_mode(mut self, slow: bool) -> Self {
        self.slow_mode = slow;
        self
    }

    /// Default timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Default poll frequency as Duration
    #[must_use]
    pub const fn poll_frequency(&self) -> Duration {
        Duration::from_millis(self.poll_frequency_ms)
    }

    /// Implicit wait as Duration
    #[must_use]
    pub const fn implicit_timeout(&self) -> Duration {
        Duration::from_millis(self.implicit_timeout_ms)
    }

    /// Reject a configuration no wait could run with
    pub fn validate(&self) -> EchoResult<()> {
        if self.timeout_ms == 0 {
            return Err(EchoError::configuration("timeout_ms must be greater than zero"));
        }
        Ok(())
    }
}

/// `"false"` and `"0"` (any case, surrounding whitespace ignored) are off;
/// any other value is on; unset is off.
fn slow_mode_from(raw: Option<&str>) -> bool {
    match raw {
        None => false,
        Some(value) => {
            let value = value.trim().to_ascii_lowercase();
            !(value == "false" || value == "0")
        }
    }
}
