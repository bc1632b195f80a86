//! Root context shared by every node on a page.
//!
//! A [`Browser`] pairs a driver with the configuration its nodes inherit.
//! It is cheap to clone; clones share the driver.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::config::BrowserConfig;
use crate::driver::{Driver, ElementHandle, Scope};
use crate::locator::Locator;
use crate::node::Node;
use crate::result::EchoResult;
use crate::wait::{self, Truthy, WaitOptions};

/// Driver plus defaults
#[derive(Debug, Clone)]
pub struct Browser {
    driver: Arc<dyn Driver>,
    config: BrowserConfig,
}

impl Browser {
    /// Wrap `driver`
    #[must_use]
    pub fn new(driver: Arc<dyn Driver>, config: BrowserConfig) -> Self {
        tracing::debug!(
            timeout_ms = config.timeout_ms,
            poll_frequency_ms = config.poll_frequency_ms,
            implicit_timeout_ms = config.implicit_timeout_ms,
            slow_mode = config.slow_mode,
            "browser created"
        );
        if let Err(err) = driver.set_implicit_wait(config.implicit_timeout()) {
            tracing::warn!(error = %err, "driver rejected the implicit wait");
        }
        Self { driver, config }
    }

    /// Underlying driver
    #[must_use]
    pub fn driver(&self) -> &Arc<dyn Driver> {
        &self.driver
    }

    /// Configuration nodes inherit
    #[must_use]
    pub const fn config(&self) -> &BrowserConfig {
        &self.config
    }

    /// Default wait budget
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.config.timeout()
    }

    /// Default pause between poll attempts
    #[must_use]
    pub const fn poll_frequency(&self) -> Duration {
        self.config.poll_frequency()
    }

    /// Whether text inputs type one key at a time
    #[must_use]
    pub const fn slow_mode(&self) -> bool {
        self.config.slow_mode
    }

    /// Lazily resolved top-level node, display-gated
    #[must_use]
    pub fn node(&self, locator: Locator) -> Node {
        Node::new(self, locator, None, true)
    }

    /// First element matching `locator`, wrapped as a detached node
    pub fn find_element(&self, locator: &Locator) -> EchoResult<Node> {
        let handle = self.driver.find(locator, Scope::Document)?;
        Ok(Node::from_handle(self, handle, None))
    }

    /// Every element matching `locator`, wrapped as detached nodes
    pub fn find_elements(&self, locator: &Locator) -> EchoResult<Vec<Node>> {
        let handles = self.driver.find_all(locator, Scope::Document)?;
        Ok(handles
            .into_iter()
            .map(|handle| Node::from_handle(self, handle, None))
            .collect())
    }

    /// Navigate to `url`
    pub fn open(&self, url: &str) -> EchoResult<()> {
        tracing::info!(url, "open");
        self.driver.navigate(url)
    }

    /// Reload the current page
    pub fn refresh(&self) -> EchoResult<()> {
        self.driver.refresh()
    }

    /// URL of the current page
    pub fn current_url(&self) -> EchoResult<String> {
        self.driver.current_url()
    }

    /// Run a script in the page
    pub fn execute_script(&self, script: &str, args: &[ElementHandle]) -> EchoResult<Value> {
        self.driver.execute_script(script, args)
    }

    /// Focused element as a detached node
    pub fn active_element(&self) -> EchoResult<Node> {
        let handle = self.driver.active_element()?;
        Ok(Node::from_handle(self, handle, None))
    }

    /// Wait options seeded from this browser's defaults
    #[must_use]
    pub fn wait_options(&self) -> WaitOptions {
        WaitOptions::new()
            .with_timeout(self.config.timeout_ms)
            .with_frequency(self.config.poll_frequency_ms)
    }

    /// Poll `func` with this browser's defaults until it returns a truthy value
    pub fn wait_for_condition<T, F>(&self, func: F) -> EchoResult<T>
    where
        T: Truthy + Send + 'static,
        F: FnMut() -> EchoResult<T> + Send + 'static,
    {
        wait::wait_for_condition(func, &self.wait_options())
    }
}
