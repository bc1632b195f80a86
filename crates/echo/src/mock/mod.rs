//! In-memory browser for tests and benchmarks.
//!
//! [`MockDriver`] keeps a small DOM tree behind a mutex and implements the
//! [`Driver`](crate::driver::Driver) trait over it. Tests mutate the tree
//! (hide, remove, re-render) while nodes are being polled, which is how the
//! staleness and wait paths are exercised without a browser.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use echo::mock::{MockDriver, MockElement};
//! use echo::{Browser, BrowserConfig, Locator};
//!
//! let driver = Arc::new(MockDriver::new());
//! let button = driver.insert(None, MockElement::new("button").id("go").text("Go"));
//! let browser = Browser::new(driver.clone(), BrowserConfig::default());
//!
//! let node = browser.node(Locator::id("go"));
//! assert_eq!(node.text().unwrap(), "Go");
//!
//! driver.rerender(button);
//! assert_eq!(node.text().unwrap(), "Go"); // re-resolved transparently
//! ```

pub mod driver;
pub mod selector;

pub use driver::{MockDriver, MockElement, MockKey};
pub use selector::{CompoundSelector, SimpleSelector};
