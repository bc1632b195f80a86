//! Echo: page objects over a browser driver
//!
//! Echo wraps a WebDriver-style [`Driver`] in lazily resolved,
//! self-healing element references ([`Node`]) and bounded polling waits,
//! so UI tests read like a description of the page instead of a sequence of
//! lookups and sleeps.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                       ECHO Architecture                          │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐              │
//! │  │ PageObject  │   │  Elements   │   │    Node     │              │
//! │  │ (pages)     │──►│ (Input,     │──►│ (resolve,   │──┐           │
//! │  │             │   │  Select..)  │   │  gate, ops) │  │           │
//! │  └─────────────┘   └─────────────┘   └──────┬──────┘  │           │
//! │                                             │         ▼           │
//! │                    ┌─────────────┐   ┌──────▼──────┐  ┌────────┐  │
//! │                    │  TimedRun   │◄──│    wait     │  │ Driver │  │
//! │                    │  (poll)     │   │ (conditions)│  │ (trait)│  │
//! │                    └─────────────┘   └─────────────┘  └────────┘  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use echo::prelude::*;
//!
//! let driver = Arc::new(MockDriver::new());
//! let form = driver.insert(None, MockElement::new("form").id("login"));
//! let user = driver.insert(Some(form), MockElement::new("input").attr("name", "user"));
//!
//! let browser = Browser::new(driver.clone(), BrowserConfig::default());
//! let login = browser.node(Locator::id("login"));
//! let field = Input::within(&login, Locator::name("user"), InputKind::Text);
//!
//! field.set_value("ada").unwrap();
//! assert_eq!(driver.attr_of(user, "value").as_deref(), Some("ada"));
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

mod browser;
mod config;
mod driver;
mod locator;
mod node;
mod page_object;
mod result;

/// Typed wrappers for buttons, inputs, selects and tables
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
pub mod elements;

/// Subscriber setup for `tracing` output
pub mod logging;

/// In-memory driver for tests
///
/// A small DOM with staleness, visibility and scripted results.
#[allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::missing_const_for_fn
)]
pub mod mock;

/// Timed execution of a single operation on a worker thread
pub mod poll;

/// Condition waits built on [`poll`]
pub mod wait;

pub use browser::Browser;
pub use config::{BrowserConfig, DEFAULT_IMPLICIT_TIMEOUT_MS, SLOW_MODE_ENV};
pub use driver::{not_found, Driver, ElementHandle, HandleId, Rect, Scope};
pub use elements::{
    Button, Checkbox, DefinitionItem, DefinitionList, Description, FileInput, Icon, Input,
    InputControl, InputKind, KeyTiming, ListItem, Menu, MenuItem, OrderedList, PlainInput, Radio,
    Select, Table, Term, TextInput, Textarea, UnorderedList,
};
pub use locator::{Locator, Strategy};
pub use node::{DisplayGuard, Node, NodeWait};
pub use page_object::{
    page_url, BasePage, PageObject, PageObjectBuilder, SimplePageObject, DEFAULT_LOAD_TIMEOUT_MS,
};
pub use poll::{
    run_with_timeout, CancelToken, Polled, TimedRun, DEFAULT_FREQUENCY_MS, DEFAULT_TIMEOUT_MS,
};
pub use result::{EchoError, EchoResult, ErrorKind, PollTimeout, StaleKind};
pub use wait::{
    wait_for_condition, wait_for_result, wait_until, wait_for_value, IgnoreResults, ResultFilter,
    Truthy, WaitOptions,
};

/// Everything a page-object test usually needs
pub mod prelude {
    pub use super::browser::*;
    pub use super::config::*;
    pub use super::driver::*;
    pub use super::elements::*;
    pub use super::locator::*;
    pub use super::mock::{MockDriver, MockElement, MockKey};
    pub use super::node::*;
    pub use super::page_object::*;
    pub use super::result::*;
    pub use super::wait::*;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::prelude::*;
    use std::sync::Arc;

    mod prelude_tests {
        use super::*;

        #[test]
        fn test_prelude_covers_a_page_flow() {
            let driver = Arc::new(MockDriver::new());
            let form = driver.insert(None, MockElement::new("form").id("search"));
            driver.insert(Some(form), MockElement::new("input").attr("name", "q"));
            let go = driver.insert(Some(form), MockElement::new("button").text("Go"));

            let browser = Browser::new(driver.clone(), BrowserConfig::default().with_timeout(500));
            let page = PageObjectBuilder::new(&browser, "http://localhost/search")
                .with_node("form", Locator::id("search"))
                .with_child("query", "form", Locator::name("q"))
                .with_child("go", "form", Locator::tag_name("button"))
                .build()
                .unwrap();

            page.open(None).unwrap();
            let query = Input::from_node(page.expect_node("query").unwrap().clone(), InputKind::Text);
            query.set_value("rust").unwrap();
            Button::from_node(page.expect_node("go").unwrap().clone()).click().unwrap();

            assert_eq!(query.value().unwrap().as_deref(), Some("rust"));
            assert_eq!(driver.active_key(), Some(go));
        }
    }

    mod error_tests {
        use super::*;

        #[test]
        fn test_error_kinds_are_reexported() {
            let err = EchoError::configuration("bad");
            assert_eq!(err.kind(), ErrorKind::Configuration);
            assert!(!err.is_poll_timeout());
        }
    }
}
