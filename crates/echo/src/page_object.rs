//! Page Object Model support.
//!
//! A page object ties a URL to the nodes that make up the page. Implement
//! [`PageObject`] on your own struct holding [`Node`]s, embed a [`BasePage`]
//! for the URL handling, or declare nodes by name with
//! [`PageObjectBuilder`].
//!
//! ```
//! use std::sync::Arc;
//! use echo::mock::{MockDriver, MockElement};
//! use echo::{Browser, BrowserConfig, Locator, PageObject, PageObjectBuilder};
//!
//! let driver = Arc::new(MockDriver::new());
//! let form = driver.insert(None, MockElement::new("form").id("login"));
//! driver.insert(Some(form), MockElement::new("input").attr("name", "user"));
//!
//! let browser = Browser::new(driver.clone(), BrowserConfig::default());
//! let page = PageObjectBuilder::new(&browser, "http://localhost/login")
//!     .with_node("form", Locator::id("login"))
//!     .with_child("user", "form", Locator::name("user"))
//!     .required("user")
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(page.open(Some("next=home")).unwrap(), "http://localhost/login?next=home");
//! assert!(page.is_loaded());
//! ```

use std::collections::HashMap;
use std::time::Duration;

use crate::browser::Browser;
use crate::locator::Locator;
use crate::node::Node;
use crate::result::{EchoError, EchoResult};
use crate::wait::{wait_for_condition, WaitOptions};

/// Default budget for a page to report itself loaded (30 seconds)
pub const DEFAULT_LOAD_TIMEOUT_MS: u64 = 30_000;

/// `url` with `params` appended as a query string
#[must_use]
pub fn page_url(url: &str, params: Option<&str>) -> String {
    match params {
        None => url.to_string(),
        Some(params) if url.contains('?') => format!("{url}&{params}"),
        Some(params) => format!("{url}?{params}"),
    }
}

/// A page or component of the application under test.
pub trait PageObject {
    /// Base URL of the page
    fn url(&self) -> &str;

    /// Browser the page lives in
    fn browser(&self) -> &Browser;

    /// Navigate to the page, with an optional query string; returns the URL
    fn open(&self, params: Option<&str>) -> EchoResult<String> {
        let url = page_url(self.url(), params);
        self.browser().open(&url)?;
        Ok(url)
    }

    /// Whether the page is ready for interaction
    fn is_loaded(&self) -> bool {
        true
    }

    /// Budget for [`PageObject::wait_until_loaded`] in milliseconds
    fn load_timeout_ms(&self) -> u64 {
        DEFAULT_LOAD_TIMEOUT_MS
    }

    /// Page name for logs
    fn page_name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Poll [`PageObject::is_loaded`] until it holds
    fn wait_until_loaded(&self) -> EchoResult<()>
    where
        Self: Clone + Send + Sized + 'static,
    {
        let page = self.clone();
        let options = WaitOptions::new()
            .with_timeout(self.load_timeout_ms())
            .with_frequency(self.browser().config().poll_frequency_ms)
            .with_message(format!("{} did not finish loading", self.page_name()));
        wait_for_condition(move || Ok(page.is_loaded()), &options).map(|_| ())
    }
}

/// URL plus browser, to embed in hand-written page objects
#[derive(Debug, Clone)]
pub struct BasePage {
    browser: Browser,
    url: String,
}

impl BasePage {
    /// Page at `url`
    #[must_use]
    pub fn new(browser: &Browser, url: impl Into<String>) -> Self {
        Self {
            browser: browser.clone(),
            url: url.into(),
        }
    }

    /// Put the page in print layout and announce `PrintStart`
    pub fn simulate_print_start(&self) -> EchoResult<()> {
        let script = r#"
            var body = document.getElementsByTagName("body")[0];
            body.classList.add("print");
            body.style["width"] = "800px";
            document.dispatchEvent(new Event("PrintStart"));
        "#;
        self.browser.execute_script(script, &[]).map(|_| ())
    }

    /// Leave print layout and announce `PrintEnd`
    pub fn simulate_print_end(&self) -> EchoResult<()> {
        let script = r#"
            var body = document.getElementsByTagName("body")[0];
            body.classList.remove("print");
            body.style["width"] = "";
            document.dispatchEvent(new Event("PrintEnd"));
        "#;
        self.browser.execute_script(script, &[]).map(|_| ())
    }
}

impl PageObject for BasePage {
    fn url(&self) -> &str {
        &self.url
    }

    fn browser(&self) -> &Browser {
        &self.browser
    }
}

#[derive(Debug, Clone)]
struct NodeDecl {
    name: String,
    parent: Option<String>,
    locator: Locator,
    gated: bool,
}

/// Declares named nodes, then builds a [`SimplePageObject`] owning them
#[derive(Debug, Clone)]
pub struct PageObjectBuilder {
    browser: Browser,
    url: String,
    decls: Vec<NodeDecl>,
    required: Vec<String>,
    load_timeout_ms: u64,
}

impl PageObjectBuilder {
    /// Builder for a page at `url`
    #[must_use]
    pub fn new(browser: &Browser, url: impl Into<String>) -> Self {
        Self {
            browser: browser.clone(),
            url: url.into(),
            decls: Vec::new(),
            required: Vec::new(),
            load_timeout_ms: DEFAULT_LOAD_TIMEOUT_MS,
        }
    }

    fn declare(mut self, name: impl Into<String>, parent: Option<String>, locator: Locator, gated: bool) -> Self {
        self.decls.push(NodeDecl {
            name: name.into(),
            parent,
            locator,
            gated,
        });
        self
    }

    /// Top-level node
    #[must_use]
    pub fn with_node(self, name: impl Into<String>, locator: Locator) -> Self {
        self.declare(name, None, locator, true)
    }

    /// Top-level node that skips the wait-for-display gate
    #[must_use]
    pub fn with_ungated_node(self, name: impl Into<String>, locator: Locator) -> Self {
        self.declare(name, None, locator, false)
    }

    /// Node found within `parent`, which must be declared earlier
    #[must_use]
    pub fn with_child(self, name: impl Into<String>, parent: impl Into<String>, locator: Locator) -> Self {
        self.declare(name, Some(parent.into()), locator, true)
    }

    /// Require the named node to be present for the page to count as loaded
    #[must_use]
    pub fn required(mut self, name: impl Into<String>) -> Self {
        self.required.push(name.into());
        self
    }

    /// Budget for [`PageObject::wait_until_loaded`]
    #[must_use]
    pub const fn with_load_timeout(mut self, timeout_ms: u64) -> Self {
        self.load_timeout_ms = timeout_ms;
        self
    }

    /// Build the page, wiring each child to its parent node
    pub fn build(self) -> EchoResult<SimplePageObject> {
        let mut nodes: HashMap<String, Node> = HashMap::with_capacity(self.decls.len());
        let mut order = Vec::with_capacity(self.decls.len());

        for decl in self.decls {
            if nodes.contains_key(&decl.name) {
                return Err(EchoError::configuration(format!(
                    "node '{}' is declared twice",
                    decl.name
                )));
            }
            let parent = match &decl.parent {
                Some(parent) => Some(nodes.get(parent).ok_or_else(|| {
                    EchoError::configuration(format!(
                        "parent '{parent}' of '{}' must be declared first",
                        decl.name
                    ))
                })?),
                None => None,
            };
            let node = Node::new(&self.browser, decl.locator, parent, decl.gated);
            order.push(decl.name.clone());
            nodes.insert(decl.name, node);
        }

        if let Some(missing) = self.required.iter().find(|name| !nodes.contains_key(*name)) {
            return Err(EchoError::configuration(format!(
                "required node '{missing}' is not declared"
            )));
        }

        Ok(SimplePageObject {
            browser: self.browser,
            url: self.url,
            nodes,
            order,
            required: self.required,
            load_timeout_ms: self.load_timeout_ms,
        })
    }
}

/// Page object holding named nodes
#[derive(Debug, Clone)]
pub struct SimplePageObject {
    browser: Browser,
    url: String,
    nodes: HashMap<String, Node>,
    order: Vec<String>,
    required: Vec<String>,
    load_timeout_ms: u64,
}

impl SimplePageObject {
    /// Node by name
    #[must_use]
    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.get(name)
    }

    /// Node by name, or `Configuration` naming the unknown node
    pub fn expect_node(&self, name: &str) -> EchoResult<&Node> {
        self.node(name)
            .ok_or_else(|| EchoError::configuration(format!("page has no node named '{name}'")))
    }

    /// Names in declaration order
    #[must_use]
    pub fn node_names(&self) -> Vec<&str> {
        self.order.iter().map(String::as_str).collect()
    }

    /// Load budget as Duration
    #[must_use]
    pub const fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout_ms)
    }
}

impl PageObject for SimplePageObject {
    fn url(&self) -> &str {
        &self.url
    }

    fn browser(&self) -> &Browser {
        &self.browser
    }

    fn is_loaded(&self) -> bool {
        self.required
            .iter()
            .filter_map(|name| self.nodes.get(name))
            .all(Node::is_present)
    }

    fn load_timeout_ms(&self) -> u64 {
        self.load_timeout_ms
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::BrowserConfig;
    use crate::mock::{MockDriver, MockElement, MockKey};
    use std::sync::Arc;
    use std::thread;

    fn setup() -> (Arc<MockDriver>, Browser, MockKey) {
        let driver = Arc::new(MockDriver::new());
        let body = driver.insert(None, MockElement::new("body"));
        let nav = driver.insert(Some(body), MockElement::new("nav").id("menu"));
        driver.insert(Some(nav), MockElement::new("a").class("home").text("Home"));
        let config = BrowserConfig::default().with_timeout(500).with_poll_frequency(10);
        let browser = Browser::new(driver.clone(), config);
        (driver, browser, body)
    }

    mod url_tests {
        use super::*;

        #[test]
        fn test_page_url_params() {
            assert_eq!(page_url("http://x/a", None), "http://x/a");
            assert_eq!(page_url("http://x/a", Some("b=1")), "http://x/a?b=1");
            assert_eq!(page_url("http://x/a?b=1", Some("c=2")), "http://x/a?b=1&c=2");
        }

        #[test]
        fn test_base_page_open() {
            let (driver, browser, _) = setup();
            let page = BasePage::new(&browser, "http://localhost/home");
            assert_eq!(page.open(None).unwrap(), "http://localhost/home");
            assert_eq!(browser.current_url().unwrap(), "http://localhost/home");
            assert!(driver.was_called("navigate:http://localhost/home"));
            assert!(page.page_name().contains("BasePage"));
        }

        #[test]
        fn test_print_simulation_runs_scripts() {
            let (driver, browser, _) = setup();
            let page = BasePage::new(&browser, "http://localhost/");
            page.simulate_print_start().unwrap();
            page.simulate_print_end().unwrap();
            let scripts = driver.scripts();
            assert_eq!(scripts.len(), 2);
            assert!(scripts[0].contains("PrintStart"));
            assert!(scripts[1].contains("PrintEnd"));
        }
    }

    mod builder_tests {
        use super::*;

        #[test]
        fn test_nested_nodes_resolve_through_parent() {
            let (_, browser, _) = setup();
            let page = PageObjectBuilder::new(&browser, "http://localhost/")
                .with_node("menu", Locator::id("menu"))
                .with_child("home", "menu", Locator::class_name("home"))
                .build()
                .unwrap();
            assert_eq!(page.node_names(), vec!["menu", "home"]);
            let home = page.expect_node("home").unwrap();
            assert_eq!(home.text().unwrap(), "Home");
            assert!(home.parent().is_some());
        }

        #[test]
        fn test_parent_must_be_declared_first() {
            let (_, browser, _) = setup();
            let err = PageObjectBuilder::new(&browser, "http://localhost/")
                .with_child("home", "menu", Locator::class_name("home"))
                .with_node("menu", Locator::id("menu"))
                .build()
                .unwrap_err();
            assert!(matches!(err, EchoError::Configuration { .. }));
            assert!(err.to_string().contains("declared first"));
        }

        #[test]
        fn test_duplicate_and_unknown_names() {
            let (_, browser, _) = setup();
            let dup = PageObjectBuilder::new(&browser, "/")
                .with_node("a", Locator::id("a"))
                .with_node("a", Locator::id("b"))
                .build();
            assert!(dup.is_err());
            let missing = PageObjectBuilder::new(&browser, "/").required("ghost").build();
            assert!(missing.is_err());
            let page = PageObjectBuilder::new(&browser, "/").build().unwrap();
            assert!(page.expect_node("ghost").is_err());
        }

        #[test]
        fn test_ungated_node() {
            let (_, browser, _) = setup();
            let page = PageObjectBuilder::new(&browser, "/")
                .with_ungated_node("menu", Locator::id("menu"))
                .build()
                .unwrap();
            assert!(!page.node("menu").unwrap().display_gate());
        }
    }

    mod load_tests {
        use super::*;

        #[test]
        fn test_is_loaded_tracks_required_nodes() {
            let (_, browser, _) = setup();
            let page = PageObjectBuilder::new(&browser, "/")
                .with_node("menu", Locator::id("menu"))
                .with_node("footer", Locator::id("footer"))
                .required("menu")
                .build()
                .unwrap();
            assert!(page.is_loaded());
            let strict = PageObjectBuilder::new(&browser, "/")
                .with_node("footer", Locator::id("footer"))
                .required("footer")
                .build()
                .unwrap();
            assert!(!strict.is_loaded());
        }

        #[test]
        fn test_wait_until_loaded() {
            let (driver, browser, body) = setup();
            let page = PageObjectBuilder::new(&browser, "/")
                .with_node("footer", Locator::id("footer"))
                .required("footer")
                .with_load_timeout(1_000)
                .build()
                .unwrap();
            assert_eq!(page.load_timeout(), Duration::from_secs(1));
            let late = Arc::clone(&driver);
            let writer = thread::spawn(move || {
                thread::sleep(Duration::from_millis(50));
                late.insert(Some(body), MockElement::new("footer").id("footer"));
            });
            page.wait_until_loaded().unwrap();
            writer.join().unwrap();
        }

        #[test]
        fn test_wait_until_loaded_times_out() {
            let (_, browser, _) = setup();
            let page = PageObjectBuilder::new(&browser, "/")
                .with_node("footer", Locator::id("footer"))
                .required("footer")
                .with_load_timeout(100)
                .build()
                .unwrap();
            let err = page.wait_until_loaded().unwrap_err();
            assert!(err.to_string().contains("did not finish loading"));
        }
    }
}
