//! Lazy, self-healing element references.
//!
//! A [`Node`] is a logical slot on a page: a locator plus an optional parent
//! node it is found within. The native handle behind it is resolved on
//! demand, cached, checked for staleness before each reuse and looked up
//! again when the page has replaced it.
//!
//! ```text
//! resolve()
//!   cached handle ── check("*") ok ──────────────────────▶ return cached
//!        │ stale / none
//!        ▼
//!   clear cache ── detached? ──▶ StaleHandle(Detached)
//!        │
//!        ├─ parent? ── upgrade ── parent.resolve() ── find(Within) ─┐
//!        └─ find(Document) ─────────────────────────────────────────┤
//!                                                                    ▼
//!                                   cache handle + id, stamp display gate
//! ```
//!
//! Operations that read or touch the element first wait for it to be
//! displayed when the node's display gate is on. The gate is the logical AND
//! of the node's own flag and every ancestor's, evaluated at check time.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;

use crate::browser::Browser;
use crate::driver::{Driver, ElementHandle, HandleId, Rect, Scope};
use crate::locator::Locator;
use crate::result::{EchoError, EchoResult, ErrorKind, StaleKind};
use crate::wait::{wait_for_condition, Truthy, WaitOptions};

#[derive(Debug, Default)]
struct HandleCache {
    handle: Option<ElementHandle>,
    id: Option<HandleId>,
}

struct NodeInner {
    browser: Browser,
    locator: Locator,
    parent: Option<Weak<NodeInner>>,
    cache: Mutex<HandleCache>,
    display_gate: AtomicBool,
    timeout_ms: AtomicU64,
    poll_frequency_ms: AtomicU64,
    slow_mode: bool,
}

/// Logical reference to a DOM element.
///
/// Cloning is cheap and clones share the handle cache, so a clone moved into
/// a polling thread sees the same resolution state as the original.
#[derive(Clone)]
pub struct Node {
    inner: Arc<NodeInner>,
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cache = self.inner.cache.lock();
        f.debug_struct("Node")
            .field("locator", &self.inner.locator)
            .field("cached_id", &cache.id)
            .field("has_parent", &self.inner.parent.is_some())
            .field("display_gate", &self.inner.display_gate.load(Ordering::SeqCst))
            .finish()
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner.locator)
    }
}

impl Node {
    /// Node found by `locator`, inside `parent` when given.
    ///
    /// Timeout, poll frequency and slow mode come from `browser`.
    #[must_use]
    pub fn new(browser: &Browser, locator: Locator, parent: Option<&Self>, gated: bool) -> Self {
        Self {
            inner: Arc::new(NodeInner {
                browser: browser.clone(),
                locator,
                parent: parent.map(|p| Arc::downgrade(&p.inner)),
                cache: Mutex::new(HandleCache::default()),
                display_gate: AtomicBool::new(gated),
                timeout_ms: AtomicU64::new(browser.config().timeout_ms),
                poll_frequency_ms: AtomicU64::new(browser.config().poll_frequency_ms),
                slow_mode: browser.slow_mode(),
            }),
        }
    }

    /// Node wrapping an already-resolved handle.
    ///
    /// The node is detached: once the handle goes stale it cannot be found
    /// again.
    #[must_use]
    pub fn from_handle(browser: &Browser, handle: ElementHandle, parent: Option<&Self>) -> Self {
        let node = Self::new(browser, Locator::detached(), parent, true);
        {
            let mut cache = node.inner.cache.lock();
            cache.id = Some(handle.id().clone());
            cache.handle = Some(handle);
        }
        node
    }

    /// Nested node resolved within this one
    #[must_use]
    pub fn child(&self, locator: Locator) -> Self {
        Self::new(&self.inner.browser, locator, Some(self), true)
    }

    /// Locator this node resolves with
    #[must_use]
    pub fn locator(&self) -> &Locator {
        &self.inner.locator
    }

    /// Browser this node belongs to
    #[must_use]
    pub fn browser(&self) -> &Browser {
        &self.inner.browser
    }

    fn driver(&self) -> &Arc<dyn Driver> {
        self.inner.browser.driver()
    }

    /// Parent node, if it is still alive
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.inner
            .parent
            .as_ref()
            .and_then(Weak::upgrade)
            .map(|inner| Self { inner })
    }

    /// Default wait budget for this node
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.inner.timeout_ms.load(Ordering::SeqCst))
    }

    /// Override the wait budget for this node
    pub fn set_timeout(&self, timeout: Duration) {
        self.inner
            .timeout_ms
            .store(timeout.as_millis() as u64, Ordering::SeqCst);
    }

    /// Default pause between poll attempts for this node
    #[must_use]
    pub fn poll_frequency(&self) -> Duration {
        Duration::from_millis(self.inner.poll_frequency_ms.load(Ordering::SeqCst))
    }

    /// Override the poll frequency for this node
    pub fn set_poll_frequency(&self, frequency: Duration) {
        self.inner
            .poll_frequency_ms
            .store(frequency.as_millis() as u64, Ordering::SeqCst);
    }

    /// Whether keys are typed one at a time
    #[must_use]
    pub fn slow_mode(&self) -> bool {
        self.inner.slow_mode
    }

    // =========================================================================
    // Display gate
    // =========================================================================

    /// Composed gate: this node's flag AND every live ancestor's
    #[must_use]
    pub fn display_gate(&self) -> bool {
        if !self.inner.display_gate.load(Ordering::SeqCst) {
            return false;
        }
        self.parent().map_or(true, |parent| parent.display_gate())
    }

    /// Set this node's own gate flag
    pub fn set_display_gate(&self, gated: bool) {
        self.inner.display_gate.store(gated, Ordering::SeqCst);
    }

    /// Suppress this node's gate until the guard is dropped
    #[must_use = "the gate is restored as soon as the guard is dropped"]
    pub fn ignore_display(&self) -> DisplayGuard {
        let previous = self.inner.display_gate.swap(false, Ordering::SeqCst);
        DisplayGuard {
            node: self.clone(),
            previous,
        }
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    /// Identity of the cached handle, if any
    #[must_use]
    pub fn cached_id(&self) -> Option<HandleId> {
        self.inner.cache.lock().id.clone()
    }

    /// Cached handle, if any, without probing it
    #[must_use]
    pub fn cached_handle(&self) -> Option<ElementHandle> {
        self.inner.cache.lock().handle.clone()
    }

    /// Forget the cached handle
    pub fn invalidate(&self) {
        let mut cache = self.inner.cache.lock();
        cache.handle = None;
        cache.id = None;
    }

    /// True when the driver says `handle` is gone; clears the cache if so
    fn is_stale(&self, handle: &ElementHandle) -> bool {
        match self.driver().attribute(handle, "*") {
            Err(err) if err.is_stale_or_missing() => {
                tracing::debug!(node = %self, id = %handle.id(), "cached handle is stale");
                self.invalidate();
                true
            }
            _ => false,
        }
    }

    /// Live handle for this node, looking it up again when needed
    pub fn resolve(&self) -> EchoResult<ElementHandle> {
        let cached = self.cached_handle();
        if let Some(handle) = cached {
            if !self.is_stale(&handle) {
                tracing::trace!(node = %self, id = %handle.id(), "cache hit");
                return Ok(handle);
            }
        }
        self.invalidate();

        let locator = &self.inner.locator;
        if locator.is_detached() {
            return Err(EchoError::stale(
                StaleKind::Detached,
                "the element was built from a handle that is no longer attached; look it up again",
            ));
        }

        let handle = match &self.inner.parent {
            Some(weak) => {
                let parent = weak.upgrade().map(|inner| Self { inner }).ok_or_else(|| {
                    EchoError::stale(
                        StaleKind::ParentReleased,
                        format!("parent of {locator} was dropped"),
                    )
                })?;
                let scope = parent.resolve()?;
                self.driver().find(locator, Scope::Within(&scope))?
            }
            None => self.driver().find(locator, Scope::Document)?,
        };

        let handle = handle.with_display_gate(self.display_gate());
        {
            let mut cache = self.inner.cache.lock();
            cache.id = Some(handle.id().clone());
            cache.handle = Some(handle.clone());
        }
        tracing::debug!(node = %self, id = %handle.id(), "resolved");
        Ok(handle)
    }

    /// Resolve, reporting a replaced element as stale once.
    ///
    /// When the node had an identity and resolution produced a different
    /// one, the new identity is cached and `StaleHandle(Replaced)` returned;
    /// the next call succeeds.
    pub fn identity(&self) -> EchoResult<HandleId> {
        let previous = self.cached_id();
        let current = self.resolve()?.id().clone();
        match previous {
            Some(previous) if previous != current => Err(EchoError::stale(
                StaleKind::Replaced {
                    previous: previous.clone(),
                    current: current.clone(),
                },
                format!("{self} now resolves to {current}, {previous} was stale"),
            )),
            _ => Ok(current),
        }
    }

    /// Whether both nodes currently resolve to the same element
    pub fn same_node(&self, other: &Self) -> EchoResult<bool> {
        Ok(self.resolve()? == other.resolve()?)
    }

    /// Resolve after waiting for display when the gate is on
    pub(crate) fn gated(&self) -> EchoResult<ElementHandle> {
        if self.display_gate() {
            self.waiting().until_displayed()?;
        }
        self.resolve()
    }

    // =========================================================================
    // Gated operations
    // =========================================================================

    /// Click the element
    pub fn click(&self) -> EchoResult<()> {
        let handle = self.gated()?;
        self.driver().click(&handle)
    }

    /// Attribute value, `None` when absent
    pub fn attribute(&self, name: &str) -> EchoResult<Option<String>> {
        let handle = self.gated()?;
        self.driver().attribute(&handle, name)
    }

    /// Value of the `data-{name}` attribute
    pub fn data(&self, name: &str) -> EchoResult<Option<String>> {
        self.attribute(&format!("data-{name}"))
    }

    /// Rendered text
    pub fn text(&self) -> EchoResult<String> {
        let handle = self.gated()?;
        self.driver().text(&handle)
    }

    /// Computed CSS property
    pub fn css(&self, property: &str) -> EchoResult<String> {
        let handle = self.gated()?;
        self.driver().css_value(&handle, property)
    }

    /// Set an inline style property
    pub fn set_css(&self, property: &str, value: &str) -> EchoResult<()> {
        self.gated()?;
        let script = format!(
            "arguments[0].style.setProperty({}, {});",
            js_string(property),
            js_string(value)
        );
        self.execute_script(&script).map(|_| ())
    }

    /// Give the element focus
    pub fn focus(&self) -> EchoResult<()> {
        self.gated()?;
        self.execute_script("return arguments[0].focus();").map(|_| ())
    }

    /// Take focus away from the element
    pub fn blur(&self) -> EchoResult<()> {
        self.gated()?;
        self.execute_script("return arguments[0].blur();").map(|_| ())
    }

    /// Whether the element holds focus
    pub fn is_focused(&self) -> EchoResult<bool> {
        let handle = self.gated()?;
        Ok(self.driver().active_element()? == handle)
    }

    /// Dispatch a bubbling DOM event
    pub fn trigger(&self, event: &str) -> EchoResult<()> {
        self.gated()?;
        let script = format!(
            "arguments[0].dispatchEvent(new Event({}, {{bubbles: true}}));",
            js_string(event)
        );
        self.execute_script(&script).map(|_| ())
    }

    /// Trimmed `innerHTML`
    pub fn inner_html(&self) -> EchoResult<String> {
        let handle = self.gated()?;
        let html = self.driver().attribute(&handle, "innerHTML")?;
        Ok(html.unwrap_or_default().trim().to_string())
    }

    /// Trimmed text of the `<label for=...>` pointing at this element
    pub fn label(&self) -> EchoResult<String> {
        let handle = self.gated()?;
        let id = self.driver().attribute(&handle, "id")?.ok_or_else(|| EchoError::NotFound {
            locator: format!("label for {self} (element has no id)"),
        })?;
        for label in self.driver().find_all(&Locator::tag_name("label"), Scope::Document)? {
            if self.driver().attribute(&label, "for")?.as_deref() == Some(id.as_str()) {
                return Ok(self.driver().text(&label)?.trim().to_string());
            }
        }
        Err(EchoError::NotFound {
            locator: format!("label[for={id:?}]"),
        })
    }

    /// Type keys into the element
    pub fn send_keys(&self, keys: &str) -> EchoResult<()> {
        let handle = self.gated()?;
        self.driver().send_keys(&handle, keys)
    }

    /// Clear an editable element
    pub fn clear(&self) -> EchoResult<()> {
        let handle = self.gated()?;
        self.driver().clear(&handle)
    }

    /// Whether the two elements' boxes intersect; touching counts
    pub fn has_overlap_with(&self, other: &Self) -> EchoResult<bool> {
        let handle = self.gated()?;
        let mine = self.driver().rect(&handle)?;
        let theirs = other.rect()?;
        Ok(mine.overlaps(&theirs))
    }

    // =========================================================================
    // Ungated operations
    // =========================================================================

    /// Run a script with this element as `arguments[0]`
    pub fn execute_script(&self, script: &str) -> EchoResult<Value> {
        if !script.contains("arguments[0]") {
            return Err(EchoError::configuration(format!(
                "script must use the element as arguments[0]: {script}"
            )));
        }
        let handle = self.resolve()?;
        self.driver().execute_script(script, &[handle])
    }

    /// Scroll the element into view
    pub fn scroll_into_view(&self) -> EchoResult<()> {
        self.execute_script("arguments[0].scrollIntoView(true);").map(|_| ())
    }

    /// Scroll the element's content by an offset
    pub fn scroll_by(&self, x: i64, y: i64) -> EchoResult<()> {
        self.execute_script(&format!("arguments[0].scrollBy({x},{y});")).map(|_| ())
    }

    /// Present and visible; any lookup failure reads as false
    #[must_use]
    pub fn is_displayed(&self) -> bool {
        self.displayed_state().unwrap_or(false)
    }

    /// Whether the node currently resolves
    #[must_use]
    pub fn is_present(&self) -> bool {
        self.presence_state().unwrap_or(false)
    }

    /// Visibility for polling: false while the element may still appear,
    /// an error once it never can
    fn displayed_state(&self) -> EchoResult<bool> {
        match self.resolve().and_then(|handle| self.driver().is_displayed(&handle)) {
            Ok(displayed) => Ok(displayed),
            Err(err) if err.is_unrecoverable() => Err(err),
            Err(err) => {
                if !matches!(err.kind(), ErrorKind::StaleHandle | ErrorKind::NotFound | ErrorKind::Driver) {
                    tracing::debug!(node = %self, error = %err, "visibility check failed");
                }
                Ok(false)
            }
        }
    }

    fn presence_state(&self) -> EchoResult<bool> {
        match self.resolve() {
            Ok(_) => Ok(true),
            Err(err) if err.is_unrecoverable() => Err(err),
            Err(err) => {
                if !err.is_stale_or_missing() {
                    tracing::debug!(node = %self, error = %err, "presence check failed");
                }
                Ok(false)
            }
        }
    }

    /// Whether the element accepts interaction
    pub fn is_enabled(&self) -> EchoResult<bool> {
        let handle = self.resolve()?;
        self.driver().is_enabled(&handle)
    }

    /// Negation of [`Node::is_enabled`]
    pub fn is_disabled(&self) -> EchoResult<bool> {
        self.is_enabled().map(|enabled| !enabled)
    }

    /// Checked / selected state
    pub fn is_selected(&self) -> EchoResult<bool> {
        let handle = self.resolve()?;
        self.driver().is_selected(&handle)
    }

    /// Geometry
    pub fn rect(&self) -> EchoResult<Rect> {
        let handle = self.resolve()?;
        self.driver().rect(&handle)
    }

    /// Lower-case tag name
    pub fn tag_name(&self) -> EchoResult<String> {
        let handle = self.resolve()?;
        self.driver().tag_name(&handle)
    }

    /// First descendant matching `locator`, as a detached child node
    pub fn find_element(&self, locator: &Locator) -> EchoResult<Self> {
        let scope = self.resolve()?;
        let handle = self.driver().find(locator, Scope::Within(&scope))?;
        Ok(Self::from_handle(&self.inner.browser, handle, Some(self)))
    }

    /// Every descendant matching `locator`, as detached child nodes
    pub fn find_elements(&self, locator: &Locator) -> EchoResult<Vec<Self>> {
        let scope = self.resolve()?;
        let handles = self.driver().find_all(locator, Scope::Within(&scope))?;
        Ok(handles
            .into_iter()
            .map(|handle| Self::from_handle(&self.inner.browser, handle, Some(self)))
            .collect())
    }

    /// Semantic waits with this node's defaults
    #[must_use]
    pub fn waiting(&self) -> NodeWait<'_> {
        NodeWait {
            node: self,
            timeout: self.timeout(),
            frequency: self.poll_frequency(),
            refresh: false,
            message: None,
        }
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.same_node(other).unwrap_or(false)
    }
}

impl PartialEq<ElementHandle> for Node {
    fn eq(&self, other: &ElementHandle) -> bool {
        self.resolve().is_ok_and(|handle| handle == *other)
    }
}

impl Truthy for Node {
    fn is_truthy(&self) -> bool {
        true
    }
}

/// JSON string literal, which is also a valid JS string literal
pub(crate) fn js_string(value: &str) -> String {
    Value::String(value.to_string()).to_string()
}

/// Restores a node's display gate when dropped
#[derive(Debug)]
pub struct DisplayGuard {
    node: Node,
    previous: bool,
}

impl Drop for DisplayGuard {
    fn drop(&mut self) {
        self.node.set_display_gate(self.previous);
    }
}

// =============================================================================
// NODE WAITS
// =============================================================================

/// Builder for waits on a node.
///
/// Timeout and frequency default to the node's own values.
#[derive(Debug)]
pub struct NodeWait<'a> {
    node: &'a Node,
    timeout: Duration,
    frequency: Duration,
    refresh: bool,
    message: Option<String>,
}

impl NodeWait<'_> {
    /// Override the budget
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the pause between attempts
    #[must_use]
    pub const fn with_frequency(mut self, frequency: Duration) -> Self {
        self.frequency = frequency;
        self
    }

    /// Reload the page before every attempt
    #[must_use]
    pub const fn refresh(mut self, refresh: bool) -> Self {
        self.refresh = refresh;
        self
    }

    /// Replace the default timeout message
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    fn options(&self, default_message: String) -> WaitOptions {
        WaitOptions::new()
            .with_timeout(self.timeout.as_millis() as u64)
            .with_frequency(self.frequency.as_millis() as u64)
            .with_message(self.message.clone().unwrap_or(default_message))
    }

    fn describe(&self) -> (String, String) {
        let locator = self.node.locator();
        let strategy = locator
            .strategy()
            .map_or_else(|| "handle".to_string(), |s| s.to_string());
        (locator.selector().to_string(), strategy)
    }

    fn poll_flag<F>(self, default_message: String, check: F) -> EchoResult<()>
    where
        F: Fn(&Node) -> EchoResult<bool> + Send + 'static,
    {
        let options = self.options(default_message);
        let node = self.node.clone();
        let refresh = self.refresh;
        wait_for_condition(
            move || {
                if refresh {
                    node.browser().refresh()?;
                }
                check(&node)
            },
            &options,
        )
        .map(|_| ())
    }

    /// Until the element is present and visible. A node that can never
    /// resolve again fails at once with its resolution error.
    pub fn until_displayed(self) -> EchoResult<()> {
        let (selector, strategy) = self.describe();
        self.poll_flag(
            format!("Unable to find element '{selector}' by '{strategy}'."),
            Node::displayed_state,
        )
    }

    /// Until the element is hidden or gone
    pub fn until_not_displayed(self) -> EchoResult<()> {
        let (selector, strategy) = self.describe();
        self.poll_flag(
            format!("Still able to find element '{selector}' by '{strategy}'."),
            |node| Ok(!node.is_displayed()),
        )
    }

    /// Until the element resolves
    pub fn until_present(self) -> EchoResult<()> {
        let (selector, strategy) = self.describe();
        self.poll_flag(
            format!("Unable to find element '{selector}' by '{strategy}'."),
            Node::presence_state,
        )
    }

    /// Until the element no longer resolves
    pub fn until_not_present(self) -> EchoResult<()> {
        let (selector, strategy) = self.describe();
        self.poll_flag(
            format!("Still able to find element '{selector}' by '{strategy}'."),
            |node| Ok(!node.is_present()),
        )
    }

    /// Until the element this node currently points at is gone.
    ///
    /// Returns at once when the node no longer resolves, or resolves to a
    /// different element than the one it had cached.
    pub fn until_stale(self) -> EchoResult<()> {
        let previous = self.node.cached_id();
        let handle = match self.node.resolve() {
            Err(err) if err.is_stale_or_missing() => return Ok(()),
            Err(err) => return Err(err),
            Ok(handle) => handle,
        };
        if previous.as_ref().is_some_and(|prev| prev != handle.id()) {
            return Ok(());
        }

        let options = self.options(format!(
            "Element still not stale after {} second(s) with a {} second(s) polling interval.",
            self.timeout.as_secs_f64(),
            self.frequency.as_secs_f64()
        ));
        let driver = Arc::clone(self.node.driver());
        wait_for_condition(
            move || match driver.attribute(&handle, "*") {
                Err(err) if err.is_stale_or_missing() => Ok(true),
                Err(err) => Err(err),
                Ok(_) => Ok(false),
            },
            &options,
        )
        .map(|_| ())
    }

    /// Until the element is enabled
    pub fn until_enabled(self) -> EchoResult<()> {
        self.poll_flag("Failed to wait for element enabled".to_string(), Node::is_enabled)
    }

    /// Until the element is disabled
    pub fn until_disabled(self) -> EchoResult<()> {
        self.poll_flag("Failed to wait for element disabled".to_string(), Node::is_disabled)
    }

    /// Until the element is displayed and enabled
    pub fn until_clickable(self) -> EchoResult<()> {
        self.poll_flag(
            "Failed to wait for element to be clickable".to_string(),
            |node| match node.is_enabled() {
                Ok(enabled) => Ok(enabled && node.is_displayed()),
                Err(err) if err.is_stale_or_missing() => Ok(false),
                Err(err) => Err(err),
            },
        )
    }

    /// Until `condition` returns a truthy value, which is returned
    pub fn until<T, F>(self, mut condition: F) -> EchoResult<T>
    where
        T: Truthy + Send + 'static,
        F: FnMut(&Node) -> EchoResult<T> + Send + 'static,
    {
        let options = self.options(format!("Condition on {} was not met", self.node));
        let node = self.node.clone();
        let refresh = self.refresh;
        wait_for_condition(
            move || {
                if refresh {
                    node.browser().refresh()?;
                }
                condition(&node)
            },
            &options,
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::config::BrowserConfig;
    use crate::mock::{MockDriver, MockElement, MockKey};
    use std::thread;
    use std::time::Instant;

    struct Page {
        driver: Arc<MockDriver>,
        browser: Browser,
        form: MockKey,
        input: MockKey,
    }

    fn page() -> Page {
        let driver = Arc::new(MockDriver::new());
        let body = driver.insert(None, MockElement::new("body"));
        let form = driver.insert(Some(body), MockElement::new("form").id("signup"));
        let input = driver.insert(
            Some(form),
            MockElement::new("input")
                .id("email")
                .attr("name", "email")
                .attr("data-role", "primary")
                .rect(Rect::new(0.0, 0.0, 100.0, 20.0)),
        );
        driver.insert(Some(body), MockElement::new("label").attr("for", "email").text("  Email  "));
        let config = BrowserConfig::default().with_timeout(400).with_poll_frequency(10);
        let browser = Browser::new(driver.clone(), config);
        Page {
            driver,
            browser,
            form,
            input,
        }
    }

    mod resolution_tests {
        use super::*;

        #[test]
        fn test_cache_hit_does_not_look_up_again() {
            let p = page();
            let node = p.browser.node(Locator::id("email"));
            let first = node.resolve().unwrap();
            let calls = p.driver.find_calls();
            let second = node.resolve().unwrap();
            assert_eq!(first, second);
            assert_eq!(p.driver.find_calls(), calls);
            assert_eq!(node.cached_id().as_ref(), Some(first.id()));
        }

        #[test]
        fn test_stale_handle_triggers_fresh_lookup() {
            let p = page();
            let node = p.browser.node(Locator::id("email"));
            let first = node.resolve().unwrap();
            let fresh = p.driver.rerender(p.input).unwrap();
            let second = node.resolve().unwrap();
            assert_ne!(first, second);
            assert_eq!(second, p.driver.handle(fresh));
        }

        #[test]
        fn test_child_resolves_through_parent() {
            let p = page();
            let form = p.browser.node(Locator::id("signup"));
            let input = form.child(Locator::name("email"));
            assert_eq!(input.resolve().unwrap(), p.driver.handle(p.input));

            p.driver.rerender(p.form).unwrap();
            let again = input.resolve().unwrap();
            assert_ne!(again, p.driver.handle(p.input));
            assert!(p.driver.key_of(&again).is_some());
        }

        #[test]
        fn test_detached_node_fails_permanently() {
            let p = page();
            let node = Node::from_handle(&p.browser, p.driver.handle(p.input), None);
            assert!(node.resolve().is_ok());
            p.driver.remove(p.input);
            for _ in 0..2 {
                let err = node.resolve().unwrap_err();
                assert!(matches!(err, EchoError::StaleHandle { kind: StaleKind::Detached, .. }));
            }
        }

        #[test]
        fn test_gated_read_under_detached_parent_fails_at_once() {
            let p = page();
            let form = p.browser.find_element(&Locator::id("signup")).unwrap();
            let input = form.child(Locator::id("email"));
            assert_eq!(input.attribute("name").unwrap().as_deref(), Some("email"));
            p.driver.remove(p.form);

            let start = Instant::now();
            let err = input.text().unwrap_err();
            assert!(start.elapsed() < Duration::from_millis(200), "took {:?}", start.elapsed());
            assert!(matches!(err, EchoError::StaleHandle { kind: StaleKind::Detached, .. }));
            assert!(err.is_unrecoverable());
        }

        #[test]
        fn test_gated_read_under_released_parent_fails_at_once() {
            let p = page();
            let input = {
                let form = p.browser.node(Locator::id("signup"));
                form.child(Locator::id("email"))
            };
            let start = Instant::now();
            let err = input.click().unwrap_err();
            assert!(start.elapsed() < Duration::from_millis(200));
            assert!(matches!(err, EchoError::StaleHandle { kind: StaleKind::ParentReleased, .. }));
            assert!(input.waiting().until_present().is_err());
            assert!(input.waiting().until_not_present().is_ok());
        }

        #[test]
        fn test_hidden_cached_handle_is_cache_hit() {
            let p = page();
            let node = p.browser.node(Locator::id("email"));
            let first = node.resolve().unwrap();
            p.driver.set_displayed(p.input, false);
            p.driver.reset_find_calls();
            assert_eq!(node.resolve().unwrap(), first);
            assert_eq!(p.driver.find_calls(), 0);
            assert!(!node.is_displayed());
        }

        #[test]
        fn test_released_parent() {
            let p = page();
            let form = p.browser.node(Locator::id("signup"));
            let input = form.child(Locator::name("email"));
            drop(form);
            let err = input.resolve().unwrap_err();
            assert!(matches!(err, EchoError::StaleHandle { kind: StaleKind::ParentReleased, .. }));
        }

        #[test]
        fn test_identity_reports_replacement_once() {
            let p = page();
            let node = p.browser.node(Locator::id("email"));
            let before = node.identity().unwrap();
            p.driver.rerender(p.input).unwrap();
            match node.identity().unwrap_err() {
                EchoError::StaleHandle {
                    kind: StaleKind::Replaced { previous, current },
                    ..
                } => {
                    assert_eq!(previous, before);
                    assert_eq!(node.cached_id(), Some(current));
                }
                other => panic!("expected replacement, got {other:?}"),
            }
            assert!(node.identity().is_ok());
        }

        #[test]
        fn test_missing_element_is_not_found() {
            let p = page();
            let err = p.browser.node(Locator::id("ghost")).resolve().unwrap_err();
            assert!(matches!(err, EchoError::NotFound { .. }));
        }
    }

    mod gate_tests {
        use super::*;

        #[test]
        fn test_gate_composes_lazily_with_parent() {
            let p = page();
            let form = p.browser.node(Locator::id("signup"));
            let input = form.child(Locator::id("email"));
            assert!(input.display_gate());
            form.set_display_gate(false);
            assert!(!input.display_gate());
            form.set_display_gate(true);
            assert!(input.display_gate());
        }

        #[test]
        fn test_resolved_handle_carries_gate() {
            let p = page();
            let form = p.browser.node(Locator::id("signup"));
            form.set_display_gate(false);
            let input = form.child(Locator::id("email"));
            assert!(!input.resolve().unwrap().display_gate());
        }

        #[test]
        fn test_gate_on_handle_is_advisory_for_the_driver() {
            let p = page();
            p.driver.set_displayed(p.input, false);
            let handle = p.driver.handle(p.input).with_display_gate(true);
            let name = p.driver.attribute(&handle, "name").unwrap();
            assert_eq!(name.as_deref(), Some("email"));
        }

        #[test]
        fn test_ignore_display_reads_hidden_element() {
            let p = page();
            p.driver.set_displayed(p.form, false);
            let input = p.browser.node(Locator::id("email"));
            {
                let _guard = input.ignore_display();
                assert_eq!(input.attribute("name").unwrap().as_deref(), Some("email"));
            }
            assert!(input.display_gate());
            let err = input.attribute("name").unwrap_err();
            assert!(err.is_poll_timeout());
        }

        #[test]
        fn test_gated_operation_waits_for_display() {
            let p = page();
            p.driver.set_displayed(p.form, false);
            let node = p.browser.node(Locator::id("email"));
            let driver = Arc::clone(&p.driver);
            let form = p.form;
            let reveal = thread::spawn(move || {
                thread::sleep(Duration::from_millis(60));
                driver.set_displayed(form, true);
            });
            node.click().unwrap();
            reveal.join().unwrap();
            assert_eq!(p.driver.active_key(), Some(p.input));
        }
    }

    mod facade_tests {
        use super::*;

        #[test]
        fn test_data_and_label() {
            let p = page();
            let node = p.browser.node(Locator::id("email"));
            assert_eq!(node.data("role").unwrap().as_deref(), Some("primary"));
            assert_eq!(node.label().unwrap(), "Email");
        }

        #[test]
        fn test_execute_script_requires_element_argument() {
            let p = page();
            let node = p.browser.node(Locator::id("email"));
            let err = node.execute_script("return document.title;").unwrap_err();
            assert!(matches!(err, EchoError::Configuration { .. }));
            assert!(p.driver.scripts().is_empty());
        }

        #[test]
        fn test_focus_blur_and_css() {
            let p = page();
            let node = p.browser.node(Locator::id("email"));
            node.focus().unwrap();
            assert!(node.is_focused().unwrap());
            node.blur().unwrap();
            assert!(!node.is_focused().unwrap());
            node.set_css("color", "red").unwrap();
            assert_eq!(node.css("color").unwrap(), "red");
        }

        #[test]
        fn test_trigger_dispatches_event() {
            let p = page();
            p.browser.node(Locator::id("email")).trigger("change").unwrap();
            assert!(p.driver.was_called("event:change"));
        }

        #[test]
        fn test_find_elements_are_detached_children() {
            let p = page();
            let form = p.browser.node(Locator::id("signup"));
            let inputs = form.find_elements(&Locator::tag_name("input")).unwrap();
            assert_eq!(inputs.len(), 1);
            assert!(inputs[0].locator().is_detached());
            assert!(inputs[0].parent().is_some());
            assert!(inputs[0] == p.driver.handle(p.input));
        }

        #[test]
        fn test_equality_by_resolved_identity() {
            let p = page();
            let by_id = p.browser.node(Locator::id("email"));
            let by_name = p.browser.node(Locator::name("email"));
            let form = p.browser.node(Locator::id("signup"));
            assert!(by_id == by_name);
            assert!(by_id != form);
            assert!(p.browser.node(Locator::id("ghost")) != by_id);
            assert!(by_id.same_node(&p.browser.node(Locator::id("ghost"))).is_err());
        }

        #[test]
        fn test_overlap() {
            let p = page();
            let other = p.driver.insert(None, MockElement::new("div").id("tip").rect(Rect::new(50.0, 10.0, 10.0, 10.0)));
            let input = p.browser.node(Locator::id("email"));
            let tip = p.browser.node(Locator::id("tip"));
            assert!(input.has_overlap_with(&tip).unwrap());
            p.driver.set_rect(other, Rect::new(500.0, 500.0, 1.0, 1.0));
            assert!(!input.has_overlap_with(&tip).unwrap());
        }

        #[test]
        fn test_presence_and_display_swallow_lookup_errors() {
            let p = page();
            let ghost = p.browser.node(Locator::id("ghost"));
            assert!(!ghost.is_present());
            assert!(!ghost.is_displayed());
            assert!(p.browser.node(Locator::id("email")).is_present());
        }
    }

    mod wait_tests {
        use super::*;

        #[test]
        fn test_until_not_present_after_removal() {
            let p = page();
            let node = p.browser.node(Locator::id("email"));
            node.resolve().unwrap();
            let driver = Arc::clone(&p.driver);
            let input = p.input;
            let remover = thread::spawn(move || {
                thread::sleep(Duration::from_millis(50));
                driver.remove(input);
            });
            node.waiting().until_not_present().unwrap();
            remover.join().unwrap();
        }

        #[test]
        fn test_until_stale_returns_at_once_for_replaced_element() {
            let p = page();
            let node = p.browser.node(Locator::id("email"));
            node.resolve().unwrap();
            p.driver.rerender(p.input).unwrap();
            let start = Instant::now();
            node.waiting().until_stale().unwrap();
            assert!(start.elapsed() < Duration::from_millis(100));
        }

        #[test]
        fn test_until_stale_times_out_on_stable_element() {
            let p = page();
            let node = p.browser.node(Locator::id("email"));
            node.resolve().unwrap();
            let err = node
                .waiting()
                .with_timeout(Duration::from_millis(150))
                .until_stale()
                .unwrap_err();
            assert!(err.to_string().contains("still not stale"));
        }

        #[test]
        fn test_until_enabled_and_clickable() {
            let p = page();
            p.driver.set_enabled(p.input, false);
            let node = p.browser.node(Locator::id("email"));
            node.waiting().until_disabled().unwrap();
            let driver = Arc::clone(&p.driver);
            let input = p.input;
            let enabler = thread::spawn(move || {
                thread::sleep(Duration::from_millis(40));
                driver.set_enabled(input, true);
            });
            node.waiting().until_clickable().unwrap();
            enabler.join().unwrap();
            node.waiting().until_enabled().unwrap();
        }

        #[test]
        fn test_refresh_reloads_each_attempt() {
            let p = page();
            let node = p.browser.node(Locator::id("email"));
            node.waiting().refresh(true).until_present().unwrap();
            assert!(p.driver.was_called("refresh"));
        }

        #[test]
        fn test_custom_condition_returns_value() {
            let p = page();
            let node = p.browser.node(Locator::id("email"));
            let tag = node.waiting().until(|n| n.tag_name()).unwrap();
            assert_eq!(tag, "input");
        }

        #[test]
        fn test_timeout_message_names_locator() {
            let p = page();
            let err = p
                .browser
                .node(Locator::id("ghost"))
                .waiting()
                .with_timeout(Duration::from_millis(100))
                .until_displayed()
                .unwrap_err();
            assert!(err.to_string().contains("Unable to find element 'ghost' by 'id'"));
        }
    }
}
