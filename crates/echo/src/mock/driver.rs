//! In-memory DOM implementing [`Driver`].
//!
//! Handles are `mock-{key}`. Removing or re-rendering a node drops its key,
//! so any handle still pointing at it goes stale exactly the way a real
//! browser reports it.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;

use super::selector::{CompoundSelector, Subject};
use crate::driver::{self, Driver, ElementHandle, Rect, Scope};
use crate::locator::{Locator, Strategy};
use crate::result::{EchoError, EchoResult, StaleKind};

const HANDLE_PREFIX: &str = "mock-";

/// Key of a node in the mock DOM
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MockKey(u64);

impl fmt::Display for MockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{HANDLE_PREFIX}{}", self.0)
    }
}

/// Description of a node to insert
#[derive(Debug, Clone)]
pub struct MockElement {
    tag: String,
    attrs: BTreeMap<String, String>,
    text: String,
    displayed: bool,
    enabled: bool,
    selected: bool,
    css: BTreeMap<String, String>,
    rect: Rect,
}

impl MockElement {
    /// Visible, enabled element with no attributes
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            attrs: BTreeMap::new(),
            text: String::new(),
            displayed: true,
            enabled: true,
            selected: false,
            css: BTreeMap::new(),
            rect: Rect::default(),
        }
    }

    /// Set an attribute
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    /// Set the `id` attribute
    #[must_use]
    pub fn id(self, id: impl Into<String>) -> Self {
        self.attr("id", id)
    }

    /// Set the `class` attribute
    #[must_use]
    pub fn class(self, class: impl Into<String>) -> Self {
        self.attr("class", class)
    }

    /// Set own text
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Start hidden
    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.displayed = false;
        self
    }

    /// Start disabled
    #[must_use]
    pub const fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Start checked / selected
    #[must_use]
    pub const fn selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    /// Set a computed style value
    #[must_use]
    pub fn css(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.css.insert(property.into(), value.into());
        self
    }

    /// Set geometry
    #[must_use]
    pub const fn rect(mut self, rect: Rect) -> Self {
        self.rect = rect;
        self
    }
}

#[derive(Debug, Clone)]
struct MockNode {
    element: MockElement,
    parent: Option<MockKey>,
    children: Vec<MockKey>,
}

#[derive(Debug, Default)]
struct DomState {
    nodes: HashMap<MockKey, MockNode>,
    roots: Vec<MockKey>,
    next_key: u64,
    url: String,
    active: Option<MockKey>,
    scripted: VecDeque<Value>,
    history: Vec<String>,
    scripts: Vec<String>,
    latency: Option<Duration>,
    implicit_wait: Option<Duration>,
}

/// How a locator selects nodes
enum Matcher {
    Css(CompoundSelector),
    Id(String),
    Tag(String),
    Name(String),
    Class(String),
    LinkText(String),
    PartialLinkText(String),
}

impl Matcher {
    fn compile(locator: &Locator) -> EchoResult<Self> {
        let selector = locator.selector().to_string();
        match locator.strategy() {
            None => Err(EchoError::configuration("a detached locator cannot be looked up")),
            Some(Strategy::Css) => Ok(Self::Css(CompoundSelector::parse(&selector)?)),
            Some(Strategy::Id) => Ok(Self::Id(selector)),
            Some(Strategy::TagName) => Ok(Self::Tag(selector.to_ascii_lowercase())),
            Some(Strategy::Name) => Ok(Self::Name(selector)),
            Some(Strategy::ClassName) => Ok(Self::Class(selector)),
            Some(Strategy::LinkText) => Ok(Self::LinkText(selector)),
            Some(Strategy::PartialLinkText) => Ok(Self::PartialLinkText(selector)),
            Some(Strategy::XPath) => Err(EchoError::driver("xpath is not supported by MockDriver")),
        }
    }
}

impl DomState {
    fn allocate(&mut self) -> MockKey {
        self.next_key += 1;
        MockKey(self.next_key)
    }

    fn insert(&mut self, parent: Option<MockKey>, element: MockElement) -> MockKey {
        let key = self.allocate();
        let parent = parent.filter(|p| {
            let known = self.nodes.contains_key(p);
            if !known {
                tracing::warn!(parent = %p, "unknown parent, inserting at document root");
            }
            known
        });
        match parent.and_then(|p| self.nodes.get_mut(&p)) {
            Some(node) => node.children.push(key),
            None => self.roots.push(key),
        }
        self.nodes.insert(
            key,
            MockNode {
                element,
                parent,
                children: Vec::new(),
            },
        );
        key
    }

    fn siblings_mut(&mut self, parent: Option<MockKey>) -> Option<&mut Vec<MockKey>> {
        match parent {
            Some(p) => self.nodes.get_mut(&p).map(|n| &mut n.children),
            None => Some(&mut self.roots),
        }
    }

    fn drop_subtree(&mut self, key: MockKey) {
        if let Some(node) = self.nodes.remove(&key) {
            if self.active == Some(key) {
                self.active = None;
            }
            for child in node.children {
                self.drop_subtree(child);
            }
        }
    }

    fn remove(&mut self, key: MockKey) -> bool {
        let Some(parent) = self.nodes.get(&key).map(|n| n.parent) else {
            return false;
        };
        if let Some(siblings) = self.siblings_mut(parent) {
            siblings.retain(|k| *k != key);
        }
        self.drop_subtree(key);
        true
    }

    fn clone_subtree(&mut self, old: MockKey, parent: Option<MockKey>) -> Option<MockKey> {
        let node = self.nodes.get(&old)?.clone();
        let key = self.allocate();
        self.nodes.insert(
            key,
            MockNode {
                element: node.element,
                parent,
                children: Vec::new(),
            },
        );
        let children: Vec<MockKey> = node
            .children
            .iter()
            .filter_map(|child| self.clone_subtree(*child, Some(key)))
            .collect();
        if let Some(fresh) = self.nodes.get_mut(&key) {
            fresh.children = children;
        }
        Some(key)
    }

    fn rerender(&mut self, key: MockKey) -> Option<MockKey> {
        let parent = self.nodes.get(&key)?.parent;
        let fresh = self.clone_subtree(key, parent)?;
        if let Some(siblings) = self.siblings_mut(parent) {
            if let Some(slot) = siblings.iter_mut().find(|k| **k == key) {
                *slot = fresh;
            }
        }
        self.drop_subtree(key);
        Some(fresh)
    }

    fn live(&self, handle: &ElementHandle) -> EchoResult<MockKey> {
        handle
            .id()
            .as_str()
            .strip_prefix(HANDLE_PREFIX)
            .and_then(|n| n.parse().ok())
            .map(MockKey)
            .filter(|k| self.nodes.contains_key(k))
            .ok_or_else(|| {
                EchoError::stale(
                    StaleKind::Stale,
                    format!("element {} is no longer attached to the DOM", handle.id()),
                )
            })
    }

    fn element(&self, key: MockKey) -> EchoResult<&MockElement> {
        self.nodes
            .get(&key)
            .map(|n| &n.element)
            .ok_or_else(|| EchoError::stale(StaleKind::Stale, format!("{key} was removed")))
    }

    fn element_mut(&mut self, key: MockKey) -> Option<&mut MockElement> {
        self.nodes.get_mut(&key).map(|n| &mut n.element)
    }

    fn collect_descendants(&self, key: MockKey, out: &mut Vec<MockKey>) {
        if let Some(node) = self.nodes.get(&key) {
            for child in &node.children {
                out.push(*child);
                self.collect_descendants(*child, out);
            }
        }
    }

    fn document_order(&self, scope: Option<MockKey>) -> Vec<MockKey> {
        let mut out = Vec::new();
        match scope {
            Some(root) => self.collect_descendants(root, &mut out),
            None => {
                for root in &self.roots {
                    out.push(*root);
                    self.collect_descendants(*root, &mut out);
                }
            }
        }
        out
    }

    fn displayed(&self, key: MockKey) -> bool {
        let mut cursor = Some(key);
        while let Some(k) = cursor {
            match self.nodes.get(&k) {
                Some(node) if node.element.displayed => cursor = node.parent,
                _ => return false,
            }
        }
        true
    }

    fn own_and_descendant_text(&self, key: MockKey, visible_only: bool) -> String {
        if visible_only && !self.displayed(key) {
            return String::new();
        }
        let Some(node) = self.nodes.get(&key) else {
            return String::new();
        };
        let mut parts = vec![node.element.text.clone()];
        parts.extend(
            node.children
                .iter()
                .map(|child| self.own_and_descendant_text(*child, visible_only)),
        );
        parts
            .into_iter()
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn inner_html(&self, key: MockKey) -> String {
        let Some(node) = self.nodes.get(&key) else {
            return String::new();
        };
        let mut html = node.element.text.clone();
        for child in &node.children {
            if let Some(c) = self.nodes.get(child) {
                let attrs: String = c
                    .element
                    .attrs
                    .iter()
                    .map(|(k, v)| format!(" {k}=\"{v}\""))
                    .collect();
                html.push_str(&format!(
                    "<{tag}{attrs}>{inner}</{tag}>",
                    tag = c.element.tag,
                    inner = self.inner_html(*child)
                ));
            }
        }
        html
    }

    fn matches(&self, key: MockKey, matcher: &Matcher) -> bool {
        let Some(node) = self.nodes.get(&key) else {
            return false;
        };
        let e = &node.element;
        match matcher {
            Matcher::Css(selector) => selector.matches(&Subject {
                tag: &e.tag,
                attrs: &e.attrs,
                selected: e.selected,
            }),
            Matcher::Id(id) => e.attrs.get("id") == Some(id),
            Matcher::Tag(tag) => e.tag == *tag,
            Matcher::Name(name) => e.attrs.get("name") == Some(name),
            Matcher::Class(class) => e
                .attrs
                .get("class")
                .is_some_and(|c| c.split_whitespace().any(|x| x == class)),
            Matcher::LinkText(text) => e.tag == "a" && self.own_and_descendant_text(key, true) == *text,
            Matcher::PartialLinkText(text) => {
                e.tag == "a" && self.own_and_descendant_text(key, true).contains(text.as_str())
            }
        }
    }

    fn find_by_attr(&self, name: &str, value: &str) -> Option<MockKey> {
        self.document_order(None)
            .into_iter()
            .find(|k| self.nodes.get(k).is_some_and(|n| n.element.attrs.get(name).map(String::as_str) == Some(value)))
    }

    /// Click side effects on form controls
    fn activate(&mut self, key: MockKey, via_label: bool) {
        let Some(node) = self.nodes.get(&key).cloned() else {
            return;
        };
        let e = &node.element;
        if !e.enabled {
            return;
        }
        let input_type = e.attrs.get("type").map(|t| t.to_ascii_lowercase());
        match (e.tag.as_str(), input_type.as_deref()) {
            ("input", Some("checkbox")) => {
                if let Some(el) = self.element_mut(key) {
                    el.selected = !el.selected;
                }
            }
            ("input", Some("radio")) => {
                let group = e.attrs.get("name").cloned();
                let peers: Vec<MockKey> = self
                    .nodes
                    .iter()
                    .filter(|(_, n)| {
                        n.element.tag == "input"
                            && n.element.attrs.get("type").is_some_and(|t| t.eq_ignore_ascii_case("radio"))
                            && n.element.attrs.get("name") == group.as_ref()
                    })
                    .map(|(k, _)| *k)
                    .collect();
                for peer in peers {
                    if let Some(el) = self.element_mut(peer) {
                        el.selected = peer == key;
                    }
                }
            }
            ("option", _) => {
                let multiple = node
                    .parent
                    .and_then(|p| self.nodes.get(&p))
                    .is_some_and(|p| p.element.attrs.contains_key("multiple"));
                if multiple {
                    if let Some(el) = self.element_mut(key) {
                        el.selected = !el.selected;
                    }
                } else {
                    let siblings = node
                        .parent
                        .and_then(|p| self.nodes.get(&p))
                        .map(|p| p.children.clone())
                        .unwrap_or_default();
                    for sibling in siblings {
                        if let Some(el) = self.element_mut(sibling) {
                            el.selected = sibling == key;
                        }
                    }
                }
            }
            ("label", _) if !via_label => {
                if let Some(target) = e.attrs.get("for").and_then(|id| self.find_by_attr("id", id)) {
                    self.activate(target, true);
                }
            }
            _ => {}
        }
    }
}

/// Double-quoted string literals in `script`, decoded
fn string_literals(script: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut chars = script.char_indices();
    while let Some((start, c)) = chars.next() {
        if c != '"' {
            continue;
        }
        let mut escaped = false;
        for (i, c) in chars.by_ref() {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                if let Ok(text) = serde_json::from_str::<String>(&script[start..=i]) {
                    out.push(text);
                }
                break;
            }
        }
    }
    out
}

/// In-memory browser for tests and benchmarks
#[derive(Debug, Default)]
pub struct MockDriver {
    state: Mutex<DomState>,
    find_calls: AtomicUsize,
}

impl MockDriver {
    /// Empty document at `about:blank`
    #[must_use]
    pub fn new() -> Self {
        let driver = Self::default();
        driver.state.lock().url = "about:blank".to_string();
        driver
    }

    /// Insert `element` as the last child of `parent` (document root if `None`)
    pub fn insert(&self, parent: Option<MockKey>, element: MockElement) -> MockKey {
        self.state.lock().insert(parent, element)
    }

    /// Detach a node and its subtree; returns false if it was already gone
    pub fn remove(&self, key: MockKey) -> bool {
        self.state.lock().remove(key)
    }

    /// Replace a subtree with an identical copy under fresh keys
    pub fn rerender(&self, key: MockKey) -> Option<MockKey> {
        self.state.lock().rerender(key)
    }

    fn update(&self, key: MockKey, f: impl FnOnce(&mut MockElement)) -> bool {
        let mut state = self.state.lock();
        match state.element_mut(key) {
            Some(element) => {
                f(element);
                true
            }
            None => false,
        }
    }

    /// Show or hide a node
    pub fn set_displayed(&self, key: MockKey, displayed: bool) -> bool {
        self.update(key, |e| e.displayed = displayed)
    }

    /// Enable or disable a node
    pub fn set_enabled(&self, key: MockKey, enabled: bool) -> bool {
        self.update(key, |e| e.enabled = enabled)
    }

    /// Set checked / selected state
    pub fn set_selected(&self, key: MockKey, selected: bool) -> bool {
        self.update(key, |e| e.selected = selected)
    }

    /// Replace own text
    pub fn set_text(&self, key: MockKey, text: impl Into<String>) -> bool {
        let text = text.into();
        self.update(key, |e| e.text = text)
    }

    /// Set an attribute
    pub fn set_attr(&self, key: MockKey, name: impl Into<String>, value: impl Into<String>) -> bool {
        let (name, value) = (name.into(), value.into());
        self.update(key, |e| {
            e.attrs.insert(name, value);
        })
    }

    /// Remove an attribute
    pub fn remove_attr(&self, key: MockKey, name: &str) -> bool {
        self.update(key, |e| {
            e.attrs.remove(name);
        })
    }

    /// Set geometry
    pub fn set_rect(&self, key: MockKey, rect: Rect) -> bool {
        self.update(key, |e| e.rect = rect)
    }

    /// Handle a real browser would return for `key`
    #[must_use]
    pub fn handle(&self, key: MockKey) -> ElementHandle {
        ElementHandle::new(key.to_string())
    }

    /// Key behind a handle, if it is still attached
    #[must_use]
    pub fn key_of(&self, handle: &ElementHandle) -> Option<MockKey> {
        self.state.lock().live(handle).ok()
    }

    /// Attribute value straight from the DOM, bypassing the driver surface
    #[must_use]
    pub fn attr_of(&self, key: MockKey, name: &str) -> Option<String> {
        self.state.lock().nodes.get(&key)?.element.attrs.get(name).cloned()
    }

    /// Selected state straight from the DOM
    #[must_use]
    pub fn is_selected_key(&self, key: MockKey) -> bool {
        self.state.lock().nodes.get(&key).is_some_and(|n| n.element.selected)
    }

    /// Computed style straight from the DOM
    #[must_use]
    pub fn css_of(&self, key: MockKey, property: &str) -> Option<String> {
        self.state.lock().nodes.get(&key)?.element.css.get(property).cloned()
    }

    /// Focused node, if any
    #[must_use]
    pub fn active_key(&self) -> Option<MockKey> {
        self.state.lock().active
    }

    /// Number of `find`/`find_all` calls so far
    #[must_use]
    pub fn find_calls(&self) -> usize {
        self.find_calls.load(Ordering::SeqCst)
    }

    /// Zero the lookup counter
    pub fn reset_find_calls(&self) {
        self.find_calls.store(0, Ordering::SeqCst);
    }

    /// Sleep this long at the start of every driver call
    pub fn set_latency(&self, latency: Option<Duration>) {
        self.state.lock().latency = latency;
    }

    /// Implicit wait last handed over by a [`Browser`](crate::Browser).
    /// Recorded only; lookups never wait on it.
    #[must_use]
    pub fn implicit_wait(&self) -> Option<Duration> {
        self.state.lock().implicit_wait
    }

    /// Queue a value for the next `execute_script`
    pub fn push_script_result(&self, value: Value) {
        self.state.lock().scripted.push_back(value);
    }

    /// Every driver call in order
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.state.lock().history.clone()
    }

    /// Check if method was called
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        self.state.lock().history.iter().any(|c| c.starts_with(method))
    }

    /// Scripts passed to `execute_script`
    #[must_use]
    pub fn scripts(&self) -> Vec<String> {
        self.state.lock().scripts.clone()
    }

    fn enter(&self, call: String) {
        let latency = {
            let mut state = self.state.lock();
            state.history.push(call);
            state.latency
        };
        if let Some(latency) = latency {
            thread::sleep(latency);
        }
    }

    fn lookup(&self, locator: &Locator, scope: Scope<'_>) -> EchoResult<Vec<ElementHandle>> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        self.enter(format!("find:{locator}"));
        let matcher = Matcher::compile(locator)?;
        let state = self.state.lock();
        let root = match scope {
            Scope::Document => None,
            Scope::Within(handle) => Some(state.live(handle)?),
        };
        Ok(state
            .document_order(root)
            .into_iter()
            .filter(|k| state.matches(*k, &matcher))
            .map(|k| ElementHandle::new(k.to_string()))
            .collect())
    }
}

impl Driver for MockDriver {
    fn navigate(&self, url: &str) -> EchoResult<()> {
        self.enter(format!("navigate:{url}"));
        self.state.lock().url = url.to_string();
        Ok(())
    }

    fn refresh(&self) -> EchoResult<()> {
        self.enter("refresh".to_string());
        Ok(())
    }

    fn current_url(&self) -> EchoResult<String> {
        self.enter("current_url".to_string());
        Ok(self.state.lock().url.clone())
    }

    fn find(&self, locator: &Locator, scope: Scope<'_>) -> EchoResult<ElementHandle> {
        self.lookup(locator, scope)?
            .into_iter()
            .next()
            .ok_or_else(|| driver::not_found(locator))
    }

    fn find_all(&self, locator: &Locator, scope: Scope<'_>) -> EchoResult<Vec<ElementHandle>> {
        self.lookup(locator, scope)
    }

    fn attribute(&self, handle: &ElementHandle, name: &str) -> EchoResult<Option<String>> {
        self.enter(format!("attribute:{}:{name}", handle.id()));
        let state = self.state.lock();
        let key = state.live(handle)?;
        let e = state.element(key)?;
        Ok(match name {
            "checked" | "selected" => e.selected.then(|| "true".to_string()),
            "disabled" => (!e.enabled).then(|| "true".to_string()),
            "innerHTML" => Some(state.inner_html(key)),
            "textContent" => Some(state.own_and_descendant_text(key, false)),
            _ => e.attrs.get(name).cloned(),
        })
    }

    fn text(&self, handle: &ElementHandle) -> EchoResult<String> {
        self.enter(format!("text:{}", handle.id()));
        let state = self.state.lock();
        let key = state.live(handle)?;
        Ok(state.own_and_descendant_text(key, true))
    }

    fn tag_name(&self, handle: &ElementHandle) -> EchoResult<String> {
        let state = self.state.lock();
        let key = state.live(handle)?;
        Ok(state.element(key)?.tag.clone())
    }

    fn css_value(&self, handle: &ElementHandle, property: &str) -> EchoResult<String> {
        let state = self.state.lock();
        let key = state.live(handle)?;
        Ok(state.element(key)?.css.get(property).cloned().unwrap_or_default())
    }

    fn rect(&self, handle: &ElementHandle) -> EchoResult<Rect> {
        let state = self.state.lock();
        let key = state.live(handle)?;
        Ok(state.element(key)?.rect)
    }

    fn is_displayed(&self, handle: &ElementHandle) -> EchoResult<bool> {
        self.enter(format!("is_displayed:{}", handle.id()));
        let state = self.state.lock();
        let key = state.live(handle)?;
        Ok(state.displayed(key))
    }

    fn is_enabled(&self, handle: &ElementHandle) -> EchoResult<bool> {
        let state = self.state.lock();
        let key = state.live(handle)?;
        Ok(state.element(key)?.enabled)
    }

    fn is_selected(&self, handle: &ElementHandle) -> EchoResult<bool> {
        let state = self.state.lock();
        let key = state.live(handle)?;
        Ok(state.element(key)?.selected)
    }

    fn click(&self, handle: &ElementHandle) -> EchoResult<()> {
        self.enter(format!("click:{}", handle.id()));
        let mut state = self.state.lock();
        let key = state.live(handle)?;
        if !state.displayed(key) {
            return Err(EchoError::NotInteractable {
                message: format!("{key} is not displayed"),
            });
        }
        state.active = Some(key);
        state.activate(key, false);
        Ok(())
    }

    fn send_keys(&self, handle: &ElementHandle, keys: &str) -> EchoResult<()> {
        self.enter(format!("send_keys:{}:{keys}", handle.id()));
        let mut state = self.state.lock();
        let key = state.live(handle)?;
        if !state.displayed(key) || !state.element(key)?.enabled {
            return Err(EchoError::NotInteractable {
                message: format!("{key} cannot receive keys"),
            });
        }
        state.active = Some(key);
        if let Some(e) = state.element_mut(key) {
            e.attrs.entry("value".to_string()).or_default().push_str(keys);
        }
        Ok(())
    }

    fn clear(&self, handle: &ElementHandle) -> EchoResult<()> {
        self.enter(format!("clear:{}", handle.id()));
        let mut state = self.state.lock();
        let key = state.live(handle)?;
        if let Some(e) = state.element_mut(key) {
            e.attrs.insert("value".to_string(), String::new());
        }
        Ok(())
    }

    fn active_element(&self) -> EchoResult<ElementHandle> {
        self.enter("active_element".to_string());
        let state = self.state.lock();
        state
            .active
            .filter(|k| state.nodes.contains_key(k))
            .or_else(|| {
                state
                    .document_order(None)
                    .into_iter()
                    .find(|k| state.nodes.get(k).is_some_and(|n| n.element.tag == "body"))
            })
            .map(|k| ElementHandle::new(k.to_string()))
            .ok_or_else(|| EchoError::NotFound {
                locator: "active element".to_string(),
            })
    }

    fn execute_script(&self, script: &str, args: &[ElementHandle]) -> EchoResult<Value> {
        self.enter(format!("execute_script:{}", args.len()));
        let mut state = self.state.lock();
        state.scripts.push(script.to_string());
        let keys = args.iter().map(|a| state.live(a)).collect::<EchoResult<Vec<_>>>()?;
        if let Some(value) = state.scripted.pop_front() {
            return Ok(value);
        }
        let Some(target) = keys.first().copied() else {
            return Ok(Value::Null);
        };
        let literals = string_literals(script);

        if script.contains(".focus()") {
            state.active = Some(target);
        }
        if script.contains(".blur()") && state.active == Some(target) {
            state.active = None;
        }
        if script.contains("style.setProperty(") {
            if let [property, value, ..] = literals.as_slice() {
                let (property, value) = (property.clone(), value.clone());
                if let Some(e) = state.element_mut(target) {
                    e.css.insert(property, value);
                }
            }
        }
        if script.contains(".value = ") {
            if let Some(value) = literals.first().cloned() {
                if let Some(e) = state.element_mut(target) {
                    e.attrs.insert("value".to_string(), value);
                }
            }
        }
        if script.contains("dispatchEvent(") {
            if let Some(event) = literals.last() {
                let entry = format!("event:{event}:{target}");
                state.history.push(entry);
            }
        }
        Ok(Value::Null)
    }

    fn set_implicit_wait(&self, timeout: Duration) -> EchoResult<()> {
        self.enter(format!("implicit_wait:{}", timeout.as_millis()));
        self.state.lock().implicit_wait = Some(timeout);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn form() -> (MockDriver, MockKey, MockKey) {
        let driver = MockDriver::new();
        let body = driver.insert(None, MockElement::new("body"));
        let form = driver.insert(Some(body), MockElement::new("form").id("login"));
        let input = driver.insert(Some(form), MockElement::new("input").attr("name", "user"));
        (driver, form, input)
    }

    mod lookup_tests {
        use super::*;

        #[test]
        fn test_find_by_each_strategy() {
            let (driver, _, input) = form();
            let expected = driver.handle(input);
            assert_eq!(driver.find(&Locator::name("user"), Scope::Document).unwrap(), expected);
            assert_eq!(driver.find(&Locator::css("input[name=user]"), Scope::Document).unwrap(), expected);
            assert_eq!(driver.find(&Locator::tag_name("INPUT"), Scope::Document).unwrap(), expected);
            assert_eq!(driver.find_calls(), 3);
        }

        #[test]
        fn test_scoped_lookup_only_sees_descendants() {
            let (driver, form, _) = form();
            let outside = driver.insert(None, MockElement::new("input").attr("name", "other"));
            let scope = driver.handle(form);
            let found = driver.find_all(&Locator::tag_name("input"), Scope::Within(&scope)).unwrap();
            assert_eq!(found.len(), 1);
            assert!(!found.contains(&driver.handle(outside)));
        }

        #[test]
        fn test_missing_is_not_found_and_xpath_is_unsupported() {
            let (driver, _, _) = form();
            let err = driver.find(&Locator::id("nope"), Scope::Document).unwrap_err();
            assert!(matches!(err, EchoError::NotFound { .. }));
            let err = driver.find(&Locator::xpath("//input"), Scope::Document).unwrap_err();
            assert!(matches!(err, EchoError::Driver { .. }));
        }

        #[test]
        fn test_link_text() {
            let driver = MockDriver::new();
            let link = driver.insert(None, MockElement::new("a").text("Sign in here"));
            let exact = driver.find(&Locator::link_text("Sign in here"), Scope::Document).unwrap();
            let partial = driver.find(&Locator::partial_link_text("Sign"), Scope::Document).unwrap();
            assert_eq!(exact, driver.handle(link));
            assert_eq!(partial, exact);
        }
    }

    mod staleness_tests {
        use super::*;

        #[test]
        fn test_removed_node_goes_stale() {
            let (driver, form, input) = form();
            let handle = driver.handle(input);
            assert!(driver.remove(form));
            let err = driver.attribute(&handle, "*").unwrap_err();
            assert!(matches!(err, EchoError::StaleHandle { kind: StaleKind::Stale, .. }));
        }

        #[test]
        fn test_rerender_replaces_identity() {
            let (driver, form, _) = form();
            let old = driver.handle(form);
            let fresh = driver.rerender(form).unwrap();
            assert_ne!(driver.handle(fresh), old);
            assert!(driver.key_of(&old).is_none());
            let found = driver.find(&Locator::id("login"), Scope::Document).unwrap();
            assert_eq!(found, driver.handle(fresh));
            assert!(driver.find(&Locator::name("user"), Scope::Within(&found)).is_ok());
        }
    }

    mod interaction_tests {
        use super::*;

        #[test]
        fn test_send_keys_appends_and_clear_empties() {
            let (driver, _, input) = form();
            let handle = driver.handle(input);
            driver.send_keys(&handle, "ab").unwrap();
            driver.send_keys(&handle, "c").unwrap();
            assert_eq!(driver.attribute(&handle, "value").unwrap().as_deref(), Some("abc"));
            driver.clear(&handle).unwrap();
            assert_eq!(driver.attr_of(input, "value").as_deref(), Some(""));
        }

        #[test]
        fn test_hidden_click_is_not_interactable() {
            let (driver, form, input) = form();
            driver.set_displayed(form, false);
            let err = driver.click(&driver.handle(input)).unwrap_err();
            assert!(matches!(err, EchoError::NotInteractable { .. }));
        }

        #[test]
        fn test_label_click_checks_radio() {
            let driver = MockDriver::new();
            let a = driver.insert(None, MockElement::new("input").id("a").attr("type", "radio").attr("name", "g").selected(true));
            let b = driver.insert(None, MockElement::new("input").id("b").attr("type", "radio").attr("name", "g"));
            let label = driver.insert(None, MockElement::new("label").attr("for", "b").text("B"));
            driver.click(&driver.handle(label)).unwrap();
            assert!(driver.is_selected_key(b));
            assert!(!driver.is_selected_key(a));
        }

        #[test]
        fn test_scripts_focus_style_and_scripted_results() {
            let (driver, _, input) = form();
            let handle = driver.handle(input);
            driver.execute_script("arguments[0].focus();", &[handle.clone()]).unwrap();
            assert_eq!(driver.active_key(), Some(input));
            driver
                .execute_script("arguments[0].style.setProperty(\"color\", \"red\");", &[handle.clone()])
                .unwrap();
            assert_eq!(driver.css_value(&handle, "color").unwrap(), "red");
            driver.push_script_result(serde_json::json!(42));
            assert_eq!(driver.execute_script("return 1;", &[handle]).unwrap(), serde_json::json!(42));
        }
    }

    #[test]
    fn test_string_literals_decode_escapes() {
        let found = string_literals(r#"x("a\"b", "c\\d") + "e""#);
        assert_eq!(found, vec!["a\"b".to_string(), "c\\d".to_string(), "e".to_string()]);
    }
}
