//! Driver - the browser capability the page-object layer sits on
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  Node / Browser / PageObject                                  │
//! │      │  resolve, wait, click, attribute ...                   │
//! │      ▼                                                        │
//! │  Driver (object-safe trait, shared as Arc<dyn Driver>)        │
//! │      ├── MockDriver      in-memory DOM for tests and benches  │
//! │      └── <your client>   WebDriver, CDP, ...                  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The trait is a finite capability set. Staleness is reported with
//! [`EchoError::StaleHandle`] and absence with [`EchoError::NotFound`]; the
//! node layer depends on exactly those two answers.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::locator::Locator;
use crate::result::{EchoError, EchoResult};

/// Driver-assigned identity of a native element
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HandleId(String);

impl HandleId {
    /// Wrap a raw driver id
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Raw id string
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque reference to a native DOM element.
///
/// Equality is driver identity only; the display gate flag travels with the
/// handle but never participates in comparison.
///
/// The gate flag is advisory. [`Node`](crate::Node) applies the gate itself
/// before calling the driver, and stamps the composed value on every handle
/// it resolves so a driver that wants to (for logging, or to refuse reads on
/// hidden elements) can see it. No driver is required to read it and
/// `MockDriver` ignores it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementHandle {
    id: HandleId,
    display_gate: bool,
}

impl ElementHandle {
    /// Create a handle for a driver id, gate on
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: HandleId::new(id),
            display_gate: true,
        }
    }

    /// Driver identity
    #[must_use]
    pub const fn id(&self) -> &HandleId {
        &self.id
    }

    /// Whether display gating applies to operations on this handle
    #[must_use]
    pub const fn display_gate(&self) -> bool {
        self.display_gate
    }

    /// Set the display gate flag
    #[must_use]
    pub const fn with_display_gate(mut self, gate: bool) -> Self {
        self.display_gate = gate;
        self
    }
}

impl PartialEq for ElementHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ElementHandle {}

/// Where a lookup starts
#[derive(Debug, Clone, Copy)]
pub enum Scope<'a> {
    /// Whole document
    Document,
    /// Descendants of an element
    Within(&'a ElementHandle),
}

/// Element geometry in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge
    pub x: f64,
    /// Top edge
    pub y: f64,
    /// Width
    pub width: f64,
    /// Height
    pub height: f64,
}

impl Rect {
    /// Create a new rect
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Area in square pixels
    #[must_use]
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Overlap test; touching edges count as overlapping
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        let horizontal = self.x <= other.x + other.width && other.x <= self.x + self.width;
        let vertical = self.y <= other.y + other.height && other.y <= self.y + self.height;
        horizontal && vertical
    }
}

/// Browser automation capability.
///
/// Implementations must be shareable across threads: the polling engine
/// runs driver calls on auxiliary threads.
pub trait Driver: Send + Sync + fmt::Debug {
    /// Load a URL in the current window
    fn navigate(&self, url: &str) -> EchoResult<()>;

    /// Reload the current page
    fn refresh(&self) -> EchoResult<()>;

    /// URL of the current page
    fn current_url(&self) -> EchoResult<String>;

    /// First element matching `locator` within `scope`
    fn find(&self, locator: &Locator, scope: Scope<'_>) -> EchoResult<ElementHandle>;

    /// All elements matching `locator` within `scope`, possibly empty
    fn find_all(&self, locator: &Locator, scope: Scope<'_>) -> EchoResult<Vec<ElementHandle>>;

    /// Attribute or property value; `None` when absent
    fn attribute(&self, handle: &ElementHandle, name: &str) -> EchoResult<Option<String>>;

    /// Rendered text
    fn text(&self, handle: &ElementHandle) -> EchoResult<String>;

    /// Lower-case tag name
    fn tag_name(&self, handle: &ElementHandle) -> EchoResult<String>;

    /// Computed CSS property value
    fn css_value(&self, handle: &ElementHandle, property: &str) -> EchoResult<String>;

    /// Geometry
    fn rect(&self, handle: &ElementHandle) -> EchoResult<Rect>;

    /// Whether the element is rendered visibly
    fn is_displayed(&self, handle: &ElementHandle) -> EchoResult<bool>;

    /// Whether the element accepts interaction
    fn is_enabled(&self, handle: &ElementHandle) -> EchoResult<bool>;

    /// Selection state for options, checkboxes and radios
    fn is_selected(&self, handle: &ElementHandle) -> EchoResult<bool>;

    /// Click the element
    fn click(&self, handle: &ElementHandle) -> EchoResult<()>;

    /// Type keys into the element
    fn send_keys(&self, handle: &ElementHandle, keys: &str) -> EchoResult<()>;

    /// Clear an editable element
    fn clear(&self, handle: &ElementHandle) -> EchoResult<()>;

    /// Element that currently holds focus
    fn active_element(&self) -> EchoResult<ElementHandle>;

    /// Run a script with element arguments, returning its JSON result
    fn execute_script(
        &self,
        script: &str,
        args: &[ElementHandle],
    ) -> EchoResult<serde_json::Value>;

    /// How long `find` itself keeps looking before reporting `NotFound`.
    ///
    /// Drivers without an implicit wait keep the default, which ignores it.
    fn set_implicit_wait(&self, _timeout: Duration) -> EchoResult<()> {
        Ok(())
    }
}

/// The `NotFound` error a driver reports for `locator`
#[must_use]
pub fn not_found(locator: &Locator) -> EchoError {
    EchoError::NotFound {
        locator: locator.to_string(),
    }
}
