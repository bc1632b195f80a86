//! Locators: how a node finds its DOM element.
//!
//! A [`Locator`] is an immutable `(strategy, selector)` pair. The absence of a
//! strategy marks a *detached* locator: the node was built from a handle that
//! was already resolved and has no recipe for finding it again.
//!
//! ```
//! use echo::{Locator, Strategy};
//!
//! let submit = Locator::css("form button[type=submit]");
//! assert_eq!(submit.strategy(), Some(Strategy::Css));
//! assert_eq!(Locator::id("login").to_css().as_deref(), Some("#login"));
//! assert!(Locator::detached().is_detached());
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// Element lookup strategy.
///
/// Each variant renders to the strategy string the W3C WebDriver protocol
/// uses in its `find element` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// `id` attribute
    Id,
    /// CSS selector
    Css,
    /// XPath expression
    XPath,
    /// Tag name
    TagName,
    /// `name` attribute
    Name,
    /// Exact link text
    LinkText,
    /// Substring of link text
    PartialLinkText,
    /// Single class name
    ClassName,
}

impl Strategy {
    /// W3C strategy string
    #[must_use]
    pub const fn as_w3c(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Css => "css selector",
            Self::XPath => "xpath",
            Self::TagName => "tag name",
            Self::Name => "name",
            Self::LinkText => "link text",
            Self::PartialLinkText => "partial link text",
            Self::ClassName => "class name",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_w3c())
    }
}

/// Immutable element locator
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    strategy: Option<Strategy>,
    selector: String,
}

impl Locator {
    /// Create a locator from a strategy and selector
    #[must_use]
    pub fn new(strategy: Strategy, selector: impl Into<String>) -> Self {
        Self {
            strategy: Some(strategy),
            selector: selector.into(),
        }
    }

    /// The detached marker: cannot be re-resolved
    #[must_use]
    pub const fn detached() -> Self {
        Self {
            strategy: None,
            selector: String::new(),
        }
    }

    /// Locate by `id` attribute
    #[must_use]
    pub fn id(id: impl Into<String>) -> Self {
        Self::new(Strategy::Id, id)
    }

    /// Locate by CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::new(Strategy::Css, selector)
    }

    /// Locate by XPath expression
    #[must_use]
    pub fn xpath(expr: impl Into<String>) -> Self {
        Self::new(Strategy::XPath, expr)
    }

    /// Locate by tag name
    #[must_use]
    pub fn tag_name(tag: impl Into<String>) -> Self {
        Self::new(Strategy::TagName, tag)
    }

    /// Locate by `name` attribute
    #[must_use]
    pub fn name(name: impl Into<String>) -> Self {
        Self::new(Strategy::Name, name)
    }

    /// Locate a link by its exact text
    #[must_use]
    pub fn link_text(text: impl Into<String>) -> Self {
        Self::new(Strategy::LinkText, text)
    }

    /// Locate a link by part of its text
    #[must_use]
    pub fn partial_link_text(text: impl Into<String>) -> Self {
        Self::new(Strategy::PartialLinkText, text)
    }

    /// Locate by a single class name
    #[must_use]
    pub fn class_name(class: impl Into<String>) -> Self {
        Self::new(Strategy::ClassName, class)
    }

    /// Strategy, `None` when detached
    #[must_use]
    pub const fn strategy(&self) -> Option<Strategy> {
        self.strategy
    }

    /// Raw selector text
    #[must_use]
    pub fn selector(&self) -> &str {
        &self.selector
    }

    /// Whether this is the detached marker
    #[must_use]
    pub const fn is_detached(&self) -> bool {
        self.strategy.is_none()
    }

    /// CSS equivalent for the CSS-expressible strategies
    #[must_use]
    pub fn to_css(&self) -> Option<String> {
        match self.strategy? {
            Strategy::Css => Some(self.selector.clone()),
            Strategy::Id => Some(format!("#{}", self.selector)),
            Strategy::Name => Some(format!("[name='{}']", self.selector)),
            Strategy::ClassName => Some(format!(".{}", self.selector)),
            Strategy::TagName => Some(self.selector.clone()),
            Strategy::XPath | Strategy::LinkText | Strategy::PartialLinkText => None,
        }
    }

    /// `(using, value)` pair for a W3C `find element` request body
    #[must_use]
    pub fn to_w3c(&self) -> Option<(&'static str, &str)> {
        self.strategy.map(|s| (s.as_w3c(), self.selector.as_str()))
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.strategy {
            Some(strategy) => write!(f, "{strategy}={}", self.selector),
            None => f.write_str("<detached>"),
        }
    }
}
