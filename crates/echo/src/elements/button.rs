//! `<button>`

use crate::browser::Browser;
use crate::locator::Locator;
use crate::node::Node;
use crate::result::EchoResult;

/// Button control
#[derive(Debug, Clone)]
pub struct Button {
    node: Node,
}

impl Button {
    /// Top-level button
    #[must_use]
    pub fn new(browser: &Browser, locator: Locator) -> Self {
        Self::from_node(browser.node(locator))
    }

    /// Button nested in `parent`
    #[must_use]
    pub fn within(parent: &Node, locator: Locator) -> Self {
        Self::from_node(parent.child(locator))
    }

    /// Wrap an existing node
    #[must_use]
    pub const fn from_node(node: Node) -> Self {
        Self { node }
    }

    /// Underlying node
    #[must_use]
    pub const fn node(&self) -> &Node {
        &self.node
    }

    /// Click once displayed
    pub fn click(&self) -> EchoResult<()> {
        self.node.click()
    }

    /// Whether the button refuses clicks
    pub fn is_disabled(&self) -> EchoResult<bool> {
        self.node.is_disabled()
    }

    /// `type` attribute
    pub fn button_type(&self) -> EchoResult<Option<String>> {
        self.node.attribute("type")
    }

    /// `name` attribute
    pub fn name(&self) -> EchoResult<Option<String>> {
        self.node.attribute("name")
    }

    /// `value` attribute
    pub fn value(&self) -> EchoResult<Option<String>> {
        self.node.attribute("value")
    }
}

impl AsRef<Node> for Button {
    fn as_ref(&self) -> &Node {
        &self.node
    }
}
