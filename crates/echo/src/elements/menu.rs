//! `<menu>` and its `<menuitem>`s.
//!
//! Menu items are rarely rendered on their own, so everything here reads
//! attributes without the display gate.

use crate::browser::Browser;
use crate::locator::Locator;
use crate::node::Node;
use crate::result::EchoResult;

use super::raw_attribute;

/// Menu command
#[derive(Debug, Clone)]
pub struct MenuItem {
    node: Node,
}

impl MenuItem {
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

    /// Any attribute of the item
    pub fn attribute(&self, name: &str) -> EchoResult<Option<String>> {
        raw_attribute(&self.node, name)
    }

    /// `label` attribute
    pub fn label(&self) -> EchoResult<Option<String>> {
        self.attribute("label")
    }

    /// `value` attribute
    pub fn value(&self) -> EchoResult<Option<String>> {
        self.attribute("value")
    }

    /// `type` attribute (`command`, `checkbox` or `radio`)
    pub fn item_type(&self) -> EchoResult<Option<String>> {
        self.attribute("type")
    }

    /// `checked` attribute
    pub fn checked(&self) -> EchoResult<Option<String>> {
        self.attribute("checked")
    }

    /// `command` attribute
    pub fn command(&self) -> EchoResult<Option<String>> {
        self.attribute("command")
    }

    /// `default` attribute
    pub fn default(&self) -> EchoResult<Option<String>> {
        self.attribute("default")
    }

    /// `disabled` attribute
    pub fn disabled(&self) -> EchoResult<Option<String>> {
        self.attribute("disabled")
    }

    /// `icon` attribute
    pub fn icon(&self) -> EchoResult<Option<String>> {
        self.attribute("icon")
    }

    /// `radiogroup` attribute
    pub fn radiogroup(&self) -> EchoResult<Option<String>> {
        self.attribute("radiogroup")
    }
}

impl AsRef<Node> for MenuItem {
    fn as_ref(&self) -> &Node {
        &self.node
    }
}

/// Menu of commands
#[derive(Debug, Clone)]
pub struct Menu {
    node: Node,
}

impl Menu {
    /// Top-level menu
    #[must_use]
    pub fn new(browser: &Browser, locator: Locator) -> Self {
        Self::from_node(browser.node(locator))
    }

    /// Menu nested in `parent`
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

    /// `label` attribute of the menu
    pub fn label(&self) -> EchoResult<Option<String>> {
        raw_attribute(&self.node, "label")
    }

    /// `type` attribute of the menu
    pub fn menu_type(&self) -> EchoResult<Option<String>> {
        raw_attribute(&self.node, "type")
    }

    /// Every `<menuitem>`, in document order
    pub fn items(&self) -> EchoResult<Vec<MenuItem>> {
        Ok(self
            .node
            .find_elements(&Locator::tag_name("menuitem"))?
            .into_iter()
            .map(MenuItem::from_node)
            .collect())
    }

    /// `label` attribute of every item
    pub fn labels(&self) -> EchoResult<Vec<Option<String>>> {
        self.items()?.iter().map(MenuItem::label).collect()
    }

    /// `value` attribute of every item
    pub fn values(&self) -> EchoResult<Vec<Option<String>>> {
        self.items()?.iter().map(MenuItem::value).collect()
    }
}

impl AsRef<Node> for Menu {
    fn as_ref(&self) -> &Node {
        &self.node
    }
}
