//! `<ol>`, `<ul>` and their `<li>` items.
//!
//! The list itself is awaited; item texts and values are then read without
//! the display gate, so collapsed items do not stall a read.

use crate::browser::Browser;
use crate::locator::Locator;
use crate::node::Node;
use crate::result::EchoResult;

use super::{raw_attribute, raw_text};

/// List entry
#[derive(Debug, Clone)]
pub struct ListItem {
    node: Node,
}

impl ListItem {
    /// Top-level item
    #[must_use]
    pub fn new(browser: &Browser, locator: Locator) -> Self {
        Self::from_node(browser.node(locator))
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

    /// Rendered text of the item
    pub fn label(&self) -> EchoResult<String> {
        self.node.text()
    }

    /// `value` attribute
    pub fn value(&self) -> EchoResult<Option<String>> {
        self.node.attribute("value")
    }
}

impl AsRef<Node> for ListItem {
    fn as_ref(&self) -> &Node {
        &self.node
    }
}

fn items_of(list: &Node) -> EchoResult<Vec<ListItem>> {
    list.gated()?;
    Ok(list
        .find_elements(&Locator::tag_name("li"))?
        .into_iter()
        .map(ListItem::from_node)
        .collect())
}

fn labels_of(list: &Node) -> EchoResult<Vec<String>> {
    items_of(list)?.iter().map(|item| raw_text(item.node())).collect()
}

fn values_of(list: &Node) -> EchoResult<Vec<Option<String>>> {
    items_of(list)?
        .iter()
        .map(|item| raw_attribute(item.node(), "value"))
        .collect()
}

macro_rules! html_list {
    ($name:ident, $tag:literal) => {
        #[doc = concat!("`<", $tag, ">` list")]
        #[derive(Debug, Clone)]
        pub struct $name {
            node: Node,
        }

        impl $name {
            /// Top-level list
            #[must_use]
            pub fn new(browser: &Browser, locator: Locator) -> Self {
                Self::from_node(browser.node(locator))
            }

            /// List nested in `parent`
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

            /// Every `<li>` below the list, nested lists included
            pub fn items(&self) -> EchoResult<Vec<ListItem>> {
                items_of(&self.node)
            }

            /// Text of every item
            pub fn labels(&self) -> EchoResult<Vec<String>> {
                labels_of(&self.node)
            }

            /// `value` attribute of every item
            pub fn values(&self) -> EchoResult<Vec<Option<String>>> {
                values_of(&self.node)
            }
        }

        impl AsRef<Node> for $name {
            fn as_ref(&self) -> &Node {
                &self.node
            }
        }
    };
}

html_list!(OrderedList, "ol");
html_list!(UnorderedList, "ul");
