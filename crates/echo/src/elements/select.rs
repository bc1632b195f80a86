//! `<select>` and its `<option>`s

use crate::browser::Browser;
use crate::locator::Locator;
use crate::node::Node;
use crate::result::{EchoError, EchoResult};

use super::raw_text;

/// Drop-down or list box
#[derive(Debug, Clone)]
pub struct Select {
    node: Node,
}

impl Select {
    /// Top-level select
    #[must_use]
    pub fn new(browser: &Browser, locator: Locator) -> Self {
        Self::from_node(browser.node(locator))
    }

    /// Select nested in `parent`
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

    /// Every `<option>`, in document order
    pub fn options(&self) -> EchoResult<Vec<Node>> {
        self.node.gated()?;
        self.node.find_elements(&Locator::tag_name("option"))
    }

    /// Text of every option
    pub fn option_texts(&self) -> EchoResult<Vec<String>> {
        self.options()?.iter().map(raw_text).collect()
    }

    /// First selected option, if any
    pub fn selected_option(&self) -> EchoResult<Option<Node>> {
        for option in self.options()? {
            if option.is_selected()? {
                return Ok(Some(option));
            }
        }
        Ok(None)
    }

    /// `value` of the first selected option
    pub fn selected_value(&self) -> EchoResult<Option<String>> {
        match self.selected_option()? {
            Some(option) => option.attribute("value"),
            None => Ok(None),
        }
    }

    fn choose(option: &Node, described: &str) -> EchoResult<()> {
        if !option.is_enabled()? {
            return Err(EchoError::NotInteractable {
                message: format!("Option {described} is disabled and not selectable."),
            });
        }
        option.click()
    }

    /// Pick the option whose `value` attribute is `value`
    pub fn select_by_value(&self, value: &str) -> EchoResult<()> {
        for option in self.options()? {
            if option.attribute("value")?.as_deref() == Some(value) {
                return Self::choose(&option, &format!("with value '{value}'"));
            }
        }
        Err(EchoError::NotFound {
            locator: format!("option with value '{value}' in {}", self.node),
        })
    }

    /// Pick the option whose text is `label`
    pub fn select(&self, label: &str) -> EchoResult<()> {
        for option in self.options()? {
            if raw_text(&option)? == label {
                return Self::choose(&option, &format!("'{label}'"));
            }
        }
        Err(EchoError::NotFound {
            locator: format!("Could not find the option '{label}'."),
        })
    }
}

impl AsRef<Node> for Select {
    fn as_ref(&self) -> &Node {
        &self.node
    }
}
