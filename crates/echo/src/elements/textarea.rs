//! `<textarea>`
//!
//! Typing follows [`TextInput`](super::TextInput): slow mode sends short
//! alphanumeric values key by key and checks each one landed.

use crate::browser::Browser;
use crate::locator::Locator;
use crate::node::Node;
use crate::result::EchoResult;

use super::input::{replace_value, type_with_wait, types_slowly, KeyTiming};

/// Multi-line text field
#[derive(Debug, Clone)]
pub struct Textarea {
    node: Node,
    timing: KeyTiming,
}

impl Textarea {
    /// Top-level textarea
    #[must_use]
    pub fn new(browser: &Browser, locator: Locator) -> Self {
        Self::from_node(browser.node(locator))
    }

    /// Textarea nested in `parent`
    #[must_use]
    pub fn within(parent: &Node, locator: Locator) -> Self {
        Self::from_node(parent.child(locator))
    }

    /// Wrap an existing node
    #[must_use]
    pub fn from_node(node: Node) -> Self {
        Self {
            node,
            timing: KeyTiming::default(),
        }
    }

    /// Override the pacing used in slow mode
    #[must_use]
    pub const fn with_key_timing(mut self, timing: KeyTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Underlying node
    #[must_use]
    pub const fn node(&self) -> &Node {
        &self.node
    }

    /// Current contents
    pub fn value(&self) -> EchoResult<Option<String>> {
        self.node.attribute("value")
    }

    /// Replace the contents
    pub fn set_value(&self, value: &str) -> EchoResult<()> {
        if types_slowly(&self.node, value) {
            return self.set_value_with_wait(value);
        }
        replace_value(&self.node, value)
    }

    /// Type `value` one key at a time, confirming each key landed
    pub fn set_value_with_wait(&self, value: &str) -> EchoResult<()> {
        type_with_wait(&self.node, self.timing, value)
    }

    /// Type `value` after what is already there
    pub fn append(&self, value: &str) -> EchoResult<()> {
        self.node.send_keys(value)
    }

    /// Empty the field
    pub fn clear(&self) -> EchoResult<()> {
        self.node.clear()
    }

    /// `name` attribute
    pub fn name(&self) -> EchoResult<Option<String>> {
        self.node.attribute("name")
    }
}

impl AsRef<Node> for Textarea {
    fn as_ref(&self) -> &Node {
        &self.node
    }
}
