//! `<dl>` with its `<dt>` terms and `<dd>` descriptions

use crate::browser::Browser;
use crate::locator::Locator;
use crate::node::Node;
use crate::result::{EchoError, EchoResult};

use super::raw_text;

/// `<dt>` term
#[derive(Debug, Clone)]
pub struct Term {
    node: Node,
}

/// `<dd>` description
#[derive(Debug, Clone)]
pub struct Description {
    node: Node,
}

impl Term {
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

    /// Rendered text
    pub fn text(&self) -> EchoResult<String> {
        raw_text(&self.node)
    }
}

impl Description {
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

    /// Rendered text
    pub fn text(&self) -> EchoResult<String> {
        raw_text(&self.node)
    }
}

/// Term paired with the description at the same position
#[derive(Debug, Clone)]
pub struct DefinitionItem {
    /// The `<dt>`
    pub term: Term,
    /// The `<dd>`
    pub description: Description,
}

/// Definition list
#[derive(Debug, Clone)]
pub struct DefinitionList {
    node: Node,
}

impl DefinitionList {
    /// Top-level definition list
    #[must_use]
    pub fn new(browser: &Browser, locator: Locator) -> Self {
        Self::from_node(browser.node(locator))
    }

    /// Definition list nested in `parent`
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

    /// Every `<dt>`, in document order
    pub fn terms(&self) -> EchoResult<Vec<Term>> {
        Ok(self
            .node
            .find_elements(&Locator::tag_name("dt"))?
            .into_iter()
            .map(Term::from_node)
            .collect())
    }

    /// Every `<dd>`, in document order
    pub fn descriptions(&self) -> EchoResult<Vec<Description>> {
        Ok(self
            .node
            .find_elements(&Locator::tag_name("dd"))?
            .into_iter()
            .map(Description::from_node)
            .collect())
    }

    /// Terms zipped with descriptions by position.
    ///
    /// Unbalanced lists yield as many pairs as the shorter side has.
    pub fn items(&self) -> EchoResult<Vec<DefinitionItem>> {
        Ok(self
            .terms()?
            .into_iter()
            .zip(self.descriptions()?)
            .map(|(term, description)| DefinitionItem { term, description })
            .collect())
    }

    /// Text of the description paired with the term reading `term`
    pub fn description_for_term(&self, term: &str) -> EchoResult<String> {
        for item in self.items()? {
            if item.term.text()? == term {
                return item.description.text();
            }
        }
        Err(EchoError::NotFound {
            locator: format!("Definition term not found: '{term}'."),
        })
    }
}

impl AsRef<Node> for DefinitionList {
    fn as_ref(&self) -> &Node {
        &self.node
    }
}
