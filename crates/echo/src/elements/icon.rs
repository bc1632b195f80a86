//! `<i>` / `<icon>`

use crate::browser::Browser;
use crate::locator::Locator;
use crate::node::Node;
use crate::result::EchoResult;

/// Icon glyph
#[derive(Debug, Clone)]
pub struct Icon {
    node: Node,
}

impl Icon {
    /// Top-level icon
    #[must_use]
    pub fn new(browser: &Browser, locator: Locator) -> Self {
        Self::from_node(browser.node(locator))
    }

    /// Icon nested in `parent`
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
}

impl AsRef<Node> for Icon {
    fn as_ref(&self) -> &Node {
        &self.node
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::BrowserConfig;
    use crate::mock::{MockDriver, MockElement};
    use std::sync::Arc;

    #[test]
    fn test_icon_reads_through_node() {
        let driver = Arc::new(MockDriver::new());
        let toolbar = driver.insert(None, MockElement::new("div").id("toolbar"));
        let icon = driver.insert(Some(toolbar), MockElement::new("i").class("fa-save").attr("title", "Save"));
        let browser = Browser::new(driver.clone(), BrowserConfig::default().with_timeout(300));
        let toolbar = browser.node(Locator::id("toolbar"));
        let save = Icon::within(&toolbar, Locator::class_name("fa-save"));
        assert_eq!(save.node().attribute("title").unwrap().as_deref(), Some("Save"));
        assert_eq!(save.node().tag_name().unwrap(), "i");
        save.click().unwrap();
        assert_eq!(driver.active_key(), Some(icon));
    }
}
