//! `<table>` reading.
//!
//! Cell text is read without the display gate: tables often extend past
//! the viewport and waiting on every cell would be slow.

use crate::browser::Browser;
use crate::driver::Scope;
use crate::locator::Locator;
use crate::node::Node;
use crate::result::{EchoError, EchoResult};

use super::descendant_texts;

/// HTML table
#[derive(Debug, Clone)]
pub struct Table {
    node: Node,
}

impl Table {
    /// Top-level table
    #[must_use]
    pub fn new(browser: &Browser, locator: Locator) -> Self {
        Self::from_node(browser.node(locator))
    }

    /// Table nested in `parent`
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

    /// Every `<tr>`, header row included
    pub fn rows(&self) -> EchoResult<Vec<Node>> {
        self.node.find_elements(&Locator::tag_name("tr"))
    }

    fn first_row(&self) -> EchoResult<Node> {
        self.node.find_element(&Locator::tag_name("tr"))
    }

    /// Whether the first row holds `<th>` cells
    pub fn has_header_row(&self) -> EchoResult<bool> {
        let row = self.first_row()?;
        Ok(!row.find_elements(&Locator::tag_name("th"))?.is_empty())
    }

    /// `<th>` texts of the first row; empty when it is not a header row
    pub fn header_texts(&self) -> EchoResult<Vec<String>> {
        descendant_texts(&self.first_row()?, "th")
    }

    /// Header texts (if any) followed by the `<td>` texts of each body row
    pub fn text_matrix(&self) -> EchoResult<Vec<Vec<String>>> {
        let header = self.header_texts()?;
        let mut matrix = Vec::new();
        if !header.is_empty() {
            matrix.push(header);
        }

        let driver = self.node.browser().driver();
        let table = self.node.resolve()?;
        let body_rows = match driver.find_all(&Locator::tag_name("tbody"), Scope::Within(&table))?.first() {
            Some(body) => driver.find_all(&Locator::tag_name("tr"), Scope::Within(body))?,
            None => driver.find_all(&Locator::tag_name("tr"), Scope::Within(&table))?,
        };
        for row in body_rows {
            let cells = driver.find_all(&Locator::tag_name("td"), Scope::Within(&row))?;
            if cells.is_empty() {
                continue;
            }
            let texts = cells
                .iter()
                .map(|cell| Ok(driver.text(cell)?.trim().to_string()))
                .collect::<EchoResult<Vec<_>>>()?;
            matrix.push(texts);
        }
        Ok(matrix)
    }

    /// For each data row, the texts of the cells under every header reading
    /// `label`
    pub fn cell_texts_for_header(&self, label: &str) -> EchoResult<Vec<Vec<String>>> {
        if !self.has_header_row()? {
            return Err(EchoError::TableFormat {
                message: "Table has no header row.".to_string(),
            });
        }
        let mut rows = self.rows()?.into_iter();
        let Some(header) = rows.next() else {
            return Ok(Vec::new());
        };
        let headers = descendant_texts(&header, "th")?;
        let data = rows
            .map(|row| descendant_texts(&row, "td"))
            .collect::<EchoResult<Vec<_>>>()?;

        if let Some(first) = data.first() {
            if first.len() != headers.len() {
                return Err(EchoError::TableFormat {
                    message: "The number of cells in the header row does not match the number of cells in a non header row."
                        .to_string(),
                });
            }
        }

        let indices: Vec<usize> = headers
            .iter()
            .enumerate()
            .filter(|(_, text)| *text == label)
            .map(|(idx, _)| idx)
            .collect();

        data.into_iter()
            .map(|cells| {
                indices
                    .iter()
                    .map(|&idx| {
                        cells.get(idx).cloned().ok_or_else(|| EchoError::TableFormat {
                            message: format!("row has no cell in column {idx}"),
                        })
                    })
                    .collect()
            })
            .collect()
    }
}

impl AsRef<Node> for Table {
    fn as_ref(&self) -> &Node {
        &self.node
    }
}
