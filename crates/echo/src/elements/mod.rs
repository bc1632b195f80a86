//! Typed wrappers for common HTML controls.
//!
//! Each wrapper owns a [`Node`] and adds the behaviour of its control on
//! top: typing into text inputs, toggling checkboxes, picking radio and
//! select options, reading tables and lists.
//!
//! | Type                 | Tag                         |
//! |----------------------|-----------------------------|
//! | [`Button`]           | `<button>`                  |
//! | [`Input`]            | `<input type=...>`          |
//! | [`Textarea`]         | `<textarea>`                |
//! | [`Select`]           | `<select>` / `<option>`     |
//! | [`Table`]            | `<table>` / `<tr>` / `<td>` |
//! | [`OrderedList`]      | `<ol>` / `<li>`             |
//! | [`UnorderedList`]    | `<ul>` / `<li>`             |
//! | [`DefinitionList`]   | `<dl>` / `<dt>` / `<dd>`    |
//! | [`Menu`]             | `<menu>` / `<menuitem>`     |
//! | [`Icon`]             | `<i>` / `<icon>`            |

mod button;
mod definitions;
mod icon;
mod input;
mod list;
mod menu;
mod select;
mod table;
mod textarea;

pub use button::Button;
pub use definitions::{DefinitionItem, DefinitionList, Description, Term};
pub use icon::Icon;
pub use input::{
    Checkbox, FileInput, Input, InputControl, InputKind, KeyTiming, PlainInput, Radio, TextInput,
};
pub use list::{ListItem, OrderedList, UnorderedList};
pub use menu::{Menu, MenuItem};
pub use select::Select;
pub use table::Table;
pub use textarea::Textarea;

use crate::driver::Scope;
use crate::locator::Locator;
use crate::node::Node;
use crate::result::EchoResult;

/// Rendered text of `node`, read without the display gate
fn raw_text(node: &Node) -> EchoResult<String> {
    let handle = node.resolve()?;
    node.browser().driver().text(&handle)
}

/// Attribute of `node`, read without the display gate
fn raw_attribute(node: &Node, name: &str) -> EchoResult<Option<String>> {
    let handle = node.resolve()?;
    node.browser().driver().attribute(&handle, name)
}

/// Texts of every `tag` descendant of `node`, read without the display gate
fn descendant_texts(node: &Node, tag: &str) -> EchoResult<Vec<String>> {
    let driver = node.browser().driver();
    let scope = node.resolve()?;
    driver
        .find_all(&Locator::tag_name(tag), Scope::Within(&scope))?
        .iter()
        .map(|handle| driver.text(handle))
        .collect()
}
