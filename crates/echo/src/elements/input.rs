//! `<input>` controls.
//!
//! The `type` attribute picks the behaviour. [`InputKind`] names the
//! supported types and [`Input`] holds the matching control, so a page
//! object can declare an input once and use it through [`InputControl`]
//! or downcast to the specific control.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::browser::Browser;
use crate::locator::Locator;
use crate::node::{js_string, Node};
use crate::result::{EchoError, EchoResult, ErrorKind};
use crate::wait::{wait_for_condition, WaitOptions};

use super::{raw_attribute, raw_text};

/// W3C key code for backspace
const BACKSPACE: &str = "\u{E003}";

/// Supported `<input type=...>` values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    /// `text`
    Text,
    /// `password`
    Password,
    /// `checkbox`
    Checkbox,
    /// `radio`
    Radio,
    /// `date`
    Date,
    /// `file`
    File,
    /// `hidden`
    Hidden,
    /// `range`
    Range,
    /// `submit`
    Submit,
}

impl InputKind {
    /// Every supported kind
    pub const ALL: [Self; 9] = [
        Self::Text,
        Self::Password,
        Self::Checkbox,
        Self::Radio,
        Self::Date,
        Self::File,
        Self::Hidden,
        Self::Range,
        Self::Submit,
    ];

    /// Value of the `type` attribute
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Password => "password",
            Self::Checkbox => "checkbox",
            Self::Radio => "radio",
            Self::Date => "date",
            Self::File => "file",
            Self::Hidden => "hidden",
            Self::Range => "range",
            Self::Submit => "submit",
        }
    }
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InputKind {
    type Err = EchoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| EchoError::configuration(format!("Invalid or unsupported input type. '{s}'")))
    }
}

/// Behaviour shared by every input control
pub trait InputControl {
    /// Underlying node
    fn node(&self) -> &Node;

    /// Input type
    fn kind(&self) -> InputKind;

    /// Current value
    fn value(&self) -> EchoResult<Option<String>> {
        self.node().attribute("value")
    }

    /// Replace the value
    fn set_value(&self, value: &str) -> EchoResult<()>;

    /// Empty the control
    fn clear(&self) -> EchoResult<()> {
        self.node().clear()
    }
}

/// Clear, then type `value`
pub(super) fn replace_value(node: &Node, value: &str) -> EchoResult<()> {
    node.clear()?;
    node.send_keys(value).map_err(|err| match err {
        EchoError::Driver { message } => EchoError::Driver {
            message: format!("{message}\nvalue setter failed. Try set_value_with_script"),
        },
        other => other,
    })
}

/// Slow mode types values of two or more alphanumeric characters key by key
pub(super) fn types_slowly(node: &Node, value: &str) -> bool {
    node.slow_mode() && value.chars().count() > 1 && value.chars().all(char::is_alphanumeric)
}

fn current_value(node: &Node) -> EchoResult<String> {
    Ok(node.attribute("value")?.unwrap_or_default())
}

fn millis(duration: Duration) -> u64 {
    duration.as_millis() as u64
}

/// Type `value` into `node` one key at a time, confirming each key landed.
///
/// The field is cleared first (falling back to backspaces), then each key
/// is sent and the value polled for the expected prefix; a key that does
/// not show up is sent again until the character budget runs out.
pub(super) fn type_with_wait(node: &Node, timing: KeyTiming, value: &str) -> EchoResult<()> {
    node.gated()?;
    let key_options = WaitOptions::new()
        .with_timeout(millis(timing.key_timeout))
        .with_frequency(millis(timing.key_check_frequency));

    let typed = node;
    let node = typed.clone();
    let cleared = wait_for_condition(
        move || {
            node.clear()?;
            Ok(current_value(&node)?.is_empty())
        },
        &key_options.clone().with_message("Failed to wait for clear."),
    );
    match cleared {
        Ok(_) => {}
        Err(err) if err.is_poll_timeout() => {
            let leftover = current_value(typed)?.chars().count();
            tracing::debug!(node = %typed, leftover, "clear did not empty the field, sending backspaces");
            typed.send_keys(&BACKSPACE.repeat(leftover))?;
            let node = typed.clone();
            wait_for_condition(
                move || Ok(current_value(&node)?.is_empty()),
                &key_options.clone().with_message("Failed to wait for backspaces."),
            )?;
        }
        Err(err) => return Err(err),
    }

    let character_options = WaitOptions::new()
        .with_timeout(millis(timing.character_timeout))
        .with_frequency(millis(timing.key_timeout))
        .ignoring([ErrorKind::Timeout])
        .with_message("Failed to send key, even after retrying a few times");

    for (idx, key) in value.char_indices() {
        let expected = value[..idx + key.len_utf8()].to_string();
        let node = typed.clone();
        let key_options = key_options.clone();
        wait_for_condition(
            move || {
                node.send_keys(&key.to_string())?;
                let node = node.clone();
                let expected = expected.clone();
                wait_for_condition(move || Ok(current_value(&node)? == expected), &key_options)
            },
            &character_options,
        )?;
    }
    Ok(())
}

// =============================================================================
// TEXT / PASSWORD
// =============================================================================

/// Pacing for [`TextInput::set_value_with_wait`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyTiming {
    /// Budget for one key to show up in the value
    pub key_timeout: Duration,
    /// Pause between checks for a key
    pub key_check_frequency: Duration,
    /// Budget for one character, retries included
    pub character_timeout: Duration,
}

impl Default for KeyTiming {
    fn default() -> Self {
        Self {
            key_timeout: Duration::from_secs(3),
            key_check_frequency: Duration::from_secs(1),
            character_timeout: Duration::from_secs(12),
        }
    }
}

/// Text or password input
#[derive(Debug, Clone)]
pub struct TextInput {
    node: Node,
    kind: InputKind,
    timing: KeyTiming,
}

impl TextInput {
    /// Top-level `type=text` input
    #[must_use]
    pub fn new(browser: &Browser, locator: Locator) -> Self {
        Self::from_node(browser.node(locator), InputKind::Text)
    }

    /// Top-level `type=password` input
    #[must_use]
    pub fn password(browser: &Browser, locator: Locator) -> Self {
        Self::from_node(browser.node(locator), InputKind::Password)
    }

    /// Wrap `node`; `kind` should be text or password
    #[must_use]
    pub fn from_node(node: Node, kind: InputKind) -> Self {
        Self {
            node,
            kind,
            timing: KeyTiming::default(),
        }
    }

    /// Override the pacing used in slow mode
    #[must_use]
    pub const fn with_key_timing(mut self, timing: KeyTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Type `value` after what is already there
    pub fn append(&self, value: &str) -> EchoResult<()> {
        self.node.send_keys(value)
    }

    /// Set the value through a script and fire an `input` event
    pub fn set_value_with_script(&self, value: &str) -> EchoResult<()> {
        self.node.gated()?;
        self.node.clear()?;
        let script = format!(
            "arguments[0].value = {};\narguments[0].dispatchEvent(new Event(\"input\", {{bubbles: true}}));",
            js_string(value)
        );
        self.node.execute_script(&script).map(|_| ())
    }

    /// Type `value` one key at a time, confirming each key landed
    pub fn set_value_with_wait(&self, value: &str) -> EchoResult<()> {
        type_with_wait(&self.node, self.timing, value)
    }
}

impl InputControl for TextInput {
    fn node(&self) -> &Node {
        &self.node
    }

    fn kind(&self) -> InputKind {
        self.kind
    }

    /// In slow mode, values of two or more alphanumeric characters go
    /// through [`TextInput::set_value_with_wait`].
    fn set_value(&self, value: &str) -> EchoResult<()> {
        if types_slowly(&self.node, value) {
            return self.set_value_with_wait(value);
        }
        replace_value(&self.node, value)
    }
}

// =============================================================================
// CHECKBOX
// =============================================================================

/// Checkbox input
#[derive(Debug, Clone)]
pub struct Checkbox {
    node: Node,
}

impl Checkbox {
    /// Top-level checkbox
    #[must_use]
    pub fn new(browser: &Browser, locator: Locator) -> Self {
        Self::from_node(browser.node(locator))
    }

    /// Wrap `node`
    #[must_use]
    pub const fn from_node(node: Node) -> Self {
        Self { node }
    }

    /// Whether the box is ticked
    pub fn is_checked(&self) -> EchoResult<bool> {
        self.node.gated()?;
        self.node.is_selected()
    }

    /// Tick the box unless it already is
    pub fn check(&self) -> EchoResult<()> {
        if !self.is_checked()? {
            self.node.click()?;
        }
        Ok(())
    }

    /// Untick the box if it is ticked
    pub fn uncheck(&self) -> EchoResult<()> {
        if self.is_checked()? {
            self.node.click()?;
        }
        Ok(())
    }
}

impl InputControl for Checkbox {
    fn node(&self) -> &Node {
        &self.node
    }

    fn kind(&self) -> InputKind {
        InputKind::Checkbox
    }

    /// `"true"` or `"false"`
    fn value(&self) -> EchoResult<Option<String>> {
        Ok(Some(self.is_checked()?.to_string()))
    }

    fn set_value(&self, value: &str) -> EchoResult<()> {
        match value.trim() {
            "true" => self.check(),
            "false" => self.uncheck(),
            other => Err(EchoError::configuration(format!(
                "checkbox value must be 'true' or 'false', got '{other}'"
            ))),
        }
    }

    fn clear(&self) -> EchoResult<()> {
        self.uncheck()
    }
}

// =============================================================================
// RADIO
// =============================================================================

/// Radio input; operations act on every radio sharing its `name`
#[derive(Debug, Clone)]
pub struct Radio {
    node: Node,
}

impl Radio {
    /// Top-level radio
    #[must_use]
    pub fn new(browser: &Browser, locator: Locator) -> Self {
        Self::from_node(browser.node(locator))
    }

    /// Wrap `node`
    #[must_use]
    pub const fn from_node(node: Node) -> Self {
        Self { node }
    }

    fn browser(&self) -> &Browser {
        self.node.browser()
    }

    /// The group's `name`
    pub fn group_name(&self) -> EchoResult<String> {
        self.node
            .attribute("name")?
            .ok_or_else(|| EchoError::configuration(format!("radio input {} has no name", self.node)))
    }

    /// Every radio in the document sharing this radio's `name`; names are
    /// compared here rather than spliced into a selector
    fn group(&self) -> EchoResult<Vec<Node>> {
        let name = self.group_name()?;
        let mut group = Vec::new();
        for radio in self.browser().find_elements(&Locator::css("input[type=radio]"))? {
            if raw_attribute(&radio, "name")?.as_deref() == Some(name.as_str()) {
                group.push(radio);
            }
        }
        Ok(group)
    }

    fn checked(&self) -> EchoResult<Option<Node>> {
        for radio in self.group()? {
            if radio.is_selected()? {
                return Ok(Some(radio));
            }
        }
        Ok(None)
    }

    fn labels_for(&self, input: &Node) -> EchoResult<Vec<Node>> {
        let Some(id) = raw_attribute(input, "id")? else {
            return Ok(Vec::new());
        };
        let mut labels = Vec::new();
        for label in self.browser().find_elements(&Locator::tag_name("label"))? {
            if raw_attribute(&label, "for")?.as_deref() == Some(id.as_str()) {
                labels.push(label);
            }
        }
        Ok(labels)
    }

    /// `value` of every radio in the group
    pub fn values(&self) -> EchoResult<Vec<String>> {
        self.group()?
            .iter()
            .map(|radio| Ok(raw_attribute(radio, "value")?.unwrap_or_default()))
            .collect()
    }

    /// Trimmed text of every radio in the group
    pub fn options(&self) -> EchoResult<Vec<String>> {
        self.group()?
            .iter()
            .map(|radio| Ok(raw_text(radio)?.trim().to_string()))
            .collect()
    }

    /// Trimmed text of the first visible label of each radio that has one
    pub fn labels(&self) -> EchoResult<Vec<String>> {
        let mut labels = Vec::new();
        for radio in self.group()? {
            if let Some(label) = self.labels_for(&radio)?.into_iter().next() {
                if label.is_displayed() {
                    labels.push(raw_text(&label)?.trim().to_string());
                }
            }
        }
        Ok(labels)
    }

    /// Label text of the checked radio, `None` when nothing is checked
    pub fn checked_label(&self) -> EchoResult<Option<String>> {
        self.node.gated()?;
        let Some(checked) = self.checked()? else {
            return Ok(None);
        };
        let label = self.labels_for(&checked)?.into_iter().next().ok_or_else(|| EchoError::NotFound {
            locator: format!("label for the checked radio of {}", self.node),
        })?;
        Ok(Some(raw_text(&label)?.trim().to_string()))
    }

    /// Check the radio whose own text or visible label reads `option`
    pub fn select_option(&self, option: &str) -> EchoResult<()> {
        self.node.gated()?;
        for radio in self.group()? {
            let own = raw_text(&radio)?;
            let matched = own.trim() == option
                || match self.labels_for(&radio)?.first() {
                    Some(label) => label.is_displayed() && raw_text(label)?.trim() == option,
                    None => false,
                };
            if matched {
                return radio.click();
            }
        }
        Err(EchoError::NotFound {
            locator: format!("radio option with the text '{option}'"),
        })
    }
}

impl InputControl for Radio {
    fn node(&self) -> &Node {
        &self.node
    }

    fn kind(&self) -> InputKind {
        InputKind::Radio
    }

    /// `value` of the checked radio in the group
    fn value(&self) -> EchoResult<Option<String>> {
        self.node.gated()?;
        match self.checked()? {
            Some(radio) => radio.attribute("value"),
            None => Ok(None),
        }
    }

    /// Check the radio with this `value`, clicking its label when it has one
    fn set_value(&self, value: &str) -> EchoResult<()> {
        self.node.gated()?;
        let mut radio = None;
        for candidate in self.group()? {
            if raw_attribute(&candidate, "value")?.as_deref() == Some(value) {
                radio = Some(candidate);
                break;
            }
        }
        let radio = radio.ok_or_else(|| EchoError::NotFound {
            locator: format!("radio of {} with the value '{value}'", self.node),
        })?;
        let labels = self.labels_for(&radio)?;
        if labels.len() > 1 {
            tracing::warn!(node = %self.node, value, "more than one label is associated with the radio input");
        }
        match labels.first() {
            Some(label) => label.click(),
            None => radio.click(),
        }
    }

    fn clear(&self) -> EchoResult<()> {
        Err(EchoError::NotInteractable {
            message: format!("radio group of {} cannot be cleared", self.node),
        })
    }
}

// =============================================================================
// FILE
// =============================================================================

/// File input
#[derive(Debug, Clone)]
pub struct FileInput {
    node: Node,
}

impl FileInput {
    /// Top-level file input
    #[must_use]
    pub fn new(browser: &Browser, locator: Locator) -> Self {
        Self::from_node(browser.node(locator))
    }

    /// Wrap `node`
    #[must_use]
    pub const fn from_node(node: Node) -> Self {
        Self { node }
    }

    /// Put the path of an existing file into the input
    pub fn select_file(&self, path: impl AsRef<Path>) -> EchoResult<()> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(EchoError::configuration(format!(
                "no file to upload at {}",
                path.display()
            )));
        }
        let text = path
            .to_str()
            .ok_or_else(|| EchoError::configuration(format!("path is not UTF-8: {}", path.display())))?;
        self.node.send_keys(text)
    }
}

impl InputControl for FileInput {
    fn node(&self) -> &Node {
        &self.node
    }

    fn kind(&self) -> InputKind {
        InputKind::File
    }

    fn set_value(&self, value: &str) -> EchoResult<()> {
        self.select_file(value)
    }
}

// =============================================================================
// DATE / HIDDEN / RANGE / SUBMIT
// =============================================================================

/// Input with no behaviour beyond its value
#[derive(Debug, Clone)]
pub struct PlainInput {
    node: Node,
    kind: InputKind,
}

impl PlainInput {
    /// Wrap `node`. Hidden inputs never display, so their gate is turned off.
    #[must_use]
    pub fn from_node(node: Node, kind: InputKind) -> Self {
        if kind == InputKind::Hidden {
            node.set_display_gate(false);
        }
        Self { node, kind }
    }
}

impl InputControl for PlainInput {
    fn node(&self) -> &Node {
        &self.node
    }

    fn kind(&self) -> InputKind {
        self.kind
    }

    fn set_value(&self, value: &str) -> EchoResult<()> {
        replace_value(&self.node, value)
    }
}

// =============================================================================
// INPUT
// =============================================================================

/// Any supported input, chosen by [`InputKind`]
#[derive(Debug, Clone)]
pub enum Input {
    /// `type=text`
    Text(TextInput),
    /// `type=password`
    Password(TextInput),
    /// `type=checkbox`
    Checkbox(Checkbox),
    /// `type=radio`
    Radio(Radio),
    /// `type=date`
    Date(PlainInput),
    /// `type=file`
    File(FileInput),
    /// `type=hidden`
    Hidden(PlainInput),
    /// `type=range`
    Range(PlainInput),
    /// `type=submit`
    Submit(PlainInput),
}

impl Input {
    /// Top-level input of the given kind
    #[must_use]
    pub fn new(browser: &Browser, locator: Locator, kind: InputKind) -> Self {
        Self::from_node(browser.node(locator), kind)
    }

    /// Input nested in `parent`
    #[must_use]
    pub fn within(parent: &Node, locator: Locator, kind: InputKind) -> Self {
        Self::from_node(parent.child(locator), kind)
    }

    /// Wrap `node` as the control for `kind`
    #[must_use]
    pub fn from_node(node: Node, kind: InputKind) -> Self {
        match kind {
            InputKind::Text => Self::Text(TextInput::from_node(node, kind)),
            InputKind::Password => Self::Password(TextInput::from_node(node, kind)),
            InputKind::Checkbox => Self::Checkbox(Checkbox::from_node(node)),
            InputKind::Radio => Self::Radio(Radio::from_node(node)),
            InputKind::Date => Self::Date(PlainInput::from_node(node, kind)),
            InputKind::File => Self::File(FileInput::from_node(node)),
            InputKind::Hidden => Self::Hidden(PlainInput::from_node(node, kind)),
            InputKind::Range => Self::Range(PlainInput::from_node(node, kind)),
            InputKind::Submit => Self::Submit(PlainInput::from_node(node, kind)),
        }
    }

    /// Read the `type` attribute and wrap accordingly; a missing type is text
    pub fn detect(browser: &Browser, locator: Locator) -> EchoResult<Self> {
        let node = browser.node(locator);
        let kind = {
            let _ungated = node.ignore_display();
            node.attribute("type")?
        };
        let kind = kind.as_deref().map_or(Ok(InputKind::Text), str::parse)?;
        Ok(Self::from_node(node, kind))
    }

    fn control(&self) -> &dyn InputControl {
        match self {
            Self::Text(c) | Self::Password(c) => c,
            Self::Checkbox(c) => c,
            Self::Radio(c) => c,
            Self::File(c) => c,
            Self::Date(c) | Self::Hidden(c) | Self::Range(c) | Self::Submit(c) => c,
        }
    }

    /// Text control, for text and password inputs
    #[must_use]
    pub const fn as_text(&self) -> Option<&TextInput> {
        match self {
            Self::Text(c) | Self::Password(c) => Some(c),
            _ => None,
        }
    }

    /// Checkbox control
    #[must_use]
    pub const fn as_checkbox(&self) -> Option<&Checkbox> {
        match self {
            Self::Checkbox(c) => Some(c),
            _ => None,
        }
    }

    /// Radio control
    #[must_use]
    pub const fn as_radio(&self) -> Option<&Radio> {
        match self {
            Self::Radio(c) => Some(c),
            _ => None,
        }
    }

    /// File control
    #[must_use]
    pub const fn as_file(&self) -> Option<&FileInput> {
        match self {
            Self::File(c) => Some(c),
            _ => None,
        }
    }
}

impl InputControl for Input {
    fn node(&self) -> &Node {
        self.control().node()
    }

    fn kind(&self) -> InputKind {
        self.control().kind()
    }

    fn value(&self) -> EchoResult<Option<String>> {
        self.control().value()
    }

    fn set_value(&self, value: &str) -> EchoResult<()> {
        self.control().set_value(value)
    }

    fn clear(&self) -> EchoResult<()> {
        self.control().clear()
    }
}
