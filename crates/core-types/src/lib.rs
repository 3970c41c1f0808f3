#![allow(dead_code)]

use std::fmt;

use thiserror::Error;
use url::Url;
use uuid::Uuid;

/// Shared error type carried across the promptdock crates.
#[derive(Debug, Error, Clone)]
pub enum DockError {
    #[error("{message}")]
    Message { message: String },
}

impl DockError {
    pub fn new(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }
}

/// Opaque handle to a live element inside the host page.
///
/// Lookup-only: holding a `NodeId` never keeps the element alive. Every port
/// call on a detached node reports the detachment instead of failing loudly.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node:{}", self.0)
    }
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct InsertionId(pub String);

impl InsertionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for InsertionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Identifier of a stored prompt, used only when reporting usage back to the
/// statistics collaborator.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct PromptId(pub String);

/// Closed classification of input surfaces, decided once at location time and
/// carried with the node handle.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ElementKind {
    /// `<textarea>`
    PlainTextArea,
    /// `contenteditable` container
    EditableContainer,
    /// `<input type="text">`
    SingleLineInput,
}

impl ElementKind {
    pub fn name(&self) -> &'static str {
        match self {
            ElementKind::PlainTextArea => "textarea",
            ElementKind::EditableContainer => "contenteditable",
            ElementKind::SingleLineInput => "text-input",
        }
    }

    /// Whether the element's text lives in a writable `value` property rather
    /// than in its text content.
    pub fn carries_value(&self) -> bool {
        matches!(
            self,
            ElementKind::PlainTextArea | ElementKind::SingleLineInput
        )
    }

    /// All kinds in generic-scan order.
    pub fn scan_order() -> [ElementKind; 3] {
        [
            ElementKind::PlainTextArea,
            ElementKind::EditableContainer,
            ElementKind::SingleLineInput,
        ]
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Rendered bounding box in page coordinates.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 800.0,
        }
    }
}

/// The closed vocabulary of events the engine synthesizes toward the host
/// page. Dispatch order within one insertion is part of the interop contract.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum SyntheticEventKind {
    Focus,
    Blur,
    CompositionStart,
    CompositionEnd,
    Input,
    Change,
    KeyDown,
    KeyUp,
}

impl SyntheticEventKind {
    /// DOM event type name as the host page observes it.
    pub fn name(&self) -> &'static str {
        match self {
            SyntheticEventKind::Focus => "focus",
            SyntheticEventKind::Blur => "blur",
            SyntheticEventKind::CompositionStart => "compositionstart",
            SyntheticEventKind::CompositionEnd => "compositionend",
            SyntheticEventKind::Input => "input",
            SyntheticEventKind::Change => "change",
            SyntheticEventKind::KeyDown => "keydown",
            SyntheticEventKind::KeyUp => "keyup",
        }
    }
}

impl fmt::Display for SyntheticEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A synthesized event ready for dispatch. Bubbling is always requested; the
/// host frameworks the engine targets listen at delegated roots.
#[derive(Clone, Debug, PartialEq)]
pub struct SyntheticEvent {
    pub kind: SyntheticEventKind,
    /// `InputEvent.data` payload for input events carrying inserted text.
    pub data: Option<String>,
    pub bubbles: bool,
}

impl SyntheticEvent {
    pub fn plain(kind: SyntheticEventKind) -> Self {
        Self {
            kind,
            data: None,
            bubbles: true,
        }
    }

    pub fn input_with(data: impl Into<String>) -> Self {
        Self {
            kind: SyntheticEventKind::Input,
            data: Some(data.into()),
            bubbles: true,
        }
    }
}

/// A pressed key plus modifiers, as delivered by the page event stream.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct KeyChord {
    pub key: String,
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl KeyChord {
    pub fn plain(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            shift: false,
            ctrl: false,
            alt: false,
            meta: false,
        }
    }

    pub fn shifted(key: impl Into<String>) -> Self {
        Self {
            shift: true,
            ..Self::plain(key)
        }
    }

    pub fn is_escape(&self) -> bool {
        self.key == "Escape" && !self.shift && !self.ctrl && !self.alt && !self.meta
    }

    pub fn is_tab(&self) -> bool {
        self.key == "Tab" && !self.shift && !self.ctrl && !self.alt && !self.meta
    }

    pub fn is_shift_tab(&self) -> bool {
        self.key == "Tab" && self.shift && !self.ctrl && !self.alt && !self.meta
    }
}

/// Where the page currently is. Hostname is kept pre-split because identity
/// matching never needs more than hostname + full URL.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PageLocation {
    pub hostname: String,
    pub href: String,
}

impl PageLocation {
    pub fn new(hostname: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            href: href.into(),
        }
    }

    pub fn parse(href: &str) -> Result<Self, DockError> {
        let url = Url::parse(href).map_err(|err| DockError::new(err.to_string()))?;
        let hostname = url
            .host_str()
            .ok_or_else(|| DockError::new(format!("url without host: {href}")))?
            .to_string();
        Ok(Self {
            hostname,
            href: href.to_string(),
        })
    }
}

impl fmt::Display for PageLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.href)
    }
}
