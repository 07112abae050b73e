//! The DOM boundary.
//!
//! The engine never touches a browser API directly. Everything it needs
//! from a rendered element is expressed by [`DomElement`], and the only
//! way it finds an element is [`EditorDom::query_block`], which resolves
//! the `data-block-id` attribute. Lookups happen on every request because
//! a re-render may have replaced the node since the last one.
//!
//! All offsets are character offsets into the element's text content.

pub mod headless;

use thiserror::Error;

use crate::model::BlockId;

/// Axis-aligned rectangle in page pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(top: f64, left: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }
}

/// Native control kinds found inside form blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Text,
    Radio,
    Checkbox,
    TextArea,
    Other,
}

impl InputKind {
    /// Controls that hold a text value and a native selection range
    pub fn holds_text(self) -> bool {
        matches!(self, InputKind::Text | InputKind::TextArea)
    }

    pub fn from_type_attribute(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "" | "text" => InputKind::Text,
            "radio" => InputKind::Radio,
            "checkbox" => InputKind::Checkbox,
            _ => InputKind::Other,
        }
    }
}

/// Where a collapsed caret should be installed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaretPosition {
    Start,
    End,
    /// `offset` characters into the `index`-th text node, in document order
    InTextNode { index: usize, offset: usize },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SurfaceError {
    #[error("element is no longer attached to the document")]
    Detached,
    #[error("element cannot receive focus")]
    NotFocusable,
    #[error("element refused focus")]
    FocusRejected,
    #[error("text node {index} does not exist")]
    MissingTextNode { index: usize },
    #[error("element has no editable text region")]
    NotEditable,
    #[error("browser error: {0}")]
    Browser(String),
}

/// One rendered element, cheap to clone (a handle, not the node itself)
pub trait DomElement: Clone {
    fn tag_name(&self) -> String;

    fn has_class(&self, class: &str) -> bool;

    fn is_content_editable(&self) -> bool;

    /// `Some` for `<input>` and `<textarea>`
    fn input_kind(&self) -> Option<InputKind>;

    fn is_connected(&self) -> bool;

    /// Descendant carrying `data-field="{name}"`
    fn named_field(&self, name: &str) -> Option<Self>;

    /// The element itself when editable, else its first editable descendant
    fn editable_region(&self) -> Option<Self>;

    /// Editable regions and native inputs below this element, in document order
    fn focusable_descendants(&self) -> Vec<Self>;

    fn text_content(&self) -> String;

    /// Length of every text node below this element, in document order
    fn text_node_lengths(&self) -> Vec<usize>;

    /// Caret offset from the start of this element, `None` when the
    /// selection is elsewhere
    fn caret_offset(&self) -> Option<usize>;

    fn set_caret(&self, position: CaretPosition) -> Result<(), SurfaceError>;

    /// Length of a native input's value
    fn value_len(&self) -> usize;

    fn set_selection_range(&self, start: usize, end: usize) -> Result<(), SurfaceError>;

    fn focus(&self) -> Result<(), SurfaceError>;

    fn blur(&self);

    fn bounding_rect(&self) -> Rect;

    /// Rectangle of the collapsed caret, when it sits inside this element
    fn caret_rect(&self) -> Option<Rect>;

    /// Rectangle of the character at `index`
    fn char_rect(&self, index: usize) -> Option<Rect>;

    /// Raw computed `line-height` (`normal`, `24px`, `1.5em`, `1.4`, ...)
    fn computed_line_height(&self) -> String;

    /// Raw computed `font-size`
    fn computed_font_size(&self) -> String;

    /// Splice the command indicator in at the caret (which sits at offset 0),
    /// keep the existing text as a plain sibling after it, and leave the caret
    /// inside the indicator just after `symbol`.
    fn insert_command_indicator(&self, symbol: &str, placeholder: &str)
    -> Result<(), SurfaceError>;

    /// Text typed into the indicator, symbol included; `None` when absent
    fn command_indicator_text(&self) -> Option<String>;

    /// Drop all markup (indicator included) and leave `text` as the only content
    fn replace_with_plain_text(&self, text: &str) -> Result<(), SurfaceError>;

    /// Fire a synthetic `input` event so the view layer re-reads the content
    fn dispatch_input(&self);
}

/// The rendered document
pub trait EditorDom {
    type Element: DomElement;

    /// Element carrying `data-block-id="{id}"`, if one is rendered right now
    fn query_block(&self, id: BlockId) -> Option<Self::Element>;
}
