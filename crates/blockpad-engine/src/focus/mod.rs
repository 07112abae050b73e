//! # Focus manager
//!
//! Every focus side effect of the editor goes through one [`FocusManager`]:
//! resolving a block id to its rendered element, deciding which element of
//! the block receives focus, placing the caret, and postponing all of that
//! until the view layer has rendered blocks that do not exist yet.
//!
//! Lifecycle entry points (`on_block_created`, `on_block_split`, ...) only
//! supply per-event defaults before delegating to
//! [`FocusManager::focus_block_for_event`].
//!
//! Failures follow one rule: a block that is not rendered, or an element
//! that refuses focus, yields `false` and a warning. Nothing here panics or
//! returns an error to the caller.
//!
//! The manager is an ordinary value owned by the editor; tests create as
//! many as they like.

mod deferred;

pub use deferred::{DeferredHandle, FRAMES_BEFORE_FOCUS};

use std::collections::HashSet;
use std::fmt;

use crate::caret::place_caret_at_offset;
use crate::config::{ClassificationConfig, EditorConfig};
use crate::model::{BlockId, BlockType};
use crate::surface::{CaretPosition, DomElement, EditorDom, InputKind, SurfaceError};
use crate::text::char_len;
use deferred::DeferredQueue;

/// Block kind as far as focus handling is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Text,
    Heading,
    ShortAnswer,
    MultipleChoice,
    Multiselect,
    Unknown,
}

impl BlockKind {
    /// Blocks that pair a label with native inputs
    pub fn is_form(self) -> bool {
        matches!(
            self,
            BlockKind::ShortAnswer | BlockKind::MultipleChoice | BlockKind::Multiselect
        )
    }
}

impl From<BlockType> for BlockKind {
    fn from(block_type: BlockType) -> Self {
        match block_type {
            BlockType::Text => BlockKind::Text,
            BlockType::Heading => BlockKind::Heading,
            BlockType::ShortAnswer => BlockKind::ShortAnswer,
            BlockType::MultipleChoice => BlockKind::MultipleChoice,
            BlockType::Multiselect => BlockKind::Multiselect,
        }
    }
}

/// Why a block is being focused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusEvent {
    Direct,
    Created,
    Split,
    Merged,
    Removed,
    SlashCommand,
    Navigation,
    Restore,
}

impl fmt::Display for FocusEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FocusEvent::Direct => "direct",
            FocusEvent::Created => "created",
            FocusEvent::Split => "split",
            FocusEvent::Merged => "merged",
            FocusEvent::Removed => "removed",
            FocusEvent::SlashCommand => "slash-command",
            FocusEvent::Navigation => "navigation",
            FocusEvent::Restore => "restore",
        };
        write!(f, "{name}")
    }
}

/// Where the caret goes once the element has focus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Start,
    End,
    Offset(usize),
}

/// Options of one focus request.
///
/// Cursor options resolve with a fixed precedence: `cursor_offset` beats
/// `cursor_at_end`, which beats `cursor_at_start`. See [`Self::placement`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FocusOptions {
    pub cursor_at_start: Option<bool>,
    pub cursor_at_end: Option<bool>,
    pub cursor_offset: Option<usize>,
    /// `Some(false)` places the caret without calling `focus()`
    pub auto_focus: Option<bool>,
    /// Leave an existing caret inside the target alone
    pub preserve_cursor: bool,
    pub deferred: Option<bool>,
    /// Authoritative block kind; skips classifying the rendered element
    pub kind_hint: Option<BlockKind>,
}

impl FocusOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at_start() -> Self {
        Self {
            cursor_at_start: Some(true),
            ..Self::default()
        }
    }

    pub fn at_end() -> Self {
        Self {
            cursor_at_end: Some(true),
            ..Self::default()
        }
    }

    pub fn at_offset(offset: usize) -> Self {
        Self {
            cursor_offset: Some(offset),
            ..Self::default()
        }
    }

    pub fn deferred(mut self, deferred: bool) -> Self {
        self.deferred = Some(deferred);
        self
    }

    pub fn auto_focus(mut self, auto_focus: bool) -> Self {
        self.auto_focus = Some(auto_focus);
        self
    }

    pub fn preserve_cursor(mut self) -> Self {
        self.preserve_cursor = true;
        self
    }

    pub fn with_kind(mut self, kind: BlockKind) -> Self {
        self.kind_hint = Some(kind);
        self
    }

    /// Caret placement after precedence: offset, then end, then start
    pub fn placement(&self) -> Option<Placement> {
        if let Some(offset) = self.cursor_offset {
            return Some(Placement::Offset(offset));
        }
        if self.cursor_at_end == Some(true) {
            return Some(Placement::End);
        }
        if self.cursor_at_start == Some(true) {
            return Some(Placement::Start);
        }
        None
    }

    fn is_deferred(&self) -> bool {
        self.deferred == Some(true)
    }

    fn states_start_or_end(&self) -> bool {
        self.cursor_at_start.is_some() || self.cursor_at_end.is_some()
    }
}

/// A block resolved for one focus request. Never kept across requests.
#[derive(Debug, Clone)]
pub struct BlockFocusInfo<E> {
    pub block_id: BlockId,
    pub kind: BlockKind,
    pub element: E,
    /// Focusable descendants in document order
    pub focusable: Vec<E>,
    pub is_form: bool,
}

/// Infer a block's kind from its rendered shape.
///
/// Native inputs decide first (radio, then checkbox, then text). Otherwise
/// the editable region is a heading when its tag is `H1`..`H6`, it has one
/// of the configured heading classes, or its computed font size matches.
pub fn classify<E: DomElement>(element: &E, config: &ClassificationConfig) -> BlockKind {
    let inputs: Vec<InputKind> = element
        .focusable_descendants()
        .iter()
        .filter_map(|field| field.input_kind())
        .collect();
    for (input, kind) in [
        (InputKind::Radio, BlockKind::MultipleChoice),
        (InputKind::Checkbox, BlockKind::Multiselect),
        (InputKind::Text, BlockKind::ShortAnswer),
    ] {
        if inputs.contains(&input) {
            return kind;
        }
    }

    let Some(region) = element.editable_region() else {
        return BlockKind::Unknown;
    };
    let tag = region.tag_name();
    let heading_tag = tag.len() == 2
        && tag.starts_with('H')
        && tag[1..].parse::<u8>().is_ok_and(|level| (1..=6).contains(&level));
    let heading_class = config
        .heading_classes
        .iter()
        .any(|class| region.has_class(class));
    let heading_size = region.computed_font_size() == config.heading_font_size;
    if heading_tag || heading_class || heading_size {
        BlockKind::Heading
    } else {
        BlockKind::Text
    }
}

/// Focus and caret coordinator for one editor surface
pub struct FocusManager<D: EditorDom> {
    dom: D,
    classification: ClassificationConfig,
    pending_start: HashSet<BlockId>,
    last_focused: Option<BlockId>,
    deferred: DeferredQueue,
}

impl<D: EditorDom> fmt::Debug for FocusManager<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FocusManager")
            .field("pending_start", &self.pending_start)
            .field("last_focused", &self.last_focused)
            .field("deferred", &self.deferred.len())
            .finish()
    }
}

impl<D: EditorDom> FocusManager<D> {
    pub fn new(dom: D, config: &EditorConfig) -> Self {
        Self {
            dom,
            classification: config.classification.clone(),
            pending_start: HashSet::new(),
            last_focused: None,
            deferred: DeferredQueue::default(),
        }
    }

    pub fn dom(&self) -> &D {
        &self.dom
    }

    pub fn last_focused(&self) -> Option<BlockId> {
        self.last_focused
    }

    pub fn is_pending_start(&self, id: BlockId) -> bool {
        self.pending_start.contains(&id)
    }

    /// Deferred requests still waiting for their frames
    pub fn pending_deferred(&self) -> usize {
        self.deferred.len()
    }

    /// Resolve a block for focusing. `None` when it is not rendered.
    pub fn resolve_info(
        &self,
        id: BlockId,
        kind_hint: Option<BlockKind>,
    ) -> Option<BlockFocusInfo<D::Element>> {
        let element = self.dom.query_block(id)?;
        let kind = kind_hint.unwrap_or_else(|| classify(&element, &self.classification));
        let focusable = element.focusable_descendants();
        Some(BlockFocusInfo {
            block_id: id,
            kind,
            is_form: kind.is_form(),
            focusable,
            element,
        })
    }

    /// Focus a block now. Returns whether focus landed.
    pub fn focus_block(&mut self, id: BlockId, options: FocusOptions) -> bool {
        self.focus_now(id, FocusEvent::Direct, options)
    }

    /// Focus a block for a lifecycle event.
    ///
    /// With `deferred` set the request waits for the view layer and this
    /// returns `true` straight away; a later failure is only logged.
    pub fn focus_block_for_event(
        &mut self,
        id: BlockId,
        event: FocusEvent,
        options: FocusOptions,
    ) -> bool {
        if options.is_deferred() {
            self.schedule_deferred(id, event, options);
            return true;
        }
        self.focus_now(id, event, options)
    }

    /// Queue a request to run after [`FRAMES_BEFORE_FOCUS`] frames
    pub fn schedule_deferred(
        &mut self,
        id: BlockId,
        event: FocusEvent,
        options: FocusOptions,
    ) -> DeferredHandle {
        log::debug!("Deferring {event} focus of block {id}");
        self.deferred.push(id, event, options)
    }

    /// Animation-frame tick. Runs the requests whose frames have elapsed.
    pub fn advance_frame(&mut self) -> usize {
        let due = self.deferred.tick();
        self.run_deferred(due)
    }

    /// The view layer committed a render; every waiting request can run.
    pub fn render_committed(&mut self) -> usize {
        let due = self.deferred.drain();
        self.run_deferred(due)
    }

    fn run_deferred(&mut self, due: Vec<deferred::DeferredFocus>) -> usize {
        let count = due.len();
        for request in due {
            self.focus_now(request.block_id, request.event, request.options);
        }
        count
    }

    /// A new block appeared. Caret at its start unless told otherwise.
    pub fn on_block_created(&mut self, id: BlockId, options: FocusOptions) -> bool {
        let mut options = options;
        if !options.states_start_or_end() {
            options.cursor_at_start = Some(true);
        }
        options.auto_focus.get_or_insert(true);
        options.deferred.get_or_insert(true);
        if options.cursor_at_start == Some(true) && options.cursor_at_end != Some(true) {
            self.pending_start.insert(id);
        }
        self.focus_block_for_event(id, FocusEvent::Created, options)
    }

    /// The block holding the text after a split
    pub fn on_block_split(&mut self, id: BlockId) -> bool {
        self.focus_block_for_event(id, FocusEvent::Split, FocusOptions::at_start().deferred(true))
    }

    /// `id` absorbed its successor; put the caret at the junction
    pub fn on_block_merged(&mut self, id: BlockId, junction_offset: usize, deferred: bool) -> bool {
        self.focus_block_for_event(
            id,
            FocusEvent::Merged,
            FocusOptions::at_offset(junction_offset).deferred(deferred),
        )
    }

    /// A block produced by a slash command. Form blocks keep the native
    /// focus position of their first field.
    pub fn on_slash_command_block(&mut self, id: BlockId, kind: BlockKind) -> bool {
        let options = if kind.is_form() {
            FocusOptions::new()
        } else {
            FocusOptions::at_start()
        };
        self.focus_block_for_event(
            id,
            FocusEvent::SlashCommand,
            options.with_kind(kind).deferred(true),
        )
    }

    /// Arrow navigation into a block. The caller places the caret.
    pub fn on_navigation(&mut self, id: BlockId, options: FocusOptions) -> bool {
        self.focus_block_for_event(id, FocusEvent::Navigation, options.auto_focus(true))
    }

    /// Focus the last focused block again, caret at its end (after a reorder
    /// or a remount)
    pub fn restore_last_focused(&mut self) -> bool {
        let Some(id) = self.last_focused else {
            return false;
        };
        self.focus_block_for_event(id, FocusEvent::Restore, FocusOptions::at_end().deferred(true))
    }

    /// A block unmounted: drop its pending flag and queued requests
    pub fn forget_block(&mut self, id: BlockId) {
        self.pending_start.remove(&id);
        self.deferred.cancel_block(id);
        if self.last_focused == Some(id) {
            self.last_focused = None;
        }
    }

    fn merge_pending(&self, id: BlockId, mut options: FocusOptions) -> FocusOptions {
        if self.pending_start.contains(&id) && !options.states_start_or_end() {
            options.cursor_at_start = Some(true);
        }
        options
    }

    fn focus_now(&mut self, id: BlockId, event: FocusEvent, options: FocusOptions) -> bool {
        let options = self.merge_pending(id, options);
        let Some(info) = self.resolve_info(id, options.kind_hint) else {
            log::warn!("Block {id} is not rendered; {event} focus skipped");
            return false;
        };
        match perform_focus(&info, &options) {
            Ok(()) => {
                log::debug!("Focused block {id} ({event}, {:?})", info.kind);
                self.last_focused = Some(id);
                self.pending_start.remove(&id);
                true
            }
            Err(error) => {
                log::warn!("Focusing block {id} ({event}) failed: {error}");
                false
            }
        }
    }
}

/// Focus the right element of a resolved block and place the caret
fn perform_focus<E: DomElement>(
    info: &BlockFocusInfo<E>,
    options: &FocusOptions,
) -> Result<(), SurfaceError> {
    let target = if info.is_form {
        info.focusable
            .first()
            .cloned()
            .ok_or(SurfaceError::NotFocusable)?
    } else {
        info.element
            .editable_region()
            .ok_or(SurfaceError::NotEditable)?
    };

    let keep_caret = options.preserve_cursor && target.caret_offset().is_some();
    if options.auto_focus != Some(false) {
        target.focus()?;
    }
    if keep_caret {
        return Ok(());
    }
    let Some(placement) = options.placement() else {
        return Ok(());
    };

    match target.input_kind() {
        Some(kind) if kind.holds_text() => {
            let len = target.value_len();
            let at = match placement {
                Placement::Start => 0,
                Placement::End => len,
                Placement::Offset(offset) => offset.min(len),
            };
            target.set_selection_range(at, at)
        }
        // Radio buttons and checkboxes have no caret
        Some(_) => Ok(()),
        None => match placement {
            Placement::Start => target.set_caret(CaretPosition::Start),
            Placement::End => target.set_caret(CaretPosition::End),
            Placement::Offset(offset) => {
                let len = char_len(&target.text_content());
                place_caret_at_offset(&target, offset.min(len))
            }
        },
    }
}
