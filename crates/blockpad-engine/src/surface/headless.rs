//! # Headless surface
//!
//! An in-memory document that implements [`EditorDom`] and [`DomElement`]
//! without a browser. Layout is monospace: every character is
//! `char_width` pixels wide, every visual line `line_height` pixels tall,
//! and text soft-wraps after `wrap_columns` characters as well as at each
//! explicit `\n`.
//!
//! [`HeadlessDom::render`] plays the role of the view layer. It re-creates
//! the subtree of every block whose record changed (keyed by id) and
//! detaches subtrees of removed blocks, so handles taken before a render
//! can go stale exactly like real DOM nodes do.
//!
//! ```rust
//! use blockpad_engine::surface::headless::HeadlessDom;
//! use blockpad_engine::DomElement;
//!
//! let dom = HeadlessDom::new();
//! let field = dom.create_editable("hello");
//! field.place_caret(2);
//! assert_eq!(field.caret_offset(), Some(2));
//! ```

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;

use crate::model::{BlockId, BlockRecord, BlockType};
use crate::surface::{CaretPosition, DomElement, EditorDom, InputKind, Rect, SurfaceError};
use crate::text::{byte_index, char_len};

type NodeId = usize;

/// Pixel metrics of the monospace layout
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutMetrics {
    pub char_width: f64,
    pub line_height: f64,
    pub wrap_columns: usize,
}

impl Default for LayoutMetrics {
    fn default() -> Self {
        Self {
            char_width: 10.0,
            line_height: 20.0,
            wrap_columns: 40,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct NodeData {
    tag: String,
    classes: Vec<String>,
    attributes: BTreeMap<String, String>,
    content_editable: bool,
    input: Option<InputKind>,
    value: String,
    selection_range: (usize, usize),
    /// Text nodes of a leaf, in order
    text: Vec<String>,
    indicator: Option<String>,
    children: Vec<NodeId>,
    connected: bool,
    top: f64,
    left: f64,
    wrap_columns: usize,
    line_height_style: String,
    font_size_style: String,
    line_height_px: f64,
    padding_bottom: f64,
    reject_focus: bool,
}

impl NodeData {
    fn own_text(&self) -> String {
        let mut text = self.indicator.clone().unwrap_or_default();
        for node in &self.text {
            text.push_str(node);
        }
        text
    }

    fn own_text_lengths(&self) -> Vec<usize> {
        let mut lengths = Vec::new();
        if let Some(indicator) = &self.indicator {
            lengths.push(char_len(indicator));
        }
        lengths.extend(self.text.iter().map(|node| char_len(node)));
        lengths
    }

    fn indicator_len(&self) -> usize {
        self.indicator.as_deref().map(char_len).unwrap_or(0)
    }
}

#[derive(Debug)]
struct DomState {
    nodes: Vec<NodeData>,
    /// Rendered blocks in order: id, root node, record the subtree was built from
    blocks: Vec<(BlockId, NodeId, BlockRecord)>,
    focused: Option<NodeId>,
    /// Collapsed selection: leaf node and character offset inside it
    caret: Option<(NodeId, usize)>,
    input_log: Vec<NodeId>,
    metrics: LayoutMetrics,
}

impl DomState {
    fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id]
    }

    fn create(&mut self, tag: &str) -> NodeId {
        let metrics = self.metrics;
        self.nodes.push(NodeData {
            tag: tag.to_string(),
            connected: true,
            wrap_columns: metrics.wrap_columns,
            line_height_style: format!("{}px", metrics.line_height),
            font_size_style: "16px".to_string(),
            line_height_px: metrics.line_height,
            ..NodeData::default()
        });
        self.nodes.len() - 1
    }

    /// Depth-first descendants, excluding `id`
    fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        for child in &self.node(id).children {
            out.push(*child);
            out.extend(self.descendants(*child));
        }
        out
    }

    /// Text-bearing leaves under `id` (the node itself when it is one)
    fn text_leaves(&self, id: NodeId) -> Vec<NodeId> {
        let node = self.node(id);
        if node.children.is_empty() {
            return if node.input.is_none() { vec![id] } else { vec![] };
        }
        self.descendants(id)
            .into_iter()
            .filter(|candidate| {
                let data = self.node(*candidate);
                data.children.is_empty() && data.input.is_none()
            })
            .collect()
    }

    fn text_content(&self, id: NodeId) -> String {
        self.text_leaves(id)
            .into_iter()
            .map(|leaf| self.node(leaf).own_text())
            .collect()
    }

    fn contains(&self, ancestor: NodeId, id: NodeId) -> bool {
        ancestor == id || self.descendants(ancestor).contains(&id)
    }

    fn caret_offset_in(&self, id: NodeId) -> Option<usize> {
        let (caret_node, offset) = self.caret?;
        if !self.contains(id, caret_node) {
            return None;
        }
        let mut before = 0;
        for leaf in self.text_leaves(id) {
            if leaf == caret_node {
                return Some(before + offset);
            }
            before += char_len(&self.node(leaf).own_text());
        }
        None
    }

    fn disconnect(&mut self, id: NodeId) {
        for node in std::iter::once(id).chain(self.descendants(id)) {
            self.node_mut(node).connected = false;
            if self.focused == Some(node) {
                self.focused = None;
            }
            if matches!(self.caret, Some((caret_node, _)) if caret_node == node) {
                self.caret = None;
            }
        }
    }

    fn leaf_lines(&self, leaf: NodeId) -> Vec<(usize, usize)> {
        let node = self.node(leaf);
        visual_lines(&node.own_text(), node.wrap_columns)
    }

    fn leaf_rect(&self, leaf: NodeId) -> Rect {
        let node = self.node(leaf);
        let lines = if node.input.is_some() {
            1
        } else {
            self.leaf_lines(leaf).len()
        };
        Rect::new(
            node.top,
            node.left,
            node.wrap_columns as f64 * self.metrics.char_width,
            lines as f64 * node.line_height_px + node.padding_bottom,
        )
    }

    /// Rectangle of a caret or character at `offset` inside a leaf
    fn position_rect(&self, leaf: NodeId, offset: usize, width: f64) -> Rect {
        let node = self.node(leaf);
        let lines = self.leaf_lines(leaf);
        let (line, start) = line_of(&lines, offset);
        Rect::new(
            node.top + line as f64 * node.line_height_px,
            node.left + (offset - start) as f64 * self.metrics.char_width,
            width,
            node.line_height_px,
        )
    }

    /// Stack every connected leaf vertically in document order
    fn relayout(&mut self) {
        let mut y = 0.0;
        let roots: Vec<NodeId> = self.blocks.iter().map(|(_, root, _)| *root).collect();
        for root in roots {
            for node in self.descendants(root) {
                if !self.node(node).children.is_empty() {
                    continue;
                }
                self.node_mut(node).top = y;
                y += self.leaf_rect(node).height;
            }
        }
    }
}

/// Soft-wrapped visual lines as `(start, end)` character ranges, `\n` excluded
fn visual_lines(text: &str, wrap_columns: usize) -> Vec<(usize, usize)> {
    let wrap = wrap_columns.max(1);
    let mut lines = Vec::new();
    let mut start = 0;
    for hard_line in text.split('\n') {
        let len = char_len(hard_line);
        if len == 0 {
            lines.push((start, start));
        }
        let mut column = 0;
        while column < len {
            let end = (column + wrap).min(len);
            lines.push((start + column, start + end));
            column = end;
        }
        start += len + 1;
    }
    lines
}

/// Index and start offset of the visual line holding `offset`
fn line_of(lines: &[(usize, usize)], offset: usize) -> (usize, usize) {
    let mut found = (0, 0);
    for (index, (start, _)) in lines.iter().enumerate() {
        if *start <= offset {
            found = (index, *start);
        } else {
            break;
        }
    }
    found
}

/// The headless document
#[derive(Clone)]
pub struct HeadlessDom {
    state: Rc<RefCell<DomState>>,
}

impl Default for HeadlessDom {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HeadlessDom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("HeadlessDom")
            .field("nodes", &state.nodes.len())
            .field("blocks", &state.blocks.len())
            .field("focused", &state.focused)
            .field("caret", &state.caret)
            .finish()
    }
}

impl HeadlessDom {
    pub fn new() -> Self {
        Self::with_metrics(LayoutMetrics::default())
    }

    pub fn with_metrics(metrics: LayoutMetrics) -> Self {
        Self {
            state: Rc::new(RefCell::new(DomState {
                nodes: Vec::new(),
                blocks: Vec::new(),
                focused: None,
                caret: None,
                input_log: Vec::new(),
                metrics,
            })),
        }
    }

    fn handle(&self, id: NodeId) -> HeadlessElement {
        HeadlessElement {
            state: Rc::clone(&self.state),
            id,
        }
    }

    /// A detached-from-any-block, connected `contenteditable` div
    pub fn create_editable(&self, text: &str) -> HeadlessElement {
        let id = {
            let mut state = self.state.borrow_mut();
            let id = state.create("div");
            let node = state.node_mut(id);
            node.content_editable = true;
            if !text.is_empty() {
                node.text = vec![text.to_string()];
            }
            id
        };
        self.handle(id)
    }

    /// A standalone element with no content
    pub fn create_element(&self, tag: &str) -> HeadlessElement {
        let id = self.state.borrow_mut().create(tag);
        self.handle(id)
    }

    /// A standalone native input
    pub fn create_input(&self, kind: InputKind) -> HeadlessElement {
        let id = {
            let mut state = self.state.borrow_mut();
            let tag = if kind == InputKind::TextArea {
                "textarea"
            } else {
                "input"
            };
            let id = state.create(tag);
            state.node_mut(id).input = Some(kind);
            id
        };
        self.handle(id)
    }

    pub fn append_child(&self, parent: &HeadlessElement, child: &HeadlessElement) {
        self.state
            .borrow_mut()
            .node_mut(parent.id)
            .children
            .push(child.id);
    }

    /// Render `records` the way the view layer would
    pub fn render(&self, records: &[BlockRecord]) {
        let previous: HashMap<BlockId, (NodeId, BlockRecord)> = self
            .state
            .borrow()
            .blocks
            .iter()
            .map(|(id, root, record)| (*id, (*root, record.clone())))
            .collect();

        let mut blocks = Vec::with_capacity(records.len());
        let mut kept = Vec::new();
        for record in records {
            match previous.get(&record.id) {
                Some((root, rendered)) if rendered == record => {
                    kept.push(record.id);
                    blocks.push((record.id, *root, record.clone()));
                }
                _ => {
                    let root = self.build_block(record);
                    blocks.push((record.id, root, record.clone()));
                }
            }
        }

        let mut state = self.state.borrow_mut();
        for (id, (root, _)) in &previous {
            if !kept.contains(id) {
                state.disconnect(*root);
            }
        }
        state.blocks = blocks;
        state.relayout();
    }

    fn build_block(&self, record: &BlockRecord) -> NodeId {
        let root = self.create_element("div");
        root.set_attribute("data-block-id", &record.id.to_string());
        root.add_class("block");

        match record.block_type {
            BlockType::Text => {
                let field = self.create_editable(&record.content);
                field.add_class("block-text");
                self.append_child(&root, &field);
            }
            BlockType::Heading => {
                let field = self.create_element("h2");
                field.set_content_editable(true);
                field.set_text(&record.content);
                field.add_class("block-heading");
                field.set_font_size_style("24px");
                field.set_line_height_style("32px");
                self.append_child(&root, &field);
            }
            BlockType::ShortAnswer | BlockType::MultipleChoice | BlockType::Multiselect => {
                let label = self.create_editable(&record.content);
                label.add_class("large-label");
                label.set_attribute("data-field", "label");
                label.set_line_height_style("normal");
                label.set_line_height_px(30.0);
                label.set_font_size_style("20px");
                self.append_child(&root, &label);

                let description = self.create_editable(record.property("description").unwrap_or(""));
                description.add_class("block-description");
                description.set_attribute("data-field", "description");
                self.append_child(&root, &description);

                let kind = match record.block_type {
                    BlockType::ShortAnswer => InputKind::Text,
                    BlockType::MultipleChoice => InputKind::Radio,
                    _ => InputKind::Checkbox,
                };
                let options = if kind == InputKind::Text {
                    1
                } else {
                    record
                        .property("options")
                        .map(|options| options.lines().count())
                        .unwrap_or(2)
                        .max(1)
                };
                for _ in 0..options {
                    let input = self.create_input(kind);
                    self.append_child(&root, &input);
                }
            }
        }
        root.id
    }

    /// Root element of a rendered block
    pub fn block_element(&self, id: BlockId) -> Option<HeadlessElement> {
        self.query_block(id)
    }

    /// Editable region of a rendered block
    pub fn block_field(&self, id: BlockId) -> Option<HeadlessElement> {
        self.query_block(id)?.editable_region()
    }

    /// The element holding focus
    pub fn focused(&self) -> Option<HeadlessElement> {
        let id = self.state.borrow().focused?;
        Some(self.handle(id))
    }

    /// Id of the block containing the focused element
    pub fn focused_block(&self) -> Option<BlockId> {
        let state = self.state.borrow();
        let focused = state.focused?;
        state
            .blocks
            .iter()
            .find(|(_, root, _)| state.contains(*root, focused))
            .map(|(id, _, _)| *id)
    }

    /// Synthetic `input` events fired so far, per element
    pub fn input_events(&self, element: &HeadlessElement) -> usize {
        self.state
            .borrow()
            .input_log
            .iter()
            .filter(|id| **id == element.id)
            .count()
    }
}

impl EditorDom for HeadlessDom {
    type Element = HeadlessElement;

    fn query_block(&self, id: BlockId) -> Option<HeadlessElement> {
        let root = {
            let state = self.state.borrow();
            state
                .blocks
                .iter()
                .find(|(block_id, root, _)| *block_id == id && state.node(*root).connected)
                .map(|(_, root, _)| *root)?
        };
        Some(self.handle(root))
    }
}

/// Handle to one headless node
#[derive(Clone)]
pub struct HeadlessElement {
    state: Rc<RefCell<DomState>>,
    id: NodeId,
}

impl PartialEq for HeadlessElement {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.state, &other.state) && self.id == other.id
    }
}

impl fmt::Debug for HeadlessElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        let node = state.node(self.id);
        f.debug_struct("HeadlessElement")
            .field("id", &self.id)
            .field("tag", &node.tag)
            .field("text", &state.text_content(self.id))
            .finish()
    }
}

impl HeadlessElement {
    fn sibling(&self, id: NodeId) -> Self {
        Self {
            state: Rc::clone(&self.state),
            id,
        }
    }

    pub fn add_class(&self, class: &str) {
        self.state
            .borrow_mut()
            .node_mut(self.id)
            .classes
            .push(class.to_string());
    }

    pub fn set_attribute(&self, name: &str, value: &str) {
        self.state
            .borrow_mut()
            .node_mut(self.id)
            .attributes
            .insert(name.to_string(), value.to_string());
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.state
            .borrow()
            .node(self.id)
            .attributes
            .get(name)
            .cloned()
    }

    pub fn set_content_editable(&self, editable: bool) {
        self.state.borrow_mut().node_mut(self.id).content_editable = editable;
    }

    /// Replace the content with a single text node (none when `text` is empty)
    pub fn set_text(&self, text: &str) {
        let mut state = self.state.borrow_mut();
        let node = state.node_mut(self.id);
        node.indicator = None;
        node.text = if text.is_empty() {
            Vec::new()
        } else {
            vec![text.to_string()]
        };
        let len = char_len(text);
        if let Some((caret_node, offset)) = state.caret
            && caret_node == self.id
        {
            state.caret = Some((caret_node, offset.min(len)));
        }
    }

    /// Replace the content with several text nodes
    pub fn set_text_nodes(&self, nodes: &[&str]) {
        let mut state = self.state.borrow_mut();
        let node = state.node_mut(self.id);
        node.indicator = None;
        node.text = nodes.iter().map(|text| text.to_string()).collect();
    }

    pub fn set_value(&self, value: &str) {
        self.state.borrow_mut().node_mut(self.id).value = value.to_string();
    }

    pub fn selection_range(&self) -> (usize, usize) {
        self.state.borrow().node(self.id).selection_range
    }

    pub fn set_wrap_columns(&self, columns: usize) {
        self.state.borrow_mut().node_mut(self.id).wrap_columns = columns.max(1);
    }

    /// Set the computed `line-height` string; pixel values also drive layout
    pub fn set_line_height_style(&self, style: &str) {
        let mut state = self.state.borrow_mut();
        let node = state.node_mut(self.id);
        node.line_height_style = style.to_string();
        if let Some(px) = style.strip_suffix("px").and_then(|v| v.trim().parse().ok()) {
            node.line_height_px = px;
        }
    }

    /// Line height used by layout only, leaving the computed style untouched
    pub fn set_line_height_px(&self, px: f64) {
        self.state.borrow_mut().node_mut(self.id).line_height_px = px;
    }

    /// Extra space below the last row, as CSS `padding-bottom` would add
    pub fn set_padding_bottom(&self, px: f64) {
        self.state.borrow_mut().node_mut(self.id).padding_bottom = px;
    }

    pub fn set_font_size_style(&self, style: &str) {
        self.state.borrow_mut().node_mut(self.id).font_size_style = style.to_string();
    }

    /// Make subsequent `focus()` calls fail
    pub fn reject_focus(&self, reject: bool) {
        self.state.borrow_mut().node_mut(self.id).reject_focus = reject;
    }

    /// Collapse the selection at an absolute offset in this element
    pub fn place_caret(&self, offset: usize) {
        let mut state = self.state.borrow_mut();
        let mut remaining = offset;
        let leaves = state.text_leaves(self.id);
        for (position, leaf) in leaves.iter().enumerate() {
            let len = char_len(&state.node(*leaf).own_text());
            if remaining <= len || position + 1 == leaves.len() {
                state.caret = Some((*leaf, remaining.min(len)));
                return;
            }
            remaining -= len;
        }
    }

    pub fn is_focused(&self) -> bool {
        self.state.borrow().focused == Some(self.id)
    }

    /// Simulate typing at the caret
    pub fn type_text(&self, typed: &str) {
        let mut state = self.state.borrow_mut();
        let Some((leaf, offset)) = state.caret else {
            return;
        };
        if !state.contains(self.id, leaf) {
            return;
        }
        let node = state.node_mut(leaf);
        let indicator_len = node.indicator_len();
        if let Some(indicator) = node.indicator.as_mut()
            && offset <= indicator_len
        {
            indicator.insert_str(byte_index(indicator, offset), typed);
        } else {
            insert_into_text_nodes(&mut node.text, offset - indicator_len, typed);
        }
        state.caret = Some((leaf, offset + char_len(typed)));
    }

    /// Simulate one native Backspace at the caret
    pub fn delete_backward(&self) {
        let mut state = self.state.borrow_mut();
        let Some((leaf, offset)) = state.caret else {
            return;
        };
        if offset == 0 || !state.contains(self.id, leaf) {
            return;
        }
        let node = state.node_mut(leaf);
        let indicator_len = node.indicator_len();
        if let Some(indicator) = node.indicator.as_mut()
            && offset <= indicator_len
        {
            let at = byte_index(indicator, offset - 1);
            indicator.remove(at);
        } else {
            remove_from_text_nodes(&mut node.text, offset - indicator_len - 1);
        }
        state.caret = Some((leaf, offset - 1));
    }

    /// Remove this subtree from the document
    pub fn detach(&self) {
        self.state.borrow_mut().disconnect(self.id);
    }
}

fn insert_into_text_nodes(nodes: &mut Vec<String>, offset: usize, typed: &str) {
    let mut remaining = offset;
    for node in nodes.iter_mut() {
        let len = char_len(node);
        if remaining <= len {
            node.insert_str(byte_index(node, remaining), typed);
            return;
        }
        remaining -= len;
    }
    nodes.push(typed.to_string());
}

fn remove_from_text_nodes(nodes: &mut [String], offset: usize) {
    let mut remaining = offset;
    for node in nodes.iter_mut() {
        let len = char_len(node);
        if remaining < len {
            let at = byte_index(node, remaining);
            node.remove(at);
            return;
        }
        remaining -= len;
    }
}

impl DomElement for HeadlessElement {
    fn tag_name(&self) -> String {
        self.state.borrow().node(self.id).tag.to_uppercase()
    }

    fn has_class(&self, class: &str) -> bool {
        self.state
            .borrow()
            .node(self.id)
            .classes
            .iter()
            .any(|candidate| candidate == class)
    }

    fn is_content_editable(&self) -> bool {
        self.state.borrow().node(self.id).content_editable
    }

    fn input_kind(&self) -> Option<InputKind> {
        self.state.borrow().node(self.id).input
    }

    fn is_connected(&self) -> bool {
        self.state.borrow().node(self.id).connected
    }

    fn named_field(&self, name: &str) -> Option<Self> {
        let state = self.state.borrow();
        state
            .descendants(self.id)
            .into_iter()
            .find(|id| state.node(*id).attributes.get("data-field").map(String::as_str) == Some(name))
            .map(|id| self.sibling(id))
    }

    fn editable_region(&self) -> Option<Self> {
        let state = self.state.borrow();
        if state.node(self.id).content_editable {
            return Some(self.clone());
        }
        state
            .descendants(self.id)
            .into_iter()
            .find(|id| state.node(*id).content_editable)
            .map(|id| self.sibling(id))
    }

    fn focusable_descendants(&self) -> Vec<Self> {
        let state = self.state.borrow();
        state
            .descendants(self.id)
            .into_iter()
            .filter(|id| {
                let node = state.node(*id);
                node.content_editable || node.input.is_some()
            })
            .map(|id| self.sibling(id))
            .collect()
    }

    fn text_content(&self) -> String {
        self.state.borrow().text_content(self.id)
    }

    fn text_node_lengths(&self) -> Vec<usize> {
        let state = self.state.borrow();
        state
            .text_leaves(self.id)
            .into_iter()
            .flat_map(|leaf| state.node(leaf).own_text_lengths())
            .collect()
    }

    fn caret_offset(&self) -> Option<usize> {
        self.state.borrow().caret_offset_in(self.id)
    }

    fn set_caret(&self, position: CaretPosition) -> Result<(), SurfaceError> {
        let mut state = self.state.borrow_mut();
        if !state.node(self.id).connected {
            return Err(SurfaceError::Detached);
        }
        let leaves = state.text_leaves(self.id);
        let (first, last) = match (leaves.first(), leaves.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return Err(SurfaceError::NotEditable),
        };
        let caret = match position {
            CaretPosition::Start => (first, 0),
            CaretPosition::End => (last, char_len(&state.node(last).own_text())),
            CaretPosition::InTextNode { index, offset } => {
                let mut remaining = index;
                let mut found = None;
                for leaf in &leaves {
                    let lengths = state.node(*leaf).own_text_lengths();
                    if remaining < lengths.len() {
                        let before: usize = lengths[..remaining].iter().sum();
                        found = Some((*leaf, before + offset.min(lengths[remaining])));
                        break;
                    }
                    remaining -= lengths.len();
                }
                found.ok_or(SurfaceError::MissingTextNode { index })?
            }
        };
        state.caret = Some(caret);
        Ok(())
    }

    fn value_len(&self) -> usize {
        char_len(&self.state.borrow().node(self.id).value)
    }

    fn set_selection_range(&self, start: usize, end: usize) -> Result<(), SurfaceError> {
        let mut state = self.state.borrow_mut();
        let node = state.node_mut(self.id);
        if !node.input.is_some_and(InputKind::holds_text) {
            return Err(SurfaceError::NotEditable);
        }
        let len = char_len(&node.value);
        node.selection_range = (start.min(len), end.min(len));
        Ok(())
    }

    fn focus(&self) -> Result<(), SurfaceError> {
        let mut state = self.state.borrow_mut();
        let node = state.node(self.id);
        if !node.connected {
            return Err(SurfaceError::Detached);
        }
        if node.reject_focus {
            return Err(SurfaceError::FocusRejected);
        }
        if !node.content_editable && node.input.is_none() {
            return Err(SurfaceError::NotFocusable);
        }
        let editable = node.content_editable;
        state.focused = Some(self.id);
        // A focused editable region always holds the caret, at its start by default
        if editable && state.caret_offset_in(self.id).is_none() {
            state.caret = state.text_leaves(self.id).first().map(|leaf| (*leaf, 0));
        }
        Ok(())
    }

    fn blur(&self) {
        let mut state = self.state.borrow_mut();
        if let Some(focused) = state.focused
            && state.contains(self.id, focused)
        {
            state.focused = None;
        }
    }

    fn bounding_rect(&self) -> Rect {
        let state = self.state.borrow();
        let leaves: Vec<NodeId> = if state.node(self.id).children.is_empty() {
            vec![self.id]
        } else {
            state
                .descendants(self.id)
                .into_iter()
                .filter(|id| state.node(*id).children.is_empty())
                .collect()
        };
        let mut rects = leaves.into_iter().map(|leaf| state.leaf_rect(leaf));
        let Some(first) = rects.next() else {
            return Rect::default();
        };
        rects.fold(first, |acc, rect| {
            let top = acc.top.min(rect.top);
            let bottom = acc.bottom().max(rect.bottom());
            let left = acc.left.min(rect.left);
            let right = acc.right().max(rect.right());
            Rect::new(top, left, right - left, bottom - top)
        })
    }

    fn caret_rect(&self) -> Option<Rect> {
        let state = self.state.borrow();
        let (leaf, offset) = state.caret?;
        if !state.contains(self.id, leaf) {
            return None;
        }
        Some(state.position_rect(leaf, offset, 0.0))
    }

    fn char_rect(&self, index: usize) -> Option<Rect> {
        let state = self.state.borrow();
        let mut remaining = index;
        for leaf in state.text_leaves(self.id) {
            let len = char_len(&state.node(leaf).own_text());
            if remaining < len {
                return Some(state.position_rect(leaf, remaining, state.metrics.char_width));
            }
            remaining -= len;
        }
        None
    }

    fn computed_line_height(&self) -> String {
        self.state.borrow().node(self.id).line_height_style.clone()
    }

    fn computed_font_size(&self) -> String {
        self.state.borrow().node(self.id).font_size_style.clone()
    }

    fn insert_command_indicator(
        &self,
        symbol: &str,
        placeholder: &str,
    ) -> Result<(), SurfaceError> {
        let mut state = self.state.borrow_mut();
        let node = state.node(self.id);
        if !node.connected {
            return Err(SurfaceError::Detached);
        }
        if !node.content_editable || !node.children.is_empty() {
            return Err(SurfaceError::NotEditable);
        }
        let node = state.node_mut(self.id);
        node.indicator = Some(symbol.to_string());
        node.attributes
            .insert("data-placeholder".to_string(), placeholder.to_string());
        state.caret = Some((self.id, char_len(symbol)));
        Ok(())
    }

    fn command_indicator_text(&self) -> Option<String> {
        self.state.borrow().node(self.id).indicator.clone()
    }

    fn replace_with_plain_text(&self, text: &str) -> Result<(), SurfaceError> {
        {
            let state = self.state.borrow();
            if !state.node(self.id).connected {
                return Err(SurfaceError::Detached);
            }
        }
        self.state
            .borrow_mut()
            .node_mut(self.id)
            .attributes
            .remove("data-placeholder");
        self.set_text(text);
        Ok(())
    }

    fn dispatch_input(&self) {
        self.state.borrow_mut().input_log.push(self.id);
    }
}
