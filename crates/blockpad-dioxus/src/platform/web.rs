//! The engine's DOM traits over `web-sys`.

use blockpad_engine::surface::{CaretPosition, DomElement, EditorDom, InputKind, Rect, SurfaceError};
use blockpad_engine::text::{char_len, char_offset_from_utf16, utf16_offset};
use blockpad_engine::{BlockId, BlockRecord};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, HtmlElement, HtmlInputElement, HtmlTextAreaElement, Node, Range, Selection};

/// `NodeFilter.SHOW_TEXT`
const SHOW_TEXT: u32 = 4;

const INDICATOR_SELECTOR: &str = "[data-command-indicator]";
const QUERY_SELECTOR: &str = "[data-command-indicator] .command-query";

fn browser_error(error: JsValue) -> SurfaceError {
    SurfaceError::Browser(format!("{error:?}"))
}

fn document() -> Option<Document> {
    web_sys::window()?.document()
}

fn selection() -> Option<Selection> {
    web_sys::window()?.get_selection().ok()?
}

fn rect_of(rect: web_sys::DomRect) -> Rect {
    Rect::new(rect.y(), rect.x(), rect.width(), rect.height())
}

/// The live browser document
#[derive(Debug, Clone, Copy, Default)]
pub struct WebDom;

impl EditorDom for WebDom {
    type Element = WebElement;

    fn query_block(&self, id: BlockId) -> Option<WebElement> {
        let selector = format!("[data-block-id=\"{id}\"]");
        document()?
            .query_selector(&selector)
            .ok()
            .flatten()
            .and_then(|element| element.dyn_into::<HtmlElement>().ok())
            .map(WebElement)
    }
}

/// Blocks are mounted by Dioxus; there is nothing to build here.
pub fn mount_blocks(_dom: &WebDom, _records: &[BlockRecord]) {}

/// Run `callback` on the next animation frame
pub fn request_frame(callback: impl FnOnce() + 'static) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let closure = Closure::once(callback);
    if let Err(error) = window.request_animation_frame(closure.as_ref().unchecked_ref()) {
        log::warn!("requestAnimationFrame failed: {error:?}");
    }
    closure.forget();
}

#[derive(Debug, Clone, PartialEq)]
pub struct WebElement(HtmlElement);

impl WebElement {
    fn owner_document(&self) -> Result<Document, SurfaceError> {
        self.0.owner_document().ok_or(SurfaceError::Detached)
    }

    fn text_nodes(&self) -> Vec<Node> {
        let mut nodes = Vec::new();
        let Ok(document) = self.owner_document() else {
            return nodes;
        };
        if let Ok(walker) = document.create_tree_walker_with_what_to_show(&self.0, SHOW_TEXT) {
            while let Ok(Some(node)) = walker.next_node() {
                nodes.push(node);
            }
        }
        nodes
    }

    /// Text node holding character `index`, and the index within it
    fn locate_char(&self, index: usize) -> Option<(Node, String, usize)> {
        let mut remaining = index;
        for node in self.text_nodes() {
            let text = node.text_content().unwrap_or_default();
            let len = char_len(&text);
            if remaining < len {
                return Some((node, text, remaining));
            }
            remaining -= len;
        }
        None
    }

    fn selection_range_inside(&self) -> Option<Range> {
        let selection = selection()?;
        if selection.range_count() == 0 {
            return None;
        }
        let range = selection.get_range_at(0).ok()?;
        let container = range.start_container().ok()?;
        self.0.contains(Some(&container)).then_some(range)
    }

    fn select(&self, range: &Range) -> Result<(), SurfaceError> {
        let selection = selection().ok_or_else(|| SurfaceError::Browser("no selection".to_string()))?;
        selection.remove_all_ranges().map_err(browser_error)?;
        selection.add_range(range).map_err(browser_error)
    }

    fn as_input(&self) -> Option<&HtmlInputElement> {
        self.0.dyn_ref::<HtmlInputElement>()
    }

    fn as_textarea(&self) -> Option<&HtmlTextAreaElement> {
        self.0.dyn_ref::<HtmlTextAreaElement>()
    }

    fn query_all(&self, selector: &str) -> Vec<WebElement> {
        let Ok(list) = self.0.query_selector_all(selector) else {
            return Vec::new();
        };
        (0..list.length())
            .filter_map(|index| list.item(index))
            .filter_map(|node| node.dyn_into::<HtmlElement>().ok())
            .map(WebElement)
            .collect()
    }

    fn computed_style(&self, property: &str) -> String {
        web_sys::window()
            .and_then(|window| window.get_computed_style(&self.0).ok().flatten())
            .and_then(|style| style.get_property_value(property).ok())
            .unwrap_or_default()
    }
}

impl DomElement for WebElement {
    fn tag_name(&self) -> String {
        self.0.tag_name()
    }

    fn has_class(&self, class: &str) -> bool {
        self.0.class_list().contains(class)
    }

    fn is_content_editable(&self) -> bool {
        self.0.is_content_editable()
    }

    fn input_kind(&self) -> Option<InputKind> {
        if let Some(input) = self.as_input() {
            return Some(InputKind::from_type_attribute(&input.type_()));
        }
        self.as_textarea().map(|_| InputKind::TextArea)
    }

    fn is_connected(&self) -> bool {
        self.0.is_connected()
    }

    fn named_field(&self, name: &str) -> Option<Self> {
        self.query_all(&format!("[data-field=\"{name}\"]"))
            .into_iter()
            .next()
    }

    fn editable_region(&self) -> Option<Self> {
        if self.0.get_attribute("contenteditable").as_deref() == Some("true") {
            return Some(self.clone());
        }
        self.query_all("[contenteditable=\"true\"]").into_iter().next()
    }

    fn focusable_descendants(&self) -> Vec<Self> {
        self.query_all("[contenteditable=\"true\"], input, textarea")
    }

    fn text_content(&self) -> String {
        self.0.text_content().unwrap_or_default()
    }

    fn text_node_lengths(&self) -> Vec<usize> {
        self.text_nodes()
            .iter()
            .map(|node| char_len(&node.text_content().unwrap_or_default()))
            .collect()
    }

    fn caret_offset(&self) -> Option<usize> {
        let range = self.selection_range_inside()?;
        let container = range.start_container().ok()?;
        let offset = range.start_offset().ok()?;
        if container.node_type() == Node::TEXT_NODE {
            let mut chars = 0;
            for node in self.text_nodes() {
                let text = node.text_content().unwrap_or_default();
                if node == container {
                    return Some(chars + char_offset_from_utf16(&text, offset as usize));
                }
                chars += char_len(&text);
            }
        }
        // Caret between child elements: measure the text in front of it
        let before = self.owner_document().ok()?.create_range().ok()?;
        before.select_node_contents(&self.0).ok()?;
        before.set_end(&container, offset).ok()?;
        Some(char_len(&String::from(before.to_string())))
    }

    fn set_caret(&self, position: CaretPosition) -> Result<(), SurfaceError> {
        if !self.0.is_connected() {
            return Err(SurfaceError::Detached);
        }
        let range = self.owner_document()?.create_range().map_err(browser_error)?;
        match position {
            CaretPosition::Start | CaretPosition::End => {
                range.select_node_contents(&self.0).map_err(browser_error)?;
                range.collapse_with_to_start(position == CaretPosition::Start);
            }
            CaretPosition::InTextNode { index, offset } => {
                let node = self
                    .text_nodes()
                    .into_iter()
                    .nth(index)
                    .ok_or(SurfaceError::MissingTextNode { index })?;
                let text = node.text_content().unwrap_or_default();
                range
                    .set_start(&node, utf16_offset(&text, offset) as u32)
                    .map_err(browser_error)?;
                range.collapse_with_to_start(true);
            }
        }
        self.select(&range)
    }

    fn value_len(&self) -> usize {
        if let Some(input) = self.as_input() {
            return char_len(&input.value());
        }
        self.as_textarea()
            .map_or(0, |textarea| char_len(&textarea.value()))
    }

    fn set_selection_range(&self, start: usize, end: usize) -> Result<(), SurfaceError> {
        if let Some(input) = self.as_input() {
            let value = input.value();
            return input
                .set_selection_range(
                    utf16_offset(&value, start) as u32,
                    utf16_offset(&value, end) as u32,
                )
                .map_err(browser_error);
        }
        if let Some(textarea) = self.as_textarea() {
            let value = textarea.value();
            return textarea
                .set_selection_range(
                    utf16_offset(&value, start) as u32,
                    utf16_offset(&value, end) as u32,
                )
                .map_err(browser_error);
        }
        Err(SurfaceError::NotEditable)
    }

    fn focus(&self) -> Result<(), SurfaceError> {
        if !self.0.is_connected() {
            return Err(SurfaceError::Detached);
        }
        self.0.focus().map_err(browser_error)?;
        let focused = self
            .owner_document()?
            .active_element()
            .is_some_and(|active| self.0.contains(Some(active.as_ref())));
        if focused {
            Ok(())
        } else {
            Err(SurfaceError::FocusRejected)
        }
    }

    fn blur(&self) {
        if let Err(error) = self.0.blur() {
            log::debug!("blur failed: {error:?}");
        }
    }

    fn bounding_rect(&self) -> Rect {
        rect_of(self.0.get_bounding_client_rect())
    }

    fn caret_rect(&self) -> Option<Rect> {
        let rect = rect_of(self.selection_range_inside()?.get_bounding_client_rect());
        // A collapsed range in an empty line has no box
        (rect != Rect::default()).then_some(rect)
    }

    fn char_rect(&self, index: usize) -> Option<Rect> {
        let (node, text, offset) = self.locate_char(index)?;
        let range = self.owner_document().ok()?.create_range().ok()?;
        range.set_start(&node, utf16_offset(&text, offset) as u32).ok()?;
        range
            .set_end(&node, utf16_offset(&text, offset + 1) as u32)
            .ok()?;
        Some(rect_of(range.get_bounding_client_rect()))
    }

    fn computed_line_height(&self) -> String {
        self.computed_style("line-height")
    }

    fn computed_font_size(&self) -> String {
        self.computed_style("font-size")
    }

    fn insert_command_indicator(&self, symbol: &str, placeholder: &str) -> Result<(), SurfaceError> {
        let document = self.owner_document()?;
        let existing = self.text_content();

        let indicator = document.create_element("span").map_err(browser_error)?;
        indicator.set_class_name("command-indicator");
        indicator
            .set_attribute("data-command-indicator", "")
            .map_err(browser_error)?;
        let query = document.create_element("span").map_err(browser_error)?;
        query.set_class_name("command-query");
        query.set_text_content(Some(symbol));
        let hint = document.create_element("span").map_err(browser_error)?;
        hint.set_class_name("command-placeholder");
        hint.set_attribute("contenteditable", "false")
            .map_err(browser_error)?;
        hint.set_attribute("data-placeholder", placeholder)
            .map_err(browser_error)?;
        indicator.append_child(&query).map_err(browser_error)?;
        indicator.append_child(&hint).map_err(browser_error)?;

        self.0.set_text_content(None);
        self.0.append_child(&indicator).map_err(browser_error)?;
        if !existing.is_empty() {
            self.0
                .append_child(&document.create_text_node(&existing))
                .map_err(browser_error)?;
        }

        let symbol_node = query
            .first_child()
            .ok_or(SurfaceError::MissingTextNode { index: 0 })?;
        let range = document.create_range().map_err(browser_error)?;
        range
            .set_start(&symbol_node, utf16_offset(symbol, char_len(symbol)) as u32)
            .map_err(browser_error)?;
        range.collapse_with_to_start(true);
        self.select(&range)
    }

    fn command_indicator_text(&self) -> Option<String> {
        if self.0.query_selector(INDICATOR_SELECTOR).ok().flatten().is_none() {
            return None;
        }
        let query = self.0.query_selector(QUERY_SELECTOR).ok().flatten()?;
        Some(query.text_content().unwrap_or_default())
    }

    fn replace_with_plain_text(&self, text: &str) -> Result<(), SurfaceError> {
        if !self.0.is_connected() {
            return Err(SurfaceError::Detached);
        }
        self.0
            .set_text_content((!text.is_empty()).then_some(text));
        Ok(())
    }

    fn dispatch_input(&self) {
        let init = web_sys::EventInit::new();
        init.set_bubbles(true);
        match web_sys::Event::new_with_event_init_dict("input", &init) {
            Ok(event) => {
                if let Err(error) = self.0.dispatch_event(&event) {
                    log::warn!("Synthetic input event failed: {error:?}");
                }
            }
            Err(error) => log::warn!("Could not create input event: {error:?}"),
        }
    }
}
