//! Caret placement primitives.
//!
//! All offsets are absolute character offsets into the element's text
//! content. Entering a block from above or below keeps the caret's column
//! where the target line is long enough and clamps to the line end where
//! it is not, like a native multi-line editor.

use crate::surface::{CaretPosition, DomElement, SurfaceError};
use crate::text::{char_len, first_newline, last_newline};

/// Put a collapsed caret at `offset`, or at the end when `offset` is past it.
pub fn place_caret_at_offset<E: DomElement>(element: &E, offset: usize) -> Result<(), SurfaceError> {
    // New and freshly merged-into-empty blocks land here; never walk for it
    if offset == 0 {
        return element.set_caret(CaretPosition::Start);
    }

    let mut accumulated = 0;
    for (index, len) in element.text_node_lengths().into_iter().enumerate() {
        if accumulated + len >= offset {
            return element.set_caret(CaretPosition::InTextNode {
                index,
                offset: offset - accumulated,
            });
        }
        accumulated += len;
    }
    element.set_caret(CaretPosition::End)
}

/// Focus `target` and put the caret on its first line at `column`, clamped.
pub fn navigate_entering_from_above<E: DomElement>(
    target: &E,
    column: usize,
) -> Result<(), SurfaceError> {
    target.focus()?;
    let text = target.text_content();
    if text.is_empty() {
        return target.set_caret(CaretPosition::Start);
    }
    let first_line_len = first_newline(&text).unwrap_or_else(|| char_len(&text));
    place_caret_at_offset(target, column.min(first_line_len))
}

/// Focus `target` and put the caret on its last line at `column`, clamped.
pub fn navigate_entering_from_below<E: DomElement>(
    target: &E,
    column: usize,
) -> Result<(), SurfaceError> {
    target.focus()?;
    let text = target.text_content();
    if text.is_empty() {
        return target.set_caret(CaretPosition::Start);
    }
    let last_line_start = last_newline(&text).map_or(0, |newline| newline + 1);
    let last_line_len = char_len(&text) - last_line_start;
    place_caret_at_offset(target, last_line_start + column.min(last_line_len))
}
