//! Visual-line geometry.
//!
//! A caret can sit on the first text line of an element and still be on
//! its second *visual* row once the text soft-wraps. These detectors
//! combine the text (explicit `\n`) with rendered rectangles so that
//! Arrow-Up/Down only leave a block from its true top or bottom row.

mod line_height;

pub use line_height::{effective_line_height, parse_font_size, parse_line_height};

use crate::config::GeometryConfig;
use crate::surface::DomElement;
use crate::text::{last_newline, split_at_char};

/// Whether the caret sits on the element's top visual row.
///
/// Empty elements are always on their first line. A `\n` before the caret
/// settles it textually; otherwise the caret rectangle must lie within
/// `first_line_tolerance` line-heights of the element top.
pub fn is_at_first_visual_line<E: DomElement>(element: &E, config: &GeometryConfig) -> bool {
    let text = element.text_content();
    if text.is_empty() {
        return true;
    }
    let Some(caret) = element.caret_offset() else {
        return false;
    };
    let (before, _) = split_at_char(&text, caret);
    if before.contains('\n') {
        return false;
    }

    let Some(caret_rect) = element.caret_rect() else {
        return true;
    };
    let element_rect = element.bounding_rect();
    let line_height = effective_line_height(element, config);
    caret_rect.top - element_rect.top <= line_height * config.first_line_tolerance
}

/// Whether the caret sits on the element's bottom visual row.
///
/// A lone trailing `\n` after the caret still counts as the last line. The
/// visual check uses a stricter bottom-proximity threshold when the element
/// shows several rows than when it shows one.
pub fn is_at_last_visual_line<E: DomElement>(element: &E, config: &GeometryConfig) -> bool {
    let text = element.text_content();
    if text.is_empty() {
        return true;
    }
    let Some(caret) = element.caret_offset() else {
        return false;
    };
    let (_, after) = split_at_char(&text, caret);
    if after.contains('\n') {
        return after == "\n";
    }

    let Some(caret_rect) = element.caret_rect() else {
        return true;
    };
    let element_rect = element.bounding_rect();
    let line_height = effective_line_height(element, config);
    let visual_lines = (element_rect.height / line_height).round().max(1.0);
    let threshold = if visual_lines > 1.0 {
        config.last_line_threshold_multi
    } else {
        config.last_line_threshold_single
    } * line_height;
    element_rect.bottom() - caret_rect.bottom() < threshold
}

/// Column of the caret within its current visual line.
///
/// When a `\n` precedes the caret the column is the distance from it.
/// Otherwise the scan walks back one character at a time, probing each
/// character's rectangle, until it finds one on a different row. That is
/// O(line length) rectangle reads on a long unbroken line; there is no
/// cheaper way to find where a soft wrap began.
pub fn horizontal_position_of<E: DomElement>(element: &E, config: &GeometryConfig) -> usize {
    let Some(caret) = element.caret_offset() else {
        return 0;
    };
    if caret == 0 {
        return 0;
    }
    let text = element.text_content();
    let (before, _) = split_at_char(&text, caret);
    if let Some(newline) = last_newline(before) {
        return caret - newline - 1;
    }

    let Some(caret_rect) = element.caret_rect() else {
        return caret;
    };
    for index in (0..caret).rev() {
        let Some(rect) = element.char_rect(index) else {
            continue;
        };
        if (rect.top - caret_rect.top).abs() > config.horizontal_tolerance_px {
            return caret - index - 1;
        }
    }
    caret
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::headless::{HeadlessDom, HeadlessElement};
    use rstest::rstest;

    fn field(text: &str, caret: usize) -> HeadlessElement {
        let dom = HeadlessDom::new();
        let field = dom.create_editable(text);
        field.place_caret(caret);
        field
    }

    fn wrapped(text: &str, columns: usize, caret: usize) -> HeadlessElement {
        let field = field(text, caret);
        field.set_wrap_columns(columns);
        field
    }

    #[test]
    fn test_caret_inside_first_text_line() {
        let config = GeometryConfig::default();
        let field = field("foo\nbar", 1);
        assert!(is_at_first_visual_line(&field, &config));
        assert!(!is_at_last_visual_line(&field, &config));
    }

    #[test]
    fn test_caret_inside_last_text_line() {
        let config = GeometryConfig::default();
        let field = field("foo\nbar", 5);
        assert!(!is_at_first_visual_line(&field, &config));
        assert!(is_at_last_visual_line(&field, &config));
    }

    #[test]
    fn test_single_line_is_first_and_last_everywhere() {
        let config = GeometryConfig::default();
        let text = "a single line of text";
        for caret in 0..=text.len() {
            let field = field(text, caret);
            assert!(is_at_first_visual_line(&field, &config), "first at {caret}");
            assert!(is_at_last_visual_line(&field, &config), "last at {caret}");
        }
    }

    #[test]
    fn test_empty_element_is_first_and_last() {
        let config = GeometryConfig::default();
        let field = field("", 0);
        assert!(is_at_first_visual_line(&field, &config));
        assert!(is_at_last_visual_line(&field, &config));
    }

    #[test]
    fn test_soft_wrap_moves_caret_off_first_line() {
        let config = GeometryConfig::default();
        // "abcdefghij" wraps after five columns: "abcde" / "fghij"
        let second_row = wrapped("abcdefghij", 5, 7);
        assert!(!is_at_first_visual_line(&second_row, &config));
        assert!(is_at_last_visual_line(&second_row, &config));

        let first_row = wrapped("abcdefghij", 5, 2);
        assert!(is_at_first_visual_line(&first_row, &config));
        assert!(!is_at_last_visual_line(&first_row, &config));
    }

    #[rstest]
    #[case(8.0, true)]
    #[case(14.0, false)]
    fn test_multi_row_bottom_uses_strict_threshold(#[case] padding: f64, #[case] expected: bool) {
        let config = GeometryConfig::default();
        // Two rows of 20px; the 0.6 threshold allows 12px below the caret
        let field = wrapped("abcdefgh", 5, 8);
        field.set_padding_bottom(padding);
        assert_eq!(is_at_last_visual_line(&field, &config), expected);
    }

    #[rstest]
    #[case(10.0)]
    #[case(20.0)]
    #[case(24.0)]
    fn test_single_row_bottom_uses_loose_threshold(#[case] padding: f64) {
        let config = GeometryConfig::default();
        // Laid out on a 20px row but styled 30px: still one visual line, and
        // the 0.9 threshold allows 27px below the caret where 0.6 allows 18px
        let field = field("abc", 3);
        field.set_line_height_style("30px");
        field.set_line_height_px(20.0);
        field.set_padding_bottom(padding);
        assert!(is_at_last_visual_line(&field, &config));
    }

    #[test]
    fn test_trailing_newline_counts_as_last_line() {
        let config = GeometryConfig::default();
        assert!(is_at_last_visual_line(&field("foo\n", 3), &config));
        assert!(is_at_last_visual_line(&field("foo\n", 4), &config));
        assert!(!is_at_last_visual_line(&field("foo\n\n", 3), &config));
    }

    #[test]
    fn test_caret_outside_element_is_not_at_a_boundary() {
        let config = GeometryConfig::default();
        let dom = HeadlessDom::new();
        let field = dom.create_editable("foo");
        let other = dom.create_editable("bar");
        other.place_caret(1);
        assert!(!is_at_first_visual_line(&field, &config));
        assert!(!is_at_last_visual_line(&field, &config));
        assert_eq!(horizontal_position_of(&field, &config), 0);
    }

    #[test]
    fn test_wrapped_large_label_uses_override_line_height() {
        let config = GeometryConfig::default();
        let label = wrapped("abcdefghij", 5, 2);
        label.add_class("large-label");
        label.set_line_height_px(30.0);
        assert!(is_at_first_visual_line(&label, &config));
        assert!(!is_at_last_visual_line(&label, &config));

        label.place_caret(8);
        assert!(!is_at_first_visual_line(&label, &config));
        assert!(is_at_last_visual_line(&label, &config));
    }

    #[rstest]
    #[case("foo\nbar", 0, 0)]
    #[case("foo\nbar", 2, 2)]
    #[case("foo\nbar", 5, 1)]
    #[case("foo\nbar", 7, 3)]
    #[case("foo\n", 4, 0)]
    #[case("single", 4, 4)]
    fn test_horizontal_position_text_lines(
        #[case] text: &str,
        #[case] caret: usize,
        #[case] expected: usize,
    ) {
        let config = GeometryConfig::default();
        assert_eq!(horizontal_position_of(&field(text, caret), &config), expected);
    }

    #[rstest]
    #[case(0, 0)]
    #[case(3, 3)]
    #[case(5, 0)]
    #[case(8, 3)]
    #[case(12, 2)]
    fn test_horizontal_position_soft_wrap(#[case] caret: usize, #[case] expected: usize) {
        let config = GeometryConfig::default();
        let field = wrapped("abcdefghijklmn", 5, caret);
        assert_eq!(horizontal_position_of(&field, &config), expected);
    }

    #[test]
    fn test_horizontal_position_at_offset_zero_of_multiline() {
        let config = GeometryConfig::default();
        let field = wrapped("abcdefghij\nklm\nnop", 4, 0);
        assert_eq!(horizontal_position_of(&field, &config), 0);
    }
}
