//! Character-offset helpers.
//!
//! Every offset the engine hands around counts `char`s, the unit a caret
//! moves by. Surfaces that speak another unit (UTF-16 in the browser)
//! convert at their boundary.

/// Number of characters in `text`.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Byte index of the character at `char_offset`, clamped to the end of `text`.
pub fn byte_index(text: &str, char_offset: usize) -> usize {
    text.char_indices()
        .nth(char_offset)
        .map(|(index, _)| index)
        .unwrap_or(text.len())
}

/// Split `text` at a character offset. Offsets past the end split at the end.
pub fn split_at_char(text: &str, char_offset: usize) -> (&str, &str) {
    text.split_at(byte_index(text, char_offset))
}

/// Character offset of the first `\n`, if any.
pub fn first_newline(text: &str) -> Option<usize> {
    text.chars().position(|c| c == '\n')
}

/// Character offset of the last `\n`, if any.
pub fn last_newline(text: &str) -> Option<usize> {
    let mut last = None;
    for (index, c) in text.chars().enumerate() {
        if c == '\n' {
            last = Some(index);
        }
    }
    last
}

/// UTF-16 code units in the first `char_offset` characters of `text`.
pub fn utf16_offset(text: &str, char_offset: usize) -> usize {
    text.chars().take(char_offset).map(char::len_utf16).sum()
}

/// Characters covered by the first `utf16_offset` code units of `text`.
/// An offset that lands inside a surrogate pair counts the whole character.
pub fn char_offset_from_utf16(text: &str, utf16_offset: usize) -> usize {
    let mut units = 0;
    for (index, c) in text.chars().enumerate() {
        if units >= utf16_offset {
            return index;
        }
        units += c.len_utf16();
    }
    char_len(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_at_char_handles_multibyte() {
        assert_eq!(split_at_char("héllo", 2), ("hé", "llo"));
        assert_eq!(split_at_char("héllo", 99), ("héllo", ""));
        assert_eq!(split_at_char("", 0), ("", ""));
    }

    #[test]
    fn test_newline_positions_count_chars() {
        assert_eq!(first_newline("é\nb\nc"), Some(1));
        assert_eq!(last_newline("é\nb\nc"), Some(3));
        assert_eq!(first_newline("none"), None);
        assert_eq!(last_newline(""), None);
    }

    #[test]
    fn test_utf16_conversion_counts_surrogate_pairs() {
        let text = "a😀b";
        assert_eq!(utf16_offset(text, 0), 0);
        assert_eq!(utf16_offset(text, 2), 3);
        assert_eq!(utf16_offset(text, 99), 4);
        assert_eq!(char_offset_from_utf16(text, 3), 2);
        assert_eq!(char_offset_from_utf16(text, 2), 2);
        assert_eq!(char_offset_from_utf16(text, 4), 3);
        assert_eq!(char_offset_from_utf16("", 5), 0);
    }
}
