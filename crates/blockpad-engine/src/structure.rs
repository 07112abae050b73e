//! Enter splitting, Backspace merging and the Backspace policy.

use crate::surface::DomElement;
use crate::text::{char_len, split_at_char};

/// Text on either side of the caret
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub before: String,
    pub after: String,
}

impl Split {
    /// Whether the new block should get the caret at its start
    pub fn moves_text(&self) -> bool {
        !self.after.is_empty()
    }
}

/// Split `text` at a character offset
pub fn split_text(text: &str, offset: usize) -> Split {
    let (before, after) = split_at_char(text, offset);
    // A lone trailing newline would show up as a blank line in the new block
    let after = if after == "\n" { "" } else { after };
    Split {
        before: before.to_string(),
        after: after.to_string(),
    }
}

/// Split an element's text at its caret. Without a caret, splits at the end.
pub fn split_at_caret<E: DomElement>(element: &E) -> Split {
    let text = element.text_content();
    let offset = element.caret_offset().unwrap_or_else(|| char_len(&text));
    split_text(&text, offset)
}

/// Result of joining a block onto its predecessor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Merge {
    pub merged_content: String,
    /// Where the caret goes: the boundary between the two contents
    pub junction_offset: usize,
}

pub fn compute_merge(previous: &str, current: &str) -> Merge {
    Merge {
        merged_content: format!("{previous}{current}"),
        junction_offset: char_len(previous),
    }
}

/// The block before the one receiving Backspace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviousBlock<Id> {
    pub id: Id,
    /// Both blocks are plain text kinds
    pub mergeable: bool,
}

/// What Backspace should do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackspacePlan<Id> {
    /// Remove the (blank) block and put the caret at the end of `previous`
    DeleteAndFocusPrevious { previous: Id },
    /// Append this block's content to `previous`
    MergeWithPrevious { previous: Id },
    /// Let the browser delete a character
    Native,
}

/// Decide what Backspace does in a block.
///
/// `content` is `None` when the block's text could not be read; that never
/// triggers a structural change.
pub fn plan_backspace<Id: Copy>(
    content: Option<&str>,
    caret: Option<usize>,
    previous: Option<PreviousBlock<Id>>,
) -> BackspacePlan<Id> {
    let (Some(content), Some(previous)) = (content, previous) else {
        return BackspacePlan::Native;
    };
    if content.trim().is_empty() {
        return BackspacePlan::DeleteAndFocusPrevious {
            previous: previous.id,
        };
    }
    if caret == Some(0) && previous.mergeable {
        return BackspacePlan::MergeWithPrevious {
            previous: previous.id,
        };
    }
    BackspacePlan::Native
}
