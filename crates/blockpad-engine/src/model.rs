//! Block store interface consumed by the engine, plus an in-memory store.
//!
//! The engine reads block order to find neighbours and requests structural
//! changes by dispatching [`BlockAction`]s. It never edits a record in place.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Stable integer identifier of a block, rendered as `data-block-id`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct BlockId(pub u64);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BlockId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(BlockId)
    }
}

/// Block types the editor knows how to render
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockType {
    Text,
    Heading,
    ShortAnswer,
    MultipleChoice,
    Multiselect,
}

impl BlockType {
    /// Form blocks pair an editable label with native input controls
    pub fn is_form(self) -> bool {
        matches!(
            self,
            BlockType::ShortAnswer | BlockType::MultipleChoice | BlockType::Multiselect
        )
    }

    /// Only plain text kinds may take part in a Backspace merge
    pub fn is_mergeable(self) -> bool {
        !self.is_form()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BlockType::Text => "text",
            BlockType::Heading => "heading",
            BlockType::ShortAnswer => "short_answer",
            BlockType::MultipleChoice => "multiple_choice",
            BlockType::Multiselect => "multiselect",
        }
    }
}

/// One block as held by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockRecord {
    pub id: BlockId,
    pub block_type: BlockType,
    /// Plain text content; for form blocks this is the label
    pub content: String,
    /// Secondary fields (`description`, `options`, ...)
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl BlockRecord {
    pub fn new(id: BlockId, block_type: BlockType, content: impl Into<String>) -> Self {
        Self {
            id,
            block_type,
            content: content.into(),
            properties: BTreeMap::new(),
        }
    }

    pub fn with_property(mut self, key: &str, value: impl Into<String>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}

/// Structural changes the engine may request from the store
#[derive(Debug, Clone, PartialEq)]
pub enum BlockAction {
    InsertAfter {
        after: BlockId,
        block_type: BlockType,
        content: String,
    },
    /// Turn a block into an empty block of another type, keeping its id
    Replace {
        id: BlockId,
        block_type: BlockType,
    },
    Remove {
        id: BlockId,
    },
    UpdateContent {
        id: BlockId,
        content: String,
    },
    UpdateField {
        id: BlockId,
        field: String,
        value: String,
    },
    /// Change the type, keeping content and properties
    ChangeType {
        id: BlockId,
        block_type: BlockType,
    },
    Move {
        id: BlockId,
        to_index: usize,
    },
}

/// The block-state collaborator
pub trait BlockStore {
    /// Block ids in document order
    fn order(&self) -> Vec<BlockId>;

    fn record(&self, id: BlockId) -> Option<&BlockRecord>;

    /// Apply an action. Returns the id of the block the action produced or
    /// touched, or `None` when the action was refused.
    fn dispatch(&mut self, action: BlockAction) -> Option<BlockId>;

    fn previous(&self, id: BlockId) -> Option<BlockId> {
        let order = self.order();
        let index = order.iter().position(|candidate| *candidate == id)?;
        index.checked_sub(1).map(|previous| order[previous])
    }

    fn next(&self, id: BlockId) -> Option<BlockId> {
        let order = self.order();
        let index = order.iter().position(|candidate| *candidate == id)?;
        order.get(index + 1).copied()
    }
}

/// In-memory ordered block list
#[derive(Debug, Clone, PartialEq)]
pub struct BlockList {
    blocks: Vec<BlockRecord>,
    next_id: u64,
    version: u64,
}

impl Default for BlockList {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockList {
    /// A document holding a single empty text block
    pub fn new() -> Self {
        Self::from_records(Vec::new())
    }

    pub fn from_records(records: Vec<BlockRecord>) -> Self {
        let mut blocks = records;
        if blocks.is_empty() {
            let first_id = BlockId(1);
            blocks.push(BlockRecord::new(first_id, BlockType::Text, ""));
        }
        let next_id = blocks.iter().map(|block| block.id.0).max().unwrap_or(0) + 1;
        Self {
            blocks,
            next_id,
            version: 0,
        }
    }

    pub fn records(&self) -> &[BlockRecord] {
        &self.blocks
    }

    /// Incremented on every applied action
    pub fn version(&self) -> u64 {
        self.version
    }

    fn index_of(&self, id: BlockId) -> Option<usize> {
        self.blocks.iter().position(|block| block.id == id)
    }

    fn allocate_id(&mut self) -> BlockId {
        let id = BlockId(self.next_id);
        self.next_id += 1;
        id
    }

    fn apply(&mut self, action: BlockAction) -> Option<BlockId> {
        match action {
            BlockAction::InsertAfter {
                after,
                block_type,
                content,
            } => {
                let index = self.index_of(after)?;
                let id = self.allocate_id();
                self.blocks
                    .insert(index + 1, BlockRecord::new(id, block_type, content));
                Some(id)
            }
            BlockAction::Replace { id, block_type } => {
                let index = self.index_of(id)?;
                self.blocks[index] = BlockRecord::new(id, block_type, "");
                Some(id)
            }
            BlockAction::Remove { id } => {
                // A document always keeps at least one block
                if self.blocks.len() <= 1 {
                    return None;
                }
                let index = self.index_of(id)?;
                self.blocks.remove(index);
                Some(id)
            }
            BlockAction::UpdateContent { id, content } => {
                let index = self.index_of(id)?;
                self.blocks[index].content = content;
                Some(id)
            }
            BlockAction::UpdateField { id, field, value } => {
                let index = self.index_of(id)?;
                self.blocks[index].properties.insert(field, value);
                Some(id)
            }
            BlockAction::ChangeType { id, block_type } => {
                let index = self.index_of(id)?;
                self.blocks[index].block_type = block_type;
                Some(id)
            }
            BlockAction::Move { id, to_index } => {
                let index = self.index_of(id)?;
                let block = self.blocks.remove(index);
                let to_index = to_index.min(self.blocks.len());
                self.blocks.insert(to_index, block);
                Some(id)
            }
        }
    }
}

impl BlockStore for BlockList {
    fn order(&self) -> Vec<BlockId> {
        self.blocks.iter().map(|block| block.id).collect()
    }

    fn record(&self, id: BlockId) -> Option<&BlockRecord> {
        self.blocks.iter().find(|block| block.id == id)
    }

    fn dispatch(&mut self, action: BlockAction) -> Option<BlockId> {
        log::debug!("dispatch {action:?}");
        let result = self.apply(action);
        if result.is_some() {
            self.version += 1;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn three_blocks() -> BlockList {
        BlockList::from_records(vec![
            BlockRecord::new(BlockId(1), BlockType::Text, "one"),
            BlockRecord::new(BlockId(2), BlockType::Heading, "two"),
            BlockRecord::new(BlockId(3), BlockType::Text, "three"),
        ])
    }

    #[test]
    fn test_new_list_has_one_empty_text_block() {
        let list = BlockList::new();
        assert_eq!(list.records().len(), 1);
        assert_eq!(list.records()[0].block_type, BlockType::Text);
        assert_eq!(list.records()[0].content, "");
    }

    #[test]
    fn test_insert_after_allocates_fresh_id() {
        let mut list = three_blocks();
        let id = list
            .dispatch(BlockAction::InsertAfter {
                after: BlockId(1),
                block_type: BlockType::Text,
                content: "new".to_string(),
            })
            .unwrap();

        assert_eq!(id, BlockId(4));
        assert_eq!(
            list.order(),
            vec![BlockId(1), BlockId(4), BlockId(2), BlockId(3)]
        );
        assert_eq!(list.version(), 1);
    }

    #[test]
    fn test_lone_block_is_never_removed() {
        let mut list = BlockList::new();
        assert_eq!(list.dispatch(BlockAction::Remove { id: BlockId(1) }), None);
        assert_eq!(list.records().len(), 1);
        assert_eq!(list.version(), 0);
    }

    #[test]
    fn test_replace_keeps_id_and_clears_content() {
        let mut list = three_blocks();
        list.dispatch(BlockAction::Replace {
            id: BlockId(1),
            block_type: BlockType::ShortAnswer,
        });
        let record = list.record(BlockId(1)).unwrap();
        assert_eq!(record.block_type, BlockType::ShortAnswer);
        assert_eq!(record.content, "");
    }

    #[test]
    fn test_change_type_keeps_content() {
        let mut list = three_blocks();
        list.dispatch(BlockAction::ChangeType {
            id: BlockId(3),
            block_type: BlockType::Heading,
        });
        let record = list.record(BlockId(3)).unwrap();
        assert_eq!(record.block_type, BlockType::Heading);
        assert_eq!(record.content, "three");
    }

    #[test]
    fn test_move_clamps_target_index() {
        let mut list = three_blocks();
        list.dispatch(BlockAction::Move {
            id: BlockId(1),
            to_index: 99,
        });
        assert_eq!(list.order(), vec![BlockId(2), BlockId(3), BlockId(1)]);
    }

    #[test]
    fn test_neighbours() {
        let list = three_blocks();
        assert_eq!(list.previous(BlockId(1)), None);
        assert_eq!(list.previous(BlockId(2)), Some(BlockId(1)));
        assert_eq!(list.next(BlockId(2)), Some(BlockId(3)));
        assert_eq!(list.next(BlockId(3)), None);
        assert_eq!(list.next(BlockId(42)), None);
    }

    #[test]
    fn test_unknown_id_is_refused() {
        let mut list = three_blocks();
        let result = list.dispatch(BlockAction::UpdateContent {
            id: BlockId(42),
            content: "x".to_string(),
        });
        assert_eq!(result, None);
        assert_eq!(list.version(), 0);
    }

    #[test]
    fn test_block_id_parses_attribute_value() {
        assert_eq!(" 12 ".parse::<BlockId>().unwrap(), BlockId(12));
        assert!("abc".parse::<BlockId>().is_err());
        assert_eq!(BlockId(7).to_string(), "7");
    }
}
