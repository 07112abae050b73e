//! # blockpad-engine
//!
//! Caret and focus coordination for a block-based editor.
//!
//! Blocks are rendered by an external view layer. The engine reaches the
//! rendered document only through the [`surface::EditorDom`] and
//! [`surface::DomElement`] traits, looks blocks up by their
//! `data-block-id`, and asks the block store for structural changes via
//! [`model::BlockAction`]. It never owns block data.
//!
//! ## Module Structure
//!
//! - **`surface`**: the DOM boundary, plus a headless monospace implementation
//! - **`geometry`**: first/last visual line detection and horizontal caret column
//! - **`caret`**: caret placement by absolute offset or by entering a block from above/below
//! - **`field_nav`**: navigation between two editable fields inside one block
//! - **`command`**: slash-command catalogue and the per-field command-mode session
//! - **`structure`**: Enter splitting, Backspace merging and the Backspace policy
//! - **`focus`**: the focus manager and its deferred (two-frame) queue
//! - **`keymap`**: first-match-wins command tables for keydown dispatch
//! - **`editor`**: the controller wiring keystrokes, the block store and the focus manager
//! - **`model`**: the block store interface and an in-memory reference store

pub mod caret;
pub mod command;
pub mod config;
pub mod editor;
pub mod field_nav;
pub mod focus;
pub mod geometry;
pub mod keymap;
pub mod model;
pub mod structure;
pub mod surface;
pub mod text;

// Re-export key types for easier usage
pub use config::EditorConfig;
pub use editor::{BlockEditor, Field, KeyDisposition};
pub use focus::{BlockKind, FocusEvent, FocusManager, FocusOptions};
pub use keymap::{Key, KeyPress, Modifiers};
pub use model::{BlockAction, BlockId, BlockList, BlockRecord, BlockStore, BlockType};
pub use surface::{CaretPosition, DomElement, EditorDom, Rect, SurfaceError};
