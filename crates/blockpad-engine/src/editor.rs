//! # Block editor controller
//!
//! [`BlockEditor`] is what a block component talks to. It owns the focus
//! manager, the block store and one command-mode session per editable
//! field, and turns keydown and input events into store actions plus focus
//! requests.
//!
//! ## Keydown tables
//!
//! Each keydown builds the table for the block and field it happened in
//! and dispatches it first-match-wins. Order, top to bottom:
//!
//! 1. command mode (menu arrows, commit, Escape, Ctrl/Meta+Backspace),
//!    then the trigger character at offset 0. Shift+Enter is swallowed
//!    while the menu is open.
//! 2. Shift+Enter: a `\n` written into the field at the caret
//! 3. Enter: split a text block, or add a block after a form block
//! 4. Backspace: delete a blank block or merge into the previous one
//! 5. form blocks only: label/description navigation
//! 6. Arrow-Up/Down out of the block from its first/last visual line
//!
//! Anything unmatched is left to the browser.

use std::collections::HashMap;

use crate::caret::{navigate_entering_from_above, navigate_entering_from_below, place_caret_at_offset};
use crate::command::{CommandSession, CommitDecision, InputOutcome};
use crate::config::EditorConfig;
use crate::field_nav::{field_navigation_down, field_navigation_up};
use crate::focus::{BlockKind, FocusEvent, FocusManager, FocusOptions};
use crate::geometry::{horizontal_position_of, is_at_first_visual_line, is_at_last_visual_line};
use crate::keymap::{CommandTable, Dispatch, Key, KeyCommand, KeyPress, Modifiers};
use crate::model::{BlockAction, BlockId, BlockStore, BlockType};
use crate::structure::{BackspacePlan, PreviousBlock, compute_merge, plan_backspace, split_at_caret};
use crate::surface::{DomElement, EditorDom};
use crate::text::{char_len, split_at_char};

/// An editable region inside a block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// The text of a text or heading block
    Content,
    /// Title of a form block (stored as the block's content)
    Label,
    /// Form block description (stored in the `description` property)
    Description,
}

impl Field {
    fn data_field(self) -> Option<&'static str> {
        match self {
            Field::Content => None,
            Field::Label => Some("label"),
            Field::Description => Some("description"),
        }
    }

    /// Map a field onto what a block of `block_type` actually renders
    fn for_block(self, block_type: BlockType) -> Self {
        match (block_type.is_form(), self) {
            (true, Field::Content) => Field::Label,
            (false, Field::Label | Field::Description) => Field::Content,
            (_, field) => field,
        }
    }

    fn accepts_commands(self) -> bool {
        self != Field::Description
    }
}

/// What the host should do with the keydown event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDisposition {
    Handled { prevent_default: bool },
    /// Not ours; let the browser act
    Native,
}

impl KeyDisposition {
    pub fn prevents_default(self) -> bool {
        matches!(
            self,
            KeyDisposition::Handled {
                prevent_default: true
            }
        )
    }
}

/// Keystroke and lifecycle controller for one editor surface
pub struct BlockEditor<D: EditorDom, S: BlockStore> {
    focus: FocusManager<D>,
    store: S,
    config: EditorConfig,
    sessions: HashMap<(BlockId, Field), CommandSession>,
}

impl<D, S> BlockEditor<D, S>
where
    D: EditorDom + 'static,
    D::Element: 'static,
    S: BlockStore + 'static,
{
    pub fn new(dom: D, store: S, config: EditorConfig) -> Self {
        Self {
            focus: FocusManager::new(dom, &config),
            store,
            config,
            sessions: HashMap::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn focus(&self) -> &FocusManager<D> {
        &self.focus
    }

    pub fn focus_mut(&mut self) -> &mut FocusManager<D> {
        &mut self.focus
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Command-mode session of a field, if one was ever opened there
    pub fn session(&self, id: BlockId, field: Field) -> Option<&CommandSession> {
        let field = self.resolve_field(id, field);
        self.sessions.get(&(id, field))
    }

    pub fn command_active(&self, id: BlockId, field: Field) -> bool {
        self.session(id, field).is_some_and(CommandSession::is_active)
    }

    fn block_type(&self, id: BlockId) -> Option<BlockType> {
        self.store.record(id).map(|record| record.block_type)
    }

    fn resolve_field(&self, id: BlockId, field: Field) -> Field {
        self.block_type(id)
            .map_or(field, |block_type| field.for_block(block_type))
    }

    /// Rendered element of a field
    pub fn field_element(&self, id: BlockId, field: Field) -> Option<D::Element> {
        let root = self.focus.dom().query_block(id)?;
        match self.resolve_field(id, field).data_field() {
            Some(name) => root.named_field(name),
            None => root.editable_region(),
        }
    }

    /// Field the caret enters when arriving from below
    fn bottom_field(&self, id: BlockId) -> Field {
        match self.block_type(id) {
            Some(block_type) if block_type.is_form() => Field::Description,
            _ => Field::Content,
        }
    }

    /// Field the caret enters when arriving from above
    fn top_field(&self, id: BlockId) -> Field {
        match self.block_type(id) {
            Some(block_type) if block_type.is_form() => Field::Label,
            _ => Field::Content,
        }
    }

    /// Dispatch one keydown in `field` of block `id`
    pub fn handle_keydown(&mut self, id: BlockId, field: Field, press: &KeyPress) -> KeyDisposition {
        let field = self.resolve_field(id, field);
        let mut table = self.command_table(id, field);
        match table.dispatch(press, self) {
            Dispatch::Handled { prevent_default } => KeyDisposition::Handled { prevent_default },
            Dispatch::Unhandled => KeyDisposition::Native,
        }
    }

    /// The keydown table of one field, in dispatch order
    pub fn command_table(&self, id: BlockId, field: Field) -> CommandTable<Self> {
        let field = self.resolve_field(id, field);
        let block_type = self.block_type(id).unwrap_or(BlockType::Text);
        let mut table = CommandTable::new();

        if field.accepts_commands() {
            self.push_command_mode(&mut table, id, field);
        }

        table.push(
            KeyCommand::new(Key::Enter, "line break", move |editor: &mut Self| {
                editor.insert_line_break(id, field);
            })
            .with_modifiers(Modifiers::SHIFT)
            .when(move |editor: &Self| !editor.command_active(id, field)),
        );

        if block_type.is_form() {
            table.push(
                KeyCommand::new(Key::Enter, "new block after", move |editor: &mut Self| {
                    editor.insert_block_after(id);
                })
                .with_modifiers(Modifiers::NONE),
            );
            self.push_field_navigation(&mut table, id, field);
        } else {
            table.push(
                KeyCommand::new(Key::Enter, "split block", move |editor: &mut Self| {
                    editor.split_block(id);
                })
                .with_modifiers(Modifiers::NONE),
            );
            table.push(
                KeyCommand::new(Key::Backspace, "delete or merge", move |editor: &mut Self| {
                    editor.apply_backspace(id);
                })
                .with_modifiers(Modifiers::NONE)
                .when(move |editor: &Self| {
                    !editor.command_active(id, Field::Content)
                        && editor.backspace_plan(id) != BackspacePlan::Native
                }),
            );
        }

        if field != Field::Description {
            table.push(
                KeyCommand::new(Key::ArrowUp, "previous block", move |editor: &mut Self| {
                    editor.navigate_to_previous(id, field);
                })
                .with_modifiers(Modifiers::NONE)
                .when(move |editor: &Self| editor.can_leave_upwards(id, field)),
            );
        }
        if field != Field::Label {
            table.push(
                KeyCommand::new(Key::ArrowDown, "next block", move |editor: &mut Self| {
                    editor.navigate_to_next(id, field);
                })
                .with_modifiers(Modifiers::NONE)
                .when(move |editor: &Self| editor.can_leave_downwards(id, field)),
            );
        }
        table
    }

    fn push_command_mode(&self, table: &mut CommandTable<Self>, id: BlockId, field: Field) {
        let active = move |editor: &Self| editor.command_active(id, field);
        table.push(
            KeyCommand::new(Key::ArrowDown, "command: next item", move |editor: &mut Self| {
                editor.move_command_selection(id, field, 1);
            })
            .with_modifiers(Modifiers::NONE)
            .when(active),
        );
        table.push(
            KeyCommand::new(Key::ArrowUp, "command: previous item", move |editor: &mut Self| {
                editor.move_command_selection(id, field, -1);
            })
            .with_modifiers(Modifiers::NONE)
            .when(active),
        );
        table.push(
            KeyCommand::new(Key::Enter, "command: commit", move |editor: &mut Self| {
                editor.commit_command(id, field, None);
            })
            .with_modifiers(Modifiers::NONE)
            .when(active),
        );
        table.push(
            KeyCommand::new(Key::Enter, "command: no line break", |_: &mut Self| {})
                .with_modifiers(Modifiers::SHIFT)
                .when(active),
        );
        table.push(
            KeyCommand::new(Key::Escape, "command: keep text", move |editor: &mut Self| {
                editor.escape_command(id, field);
            })
            .when(active),
        );
        for modifiers in [Modifiers::CTRL, Modifiers::META] {
            table.push(
                KeyCommand::new(Key::Backspace, "command: cancel", move |editor: &mut Self| {
                    editor.cancel_command(id, field);
                })
                .with_modifiers(modifiers)
                .when(active),
            );
        }
        table.push(
            KeyCommand::new(
                Key::Character(self.config.commands.trigger.clone()),
                "command: open",
                move |editor: &mut Self| {
                    editor.open_command(id, field);
                },
            )
            .when(move |editor: &Self| {
                !editor.command_active(id, field)
                    && editor
                        .field_element(id, field)
                        .is_some_and(|element| element.caret_offset() == Some(0))
            }),
        );
    }

    fn push_field_navigation(&self, table: &mut CommandTable<Self>, id: BlockId, field: Field) {
        let (Some(label), Some(description)) = (
            self.field_element(id, Field::Label),
            self.field_element(id, Field::Description),
        ) else {
            return;
        };
        let geometry = &self.config.geometry;
        match field {
            Field::Label => table.push(field_navigation_down(label, description, geometry)),
            Field::Description => table.push(field_navigation_up(description, label, geometry)),
            Field::Content => {}
        }
    }

    /// Input event in a field: feed command mode, or sync text to the store
    pub fn handle_input(&mut self, id: BlockId, field: Field) -> InputOutcome {
        let field = self.resolve_field(id, field);
        let Some(element) = self.field_element(id, field) else {
            log::warn!("Input for block {id} which is not rendered");
            return InputOutcome::Ignored;
        };
        if let Some(session) = self.sessions.get_mut(&(id, field))
            && session.is_active()
        {
            let outcome = session.handle_input(&element);
            if outcome == InputOutcome::Cancelled {
                self.sync_field(id, field, &element);
            }
            return outcome;
        }
        self.sync_field(id, field, &element);
        InputOutcome::Ignored
    }

    /// Run auto-exits scheduled by input handling. Returns how many ran.
    pub fn run_pending_exits(&mut self) -> usize {
        let due: Vec<(BlockId, Field)> = self
            .sessions
            .iter()
            .filter(|(_, session)| session.has_pending_exit())
            .map(|(key, _)| *key)
            .collect();
        let mut ran = 0;
        for (id, field) in due {
            let Some(element) = self.field_element(id, field) else {
                continue;
            };
            if let Some(session) = self.sessions.get_mut(&(id, field))
                && session.run_pending(&element)
            {
                ran += 1;
                self.sync_field(id, field, &element);
            }
        }
        ran
    }

    fn sync_field(&mut self, id: BlockId, field: Field, element: &D::Element) {
        let text = element.text_content();
        let Some(record) = self.store.record(id) else {
            return;
        };
        let action = match field {
            Field::Description => {
                if record.property("description") == Some(text.as_str()) {
                    return;
                }
                BlockAction::UpdateField {
                    id,
                    field: "description".to_string(),
                    value: text,
                }
            }
            Field::Content | Field::Label => {
                if record.content == text {
                    return;
                }
                BlockAction::UpdateContent { id, content: text }
            }
        };
        self.store.dispatch(action);
    }

    fn open_command(&mut self, id: BlockId, field: Field) {
        let Some(element) = self.field_element(id, field) else {
            return;
        };
        let session = self
            .sessions
            .entry((id, field))
            .or_insert_with(|| CommandSession::new(&self.config.commands));
        if !session.try_activate(&element) {
            log::debug!("Trigger in block {id} not at offset 0; typed as text");
        }
    }

    fn move_command_selection(&mut self, id: BlockId, field: Field, delta: isize) {
        if let Some(session) = self.sessions.get_mut(&(id, field)) {
            session.move_selection(delta);
        }
    }

    fn escape_command(&mut self, id: BlockId, field: Field) {
        let Some(element) = self.field_element(id, field) else {
            return;
        };
        if let Some(session) = self.sessions.get_mut(&(id, field)) {
            session.escape(&element);
            self.sync_field(id, field, &element);
        }
    }

    fn cancel_command(&mut self, id: BlockId, field: Field) {
        let Some(element) = self.field_element(id, field) else {
            return;
        };
        if let Some(session) = self.sessions.get_mut(&(id, field)) {
            session.cleanup(&element);
            self.sync_field(id, field, &element);
        }
    }

    /// Commit a command in `field`: the highlighted one, or `selected`
    /// when the menu was clicked. Returns the structural decision taken.
    pub fn commit_command(
        &mut self,
        id: BlockId,
        field: Field,
        selected: Option<BlockType>,
    ) -> Option<CommitDecision> {
        let field = self.resolve_field(id, field);
        let element = self.field_element(id, field)?;
        let field_type = self.block_type(id)?;
        let session = self.sessions.get_mut(&(id, field))?;
        let Some(selected) =
            selected.or_else(|| session.selected_command().map(|command| command.block_type))
        else {
            // Nothing matches the query: behave like Escape
            session.escape(&element);
            self.sync_field(id, field, &element);
            return None;
        };
        let decision = session.commit(&element, field_type, selected)?;
        self.sync_field(id, field, &element);

        match decision {
            CommitDecision::StayPut => {}
            CommitDecision::ReplaceCurrent { block_type } => {
                if self
                    .store
                    .dispatch(BlockAction::Replace { id, block_type })
                    .is_some()
                {
                    self.sessions.retain(|(block, _), _| *block != id);
                    self.focus.on_slash_command_block(id, block_type.into());
                }
            }
            CommitDecision::InsertAfter { block_type } => {
                let created = self.store.dispatch(BlockAction::InsertAfter {
                    after: id,
                    block_type,
                    content: String::new(),
                });
                if let Some(created) = created {
                    self.focus.on_slash_command_block(created, block_type.into());
                }
            }
        }
        Some(decision)
    }

    fn split_block(&mut self, id: BlockId) {
        let Some(element) = self.field_element(id, Field::Content) else {
            return;
        };
        let split = split_at_caret(&element);
        let moves_text = split.moves_text();
        // The tail lives only in the field until the new block holds it
        let Some(created) = self.store.dispatch(BlockAction::InsertAfter {
            after: id,
            block_type: BlockType::Text,
            content: split.after,
        }) else {
            log::warn!("Store refused to split block {id}");
            return;
        };
        self.store.dispatch(BlockAction::UpdateContent {
            id,
            content: split.before,
        });
        if moves_text {
            self.focus.on_block_split(created);
        } else {
            self.focus.on_block_created(created, FocusOptions::new());
        }
    }

    /// Hard line break at the caret. Written as a `\n` text character: a
    /// native contenteditable break would be a `<br>` or `<div>` that the
    /// text model never sees.
    fn insert_line_break(&mut self, id: BlockId, field: Field) {
        let Some(element) = self.field_element(id, field) else {
            return;
        };
        let text = element.text_content();
        let caret = element.caret_offset().unwrap_or_else(|| char_len(&text));
        let (before, after) = split_at_char(&text, caret);
        let broken = format!("{before}\n{after}");
        let written = element
            .replace_with_plain_text(&broken)
            .and_then(|()| place_caret_at_offset(&element, caret + 1));
        if let Err(e) = written {
            log::warn!("Could not break line in block {id}: {e}");
            return;
        }
        self.sync_field(id, field, &element);
    }

    fn insert_block_after(&mut self, id: BlockId) {
        if let Some(created) = self.store.dispatch(BlockAction::InsertAfter {
            after: id,
            block_type: BlockType::Text,
            content: String::new(),
        }) {
            self.focus.on_block_created(created, FocusOptions::new());
        }
    }

    /// What Backspace would do in block `id` right now
    pub fn backspace_plan(&self, id: BlockId) -> BackspacePlan<BlockId> {
        let Some(current) = self.block_type(id) else {
            return BackspacePlan::Native;
        };
        let element = self.field_element(id, Field::Content);
        let content = element.as_ref().map(|element| element.text_content());
        let caret = element.as_ref().and_then(|element| element.caret_offset());
        let previous = self.store.previous(id).map(|previous| PreviousBlock {
            id: previous,
            mergeable: current.is_mergeable()
                && self
                    .block_type(previous)
                    .is_some_and(BlockType::is_mergeable),
        });
        plan_backspace(content.as_deref(), caret, previous)
    }

    fn apply_backspace(&mut self, id: BlockId) {
        match self.backspace_plan(id) {
            BackspacePlan::DeleteAndFocusPrevious { previous } => {
                if self.store.dispatch(BlockAction::Remove { id }).is_none() {
                    return;
                }
                self.forget(id);
                self.focus.focus_block_for_event(
                    previous,
                    FocusEvent::Removed,
                    FocusOptions::at_end().deferred(true),
                );
            }
            BackspacePlan::MergeWithPrevious { previous } => {
                let current = self
                    .field_element(id, Field::Content)
                    .map(|element| element.text_content())
                    .unwrap_or_default();
                let Some(previous_content) = self
                    .store
                    .record(previous)
                    .map(|record| record.content.clone())
                else {
                    return;
                };
                let merge = compute_merge(&previous_content, &current);
                if self.store.dispatch(BlockAction::Remove { id }).is_none() {
                    return;
                }
                self.store.dispatch(BlockAction::UpdateContent {
                    id: previous,
                    content: merge.merged_content,
                });
                self.forget(id);
                // The previous block re-renders with its new content first
                self.focus
                    .on_block_merged(previous, merge.junction_offset, true);
            }
            BackspacePlan::Native => {}
        }
    }

    fn can_leave_upwards(&self, id: BlockId, field: Field) -> bool {
        if self.command_active(id, field) || self.store.previous(id).is_none() {
            return false;
        }
        self.field_element(id, field)
            .is_some_and(|element| is_at_first_visual_line(&element, &self.config.geometry))
    }

    fn can_leave_downwards(&self, id: BlockId, field: Field) -> bool {
        if self.command_active(id, field) || self.store.next(id).is_none() {
            return false;
        }
        self.field_element(id, field)
            .is_some_and(|element| is_at_last_visual_line(&element, &self.config.geometry))
    }

    fn navigate_to_previous(&mut self, id: BlockId, field: Field) {
        let Some(target) = self.store.previous(id) else {
            return;
        };
        let column = self.column_of(id, field);
        let target_field = self.bottom_field(target);
        if self.enter_block(target)
            && let Some(element) = self.field_element(target, target_field)
            && let Err(error) = navigate_entering_from_below(&element, column)
        {
            log::warn!("Could not enter block {target} from below: {error}");
        }
    }

    fn navigate_to_next(&mut self, id: BlockId, field: Field) {
        let Some(target) = self.store.next(id) else {
            return;
        };
        let column = self.column_of(id, field);
        let target_field = self.top_field(target);
        if self.enter_block(target)
            && let Some(element) = self.field_element(target, target_field)
            && let Err(error) = navigate_entering_from_above(&element, column)
        {
            log::warn!("Could not enter block {target} from above: {error}");
        }
    }

    fn column_of(&self, id: BlockId, field: Field) -> usize {
        self.field_element(id, field)
            .map_or(0, |element| horizontal_position_of(&element, &self.config.geometry))
    }

    fn enter_block(&mut self, target: BlockId) -> bool {
        let mut options = FocusOptions::new();
        if let Some(block_type) = self.block_type(target) {
            options = options.with_kind(BlockKind::from(block_type));
        }
        self.focus.on_navigation(target, options)
    }

    /// Change a block's type in place, keeping its content
    pub fn change_type(&mut self, id: BlockId, block_type: BlockType) -> bool {
        if self
            .store
            .dispatch(BlockAction::ChangeType { id, block_type })
            .is_none()
        {
            return false;
        }
        self.sessions.retain(|(block, _), _| *block != id);
        self.focus.focus_block_for_event(
            id,
            FocusEvent::Direct,
            FocusOptions::at_end()
                .with_kind(block_type.into())
                .deferred(true),
        )
    }

    /// Move a block (drag and drop) and give focus back afterwards
    pub fn reorder(&mut self, id: BlockId, to_index: usize) -> bool {
        if self
            .store
            .dispatch(BlockAction::Move { id, to_index })
            .is_none()
        {
            return false;
        }
        self.focus.restore_last_focused()
    }

    /// A block component unmounted
    pub fn forget(&mut self, id: BlockId) {
        self.sessions.retain(|(block, _), _| *block != id);
        self.focus.forget_block(id);
    }

    pub fn advance_frame(&mut self) -> usize {
        self.focus.advance_frame()
    }

    pub fn render_committed(&mut self) -> usize {
        self.focus.render_committed()
    }
}
