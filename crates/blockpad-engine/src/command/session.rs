//! Per-field command mode.
//!
//! Typing the trigger at offset 0 of a field opens command mode: the
//! current text is snapshotted, an indicator holding the trigger symbol is
//! spliced in front of it, and every following input re-derives the query
//! from the indicator. The session leaves command mode in exactly one of
//! three ways:
//!
//! - **keep text**: `symbol + query + original` becomes plain text, caret
//!   after the typed command (Escape, auto-exit)
//! - **restore**: the original text comes back untouched (cleanup, commit)
//! - **reset only**: the indicator already vanished, so nothing is written
//!
//! The indicator is the only markup the session ever inserts and it always
//! removes it itself, through [`DomElement::replace_with_plain_text`].

use crate::caret::place_caret_at_offset;
use crate::command::{SlashCommand, filter_commands};
use crate::config::CommandConfig;
use crate::model::BlockType;
use crate::surface::{DomElement, SurfaceError};
use crate::text::char_len;

/// Structural outcome of committing a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitDecision {
    /// Same type picked on an empty field: nothing to do
    StayPut,
    /// Empty field, different type: convert this block in place
    ReplaceCurrent { block_type: BlockType },
    /// Field has content: add a new block after it
    InsertAfter { block_type: BlockType },
}

impl CommitDecision {
    /// Whether leaving command mode for this decision blurs the field
    pub fn blurs(self) -> bool {
        !matches!(self, CommitDecision::StayPut)
    }
}

/// Decide what committing `selected` does to a field whose pre-command
/// content was `original_content`.
pub fn decide_commit(
    original_content: &str,
    current: BlockType,
    selected: BlockType,
) -> CommitDecision {
    let empty = original_content.trim().is_empty();
    match (empty, current == selected) {
        (true, true) => CommitDecision::StayPut,
        (true, false) => CommitDecision::ReplaceCurrent {
            block_type: selected,
        },
        (false, _) => CommitDecision::InsertAfter {
            block_type: selected,
        },
    }
}

/// What an input event did to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputOutcome {
    /// Not in command mode
    Ignored,
    /// Query re-derived
    Updated,
    /// Command mode ended and the original text is back
    Cancelled,
    /// Long unmatched query; call [`CommandSession::run_pending`] next
    ExitPending,
}

#[derive(Debug, Clone, PartialEq)]
enum SessionState {
    Idle,
    Active {
        query: String,
        original_content: String,
        selected_index: usize,
    },
}

/// Command-mode state of one editable field
#[derive(Debug, Clone)]
pub struct CommandSession {
    symbol: String,
    placeholder: String,
    auto_exit_query_len: usize,
    catalogue: Vec<SlashCommand>,
    state: SessionState,
    pending_exit: bool,
}

impl CommandSession {
    pub fn new(config: &CommandConfig) -> Self {
        Self {
            symbol: config.trigger.clone(),
            placeholder: config.placeholder.clone(),
            auto_exit_query_len: config.auto_exit_query_len,
            catalogue: config.catalogue.clone(),
            state: SessionState::Idle,
            pending_exit: false,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, SessionState::Active { .. })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn query(&self) -> Option<&str> {
        match &self.state {
            SessionState::Active { query, .. } => Some(query),
            SessionState::Idle => None,
        }
    }

    /// Field content as it was when command mode opened
    pub fn original_content(&self) -> Option<&str> {
        match &self.state {
            SessionState::Active {
                original_content, ..
            } => Some(original_content),
            SessionState::Idle => None,
        }
    }

    pub fn selected_index(&self) -> usize {
        match &self.state {
            SessionState::Active { selected_index, .. } => *selected_index,
            SessionState::Idle => 0,
        }
    }

    pub fn has_pending_exit(&self) -> bool {
        self.pending_exit
    }

    /// Commands matching the current query, in catalogue order
    pub fn filtered(&self) -> Vec<&SlashCommand> {
        match &self.state {
            SessionState::Active { query, .. } => filter_commands(&self.catalogue, query),
            SessionState::Idle => Vec::new(),
        }
    }

    pub fn selected_command(&self) -> Option<&SlashCommand> {
        self.filtered().get(self.selected_index()).copied()
    }

    /// Enter command mode if the caret is at offset 0 of `field`.
    ///
    /// Returns `false` when the trigger should be typed as ordinary text.
    pub fn try_activate<E: DomElement>(&mut self, field: &E) -> bool {
        if self.is_active() || field.caret_offset() != Some(0) {
            return false;
        }
        let original_content = field.text_content();
        if let Err(error) = field.insert_command_indicator(&self.symbol, &self.placeholder) {
            log::warn!("Could not open command mode: {error}");
            return false;
        }
        log::debug!("Command mode opened over {} chars", char_len(&original_content));
        self.state = SessionState::Active {
            query: String::new(),
            original_content,
            selected_index: 0,
        };
        self.pending_exit = false;
        true
    }

    /// Re-derive the query after an input event on `field`
    pub fn handle_input<E: DomElement>(&mut self, field: &E) -> InputOutcome {
        if !self.is_active() {
            return InputOutcome::Ignored;
        }
        let Some(indicator) = field.command_indicator_text() else {
            log::warn!("Command indicator vanished; leaving command mode");
            self.reset();
            return InputOutcome::Cancelled;
        };
        let Some(query) = indicator.strip_prefix(self.symbol.as_str()) else {
            // Deleted through the trigger symbol
            self.cleanup(field);
            return InputOutcome::Cancelled;
        };

        let query = query.to_string();
        let matches = filter_commands(&self.catalogue, &query).len();
        let long_enough = char_len(&query) >= self.auto_exit_query_len;
        if let SessionState::Active {
            query: current,
            selected_index,
            ..
        } = &mut self.state
        {
            *current = query;
            *selected_index = (*selected_index).min(matches.saturating_sub(1));
        }

        if long_enough && matches == 0 {
            self.pending_exit = true;
            return InputOutcome::ExitPending;
        }
        InputOutcome::Updated
    }

    /// Run an exit scheduled by [`Self::handle_input`]. Returns whether one ran.
    pub fn run_pending<E: DomElement>(&mut self, field: &E) -> bool {
        if !self.pending_exit {
            return false;
        }
        self.pending_exit = false;
        if !self.is_active() {
            return false;
        }
        self.exit(field, true, false);
        true
    }

    /// Clamp-move the highlighted command
    pub fn move_selection(&mut self, delta: isize) {
        let last = self.filtered().len().saturating_sub(1);
        if let SessionState::Active { selected_index, .. } = &mut self.state {
            *selected_index = selected_index.saturating_add_signed(delta).min(last);
        }
    }

    /// Escape: leave command mode keeping what was typed
    pub fn escape<E: DomElement>(&mut self, field: &E) {
        self.exit(field, true, false);
    }

    /// Restore the original text and leave command mode
    pub fn cleanup<E: DomElement>(&mut self, field: &E) {
        self.exit(field, false, false);
    }

    /// Leave command mode for a commit of `selected` on a field of type
    /// `field_type`. Returns `None` when command mode was not active.
    pub fn commit<E: DomElement>(
        &mut self,
        field: &E,
        field_type: BlockType,
        selected: BlockType,
    ) -> Option<CommitDecision> {
        let decision = decide_commit(self.original_content()?, field_type, selected);
        log::debug!("Command commit: {decision:?}");
        self.exit(field, false, decision.blurs());
        Some(decision)
    }

    /// Leave command mode.
    ///
    /// `keep_text` turns the typed command into plain text in front of the
    /// original content; otherwise the original content is restored.
    pub fn exit<E: DomElement>(&mut self, field: &E, keep_text: bool, blur: bool) {
        let state = std::mem::replace(&mut self.state, SessionState::Idle);
        self.pending_exit = false;
        let SessionState::Active {
            query,
            original_content,
            ..
        } = state
        else {
            return;
        };
        if field.command_indicator_text().is_none() {
            log::debug!("Command indicator already gone; nothing to restore");
            return;
        }

        let result = if keep_text {
            let command_text = format!("{}{}", self.symbol, query);
            let text = format!("{command_text}{original_content}");
            field
                .replace_with_plain_text(&text)
                .and_then(|()| self.settle_caret(field, char_len(&command_text), blur))
        } else {
            field
                .replace_with_plain_text(&original_content)
                .and_then(|()| self.settle_caret(field, 0, blur))
        };
        match result {
            Ok(()) => field.dispatch_input(),
            Err(error) => log::warn!("Leaving command mode failed: {error}"),
        }
    }

    fn settle_caret<E: DomElement>(
        &self,
        field: &E,
        offset: usize,
        blur: bool,
    ) -> Result<(), SurfaceError> {
        if blur {
            field.blur();
            Ok(())
        } else {
            place_caret_at_offset(field, offset)
        }
    }

    fn reset(&mut self) {
        self.state = SessionState::Idle;
        self.pending_exit = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::headless::{HeadlessDom, HeadlessElement};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn session() -> CommandSession {
        CommandSession::new(&CommandConfig::default())
    }

    fn active(content: &str) -> (HeadlessDom, HeadlessElement, CommandSession) {
        let dom = HeadlessDom::new();
        let field = dom.create_editable(content);
        field.focus().unwrap();
        field.place_caret(0);
        let mut session = session();
        assert!(session.try_activate(&field));
        (dom, field, session)
    }

    fn type_query(field: &HeadlessElement, session: &mut CommandSession, text: &str) -> InputOutcome {
        let mut outcome = InputOutcome::Ignored;
        for c in text.chars() {
            field.type_text(&c.to_string());
            outcome = session.handle_input(field);
        }
        outcome
    }

    #[test]
    fn test_activation_requires_caret_at_start() {
        let dom = HeadlessDom::new();
        let field = dom.create_editable("hello");
        field.place_caret(2);
        let mut session = session();
        assert!(!session.try_activate(&field));
        assert!(!session.is_active());
        assert_eq!(field.command_indicator_text(), None);
    }

    #[test]
    fn test_activation_snapshots_content_and_places_caret_after_symbol() {
        let (_dom, field, session) = active("hello");
        assert_eq!(session.original_content(), Some("hello"));
        assert_eq!(session.query(), Some(""));
        assert_eq!(field.text_content(), "/hello");
        assert_eq!(field.caret_offset(), Some(1));
    }

    #[test]
    fn test_query_tracks_typed_text() {
        let (_dom, field, mut session) = active("");
        assert_eq!(type_query(&field, &mut session, "head"), InputOutcome::Updated);
        assert_eq!(session.query(), Some("head"));
        let labels: Vec<_> = session.filtered().iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["Heading"]);
    }

    #[rstest]
    #[case("zzzz", InputOutcome::Updated)]
    #[case("zzzzz", InputOutcome::ExitPending)]
    #[case("multi", InputOutcome::Updated)]
    fn test_auto_exit_threshold(#[case] typed: &str, #[case] expected: InputOutcome) {
        let (_dom, field, mut session) = active("");
        assert_eq!(type_query(&field, &mut session, typed), expected);
    }

    #[test]
    fn test_auto_exit_keeps_typed_text_before_original() {
        let (dom, field, mut session) = active("tail");
        type_query(&field, &mut session, "zzzzz");
        assert!(session.run_pending(&field));
        assert!(!session.is_active());
        assert_eq!(field.text_content(), "/zzzzztail");
        assert_eq!(field.command_indicator_text(), None);
        assert_eq!(field.caret_offset(), Some(6));
        assert_eq!(dom.input_events(&field), 1);
        assert!(!session.run_pending(&field));
    }

    #[test]
    fn test_escape_reconstructs_symbol_query_original() {
        let (_dom, field, mut session) = active("body");
        type_query(&field, &mut session, "te");
        session.escape(&field);
        assert_eq!(field.text_content(), "/tebody");
        assert_eq!(field.caret_offset(), Some(3));
    }

    #[test]
    fn test_deleting_through_symbol_restores_original() {
        let (dom, field, mut session) = active("kept");
        type_query(&field, &mut session, "a");
        field.delete_backward();
        assert_eq!(session.handle_input(&field), InputOutcome::Updated);
        field.delete_backward();
        assert_eq!(session.handle_input(&field), InputOutcome::Cancelled);
        assert!(!session.is_active());
        assert_eq!(field.text_content(), "kept");
        assert_eq!(field.caret_offset(), Some(0));
        assert_eq!(dom.input_events(&field), 1);
    }

    #[test]
    fn test_missing_indicator_resets_without_writes() {
        let (dom, field, mut session) = active("x");
        field.set_text("rewritten");
        assert_eq!(session.handle_input(&field), InputOutcome::Cancelled);
        assert!(!session.is_active());
        assert_eq!(field.text_content(), "rewritten");
        assert_eq!(dom.input_events(&field), 0);
    }

    #[test]
    fn test_selection_is_clamped() {
        let (_dom, field, mut session) = active("");
        type_query(&field, &mut session, "multi");
        session.move_selection(-1);
        assert_eq!(session.selected_index(), 0);
        session.move_selection(1);
        session.move_selection(1);
        assert_eq!(session.selected_index(), 1);
        assert_eq!(
            session.selected_command().map(|c| c.label.as_str()),
            Some("Multiselect")
        );
    }

    #[test]
    fn test_narrowing_query_clamps_selection() {
        let (_dom, field, mut session) = active("");
        session.move_selection(4);
        assert_eq!(session.selected_index(), 4);
        type_query(&field, &mut session, "text");
        assert_eq!(session.selected_index(), 0);
    }

    #[rstest]
    #[case("", BlockType::Text, BlockType::Text, CommitDecision::StayPut)]
    #[case("  \n", BlockType::Heading, BlockType::Heading, CommitDecision::StayPut)]
    #[case(
        "",
        BlockType::Text,
        BlockType::ShortAnswer,
        CommitDecision::ReplaceCurrent { block_type: BlockType::ShortAnswer }
    )]
    #[case(
        "Some content",
        BlockType::Text,
        BlockType::Text,
        CommitDecision::InsertAfter { block_type: BlockType::Text }
    )]
    #[case(
        "Some content",
        BlockType::Text,
        BlockType::Heading,
        CommitDecision::InsertAfter { block_type: BlockType::Heading }
    )]
    fn test_decide_commit(
        #[case] original: &str,
        #[case] current: BlockType,
        #[case] selected: BlockType,
        #[case] expected: CommitDecision,
    ) {
        assert_eq!(decide_commit(original, current, selected), expected);
    }

    #[test]
    fn test_commit_same_type_on_empty_stays_focused() {
        let (_dom, field, mut session) = active("");
        type_query(&field, &mut session, "text");
        let decision = session.commit(&field, BlockType::Text, BlockType::Text);
        assert_eq!(decision, Some(CommitDecision::StayPut));
        assert!(field.is_focused());
        assert_eq!(field.text_content(), "");
    }

    #[test]
    fn test_commit_on_content_restores_and_blurs() {
        let (_dom, field, mut session) = active("Some content");
        type_query(&field, &mut session, "text");
        let decision = session.commit(&field, BlockType::Text, BlockType::Text);
        assert_eq!(
            decision,
            Some(CommitDecision::InsertAfter {
                block_type: BlockType::Text
            })
        );
        assert!(!field.is_focused());
        assert_eq!(field.text_content(), "Some content");
    }

    #[test]
    fn test_commit_when_idle_is_none() {
        let dom = HeadlessDom::new();
        let field = dom.create_editable("");
        let mut session = session();
        assert_eq!(session.commit(&field, BlockType::Text, BlockType::Text), None);
    }
}
