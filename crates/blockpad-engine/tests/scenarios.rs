//! End-to-end editing scenarios against the headless surface.

use blockpad_engine::caret::{navigate_entering_from_above, navigate_entering_from_below, place_caret_at_offset};
use blockpad_engine::command::{CommandSession, CommitDecision, InputOutcome};
use blockpad_engine::config::{CommandConfig, GeometryConfig};
use blockpad_engine::geometry::{horizontal_position_of, is_at_first_visual_line, is_at_last_visual_line};
use blockpad_engine::structure::{compute_merge, split_at_caret};
use blockpad_engine::surface::headless::{HeadlessDom, HeadlessElement, LayoutMetrics};
use blockpad_engine::{
    BlockEditor, BlockId, BlockList, BlockRecord, BlockStore, BlockType, DomElement, EditorConfig,
    Field, Key, KeyPress,
};
use pretty_assertions::assert_eq;
use rstest::rstest;

type Editor = BlockEditor<HeadlessDom, BlockList>;

fn editor(records: Vec<BlockRecord>) -> Editor {
    let dom = HeadlessDom::new();
    let store = BlockList::from_records(records);
    dom.render(store.records());
    BlockEditor::new(dom, store, EditorConfig::default())
}

fn text(id: u64, content: &str) -> BlockRecord {
    BlockRecord::new(BlockId(id), BlockType::Text, content)
}

fn field(editor: &Editor, id: u64) -> HeadlessElement {
    editor
        .field_element(BlockId(id), Field::Content)
        .expect("block is rendered")
}

fn settle(editor: &mut Editor) {
    editor.focus().dom().render(editor.store().records());
    editor.advance_frame();
    editor.advance_frame();
}

fn editable(content: &str, caret: usize) -> HeadlessElement {
    let dom = HeadlessDom::new();
    let element = dom.create_editable(content);
    element.place_caret(caret);
    element
}

#[test]
fn caret_in_first_text_line() {
    let config = GeometryConfig::default();
    let element = editable("foo\nbar", 1);
    assert!(is_at_first_visual_line(&element, &config));
    assert!(!is_at_last_visual_line(&element, &config));
}

#[test]
fn caret_in_last_text_line() {
    let config = GeometryConfig::default();
    let element = editable("foo\nbar", 5);
    assert!(!is_at_first_visual_line(&element, &config));
    assert!(is_at_last_visual_line(&element, &config));
}

#[test]
fn single_line_content_is_first_and_last_line_at_every_offset() {
    let config = GeometryConfig::default();
    for content in ["x", "hello", "a line with some words"] {
        for caret in 0..=content.chars().count() {
            let element = editable(content, caret);
            assert!(is_at_first_visual_line(&element, &config), "{content:?} @ {caret}");
            assert!(is_at_last_visual_line(&element, &config), "{content:?} @ {caret}");
        }
    }
}

#[test]
fn empty_element_is_first_and_last_line() {
    let config = GeometryConfig::default();
    let element = editable("", 0);
    assert!(is_at_first_visual_line(&element, &config));
    assert!(is_at_last_visual_line(&element, &config));
}

#[rstest]
#[case("foo\nbar")]
#[case("one\ntwo\nthree")]
#[case("a long unbroken line that will wrap at forty columns for sure")]
fn horizontal_position_at_offset_zero_is_zero(#[case] content: &str) {
    let element = editable(content, 0);
    assert_eq!(horizontal_position_of(&element, &GeometryConfig::default()), 0);
}

#[test]
fn soft_wrapped_paragraph_navigates_by_visual_row() {
    let config = GeometryConfig::default();
    let dom = HeadlessDom::with_metrics(LayoutMetrics {
        wrap_columns: 10,
        ..LayoutMetrics::default()
    });
    // Visual rows: "wrapping t" / "ext across" / " rows"
    let element = dom.create_editable("wrapping text across rows");
    element.place_caret(14);
    assert!(!is_at_first_visual_line(&element, &config));
    assert!(!is_at_last_visual_line(&element, &config));
    assert_eq!(horizontal_position_of(&element, &config), 4);

    element.place_caret(22);
    assert!(is_at_last_visual_line(&element, &config));
    assert_eq!(horizontal_position_of(&element, &config), 2);
}

#[rstest]
#[case("", 0)]
#[case("", 4)]
#[case("hello", 3)]
#[case("hello", 50)]
#[case("multi\nline\ncontent", 8)]
fn place_then_read_returns_clamped_offset(#[case] content: &str, #[case] offset: usize) {
    let element = editable(content, 0);
    place_caret_at_offset(&element, offset).unwrap();
    assert_eq!(
        element.caret_offset(),
        Some(offset.min(content.chars().count()))
    );
}

#[test]
fn entering_next_block_from_end_of_previous() {
    let editor = editor(vec![text(1, "foo"), text(2, "bar")]);
    let first = field(&editor, 1);
    first.place_caret(3);
    let column = horizontal_position_of(&first, &editor.config().geometry);

    let second = field(&editor, 2);
    navigate_entering_from_above(&second, column).unwrap();
    assert!(second.is_focused());
    assert_eq!(second.caret_offset(), Some(3));
}

#[test]
fn entering_empty_block_from_below_focuses_at_start() {
    let editor = editor(vec![text(1, ""), text(2, "below")]);
    let target = field(&editor, 1);
    navigate_entering_from_below(&target, 4).unwrap();
    assert!(target.is_focused());
    assert_eq!(target.caret_offset(), Some(0));
}

#[rstest]
#[case("", "")]
#[case("abc", "def")]
#[case("", "tail")]
#[case("héllo ", "wörld")]
fn merge_junction_is_length_of_previous(#[case] previous: &str, #[case] current: &str) {
    let merge = compute_merge(previous, current);
    assert_eq!(merge.junction_offset, previous.chars().count());
    assert_eq!(merge.merged_content, format!("{previous}{current}"));
}

#[rstest]
#[case("split here", 5)]
#[case("", 0)]
#[case("end", 3)]
#[case("two\nlines", 2)]
fn split_then_merge_reconstructs_content(#[case] content: &str, #[case] caret: usize) {
    let element = editable(content, caret);
    let split = split_at_caret(&element);
    assert_eq!(compute_merge(&split.before, &split.after).merged_content, content);
}

#[rstest]
#[case("h")]
#[case("head")]
#[case("multiple ch")]
fn query_equals_typed_text(#[case] typed: &str) {
    let element = editable("", 0);
    element.focus().unwrap();
    element.place_caret(0);
    let mut session = CommandSession::new(&CommandConfig::default());
    assert!(session.try_activate(&element));
    for c in typed.chars() {
        element.type_text(&c.to_string());
        session.handle_input(&element);
    }
    assert_eq!(session.query(), Some(typed));
}

#[test]
fn keep_text_exit_reconstructs_symbol_query_original() {
    let element = editable("original", 0);
    element.focus().unwrap();
    element.place_caret(0);
    let mut session = CommandSession::new(&CommandConfig::default());
    session.try_activate(&element);
    element.type_text("quer");
    session.handle_input(&element);
    session.escape(&element);
    assert_eq!(element.text_content(), "/queroriginal");
}

#[rstest]
#[case("qqqq", InputOutcome::Updated)]
#[case("qqqqq", InputOutcome::ExitPending)]
fn auto_exit_needs_five_unmatched_characters(#[case] typed: &str, #[case] expected: InputOutcome) {
    let element = editable("", 0);
    element.focus().unwrap();
    element.place_caret(0);
    let mut session = CommandSession::new(&CommandConfig::default());
    session.try_activate(&element);
    let mut outcome = InputOutcome::Ignored;
    for c in typed.chars() {
        element.type_text(&c.to_string());
        outcome = session.handle_input(&element);
    }
    assert_eq!(outcome, expected);
}

#[test]
fn auto_exit_through_editor_keeps_text_and_syncs_store() {
    let mut editor = editor(vec![text(1, "tail")]);
    let element = field(&editor, 1);
    element.focus().unwrap();
    element.place_caret(0);
    editor.handle_keydown(BlockId(1), Field::Content, &KeyPress::plain(Key::character("/")));
    for c in "qqqqq".chars() {
        element.type_text(&c.to_string());
        editor.handle_input(BlockId(1), Field::Content);
    }
    assert_eq!(editor.run_pending_exits(), 1);
    assert_eq!(editor.store().records()[0].content, "/qqqqqtail");
    assert_eq!(element.caret_offset(), Some(6));
}

fn open_command_and_type(editor: &mut Editor, id: u64, typed: &str) {
    let element = field(editor, id);
    element.focus().unwrap();
    element.place_caret(0);
    editor.handle_keydown(BlockId(id), Field::Content, &KeyPress::plain(Key::character("/")));
    for c in typed.chars() {
        element.type_text(&c.to_string());
        editor.handle_input(BlockId(id), Field::Content);
    }
}

#[test]
fn same_type_command_on_empty_block_stays_put() {
    let mut editor = editor(vec![text(1, "")]);
    open_command_and_type(&mut editor, 1, "text");
    let outcome = editor.handle_keydown(BlockId(1), Field::Content, &KeyPress::plain(Key::Enter));
    assert!(outcome.prevents_default());

    assert_eq!(editor.store().records().len(), 1);
    assert_eq!(editor.store().records()[0].block_type, BlockType::Text);
    let element = field(&editor, 1);
    assert!(element.is_focused());
    assert_eq!(element.text_content(), "");
    assert!(!editor.command_active(BlockId(1), Field::Content));
}

#[test]
fn same_type_command_on_content_inserts_one_block_after() {
    let mut editor = editor(vec![text(1, "Some content")]);
    open_command_and_type(&mut editor, 1, "text");
    let decision = editor.commit_command(BlockId(1), Field::Content, None);
    assert_eq!(
        decision,
        Some(CommitDecision::InsertAfter {
            block_type: BlockType::Text
        })
    );

    let records = editor.store().records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].content, "Some content");
    assert_eq!(records[1].block_type, BlockType::Text);
    assert_eq!(records[1].content, "");
    assert!(!field(&editor, 1).is_focused());

    settle(&mut editor);
    assert_eq!(editor.focus().dom().focused_block(), Some(records_id(&editor, 1)));
}

fn records_id(editor: &Editor, index: usize) -> BlockId {
    editor.store().order()[index]
}

#[test]
fn whitespace_only_block_is_deleted_not_merged() {
    let mut editor = editor(vec![text(1, "previous"), text(2, "   \n\t  ")]);
    let element = field(&editor, 2);
    element.focus().unwrap();
    element.place_caret(0);

    let outcome = editor.handle_keydown(BlockId(2), Field::Content, &KeyPress::plain(Key::Backspace));
    assert!(outcome.prevents_default());
    let contents: Vec<_> = editor
        .store()
        .records()
        .iter()
        .map(|record| record.content.clone())
        .collect();
    assert_eq!(contents, vec!["previous"]);

    settle(&mut editor);
    let previous = field(&editor, 1);
    assert!(previous.is_focused());
    assert_eq!(previous.caret_offset(), Some(8));
}

#[test]
fn rapid_delete_before_deferred_focus_is_harmless() {
    let mut editor = editor(vec![text(1, "abc")]);
    let element = field(&editor, 1);
    element.focus().unwrap();
    element.place_caret(3);
    editor.handle_keydown(BlockId(1), Field::Content, &KeyPress::plain(Key::Enter));
    let created = records_id(&editor, 1);
    editor.forget(created);
    settle(&mut editor);
    assert_eq!(editor.focus().pending_deferred(), 0);
    assert!(!editor.focus().is_pending_start(created));
}
