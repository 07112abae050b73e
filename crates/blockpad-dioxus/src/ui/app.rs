use blockpad_engine::command::InputOutcome;
use blockpad_engine::{
    BlockEditor, BlockId, BlockList, BlockRecord, BlockType, DomElement, EditorConfig,
    EditorDom, Field, KeyPress,
};
use dioxus::prelude::*;

use crate::platform::{self, AppDom};
use crate::ui::components::BlockView;

const BLOCKPAD_CSS: &str = include_str!("../assets/blockpad.css");

type Editor = BlockEditor<AppDom, BlockList>;

/// The open slash-command menu
#[derive(Debug, Clone, PartialEq)]
pub struct MenuState {
    pub id: BlockId,
    pub field: Field,
    pub items: Vec<(String, BlockType)>,
    pub selected: usize,
}

#[component]
pub fn App(config: EditorConfig, initial: Vec<BlockRecord>) -> Element {
    // The editor is never read reactively: the browser owns the text, and
    // only the block list below drives re-renders.
    let editor = use_signal(|| {
        BlockEditor::new(
            AppDom::default(),
            BlockList::from_records(initial.clone()),
            config.clone(),
        )
    });
    let blocks = use_signal(|| editor.peek().store().records().to_vec());
    let menu = use_signal(|| None::<MenuState>);
    let handle = EditorHandle {
        editor,
        blocks,
        menu,
    };

    // Runs after the block list reaches the DOM: fill editable fields from
    // the store, then run focus requests waiting on the render.
    use_effect(move || {
        let records = blocks.read().clone();
        handle.mounted(&records);
    });

    let records = blocks.read();
    rsx! {
        style { {BLOCKPAD_CSS} }
        div {
            class: "blockpad-editor",
            {records.iter().map(|record| {
                let id = record.id;
                rsx! {
                    BlockView {
                        key: "{id}",
                        record: record.clone(),
                        menu: menu.read().as_ref().filter(|menu| menu.id == id).cloned(),
                        on_keydown: move |(field, press): (Field, KeyPress)| handle.keydown(id, field, press),
                        on_input: move |field: Field| handle.input(id, field),
                        on_choose: move |(field, block_type): (Field, BlockType)| {
                            handle.choose(id, field, block_type)
                        },
                    }
                }
            })}
        }
    }
}

/// Signals shared by every block's event handlers
#[derive(Clone, Copy)]
struct EditorHandle {
    editor: Signal<Editor>,
    blocks: Signal<Vec<BlockRecord>>,
    menu: Signal<Option<MenuState>>,
}

impl EditorHandle {
    /// Returns whether the browser default should be suppressed
    fn keydown(self, id: BlockId, field: Field, press: KeyPress) -> bool {
        let mut editor = self.editor;
        let Ok(mut guard) = editor.try_write() else {
            log::debug!("Keydown in block {id} while the editor is busy");
            return false;
        };
        let version = guard.store().version();
        let disposition = guard.handle_keydown(id, field, &press);
        drop(guard);
        self.after_event(id, field, version);
        disposition.prevents_default()
    }

    fn input(self, id: BlockId, field: Field) {
        let mut editor = self.editor;
        // Synthetic input fired from inside a keydown handler finds the
        // editor borrowed; that path syncs the store itself.
        let Ok(mut guard) = editor.try_write() else {
            log::trace!("Nested input event for block {id}");
            return;
        };
        let outcome = guard.handle_input(id, field);
        drop(guard);
        self.refresh_menu(id, field);
        if outcome == InputOutcome::ExitPending {
            self.pump();
        }
    }

    fn choose(self, id: BlockId, field: Field, block_type: BlockType) {
        let mut editor = self.editor;
        let Ok(mut guard) = editor.try_write() else {
            return;
        };
        let version = guard.store().version();
        guard.commit_command(id, field, Some(block_type));
        drop(guard);
        self.after_event(id, field, version);
    }

    fn after_event(mut self, id: BlockId, field: Field, version_before: u64) {
        let records = {
            let editor = self.editor.peek();
            (editor.store().version() != version_before)
                .then(|| editor.store().records().to_vec())
        };
        if let Some(records) = records {
            sync_fields(&self.editor.peek());
            self.blocks.set(records);
        }
        self.refresh_menu(id, field);
        self.pump();
    }

    fn mounted(self, records: &[BlockRecord]) {
        let mut editor = self.editor;
        platform::mount_blocks(editor.peek().focus().dom(), records);
        sync_fields(&editor.peek());
        let ran = editor.write().render_committed();
        if ran > 0 {
            log::debug!("Ran {ran} focus request(s) after render");
        }
    }

    fn refresh_menu(mut self, id: BlockId, field: Field) {
        let state = {
            let editor = self.editor.peek();
            editor
                .session(id, field)
                .filter(|session| session.is_active())
                .map(|session| MenuState {
                    id,
                    field,
                    items: session
                        .filtered()
                        .into_iter()
                        .map(|command| (command.label.clone(), command.block_type))
                        .collect(),
                    selected: session.selected_index(),
                })
        };
        if *self.menu.peek() != state {
            self.menu.set(state);
        }
    }

    /// Advance deferred focus one animation frame at a time until none is left
    fn pump(self) {
        let mut editor = self.editor;
        platform::request_frame(move || {
            let (exits, remaining) = {
                let Ok(mut guard) = editor.try_write() else {
                    return;
                };
                let exits = guard.run_pending_exits();
                guard.advance_frame();
                (exits, guard.focus().pending_deferred())
            };
            if exits > 0
                && let Some((id, field)) = self.menu.peek().as_ref().map(|menu| (menu.id, menu.field))
            {
                self.refresh_menu(id, field);
            }
            if remaining > 0 {
                self.pump();
            }
        });
    }
}

/// Bring every editable field in line with the store.
///
/// Fields in command mode are skipped; their text includes the indicator.
/// Returns the number of fields rewritten.
pub fn sync_fields<D>(editor: &BlockEditor<D, BlockList>) -> usize
where
    D: EditorDom + 'static,
    D::Element: 'static,
{
    let mut written = 0;
    for record in editor.store().records() {
        let fields: &[Field] = if record.block_type.is_form() {
            &[Field::Label, Field::Description]
        } else {
            &[Field::Content]
        };
        for &field in fields {
            if editor.command_active(record.id, field) {
                continue;
            }
            let Some(element) = editor.field_element(record.id, field) else {
                continue;
            };
            let expected = match field {
                Field::Description => record.property("description").unwrap_or(""),
                Field::Content | Field::Label => record.content.as_str(),
            };
            if element.text_content() == expected {
                continue;
            }
            match element.replace_with_plain_text(expected) {
                Ok(()) => written += 1,
                Err(e) => log::warn!("Could not sync block {}: {e}", record.id),
            }
        }
    }
    written
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockpad_engine::surface::headless::HeadlessDom;
    use blockpad_engine::{Key, Modifiers};
    use dioxus::dioxus_core::VirtualDom;
    use dioxus_ssr::render;
    use pretty_assertions::assert_eq;

    fn records() -> Vec<BlockRecord> {
        vec![
            BlockRecord::new(BlockId(1), BlockType::Heading, "Title"),
            BlockRecord::new(BlockId(2), BlockType::Text, "Body"),
            BlockRecord::new(BlockId(3), BlockType::ShortAnswer, "Name?")
                .with_property("description", "Required"),
        ]
    }

    fn headless_editor() -> BlockEditor<HeadlessDom, BlockList> {
        let dom = HeadlessDom::new();
        let store = BlockList::from_records(records());
        dom.render(store.records());
        BlockEditor::new(dom, store, EditorConfig::default())
    }

    #[test]
    fn test_sync_fields_rewrites_stale_text() {
        let editor = headless_editor();
        let body = editor.field_element(BlockId(2), Field::Content).unwrap();
        body.replace_with_plain_text("stale").unwrap();
        let description = editor.field_element(BlockId(3), Field::Description).unwrap();
        description.replace_with_plain_text("").unwrap();

        assert_eq!(sync_fields(&editor), 2);
        assert_eq!(body.text_content(), "Body");
        assert_eq!(description.text_content(), "Required");
        assert_eq!(sync_fields(&editor), 0);
    }

    #[test]
    fn test_sync_fields_leaves_command_mode_alone() {
        let mut editor = headless_editor();
        let body = editor.field_element(BlockId(2), Field::Content).unwrap();
        body.focus().unwrap();
        body.set_caret(blockpad_engine::CaretPosition::Start).unwrap();
        let press = KeyPress::new(Key::character("/"), Modifiers::NONE);
        assert!(
            editor
                .handle_keydown(BlockId(2), Field::Content, &press)
                .prevents_default()
        );

        assert_eq!(sync_fields(&editor), 0);
        assert_eq!(body.text_content(), "/Body");
    }

    #[test]
    fn test_app_renders_every_block_with_its_id() {
        let mut dom = VirtualDom::new_with_props(
            App,
            AppProps {
                config: EditorConfig::default(),
                initial: records(),
            },
        );
        dom.rebuild_in_place();
        let html = render(&dom);

        for id in 1..=3 {
            assert!(
                html.contains(&format!("data-block-id=\"{id}\"")),
                "block {id} missing from {html}"
            );
        }
        assert!(html.contains("data-field=\"label\""));
        assert!(html.contains("data-field=\"description\""));
        assert!(!html.contains("command-menu"));
    }
}
