use blockpad_engine::{Field, KeyPress};
use dioxus::prelude::*;

use super::keys::forward_keydown;

/// Editable body of a text block. Its text is filled in by the editor, not
/// rendered here, so typing never races a re-render.
#[component]
pub fn TextContent(
    on_keydown: Callback<(Field, KeyPress), bool>,
    on_input: Callback<Field>,
) -> Element {
    rsx! {
        div {
            class: "block-text",
            contenteditable: "true",
            onkeydown: forward_keydown(Field::Content, on_keydown),
            oninput: move |_| on_input.call(Field::Content),
        }
    }
}

#[component]
pub fn HeadingContent(
    on_keydown: Callback<(Field, KeyPress), bool>,
    on_input: Callback<Field>,
) -> Element {
    rsx! {
        h2 {
            class: "block-heading",
            contenteditable: "true",
            onkeydown: forward_keydown(Field::Content, on_keydown),
            oninput: move |_| on_input.call(Field::Content),
        }
    }
}
