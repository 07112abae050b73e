use blockpad_engine::BlockType;
use dioxus::prelude::*;

fn item_class(index: usize, selected: usize) -> &'static str {
    if index == selected {
        "command-item selected"
    } else {
        "command-item"
    }
}

/// Slash-command menu. Items are chosen on mousedown so the field keeps focus.
#[component]
pub fn CommandMenu(
    items: Vec<(String, BlockType)>,
    selected: usize,
    on_choose: Callback<BlockType>,
) -> Element {
    rsx! {
        ul {
            class: "command-menu",
            contenteditable: "false",
            "role": "listbox",
            if items.is_empty() {
                li { class: "command-menu-empty", "No matching blocks" }
            }
            for (index, (label, block_type)) in items.iter().cloned().enumerate() {
                li {
                    key: "{index}",
                    class: item_class(index, selected),
                    onmousedown: move |event: Event<MouseData>| {
                        event.prevent_default();
                        on_choose.call(block_type);
                    },
                    "{label}"
                }
            }
        }
    }
}
