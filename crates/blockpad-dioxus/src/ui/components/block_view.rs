use blockpad_engine::{BlockRecord, BlockType, Field, KeyPress};
use dioxus::prelude::*;

use super::{CommandMenu, FormContent, HeadingContent, TextContent};
use crate::ui::app::MenuState;

/// One block: the element the engine finds by `data-block-id`, the fields
/// for its type, and the command menu when one is open in it.
#[component]
pub fn BlockView(
    record: BlockRecord,
    menu: Option<MenuState>,
    on_keydown: Callback<(Field, KeyPress), bool>,
    on_input: Callback<Field>,
    on_choose: Callback<(Field, BlockType)>,
) -> Element {
    let class = if record.block_type.is_form() {
        "block block-form"
    } else {
        "block"
    };

    rsx! {
        div {
            class: "{class}",
            "data-block-id": "{record.id}",
            "data-block-type": record.block_type.as_str(),
            {match record.block_type {
                BlockType::Text => rsx! { TextContent { on_keydown, on_input } },
                BlockType::Heading => rsx! { HeadingContent { on_keydown, on_input } },
                BlockType::ShortAnswer | BlockType::MultipleChoice | BlockType::Multiselect => rsx! {
                    FormContent { record: record.clone(), on_keydown, on_input }
                },
            }}
            if let Some(menu) = menu {
                CommandMenu {
                    items: menu.items.clone(),
                    selected: menu.selected,
                    on_choose: move |block_type: BlockType| on_choose.call((menu.field, block_type)),
                }
            }
        }
    }
}
