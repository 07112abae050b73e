use blockpad_engine::{BlockRecord, BlockType, Field, KeyPress};
use dioxus::prelude::*;

use super::keys::forward_keydown;

/// Choices shown by a multiple choice or multiselect block, one per line of
/// its `options` property
pub fn form_options(record: &BlockRecord) -> Vec<String> {
    let options: Vec<String> = record
        .property("options")
        .map(|options| {
            options
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    if options.is_empty() {
        vec!["Option 1".to_string(), "Option 2".to_string()]
    } else {
        options
    }
}

/// Label, description and answer controls of a form block
#[component]
pub fn FormContent(
    record: BlockRecord,
    on_keydown: Callback<(Field, KeyPress), bool>,
    on_input: Callback<Field>,
) -> Element {
    let id = record.id;
    let input_type = match record.block_type {
        BlockType::Multiselect => "checkbox",
        _ => "radio",
    };
    let options = form_options(&record);

    rsx! {
        div {
            class: "large-label",
            contenteditable: "true",
            "data-field": "label",
            onkeydown: forward_keydown(Field::Label, on_keydown),
            oninput: move |_| on_input.call(Field::Label),
        }
        div {
            class: "block-description",
            contenteditable: "true",
            "data-field": "description",
            onkeydown: forward_keydown(Field::Description, on_keydown),
            oninput: move |_| on_input.call(Field::Description),
        }
        if record.block_type == BlockType::ShortAnswer {
            input {
                class: "answer-input",
                r#type: "text",
                placeholder: "Short answer text",
            }
        } else {
            for (index, option) in options.into_iter().enumerate() {
                label {
                    key: "{index}",
                    class: "form-option",
                    input { r#type: input_type, name: "block-{id}" }
                    " {option}"
                }
            }
        }
    }
}
