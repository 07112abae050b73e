use blockpad_engine::{Field, Key, KeyPress, Modifiers};
use dioxus::prelude::*;

/// Translate a Dioxus keydown into the engine's key model
pub fn key_press(event: &KeyboardData) -> KeyPress {
    let modifiers = event.modifiers();
    KeyPress::new(
        Key::from_dom_key(&event.key().to_string()),
        Modifiers {
            shift: modifiers.shift(),
            ctrl: modifiers.ctrl(),
            alt: modifiers.alt(),
            meta: modifiers.meta(),
        },
    )
}

/// `onkeydown` handler for one editable field. The callback answers
/// whether the browser default must be suppressed.
pub fn forward_keydown(
    field: Field,
    on_keydown: Callback<(Field, KeyPress), bool>,
) -> impl FnMut(Event<KeyboardData>) + 'static {
    move |event: Event<KeyboardData>| {
        if on_keydown.call((field, key_press(&event))) {
            event.prevent_default();
        }
    }
}
