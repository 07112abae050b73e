//! Arrow navigation between two editable fields of one block, such as a
//! form block's label and its description. Same geometry and placement as
//! moving between blocks, scoped to a `from`/`to` pair.

use crate::caret::{navigate_entering_from_above, navigate_entering_from_below};
use crate::config::GeometryConfig;
use crate::geometry::{horizontal_position_of, is_at_first_visual_line, is_at_last_visual_line};
use crate::keymap::{Key, KeyCommand, Modifiers};
use crate::surface::DomElement;

/// ArrowDown on the last visual line of `from` moves into the first line of `to`
pub fn field_navigation_down<C, E>(from: E, to: E, config: &GeometryConfig) -> KeyCommand<C>
where
    C: 'static,
    E: DomElement + 'static,
{
    let probe = from.clone();
    let condition_config = config.clone();
    let config = config.clone();
    KeyCommand::new(Key::ArrowDown, "next field", move |_: &mut C| {
        let column = horizontal_position_of(&from, &config);
        if let Err(error) = navigate_entering_from_above(&to, column) {
            log::warn!("Field navigation down failed: {error}");
        }
    })
    .with_modifiers(Modifiers::NONE)
    .when(move |_: &C| is_at_last_visual_line(&probe, &condition_config))
}

/// ArrowUp on the first visual line of `from` moves into the last line of `to`
pub fn field_navigation_up<C, E>(from: E, to: E, config: &GeometryConfig) -> KeyCommand<C>
where
    C: 'static,
    E: DomElement + 'static,
{
    let probe = from.clone();
    let condition_config = config.clone();
    let config = config.clone();
    KeyCommand::new(Key::ArrowUp, "previous field", move |_: &mut C| {
        let column = horizontal_position_of(&from, &config);
        if let Err(error) = navigate_entering_from_below(&to, column) {
            log::warn!("Field navigation up failed: {error}");
        }
    })
    .with_modifiers(Modifiers::NONE)
    .when(move |_: &C| is_at_first_visual_line(&probe, &condition_config))
}
