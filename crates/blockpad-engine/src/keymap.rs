//! Keydown command tables.
//!
//! A block component hands every keydown to one [`CommandTable`]. The table
//! walks its commands in order and runs the first whose key and modifiers
//! match and whose condition (if any) holds. Order is significant: command
//! mode entries sit ahead of block navigation so that Arrow/Enter drive the
//! menu while it is open.

use std::fmt;

/// Logical key of a keydown event
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Enter,
    Backspace,
    Escape,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Tab,
    Character(String),
}

impl Key {
    /// Map a DOM `KeyboardEvent.key` value
    pub fn from_dom_key(key: &str) -> Self {
        match key {
            "Enter" => Key::Enter,
            "Backspace" => Key::Backspace,
            "Escape" => Key::Escape,
            "ArrowUp" => Key::ArrowUp,
            "ArrowDown" => Key::ArrowDown,
            "ArrowLeft" => Key::ArrowLeft,
            "ArrowRight" => Key::ArrowRight,
            "Tab" => Key::Tab,
            other => Key::Character(other.to_string()),
        }
    }

    pub fn character(text: &str) -> Self {
        Key::Character(text.to_string())
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Enter => write!(f, "Enter"),
            Key::Backspace => write!(f, "Backspace"),
            Key::Escape => write!(f, "Escape"),
            Key::ArrowUp => write!(f, "ArrowUp"),
            Key::ArrowDown => write!(f, "ArrowDown"),
            Key::ArrowLeft => write!(f, "ArrowLeft"),
            Key::ArrowRight => write!(f, "ArrowRight"),
            Key::Tab => write!(f, "Tab"),
            Key::Character(text) => write!(f, "{text:?}"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };
    pub const SHIFT: Self = Self {
        shift: true,
        ..Self::NONE
    };
    pub const CTRL: Self = Self {
        ctrl: true,
        ..Self::NONE
    };
    pub const META: Self = Self {
        meta: true,
        ..Self::NONE
    };
}

impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if self.ctrl {
            parts.push("Ctrl");
        }
        if self.alt {
            parts.push("Alt");
        }
        if self.shift {
            parts.push("Shift");
        }
        if self.meta {
            parts.push("Meta");
        }
        if parts.is_empty() {
            write!(f, "none")
        } else {
            write!(f, "{}", parts.join("+"))
        }
    }
}

/// One keydown, as seen by the dispatcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPress {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyPress {
    pub fn new(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    pub fn plain(key: Key) -> Self {
        Self::new(key, Modifiers::NONE)
    }
}

type Condition<C> = Box<dyn Fn(&C) -> bool>;
type Handler<C> = Box<dyn FnMut(&mut C)>;

/// A keyboard command descriptor over a context `C`
pub struct KeyCommand<C> {
    key: Key,
    /// Exact modifier set; `None` matches any
    modifiers: Option<Modifiers>,
    condition: Option<Condition<C>>,
    handler: Handler<C>,
    /// Run the handler but leave the browser's default action alone
    pass_through: bool,
    name: String,
}

impl<C> KeyCommand<C> {
    pub fn new(key: Key, name: &str, handler: impl FnMut(&mut C) + 'static) -> Self {
        Self {
            key,
            modifiers: None,
            condition: None,
            handler: Box::new(handler),
            pass_through: false,
            name: name.to_string(),
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = Some(modifiers);
        self
    }

    pub fn when(mut self, condition: impl Fn(&C) -> bool + 'static) -> Self {
        self.condition = Some(Box::new(condition));
        self
    }

    pub fn pass_through(mut self) -> Self {
        self.pass_through = true;
        self
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn matches(&self, press: &KeyPress, context: &C) -> bool {
        if self.key != press.key {
            return false;
        }
        if let Some(modifiers) = self.modifiers
            && modifiers != press.modifiers
        {
            return false;
        }
        self.condition.as_ref().is_none_or(|condition| condition(context))
    }
}

impl<C> fmt::Debug for KeyCommand<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyCommand")
            .field("key", &self.key)
            .field("modifiers", &self.modifiers)
            .field("conditional", &self.condition.is_some())
            .field("pass_through", &self.pass_through)
            .field("name", &self.name)
            .finish()
    }
}

/// Outcome of dispatching one keydown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Unhandled,
    Handled { prevent_default: bool },
}

/// Ordered, first-match-wins keydown table
pub struct CommandTable<C> {
    commands: Vec<KeyCommand<C>>,
}

impl<C> Default for CommandTable<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> CommandTable<C> {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    pub fn push(&mut self, command: KeyCommand<C>) {
        self.commands.push(command);
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn dispatch(&mut self, press: &KeyPress, context: &mut C) -> Dispatch {
        let Some(command) = self
            .commands
            .iter_mut()
            .find(|command| command.matches(press, context))
        else {
            return Dispatch::Unhandled;
        };
        log::trace!("{} {} -> {}", press.modifiers, press.key, command.name);
        (command.handler)(context);
        Dispatch::Handled {
            prevent_default: !command.pass_through,
        }
    }

    /// One line per command, in dispatch order
    pub fn describe(&self) -> String {
        self.commands
            .iter()
            .map(|command| {
                let modifiers = command
                    .modifiers
                    .map_or_else(|| "any".to_string(), |modifiers| modifiers.to_string());
                let mut line = format!("{} [{}] {}", command.key, modifiers, command.name);
                if command.condition.is_some() {
                    line.push_str(" (when)");
                }
                if command.pass_through {
                    line.push_str(" (pass-through)");
                }
                line
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl<C> FromIterator<KeyCommand<C>> for CommandTable<C> {
    fn from_iter<I: IntoIterator<Item = KeyCommand<C>>>(iter: I) -> Self {
        Self {
            commands: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct Log {
        armed: bool,
        calls: Vec<&'static str>,
    }

    fn table() -> CommandTable<Log> {
        [
            KeyCommand::new(Key::Enter, "soft break", |log: &mut Log| log.calls.push("soft"))
                .with_modifiers(Modifiers::SHIFT)
                .pass_through(),
            KeyCommand::new(Key::Enter, "armed enter", |log: &mut Log| log.calls.push("armed"))
                .when(|log| log.armed),
            KeyCommand::new(Key::Enter, "enter", |log: &mut Log| log.calls.push("enter"))
                .with_modifiers(Modifiers::NONE),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_first_match_wins() {
        let mut table = table();
        let mut log = Log {
            armed: true,
            ..Log::default()
        };
        let outcome = table.dispatch(&KeyPress::plain(Key::Enter), &mut log);
        assert_eq!(outcome, Dispatch::Handled { prevent_default: true });
        assert_eq!(log.calls, vec!["armed"]);
    }

    #[test]
    fn test_failed_condition_falls_through() {
        let mut table = table();
        let mut log = Log::default();
        table.dispatch(&KeyPress::plain(Key::Enter), &mut log);
        assert_eq!(log.calls, vec!["enter"]);
    }

    #[test]
    fn test_pass_through_keeps_default_action() {
        let mut table = table();
        let mut log = Log::default();
        let outcome = table.dispatch(&KeyPress::new(Key::Enter, Modifiers::SHIFT), &mut log);
        assert_eq!(outcome, Dispatch::Handled { prevent_default: false });
        assert_eq!(log.calls, vec!["soft"]);
    }

    #[test]
    fn test_modifiers_must_match_exactly() {
        let mut table = table();
        let mut log = Log::default();
        let outcome = table.dispatch(&KeyPress::new(Key::Enter, Modifiers::CTRL), &mut log);
        assert_eq!(outcome, Dispatch::Unhandled);
        assert!(log.calls.is_empty());
    }

    #[test]
    fn test_unknown_key_is_unhandled() {
        let mut table = table();
        let mut log = Log::default();
        let outcome = table.dispatch(&KeyPress::plain(Key::character("x")), &mut log);
        assert_eq!(outcome, Dispatch::Unhandled);
    }

    #[test]
    fn test_dom_key_mapping() {
        assert_eq!(Key::from_dom_key("ArrowUp"), Key::ArrowUp);
        assert_eq!(Key::from_dom_key("/"), Key::character("/"));
    }

    #[test]
    fn test_describe_lists_dispatch_order() {
        insta::assert_snapshot!(table().describe(), @r#"
        Enter [Shift] soft break (pass-through)
        Enter [any] armed enter (when)
        Enter [none] enter
        "#);
    }
}
