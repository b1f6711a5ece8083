//! Keyboard mapping.
//!
//! ## Learning: Parsing into Types
//!
//! Bindings are written as strings like `"ctrl+shift+left"` in the config
//! file. They are parsed once into [`KeyPress`] values, which are `Hash`
//! and `Eq`, so dispatch is a plain map lookup.

use std::collections::HashMap;

use crate::command::Command;
use crate::config::Config;
use crate::{CoreError, CoreResult};

/// Keyboard modifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool, // Cmd on macOS, Win on Windows
}

impl Modifiers {
    /// No modifiers pressed.
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        alt: false,
        shift: false,
        meta: false,
    };

    /// Ctrl modifier.
    pub const CTRL: Modifiers = Modifiers {
        ctrl: true,
        alt: false,
        shift: false,
        meta: false,
    };

    /// Shift modifier.
    pub const SHIFT: Modifiers = Modifiers {
        ctrl: false,
        alt: false,
        shift: true,
        meta: false,
    };

    /// Ctrl+Shift.
    pub const CTRL_SHIFT: Modifiers = Modifiers {
        ctrl: true,
        alt: false,
        shift: true,
        meta: false,
    };

    /// Returns true if no modifiers are pressed.
    pub fn is_empty(&self) -> bool {
        !self.ctrl && !self.alt && !self.shift && !self.meta
    }

    /// Returns true if a modifier that turns a key into a shortcut is held.
    pub fn is_command(&self) -> bool {
        self.ctrl || self.alt || self.meta
    }

    /// Adds one named modifier; returns false for an unknown name.
    fn add(&mut self, name: &str) -> bool {
        match name {
            "ctrl" | "control" => self.ctrl = true,
            "alt" | "option" => self.alt = true,
            "shift" => self.shift = true,
            "meta" | "cmd" | "win" | "super" => self.meta = true,
            _ => return false,
        }
        true
    }
}

impl std::fmt::Display for Modifiers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
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
            #[cfg(target_os = "macos")]
            parts.push("Cmd");
            #[cfg(not(target_os = "macos"))]
            parts.push("Win");
        }
        write!(f, "{}", parts.join("+"))
    }
}

/// A key code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    Enter,
    Tab,
    Backspace,
    Delete,
    Escape,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    Insert,
    F(u8), // F1-F12
    Space,
}

impl Key {
    /// Parses a key from a string.
    pub fn parse(s: &str) -> Option<Self> {
        let lower = s.to_lowercase();
        match lower.as_str() {
            "enter" | "return" => Some(Key::Enter),
            "tab" => Some(Key::Tab),
            "backspace" | "bs" => Some(Key::Backspace),
            "delete" | "del" => Some(Key::Delete),
            "escape" | "esc" => Some(Key::Escape),
            "up" => Some(Key::Up),
            "down" => Some(Key::Down),
            "left" => Some(Key::Left),
            "right" => Some(Key::Right),
            "home" => Some(Key::Home),
            "end" => Some(Key::End),
            "pageup" | "pgup" => Some(Key::PageUp),
            "pagedown" | "pgdn" => Some(Key::PageDown),
            "insert" | "ins" => Some(Key::Insert),
            "space" => Some(Key::Space),
            _ if lower.starts_with('f') && lower.len() > 1 && lower.len() <= 3 => {
                lower[1..].parse().ok().filter(|n| (1..=12).contains(n)).map(Key::F)
            }
            _ => {
                let mut chars = lower.chars();
                match (chars.next(), chars.next()) {
                    (Some(ch), None) => Some(Key::Char(ch)),
                    _ => None,
                }
            }
        }
    }

    /// Returns the text a key types, if any.
    pub fn typed_char(&self) -> Option<char> {
        match self {
            Key::Char(ch) => Some(*ch),
            Key::Space => Some(' '),
            _ => None,
        }
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Key::Char(c) => write!(f, "{}", c.to_uppercase()),
            Key::Enter => write!(f, "Enter"),
            Key::Tab => write!(f, "Tab"),
            Key::Backspace => write!(f, "Backspace"),
            Key::Delete => write!(f, "Delete"),
            Key::Escape => write!(f, "Escape"),
            Key::Up => write!(f, "Up"),
            Key::Down => write!(f, "Down"),
            Key::Left => write!(f, "Left"),
            Key::Right => write!(f, "Right"),
            Key::Home => write!(f, "Home"),
            Key::End => write!(f, "End"),
            Key::PageUp => write!(f, "PageUp"),
            Key::PageDown => write!(f, "PageDown"),
            Key::Insert => write!(f, "Insert"),
            Key::F(n) => write!(f, "F{}", n),
            Key::Space => write!(f, "Space"),
        }
    }
}

/// A key press event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyPress {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyPress {
    /// Creates a new key press.
    pub fn new(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    /// A key without modifiers.
    pub fn plain(key: Key) -> Self {
        Self::new(key, Modifiers::NONE)
    }

    /// Parses a key binding string like "ctrl+s" or "shift+f3".
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        // "ctrl++" binds the plus key
        let (mods, key_str) = match s.strip_suffix("++") {
            Some(mods) => (mods, "+"),
            None => match s.rsplit_once('+') {
                Some((mods, key)) => (mods, key),
                None => ("", s),
            },
        };

        let key = Key::parse(key_str.trim())?;
        let mut modifiers = Modifiers::NONE;
        for name in mods.split('+').map(str::trim).filter(|m| !m.is_empty()) {
            if !modifiers.add(&name.to_lowercase()) {
                return None;
            }
        }
        Some(Self { key, modifiers })
    }

    /// Returns the binding lookup form: letter keys are case-insensitive.
    fn normalized(self) -> Self {
        match self.key {
            Key::Char(ch) if ch.is_uppercase() => Self {
                key: Key::Char(ch.to_lowercase().next().unwrap_or(ch)),
                modifiers: self.modifiers,
            },
            _ => self,
        }
    }
}

impl std::fmt::Display for KeyPress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.modifiers.is_empty() {
            write!(f, "{}", self.key)
        } else {
            write!(f, "{}+{}", self.modifiers, self.key)
        }
    }
}

/// Per-editor key bindings.
#[derive(Debug, Clone)]
pub struct Keymap {
    bindings: HashMap<KeyPress, Command>,
}

impl Keymap {
    /// Creates a keymap with the default bindings.
    pub fn new() -> Self {
        let mut keymap = Self {
            bindings: HashMap::new(),
        };
        keymap.add_default_bindings();
        keymap
    }

    /// Creates a keymap from configuration.
    ///
    /// Invalid user bindings are logged and skipped.
    pub fn from_config(config: &Config) -> Self {
        let mut keymap = Self::new();
        for (key_str, cmd_str) in &config.keyboard.bindings {
            if let Err(err) = keymap.bind_str(key_str, cmd_str) {
                tracing::warn!("Ignoring key binding {:?}: {}", key_str, err);
            }
        }
        keymap
    }

    /// Adds default key bindings.
    fn add_default_bindings(&mut self) {
        use crate::command::Command::*;

        const NONE: Modifiers = Modifiers::NONE;
        const CTRL: Modifiers = Modifiers::CTRL;
        const SHIFT: Modifiers = Modifiers::SHIFT;
        const CTRL_SHIFT: Modifiers = Modifiers::CTRL_SHIFT;

        let bindings = [
            // Caret movement
            (Key::Left, NONE, MoveLeft),
            (Key::Right, NONE, MoveRight),
            (Key::Left, CTRL, MoveWordLeft),
            (Key::Right, CTRL, MoveWordRight),
            (Key::Up, NONE, MoveUp),
            (Key::Down, NONE, MoveDown),
            (Key::PageUp, NONE, PageUp),
            (Key::PageDown, NONE, PageDown),
            (Key::Home, NONE, MoveLineStart),
            (Key::End, NONE, MoveLineEnd),
            (Key::Home, CTRL, MoveDocStart),
            (Key::End, CTRL, MoveDocEnd),
            // Selection
            (Key::Left, SHIFT, SelectLeft),
            (Key::Right, SHIFT, SelectRight),
            (Key::Left, CTRL_SHIFT, SelectWordLeft),
            (Key::Right, CTRL_SHIFT, SelectWordRight),
            (Key::Up, SHIFT, SelectUp),
            (Key::Down, SHIFT, SelectDown),
            (Key::PageUp, SHIFT, SelectPageUp),
            (Key::PageDown, SHIFT, SelectPageDown),
            (Key::Home, SHIFT, SelectLineStart),
            (Key::End, SHIFT, SelectLineEnd),
            (Key::Home, CTRL_SHIFT, SelectDocStart),
            (Key::End, CTRL_SHIFT, SelectDocEnd),
            (Key::Char('a'), CTRL, SelectAll),
            // Editing
            (Key::Backspace, NONE, DeletePrevChar),
            (Key::Backspace, SHIFT, DeletePrevChar),
            (Key::Delete, NONE, DeleteNextChar),
            (Key::Backspace, CTRL, DeletePrevWord),
            (Key::Delete, CTRL, DeleteNextWord),
            (Key::Enter, NONE, Newline),
            (Key::Char('x'), CTRL, Cut),
            (Key::Delete, SHIFT, Cut),
            (Key::Char('c'), CTRL, Copy),
            (Key::Insert, CTRL, Copy),
            (Key::Char('v'), CTRL, Paste),
            (Key::Insert, SHIFT, Paste),
            (Key::Tab, NONE, Indent),
            (Key::Tab, SHIFT, Unindent),
            (Key::Insert, NONE, ToggleReplaceMode),
            (Key::Char('z'), CTRL, Undo),
            (Key::Char('y'), CTRL, Redo),
            (Key::Char('z'), CTRL_SHIFT, Redo),
            // View
            (Key::Up, CTRL, ScrollLineUp),
            (Key::Down, CTRL, ScrollLineDown),
            // Search
            (Key::Char('f'), CTRL, Find),
            (Key::F(3), NONE, FindNext),
            (Key::F(3), SHIFT, FindPrev),
            (Key::Char('h'), CTRL, Replace),
            (Key::Char('h'), CTRL_SHIFT, ReplaceAll),
        ];

        for (key, modifiers, cmd) in bindings {
            self.bind(KeyPress::new(key, modifiers), cmd);
        }
    }

    /// Binds a key press to a command, replacing any previous binding.
    pub fn bind(&mut self, key: KeyPress, cmd: Command) {
        self.bindings.insert(key.normalized(), cmd);
    }

    /// Parses and installs a binding from configuration strings.
    pub fn bind_str(&mut self, key_str: &str, cmd_str: &str) -> CoreResult<()> {
        let key = KeyPress::parse(key_str).ok_or_else(|| CoreError::InvalidKeyBinding(key_str.to_string()))?;
        let cmd = Command::from_name(cmd_str)?;
        self.bind(key, cmd);
        Ok(())
    }

    /// Removes a binding.
    pub fn unbind(&mut self, key: KeyPress) -> Option<Command> {
        self.bindings.remove(&key.normalized())
    }

    /// Returns the command bound to a key press.
    pub fn lookup(&self, key: KeyPress) -> Option<Command> {
        self.bindings.get(&key.normalized()).copied()
    }

    /// Returns the key presses bound to a command.
    pub fn keys_for(&self, cmd: Command) -> Vec<KeyPress> {
        let mut keys: Vec<KeyPress> = self
            .bindings
            .iter()
            .filter(|&(_, &bound)| bound == cmd)
            .map(|(&key, _)| key)
            .collect();
        keys.sort_by_key(|key| key.to_string());
        keys
    }
}

impl Default for Keymap {
    fn default() -> Self {
        Self::new()
    }
}
