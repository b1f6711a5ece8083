//! Command system for editor actions.
//!
//! ## Learning: The Command Pattern
//!
//! Commands encapsulate actions as values:
//! - Actions become first-class values
//! - Can be stored in key bindings and config files by name
//! - One dispatch point per editor
//!
//! Each [`Editor`] owns its own [`CommandTable`]; rebinding a handler in
//! one editor never affects another.

use std::collections::HashMap;

use crate::editor::Editor;
use crate::{CoreError, CoreResult};

/// Built-in editor commands.
///
/// ## Learning: Exhaustive Enums
///
/// Without `#[non_exhaustive]`, adding a variant breaks every `match`
/// that forgot it, which is what we want for the name table below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    // Caret movement
    MoveLeft,
    MoveRight,
    MoveWordLeft,
    MoveWordRight,
    MoveUp,
    MoveDown,
    PageUp,
    PageDown,
    MoveLineStart,
    MoveLineEnd,
    MoveDocStart,
    MoveDocEnd,

    // Selection
    SelectLeft,
    SelectRight,
    SelectWordLeft,
    SelectWordRight,
    SelectUp,
    SelectDown,
    SelectPageUp,
    SelectPageDown,
    SelectLineStart,
    SelectLineEnd,
    SelectDocStart,
    SelectDocEnd,
    SelectAll,

    // Editing
    DeletePrevChar,
    DeleteNextChar,
    DeletePrevWord,
    DeleteNextWord,
    Newline,
    Cut,
    Copy,
    Paste,
    Indent,
    Unindent,
    ToggleReplaceMode,
    Undo,
    Redo,

    // View
    ScrollLineUp,
    ScrollLineDown,

    // Search
    Find,
    FindNext,
    FindPrev,
    Replace,
    ReplaceAll,
}

/// Stable names used in key binding configuration.
const NAMES: &[(Command, &str)] = &[
    (Command::MoveLeft, "move_left"),
    (Command::MoveRight, "move_right"),
    (Command::MoveWordLeft, "move_word_left"),
    (Command::MoveWordRight, "move_word_right"),
    (Command::MoveUp, "move_up"),
    (Command::MoveDown, "move_down"),
    (Command::PageUp, "page_up"),
    (Command::PageDown, "page_down"),
    (Command::MoveLineStart, "move_line_start"),
    (Command::MoveLineEnd, "move_line_end"),
    (Command::MoveDocStart, "move_doc_start"),
    (Command::MoveDocEnd, "move_doc_end"),
    (Command::SelectLeft, "select_left"),
    (Command::SelectRight, "select_right"),
    (Command::SelectWordLeft, "select_word_left"),
    (Command::SelectWordRight, "select_word_right"),
    (Command::SelectUp, "select_up"),
    (Command::SelectDown, "select_down"),
    (Command::SelectPageUp, "select_page_up"),
    (Command::SelectPageDown, "select_page_down"),
    (Command::SelectLineStart, "select_line_start"),
    (Command::SelectLineEnd, "select_line_end"),
    (Command::SelectDocStart, "select_doc_start"),
    (Command::SelectDocEnd, "select_doc_end"),
    (Command::SelectAll, "select_all"),
    (Command::DeletePrevChar, "delete_prev_char"),
    (Command::DeleteNextChar, "delete_next_char"),
    (Command::DeletePrevWord, "delete_prev_word"),
    (Command::DeleteNextWord, "delete_next_word"),
    (Command::Newline, "newline"),
    (Command::Cut, "cut"),
    (Command::Copy, "copy"),
    (Command::Paste, "paste"),
    (Command::Indent, "indent"),
    (Command::Unindent, "unindent"),
    (Command::ToggleReplaceMode, "toggle_replace_mode"),
    (Command::Undo, "undo"),
    (Command::Redo, "redo"),
    (Command::ScrollLineUp, "scroll_line_up"),
    (Command::ScrollLineDown, "scroll_line_down"),
    (Command::Find, "find"),
    (Command::FindNext, "find_next"),
    (Command::FindPrev, "find_prev"),
    (Command::Replace, "replace"),
    (Command::ReplaceAll, "replace_all"),
];

impl Command {
    /// Returns every command.
    pub fn all() -> impl Iterator<Item = Command> {
        NAMES.iter().map(|&(cmd, _)| cmd)
    }

    /// Returns the command's configuration name.
    pub fn name(self) -> &'static str {
        NAMES
            .iter()
            .find(|&&(cmd, _)| cmd == self)
            .map_or("unknown", |&(_, name)| name)
    }

    /// Looks a command up by its configuration name.
    pub fn from_name(name: &str) -> CoreResult<Command> {
        NAMES
            .iter()
            .find(|&&(_, n)| n == name)
            .map(|&(cmd, _)| cmd)
            .ok_or_else(|| CoreError::UnknownCommand(name.to_string()))
    }

    /// Returns true if the command changes the buffer.
    pub fn is_edit(self) -> bool {
        matches!(
            self,
            Command::DeletePrevChar
                | Command::DeleteNextChar
                | Command::DeletePrevWord
                | Command::DeleteNextWord
                | Command::Newline
                | Command::Cut
                | Command::Paste
                | Command::Indent
                | Command::Unindent
                | Command::Undo
                | Command::Redo
                | Command::Replace
                | Command::ReplaceAll
        )
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A command handler.
///
/// ## Learning: Function Pointers
///
/// `fn(&mut Editor) -> CoreResult<()>` is a plain function pointer: it is
/// `Copy`, so a handler can be looked up in the table and then called
/// with the editor that owns the table.
pub type CommandHandler = fn(&mut Editor) -> CoreResult<()>;

/// Per-editor mapping from command to handler.
#[derive(Clone)]
pub struct CommandTable {
    handlers: HashMap<Command, CommandHandler>,
}

impl CommandTable {
    /// Creates a table with the built-in handlers.
    pub fn new() -> Self {
        use crate::Direction::{Backward, Forward};

        let mut table = Self {
            handlers: HashMap::new(),
        };
        let builtins: [(Command, CommandHandler); 45] = [
            (Command::MoveLeft, |e| e.move_char(Backward, false)),
            (Command::MoveRight, |e| e.move_char(Forward, false)),
            (Command::MoveWordLeft, |e| e.move_word(Backward, false)),
            (Command::MoveWordRight, |e| e.move_word(Forward, false)),
            (Command::MoveUp, |e| e.move_rows(-1, false)),
            (Command::MoveDown, |e| e.move_rows(1, false)),
            (Command::PageUp, |e| e.move_page(Backward, false)),
            (Command::PageDown, |e| e.move_page(Forward, false)),
            (Command::MoveLineStart, |e| e.move_line_start(false)),
            (Command::MoveLineEnd, |e| e.move_line_end(false)),
            (Command::MoveDocStart, |e| e.move_doc_start(false)),
            (Command::MoveDocEnd, |e| e.move_doc_end(false)),
            (Command::SelectLeft, |e| e.move_char(Backward, true)),
            (Command::SelectRight, |e| e.move_char(Forward, true)),
            (Command::SelectWordLeft, |e| e.move_word(Backward, true)),
            (Command::SelectWordRight, |e| e.move_word(Forward, true)),
            (Command::SelectUp, |e| e.move_rows(-1, true)),
            (Command::SelectDown, |e| e.move_rows(1, true)),
            (Command::SelectPageUp, |e| e.move_page(Backward, true)),
            (Command::SelectPageDown, |e| e.move_page(Forward, true)),
            (Command::SelectLineStart, |e| e.move_line_start(true)),
            (Command::SelectLineEnd, |e| e.move_line_end(true)),
            (Command::SelectDocStart, |e| e.move_doc_start(true)),
            (Command::SelectDocEnd, |e| e.move_doc_end(true)),
            (Command::SelectAll, Editor::select_all),
            (Command::DeletePrevChar, |e| e.delete_char(Backward)),
            (Command::DeleteNextChar, |e| e.delete_char(Forward)),
            (Command::DeletePrevWord, |e| e.delete_word(Backward)),
            (Command::DeleteNextWord, |e| e.delete_word(Forward)),
            (Command::Newline, Editor::newline),
            (Command::Cut, Editor::cut),
            (Command::Copy, Editor::copy),
            (Command::Paste, Editor::paste),
            (Command::Indent, Editor::indent),
            (Command::Unindent, Editor::unindent),
            (Command::ToggleReplaceMode, Editor::toggle_replace_mode),
            (Command::Undo, Editor::undo),
            (Command::Redo, Editor::redo),
            (Command::ScrollLineUp, |e| e.scroll_lines(-1)),
            (Command::ScrollLineDown, |e| e.scroll_lines(1)),
            (Command::Find, |e| e.find().map(|_| ())),
            (Command::FindNext, |e| e.find_next().map(|_| ())),
            (Command::FindPrev, |e| e.find_prev().map(|_| ())),
            (Command::Replace, |e| e.replace().map(|_| ())),
            (Command::ReplaceAll, |e| e.replace_all().map(|_| ())),
        ];
        for (cmd, handler) in builtins {
            table.bind(cmd, handler);
        }
        table
    }

    /// Installs or replaces a handler.
    pub fn bind(&mut self, cmd: Command, handler: CommandHandler) {
        self.handlers.insert(cmd, handler);
    }

    /// Removes a handler, disabling the command.
    pub fn unbind(&mut self, cmd: Command) -> bool {
        self.handlers.remove(&cmd).is_some()
    }

    /// Returns the handler for a command.
    pub fn get(&self, cmd: Command) -> Option<CommandHandler> {
        self.handlers.get(&cmd).copied()
    }

    /// Returns the number of bound commands.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns true if no command is bound.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl Default for CommandTable {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CommandTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandTable")
            .field("commands", &self.handlers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for cmd in Command::all() {
            assert_eq!(Command::from_name(cmd.name()).unwrap(), cmd);
        }
        assert_eq!(Command::SelectWordLeft.to_string(), "select_word_left");
    }

    #[test]
    fn test_unknown_name() {
        assert!(matches!(
            Command::from_name("launch_rockets"),
            Err(CoreError::UnknownCommand(name)) if name == "launch_rockets"
        ));
    }

    #[test]
    fn test_every_command_has_a_handler() {
        let table = CommandTable::new();
        assert_eq!(table.len(), Command::all().count());
        for cmd in Command::all() {
            assert!(table.get(cmd).is_some(), "{cmd} has no handler");
        }
    }

    #[test]
    fn test_unbind() {
        let mut table = CommandTable::new();
        assert!(table.unbind(Command::Paste));
        assert!(table.get(Command::Paste).is_none());
        assert!(!table.unbind(Command::Paste));
    }
}
