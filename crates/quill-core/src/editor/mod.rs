//! Main editor orchestration.
//!
//! ## Learning: The Facade Pattern
//!
//! `Editor` acts as a facade over one view of a buffer: the caret, the
//! layout caches, the viewport, search state and key dispatch. External
//! code only needs to interact with `Editor`, not individual components.
//!
//! ## Keeping Views Consistent
//!
//! Several editors may share one [`SharedBuffer`]. Each editor subscribes
//! to the buffer and queues the events it receives; [`Editor::sync`]
//! drains the queue, moves the caret past edits made by other views,
//! drops layout caches and clamps the caret. Every public operation syncs
//! before it reads the caret or the layout, and the read-only getters
//! replay pending edits on a copy, so a stale caret is never observed.

mod edit;
mod find;
mod motion;

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use quill_buffer::{
    ActorId, BufferConfig, BufferError, BufferEvent, EditOperation, SharedBuffer, SubscriptionId, TextBuffer,
    TextPosition, TextRange,
};

use crate::caret::Caret;
use crate::command::{Command, CommandTable};
use crate::config::{Config, EditorConfig};
use crate::event::{CaretState, EditorEvent, EventBus};
use crate::keymap::{Keymap, KeyPress};
use crate::layout::{Layout, Point, Rect, VisualRow};
use crate::search::SearchOptions;
use crate::services::{Clipboard, MemoryClipboard, MonospaceMeasure, TextMeasure, TokenClassifier};
use crate::viewport::Viewport;
use crate::{CoreError, CoreResult};

pub use find::FindState;

/// How far an operation scrolls to keep the caret in view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reveal {
    /// Leave the viewport alone
    Keep,
    /// Minimal scroll
    Caret,
    /// Center the caret row when it is off screen
    Center,
}

/// One view onto a text buffer.
///
/// ## Thread Safety
///
/// `Editor` is designed to be owned by a single thread (the UI thread).
/// It shares its buffer through `Rc<RefCell<_>>` and is neither `Send`
/// nor `Sync`.
pub struct Editor {
    /// The document being edited
    buffer: SharedBuffer,

    /// Identifies this view's edits in buffer events
    actor: ActorId,

    /// Buffer subscription feeding `pending`
    subscription: SubscriptionId,

    /// Buffer events not yet reconciled
    pending: Rc<RefCell<VecDeque<BufferEvent>>>,

    /// Caret and selection
    caret: Caret,

    /// Wrap spans and position mapping
    layout: Layout,

    /// Scroll state
    viewport: Viewport,

    /// Font metrics
    measure: Rc<dyn TextMeasure>,

    /// Clipboard access
    clipboard: Rc<dyn Clipboard>,

    /// Optional syntax categories
    classifier: Option<Rc<dyn TokenClassifier>>,

    /// Editing behavior
    config: EditorConfig,

    /// Find/replace state
    find: FindState,

    /// Explicit passive highlight
    highlight: Option<(String, SearchOptions)>,

    /// Overwrite instead of insert
    replace_mode: bool,

    /// Caret blink phase
    caret_visible: bool,

    /// Command handlers
    commands: CommandTable,

    /// Key bindings
    keymap: Keymap,

    /// Event subscribers
    events: EventBus,

    /// Last caret state reported to subscribers
    last_caret_state: Option<CaretState>,
}

impl Editor {
    /// Creates an editor over a new empty buffer configured from `config`.
    pub fn new(config: &Config) -> Self {
        let buffer = TextBuffer::with_config(BufferConfig {
            max_history: config.editor.undo_limit,
            multiline: config.editor.multiline,
            read_only: config.editor.read_only,
        });
        Self::with_buffer(buffer.into_shared(), config)
    }

    /// Creates an editor over an existing, possibly shared, buffer.
    pub fn with_buffer(buffer: SharedBuffer, config: &Config) -> Self {
        let pending = Rc::new(RefCell::new(VecDeque::new()));
        let sink = Rc::clone(&pending);
        let subscription = buffer
            .borrow_mut()
            .subscribe(move |event: &BufferEvent| sink.borrow_mut().push_back(event.clone()));

        let measure: Rc<dyn TextMeasure> = Rc::new(MonospaceMeasure::default());
        let viewport = Viewport::new(
            measure.line_height(),
            config.editor.scroll_left_margin,
            config.editor.scroll_right_margin,
        );

        let mut editor = Self {
            buffer,
            actor: ActorId::new(),
            subscription,
            pending,
            caret: Caret::default(),
            layout: Layout::new(config.wrap.split_chars.clone(), config.editor.tab_size),
            viewport,
            measure,
            clipboard: Rc::new(MemoryClipboard::new()),
            classifier: None,
            config: config.editor.clone(),
            find: FindState::new(config.search),
            highlight: None,
            replace_mode: false,
            caret_visible: true,
            commands: CommandTable::new(),
            keymap: Keymap::from_config(config),
            events: EventBus::new(),
            last_caret_state: None,
        };
        editor.last_caret_state = Some(editor.caret_state());
        tracing::debug!(actor = %editor.actor, "editor attached to buffer");
        editor
    }

    // ==================== Collaborators ====================

    /// Installs a measurement service and drops layout caches.
    pub fn set_measure(&mut self, measure: Rc<dyn TextMeasure>) {
        self.begin();
        self.viewport.set_line_height(measure.line_height());
        self.measure = measure;
        self.layout.invalidate();
        self.finish(Reveal::Caret);
    }

    /// Installs a clipboard service.
    pub fn set_clipboard(&mut self, clipboard: Rc<dyn Clipboard>) {
        self.clipboard = clipboard;
    }

    /// Installs a token classifier.
    pub fn set_classifier(&mut self, classifier: Option<Rc<dyn TokenClassifier>>) {
        self.classifier = classifier;
    }

    /// Returns the display category of a character; 0 without a classifier.
    pub fn token_category(&self, line: usize, char_index: usize) -> u8 {
        self.classifier
            .as_ref()
            .map_or(0, |classifier| classifier.token_category(line, char_index))
    }

    // ==================== Buffer Access ====================

    /// Returns the shared buffer handle.
    pub fn buffer(&self) -> SharedBuffer {
        Rc::clone(&self.buffer)
    }

    /// Returns this view's actor ID.
    pub fn actor(&self) -> ActorId {
        self.actor
    }

    /// Returns the whole text.
    pub fn text(&self) -> String {
        self.buffer.borrow().text().into_owned()
    }

    /// Replaces the whole document, as after loading a file.
    ///
    /// A read-only buffer keeps its text and the caret stays put.
    pub fn set_text(&mut self, text: &str) -> CoreResult<()> {
        self.begin();
        if self.apply_edit(EditOperation::replace_content(text)).is_some() {
            self.caret = Caret::new(TextPosition::ZERO);
        }
        self.finish(Reveal::Caret);
        Ok(())
    }

    /// Records that the document was saved.
    pub fn mark_saved(&mut self) {
        self.begin();
        self.buffer.borrow_mut().mark_saved(self.actor);
        self.finish(Reveal::Keep);
    }

    /// Returns true if the document has unsaved changes.
    pub fn is_modified(&self) -> bool {
        self.buffer.borrow().is_modified()
    }

    /// Returns true if edits are rejected.
    pub fn is_read_only(&self) -> bool {
        self.buffer.borrow().is_read_only()
    }

    /// Enables or disables read-only mode.
    pub fn set_read_only(&mut self, read_only: bool) {
        self.buffer.borrow_mut().set_read_only(read_only);
    }

    /// Returns true if an undo step is available.
    pub fn can_undo(&self) -> bool {
        self.buffer.borrow().can_undo()
    }

    /// Returns true if a redo step is available.
    pub fn can_redo(&self) -> bool {
        self.buffer.borrow().can_redo()
    }

    // ==================== Caret & Selection ====================

    /// Returns the caret position.
    pub fn caret(&self) -> TextPosition {
        self.current_caret().position()
    }

    /// Returns the selection.
    pub fn selection(&self) -> TextRange {
        self.current_caret().selection()
    }

    /// Returns the selected text.
    pub fn selected_text(&self) -> String {
        self.buffer.borrow().text_in_range(self.current_caret().selection())
    }

    /// Moves the caret to a position, clamped into the document.
    pub fn set_caret(&mut self, pos: TextPosition, extend: bool) {
        self.begin();
        let pos = self.buffer.borrow().corrected(pos);
        self.caret.move_to(pos, extend);
        self.buffer.borrow_mut().break_coalescing();
        self.finish(Reveal::Caret);
    }

    /// Selects a range; empty ranges are ignored.
    pub fn set_selection(&mut self, range: TextRange) {
        self.begin();
        let range = self.buffer.borrow().corrected_range(range);
        self.caret.set_selection(range);
        self.buffer.borrow_mut().break_coalescing();
        self.finish(Reveal::Caret);
    }

    /// Returns the caret summary shown in status bars.
    pub fn caret_state(&self) -> CaretState {
        let pos = self.current_caret().position();
        CaretState {
            line: pos.line + 1,
            col: pos.pos + 1,
            replace_mode: self.replace_mode,
            char_under_cursor: self.buffer.borrow().char_at(pos),
        }
    }

    /// Returns true in overwrite mode.
    pub fn replace_mode(&self) -> bool {
        self.replace_mode
    }

    /// Switches between insert and overwrite mode.
    pub fn toggle_replace_mode(&mut self) -> CoreResult<()> {
        self.begin();
        self.replace_mode = !self.replace_mode;
        self.finish(Reveal::Keep);
        Ok(())
    }

    // ==================== Caret Blink ====================

    /// Returns whether the caret is in its visible blink phase.
    pub fn caret_visible(&self) -> bool {
        self.caret_visible
    }

    /// Advances the blink phase; returns true if a repaint is needed.
    ///
    /// The host calls this every `caret_blink_ms`. With blinking disabled
    /// the caret stays visible.
    pub fn blink_tick(&mut self) -> bool {
        if self.config.caret_blink_ms == 0 {
            let changed = !self.caret_visible;
            self.caret_visible = true;
            return changed;
        }
        self.caret_visible = !self.caret_visible;
        true
    }

    // ==================== Layout & Viewport ====================

    /// Resizes the client area. With word wrap on, lines re-wrap to the
    /// new width.
    pub fn set_client_size(&mut self, width: f32, height: f32) {
        self.begin();
        self.viewport.set_client_size(width, height);
        if self.config.word_wrap {
            self.layout.set_wrap_width(Some(width));
        }
        self.events.emit(EditorEvent::ViewportChanged);
        self.finish(Reveal::Caret);
    }

    /// Turns word wrap on or off.
    pub fn set_word_wrap(&mut self, enabled: bool) {
        self.begin();
        self.config.word_wrap = enabled;
        let width = enabled.then(|| self.viewport.width());
        if self.layout.set_wrap_width(width) {
            self.viewport.reset_scroll_x();
            self.events.emit(EditorEvent::ViewportChanged);
        }
        self.finish(Reveal::Caret);
    }

    /// Returns true if word wrap is on.
    pub fn word_wrap(&self) -> bool {
        self.config.word_wrap
    }

    /// Returns the viewport.
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Returns the total number of visual rows.
    pub fn total_rows(&mut self) -> usize {
        self.begin();
        self.row_count()
    }

    fn row_count(&mut self) -> usize {
        let buffer = self.buffer.borrow();
        self.layout.total_rows(&buffer, &*self.measure)
    }

    /// Returns the rows currently on screen.
    pub fn visible_rows(&mut self) -> Vec<VisualRow> {
        self.begin();
        let buffer = self.buffer.borrow();
        self.layout.visible_rows(&buffer, &*self.measure, &self.viewport)
    }

    /// Returns the width of the widest line.
    pub fn content_width(&mut self) -> f32 {
        self.begin();
        let buffer = self.buffer.borrow();
        self.layout.longest_line_width(&buffer, &*self.measure)
    }

    /// Maps a document position to a client-space box.
    pub fn text_pos_to_client(&mut self, pos: TextPosition) -> Rect {
        self.begin();
        let buffer = self.buffer.borrow();
        self.layout.text_pos_to_client(&buffer, &*self.measure, &self.viewport, pos)
    }

    /// Maps a client-space point to the nearest document position.
    pub fn client_to_text_pos(&mut self, point: Point) -> TextPosition {
        self.begin();
        let buffer = self.buffer.borrow();
        self.layout.client_to_text_pos(&buffer, &*self.measure, &self.viewport, point)
    }

    /// Scrolls by whole rows without moving the caret.
    pub fn scroll_lines(&mut self, delta: isize) -> CoreResult<()> {
        self.begin();
        let total = self.row_count();
        if self.viewport.scroll_rows(delta, total) {
            self.events.emit(EditorEvent::ViewportChanged);
        }
        self.finish(Reveal::Keep);
        Ok(())
    }

    /// Scrolls so the caret is visible, optionally centering it.
    pub fn ensure_caret_visible(&mut self, center: bool) {
        self.begin();
        let pos = self.caret.position();
        let (changed_rows, changed_x) = {
            let buffer = self.buffer.borrow();
            let measure = &*self.measure;
            let total = self.layout.total_rows(&buffer, measure);
            let row = self.layout.row_of(&buffer, measure, pos);
            let rows = self.viewport.ensure_row_visible(row, center, total);

            let cols = if self.layout.is_wrapping() {
                false
            } else {
                let x = self.layout.x_in_row(&buffer, measure, pos);
                self.viewport.ensure_x_visible(x)
            };
            (rows, cols)
        };
        if changed_rows || changed_x {
            self.events.emit(EditorEvent::ViewportChanged);
        }
    }

    // ==================== Commands & Keys ====================

    /// Runs a command through this editor's command table.
    pub fn execute(&mut self, cmd: Command) -> CoreResult<()> {
        let handler = self
            .commands
            .get(cmd)
            .ok_or_else(|| CoreError::UnknownCommand(cmd.name().to_string()))?;
        tracing::trace!(command = %cmd, "executing");
        handler(self)
    }

    /// Runs a command by its configuration name.
    pub fn execute_named(&mut self, name: &str) -> CoreResult<()> {
        self.execute(Command::from_name(name)?)
    }

    /// Handles a key press: bound keys run their command, plain printable
    /// keys type their character. Returns true if the key was consumed.
    pub fn handle_key(&mut self, key: KeyPress) -> CoreResult<bool> {
        if let Some(cmd) = self.keymap.lookup(key) {
            self.execute(cmd)?;
            return Ok(true);
        }
        match key.key.typed_char() {
            Some(ch) if !key.modifiers.is_command() && !ch.is_control() => {
                self.type_char(ch)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Returns the command table for rebinding handlers.
    pub fn commands_mut(&mut self) -> &mut CommandTable {
        &mut self.commands
    }

    /// Returns the keymap.
    pub fn keymap(&self) -> &Keymap {
        &self.keymap
    }

    /// Returns the keymap for rebinding keys.
    pub fn keymap_mut(&mut self) -> &mut Keymap {
        &mut self.keymap
    }

    // ==================== Events ====================

    /// Subscribes to editor events.
    pub fn subscribe(&mut self, handler: impl FnMut(&EditorEvent) + 'static) -> SubscriptionId {
        self.events.subscribe(handler)
    }

    /// Removes an event subscription.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Reconciles with buffer changes made since the last call.
    ///
    /// Edits from other views shift the caret and selection so they stay
    /// on the same text. Returns true if the content changed.
    pub fn sync(&mut self) -> bool {
        let events: Vec<BufferEvent> = self.pending.borrow_mut().drain(..).collect();
        let mut content_changed = false;

        for event in events {
            match event {
                BufferEvent::Changed(change) => {
                    if change.actor != self.actor {
                        self.caret.adjust_for_edit(change.before, change.after);
                        if let Some(scope) = self.find.scope {
                            self.find.scope = Some(TextRange::new(
                                scope.start.shifted(change.before, change.after),
                                scope.end.shifted(change.before, change.after),
                            ));
                        }
                    }
                    content_changed = true;
                }
                BufferEvent::ModifiedChanged(modified) => {
                    self.events.emit(EditorEvent::ModifiedStateChanged(modified));
                }
            }
        }

        if content_changed {
            self.layout.invalidate();
            self.caret.correct(&self.buffer.borrow());
            let total = self.row_count();
            self.viewport.clamp(total);
            self.events.emit(EditorEvent::ContentChanged);
        }
        content_changed
    }

    // ==================== Internals ====================

    /// Brings this view up to date before an operation reads the caret,
    /// the selection or the layout.
    fn begin(&mut self) {
        self.sync();
    }

    /// The caret as it will be after the next sync: pending edits from
    /// other views replayed on a copy, then clamped.
    fn current_caret(&self) -> Caret {
        let mut caret = self.caret;
        for event in self.pending.borrow().iter() {
            if let BufferEvent::Changed(change) = event {
                if change.actor != self.actor {
                    caret.adjust_for_edit(change.before, change.after);
                }
            }
        }
        caret.correct(&self.buffer.borrow());
        caret
    }

    /// Applies an edit as this view. Read-only rejections are silent.
    fn apply_edit(&mut self, op: EditOperation) -> Option<(TextRange, TextRange)> {
        let result = self.buffer.borrow_mut().apply(op, self.actor);
        match result {
            Ok(ranges) => Some(ranges),
            Err(BufferError::ReadOnly) => {
                tracing::debug!("edit ignored: buffer is read-only");
                None
            }
            Err(err) => {
                tracing::debug!("edit failed: {}", err);
                None
            }
        }
    }

    /// Completes a public operation: reconcile, scroll, report.
    fn finish(&mut self, reveal: Reveal) {
        self.sync();
        match reveal {
            Reveal::Keep => {}
            Reveal::Caret => self.ensure_caret_visible(false),
            Reveal::Center => self.ensure_caret_visible(true),
        }

        let state = self.caret_state();
        if self.last_caret_state != Some(state) {
            self.last_caret_state = Some(state);
            self.caret_visible = true;
            self.events.emit(EditorEvent::CaretOrModeChanged(state));
        }
    }
}

impl Drop for Editor {
    fn drop(&mut self) {
        if let Ok(mut buffer) = self.buffer.try_borrow_mut() {
            buffer.unsubscribe(self.subscription);
        }
    }
}

impl std::fmt::Debug for Editor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("actor", &self.actor)
            .field("caret", &self.caret)
            .field("viewport", &self.viewport)
            .field("replace_mode", &self.replace_mode)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keymap::{Key, Modifiers};
    use quill_buffer::Direction;

    fn pos(line: usize, col: usize) -> TextPosition {
        TextPosition::new(line, col)
    }

    fn editor_with_config(text: &str, config: &Config) -> Editor {
        let mut editor = Editor::new(config);
        editor.set_measure(Rc::new(MonospaceMeasure::cells()));
        editor.set_client_size(40.0, 10.0);
        editor.set_text(text).unwrap();
        editor
    }

    fn editor_with(text: &str) -> Editor {
        editor_with_config(text, &Config::default())
    }

    fn press(editor: &mut Editor, key: Key, modifiers: Modifiers) {
        editor.handle_key(KeyPress::new(key, modifiers)).unwrap();
    }

    fn type_str(editor: &mut Editor, text: &str) {
        for ch in text.chars() {
            press(editor, Key::Char(ch), Modifiers::NONE);
        }
    }

    #[test]
    fn test_type_select_all_delete_in_single_line_editor() {
        let mut config = Config::default();
        config.editor.multiline = false;
        let mut editor = Editor::new(&config);

        type_str(&mut editor, "hello world");
        assert_eq!(editor.text(), "hello world");

        press(&mut editor, Key::Char('a'), Modifiers::CTRL);
        assert_eq!(editor.selection(), TextRange::on_line(0, 0, 11));

        press(&mut editor, Key::Delete, Modifiers::NONE);
        assert_eq!(editor.text(), "");
        assert_eq!(editor.buffer().borrow().len_lines(), 1);
        assert_eq!(editor.caret(), pos(0, 0));
    }

    #[test]
    fn test_single_line_editor_ignores_enter() {
        let mut config = Config::default();
        config.editor.multiline = false;
        let mut editor = editor_with_config("ab", &config);

        editor.set_caret(pos(0, 1), false);
        press(&mut editor, Key::Enter, Modifiers::NONE);
        assert_eq!(editor.text(), "ab");
    }

    #[test]
    fn test_typing_undoes_word_by_word() {
        let mut editor = editor_with("");
        type_str(&mut editor, "hello world");

        editor.execute(Command::Undo).unwrap();
        assert_eq!(editor.text(), "hello");
        assert_eq!(editor.caret(), pos(0, 5));

        editor.execute(Command::Undo).unwrap();
        assert_eq!(editor.text(), "");
        assert!(!editor.can_undo());

        editor.execute(Command::Redo).unwrap();
        assert_eq!(editor.text(), "hello");
    }

    #[test]
    fn test_caret_move_breaks_typing_group() {
        let mut editor = editor_with("");
        type_str(&mut editor, "ab");
        press(&mut editor, Key::Left, Modifiers::NONE);
        press(&mut editor, Key::Right, Modifiers::NONE);
        type_str(&mut editor, "cd");

        editor.execute(Command::Undo).unwrap();
        assert_eq!(editor.text(), "ab");
    }

    #[test]
    fn test_shift_selection_flips_across_anchor() {
        let mut editor = editor_with("abcdef");
        editor.set_caret(pos(0, 2), false);

        press(&mut editor, Key::Right, Modifiers::SHIFT);
        press(&mut editor, Key::Right, Modifiers::SHIFT);
        assert_eq!(editor.selection(), TextRange::on_line(0, 2, 4));

        for _ in 0..3 {
            press(&mut editor, Key::Left, Modifiers::SHIFT);
        }
        assert_eq!(editor.selection(), TextRange::on_line(0, 1, 2));
        assert_eq!(editor.caret(), pos(0, 1));

        // A plain move collapses to the edge in the direction of travel
        press(&mut editor, Key::Right, Modifiers::NONE);
        assert_eq!(editor.caret(), pos(0, 2));
        assert!(editor.selection().is_empty());
    }

    #[test]
    fn test_word_moves_and_deletes() {
        let mut editor = editor_with("one two three");
        press(&mut editor, Key::Right, Modifiers::CTRL);
        assert_eq!(editor.caret(), pos(0, 4));

        press(&mut editor, Key::End, Modifiers::NONE);
        press(&mut editor, Key::Backspace, Modifiers::CTRL);
        assert_eq!(editor.text(), "one two ");
        assert_eq!(editor.caret(), pos(0, 8));

        press(&mut editor, Key::Home, Modifiers::NONE);
        press(&mut editor, Key::Delete, Modifiers::CTRL);
        assert_eq!(editor.text(), "two ");
    }

    #[test]
    fn test_vertical_moves_keep_preferred_column() {
        let mut editor = editor_with("abcdef\nab\nabcdef");
        editor.set_caret(pos(0, 5), false);

        press(&mut editor, Key::Down, Modifiers::NONE);
        assert_eq!(editor.caret(), pos(1, 2));

        press(&mut editor, Key::Down, Modifiers::NONE);
        assert_eq!(editor.caret(), pos(2, 5));

        press(&mut editor, Key::Up, Modifiers::SHIFT);
        assert_eq!(editor.selection(), TextRange::new(pos(1, 2), pos(2, 5)));
    }

    #[test]
    fn test_smart_home() {
        let mut editor = editor_with("    let x");
        press(&mut editor, Key::End, Modifiers::NONE);

        press(&mut editor, Key::Home, Modifiers::NONE);
        assert_eq!(editor.caret(), pos(0, 4));
        press(&mut editor, Key::Home, Modifiers::NONE);
        assert_eq!(editor.caret(), pos(0, 0));
        press(&mut editor, Key::Home, Modifiers::NONE);
        assert_eq!(editor.caret(), pos(0, 4));
    }

    #[test]
    fn test_document_bounds() {
        let mut editor = editor_with("ab\ncd\nef");
        press(&mut editor, Key::End, Modifiers::CTRL_SHIFT);
        assert_eq!(editor.selection(), TextRange::new(pos(0, 0), pos(2, 2)));

        press(&mut editor, Key::Home, Modifiers::CTRL);
        assert_eq!(editor.caret(), pos(0, 0));
    }

    #[test]
    fn test_cut_and_paste() {
        let clipboard = Rc::new(MemoryClipboard::new());
        let mut editor = editor_with("alpha beta");
        editor.set_clipboard(clipboard.clone());

        editor.set_selection(TextRange::on_line(0, 0, 5));
        press(&mut editor, Key::Char('x'), Modifiers::CTRL);
        assert_eq!(editor.text(), " beta");
        assert_eq!(clipboard.get_text(), "alpha");

        press(&mut editor, Key::End, Modifiers::CTRL);
        press(&mut editor, Key::Char('v'), Modifiers::CTRL);
        assert_eq!(editor.text(), " betaalpha");
        assert_eq!(editor.caret(), pos(0, 10));
    }

    #[test]
    fn test_copy_without_selection_keeps_clipboard() {
        let clipboard = Rc::new(MemoryClipboard::new());
        clipboard.set_text("kept");
        let mut editor = editor_with("text");
        editor.set_clipboard(clipboard.clone());

        editor.execute(Command::Copy).unwrap();
        assert_eq!(clipboard.get_text(), "kept");
    }

    #[test]
    fn test_block_indent_is_one_undo_step() {
        let mut editor = editor_with("a\nb\nc");
        editor.set_selection(TextRange::new(pos(0, 0), pos(2, 1)));

        press(&mut editor, Key::Tab, Modifiers::NONE);
        assert_eq!(editor.text(), "    a\n    b\n    c");
        assert_eq!(editor.selection(), TextRange::new(pos(0, 0), pos(2, 5)));

        press(&mut editor, Key::Tab, Modifiers::SHIFT);
        assert_eq!(editor.text(), "a\nb\nc");

        editor.execute(Command::Undo).unwrap();
        assert_eq!(editor.text(), "    a\n    b\n    c");
        editor.execute(Command::Undo).unwrap();
        assert_eq!(editor.text(), "a\nb\nc");
    }

    #[test]
    fn test_block_indent_skips_line_after_selection_end() {
        let mut editor = editor_with("a\nb\nc");
        editor.set_selection(TextRange::new(pos(0, 0), pos(2, 0)));
        editor.execute(Command::Indent).unwrap();
        assert_eq!(editor.text(), "    a\n    b\nc");
    }

    #[test]
    fn test_indent_at_caret_goes_to_next_tab_stop() {
        let mut editor = editor_with("ab");
        editor.set_caret(pos(0, 1), false);
        editor.execute(Command::Indent).unwrap();
        assert_eq!(editor.text(), "a   b");

        editor.execute(Command::Unindent).unwrap();
        assert_eq!(editor.text(), "a   b");

        editor.set_text("\tx").unwrap();
        editor.set_caret(pos(0, 2), false);
        editor.execute(Command::Unindent).unwrap();
        assert_eq!(editor.text(), "x");
        assert_eq!(editor.caret(), pos(0, 1));
    }

    #[test]
    fn test_replace_mode_overwrites() {
        let mut editor = editor_with("abc");
        press(&mut editor, Key::Insert, Modifiers::NONE);
        assert!(editor.replace_mode());

        type_str(&mut editor, "XY");
        assert_eq!(editor.text(), "XYc");

        type_str(&mut editor, "ZW");
        assert_eq!(editor.text(), "XYZW");
    }

    #[test]
    fn test_read_only_edits_are_ignored() {
        let mut editor = editor_with("fixed");
        editor.set_read_only(true);
        press(&mut editor, Key::End, Modifiers::NONE);

        type_str(&mut editor, "!");
        press(&mut editor, Key::Backspace, Modifiers::NONE);
        editor.execute(Command::Paste).unwrap();
        editor.set_find_pattern("fixed");
        editor.set_replacement("broken");
        assert_eq!(editor.replace_all().unwrap(), 0);

        assert_eq!(editor.text(), "fixed");
        assert!(!editor.is_modified());
        assert_eq!(editor.caret(), pos(0, 5));
    }

    #[test]
    fn test_find_next_wraps() {
        let mut editor = editor_with("..ab....ab.....ab");
        editor.set_find_pattern("ab");
        editor.set_caret(pos(0, 15), false);

        let hit = editor.find_next().unwrap().unwrap();
        assert!(hit.wrapped);
        assert_eq!(editor.selection(), TextRange::on_line(0, 2, 4));

        editor.find_next().unwrap();
        assert_eq!(editor.selection(), TextRange::on_line(0, 8, 10));

        editor.find_prev().unwrap();
        assert_eq!(editor.selection(), TextRange::on_line(0, 2, 4));
    }

    #[test]
    fn test_find_seeds_pattern_from_selection() {
        let mut editor = editor_with("let a = b;\nlet c = d;");
        editor.set_selection(TextRange::on_line(0, 0, 3));

        press(&mut editor, Key::Char('f'), Modifiers::CTRL);
        assert_eq!(editor.find_state().pattern, "let");
        assert_eq!(editor.selection(), TextRange::on_line(0, 0, 3));

        press(&mut editor, Key::F(3), Modifiers::NONE);
        assert_eq!(editor.selection(), TextRange::on_line(1, 0, 3));
    }

    #[test]
    fn test_find_missing_pattern_leaves_caret() {
        let mut editor = editor_with("abc");
        editor.set_caret(pos(0, 1), false);
        editor.set_find_pattern("zzz");

        assert!(editor.find_next().unwrap().is_none());
        assert_eq!(editor.caret(), pos(0, 1));
        assert!(!editor.replace_one().unwrap());
    }

    #[test]
    fn test_replace_then_find_next() {
        let mut editor = editor_with("cat cat cat");
        editor.set_find_pattern("cat");
        editor.set_replacement("dog");

        assert!(editor.replace().unwrap());
        assert_eq!(editor.text(), "dog cat cat");
        assert_eq!(editor.selection(), TextRange::on_line(0, 4, 7));
    }

    #[test]
    fn test_replace_all_terminates_on_self_matching_replacement() {
        let mut editor = editor_with("banana");
        editor.set_find_pattern("a");
        editor.set_replacement("aa");

        assert_eq!(editor.replace_all().unwrap(), 3);
        assert_eq!(editor.text(), "baanaanaa");
        assert_ne!(editor.text().matches('a').count(), 3);

        editor.execute(Command::Undo).unwrap();
        assert_eq!(editor.text(), "banana");
    }

    #[test]
    fn test_replace_all_does_not_revisit_created_matches() {
        // Removing the inner "ab" forms a new "ab" behind the scan position,
        // which is left alone
        let mut editor = editor_with("aabb");
        editor.set_find_pattern("ab");
        editor.set_replacement("a");

        assert_eq!(editor.replace_all().unwrap(), 1);
        assert_eq!(editor.text(), "aab");
    }

    #[test]
    fn test_replace_all_with_empty_replacement() {
        let mut editor = editor_with("a-a-a\na");
        editor.set_find_pattern("a");
        editor.set_replacement("");

        assert_eq!(editor.replace_all().unwrap(), 4);
        assert_eq!(editor.text(), "--\n");
    }

    #[test]
    fn test_replace_all_in_selection() {
        let mut editor = editor_with("x x\nx x\nx x");
        editor.set_selection(TextRange::on_line(1, 0, 3));
        editor.set_search_options(SearchOptions {
            selection_only: true,
            ..SearchOptions::default()
        });
        editor.set_find_pattern("x");
        editor.set_replacement("yy");

        assert_eq!(editor.replace_all().unwrap(), 2);
        assert_eq!(editor.text(), "x x\nyy yy\nx x");
    }

    #[test]
    fn test_whole_word_selection_is_auto_highlighted() {
        let mut editor = editor_with("foo bar foo\nfood");
        editor.set_selection(TextRange::on_line(0, 0, 3));
        assert_eq!(
            editor.highlight_ranges(),
            vec![TextRange::on_line(0, 0, 3), TextRange::on_line(0, 8, 11)]
        );

        editor.set_selection(TextRange::on_line(0, 0, 2));
        assert!(editor.highlight_ranges().is_empty());

        editor.set_highlight("o", SearchOptions::default());
        assert_eq!(editor.highlight_ranges().len(), 6);
    }

    #[test]
    fn test_shared_buffer_shifts_other_view() {
        let config = Config::default();
        let mut first = editor_with("hello world");
        let mut second = Editor::with_buffer(first.buffer(), &config);
        second.set_selection(TextRange::on_line(0, 6, 11));

        first.set_caret(pos(0, 0), false);
        first.insert_text("Say: ").unwrap();

        assert!(second.sync());
        assert_eq!(second.selection(), TextRange::on_line(0, 11, 16));
        assert_eq!(second.selected_text(), "world");
        assert_eq!(second.text(), "Say: hello world");
    }

    #[test]
    fn test_shared_view_types_over_shifted_selection() {
        let mut first = editor_with("hello world");
        let mut second = Editor::with_buffer(first.buffer(), &Config::default());
        second.set_selection(TextRange::on_line(0, 6, 11));

        first.insert_text("Say: ").unwrap();

        second.type_char('X').unwrap();
        assert_eq!(second.text(), "Say: hello X");
        assert_eq!(second.caret(), pos(0, 12));
    }

    #[test]
    fn test_shared_view_getters_see_external_replace() {
        let mut first = editor_with("a long first line\nsecond");
        let mut second = Editor::with_buffer(first.buffer(), &Config::default());
        second.set_caret(pos(1, 6), false);

        first.set_text("short").unwrap();
        assert_eq!(second.caret(), pos(0, 5));
        assert_eq!(second.selection(), TextRange::point(pos(0, 5)));
        assert_eq!(second.caret_state().line, 1);
    }

    #[test]
    fn test_shared_view_deletes_at_shifted_caret() {
        let mut first = editor_with("abc");
        let mut second = Editor::with_buffer(first.buffer(), &Config::default());
        second.set_caret(pos(0, 3), false);

        first.insert_text("xy").unwrap();

        second.delete_char(Direction::Backward).unwrap();
        assert_eq!(second.text(), "xyab");
    }

    #[test]
    fn test_shared_view_set_caret_ignores_older_edits() {
        let mut first = editor_with("hello");
        let mut second = Editor::with_buffer(first.buffer(), &Config::default());

        first.set_caret(pos(0, 2), false);
        first.insert_text("ab").unwrap();

        second.set_caret(pos(0, 4), false);
        assert_eq!(second.caret(), pos(0, 4));
    }

    #[test]
    fn test_shared_view_search_scope_follows_external_edit() {
        let mut first = editor_with("x x\nx x");
        let mut second = Editor::with_buffer(first.buffer(), &Config::default());
        second.set_selection(TextRange::on_line(1, 0, 3));
        second.set_search_options(SearchOptions {
            selection_only: true,
            ..SearchOptions::default()
        });
        second.set_find_pattern("x");
        second.set_replacement("y");

        first.insert_text("top\n").unwrap();

        assert_eq!(second.replace_all().unwrap(), 2);
        assert_eq!(second.text(), "top\nx x\ny y");
    }

    #[test]
    fn test_rejected_set_text_keeps_caret() {
        let mut editor = editor_with("keep");
        editor.set_caret(pos(0, 3), false);
        editor.set_read_only(true);

        editor.set_text("other").unwrap();
        assert_eq!(editor.text(), "keep");
        assert_eq!(editor.caret(), pos(0, 3));
    }

    #[test]
    fn test_events() {
        let mut editor = editor_with("");
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        editor.subscribe(move |event| sink.borrow_mut().push(event.clone()));

        editor.type_char('a').unwrap();
        {
            let events = seen.borrow();
            assert!(events.contains(&EditorEvent::ModifiedStateChanged(true)));
            assert!(events.contains(&EditorEvent::ContentChanged));
            assert!(events.contains(&EditorEvent::CaretOrModeChanged(CaretState {
                line: 1,
                col: 2,
                replace_mode: false,
                char_under_cursor: None,
            })));
        }

        seen.borrow_mut().clear();
        editor.mark_saved();
        assert_eq!(*seen.borrow(), vec![EditorEvent::ModifiedStateChanged(false)]);
    }

    #[test]
    fn test_caret_state() {
        let mut editor = editor_with("abc\ndef");
        editor.set_caret(pos(1, 1), false);
        assert_eq!(
            editor.caret_state(),
            CaretState {
                line: 2,
                col: 2,
                replace_mode: false,
                char_under_cursor: Some('e'),
            }
        );
    }

    #[test]
    fn test_word_wrap_rows() {
        let mut config = Config::default();
        config.editor.word_wrap = true;
        let mut editor = editor_with_config("hello big world\nend", &config);
        editor.set_client_size(10.0, 5.0);

        assert_eq!(editor.total_rows(), 3);
        let texts: Vec<String> = editor.visible_rows().into_iter().map(|row| row.text).collect();
        assert_eq!(texts, vec!["hello big ", "world", "end"]);

        press(&mut editor, Key::Down, Modifiers::NONE);
        assert_eq!(editor.caret(), pos(0, 10));
        press(&mut editor, Key::Down, Modifiers::NONE);
        assert_eq!(editor.caret(), pos(1, 0));

        editor.set_word_wrap(false);
        assert_eq!(editor.total_rows(), 2);
    }

    #[test]
    fn test_page_down_moves_viewport_and_caret() {
        let text: Vec<String> = (0..30).map(|n| format!("line {n}")).collect();
        let mut editor = editor_with(&text.join("\n"));

        press(&mut editor, Key::PageDown, Modifiers::NONE);
        assert_eq!(editor.viewport().first_row(), 10);
        assert_eq!(editor.caret(), pos(10, 0));

        press(&mut editor, Key::PageDown, Modifiers::NONE);
        press(&mut editor, Key::PageDown, Modifiers::NONE);
        assert_eq!(editor.viewport().first_row(), 20);
        assert_eq!(editor.caret(), pos(29, 0));

        press(&mut editor, Key::Up, Modifiers::CTRL);
        assert_eq!(editor.viewport().first_row(), 19);
    }

    #[test]
    fn test_caret_kept_visible() {
        let text: Vec<String> = (0..30).map(|n| format!("line {n}")).collect();
        let mut editor = editor_with(&text.join("\n"));

        editor.set_caret(pos(15, 0), false);
        assert_eq!(editor.viewport().first_row(), 6);

        editor.set_find_pattern("line 2");
        editor.find_prev().unwrap();
        assert_eq!(editor.caret(), pos(2, 6));
        assert!(editor.viewport().first_row() <= 2);
    }

    #[test]
    fn test_mouse_clicks() {
        let mut editor = editor_with("alpha beta\nsecond");

        editor.mouse_down(Point::new(7.2, 0.5), false, 2).unwrap();
        assert_eq!(editor.selection(), TextRange::on_line(0, 6, 10));

        editor.mouse_down(Point::new(7.2, 0.5), false, 3).unwrap();
        assert_eq!(editor.selection(), TextRange::new(pos(0, 0), pos(1, 0)));

        editor.mouse_down(Point::new(1.0, 0.2), false, 1).unwrap();
        editor.mouse_drag(Point::new(4.0, 1.2)).unwrap();
        assert_eq!(editor.selection(), TextRange::new(pos(0, 1), pos(1, 4)));
    }

    #[test]
    fn test_client_mapping_follows_scroll() {
        let text: Vec<String> = (0..30).map(|n| format!("line {n}")).collect();
        let mut editor = editor_with(&text.join("\n"));
        editor.set_caret(pos(20, 0), false);

        let first = editor.viewport().first_row();
        let rect = editor.text_pos_to_client(pos(20, 2));
        assert_eq!(rect.y, (20 - first) as f32);
        assert_eq!(editor.client_to_text_pos(Point::new(rect.x, rect.y)), pos(20, 2));
    }

    #[test]
    fn test_blink_tick() {
        let mut editor = editor_with("abc");
        assert!(editor.caret_visible());
        assert!(editor.blink_tick());
        assert!(!editor.caret_visible());

        // Moving the caret shows it again
        press(&mut editor, Key::Right, Modifiers::NONE);
        assert!(editor.caret_visible());

        let mut config = Config::default();
        config.editor.caret_blink_ms = 0;
        let mut steady = editor_with_config("abc", &config);
        assert!(!steady.blink_tick());
        assert!(steady.caret_visible());
    }

    #[test]
    fn test_token_category_passthrough() {
        struct Digits;
        impl crate::services::TokenClassifier for Digits {
            fn token_category(&self, _line: usize, char_index: usize) -> u8 {
                (char_index % 3) as u8
            }
        }

        let mut editor = editor_with("abc");
        assert_eq!(editor.token_category(0, 2), 0);
        editor.set_classifier(Some(Rc::new(Digits)));
        assert_eq!(editor.token_category(0, 2), 2);
    }

    #[test]
    fn test_rebinding_per_editor() {
        let mut first = editor_with("abc");
        let mut second = editor_with("abc");
        first.commands_mut().unbind(Command::SelectAll);
        first
            .keymap_mut()
            .bind(KeyPress::new(Key::Char('e'), Modifiers::CTRL), Command::MoveLineEnd);

        assert!(first.execute(Command::SelectAll).is_err());
        second.execute(Command::SelectAll).unwrap();
        assert!(!second.selection().is_empty());

        press(&mut first, Key::Char('e'), Modifiers::CTRL);
        assert_eq!(first.caret(), pos(0, 3));
        assert!(!second.handle_key(KeyPress::new(Key::Char('e'), Modifiers::CTRL)).unwrap());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn commands_keep_caret_in_document(
                text in "[a-z \n]{0,40}",
                commands in prop::collection::vec(prop::sample::select(Command::all().collect::<Vec<_>>()), 0..40),
            ) {
                let mut editor = editor_with(&text);
                editor.set_find_pattern("a");
                editor.set_replacement("b");

                for cmd in commands {
                    editor.execute(cmd).unwrap();

                    let shared = editor.buffer();
                    let buffer = shared.borrow();
                    let selection = editor.selection();
                    prop_assert!(selection.start <= selection.end);
                    prop_assert_eq!(buffer.corrected(selection.start), selection.start);
                    prop_assert_eq!(buffer.corrected(selection.end), selection.end);
                    let caret = editor.caret();
                    prop_assert!(caret == selection.start || caret == selection.end);
                }
            }
        }
    }
}
