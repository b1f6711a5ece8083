//! Event system for editor notifications.
//!
//! ## Learning: Observer Pattern in Rust
//!
//! Rust's ownership model makes traditional observer patterns tricky.
//! Here every subscriber is a boxed closure owned by the bus, invoked in
//! subscription order on the same thread that raised the event:
//! - No object references to manage
//! - Events are values, handed out by reference
//! - Handlers run before `emit` returns, so caches are never stale
//!
//! Handlers must not call back into the editor that emitted the event.

use quill_buffer::{Observers, SubscriptionId};
use serde::Serialize;

/// Caret and mode summary for status displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CaretState {
    /// 1-based line number
    pub line: usize,
    /// 1-based column
    pub col: usize,
    /// Whether typing overwrites
    pub replace_mode: bool,
    /// The character after the caret, if any
    pub char_under_cursor: Option<char>,
}

/// Events raised by an [`Editor`](crate::Editor).
///
/// ## Learning: Enum Variants
///
/// Rust enums can hold data, unlike C-style enums.
/// Each variant can have different associated data.
/// Pattern matching ensures all cases are handled.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    /// The buffer content changed
    ContentChanged,
    /// The buffer's modified flag flipped
    ModifiedStateChanged(bool),
    /// The caret moved or the replace mode toggled
    CaretOrModeChanged(CaretState),
    /// The scroll position changed
    ViewportChanged,
}

/// Synchronous event bus owned by one editor.
#[derive(Debug, Default)]
pub struct EventBus {
    observers: Observers<EditorEvent>,
}

impl EventBus {
    /// Creates a new event bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers an event to every subscriber.
    pub fn emit(&mut self, event: EditorEvent) {
        tracing::trace!(?event, "editor event");
        self.observers.notify(&event);
    }

    /// Subscribes to events.
    pub fn subscribe(&mut self, handler: impl FnMut(&EditorEvent) + 'static) -> SubscriptionId {
        self.observers.subscribe(handler)
    }

    /// Removes a subscription.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }
}
