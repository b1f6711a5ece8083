//! # Quill Core
//!
//! The interactive half of the editing engine: caret and selection, word
//! wrap, search and replace, scrolling, and the command/key layer, all
//! driven through the [`Editor`] facade.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                          Editor                          │
//! │  ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌─────────────┐  │
//! │  │  Caret   │ │  Layout  │ │ Viewport │ │ Find state  │  │
//! │  └──────────┘ └────┬─────┘ └──────────┘ └─────────────┘  │
//! │                    │ WordWrapEngine                       │
//! │  ┌──────────────┐ ┌┴─────────────┐ ┌──────────────────┐  │
//! │  │ CommandTable │ │    Keymap    │ │     EventBus     │  │
//! │  └──────────────┘ └──────────────┘ └──────────────────┘  │
//! └────────────────────────────┬─────────────────────────────┘
//!                              │ Rc<RefCell<TextBuffer>>
//!                     ┌────────┴────────┐
//!                     │   quill-buffer  │
//!                     └─────────────────┘
//! ```
//!
//! ## Learning: Module Organization
//!
//! Rust modules map to files:
//! - `mod foo;` looks for `foo.rs` or `foo/mod.rs`
//! - `pub use` re-exports items for cleaner public APIs

pub mod caret;
pub mod command;
pub mod config;
pub mod editor;
pub mod event;
pub mod keymap;
pub mod layout;
pub mod search;
pub mod services;
pub mod viewport;
pub mod wrap;

pub use caret::Caret;
pub use command::{Command, CommandHandler, CommandTable};
pub use config::{Config, ConfigError};
pub use editor::{Editor, FindState};
pub use event::{CaretState, EditorEvent, EventBus};
pub use keymap::{Key, KeyPress, Keymap, Modifiers};
pub use layout::{Layout, Point, Rect, VisualRow};
pub use search::{SearchHit, SearchOptions, SearchStep};
pub use services::{Clipboard, MemoryClipboard, MonospaceMeasure, TextMeasure, TokenClassifier};
pub use viewport::Viewport;
pub use wrap::{LineSpan, WordWrapEngine, WrapPoint};

pub use quill_buffer::{Direction, TextPosition, TextRange};

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in core operations
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Buffer error: {0}")]
    Buffer(#[from] quill_buffer::BufferError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Invalid key binding: {0}")]
    InvalidKeyBinding(String),
}
